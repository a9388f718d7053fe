//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::error::AuthError;
use crate::auth::models::{User, UserRole};
use crate::auth::password::hash_password;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{info, warn};

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Internal(e.to_string())
    }
}

/// Partial user update applied by [`UserStore::update`]
#[derive(Debug, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Create default super_admin if none exists
        self.create_default_admin(&conn)?;

        Ok(())
    }

    /// Create default super_admin user for initial setup
    fn create_default_admin(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'super_admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for super_admin users")?;

        if count == 0 {
            let password_hash = hash_password("admin123")
                .map_err(|e| anyhow::anyhow!("Failed to hash default password: {e}"))?;
            let now = Utc::now().to_rfc3339();

            conn.execute(
                "INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    "admin",
                    "admin@gatekeeper.local",
                    password_hash,
                    UserRole::SuperAdmin.as_str(),
                    now,
                    now,
                ],
            )
            .context("Failed to insert super_admin user")?;

            info!("🔐 Default super_admin created (username: admin, password: admin123)");
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::Guest),
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Map SQLite unique-constraint failures on insert/update to the same
    /// duplicate errors the pre-checks produce. A concurrent insert that
    /// slips past the pre-check is therefore indistinguishable to callers.
    fn map_conflict(e: rusqlite::Error) -> AuthError {
        if let rusqlite::Error::SqliteFailure(ref err, Some(ref msg)) = e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                if msg.contains("users.username") {
                    return AuthError::DuplicateUsername;
                }
                if msg.contains("users.email") {
                    return AuthError::DuplicateEmail;
                }
            }
        }
        AuthError::Internal(e.to_string())
    }

    /// Get user by username (includes password hash, for login verification)
    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, created_at, updated_at
             FROM users WHERE username = ?1",
        )?;

        match stmt.query_row(params![username], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by email
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, created_at, updated_at
             FROM users WHERE email = ?1",
        )?;

        match stmt.query_row(params![email], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by id
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, created_at, updated_at
             FROM users WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], Self::row_to_user) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert a new user with an already-hashed password
    pub fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let now = Utc::now().to_rfc3339();

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![username, email, password_hash, role.as_str(), now, now],
        )
        .map_err(Self::map_conflict)?;

        let id = conn.last_insert_rowid();
        info!("✅ Created user: {} ({})", username, role.as_str());

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Apply a partial update and bump `updated_at`
    pub fn update(&self, id: i64, patch: UserPatch) -> Result<User, AuthError> {
        let current = self.find_by_id(id)?.ok_or(AuthError::NotFound)?;

        let username = patch.username.unwrap_or(current.username);
        let email = patch.email.unwrap_or(current.email);
        let password_hash = patch.password_hash.unwrap_or(current.password_hash);
        let role = patch.role.unwrap_or(current.role);
        let updated_at = Utc::now().to_rfc3339();

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE users
             SET username = ?1, email = ?2, password_hash = ?3, role = ?4, updated_at = ?5
             WHERE id = ?6",
            params![username, email, password_hash, role.as_str(), updated_at, id],
        )
        .map_err(Self::map_conflict)?;

        Ok(User {
            id,
            username,
            email,
            password_hash,
            role,
            created_at: current.created_at,
            updated_at,
        })
    }

    /// Delete a user by id
    pub fn delete(&self, id: i64) -> Result<(), AuthError> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(AuthError::NotFound);
        }

        info!("🗑️  Deleted user: {}", id);
        Ok(())
    }

    /// List all users
    pub fn list(&self) -> Result<Vec<User>, AuthError> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, created_at, updated_at
             FROM users ORDER BY id",
        )?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
