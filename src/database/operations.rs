use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::database::models::{NewUser, UserProfile};
use crate::error::{LedgerError, Result};
use crate::ledger::traits::ProfileStore;
use crate::utils::Validator;

/// SQLite-backed store implementing every ledger collaborator.
#[derive(Clone)]
pub struct DatabaseOperations {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseOperations").finish_non_exhaustive()
    }
}

impl DatabaseOperations {
    pub async fn new(database_url: &str) -> Result<Self> {
        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                student_id TEXT NOT NULL,
                contact_number TEXT NOT NULL,
                pin TEXT NOT NULL,
                created_at DATETIME NOT NULL
            );

            CREATE TABLE IF NOT EXISTS wallets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL UNIQUE,
                balance_cents INTEGER NOT NULL DEFAULT 0 CHECK (balance_cents >= 0),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                category TEXT NOT NULL,
                detail TEXT,
                description TEXT NOT NULL DEFAULT '',
                date DATE NOT NULL,
                created_at DATETIME NOT NULL,
                external_ref TEXT,
                status TEXT NOT NULL DEFAULT 'completed',
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user_date
                ON transactions (user_id, date);

            CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                month TEXT NOT NULL,
                canteen_cents INTEGER NOT NULL DEFAULT 0 CHECK (canteen_cents >= 0),
                library_cents INTEGER NOT NULL DEFAULT 0 CHECK (library_cents >= 0),
                lab_cents INTEGER NOT NULL DEFAULT 0 CHECK (lab_cents >= 0),
                club_cents INTEGER NOT NULL DEFAULT 0 CHECK (club_cents >= 0),
                other_cents INTEGER NOT NULL DEFAULT 0 CHECK (other_cents >= 0),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id),
                UNIQUE (user_id, month)
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                type TEXT NOT NULL,
                read_status BOOLEAN NOT NULL DEFAULT FALSE,
                related_entity_id TEXT,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );",
        )?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Create a profile together with its empty wallet.
    pub async fn register_user(&self, new_user: &NewUser) -> Result<UserProfile> {
        Validator::validate_new_user(new_user)?;

        let mut conn = self.conn.lock().await;

        let taken = conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1",
                params![new_user.username.trim()],
                |_| Ok(()),
            )
            .optional()?;
        if taken.is_some() {
            return Err(LedgerError::invalid_input(format!(
                "username '{}' is already taken",
                new_user.username.trim()
            )));
        }

        let now = Utc::now();
        let tx = conn.transaction()?;
        let profile = tx.query_row(
            "INSERT INTO users (id, username, full_name, student_id, contact_number, pin, created_at)
             VALUES (lower(hex(randomblob(16))), ?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, username, full_name, student_id, contact_number, pin, created_at",
            params![
                new_user.username.trim(),
                new_user.full_name.trim(),
                new_user.student_id,
                new_user.contact_number,
                new_user.pin,
                now
            ],
            profile_from_row,
        )?;
        tx.execute(
            "INSERT INTO wallets (user_id, balance_cents, created_at, updated_at) VALUES (?1, 0, ?2, ?2)",
            params![profile.id, now],
        )?;
        tx.commit()?;

        info!("Registered user {} with an empty wallet", profile.username);
        Ok(profile)
    }

    pub async fn find_profile_by_username(&self, username: &str) -> Result<UserProfile> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, username, full_name, student_id, contact_number, pin, created_at
             FROM users WHERE username = ?1",
            params![username.trim()],
            profile_from_row,
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("User", username.trim()))
    }
}

#[async_trait]
impl ProfileStore for DatabaseOperations {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        let conn = self.conn.lock().await;
        let profile = conn
            .query_row(
                "SELECT id, username, full_name, student_id, contact_number, pin, created_at
                 FROM users WHERE id = ?1",
                params![user_id],
                profile_from_row,
            )
            .optional()?;

        debug!("Profile lookup for {user_id}: found={}", profile.is_some());
        profile.ok_or_else(|| LedgerError::not_found("User", user_id))
    }
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        username: row.get(1)?,
        full_name: row.get(2)?,
        student_id: row.get(3)?,
        contact_number: row.get(4)?,
        pin: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Read a text column through the domain type's `FromStr`.
pub(crate) fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = LedgerError>,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: LedgerError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
