//! SQLite user repository implementation.
//!
//! Implements `UserRepository` from `supportdesk-core`. Emails arrive already
//! normalized; the UNIQUE constraint on `users.email` is the source of truth
//! for duplicate detection.

use sqlx::Row;
use uuid::Uuid;

use supportdesk_core::repository::user::UserRepository;
use supportdesk_types::error::RepositoryError;
use supportdesk_types::user::{User, UserId, UserRecord};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<UserRecord, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        Ok(UserRecord {
            user: User {
                id: UserId::from_uuid(id),
                email: self.email,
                created_at: parse_datetime(&self.created_at)?,
            },
            password_hash: self.password_hash,
        })
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, record: &UserRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(record.user.id.to_string())
        .bind(&record.user.email)
        .bind(&record.password_hash)
        .bind(format_datetime(&record.user.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("email '{}' already registered", record.user.email)),
            ),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_record())
            .transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let record = UserRow::from_row(&row).map_err(query_error)?.into_record()?;
                Ok(Some(record.user))
            }
            None => Ok(None),
        }
    }
}
