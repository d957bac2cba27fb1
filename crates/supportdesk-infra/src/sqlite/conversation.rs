//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `supportdesk-core`. A conversation
//! is one row in `conversations` plus its append-only rows in
//! `conversation_turns`, keyed by `(conversation_id, seq)`. Every read is
//! scoped to the owner and to `status = 'active'`.

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use supportdesk_core::repository::conversation::ConversationRepository;
use supportdesk_types::chat::{
    Conversation, ConversationId, ConversationStatus, ConversationSummary, Turn, TurnRole,
    display_title,
};
use supportdesk_types::error::RepositoryError;
use supportdesk_types::user::UserId;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn load_turns(&self, id: &str) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM conversation_turns
             WHERE conversation_id = ? ORDER BY seq ASC",
        )
        .bind(id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| TurnRow::from_row(row).map_err(query_error)?.into_turn())
            .collect()
    }

    async fn hydrate(
        &self,
        row: Option<sqlx::sqlite::SqliteRow>,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let conversation_row = ConversationRow::from_row(&row).map_err(query_error)?;
        let turns = self.load_turns(&conversation_row.id).await?;
        Ok(Some(conversation_row.into_conversation(turns)?))
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    user_id: String,
    title: Option<String>,
    status: String,
    turn_count: i64,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            status: row.try_get("status")?,
            turn_count: row.try_get("turn_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn parse_id(&self) -> Result<ConversationId, RepositoryError> {
        Uuid::parse_str(&self.id)
            .map(ConversationId)
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))
    }

    fn into_conversation(self, turns: Vec<Turn>) -> Result<Conversation, RepositoryError> {
        let id = self.parse_id()?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map(UserId::from_uuid)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let status: ConversationStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Conversation {
            id,
            user_id,
            title: self.title,
            persisted_turns: turns.len(),
            turns,
            status,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }

    fn into_summary(self, last_message: Option<Turn>) -> Result<ConversationSummary, RepositoryError> {
        let id = self.parse_id()?;
        Ok(ConversationSummary {
            id,
            title: display_title(&id, self.title.as_deref()),
            message_count: self.turn_count as usize,
            last_message,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct TurnRow {
    role: String,
    content: String,
    created_at: String,
}

impl TurnRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// The `last_*` columns of the history listing join; all NULL when the
    /// conversation has no turns.
    fn from_last_columns(row: &sqlx::sqlite::SqliteRow) -> Result<Option<Self>, sqlx::Error> {
        let role: Option<String> = row.try_get("last_role")?;
        let content: Option<String> = row.try_get("last_content")?;
        let created_at: Option<String> = row.try_get("last_created_at")?;
        Ok(match (role, content, created_at) {
            (Some(role), Some(content), Some(created_at)) => Some(Self {
                role,
                content,
                created_at,
            }),
            _ => None,
        })
    }

    fn into_turn(self) -> Result<Turn, RepositoryError> {
        let role: TurnRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(Turn {
            role,
            content: self.content,
            timestamp: parse_datetime(&self.created_at)?,
        })
    }
}

impl ConversationRepository for SqliteConversationRepository {
    async fn find_latest_active(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations
             WHERE user_id = ? AND status = 'active'
             ORDER BY updated_at DESC, id DESC
             LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        self.hydrate(row).await
    }

    async fn find_active(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        self.hydrate(row).await
    }

    async fn list_active(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.*,
                    t.role AS last_role,
                    t.content AS last_content,
                    t.created_at AS last_created_at
             FROM conversations c
             LEFT JOIN conversation_turns t
                    ON t.conversation_id = c.id AND t.seq = c.turn_count - 1
             WHERE c.user_id = ? AND c.status = 'active'
             ORDER BY c.updated_at DESC, c.id DESC
             LIMIT ?",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let last = TurnRow::from_last_columns(row)
                    .map_err(query_error)?
                    .map(TurnRow::into_turn)
                    .transpose()?;
                ConversationRow::from_row(row)
                    .map_err(query_error)?
                    .into_summary(last)
            })
            .collect()
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let id = conversation.id.to_string();
        let user_id = conversation.user_id.to_string();

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // The WHERE clause keeps a conversation bound to its original owner.
        let upserted = sqlx::query(
            "INSERT INTO conversations (id, user_id, title, status, turn_count, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                status = excluded.status,
                turn_count = excluded.turn_count,
                updated_at = excluded.updated_at
             WHERE conversations.user_id = excluded.user_id",
        )
        .bind(&id)
        .bind(&user_id)
        .bind(&conversation.title)
        .bind(conversation.status.to_string())
        .bind(conversation.turn_count() as i64)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if upserted.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "conversation {id} belongs to another user"
            )));
        }

        let (stored,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversation_turns WHERE conversation_id = ?")
                .bind(&id)
                .fetch_one(&mut *tx)
                .await
                .map_err(query_error)?;
        let stored = stored as usize;

        // Another save appended since this copy was loaded.
        if stored != conversation.persisted_turns {
            return Err(RepositoryError::Conflict(format!(
                "conversation {id} has {stored} stored turns, expected {}",
                conversation.persisted_turns
            )));
        }
        if conversation.persisted_turns > conversation.turn_count() {
            return Err(RepositoryError::Conflict(format!(
                "conversation {id} has {stored} stored turns but only {} in memory",
                conversation.turn_count()
            )));
        }

        for (seq, turn) in conversation.turns.iter().enumerate().skip(stored) {
            sqlx::query(
                "INSERT INTO conversation_turns (conversation_id, seq, role, content, created_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(seq as i64)
            .bind(turn.role.to_string())
            .bind(&turn.content)
            .bind(format_datetime(&turn.timestamp))
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE conversations SET status = 'deleted', updated_at = ?
             WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
