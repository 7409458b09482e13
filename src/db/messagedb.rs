// db/messagedb.rs
use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::messagemodel::{Attachment, Message, MessageType};

#[async_trait]
pub trait MessageExt {
    async fn save_message(
        &self,
        conversation_id: &str,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: String,
        message_type: MessageType,
        attachment: Option<Attachment>,
        project_id: Option<Uuid>,
    ) -> Result<Message, sqlx::Error>;

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, sqlx::Error>;

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error>;

    /// Latest message of every conversation the user participates in,
    /// newest activity first.
    async fn get_conversation_heads(&self, user_id: Uuid) -> Result<Vec<Message>, sqlx::Error>;

    /// Unread totals per conversation for the given recipient.
    async fn get_unread_counts(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(String, i64)>, sqlx::Error>;

    /// Flips every unread message addressed to `recipient_id` in the
    /// conversation. Idempotent; returns how many rows changed.
    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        recipient_id: Uuid,
    ) -> Result<u64, sqlx::Error>;

    async fn mark_message_read(&self, message_id: Uuid) -> Result<Message, sqlx::Error>;

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn delete_message(&self, message_id: Uuid) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl MessageExt for DBClient {
    async fn save_message(
        &self,
        conversation_id: &str,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: String,
        message_type: MessageType,
        attachment: Option<Attachment>,
        project_id: Option<Uuid>,
    ) -> Result<Message, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages
            (conversation_id, sender_id, recipient_id, content, message_type,
             attachment, project_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, conversation_id, sender_id, recipient_id, content,
                      message_type, attachment, project_id, is_read, read_at,
                      status, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(content)
        .bind(message_type)
        .bind(attachment.map(Json))
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, recipient_id, content,
                   message_type, attachment, project_id, is_read, read_at,
                   status, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, recipient_id, content,
                   message_type, attachment, project_id, is_read, read_at,
                   status, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_conversation_heads(&self, user_id: Uuid) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT DISTINCT ON (conversation_id)
                   id, conversation_id, sender_id, recipient_id, content,
                   message_type, attachment, project_id, is_read, read_at,
                   status, created_at
            FROM messages
            WHERE sender_id = $1 OR recipient_id = $1
            ORDER BY conversation_id, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_unread_counts(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT conversation_id, COUNT(*)
            FROM messages
            WHERE recipient_id = $1 AND is_read = false
            GROUP BY conversation_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &str,
        recipient_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = true, read_at = NOW(), status = 'read'::message_status
            WHERE conversation_id = $1
              AND recipient_id = $2
              AND is_read = false
            "#,
        )
        .bind(conversation_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_message_read(&self, message_id: Uuid) -> Result<Message, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET is_read = true, read_at = NOW(), status = 'read'::message_status
            WHERE id = $1
            RETURNING id, conversation_id, sender_id, recipient_id, content,
                      message_type, attachment, project_id, is_read, read_at,
                      status, created_at
            "#,
        )
        .bind(message_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE recipient_id = $1 AND is_read = false
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_message(&self, message_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
