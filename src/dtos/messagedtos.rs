use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::userdtos::UserSummaryDto;
use crate::models::messagemodel::{Message, MessageType};

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageDto {
    pub recipient_id: Uuid,

    #[validate(length(min = 1, max = 5000, message = "Message content is required"))]
    pub content: String,

    #[serde(default)]
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationQueryDto {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LastMessageDto {
    pub content: String,
    pub message_type: MessageType,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// One row in the conversation list: the thread id, its newest message,
/// the other participant, and how many messages are still unread.
#[derive(Debug, Serialize)]
pub struct ConversationSummaryDto {
    pub conversation_id: String,
    pub last_message: LastMessageDto,
    pub other_participant: UserSummaryDto,
    pub unread_count: i64,
    pub project_id: Option<Uuid>,
}

impl ConversationSummaryDto {
    pub fn from_head(head: &Message, other: &UserSummaryDto, unread_count: i64) -> Self {
        ConversationSummaryDto {
            conversation_id: head.conversation_id.to_owned(),
            last_message: LastMessageDto {
                content: head.content.to_owned(),
                message_type: head.message_type,
                created_at: head.created_at,
                is_read: head.is_read,
            },
            other_participant: other.clone(),
            unread_count,
            project_id: head.project_id,
        }
    }
}
