use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{messagedb::MessageExt, projectdb::ProjectExt, userdb::UserExt},
    dtos::{
        messagedtos::{ConversationQueryDto, ConversationSummaryDto, SendMessageDto},
        userdtos::{Response, UserSummaryDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::messagemodel::MessageType,
    service::access,
    utils::{conversation::conversation_id, formdata::nest_fields, upload::UploadField},
    AppState,
};

pub fn messages_handler() -> Router {
    Router::new()
        .route("/conversations", get(get_conversations))
        .route("/conversation/:conversation_id", get(get_conversation))
        .route("/send", post(send_message))
        .route("/:message_id/read", put(mark_message_read))
        .route("/unread-count", get(get_unread_count))
        .route("/:message_id", delete(delete_message))
}

pub async fn get_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let heads = app_state
        .db_client
        .get_conversation_heads(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let unread: HashMap<String, i64> = app_state
        .db_client
        .get_unread_counts(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .into_iter()
        .collect();

    let mut conversations = Vec::new();
    for head in &heads {
        let other_user_id = if head.sender_id == auth.user.id {
            head.recipient_id
        } else {
            head.sender_id
        };

        let other_user = match app_state
            .db_client
            .get_user(Some(other_user_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
        {
            Some(user) => user,
            // Skip threads whose counterpart no longer resolves.
            None => continue,
        };

        let unread_count = unread.get(&head.conversation_id).copied().unwrap_or(0);

        conversations.push(ConversationSummaryDto::from_head(
            head,
            &UserSummaryDto::from_user(&other_user),
            unread_count,
        ));
    }

    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));

    Ok(Json(serde_json::json!({
        "status": "success",
        "conversations": conversations
    })))
}

pub async fn get_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(conversation_id): Path<String>,
    Query(pagination): Query<ConversationQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(50) as i64;
    let offset = ((page - 1) * limit as u32) as i64;

    let mut messages = app_state
        .db_client
        .get_conversation_messages(&conversation_id, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if messages.is_empty() {
        return Ok(Json(serde_json::json!({
            "status": "success",
            "messages": [],
            "otherParticipant": null,
            "project": null
        })));
    }

    // Opening the thread flips every message addressed to the reader.
    // Sender-authored and already-read rows are untouched.
    app_state
        .db_client
        .mark_conversation_read(&conversation_id, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let first = &messages[0];
    let other_user_id = if first.sender_id == auth.user.id {
        first.recipient_id
    } else {
        first.sender_id
    };

    let other_participant = app_state
        .db_client
        .get_user(Some(other_user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .map(|user| UserSummaryDto::from_user(&user));

    let project_id = messages.iter().find_map(|m| m.project_id);

    // Stored newest-first; hand back in chronological order.
    messages.reverse();

    Ok(Json(serde_json::json!({
        "status": "success",
        "messages": messages,
        "otherParticipant": other_participant,
        "project": project_id
    })))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let (fields, mut files) = app_state
        .file_intake
        .collect(&mut multipart, &[UploadField::MessageAttachment])
        .await?;

    let body: SendMessageDto = serde_json::from_value(nest_fields(fields))
        .map_err(|e| HttpError::bad_request(format!("Invalid message payload: {}", e)))?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.recipient_id == auth.user.id {
        return Err(HttpError::bad_request("Cannot send a message to yourself"));
    }

    let _recipient = app_state
        .db_client
        .get_user(Some(body.recipient_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Recipient not found"))?;

    if let Some(project_id) = body.project_id {
        app_state
            .db_client
            .get_project(project_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Project not found"))?;
    }

    let conversation = conversation_id(auth.user.id, body.recipient_id, body.project_id);

    let attachment = files
        .remove(&UploadField::MessageAttachment)
        .unwrap_or_default()
        .first()
        .map(|f| f.to_attachment());

    let message_type = match &attachment {
        Some(attachment) if attachment.mime_type.starts_with("image/") => MessageType::Image,
        Some(_) => MessageType::File,
        None => MessageType::Text,
    };

    let message = app_state
        .db_client
        .save_message(
            &conversation,
            auth.user.id,
            body.recipient_id,
            body.content.trim().to_string(),
            message_type,
            attachment,
            body.project_id,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": message
        })),
    ))
}

pub async fn mark_message_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let message = app_state
        .db_client
        .get_message(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    if !access::can_mark_message_read(&auth.user, &message) {
        return Err(HttpError::forbidden("Not authorized"));
    }

    app_state
        .db_client
        .mark_message_read(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(Response {
        status: "success",
        message: "Message marked as read".to_string(),
    }))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let count = app_state
        .db_client
        .get_unread_count(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "unreadCount": count
    })))
}

pub async fn delete_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let message = app_state
        .db_client
        .get_message(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    if !access::can_delete_message(&auth.user, &message) {
        return Err(HttpError::forbidden(
            "Not authorized to delete this message",
        ));
    }

    app_state
        .db_client
        .delete_message(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(Response {
        status: "success",
        message: "Message deleted successfully".to_string(),
    }))
}
