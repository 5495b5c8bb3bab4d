use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Chat, ChatMessage};
use crate::db::types::ChatRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ChatCreate {
    #[validate(length(min = 1, max = 4000, message = "message must be 1..4000 characters"))]
    pub(crate) message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MessageCreate {
    #[validate(length(min = 1, max = 4000, message = "content must be 1..4000 characters"))]
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) message_count: i32,
    pub(crate) last_message_at: String,
    pub(crate) created_at: String,
}

impl ChatResponse {
    pub(crate) fn from_db(chat: Chat) -> Self {
        Self {
            id: chat.id,
            title: chat.title,
            message_count: chat.message_count,
            last_message_at: format_primitive(chat.last_message_at),
            created_at: format_primitive(chat.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatMessageResponse {
    pub(crate) id: String,
    pub(crate) chat_id: String,
    pub(crate) role: ChatRole,
    pub(crate) content: String,
    pub(crate) created_at: String,
}

impl ChatMessageResponse {
    pub(crate) fn from_db(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            role: message.role,
            content: message.content,
            created_at: format_primitive(message.created_at),
        }
    }
}

/// Reply to posting a message: the stored user turn plus the tutor's answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatExchangeResponse {
    pub(crate) chat: ChatResponse,
    pub(crate) user_message: ChatMessageResponse,
    pub(crate) assistant_message: ChatMessageResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatMessagesResponse {
    pub(crate) chat: ChatResponse,
    pub(crate) messages: Vec<ChatMessageResponse>,
}
