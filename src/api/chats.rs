use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::ChatMessage;
use crate::db::types::ChatRole;
use crate::repositories;
use crate::schemas::chat::{
    ChatCreate, ChatExchangeResponse, ChatMessageResponse, ChatMessagesResponse, ChatResponse,
    MessageCreate,
};
use crate::services::tutor;

const CHAT_RATE_LIMIT: u64 = 20;
const CHAT_RATE_WINDOW_SECONDS: u64 = 60;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_chat).get(list_chats))
        .route("/:chat_id/messages", get(list_messages).post(post_message))
}

async fn create_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChatCreate>,
) -> Result<(StatusCode, Json<ChatExchangeResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    check_rate_limit(&state, &user.id).await?;

    let title = tutor::generate_chat_title(&state, &payload.message).await;
    let now = primitive_now_utc();
    let chat = repositories::chats::create(
        state.db(),
        repositories::chats::CreateChat {
            id: &Uuid::new_v4().to_string(),
            student_id: &user.id,
            title: &title,
            last_message_at: now,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to create chat"))?;

    let (user_message, assistant_message) = run_exchange(&state, &chat.id, &payload.message).await?;

    tracing::info!(chat_id = %chat.id, student_id = %user.id, "Chat started");

    let chat = repositories::chats::find_for_student(state.db(), &user.id, &chat.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to reload chat"))?
        .ok_or_else(|| ApiError::NotFound("Chat not found".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(ChatExchangeResponse {
            chat: ChatResponse::from_db(chat),
            user_message: ChatMessageResponse::from_db(user_message),
            assistant_message: ChatMessageResponse::from_db(assistant_message),
        }),
    ))
}

async fn list_chats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ChatResponse>>, ApiError> {
    let chats = repositories::chats::list_by_student(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to list chats"))?;

    Ok(Json(chats.into_iter().map(ChatResponse::from_db).collect()))
}

async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatMessagesResponse>, ApiError> {
    let chat = repositories::chats::find_for_student(state.db(), &user.id, &chat_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load chat"))?
        .ok_or_else(|| ApiError::NotFound(format!("Chat {chat_id} not found")))?;

    let messages = repositories::chats::list_messages(state.db(), &chat.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to list messages"))?;

    Ok(Json(ChatMessagesResponse {
        chat: ChatResponse::from_db(chat),
        messages: messages.into_iter().map(ChatMessageResponse::from_db).collect(),
    }))
}

async fn post_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<String>,
    Json(payload): Json<MessageCreate>,
) -> Result<Json<ChatExchangeResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    check_rate_limit(&state, &user.id).await?;

    let chat = repositories::chats::find_for_student(state.db(), &user.id, &chat_id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to load chat"))?
        .ok_or_else(|| ApiError::NotFound(format!("Chat {chat_id} not found")))?;

    let (user_message, assistant_message) = run_exchange(&state, &chat.id, &payload.content).await?;

    let chat = repositories::chats::find_for_student(state.db(), &user.id, &chat.id)
        .await
        .map_err(|e| ApiError::database(e, "Failed to reload chat"))?
        .ok_or_else(|| ApiError::NotFound(format!("Chat {chat_id} not found")))?;

    Ok(Json(ChatExchangeResponse {
        chat: ChatResponse::from_db(chat),
        user_message: ChatMessageResponse::from_db(user_message),
        assistant_message: ChatMessageResponse::from_db(assistant_message),
    }))
}

/// Stores the user turn, asks the tutor, stores the answer. The user turn
/// commits before the tutor call, so a failed call leaves it in place and
/// surfaces as 502.
async fn run_exchange(
    state: &AppState,
    chat_id: &str,
    content: &str,
) -> Result<(ChatMessage, ChatMessage), ApiError> {
    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::database(e, "Failed to open transaction"))?;
    let user_message = repositories::chats::insert_message(
        &mut *tx,
        repositories::chats::CreateMessage {
            id: &Uuid::new_v4().to_string(),
            chat_id,
            role: ChatRole::User,
            content,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to store message"))?;
    repositories::chats::bump_message_stats(&mut *tx, chat_id, now)
        .await
        .map_err(|e| ApiError::database(e, "Failed to update chat stats"))?;
    tx.commit().await.map_err(|e| ApiError::database(e, "Failed to commit message"))?;

    let reply = tutor::reply(state, chat_id)
        .await
        .map_err(|e| ApiError::BadGateway(format!("AI tutor request failed: {e:#}")))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::database(e, "Failed to open transaction"))?;
    let assistant_message = repositories::chats::insert_message(
        &mut *tx,
        repositories::chats::CreateMessage {
            id: &Uuid::new_v4().to_string(),
            chat_id,
            role: ChatRole::Assistant,
            content: &reply,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::database(e, "Failed to store reply"))?;
    repositories::chats::bump_message_stats(&mut *tx, chat_id, now)
        .await
        .map_err(|e| ApiError::database(e, "Failed to update chat stats"))?;
    tx.commit().await.map_err(|e| ApiError::database(e, "Failed to commit reply"))?;

    Ok((user_message, assistant_message))
}

async fn check_rate_limit(state: &AppState, user_id: &str) -> Result<(), ApiError> {
    let key = format!("rl:chat:{user_id}");
    let allowed = state
        .redis()
        .rate_limit(&key, CHAT_RATE_LIMIT, CHAT_RATE_WINDOW_SECONDS)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many messages, slow down"));
    }
    Ok(())
}
