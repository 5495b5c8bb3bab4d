use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Chat, ChatMessage};
use crate::db::types::ChatRole;

const COLUMNS: &str = "\
    id, student_id, title, message_count, last_message_at, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, chat_id, role, content, created_at";

pub(crate) struct CreateChat<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub title: &'a str,
    pub last_message_at: time::PrimitiveDateTime,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateChat<'_>) -> Result<Chat, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!(
        "INSERT INTO chats (
            id, student_id, title, message_count, last_message_at, created_at, updated_at
        ) VALUES ($1,$2,$3,0,$4,$5,$6)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.title)
    .bind(params.last_message_at)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

/// Looks the chat up under its owner; a foreign chat id reads as absent.
pub(crate) async fn find_for_student(
    pool: &PgPool,
    student_id: &str,
    id: &str,
) -> Result<Option<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!(
        "SELECT {COLUMNS} FROM chats WHERE student_id = $1 AND id = $2"
    ))
    .bind(student_id)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Chat>, sqlx::Error> {
    sqlx::query_as::<_, Chat>(&format!(
        "SELECT {COLUMNS} FROM chats WHERE student_id = $1 ORDER BY last_message_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_title(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    title: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chats SET title = $1, updated_at = $2 WHERE id = $3")
        .bind(title)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) struct CreateMessage<'a> {
    pub id: &'a str,
    pub chat_id: &'a str,
    pub role: ChatRole,
    pub content: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn insert_message(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateMessage<'_>,
) -> Result<ChatMessage, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "INSERT INTO chat_messages (id, chat_id, role, content, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {MESSAGE_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.chat_id)
    .bind(params.role)
    .bind(params.content)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn bump_message_stats(
    executor: impl sqlx::PgExecutor<'_>,
    chat_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE chats
         SET message_count = message_count + 1,
             last_message_at = $1,
             updated_at = $1
         WHERE id = $2",
    )
    .bind(now)
    .bind(chat_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_messages(
    pool: &PgPool,
    chat_id: &str,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE chat_id = $1 ORDER BY created_at"
    ))
    .bind(chat_id)
    .fetch_all(pool)
    .await
}

/// Newest messages for prompt context, returned oldest first.
pub(crate) async fn recent_messages(
    pool: &PgPool,
    chat_id: &str,
    limit: i64,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM (
            SELECT {MESSAGE_COLUMNS} FROM chat_messages
            WHERE chat_id = $1
            ORDER BY created_at DESC
            LIMIT $2
         ) latest ORDER BY created_at"
    ))
    .bind(chat_id)
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}
