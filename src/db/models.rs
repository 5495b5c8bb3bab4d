use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{ChatRole, SubmissionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Profile {
    pub(crate) user_id: String,
    pub(crate) cohort: Option<String>,
    pub(crate) goals: Option<String>,
    pub(crate) timezone: Option<String>,
    pub(crate) onboarding_completed: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assignment {
    pub(crate) id: String,
    pub(crate) week_number: i32,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) requirements: Json<Vec<String>>,
    pub(crate) due_date: PrimitiveDateTime,
    pub(crate) is_published: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Descriptor of one stored upload, embedded in the submission row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredFile {
    pub(crate) filename: String,
    pub(crate) key: String,
    pub(crate) size: i64,
    pub(crate) mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) assignment_id: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) content: String,
    pub(crate) files: Json<Vec<StoredFile>>,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) ai_feedback: Option<Json<serde_json::Value>>,
    pub(crate) instructor_feedback: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One watched-video marker inside the progress row. `watched_at` is kept as
/// an RFC 3339 string so the stored JSON stays readable as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WatchRecord {
    pub(crate) video_id: String,
    pub(crate) watched_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ForumStats {
    pub(crate) posts: i64,
    pub(crate) replies: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Progress {
    pub(crate) student_id: String,
    pub(crate) total_points: i64,
    pub(crate) current_streak: i32,
    pub(crate) last_activity_at: PrimitiveDateTime,
    pub(crate) assignments_completed: Json<Vec<String>>,
    pub(crate) videos_watched: Json<Vec<WatchRecord>>,
    pub(crate) badges: Json<Vec<String>>,
    pub(crate) forum_stats: Json<ForumStats>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Chat {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) title: String,
    pub(crate) message_count: i32,
    pub(crate) last_message_at: PrimitiveDateTime,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ChatMessage {
    pub(crate) id: String,
    pub(crate) chat_id: String,
    pub(crate) role: ChatRole,
    pub(crate) content: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct LiveSession {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) scheduled_at: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) meeting_url: Option<String>,
    pub(crate) registered_students: Json<Vec<String>>,
    pub(crate) attended_students: Json<Vec<String>>,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Video {
    pub(crate) id: String,
    pub(crate) youtube_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) published_at: Option<PrimitiveDateTime>,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AdminEmail {
    pub(crate) email: String,
    pub(crate) added_by: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}
