use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::LiveSession;
use crate::schemas::{deserialize_datetime_flexible, deserialize_option_datetime_flexible};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LiveSessionResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) scheduled_at: String,
    pub(crate) duration_minutes: i32,
    pub(crate) meeting_url: Option<String>,
    pub(crate) registered_count: usize,
    pub(crate) is_registered: bool,
    pub(crate) attended_students: Vec<String>,
}

impl LiveSessionResponse {
    /// `viewer_id` decides the `is_registered` flag; admins pass their own id
    /// and simply read the roster fields.
    pub(crate) fn from_db(session: LiveSession, viewer_id: &str) -> Self {
        let registered = session.registered_students.0;
        Self {
            id: session.id,
            title: session.title,
            description: session.description,
            scheduled_at: format_primitive(session.scheduled_at),
            duration_minutes: session.duration_minutes,
            meeting_url: session.meeting_url,
            registered_count: registered.len(),
            is_registered: registered.iter().any(|id| id == viewer_id),
            attended_students: session.attended_students.0,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LiveSessionCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(alias = "scheduledAt", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) scheduled_at: OffsetDateTime,
    #[serde(default = "default_duration_minutes")]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, max = 480, message = "duration_minutes must be 1..480"))]
    pub(crate) duration_minutes: i32,
    #[serde(default)]
    #[serde(alias = "meetingUrl")]
    pub(crate) meeting_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LiveSessionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "scheduledAt",
        deserialize_with = "deserialize_option_datetime_flexible"
    )]
    pub(crate) scheduled_at: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, max = 480, message = "duration_minutes must be 1..480"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "meetingUrl")]
    pub(crate) meeting_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceUpdate {
    #[serde(alias = "attendedStudentIds")]
    pub(crate) attended_student_ids: Vec<String>,
}

fn default_duration_minutes() -> i32 {
    60
}
