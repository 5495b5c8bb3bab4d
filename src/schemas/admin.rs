use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AdminEmail, Profile, User};
use crate::db::types::SubmissionStatus;
use crate::schemas::progress::ProgressResponse;
use crate::schemas::submission::SubmissionResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminStudentResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
    pub(crate) total_points: i64,
    pub(crate) current_streak: i32,
    pub(crate) last_activity_at: Option<String>,
    pub(crate) badge_count: i32,
    pub(crate) submission_count: i64,
    pub(crate) approved_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminEmailCreate {
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdminEmailResponse {
    pub(crate) email: String,
    pub(crate) added_by: Option<String>,
    pub(crate) created_at: String,
}

impl AdminEmailResponse {
    pub(crate) fn from_db(entry: AdminEmail) -> Self {
        Self {
            email: entry.email,
            added_by: entry.added_by,
            created_at: format_primitive(entry.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlatformStatsResponse {
    pub(crate) total_students: i64,
    pub(crate) total_assignments: i64,
    pub(crate) total_submissions: i64,
    pub(crate) pending_review: i64,
    pub(crate) total_videos: i64,
    pub(crate) points_awarded: i64,
    pub(crate) active_students: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SeedSummary {
    pub(crate) created: Vec<i32>,
    pub(crate) skipped: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewQueueItem {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) assignment_id: String,
    pub(crate) assignment_title: String,
    pub(crate) week_number: i32,
    pub(crate) status: SubmissionStatus,
    pub(crate) content: String,
    pub(crate) files: serde_json::Value,
    pub(crate) submitted_at: String,
    pub(crate) has_ai_feedback: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackfillSummary {
    pub(crate) processed: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentAccountResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) display_name: String,
    pub(crate) role: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl StudentAccountResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileResponse {
    pub(crate) cohort: Option<String>,
    pub(crate) goals: Option<String>,
    pub(crate) timezone: Option<String>,
    pub(crate) onboarding_completed: bool,
}

impl ProfileResponse {
    pub(crate) fn from_db(profile: Profile) -> Self {
        Self {
            cohort: profile.cohort,
            goals: profile.goals,
            timezone: profile.timezone,
            onboarding_completed: profile.onboarding_completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentDetailResponse {
    pub(crate) student: StudentAccountResponse,
    pub(crate) profile: Option<ProfileResponse>,
    pub(crate) progress: ProgressResponse,
    pub(crate) submissions: Vec<SubmissionResponse>,
}
