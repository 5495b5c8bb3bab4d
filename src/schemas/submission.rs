use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{StoredFile, Submission};
use crate::db::types::SubmissionStatus;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredFileResponse {
    pub(crate) filename: String,
    pub(crate) key: String,
    pub(crate) size: i64,
    pub(crate) mime_type: String,
}

impl StoredFileResponse {
    pub(crate) fn from_db(file: StoredFile) -> Self {
        Self {
            filename: file.filename,
            key: file.key,
            size: file.size,
            mime_type: file.mime_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) assignment_id: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) content: String,
    pub(crate) files: Vec<StoredFileResponse>,
    pub(crate) submitted_at: String,
    pub(crate) ai_feedback: Option<serde_json::Value>,
    pub(crate) instructor_feedback: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<String>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            id: submission.id,
            student_id: submission.student_id,
            assignment_id: submission.assignment_id,
            status: submission.status,
            content: submission.content,
            files: submission
                .files
                .0
                .into_iter()
                .map(StoredFileResponse::from_db)
                .collect(),
            submitted_at: format_primitive(submission.submitted_at),
            ai_feedback: submission.ai_feedback.map(|value| value.0),
            instructor_feedback: submission.instructor_feedback,
            reviewed_by: submission.reviewed_by,
            reviewed_at: submission.reviewed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReviewRequest {
    pub(crate) status: SubmissionStatus,
    #[serde(default)]
    #[serde(alias = "instructorFeedback")]
    #[validate(length(max = 4000, message = "instructor_feedback is too long"))]
    pub(crate) instructor_feedback: Option<String>,
}

/// Review outcome: the reviewed submission plus whatever the approval
/// granted. `points_awarded` stays 0 for a revision request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewResponse {
    pub(crate) submission: SubmissionResponse,
    pub(crate) points_awarded: i64,
    pub(crate) total_points: Option<i64>,
    pub(crate) new_badges: Vec<String>,
}
