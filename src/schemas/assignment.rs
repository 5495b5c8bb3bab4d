use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Assignment;
use crate::schemas::deserialize_datetime_flexible;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) week_number: i32,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) requirements: Vec<String>,
    pub(crate) due_date: String,
    pub(crate) is_published: bool,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            week_number: assignment.week_number,
            title: assignment.title,
            description: assignment.description,
            requirements: assignment.requirements.0,
            due_date: format_primitive(assignment.due_date),
            is_published: assignment.is_published,
            created_at: format_primitive(assignment.created_at),
            updated_at: format_primitive(assignment.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(alias = "weekNumber")]
    #[validate(range(min = 1, message = "week_number must be positive"))]
    pub(crate) week_number: i32,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) requirements: Vec<String>,
    #[serde(alias = "dueDate", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) due_date: OffsetDateTime,
    #[serde(default)]
    #[serde(alias = "isPublished")]
    pub(crate) is_published: bool,
}

