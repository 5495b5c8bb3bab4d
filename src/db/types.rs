use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Admin,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    pub(crate) fn from_claim(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
pub(crate) enum SubmissionStatus {
    Submitted,
    Approved,
    NeedsRevision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "chat_role", rename_all = "lowercase")]
pub(crate) enum ChatRole {
    User,
    Assistant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_claim_roundtrip() {
        assert_eq!(UserRole::from_claim(UserRole::Admin.as_str()), Some(UserRole::Admin));
        assert_eq!(UserRole::from_claim(UserRole::Student.as_str()), Some(UserRole::Student));
        assert_eq!(UserRole::from_claim("superuser"), None);
    }

    #[test]
    fn submission_status_serializes_snake_case() {
        let encoded = serde_json::to_string(&SubmissionStatus::NeedsRevision).expect("encode");
        assert_eq!(encoded, "\"needs_revision\"");
    }
}
