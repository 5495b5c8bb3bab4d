use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::{Progress, WatchRecord};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WatchRecordResponse {
    pub(crate) video_id: String,
    pub(crate) watched_at: String,
}

impl WatchRecordResponse {
    pub(crate) fn from_db(record: WatchRecord) -> Self {
        Self { video_id: record.video_id, watched_at: record.watched_at }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ForumStatsResponse {
    pub(crate) posts: i64,
    pub(crate) replies: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressResponse {
    pub(crate) student_id: String,
    pub(crate) total_points: i64,
    pub(crate) current_streak: i32,
    pub(crate) last_activity_at: String,
    pub(crate) assignments_completed: Vec<String>,
    pub(crate) videos_watched: Vec<WatchRecordResponse>,
    pub(crate) badges: Vec<String>,
    pub(crate) forum_stats: ForumStatsResponse,
}

impl ProgressResponse {
    pub(crate) fn from_db(progress: Progress) -> Self {
        Self {
            student_id: progress.student_id,
            total_points: progress.total_points,
            current_streak: progress.current_streak,
            last_activity_at: format_primitive(progress.last_activity_at),
            assignments_completed: progress.assignments_completed.0,
            videos_watched: progress
                .videos_watched
                .0
                .into_iter()
                .map(WatchRecordResponse::from_db)
                .collect(),
            badges: progress.badges.0,
            forum_stats: ForumStatsResponse {
                posts: progress.forum_stats.0.posts,
                replies: progress.forum_stats.0.replies,
            },
        }
    }

    /// Shape returned before the student has earned anything.
    pub(crate) fn empty(student_id: String, now: time::PrimitiveDateTime) -> Self {
        Self {
            student_id,
            total_points: 0,
            current_streak: 0,
            last_activity_at: format_primitive(now),
            assignments_completed: Vec::new(),
            videos_watched: Vec::new(),
            badges: Vec::new(),
            forum_stats: ForumStatsResponse { posts: 0, replies: 0 },
        }
    }
}

/// Catalog entry combined with whether the student holds the badge.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BadgeResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) icon: String,
    pub(crate) earned: bool,
}
