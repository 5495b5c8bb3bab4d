use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Video;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoResponse {
    pub(crate) id: String,
    pub(crate) youtube_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) published_at: Option<String>,
    pub(crate) position: i32,
    pub(crate) watched: bool,
}

impl VideoResponse {
    pub(crate) fn from_db(video: Video, watched: bool) -> Self {
        Self {
            id: video.id,
            youtube_id: video.youtube_id,
            title: video.title,
            description: video.description,
            thumbnail_url: video.thumbnail_url,
            published_at: video.published_at.map(format_primitive),
            position: video.position,
            watched,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImportSummary {
    pub(crate) imported: usize,
    pub(crate) skipped: usize,
}

/// `recorded` is false for a repeat watch, which never grants badges.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WatchResponse {
    pub(crate) recorded: bool,
    pub(crate) new_badges: Vec<String>,
}
