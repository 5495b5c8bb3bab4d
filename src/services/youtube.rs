use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use time::PrimitiveDateTime;

use crate::core::config::Settings;
use crate::core::time::parse_rfc3339;

/// One video discovered in the channel's uploads playlist.
#[derive(Debug, Clone)]
pub(crate) struct RemoteVideo {
    pub(crate) youtube_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) published_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone)]
pub(crate) struct YoutubeService {
    client: Client,
    api_key: String,
    channel_id: String,
    base_url: String,
    page_size: u32,
    max_pages: u32,
}

impl YoutubeService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.youtube().request_timeout))
            .build()
            .context("Failed to build YouTube HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.youtube().api_key.clone(),
            channel_id: settings.youtube().channel_id.clone(),
            base_url: settings.youtube().base_url.trim_end_matches('/').to_string(),
            page_size: settings.youtube().page_size,
            max_pages: settings.youtube().max_pages,
        })
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.channel_id.is_empty()
    }

    /// Walks the channel's uploads playlist page by page, newest first,
    /// stopping at the configured page cap.
    pub(crate) async fn fetch_channel_uploads(&self) -> Result<Vec<RemoteVideo>> {
        if !self.is_configured() {
            anyhow::bail!("YouTube import is not configured");
        }

        let playlist_id = self.uploads_playlist_id().await?;

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.max_pages {
            let payload = self.fetch_playlist_page(&playlist_id, page_token.as_deref()).await?;
            let (page_videos, next) = parse_playlist_page(&payload);
            videos.extend(page_videos);

            page_token = next;
            if page_token.is_none() {
                break;
            }
        }

        Ok(videos)
    }

    async fn uploads_playlist_id(&self) -> Result<String> {
        let endpoint = format!("{}/channels", self.base_url);
        let payload = self
            .get_json(
                &endpoint,
                &[("part", "contentDetails".to_string()), ("id", self.channel_id.clone())],
            )
            .await?;

        payload
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("contentDetails"))
            .and_then(|details| details.get("relatedPlaylists"))
            .and_then(|playlists| playlists.get("uploads"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .with_context(|| format!("Channel {} has no uploads playlist", self.channel_id))
    }

    async fn fetch_playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Value> {
        let endpoint = format!("{}/playlistItems", self.base_url);

        let mut params = vec![
            ("part", "snippet,contentDetails".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", self.page_size.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        self.get_json(&endpoint, &params).await
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(endpoint)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to call YouTube Data API")?;

        let status = response.status();
        let raw_body = response.text().await.context("Failed to read YouTube response")?;

        let parsed = serde_json::from_str::<Value>(&raw_body).map_err(|err| {
            anyhow::anyhow!(
                "YouTube returned non-JSON body (status {}): {}: {}",
                status,
                err,
                raw_body
            )
        })?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "YouTube request failed (status {}): {}",
                status,
                extract_error_message(&parsed)
            ));
        }

        Ok(parsed)
    }
}

fn parse_playlist_page(payload: &Value) -> (Vec<RemoteVideo>, Option<String>) {
    let videos = payload
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_video_item).collect())
        .unwrap_or_default();

    let next = payload.get("nextPageToken").and_then(Value::as_str).map(ToString::to_string);

    (videos, next)
}

fn parse_video_item(item: &Value) -> Option<RemoteVideo> {
    let snippet = item.get("snippet")?;

    // Playlist items carry the video id in contentDetails; older API shapes
    // only have snippet.resourceId.
    let youtube_id = item
        .get("contentDetails")
        .and_then(|details| details.get("videoId"))
        .or_else(|| snippet.get("resourceId").and_then(|resource| resource.get("videoId")))
        .and_then(Value::as_str)?
        .to_string();

    let title = snippet.get("title").and_then(Value::as_str).unwrap_or("Untitled").to_string();
    let description =
        snippet.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
    let thumbnail_url = best_thumbnail(snippet);

    let published_at = item
        .get("contentDetails")
        .and_then(|details| details.get("videoPublishedAt"))
        .or_else(|| snippet.get("publishedAt"))
        .and_then(Value::as_str)
        .and_then(|raw| parse_rfc3339(raw).ok());

    Some(RemoteVideo { youtube_id, title, description, thumbnail_url, published_at })
}

fn best_thumbnail(snippet: &Value) -> Option<String> {
    let thumbnails = snippet.get("thumbnails")?;

    for quality in ["maxres", "high", "medium", "default"] {
        if let Some(url) =
            thumbnails.get(quality).and_then(|thumb| thumb.get("url")).and_then(Value::as_str)
        {
            return Some(url.to_string());
        }
    }

    None
}

fn extract_error_message(payload: &Value) -> String {
    payload
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("message").and_then(Value::as_str))
        .unwrap_or("unknown_error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_playlist_page_reads_items_and_token() {
        let payload = json!({
            "nextPageToken": "CAUQAA",
            "items": [
                {
                    "snippet": {
                        "title": "Week 1: Getting Started",
                        "description": "Kickoff session",
                        "thumbnails": {
                            "default": {"url": "https://i.ytimg.com/vi/abc/default.jpg"},
                            "high": {"url": "https://i.ytimg.com/vi/abc/hq.jpg"}
                        }
                    },
                    "contentDetails": {
                        "videoId": "abc123",
                        "videoPublishedAt": "2025-02-01T12:00:00Z"
                    }
                },
                {
                    "snippet": {"title": "Broken item, no id"}
                }
            ]
        });

        let (videos, next) = parse_playlist_page(&payload);
        assert_eq!(next.as_deref(), Some("CAUQAA"));
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].youtube_id, "abc123");
        assert_eq!(videos[0].title, "Week 1: Getting Started");
        assert_eq!(videos[0].thumbnail_url.as_deref(), Some("https://i.ytimg.com/vi/abc/hq.jpg"));
        assert!(videos[0].published_at.is_some());
    }

    #[test]
    fn parse_video_item_falls_back_to_resource_id() {
        let item = json!({
            "snippet": {
                "title": "Legacy shape",
                "resourceId": {"videoId": "legacy42"},
                "publishedAt": "2025-01-15T08:30:00Z"
            }
        });

        let video = parse_video_item(&item).expect("video");
        assert_eq!(video.youtube_id, "legacy42");
        assert!(video.published_at.is_some());
        assert!(video.thumbnail_url.is_none());
    }

    #[test]
    fn last_page_has_no_token() {
        let payload = json!({"items": []});
        let (videos, next) = parse_playlist_page(&payload);
        assert!(videos.is_empty());
        assert!(next.is_none());
    }

    #[test]
    fn extract_error_message_reads_api_error_shape() {
        let payload = json!({
            "error": {"code": 403, "message": "The request is missing a valid API key."}
        });
        assert_eq!(
            extract_error_message(&payload),
            "The request is missing a valid API key."
        );
        assert_eq!(extract_error_message(&json!({})), "unknown_error");
    }
}
