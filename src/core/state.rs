use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::anthropic::AnthropicClient;
use crate::services::gamification::PointsConfig;
use crate::services::storage::StorageService;
use crate::services::youtube::YoutubeService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
    ai: AnthropicClient,
    youtube: YoutubeService,
    points: PointsConfig,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
        ai: AnthropicClient,
        youtube: YoutubeService,
    ) -> Self {
        let points = PointsConfig::from_settings(&settings);
        Self { inner: Arc::new(InnerState { settings, db, redis, storage, ai, youtube, points }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.inner.storage.as_ref()
    }

    pub(crate) fn ai(&self) -> &AnthropicClient {
        &self.inner.ai
    }

    pub(crate) fn youtube(&self) -> &YoutubeService {
        &self.inner.youtube
    }

    pub(crate) fn points(&self) -> &PointsConfig {
        &self.inner.points
    }
}
