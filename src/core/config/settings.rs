use super::parsing::{
    env_optional, env_or_default, is_supported_upload_extension, parse_bool, parse_cors_origins,
    parse_environment, parse_f64, parse_i64, parse_string_list, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, AiSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings,
    GamificationSettings, RedisSettings, RuntimeSettings, S3Settings, SecuritySettings,
    ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings, UploadSettings,
    YoutubeSettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("MENTORA_HOST", "0.0.0.0");
        let port = env_or_default("MENTORA_PORT", "8000");

        let environment =
            parse_environment(env_optional("MENTORA_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("MENTORA_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Mentora API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_prefix = env_or_default("API_PREFIX", "/api");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let session_ttl_days =
            parse_u64("SESSION_TTL_DAYS", env_or_default("SESSION_TTL_DAYS", "14"))?;
        let session_ttl_new_user_days = parse_u64(
            "SESSION_TTL_NEW_USER_DAYS",
            env_or_default("SESSION_TTL_NEW_USER_DAYS", "5"),
        )?;
        let view_mode_ttl_days =
            parse_u64("VIEW_MODE_TTL_DAYS", env_or_default("VIEW_MODE_TTL_DAYS", "30"))?;
        let cookie_domain = env_optional("COOKIE_DOMAIN");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "mentora");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "mentora_db");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let anthropic_api_key = env_or_default("ANTHROPIC_API_KEY", "");
        let anthropic_base_url =
            env_or_default("ANTHROPIC_BASE_URL", "https://api.anthropic.com");
        let ai_model = env_or_default("AI_MODEL", "claude-sonnet-4-20250514");
        let ai_max_tokens = parse_u32("AI_MAX_TOKENS", env_or_default("AI_MAX_TOKENS", "2000"))?;
        let ai_temperature =
            parse_f64("AI_TEMPERATURE", env_or_default("AI_TEMPERATURE", "0.7"))?;
        let ai_request_timeout =
            parse_u64("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "60"))?;
        let batch_delay_ms =
            parse_u64("AI_BATCH_DELAY_MS", env_or_default("AI_BATCH_DELAY_MS", "1000"))?;
        let tutor_history_limit =
            parse_u64("TUTOR_HISTORY_LIMIT", env_or_default("TUTOR_HISTORY_LIMIT", "20"))?;

        let youtube_api_key = env_or_default("YOUTUBE_API_KEY", "");
        let youtube_channel_id = env_or_default("YOUTUBE_CHANNEL_ID", "");
        let youtube_base_url =
            env_or_default("YOUTUBE_BASE_URL", "https://www.googleapis.com/youtube/v3");
        let youtube_page_size =
            parse_u32("YOUTUBE_PAGE_SIZE", env_or_default("YOUTUBE_PAGE_SIZE", "50"))?;
        let youtube_max_pages =
            parse_u32("YOUTUBE_MAX_PAGES", env_or_default("YOUTUBE_MAX_PAGES", "10"))?;
        let youtube_request_timeout = parse_u64(
            "YOUTUBE_REQUEST_TIMEOUT",
            env_or_default("YOUTUBE_REQUEST_TIMEOUT", "30"),
        )?;

        let max_file_size_mb =
            parse_u64("MAX_FILE_SIZE_MB", env_or_default("MAX_FILE_SIZE_MB", "10"))?;
        let max_total_size_mb =
            parse_u64("MAX_TOTAL_SIZE_MB", env_or_default("MAX_TOTAL_SIZE_MB", "50"))?;
        let max_files_per_submission = parse_u64(
            "MAX_FILES_PER_SUBMISSION",
            env_or_default("MAX_FILES_PER_SUBMISSION", "5"),
        )?;
        let allowed_extensions = parse_string_list(
            env_optional("ALLOWED_UPLOAD_EXTENSIONS"),
            &["pdf", "png", "jpg", "jpeg", "txt", "md", "zip", "docx"],
        );

        let s3_endpoint = env_or_default("S3_ENDPOINT", "");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "mentora-submissions");
        let s3_region = env_or_default("S3_REGION", "us-east-1");

        let completion_points =
            parse_i64("POINTS_COMPLETION", env_or_default("POINTS_COMPLETION", "100"))?;
        let on_time_bonus =
            parse_i64("POINTS_ON_TIME_BONUS", env_or_default("POINTS_ON_TIME_BONUS", "20"))?;
        let first_submission_bonus = parse_i64(
            "POINTS_FIRST_SUBMISSION_BONUS",
            env_or_default("POINTS_FIRST_SUBMISSION_BONUS", "50"),
        )?;
        let streak_daily_bonus = parse_i64(
            "POINTS_STREAK_DAILY_BONUS",
            env_or_default("POINTS_STREAK_DAILY_BONUS", "10"),
        )?;

        let first_admin_email =
            env_or_default("FIRST_ADMIN_EMAIL", "").trim().to_ascii_lowercase();

        let log_level = env_or_default("MENTORA_LOG_LEVEL", "info");
        let json = env_optional("MENTORA_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);
        let prometheus_enabled = env_optional("PROMETHEUS_ENABLED")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_prefix },
            security: SecuritySettings {
                secret_key,
                algorithm,
                session_ttl_days,
                session_ttl_new_user_days,
                view_mode_ttl_days,
                cookie_domain,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            ai: AiSettings {
                anthropic_api_key,
                anthropic_base_url,
                ai_model,
                ai_max_tokens,
                ai_temperature,
                ai_request_timeout,
                batch_delay_ms,
                tutor_history_limit,
            },
            youtube: YoutubeSettings {
                api_key: youtube_api_key,
                channel_id: youtube_channel_id,
                base_url: youtube_base_url,
                page_size: youtube_page_size,
                max_pages: youtube_max_pages,
                request_timeout: youtube_request_timeout,
            },
            uploads: UploadSettings {
                max_file_size_mb,
                max_total_size_mb,
                max_files_per_submission,
                allowed_extensions,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            gamification: GamificationSettings {
                completion_points,
                on_time_bonus,
                first_submission_bonus,
                streak_daily_bonus,
            },
            admin: AdminSettings { first_admin_email },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn youtube(&self) -> &YoutubeSettings {
        &self.youtube
    }

    pub(crate) fn uploads(&self) -> &UploadSettings {
        &self.uploads
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn gamification(&self) -> &GamificationSettings {
        &self.gamification
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.allowed_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_UPLOAD_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        for extension in &self.uploads.allowed_extensions {
            if !is_supported_upload_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_UPLOAD_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.uploads.max_files_per_submission == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_FILES_PER_SUBMISSION",
                value: "0".to_string(),
            });
        }

        if self.uploads.max_total_size_mb < self.uploads.max_file_size_mb {
            return Err(ConfigError::InvalidValue {
                field: "MAX_TOTAL_SIZE_MB",
                value: self.uploads.max_total_size_mb.to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.ai.ai_temperature) {
            return Err(ConfigError::InvalidValue {
                field: "AI_TEMPERATURE",
                value: self.ai.ai_temperature.to_string(),
            });
        }

        if self.youtube.page_size == 0 || self.youtube.page_size > 50 {
            return Err(ConfigError::InvalidValue {
                field: "YOUTUBE_PAGE_SIZE",
                value: self.youtube.page_size.to_string(),
            });
        }

        if self.youtube.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "YOUTUBE_MAX_PAGES",
                value: "0".to_string(),
            });
        }

        if self.security.session_ttl_days == 0 || self.security.session_ttl_new_user_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SESSION_TTL_DAYS",
                value: "0".to_string(),
            });
        }

        if self.gamification.completion_points < 0
            || self.gamification.on_time_bonus < 0
            || self.gamification.first_submission_bonus < 0
            || self.gamification.streak_daily_bonus < 0
        {
            return Err(ConfigError::InvalidValue {
                field: "POINTS_COMPLETION",
                value: "negative point values are not allowed".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.ai.anthropic_api_key.is_empty() {
            return Err(ConfigError::MissingSecret("ANTHROPIC_API_KEY"));
        }
        if self.youtube.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("YOUTUBE_API_KEY"));
        }
        if self.youtube.channel_id.is_empty() {
            return Err(ConfigError::MissingSecret("YOUTUBE_CHANNEL_ID"));
        }
        if !self.s3.endpoint.is_empty()
            && (self.s3.access_key.is_empty() || self.s3.secret_key.is_empty())
        {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }
        if self.admin.first_admin_email.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_EMAIL"));
        }

        Ok(())
    }
}
