//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use chrono::FixedOffset;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Secret used when `JWT_SECRET` is unset. Only suitable for development.
pub const DEV_JWT_SECRET: &str = "shopdesk-dev-secret-change-in-production";

/// Image host settings.
///
/// Uploads go to `IMAGE_UPLOAD_URL` when set, otherwise to the Cloudinary
/// endpoint for `IMAGE_CLOUD_NAME`. With neither, uploads are disabled and
/// records are saved without images.
#[derive(Debug, Clone, Default)]
pub struct ImageConfig {
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub folder: Option<String>,
    pub upload_url: Option<String>,
}

impl ImageConfig {
    /// The upload endpoint, if uploads are configured.
    pub fn endpoint(&self) -> Option<String> {
        if let Some(url) = &self.upload_url {
            return Some(url.clone());
        }
        self.cloud_name
            .as_ref()
            .map(|cloud| format!("https://api.cloudinary.com/v1_1/{}/image/upload", cloud))
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    pub images: ImageConfig,

    /// Offset of the store's local time from UTC, for report day buckets
    pub report_utc_offset_minutes: i32,

    /// Items below this quantity count as low stock
    pub low_stock_threshold: i64,

    /// Max size of one uploaded file in bytes (default: 5 MiB)
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_path: PathBuf::from("./shopdesk.db"),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 3600,
            jwt_refresh_lifetime_secs: 604800,
            images: ImageConfig::default(),
            report_utc_offset_minutes: 0,
            low_stock_threshold: shopdesk_core::DEFAULT_LOW_STOCK_THRESHOLD,
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            bind_addr: env::var("SHOPDESK_BIND")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHOPDESK_BIND".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./shopdesk.db".to_string())
                .into(),

            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),

            jwt_access_lifetime_secs: env::var("JWT_ACCESS_LIFETIME_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()))?,

            jwt_refresh_lifetime_secs: env::var("JWT_REFRESH_LIFETIME_SECS")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()))?,

            images: ImageConfig {
                cloud_name: non_empty_var("IMAGE_CLOUD_NAME"),
                upload_preset: non_empty_var("IMAGE_UPLOAD_PRESET"),
                folder: non_empty_var("IMAGE_FOLDER"),
                upload_url: non_empty_var("IMAGE_UPLOAD_URL"),
            },

            report_utc_offset_minutes: env::var("REPORT_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("REPORT_UTC_OFFSET_MINUTES".to_string()))?,

            low_stock_threshold: env::var("LOW_STOCK_THRESHOLD")
                .unwrap_or_else(|_| shopdesk_core::DEFAULT_LOW_STOCK_THRESHOLD.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LOW_STOCK_THRESHOLD".to_string()))?,

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "5242880".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string()))?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_ACCESS_LIFETIME_SECS".to_string()));
        }
        if self.jwt_refresh_lifetime_secs <= self.jwt_access_lifetime_secs {
            return Err(ConfigError::InvalidValue("JWT_REFRESH_LIFETIME_SECS".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.report_offset().is_none() {
            return Err(ConfigError::InvalidValue("REPORT_UTC_OFFSET_MINUTES".to_string()));
        }
        if self.images.endpoint().is_some() && self.images.upload_preset.is_none() {
            return Err(ConfigError::MissingRequired("IMAGE_UPLOAD_PRESET".to_string()));
        }
        Ok(())
    }

    /// The report offset as a chrono offset. `None` if out of range.
    pub fn report_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.report_utc_offset_minutes.checked_mul(60)?)
    }

    /// True when the signing secret is the built-in development value.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
