//! # State Module
//!
//! Shared handles injected into every handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │                        AppState (Clone)                                 │
//! │          ┌──────────┬──────────┼──────────┬──────────┐                  │
//! │          ▼          ▼          ▼          ▼          ▼                  │
//! │     Database   JwtManager  Passwords  ImageHost  CartStore              │
//! │     (pool)     (Arc)       (argon2)   (reqwest)  (Arc<Mutex<..>>)       │
//! │                                                                         │
//! │  Handlers receive handles through `State<AppState>`. Nothing is a       │
//! │  process-wide singleton, so tests build their own state per case.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use shopdesk_db::Database;

use crate::auth::{JwtManager, Passwords};
use crate::config::ServerConfig;
use crate::images::ImageHost;

pub use cart::CartStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub passwords: Passwords,
    pub images: ImageHost,
    pub carts: CartStore,
    /// Offset used for report day buckets and "today".
    pub report_offset: FixedOffset,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(
            &config.jwt_secret,
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState {
            db,
            jwt: Arc::new(jwt),
            passwords: Passwords::default(),
            images: ImageHost::new(&config.images),
            carts: CartStore::new(),
            report_offset: config.report_offset().unwrap_or_else(|| Utc.fix()),
            config: Arc::new(config),
        }
    }

    /// Replaces the password hasher (tests use a low-cost one).
    pub fn with_passwords(mut self, passwords: Passwords) -> Self {
        self.passwords = passwords;
        self
    }
}
