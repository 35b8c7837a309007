use anyhow::{Context, Result};
use config::{Config, Environment, File};
use ledger::RewardPolicy;
use moka::future::Cache;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, trace};

use crate::schemas::AppState;
use crate::session::SessionStore;

/// Runtime settings of the rewards service.
///
/// Loaded from built-in defaults, then an optional YAML file named by
/// `REWARDCORE_CONFIG` (default `rewardcore.yaml`), then `REWARDCORE__*`
/// environment variables, e.g. `REWARDCORE__REFERRAL_BONUS=0.25`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub referral_bonus: Decimal,
    pub minimum_withdrawal: Decimal,
    pub session_ttl_hours: i64,
    /// Base of the shareable referral links
    pub public_base_url: String,
    /// Referrals needed before the prize draw unlocks
    pub prize_draw_threshold: i32,
    pub entries_per_referral: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            referral_bonus: Decimal::new(20, 2),
            minimum_withdrawal: Decimal::new(200, 2),
            session_ttl_hours: 168,
            public_base_url: "http://localhost:3000".to_string(),
            prize_draw_threshold: 5,
            entries_per_referral: 5,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path = std::env::var("REWARDCORE_CONFIG").unwrap_or_else(|_| "rewardcore.yaml".to_string());
        debug!("Loading settings, optional file: {}", path);

        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("referral_bonus", defaults.referral_bonus.to_string())?
            .set_default("minimum_withdrawal", defaults.minimum_withdrawal.to_string())?
            .set_default("session_ttl_hours", defaults.session_ttl_hours)?
            .set_default("public_base_url", defaults.public_base_url)?
            .set_default("prize_draw_threshold", i64::from(defaults.prize_draw_threshold))?
            .set_default("entries_per_referral", i64::from(defaults.entries_per_referral))?
            .add_source(File::with_name(&path).required(false))
            .add_source(Environment::with_prefix("REWARDCORE").separator("__").try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize::<Settings>()
            .context("Invalid settings")?;

        Ok(settings)
    }

    pub fn reward_policy(&self) -> RewardPolicy {
        RewardPolicy {
            referral_bonus: self.referral_bonus,
            minimum_withdrawal: self.minimum_withdrawal,
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

/// Builds the shared state around an open connection.
pub fn build_app_state(db: DatabaseConnection, settings: Settings) -> AppState {
    trace!("Building application state");
    let cache = Cache::builder()
        .max_capacity(100)
        .time_to_live(Duration::from_secs(60))
        .build();
    let sessions = SessionStore::new(db.clone(), settings.session_ttl(), settings.reward_policy());

    AppState {
        db,
        cache,
        sessions,
        settings: Arc::new(settings),
    }
}

/// Initialize application configuration and state
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;
    debug!("Settings: {:?}", settings);

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(build_app_state(db, settings))
}
