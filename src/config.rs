use serde::Deserialize;
use std::time::Duration;

use crate::error::AppResult;

/// Longest accepted pause between sync cycles (one week)
pub const MAX_SYNC_PERIOD_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bind_address: String,
    pub ledger_rpc_url: String,
    pub ipfs_api_url: String,
    pub provider_id: u64,
    pub role_account: String,
    pub sync_period_ms: u64,
    pub request_timeout_secs: u64,
    pub wait_for_chain_sync: bool,
    pub chain_sync_poll_secs: u64,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self::from_source(config::Environment::default())?)
    }

    fn from_source(env: config::Environment) -> Result<Self, config::ConfigError> {
        let config: Config = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("ledger_rpc_url", "http://localhost:9933")?
            .set_default("ipfs_api_url", "http://localhost:5001")?
            .set_default("sync_period_ms", 300_000)?
            .set_default("request_timeout_secs", 30)?
            .set_default("wait_for_chain_sync", true)?
            .set_default("chain_sync_poll_secs", 6)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.sync_period_ms == 0 || config.sync_period_ms > MAX_SYNC_PERIOD_MS {
            return Err(config::ConfigError::Message(format!(
                "SYNC_PERIOD_MS must be between 1 and {}",
                MAX_SYNC_PERIOD_MS
            )));
        }

        Ok(config)
    }

    pub fn sync_period(&self) -> Duration {
        Duration::from_millis(self.sync_period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chain_sync_poll(&self) -> Duration {
        Duration::from_secs(self.chain_sync_poll_secs)
    }
}
