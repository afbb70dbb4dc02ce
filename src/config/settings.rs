use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::amount::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database_url: String,
    /// Username signed in when the shell starts.
    pub session_user: Option<String>,
    /// Seconds allowed for each store round-trip.
    pub store_timeout: u64,
    pub max_retry_attempts: u32,
    pub currency_symbol: String,
    /// Home-screen limit shown when no budget is set for the month.
    pub default_monthly_limit: f64,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "campus_wallet.db".to_string());

        let session_user = env::var("CAMPUS_WALLET_USER")
            .ok()
            .filter(|user| !user.trim().is_empty());

        let store_timeout = env::var("STORE_TIMEOUT")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<u64>()
            .map_err(|e| anyhow!("STORE_TIMEOUT must be a whole number of seconds: {e}"))?;

        let max_retry_attempts = env::var("MAX_RETRY_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()
            .unwrap_or(3);

        let currency_symbol = env::var("CURRENCY_SYMBOL")
            .unwrap_or_else(|_| "৳".to_string());

        let default_monthly_limit = env::var("DEFAULT_MONTHLY_LIMIT")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<f64>()
            .map_err(|e| anyhow!("DEFAULT_MONTHLY_LIMIT must be a number: {e}"))?;

        Ok(Settings {
            database_url,
            session_user,
            store_timeout,
            max_retry_attempts,
            currency_symbol,
            default_monthly_limit,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(anyhow!("Database URL cannot be empty"));
        }

        if self.max_retry_attempts == 0 {
            return Err(anyhow!("Max retry attempts must be greater than 0"));
        }

        if !(1..=300).contains(&self.store_timeout) {
            return Err(anyhow!("Store timeout must be between 1 and 300 seconds"));
        }

        if self.default_monthly_limit != 0.0 {
            Amount::from_input(self.default_monthly_limit)
                .map_err(|e| anyhow!("Default monthly limit is invalid: {e}"))?;
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout)
    }

    /// Validated by [`Settings::validate`]; zero when unset or invalid.
    pub fn default_monthly_limit(&self) -> Amount {
        Amount::from_input(self.default_monthly_limit).unwrap_or(Amount::ZERO)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "campus_wallet.db".to_string(),
            session_user: None,
            store_timeout: 15,
            max_retry_attempts: 3,
            currency_symbol: "৳".to_string(),
            default_monthly_limit: 2000.0,
        }
    }
}
