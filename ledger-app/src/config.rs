//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use ledger_hex::OrchestratorConfig;

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub rate_limit_per_minute: u32,
    pub orchestrator: OrchestratorConfig,
    /// OTLP collector; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = var_or("PORT", 3000)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let defaults = OrchestratorConfig::default();
        let orchestrator = OrchestratorConfig {
            lock_wait: Duration::from_millis(var_or(
                "LOCK_WAIT_MS",
                defaults.lock_wait.as_millis() as u64,
            )?),
            conflict_retries: var_or("CONFLICT_RETRIES", defaults.conflict_retries)?,
            retry_backoff: Duration::from_millis(var_or(
                "RETRY_BACKOFF_MS",
                defaults.retry_backoff.as_millis() as u64,
            )?),
        };

        Ok(Self {
            port,
            database_url,
            rate_limit_per_minute: var_or("RATE_LIMIT_PER_MINUTE", 100)?,
            orchestrator,
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        })
    }
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        Err(_) => Ok(default),
    }
}
