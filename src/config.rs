//! Runtime configuration, read from the environment (after `.env`).

use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub nats_url: Option<String>,
    pub notify_subject: String,
    pub sweep_interval: Duration,
    pub auto_deliver_after: chrono::Duration,
    pub upload_dir: PathBuf,
    pub otp_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://grocery.db?mode=rwc".to_string(),
            database_max_connections: 5,
            port: 3000,
            nats_url: None,
            notify_subject: "eazzymart.notifications.email".to_string(),
            sweep_interval: Duration::from_secs(60 * 60),
            auto_deliver_after: chrono::Duration::hours(24),
            upload_dir: PathBuf::from("uploads"),
            otp_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; unset names take the defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let sweep_secs: u64 = parse_var(&var, "SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs())?;
        anyhow::ensure!(sweep_secs > 0, "SWEEP_INTERVAL_SECS must be at least 1");
        let deliver_hours: i64 = parse_var(&var, "AUTO_DELIVER_AFTER_HOURS", defaults.auto_deliver_after.num_hours())?;
        anyhow::ensure!(deliver_hours > 0, "AUTO_DELIVER_AFTER_HOURS must be positive");

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_var(&var, "DATABASE_MAX_CONNECTIONS", defaults.database_max_connections)?,
            port: parse_var(&var, "PORT", defaults.port)?,
            nats_url: var("NATS_URL").filter(|u| !u.is_empty()),
            notify_subject: var("NOTIFY_SUBJECT").unwrap_or(defaults.notify_subject),
            sweep_interval: Duration::from_secs(sweep_secs),
            auto_deliver_after: chrono::Duration::hours(deliver_hours),
            upload_dir: var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            otp_ttl: Duration::from_secs(parse_var(&var, "OTP_TTL_SECS", defaults.otp_ttl.as_secs())?),
        })
    }
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw.trim().parse().with_context(|| format!("invalid value for {name}: {raw:?}")),
        None => Ok(default),
    }
}
