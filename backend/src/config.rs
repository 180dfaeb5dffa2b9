// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

/// Question count offered on the start form when the candidate leaves it blank.
pub const DEFAULT_QUESTION_COUNT: usize = 20;

/// Time budget offered on the start form when the candidate leaves it blank.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Page size of the admin "recent submissions" listing.
pub const RECENT_SUBMISSIONS_LIMIT: i64 = 20;

/// Upper bound accepted for any admin listing `limit`.
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub questions_file: PathBuf,
    pub active_set_file: PathBuf,
    pub admin_password: Option<String>,
    pub sink_url: Option<Url>,
    pub sink_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub bind_addr: SocketAddr,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://responses.db?mode=rwc".to_string());

        let questions_file = env::var("QUESTIONS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("questions.json"));

        let active_set_file = env::var("ACTIVE_SET_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("active_set.json"));

        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());

        let sink_url = match env::var("SINK_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                Url::parse(raw.trim())
                    .map_err(|e| AppError::Validation(format!("SINK_URL is not a valid URL: {}", e)))?,
            ),
            _ => None,
        };

        let sink_timeout_secs = parse_var("SINK_TIMEOUT_SECS", 5)?;
        let sweep_interval_secs = parse_var("SWEEP_INTERVAL_SECS", 15)?;
        let bind_addr = parse_var("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            questions_file,
            active_set_file,
            admin_password,
            sink_url,
            sink_timeout_secs,
            sweep_interval_secs,
            bind_addr,
            rust_log,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Validation(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}
