//! src/config.rs
//! Load and validate runtime configuration for textcal.
//!
//! Priority: CLI flags > .env > defaults. The resulting `Config` is passed
//! explicitly into every pipeline stage; no stage reads ambient state.

use crate::{Result, TextcalError};
use chrono::Duration;
use chrono_tz::Tz;
use std::{env, path::PathBuf, time::Duration as StdDuration};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct Config {
    // Extraction API
    pub api_key: String,
    pub endpoint: Url,
    pub model: String,

    // Normalization
    pub home_zone: Tz,     // every event lands in this zone
    pub language: String,  // language of the JSON field values

    // Deduplication
    pub similarity_threshold: f64, // Jaro-Winkler on case-folded summaries
    pub overlap_tolerance_mins: i64,

    // HTTP/runtime
    pub http_timeout: StdDuration,
    pub http_retries: u32,

    // Output
    pub output: PathBuf,
}

impl Config {
    /// Build from CLI flags + env; validate zone name and thresholds.
    pub fn load(cli: &crate::cli::Cli) -> Result<Self> {
        // Load .env first (no error if absent).
        let _ = dotenvy::dotenv();

        // ---- Extraction API ----
        let api_key = cli
            .api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .ok_or(TextcalError::MissingEnv {
                key: "GEMINI_API_KEY",
            })?;
        if api_key.trim().is_empty() {
            return Err(TextcalError::Config {
                msg: "GEMINI_API_KEY must not be empty".to_string(),
            });
        }

        let endpoint = cli
            .endpoint
            .clone()
            .or_else(|| env::var("TEXTCAL_ENDPOINT").ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint)?;

        let model = cli
            .model
            .clone()
            .or_else(|| env::var("TEXTCAL_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        // ---- Normalization ----
        let zone_name = cli
            .timezone
            .clone()
            .or_else(|| env::var("TEXTCAL_TIMEZONE").ok())
            .unwrap_or_else(|| "UTC".to_string());
        let home_zone: Tz = zone_name.parse().map_err(|_| TextcalError::Config {
            msg: format!("unknown home time zone: {zone_name}"),
        })?;

        let language = cli
            .language
            .clone()
            .or_else(|| env::var("TEXTCAL_LANGUAGE").ok())
            .unwrap_or_else(|| "English".to_string());

        // ---- Deduplication ----
        let similarity_threshold = cli
            .similarity_threshold
            .or_else(|| env_parse("TEXTCAL_SIMILARITY_THRESHOLD"))
            .unwrap_or(0.85);
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(TextcalError::Config {
                msg: format!("similarity threshold {similarity_threshold} outside 0..=1"),
            });
        }
        let overlap_tolerance_mins = env_parse("TEXTCAL_OVERLAP_TOLERANCE_MINS").unwrap_or(15);

        // ---- HTTP/runtime ----
        let http_timeout =
            StdDuration::from_secs(env_parse("TEXTCAL_HTTP_TIMEOUT_SECS").unwrap_or(30));
        let http_retries = env_parse("TEXTCAL_HTTP_RETRIES").unwrap_or(2);

        // ---- Output ----
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("calendar.ics"));

        Ok(Self {
            api_key,
            endpoint,
            model,
            home_zone,
            language,
            similarity_threshold,
            overlap_tolerance_mins,
            http_timeout,
            http_retries,
            output,
        })
    }

    /// Window slack the deduplicator allows between "overlapping" events.
    pub fn overlap_tolerance(&self) -> Duration {
        Duration::minutes(self.overlap_tolerance_mins)
    }
}

// ---------- helpers ----------

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
pub(crate) fn test_config(endpoint: &str) -> Config {
    Config {
        api_key: "test-key".to_string(),
        endpoint: Url::parse(endpoint).unwrap(),
        model: DEFAULT_MODEL.to_string(),
        home_zone: chrono_tz::Australia::Adelaide,
        language: "English".to_string(),
        similarity_threshold: 0.85,
        overlap_tolerance_mins: 15,
        http_timeout: StdDuration::from_secs(5),
        http_retries: 0,
        output: PathBuf::from("calendar.ics"),
    }
}
