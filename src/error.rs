use chrono::ParseError as ChronoParseError;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub type Result<T, E = TextcalError> = std::result::Result<T, E>;

/// All fallible operations in textcal should return `Result<T, TextcalError>`.
#[derive(Debug, Error)]
pub enum TextcalError {
    // ------------------- Config / CLI -------------------
    #[error("missing required environment variable: {key}")]
    MissingEnv { key: &'static str },

    #[error("invalid configuration: {msg}")]
    Config { msg: String },

    // ------------------- I/O / filesystem -------------------
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ------------------- HTTP / network -------------------
    #[error("HTTP request failed for {url}: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}{body_snip}")]
    HttpStatus {
        url: Url,
        status: StatusCode,
        /// Optional snippet of the body for diagnostics.
        body_snip: String,
    },

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    // ------------------- Parsing / formats -------------------
    #[error("date/time parse error: {0}")]
    Chrono(#[from] ChronoParseError),

    // ------------------- Pipeline stages -------------------
    /// Talking to the model failed: network, API, or a reply that carried
    /// no parseable JSON.
    #[error("extraction failed: {reason}")]
    Extraction { reason: String },

    /// A timestamp could not be resolved into the home time zone.
    #[error("time zone resolution failed: {reason}")]
    Timezone { reason: String },

    /// An event is missing data the output format requires.
    #[error("cannot serialize event: {reason}")]
    Serialization { reason: String },
}
