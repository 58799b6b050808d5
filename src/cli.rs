//! src/cli.rs
//! Command-line surface. Every flag has an environment fallback resolved in
//! `config::Config::load`.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "textcal",
    version,
    about = "Extract calendar events from free-form text and write an .ics file"
)]
pub struct Cli {
    /// Text file to read; stdin when absent or "-".
    pub input: Option<PathBuf>,

    /// Destination .ics path (overwritten if it exists).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Home IANA time zone all event times are normalized into,
    /// e.g. "Australia/Adelaide".
    #[arg(short = 'z', long = "timezone")]
    pub timezone: Option<String>,

    /// Language the model should write field values in.
    #[arg(long)]
    pub language: Option<String>,

    /// Gemini model name.
    #[arg(long)]
    pub model: Option<String>,

    /// Gemini API key; prefer the GEMINI_API_KEY environment variable.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Base URL of the generateContent API, overridable for testing.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Title similarity above which two overlapping events are merged (0..=1).
    #[arg(long)]
    pub similarity_threshold: Option<f64>,
}
