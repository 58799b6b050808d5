//! src/pipeline.rs
//! The four stages wired together: extract -> normalize -> dedup -> render.
//!
//! Per-candidate failures are warnings and the well-formed remainder still
//! ships; failures of the run as a whole propagate to the caller.

use crate::config::Config;
use crate::dedup::{self, DedupPolicy};
use crate::extract::Extractor;
use crate::{ics, normalize, Result};
use tracing::warn;

/// What a run did, for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Candidates the model reported.
    pub extracted: usize,
    /// Candidates dropped with a warning.
    pub skipped: usize,
    /// VEVENTs in the output after merging.
    pub written: usize,
}

/// Run the whole pipeline over `text`, returning the rendered ICS document.
pub async fn run(config: &Config, text: &str) -> Result<(String, RunReport)> {
    let extractor = Extractor::new(config)?;
    let candidates = extractor.extract(text).await?;
    let extracted = candidates.len();

    let mut normalized = Vec::with_capacity(candidates.len());
    let mut skipped = 0;
    for candidate in &candidates {
        match normalize::normalize(candidate, config) {
            Ok(event) => normalized.push(event),
            Err(err) => {
                warn!(
                    summary = candidate.summary().unwrap_or("<unnamed>"),
                    %err,
                    "dropping malformed candidate"
                );
                skipped += 1;
            }
        }
    }

    let merged = dedup::merge_duplicates(normalized, &DedupPolicy::from_config(config));
    let written = merged.len();
    let document = ics::render(&merged, config)?;

    Ok((
        document,
        RunReport {
            extracted,
            skipped,
            written,
        },
    ))
}
