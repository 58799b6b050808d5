//! src/dedup.rs
//! Merge near-identical events the model reported more than once.
//!
//! Two events are duplicates when their case-folded summaries score at or
//! above the similarity threshold (Jaro-Winkler) AND their windows overlap
//! within the configured tolerance. The canonical representative is the most
//! field-complete member; ties keep the first seen. Optional fields missing
//! on the canonical are backfilled from absorbed members.

use crate::config::Config;
use crate::model::{MergedEvent, NormalizedEvent};
use chrono::Duration;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct DedupPolicy {
    pub similarity_threshold: f64,
    pub overlap_tolerance: Duration,
}

impl DedupPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            overlap_tolerance: config.overlap_tolerance(),
        }
    }
}

/// Collapse duplicates, preserving first-seen order of the clusters.
pub fn merge_duplicates(events: Vec<NormalizedEvent>, policy: &DedupPolicy) -> Vec<MergedEvent> {
    let mut merged: Vec<MergedEvent> = Vec::new();

    'events: for event in events {
        for cluster in &mut merged {
            if is_duplicate(&cluster.event, &event, policy) {
                debug!(
                    canonical = %cluster.event.summary,
                    duplicate = %event.summary,
                    "merging duplicate event"
                );
                absorb(cluster, event);
                continue 'events;
            }
        }
        merged.push(MergedEvent::new(event));
    }

    merged
}

fn is_duplicate(a: &NormalizedEvent, b: &NormalizedEvent, policy: &DedupPolicy) -> bool {
    let score = strsim::jaro_winkler(
        a.summary.to_lowercase().trim(),
        b.summary.to_lowercase().trim(),
    );
    score >= policy.similarity_threshold && windows_overlap(a, b, policy.overlap_tolerance)
}

fn windows_overlap(a: &NormalizedEvent, b: &NormalizedEvent, tolerance: Duration) -> bool {
    let (a_start, a_end) = a.times.window_utc();
    let (b_start, b_end) = b.times.window_utc();
    a_start <= b_end + tolerance && b_start <= a_end + tolerance
}

/// Fold `incoming` into the cluster, promoting it to canonical when it is
/// strictly more complete.
fn absorb(cluster: &mut MergedEvent, incoming: NormalizedEvent) {
    if incoming.completeness() > cluster.event.completeness() {
        let old = std::mem::replace(&mut cluster.event, incoming);
        backfill(&mut cluster.event, &old);
        cluster.absorbed.push(old.summary);
    } else {
        backfill(&mut cluster.event, &incoming);
        cluster.absorbed.push(incoming.summary);
    }
}

fn backfill(canonical: &mut NormalizedEvent, other: &NormalizedEvent) {
    if canonical.location.is_none() {
        canonical.location.clone_from(&other.location);
    }
    if canonical.description.is_none() {
        canonical.description.clone_from(&other.description);
    }
    if canonical.recurrence.is_none() {
        canonical.recurrence.clone_from(&other.recurrence);
    }
}
