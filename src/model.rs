//! src/model.rs
//! Event types flowing through the pipeline, from the raw model reply to the
//! merged events handed to the calendar writer.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

/// Top-level shape of the JSON object the model is asked to return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionReply {
    #[serde(default)]
    pub events: Vec<EventCandidate>,
}

/// One event as reported by the model, validated against the prompt schema
/// at the extraction boundary but not yet trusted beyond that.
///
/// Dates are `YYYY-MM-DD`, times `HH:MM`; the model sometimes fills unknown
/// fields with `""` or `"none"`, so every accessor goes through [`clean`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventCandidate {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl EventCandidate {
    pub fn summary(&self) -> Option<&str> {
        clean(self.summary.as_deref())
    }
    pub fn start_date(&self) -> Option<&str> {
        clean(self.start_date.as_deref())
    }
    pub fn end_date(&self) -> Option<&str> {
        clean(self.end_date.as_deref())
    }
    pub fn start_time(&self) -> Option<&str> {
        clean(self.start_time.as_deref())
    }
    pub fn end_time(&self) -> Option<&str> {
        clean(self.end_time.as_deref())
    }
    pub fn timezone(&self) -> Option<&str> {
        clean(self.timezone.as_deref())
    }
    pub fn location(&self) -> Option<&str> {
        clean(self.location.as_deref())
    }
    pub fn description(&self) -> Option<&str> {
        clean(self.description.as_deref())
    }
}

/// Treat `""` and the literal `"none"` the model likes to emit as absent.
fn clean(value: Option<&str>) -> Option<&str> {
    let v = value?.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(v)
    }
}

/// Recurrence as the model reports it; mapped to an RRULE by the writer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Recurrence {
    pub frequency: String,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub count: Option<u32>,
}

fn default_interval() -> u32 {
    1
}

/// Start/end of an event after normalization into the home zone.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTimes {
    /// Concrete instants, both expressed in the home zone.
    Timed { start: DateTime<Tz>, end: DateTime<Tz> },
    /// Date span with an exclusive end, per RFC 5545 all-day convention.
    AllDay { start: NaiveDate, end: NaiveDate },
}

impl EventTimes {
    /// Time window as UTC instants, used for overlap checks. All-day spans
    /// are widened to UTC midnights of their dates.
    pub fn window_utc(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            EventTimes::Timed { start, end } => {
                (start.with_timezone(&Utc), end.with_timezone(&Utc))
            }
            EventTimes::AllDay { start, end } => (
                Utc.from_utc_datetime(&start.and_time(chrono::NaiveTime::MIN)),
                Utc.from_utc_datetime(&end.and_time(chrono::NaiveTime::MIN)),
            ),
        }
    }
}

/// A candidate whose timestamps have been resolved into the home zone.
/// Invariant: start <= end.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub summary: String,
    pub times: EventTimes,
    pub location: Option<String>,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
}

impl NormalizedEvent {
    /// How many optional fields are filled in; the deduplicator keeps the
    /// most complete member of a cluster as canonical.
    pub fn completeness(&self) -> usize {
        usize::from(self.location.is_some())
            + usize::from(self.description.is_some())
            + usize::from(self.recurrence.is_some())
            + usize::from(matches!(self.times, EventTimes::Timed { .. }))
    }
}

/// Canonical representative of a cluster of near-identical candidates.
/// `absorbed` keeps the summaries of the members it swallowed, for
/// traceability only; it is never persisted.
#[derive(Debug, Clone)]
pub struct MergedEvent {
    pub event: NormalizedEvent,
    pub absorbed: Vec<String>,
}

impl MergedEvent {
    pub fn new(event: NormalizedEvent) -> Self {
        Self {
            event,
            absorbed: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_deserializes_with_missing_optionals() {
        let json = r#"{
            "events": [
                {"summary": "Standup", "start_date": "2026-08-25", "start_time": "09:00"}
            ]
        }"#;
        let reply: ExtractionReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.events.len(), 1);
        let ev = &reply.events[0];
        assert_eq!(ev.summary(), Some("Standup"));
        assert_eq!(ev.end_date(), None);
        assert!(ev.recurrence.is_none());
    }

    #[test]
    fn none_and_empty_strings_read_as_absent() {
        let ev = EventCandidate {
            summary: Some("  ".into()),
            timezone: Some("none".into()),
            location: Some("NONE".into()),
            end_time: Some(String::new()),
            ..EventCandidate::default()
        };
        assert_eq!(ev.summary(), None);
        assert_eq!(ev.timezone(), None);
        assert_eq!(ev.location(), None);
        assert_eq!(ev.end_time(), None);
    }

    #[test]
    fn recurrence_interval_defaults_to_one() {
        let rec: Recurrence =
            serde_json::from_str(r#"{"frequency": "weekly", "count": 4}"#).unwrap();
        assert_eq!(rec.interval, 1);
        assert_eq!(rec.count, Some(4));
    }
}
