//! src/ics.rs
//! Serialize merged events as an RFC 5545 document.
//!
//! The `icalendar` crate handles CRLF line endings and 75-octet folding;
//! this module only maps fields. Timed events carry the home zone as TZID,
//! all-day events use VALUE=DATE with an exclusive end.

use crate::config::Config;
use crate::model::{EventTimes, MergedEvent, Recurrence};
use crate::{Result, TextcalError};
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};
use tracing::warn;
use uuid::Uuid;

/// Render the final document. An empty slice still yields a valid, empty
/// VCALENDAR (the crate supplies VERSION and PRODID).
pub fn render(events: &[MergedEvent], config: &Config) -> Result<String> {
    let mut calendar = Calendar::new();

    for merged in events {
        calendar.push(to_vevent(merged, config)?);
    }

    Ok(calendar.to_string())
}

fn to_vevent(merged: &MergedEvent, config: &Config) -> Result<Event> {
    let ev = &merged.event;
    if ev.summary.trim().is_empty() {
        return Err(TextcalError::Serialization {
            reason: "event has an empty summary".to_string(),
        });
    }

    let mut vevent = Event::new();
    vevent.uid(&Uuid::new_v4().to_string());
    vevent.summary(&ev.summary);
    vevent.timestamp(chrono::Utc::now()); // DTSTAMP

    match &ev.times {
        EventTimes::Timed { start, end } => {
            let tzid = config.home_zone.name().to_string();
            vevent.starts(CalendarDateTime::WithTimezone {
                date_time: start.naive_local(),
                tzid: tzid.clone(),
            });
            vevent.ends(CalendarDateTime::WithTimezone {
                date_time: end.naive_local(),
                tzid,
            });
        }
        EventTimes::AllDay { start, end } => {
            vevent.starts(*start);
            vevent.ends(*end);
        }
    }

    if let Some(location) = &ev.location {
        vevent.location(location);
    }
    if let Some(description) = &ev.description {
        vevent.description(description);
    }
    if let Some(recurrence) = &ev.recurrence {
        if let Some(rrule) = to_rrule(recurrence) {
            vevent.add_property("RRULE", &rrule);
        } else {
            warn!(
                summary = %ev.summary,
                frequency = %recurrence.frequency,
                "skipping recurrence with unsupported frequency"
            );
        }
    }

    Ok(vevent.done())
}

fn to_rrule(recurrence: &Recurrence) -> Option<String> {
    let freq = recurrence.frequency.to_uppercase();
    if !matches!(freq.as_str(), "DAILY" | "WEEKLY" | "MONTHLY" | "YEARLY") {
        return None;
    }
    let mut rrule = format!("FREQ={};INTERVAL={}", freq, recurrence.interval);
    if let Some(count) = recurrence.count {
        rrule.push_str(&format!(";COUNT={count}"));
    }
    Some(rrule)
}
