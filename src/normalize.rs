//! src/normalize.rs
//! Resolve a candidate's timestamps into the configured home zone.
//!
//! Pure function of (candidate, config). Candidates with no start time are
//! all-day events: a date span with an exclusive end, so a one-day event on
//! 2026-08-25 spans 2026-08-25..2026-08-26.

use crate::config::Config;
use crate::model::{EventCandidate, EventTimes, NormalizedEvent};
use crate::{Result, TextcalError};
use chrono::{Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

/// Validate a candidate and convert its start/end into the home zone.
///
/// Errors are per-candidate: the pipeline logs them and keeps going with the
/// well-formed remainder.
pub fn normalize(candidate: &EventCandidate, config: &Config) -> Result<NormalizedEvent> {
    let summary = candidate
        .summary()
        .ok_or_else(|| TextcalError::Serialization {
            reason: "candidate has no summary".to_string(),
        })?
        .to_string();

    let start_date = candidate
        .start_date()
        .ok_or_else(|| TextcalError::Serialization {
            reason: format!("'{summary}' has no start date"),
        })?;
    let start_date = parse_date(start_date)?;
    let end_date = match candidate.end_date() {
        Some(raw) => parse_date(raw)?,
        None => start_date,
    };

    let source_zone = match candidate.timezone() {
        Some(name) => name.parse::<Tz>().map_err(|_| TextcalError::Timezone {
            reason: format!("unrecognized time zone '{name}' on '{summary}'"),
        })?,
        None => config.home_zone,
    };

    let times = match candidate.start_time() {
        Some(raw_start) => {
            let start_time = parse_time(raw_start)?;
            // Missing end time means a point-in-time event.
            let end_time = match candidate.end_time() {
                Some(raw) => parse_time(raw)?,
                None => start_time,
            };

            let start = resolve_local(source_zone, start_date, start_time, &summary)?
                .with_timezone(&config.home_zone);
            let end = resolve_local(source_zone, end_date, end_time, &summary)?
                .with_timezone(&config.home_zone);

            if start > end {
                return Err(TextcalError::Timezone {
                    reason: format!("'{summary}' starts after it ends ({start} > {end})"),
                });
            }
            EventTimes::Timed { start, end }
        }
        None => {
            if start_date > end_date {
                return Err(TextcalError::Timezone {
                    reason: format!("'{summary}' starts after it ends ({start_date} > {end_date})"),
                });
            }
            EventTimes::AllDay {
                start: start_date,
                end: end_date + Duration::days(1),
            }
        }
    };

    Ok(NormalizedEvent {
        summary,
        times,
        location: candidate.location().map(str::to_string),
        description: candidate.description().map(str::to_string),
        recurrence: candidate.recurrence.clone(),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(raw, DATE_FMT)?)
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    Ok(NaiveTime::parse_from_str(raw, TIME_FMT)?)
}

/// Attach a zone to a naive local timestamp. DST gaps and folds have no
/// single answer, so both are resolution failures.
fn resolve_local(
    zone: Tz,
    date: NaiveDate,
    time: NaiveTime,
    summary: &str,
) -> Result<chrono::DateTime<Tz>> {
    match zone.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(..) => Err(TextcalError::Timezone {
            reason: format!("'{summary}': {date} {time} is ambiguous in {zone} (DST fold)"),
        }),
        LocalResult::None => Err(TextcalError::Timezone {
            reason: format!("'{summary}': {date} {time} does not exist in {zone} (DST gap)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::model::EventCandidate;

    fn candidate(summary: &str) -> EventCandidate {
        EventCandidate {
            summary: Some(summary.to_string()),
            start_date: Some("2026-08-25".to_string()),
            ..EventCandidate::default()
        }
    }

    #[test]
    fn converts_source_zone_into_home_zone() {
        // Sydney is 30 minutes ahead of Adelaide outside DST.
        let config = test_config("http://localhost");
        let mut c = candidate("Team Meeting");
        c.start_time = Some("10:30".to_string());
        c.end_time = Some("11:30".to_string());
        c.timezone = Some("Australia/Sydney".to_string());

        let ev = normalize(&c, &config).unwrap();
        let EventTimes::Timed { start, end } = ev.times else {
            panic!("expected timed event");
        };
        assert_eq!(start.format("%H:%M").to_string(), "10:00");
        assert_eq!(end.format("%H:%M").to_string(), "11:00");
        assert_eq!(start.timezone(), chrono_tz::Australia::Adelaide);
    }

    #[test]
    fn normalization_is_idempotent() {
        let config = test_config("http://localhost");
        let mut c = candidate("Standup");
        c.start_time = Some("09:00".to_string());
        c.timezone = Some("Australia/Sydney".to_string());

        let once = normalize(&c, &config).unwrap();

        // Feed the already-normalized times back through as a candidate in
        // the home zone; nothing may move.
        let EventTimes::Timed { start, end } = &once.times else {
            panic!("expected timed event");
        };
        let again = normalize(
            &EventCandidate {
                summary: Some("Standup".to_string()),
                start_date: Some(start.format("%Y-%m-%d").to_string()),
                end_date: Some(end.format("%Y-%m-%d").to_string()),
                start_time: Some(start.format("%H:%M").to_string()),
                end_time: Some(end.format("%H:%M").to_string()),
                timezone: Some(config.home_zone.name().to_string()),
                ..EventCandidate::default()
            },
            &config,
        )
        .unwrap();

        assert_eq!(once.times, again.times);
    }

    #[test]
    fn all_day_event_gets_exclusive_end() {
        let config = test_config("http://localhost");
        let ev = normalize(&candidate("Conference"), &config).unwrap();
        assert_eq!(
            ev.times,
            EventTimes::AllDay {
                start: NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
                end: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            }
        );
    }

    #[test]
    fn missing_end_time_defaults_to_start() {
        let config = test_config("http://localhost");
        let mut c = candidate("Reminder");
        c.start_time = Some("14:00".to_string());
        let ev = normalize(&c, &config).unwrap();
        let EventTimes::Timed { start, end } = ev.times else {
            panic!("expected timed event");
        };
        assert_eq!(start, end);
    }

    #[test]
    fn unknown_zone_is_a_timezone_error() {
        let config = test_config("http://localhost");
        let mut c = candidate("Meeting");
        c.timezone = Some("Mars/Olympus_Mons".to_string());
        c.start_time = Some("10:00".to_string());
        assert!(matches!(
            normalize(&c, &config),
            Err(TextcalError::Timezone { .. })
        ));
    }

    #[test]
    fn missing_start_date_is_a_serialization_error() {
        let config = test_config("http://localhost");
        let c = EventCandidate {
            summary: Some("Dentist".to_string()),
            ..EventCandidate::default()
        };
        assert!(matches!(
            normalize(&c, &config),
            Err(TextcalError::Serialization { .. })
        ));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let config = test_config("http://localhost");
        let mut c = candidate("Backwards");
        c.start_time = Some("15:00".to_string());
        c.end_time = Some("09:00".to_string());
        assert!(matches!(
            normalize(&c, &config),
            Err(TextcalError::Timezone { .. })
        ));
    }

    #[test]
    fn nonexistent_local_time_is_rejected() {
        // 2026-10-04 02:30 does not exist in Adelaide: clocks jump
        // 02:00 -> 03:00 that night.
        let config = test_config("http://localhost");
        let c = EventCandidate {
            summary: Some("Ghost".to_string()),
            start_date: Some("2026-10-04".to_string()),
            start_time: Some("02:30".to_string()),
            ..EventCandidate::default()
        };
        assert!(matches!(
            normalize(&c, &config),
            Err(TextcalError::Timezone { .. })
        ));
    }
}
