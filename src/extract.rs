//! src/extract.rs
//! Extractor client: one outbound call to the Gemini `generateContent` API,
//! returning schema-validated event candidates.
//!
//! Transient failures (connect errors, timeouts, 429/5xx) are retried with
//! bounded exponential backoff; anything wrong with the reply itself is
//! surfaced immediately as an extraction error.

use crate::config::Config;
use crate::model::{EventCandidate, ExtractionReply};
use crate::{Result, TextcalError};
use backoff::ExponentialBackoffBuilder;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub struct Extractor {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    home_zone: String,
    language: String,
    http_retries: u32,
    max_retry_elapsed: Duration,
}

// ---- Gemini REST reply shape (request is built with json!) ----

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ReplyCandidate>,
}

#[derive(Debug, Deserialize)]
struct ReplyCandidate {
    content: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

impl Extractor {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| TextcalError::Config {
                msg: format!("building HTTP client: {e}"),
            })?;

        let url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            config.endpoint.as_str().trim_end_matches('/'),
            config.model
        ))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            home_zone: config.home_zone.name().to_string(),
            language: config.language.clone(),
            http_retries: config.http_retries,
            max_retry_elapsed: config.http_timeout * (config.http_retries + 1),
        })
    }

    /// Send `text` to the model and parse the candidates out of its reply.
    pub async fn extract(&self, text: &str) -> Result<Vec<EventCandidate>> {
        let prompt = self.prompt(chrono::Local::now().date_naive());
        info!(url = %self.url, zone = %self.home_zone, "requesting event extraction");

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": format!("{prompt}\n{text}") }]
            }]
        });

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(self.max_retry_elapsed))
            .build();

        // The backoff policy alone is time-bounded; `http_retries` caps the
        // attempt count on top of it. A failure is only worth retrying while
        // the budget has retries left.
        let failures = AtomicU32::new(0);
        let retry_or_give_up = |err: TextcalError| {
            if failures.fetch_add(1, Ordering::Relaxed) < self.http_retries {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            }
        };

        let response: GenerateContentResponse = backoff::future::retry(policy, || async {
            let resp = self
                .client
                .post(self.url.clone())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    // Connect errors and timeouts are worth another try.
                    retry_or_give_up(TextcalError::Http {
                        url: self.url.clone(),
                        source: e,
                    })
                })?;

            let status = resp.status();
            if !status.is_success() {
                let body_snip = snippet(&resp.text().await.unwrap_or_default());
                let err = TextcalError::HttpStatus {
                    url: self.url.clone(),
                    status,
                    body_snip,
                };
                return if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    Err(retry_or_give_up(err))
                } else {
                    Err(backoff::Error::permanent(err))
                };
            }

            resp.json::<GenerateContentResponse>().await.map_err(|e| {
                backoff::Error::permanent(TextcalError::Extraction {
                    reason: format!("malformed API response: {e}"),
                })
            })
        })
        .await?;

        let reply_text = reply_text(&response)?;
        debug!(len = reply_text.len(), "model reply received");
        parse_candidates(&reply_text)
    }

    /// Extraction prompt, shaped after the schema the parser expects.
    fn prompt(&self, today: NaiveDate) -> String {
        format!(
            r#"Extract every calendar event mentioned in the following text and return only a single JSON object like this:
{{
  "events": [
    {{
      "summary": "Team Meeting",
      "start_date": "2025-03-10",
      "end_date": "2025-03-10",
      "start_time": "10:00",
      "end_time": "11:00",
      "timezone": "Australia/Adelaide",
      "location": "Room 101",
      "description": "Quarterly planning session \n organiser: ACME Corp \n source: ACME webpage",
      "recurrence": {{
        "frequency": "daily",
        "interval": 1,
        "count": 5
      }}
    }}
  ]
}}

Rules
-----
1. If the same event is repeated in the text, merge the duplicates.
2. The "timezone" field must be the IANA name of the zone the times are given in; when the text names no zone, use {home_zone}.
3. Output MUST be valid JSON with no extra text.
4. All field values must be written in {language}.
5. The description field should include (when available): a short event summary, the organiser, and the source the event was extracted from.
6. Omit "start_time" and "end_time" for all-day events.

(Current date: {today})

Here is the text:
"#,
            home_zone = self.home_zone,
            language = self.language,
            today = today.format("%Y-%m-%d"),
        )
    }
}

fn reply_text(response: &GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(TextcalError::Extraction {
            reason: "model reply carried no text".to_string(),
        });
    }
    Ok(text)
}

/// Models wrap JSON in prose or code fences; take everything between the
/// first `{` and the last `}` and parse that.
fn parse_candidates(reply: &str) -> Result<Vec<EventCandidate>> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(TextcalError::Extraction {
            reason: "no JSON object found in model reply".to_string(),
        });
    };
    if end < start {
        return Err(TextcalError::Extraction {
            reason: "no JSON object found in model reply".to_string(),
        });
    }

    let parsed: ExtractionReply =
        serde_json::from_str(&reply[start..=end]).map_err(|e| TextcalError::Extraction {
            reason: format!("model reply is not valid JSON: {e}"),
        })?;

    info!(events = parsed.events.len(), "JSON parsed successfully");
    Ok(parsed.events)
}

fn snippet(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }
    let snip: String = body.chars().take(512).collect();
    format!(": {snip}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn prompt_names_zone_language_and_date() {
        let extractor = Extractor::new(&test_config("http://localhost")).unwrap();
        let prompt = extractor.prompt(NaiveDate::from_ymd_opt(2026, 8, 24).unwrap());
        assert!(prompt.contains("Australia/Adelaide"));
        assert!(prompt.contains("English"));
        assert!(prompt.contains("(Current date: 2026-08-24)"));
        assert!(prompt.contains("\"events\""));
    }

    #[test]
    fn candidates_are_scraped_out_of_fenced_replies() {
        let reply = "Sure! Here are the events:\n```json\n{\"events\": [{\"summary\": \"Lunch\", \"start_date\": \"2026-08-25\"}]}\n```";
        let events = parse_candidates(reply).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary(), Some("Lunch"));
    }

    #[test]
    fn reply_without_json_is_an_extraction_error() {
        assert!(matches!(
            parse_candidates("I could not find any events."),
            Err(TextcalError::Extraction { .. })
        ));
    }

    #[test]
    fn truncated_json_is_an_extraction_error() {
        assert!(matches!(
            parse_candidates("{\"events\": [{\"summary\": \"Lunch\""),
            Err(TextcalError::Extraction { .. })
        ));
    }

    #[test]
    fn empty_events_array_parses_to_nothing() {
        let events = parse_candidates("{\"events\": []}").unwrap();
        assert!(events.is_empty());
    }
}
