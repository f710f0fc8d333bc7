//! Narrative source adapter: a question-answering service reached over a
//! server-sent-events stream (one POST per query, the response body is a
//! sequence of SSE frames rather than a single JSON document).
//!
//! The protocol is modeled as an explicit finite-state machine
//! (`Sending -> Receiving -> Done|Error|Timeout`) driven by the inbound
//! frame stream, per the design notes; cancellation (no terminator within
//! the per-query timeout) is a first-class transition rather than an
//! afterthought.

use crate::config::NarrativeCredentials;
use crate::error::{Error, Result};
use crate::record::Provenance;
use crate::retry::{retry, RetryPolicy};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const SOURCE: &str = "narrative";
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize)]
pub struct NarrativeQuery {
    pub message: String,
    pub user_id: String,
    pub conversation_id: String,
    pub max_results: u32,
    pub min_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRawResponse {
    pub content: String,
    pub sources: Vec<Provenance>,
    /// Computed here, per the design, because it depends on transport-level
    /// signals (structural markers, presence of provenance) the normalizer
    /// doesn't otherwise see.
    pub confidence_contribution: f64,
}

#[derive(Debug, Deserialize)]
struct DownstreamFrame {
    #[serde(rename = "type")]
    frame_type: String,
    content: Option<String>,
    sources: Option<Vec<Provenance>>,
    message: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum SessionState {
    Sending,
    Receiving,
    Done,
}

struct NarrativeSession {
    state: SessionState,
    buffer: String,
    sources: Vec<Provenance>,
}

enum FrameOutcome {
    Continue,
    Done,
    Error(String),
}

impl NarrativeSession {
    fn new() -> Self {
        Self {
            state: SessionState::Sending,
            buffer: String::new(),
            sources: Vec::new(),
        }
    }

    fn on_frame(&mut self, frame: DownstreamFrame) -> FrameOutcome {
        self.state = SessionState::Receiving;
        match frame.frame_type.as_str() {
            "text" | "chunk" | "delta" => {
                if let Some(content) = frame.content {
                    self.buffer.push_str(&content);
                }
                FrameOutcome::Continue
            }
            "sources" => {
                if let Some(sources) = frame.sources {
                    self.sources.extend(sources);
                }
                FrameOutcome::Continue
            }
            "done" | "complete" => {
                self.state = SessionState::Done;
                FrameOutcome::Done
            }
            "error" => FrameOutcome::Error(frame.message.unwrap_or_default()),
            _ => FrameOutcome::Continue,
        }
    }

    fn into_response(self) -> NarrativeRawResponse {
        let confidence_contribution = confidence_contribution(&self.buffer, &self.sources);
        NarrativeRawResponse {
            content: self.buffer,
            sources: self.sources,
            confidence_contribution,
        }
    }
}

/// Length-tiered + structure + lexeme confidence contribution, capped at 1.0.
fn confidence_contribution(content: &str, sources: &[Provenance]) -> f64 {
    let mut score: f64 = 0.0;
    score += match content.len() {
        0..=99 => 0.1,
        100..=499 => 0.3,
        500..=1499 => 0.5,
        _ => 0.6,
    };
    if !sources.is_empty() {
        score += 0.15;
    }
    let has_bullets = content.contains('\u{2022}') || content.contains("\n- ");
    let has_numbered = content.contains("\n1.") || content.contains("\n2.");
    if has_bullets || has_numbered {
        score += 0.1;
    }
    const QUALITY_LEXEMES: [&str; 6] = [
        "forecast",
        "analysis",
        "according to",
        "data shows",
        "reported",
        "confirmed",
    ];
    let lower = content.to_ascii_lowercase();
    if QUALITY_LEXEMES.iter().any(|w| lower.contains(w)) {
        score += 0.1;
    }
    score.min(1.0)
}

pub struct NarrativeAdapter {
    client: reqwest::Client,
    credentials: NarrativeCredentials,
}

impl NarrativeAdapter {
    pub fn new(credentials: NarrativeCredentials) -> Self {
        Self {
            client: reqwest::Client::builder()
                .tcp_keepalive(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            credentials,
        }
    }

    pub async fn query(&self, query: &NarrativeQuery) -> Result<NarrativeRawResponse> {
        let base = self
            .credentials
            .base
            .as_ref()
            .ok_or(Error::Unconfigured { source_name: SOURCE })?;

        retry(
            &RetryPolicy::NARRATIVE,
            "narrative.query",
            Error::is_transient,
            || self.query_once(base, query),
        )
        .await
    }

    async fn query_once(
        &self,
        base: &crate::config::SourceCredentials,
        query: &NarrativeQuery,
    ) -> Result<NarrativeRawResponse> {
        let body = serde_json::json!({
            "type": "query",
            "message": query.message,
            "user_id": query.user_id,
            "conversation_id": query.conversation_id,
            "max_results": query.max_results,
            "min_score": query.min_score,
        });

        let mut request = self
            .client
            .post(format!("{}/query", base.base_url))
            .bearer_auth(&base.token)
            .json(&body);
        if let Some(header) = &self.credentials.secondary_header {
            request = request.header(header, &base.token);
        }

        let response = request.send().await.map_err(|e| super::transport_error(SOURCE, &e))?;
        if !response.status().is_success() {
            return Err(if response.status().is_server_error() {
                Error::Transient {
                    source_name: SOURCE,
                    message: format!("status {}", response.status()),
                }
            } else {
                Error::Permanent {
                    source_name: SOURCE,
                    message: format!("status {}", response.status()),
                }
            });
        }

        let mut event_stream = response.bytes_stream().eventsource();
        let mut session = NarrativeSession::new();

        loop {
            let next = tokio::time::timeout(DEFAULT_QUERY_TIMEOUT, event_stream.next()).await;
            let event = match next {
                Ok(Some(Ok(event))) => event,
                Ok(Some(Err(e))) => {
                    return Err(Error::Parse {
                        source_name: SOURCE,
                        message: e.to_string(),
                    })
                }
                Ok(None) => break, // stream closed without an explicit terminator
                Err(_) => {
                    warn!(source = SOURCE, "query timed out waiting for next frame");
                    return Err(Error::Transient {
                        source_name: SOURCE,
                        message: "per-query timeout elapsed with no terminator".to_string(),
                    });
                }
            };

            let frame: DownstreamFrame = match serde_json::from_str(&event.data) {
                Ok(f) => f,
                Err(e) => {
                    debug!(source = SOURCE, error = %e, "skipping malformed frame");
                    continue;
                }
            };

            match session.on_frame(frame) {
                FrameOutcome::Continue => continue,
                FrameOutcome::Done => break,
                FrameOutcome::Error(message) => {
                    return Err(Error::Transient {
                        source_name: SOURCE,
                        message,
                    })
                }
            }
        }

        if session.state != SessionState::Done && session.buffer.is_empty() && session.sources.is_empty() {
            return Err(Error::Transient {
                source_name: SOURCE,
                message: "stream closed with no frames and no terminator".to_string(),
            });
        }

        Ok(session.into_response())
    }
}

/// A query template: a phrasing plus priority for best-effort ordering, and
/// optional follow-up prompts gated on the primary result's confidence.
/// Verbatim phrasings are editorial/configuration per scope; this struct is
/// the contract they're plugged into.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    pub name: &'static str,
    pub priority: u8,
    pub prompt: String,
    pub follow_ups: Vec<String>,
}

pub fn default_templates() -> Vec<QueryTemplate> {
    vec![
        QueryTemplate {
            name: "macro_outlook",
            priority: 90,
            prompt: "Summarize near-term macroeconomic risk relevant to business aviation.".into(),
            follow_ups: vec!["What are the second-order effects on charter demand?".into()],
        },
        QueryTemplate {
            name: "trade_policy",
            priority: 80,
            prompt: "What recent trade policy changes affect cross-border business travel?".into(),
            follow_ups: vec![],
        },
        QueryTemplate {
            name: "sector_watch",
            priority: 60,
            prompt: "What sector-specific developments matter to private aviation clients this week?".into(),
            follow_ups: vec!["Which clients are most exposed?".into()],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rewards_length_sources_and_structure() {
        let bare = confidence_contribution("short", &[]);
        let rich = confidence_contribution(
            &"x".repeat(600),
            &[serde_json::Map::new()],
        );
        assert!(rich > bare);
        assert!(rich <= 1.0);
    }

    #[test]
    fn session_accumulates_text_and_terminates_on_done() {
        let mut session = NarrativeSession::new();
        let outcome = session.on_frame(DownstreamFrame {
            frame_type: "text".into(),
            content: Some("Rates rose. ".into()),
            sources: None,
            message: None,
        });
        assert!(matches!(outcome, FrameOutcome::Continue));
        let outcome = session.on_frame(DownstreamFrame {
            frame_type: "done".into(),
            content: None,
            sources: None,
            message: None,
        });
        assert!(matches!(outcome, FrameOutcome::Done));
        assert_eq!(session.buffer, "Rates rose. ");
    }

    #[test]
    fn error_frame_surfaces_server_message() {
        let mut session = NarrativeSession::new();
        let outcome = session.on_frame(DownstreamFrame {
            frame_type: "error".into(),
            content: None,
            sources: None,
            message: Some("upstream overloaded".into()),
        });
        match outcome {
            FrameOutcome::Error(msg) => assert_eq!(msg, "upstream overloaded"),
            _ => panic!("expected error outcome"),
        }
    }
}
