//! Thin HTTP client for the executive-summary/so-what generation call, plus
//! the line-oriented parser for its bracketed-marker response format.
//!
//! Modeled on the teacher's chat-model client shape (redacted `Debug`,
//! a handful of generation knobs, one POST per call) but built directly on
//! `reqwest` since no vendor SDK crate is in the dependency set.

use crate::ai::usage::UsageTracker;
use crate::record::{ExecutiveSummary, IntelligenceRecord, KeyFinding, WatchFactor};
use crate::retry::{retry, RetryPolicy};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const SOURCE: &str = "ai_generation";
const CALL_TIMEOUT: Duration = Duration::from_secs(60);
const TOP_N_FOR_SUMMARY: usize = 20;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("ai generation timed out")]
    Timeout,
    #[error("ai generation transport error: {0}")]
    Transport(String),
    #[error("ai generation returned an unparseable response: {0}")]
    Parse(String),
    #[error("ai generation unconfigured: missing api key")]
    Unconfigured,
}

impl GenerationError {
    fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Timeout | GenerationError::Transport(_))
    }
}

pub struct AIClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    api_version: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    usage: UsageTracker,
}

impl fmt::Debug for AIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AIClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl AIClient {
    pub fn new(api_key: String, api_url: String, model: String, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(CALL_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key,
            api_url,
            api_version: "2023-06-01".to_string(),
            model: model.clone(),
            max_tokens,
            temperature: 0.3,
            usage: UsageTracker::new(model),
        }
    }

    pub fn usage(&self) -> crate::ai::usage::UsageSummary {
        self.usage.summary()
    }

    pub async fn generate_exec_summary(&self, records: &[IntelligenceRecord]) -> Result<String, GenerationError> {
        let prompt = build_exec_summary_prompt(records);
        self.call(&prompt).await
    }

    pub async fn generate_so_what(&self, record: &IntelligenceRecord) -> Result<String, GenerationError> {
        let prompt = build_so_what_prompt(record);
        self.call(&prompt).await
    }

    async fn call(&self, prompt: &str) -> Result<String, GenerationError> {
        let result = retry(&RetryPolicy::AI_GENERATION, SOURCE, GenerationError::is_transient, || {
            self.call_once(prompt)
        })
        .await;

        match &result {
            Ok(text) => self.usage.log_request(estimate_tokens(prompt), estimate_tokens(text), true),
            Err(_) => self.usage.log_request(estimate_tokens(prompt), 0, false),
        }
        result
    }

    async fn call_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = tokio::time::timeout(
            CALL_TIMEOUT,
            self.http
                .post(format!("{}/messages", self.api_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", &self.api_version)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| GenerationError::Timeout)?
        .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(if status.is_server_error() {
                GenerationError::Transport(format!("status {status}"))
            } else {
                GenerationError::Parse(format!("status {status}"))
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| GenerationError::Parse("no text block in response".to_string()))
    }
}

fn estimate_tokens(text: &str) -> u64 {
    // Coarse 4-chars-per-token heuristic; usage reporting is directional,
    // not a billing source of truth.
    (text.len() as u64 / 4).max(1)
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

fn build_exec_summary_prompt(records: &[IntelligenceRecord]) -> String {
    let mut ranked: Vec<&IntelligenceRecord> = records.iter().collect();
    ranked.sort_by(|a, b| {
        let sa = a.relevance_score * a.confidence;
        let sb = b.relevance_score * b.confidence;
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(TOP_N_FOR_SUMMARY);

    let mut items = String::new();
    for r in &ranked {
        items.push_str(&format!("- [{}] {}\n", r.category, r.processed_content));
    }

    format!(
        "You are drafting a business-travel intelligence brief for an aviation operator. \
Using only the material below, write an executive summary with three sections, using this \
exact bracketed-marker format and nothing else:\n\n\
[SUBHEADER: <finding title>]\n\
[CONTENT: <one paragraph>]\n\
[BULLET: <supporting detail>]\n\
(repeat CONTENT/BULLET lines as needed per finding, then a new SUBHEADER starts the next finding)\n\n\
For the opening bottom line, write 2-3 [CONTENT:] lines before any [SUBHEADER:].\n\
For watch factors, after all findings, write:\n\
[INDICATOR: <what to track>]\n\
[WHAT: <what to watch for>]\n\
[WHY: <why it matters>]\n\n\
Do not state opinions or reference sources not provided here. If the material doesn't support a \
claim, omit it rather than speculate.\n\n\
Source material:\n{items}"
    )
}

fn build_so_what_prompt(record: &IntelligenceRecord) -> String {
    format!(
        "Write one sentence of operational guidance for a business-aviation operator based only \
on the following intelligence item. State what to do or watch for, not a restatement of the \
facts. Do not use first person or reference unavailable sources.\n\n\
Category: {}\nContent: {}",
        record.category, record.processed_content
    )
}

/// Mirrors the reference implementation's line-oriented response parser:
/// section headers switch mode, bracketed markers build up the current
/// finding/factor, and a pending item is flushed on the next marker of the
/// same kind or at end of input. Unmarked `-`/`•` lines are treated as
/// legacy bullets under the active finding for resilience against
/// off-format output.
pub fn parse_exec_summary(text: &str) -> ExecutiveSummary {
    #[derive(PartialEq)]
    enum Section {
        BottomLine,
        Findings,
        WatchFactors,
    }

    let mut section = Section::BottomLine;
    let mut summary = ExecutiveSummary::default();
    let mut pending_finding: Option<KeyFinding> = None;
    let mut pending_factor: Option<WatchFactor> = None;

    let flush_finding = |pending: &mut Option<KeyFinding>, summary: &mut ExecutiveSummary| {
        if let Some(finding) = pending.take() {
            summary.key_findings.push(finding);
        }
    };
    let flush_factor = |pending: &mut Option<WatchFactor>, summary: &mut ExecutiveSummary| {
        if let Some(factor) = pending.take() {
            summary.watch_factors.push(factor);
        }
    };

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let upper = line.to_ascii_uppercase();
        if upper.starts_with("KEY FINDINGS") || upper.starts_with("## KEY FINDINGS") {
            section = Section::Findings;
            continue;
        }
        if upper.starts_with("WATCH FACTORS") || upper.starts_with("## WATCH FACTORS") {
            flush_finding(&mut pending_finding, &mut summary);
            section = Section::WatchFactors;
            continue;
        }
        if upper.starts_with("BOTTOM LINE") || upper.starts_with("## BOTTOM LINE") {
            section = Section::BottomLine;
            continue;
        }

        if let Some(value) = extract_marker(line, "SUBHEADER") {
            flush_finding(&mut pending_finding, &mut summary);
            pending_finding = Some(KeyFinding { subheader: value, content: String::new(), bullets: Vec::new() });
            section = Section::Findings;
            continue;
        }
        if let Some(value) = extract_marker(line, "CONTENT") {
            match section {
                Section::BottomLine => summary.bottom_line.push(value),
                _ => {
                    if let Some(finding) = pending_finding.as_mut() {
                        finding.content = value;
                    }
                }
            }
            continue;
        }
        if let Some(value) = extract_marker(line, "BULLET") {
            if let Some(finding) = pending_finding.as_mut() {
                finding.bullets.push(value);
            }
            continue;
        }
        if let Some(value) = extract_marker(line, "INDICATOR") {
            flush_factor(&mut pending_factor, &mut summary);
            pending_factor = Some(WatchFactor { indicator: value, what_to_watch: String::new(), why_it_matters: String::new() });
            section = Section::WatchFactors;
            continue;
        }
        if let Some(value) = extract_marker(line, "WHAT") {
            if let Some(factor) = pending_factor.as_mut() {
                factor.what_to_watch = value;
            }
            continue;
        }
        if let Some(value) = extract_marker(line, "WHY") {
            if let Some(factor) = pending_factor.as_mut() {
                factor.why_it_matters = value;
            }
            continue;
        }

        if let Some(stripped) = line.strip_prefix('-').or_else(|| line.strip_prefix('\u{2022}')) {
            let value = stripped.trim().to_string();
            if !value.is_empty() {
                if let Some(finding) = pending_finding.as_mut() {
                    finding.bullets.push(value);
                } else if section == Section::BottomLine {
                    summary.bottom_line.push(value);
                }
            }
            continue;
        }

        match section {
            Section::BottomLine => summary.bottom_line.push(line.to_string()),
            Section::Findings => {
                if let Some(finding) = pending_finding.as_mut() {
                    if finding.content.is_empty() {
                        finding.content = line.to_string();
                    } else {
                        finding.bullets.push(line.to_string());
                    }
                }
            }
            Section::WatchFactors => {
                if pending_factor.is_none() {
                    warn!("watch factor line with no active indicator, skipping: {}", line);
                }
            }
        }
    }

    flush_finding(&mut pending_finding, &mut summary);
    flush_factor(&mut pending_factor, &mut summary);
    summary
}

fn extract_marker(line: &str, marker: &str) -> Option<String> {
    let prefix = format!("[{marker}:");
    if line.starts_with(&prefix) && line.ends_with(']') {
        Some(line[prefix.len()..line.len() - 1].trim().to_string())
    } else {
        None
    }
}
