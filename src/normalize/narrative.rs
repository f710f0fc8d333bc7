//! Lifts a narrative adapter response into one or more Intelligence
//! Records: clean the prose, strip hedging, optionally split a single
//! response into several records along list/paragraph boundaries.

use crate::adapters::narrative::NarrativeRawResponse;
use crate::record::{IntelligenceRecord, Provenance, SourcePayload, SourceType};
use regex::Regex;
use std::sync::OnceLock;

const HEDGING_PATTERNS: &[&str] = &[
    "has not identified",
    "have not identified",
    "no evidence of",
    "does not appear",
    "not identified",
    "no significant new",
    "no major new",
    "unclear whether",
    "insufficient data",
    "cannot determine",
    "remains unclear",
];

const PRIORITY_INDICATORS: &[&str] = &[
    "significant", "major", "critical", "important", "key", "forecast", "expect", "expects",
    "likely", "will", "could", "increase", "decrease", "rise", "fall", "growth",
];

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn repeated_periods_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{3,}").unwrap())
}

fn double_period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{2,}").unwrap())
}

/// Collapse whitespace, normalize repeated punctuation, capitalize sentence
/// initials, then drop any sentence containing a hedging phrase.
fn clean_and_structure(text: &str) -> String {
    let collapsed = whitespace_re().replace_all(text.trim(), " ");
    let collapsed = collapsed.replace("..", ".");
    let collapsed = repeated_periods_re().replace_all(&collapsed, "...");

    let capitalized = collapsed
        .split(". ")
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(". ");

    let sentences: Vec<&str> = capitalized.split(". ").collect();
    let filtered: Vec<&str> = sentences
        .into_iter()
        .filter(|s| {
            let lower = s.to_ascii_lowercase();
            !HEDGING_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .collect();

    if filtered.is_empty() {
        return capitalized;
    }

    let joined = filtered.join(". ");
    double_period_re().replace_all(&joined, ".").to_string()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// For long, unstructured responses, keep only sentences carrying a
/// priority indicator (at most 5), rewoven as plain prose.
fn extract_key_sentences(text: &str) -> Option<String> {
    if text.len() <= 500 || text.contains('\u{2022}') {
        return None;
    }
    let sentences: Vec<&str> = text.split(". ").collect();
    if sentences.len() <= 3 {
        return None;
    }
    let key: Vec<&str> = sentences
        .iter()
        .filter(|s| {
            let lower = s.to_ascii_lowercase();
            PRIORITY_INDICATORS.iter().any(|p| lower.contains(p))
        })
        .copied()
        .take(5)
        .collect();
    if key.is_empty() {
        return None;
    }
    Some(key.iter().map(|s| format!("{s}.")).collect::<Vec<_>>().join(" "))
}

#[derive(Debug, PartialEq, Eq)]
enum SplitDelimiter {
    Numbered,
    Bulleted,
    Paragraph,
}

impl SplitDelimiter {
    fn min_fragment_len(&self) -> usize {
        match self {
            SplitDelimiter::Numbered => 100,
            SplitDelimiter::Bulleted => 100,
            SplitDelimiter::Paragraph => 150,
        }
    }
}

fn detect_split(text: &str) -> Option<(SplitDelimiter, Vec<String>)> {
    let numbered_hits = (1..=9).filter(|n| text.contains(&format!("\n{n}."))).count();
    if numbered_hits >= 2 {
        let fragments = split_on_numbered(text);
        return Some((SplitDelimiter::Numbered, fragments));
    }
    if text.matches("\n- ").count() >= 2 {
        let fragments: Vec<String> = text
            .split("\n- ")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        return Some((SplitDelimiter::Bulleted, fragments));
    }
    if text.matches("\n\n").count() >= 2 {
        let fragments: Vec<String> = text
            .split("\n\n")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        return Some((SplitDelimiter::Paragraph, fragments));
    }
    None
}

fn split_on_numbered(text: &str) -> Vec<String> {
    let marker_re = {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"\n\d+\.\s*").unwrap())
    };
    marker_re
        .split(text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Base 0.7; +0.1 structural markers, +0.1 any digit, +0.1 length in
/// (100, 1000), +0.05 length >= 1000; clamped to 1.0.
fn narrative_confidence(text: &str) -> f64 {
    let mut score: f64 = 0.7;
    let has_structure = text.contains('\u{2022}') || text.contains("\n1.") || text.contains("\n- ");
    if has_structure {
        score += 0.1;
    }
    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 0.1;
    }
    let len = text.len();
    if len > 100 && len < 1000 {
        score += 0.1;
    } else if len >= 1000 {
        score += 0.05;
    }
    score.min(1.0)
}

/// Splits a raw narrative response into one or more Intelligence Records,
/// discarding fragments shorter than the delimiter's minimum length.
///
/// Splitting runs on the raw, newline-bearing content first; whitespace
/// collapse in `clean_and_structure` would otherwise erase the `\n`
/// boundaries `detect_split` looks for. Each fragment is cleaned
/// independently once the split is decided.
pub fn normalize(response: &NarrativeRawResponse, category: &str) -> Vec<IntelligenceRecord> {
    let raw = &response.content;

    let fragments = match detect_split(raw) {
        Some((delim, parts)) => parts
            .into_iter()
            .filter(|p| p.len() >= delim.min_fragment_len())
            .map(|p| clean_and_structure(&p))
            .collect::<Vec<_>>(),
        None => {
            let cleaned = clean_and_structure(raw);
            let structured = extract_key_sentences(&cleaned).unwrap_or(cleaned);
            vec![structured]
        }
    };

    let fragments = if fragments.is_empty() {
        vec![clean_and_structure(raw)]
    } else {
        fragments
    };

    fragments
        .into_iter()
        .map(|fragment| build_record(&fragment, category, &response.sources))
        .collect()
}

fn build_record(fragment: &str, category: &str, sources: &[Provenance]) -> IntelligenceRecord {
    let relevance = super::base_relevance(fragment);
    let confidence = narrative_confidence(fragment);
    let affected_sectors = super::affected_sectors(fragment);
    let action_items = super::action_items(fragment);

    IntelligenceRecord {
        raw_content: fragment.to_string(),
        processed_content: fragment.to_string(),
        category: category.to_string(),
        relevance_score: relevance,
        confidence,
        so_what_statement: default_so_what(fragment),
        affected_sectors,
        action_items,
        source_type: SourceType::Narrative,
        sources: sources.to_vec(),
        payload: SourcePayload::Narrative,
    }
    .finish()
}

fn default_so_what(fragment: &str) -> String {
    let snippet: String = fragment.chars().take(140).collect();
    format!("Monitor for operational impact: {snippet}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content: &str) -> NarrativeRawResponse {
        NarrativeRawResponse {
            content: content.to_string(),
            sources: Vec::new(),
            confidence_contribution: 0.0,
        }
    }

    #[test]
    fn strips_hedging_sentences() {
        let cleaned = clean_and_structure("Rates rose. We have not identified further impact. Pilots are affected.");
        assert!(!cleaned.to_lowercase().contains("have not identified"));
    }

    #[test]
    fn splits_numbered_list_into_multiple_records() {
        let text = "Intro paragraph here with enough length to pass the minimum fragment threshold easily.\n1. Aviation fuel costs rose sharply this quarter across every major carrier route.\n2. Airport security protocols were tightened following the regional disruption event.";
        let records = normalize(&response(text), "general");
        assert!(records.len() >= 2);
    }

    #[test]
    fn short_fragments_are_discarded() {
        let text = "First.\n1. Short.\n2. Also quite a long fragment describing a detailed sanctions regime change affecting multiple jurisdictions.";
        let records = normalize(&response(text), "general");
        assert!(records.iter().all(|r| r.raw_content.len() >= 100));
    }

    #[test]
    fn confidence_rewards_structure_and_length() {
        let bare = narrative_confidence("short");
        let rich = narrative_confidence(&format!("{}\n1. digit 5 here", "x".repeat(200)));
        assert!(rich > bare);
    }
}
