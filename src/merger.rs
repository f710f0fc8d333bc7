//! Cross-source merge: freshness filter (trade only; already applied by the
//! orchestrator before records reach here, but re-checked defensively) →
//! composite score with stable sort → semantic de-duplication → topic
//! priority resolution.

use crate::record::{IntelligenceRecord, SourceType};
use std::collections::{HashSet, HashMap};

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "will", "been", "were", "their", "about", "which",
    "there", "these", "those", "into", "over", "after", "before", "while", "such",
];

const DEDUP_SIMILARITY_THRESHOLD: f64 = 0.75;

fn source_weight(source_type: SourceType) -> f64 {
    match source_type {
        SourceType::Narrative => 1.15,
        SourceType::Trade => 1.0,
        SourceType::Macro => 0.95,
    }
}

fn freshness_factor(record: &IntelligenceRecord, as_of: chrono::DateTime<chrono::Utc>) -> f64 {
    match &record.payload {
        crate::record::SourcePayload::Trade { date_implemented: Some(date), .. } => {
            if (as_of - *date).num_days() < 90 {
                1.0
            } else {
                0.9
            }
        }
        crate::record::SourcePayload::Trade { .. } => 0.9,
        crate::record::SourcePayload::Macro { observation_date, .. } => {
            if (as_of - *observation_date).num_days() < 60 {
                1.0
            } else {
                0.95
            }
        }
        crate::record::SourcePayload::Narrative => 1.0,
    }
}

fn composite_score(record: &IntelligenceRecord, as_of: chrono::DateTime<chrono::Utc>) -> f64 {
    record.relevance_score * record.confidence * source_weight(record.source_type) * freshness_factor(record, as_of)
}

fn fingerprint_keywords(processed_content: &str) -> HashSet<String> {
    let fingerprint: String = processed_content
        .trim()
        .to_ascii_lowercase()
        .chars()
        .take(200)
        .collect();
    fingerprint
        .split_whitespace()
        .filter(|t| t.len() > 3 && !STOPWORDS.contains(t))
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn passes_global_freshness(record: &IntelligenceRecord, as_of: chrono::DateTime<chrono::Utc>) -> bool {
    match &record.payload {
        crate::record::SourcePayload::Trade { date_implemented: Some(date), .. } => (as_of - *date).num_days() <= 180,
        _ => true,
    }
}

fn detect_topic(processed_content: &str) -> Topic {
    let lower = processed_content.to_ascii_lowercase();
    const ECONOMIC_KEYWORDS: &[&str] = &["inflation", "interest rate", "gdp", "cpi", "federal reserve", "treasury", "mortgage"];
    const TRADE_KEYWORDS: &[&str] = &["tariff", "sanction", "export control", "trade barrier", "intervention"];
    if ECONOMIC_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Topic::Economic
    } else if TRADE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Topic::Trade
    } else {
        Topic::General
    }
}

enum Topic {
    Economic,
    Trade,
    General,
}

/// `merge(source_lists...) -> ordered record sequence`, taking the sources
/// pre-flattened since the orchestrator already knows which list came from
/// which source.
pub fn merge(
    narrative: Vec<IntelligenceRecord>,
    trade: Vec<IntelligenceRecord>,
    macro_: Vec<IntelligenceRecord>,
    as_of: chrono::DateTime<chrono::Utc>,
) -> Vec<IntelligenceRecord> {
    let mut candidates: Vec<IntelligenceRecord> = narrative
        .into_iter()
        .chain(trade)
        .chain(macro_)
        .filter(|r| passes_global_freshness(r, as_of))
        .collect();

    // Stable sort descending by composite score; ties keep source order of
    // appearance because `sort_by` is stable.
    candidates.sort_by(|a, b| {
        composite_score(b, as_of)
            .partial_cmp(&composite_score(a, as_of))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let kept = deduplicate(candidates);
    resolve_topic_priority(kept)
}

fn deduplicate(candidates: Vec<IntelligenceRecord>) -> Vec<IntelligenceRecord> {
    let mut kept: Vec<IntelligenceRecord> = Vec::new();
    let mut kept_fingerprints: Vec<HashSet<String>> = Vec::new();

    for candidate in candidates {
        let fingerprint = fingerprint_keywords(&candidate.processed_content);
        let is_duplicate = kept_fingerprints
            .iter()
            .any(|kept_fp| jaccard(&fingerprint, kept_fp) > DEDUP_SIMILARITY_THRESHOLD);
        if !is_duplicate {
            kept_fingerprints.push(fingerprint);
            kept.push(candidate);
        }
    }
    kept
}

fn resolve_topic_priority(kept: Vec<IntelligenceRecord>) -> Vec<IntelligenceRecord> {
    let mut emitted = vec![false; kept.len()];
    let mut ordered = Vec::with_capacity(kept.len());
    let mut economic_seen: HashMap<String, usize> = HashMap::new();
    let mut trade_seen: HashMap<String, usize> = HashMap::new();

    for (i, record) in kept.iter().enumerate() {
        let topic_key: String = record.processed_content.to_ascii_lowercase().chars().take(50).collect();
        match detect_topic(&record.processed_content) {
            Topic::Economic => {
                let key = format!("economic_{topic_key}");
                if record.source_type == SourceType::Macro && !economic_seen.contains_key(&key) {
                    economic_seen.insert(key, i);
                    ordered.push(i);
                    emitted[i] = true;
                }
            }
            Topic::Trade => {
                let key = format!("trade_{topic_key}");
                if record.source_type == SourceType::Trade && !trade_seen.contains_key(&key) {
                    trade_seen.insert(key, i);
                    ordered.push(i);
                    emitted[i] = true;
                }
            }
            Topic::General => {
                ordered.push(i);
                emitted[i] = true;
            }
        }
    }

    for (i, flag) in emitted.iter().enumerate() {
        if !flag {
            ordered.push(i);
        }
    }

    let mut kept = kept.into_iter().map(Some).collect::<Vec<_>>();
    ordered
        .into_iter()
        .filter_map(|i| kept[i].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Sector, SourcePayload};
    use std::collections::BTreeSet;

    fn narrative_record(content: &str, relevance: f64, confidence: f64) -> IntelligenceRecord {
        IntelligenceRecord {
            raw_content: content.to_string(),
            processed_content: content.to_string(),
            category: "general".to_string(),
            relevance_score: relevance,
            confidence,
            so_what_statement: "Monitor.".to_string(),
            affected_sectors: BTreeSet::from([Sector::General]),
            action_items: Vec::new(),
            source_type: SourceType::Narrative,
            sources: Vec::new(),
            payload: SourcePayload::Narrative,
        }
    }

    #[test]
    fn near_duplicate_records_are_deduplicated() {
        let a = narrative_record("Aviation fuel prices rose sharply amid global oil supply disruption concerns.", 0.8, 0.9);
        let b = narrative_record("Aviation fuel prices rose sharply amid global oil supply disruption worries.", 0.5, 0.7);
        let merged = merge(vec![a, b], vec![], vec![], chrono::Utc::now());
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn distinct_records_are_both_kept() {
        let a = narrative_record("Aviation fuel prices rose sharply this week across major routes.", 0.8, 0.9);
        let b = narrative_record("A completely unrelated entertainment sector streaming deal was announced.", 0.5, 0.7);
        let merged = merge(vec![a, b], vec![], vec![], chrono::Utc::now());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn higher_score_sorts_first() {
        let low = narrative_record("Some general travel advisory update for business clients everywhere.", 0.3, 0.5);
        let high = narrative_record("A distinct and separate high relevance aviation security bulletin was issued today.", 0.9, 0.9);
        let merged = merge(vec![low, high], vec![], vec![], chrono::Utc::now());
        assert!(merged[0].relevance_score >= merged[1].relevance_score);
    }
}
