//! Groups merged records by client sector and synthesizes a per-sector
//! summary, risk list, and opportunity list.

use crate::record::{IntelligenceRecord, Sector, SectorBundle};

const RISK_INDICATORS: &[&str] = &[
    "risk", "threat", "instability", "conflict", "sanctions", "crisis", "disruption",
    "uncertainty", "volatility", "tension",
];

const OPPORTUNITY_INDICATORS: &[&str] = &[
    "growth", "expansion", "opportunity", "emerging", "recovery", "improvement", "investment",
    "development", "innovation",
];

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_ascii_lowercase();
    keywords.iter().any(|kw| lower.contains(kw))
}

fn extract_statements<'a>(records: &'a [&'a IntelligenceRecord], keywords: &[&str]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for record in records {
        if matches_any(&record.raw_content, keywords) && seen.insert(record.so_what_statement.clone()) {
            out.push(record.so_what_statement.clone());
            if out.len() >= 3 {
                break;
            }
        }
    }
    out
}

/// Produces one bundle per sector in the closed enumeration, in
/// `Sector::ALL` order.
pub fn organize(records: &[IntelligenceRecord]) -> Vec<SectorBundle> {
    Sector::ALL
        .iter()
        .map(|&sector| build_bundle(sector, records))
        .collect()
}

fn build_bundle(sector: Sector, records: &[IntelligenceRecord]) -> SectorBundle {
    let mut matching: Vec<&IntelligenceRecord> = records
        .iter()
        .filter(|r| r.affected_sectors.contains(&sector) || r.affected_sectors.contains(&Sector::General))
        .collect();
    matching.sort_by(|a, b| b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal));

    let summary = matching
        .iter()
        .take(3)
        .map(|r| r.so_what_statement.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let risks = extract_statements(&matching, RISK_INDICATORS);
    let opportunities = extract_statements(&matching, OPPORTUNITY_INDICATORS);

    SectorBundle {
        sector,
        records: matching.into_iter().cloned().collect(),
        summary,
        risks,
        opportunities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{SourcePayload, SourceType};
    use std::collections::BTreeSet;

    fn record(raw: &str, so_what: &str, sectors: &[Sector], relevance: f64) -> IntelligenceRecord {
        IntelligenceRecord {
            raw_content: raw.to_string(),
            processed_content: raw.to_string(),
            category: "general".to_string(),
            relevance_score: relevance,
            confidence: 0.8,
            so_what_statement: so_what.to_string(),
            affected_sectors: sectors.iter().copied().collect::<BTreeSet<_>>(),
            action_items: Vec::new(),
            source_type: SourceType::Narrative,
            sources: Vec::new(),
            payload: SourcePayload::Narrative,
        }
    }

    #[test]
    fn general_records_appear_in_every_sector() {
        let records = vec![record("A general disruption risk.", "Monitor broadly.", &[Sector::General], 0.6)];
        let bundles = organize(&records);
        assert!(bundles.iter().all(|b| !b.records.is_empty()));
    }

    #[test]
    fn sector_specific_records_only_in_their_sector() {
        let records = vec![record("Energy sector pipeline disruption.", "Watch pipeline risk.", &[Sector::Energy], 0.7)];
        let bundles = organize(&records);
        let energy = bundles.iter().find(|b| b.sector == Sector::Energy).unwrap();
        let finance = bundles.iter().find(|b| b.sector == Sector::Finance).unwrap();
        assert_eq!(energy.records.len(), 1);
        assert!(finance.records.is_empty());
    }

    #[test]
    fn risks_and_opportunities_capped_at_three_and_deduplicated() {
        let records = vec![
            record("Supply chain risk in energy.", "Risk one.", &[Sector::Energy], 0.9),
            record("Another risk in energy markets.", "Risk one.", &[Sector::Energy], 0.8),
            record("A third distinct risk statement here.", "Risk two.", &[Sector::Energy], 0.7),
        ];
        let bundles = organize(&records);
        let energy = bundles.iter().find(|b| b.sector == Sector::Energy).unwrap();
        assert_eq!(energy.risks.len(), 2);
    }
}
