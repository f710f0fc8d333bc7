//! Cross-module seed scenarios for the merger, driven against constructed
//! `IntelligenceRecord`s rather than live sources.

use aerolens::merger::merge;
use aerolens::record::{IntelligenceRecord, Sector, SourcePayload, SourceType};
use chrono::{Duration, Utc};
use std::collections::BTreeSet;

fn narrative(content: &str, relevance: f64, confidence: f64) -> IntelligenceRecord {
    IntelligenceRecord {
        raw_content: content.to_string(),
        processed_content: content.to_string(),
        category: "macro_outlook".to_string(),
        relevance_score: relevance,
        confidence,
        so_what_statement: "Monitor rate policy.".to_string(),
        affected_sectors: BTreeSet::from([Sector::Finance]),
        action_items: Vec::new(),
        source_type: SourceType::Narrative,
        sources: Vec::new(),
        payload: SourcePayload::Narrative,
    }
}

fn macro_record(content: &str, relevance: f64, confidence: f64) -> IntelligenceRecord {
    IntelligenceRecord {
        raw_content: content.to_string(),
        processed_content: content.to_string(),
        category: "macro".to_string(),
        relevance_score: relevance,
        confidence,
        so_what_statement: "Factor into projections.".to_string(),
        affected_sectors: BTreeSet::from([Sector::Finance, Sector::General]),
        action_items: Vec::new(),
        source_type: SourceType::Macro,
        sources: Vec::new(),
        payload: SourcePayload::Macro {
            series_id: "DFF".to_string(),
            observation_date: Utc::now(),
            units: "Percent".to_string(),
            value: 5.25,
        },
    }
}

fn trade_record(title: &str, implemented_days_ago: i64) -> IntelligenceRecord {
    let as_of = Utc::now();
    let implemented = as_of - Duration::days(implemented_days_ago);
    IntelligenceRecord {
        raw_content: "A measure description.".to_string(),
        processed_content: title.to_string(),
        category: "trade".to_string(),
        relevance_score: 0.7,
        confidence: 0.9,
        so_what_statement: "Review exposure.".to_string(),
        affected_sectors: BTreeSet::from([Sector::General]),
        action_items: Vec::new(),
        source_type: SourceType::Trade,
        sources: Vec::new(),
        payload: SourcePayload::Trade {
            intervention_id: "1".to_string(),
            implementing_jurisdictions: vec!["Country A".to_string()],
            affected_jurisdictions: vec!["Country B".to_string()],
            date_announced: Some(implemented),
            date_implemented: Some(implemented),
        },
    }
}

#[test]
fn multi_source_merge_with_duplicate_promotes_macro_record() {
    let narrative_rec = narrative("The Federal Reserve raised rates by 25 basis points.", 0.7, 0.8);
    let macro_rec = macro_record("Federal Reserve interest rate observation: 5.25 (Percent)", 0.8, 0.95);

    let merged = merge(vec![narrative_rec], vec![], vec![macro_rec], Utc::now());

    assert_eq!(merged[0].source_type, SourceType::Macro);
    assert_eq!(merged.iter().filter(|r| r.source_type == SourceType::Narrative).count(), 1);
}

#[test]
fn trade_freshness_cutoff_drops_records_older_than_180_days() {
    let old = trade_record("Export restriction on avionics components", 200);
    let recent = trade_record("Export restriction on avionics components", 30);

    let merged = merge(vec![], vec![old, recent], vec![], Utc::now());

    assert_eq!(merged.len(), 1);
    match &merged[0].payload {
        SourcePayload::Trade { date_implemented: Some(date), .. } => {
            assert!((Utc::now() - *date).num_days() < 180);
        }
        _ => panic!("expected a trade record"),
    }
}

#[test]
fn empty_sources_produce_empty_output() {
    assert!(merge(vec![], vec![], vec![], Utc::now()).is_empty());
}

#[test]
fn merge_is_idempotent_on_already_merged_input() {
    let records = vec![
        narrative("Distinct narrative content about sector watch items today.", 0.6, 0.7),
        macro_record("Distinct macro content about interest rates this week.", 0.5, 0.9),
    ];
    let as_of = Utc::now();
    let once = merge(records.clone(), vec![], vec![], as_of);
    let twice = merge(once.clone(), vec![], vec![], as_of);

    let once_content: Vec<&str> = once.iter().map(|r| r.processed_content.as_str()).collect();
    let twice_content: Vec<&str> = twice.iter().map(|r| r.processed_content.as_str()).collect();
    assert_eq!(once_content, twice_content);
}

#[test]
fn all_records_satisfy_score_and_sector_invariants() {
    let mut out_of_range = narrative("Aviation fuel surcharge pressure building across carriers.", 1.4, -0.2);
    out_of_range.affected_sectors.clear();
    let out_of_range = out_of_range.finish();

    let records = vec![out_of_range, trade_record("A tariff intervention on spare parts", 10)];
    let merged = merge(records, vec![], vec![], Utc::now());
    for record in &merged {
        assert!((0.0..=1.0).contains(&record.relevance_score));
        assert!((0.0..=1.0).contains(&record.confidence));
        assert!(!record.affected_sectors.is_empty());
    }
}
