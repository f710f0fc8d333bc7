//! Lifts a GTA-style trade intervention into an Intelligence Record.

use crate::adapters::trade::TradeIntervention;
use crate::record::{IntelligenceRecord, SourcePayload, SourceType};
use chrono::{DateTime, Utc};

const AVIATION_ADJACENT_SECTORS: &[&str] = &[
    "air transport",
    "manufacture of air and spacecraft",
    "aviation",
    "aerospace",
];

struct SoWhatPattern {
    trigger: &'static str,
    phrase: &'static str,
}

const SO_WHAT_PATTERNS: &[SoWhatPattern] = &[
    SoWhatPattern { trigger: "sanction", phrase: "New sanctions may restrict routing or counterparties in affected jurisdictions." },
    SoWhatPattern { trigger: "export", phrase: "Export controls may affect parts sourcing or aircraft transfer for affected routes." },
    SoWhatPattern { trigger: "tariff", phrase: "Tariff changes may raise landed cost for cross-border procurement." },
    SoWhatPattern { trigger: "import", phrase: "Import measures may affect cross-border procurement costs." },
    SoWhatPattern { trigger: "capital", phrase: "Capital controls may complicate cross-border financing or repatriation." },
    SoWhatPattern { trigger: "technology", phrase: "Technology restrictions may affect equipment or software transfer." },
    SoWhatPattern { trigger: "local content", phrase: "Local-content rules may affect sourcing decisions in the affected market." },
    SoWhatPattern { trigger: "subsidy", phrase: "Subsidy changes may shift competitive dynamics in the affected sector." },
    SoWhatPattern { trigger: "grant", phrase: "New grant programs may create opportunity in the affected sector." },
];

fn so_what_for(intervention_type: &str, evaluation: &str) -> String {
    let lower = intervention_type.to_ascii_lowercase();
    for pattern in SO_WHAT_PATTERNS {
        if lower.contains(pattern.trigger) {
            return pattern.phrase.to_string();
        }
    }
    match evaluation {
        "Harmful" | "Red" => "This measure is assessed as harmful and warrants monitoring for downstream impact.".to_string(),
        "Liberalising" => "This measure liberalises trade conditions and may reduce friction for affected routes.".to_string(),
        _ => "This measure's impact is not yet clearly assessed and warrants continued monitoring.".to_string(),
    }
}

fn freshness_adjustment(implemented_at: Option<DateTime<Utc>>, as_of: DateTime<Utc>, aviation_relevant: bool) -> f64 {
    let Some(implemented_at) = implemented_at else {
        return 0.0;
    };
    let days = (as_of - implemented_at).num_days();
    if days < 30 {
        0.3
    } else if days < 60 {
        0.2
    } else if days < 90 {
        0.1
    } else if days < 180 {
        0.0
    } else if days < 365 {
        if aviation_relevant {
            0.0
        } else {
            -0.1
        }
    } else if aviation_relevant {
        0.0
    } else {
        -0.2
    }
}

/// 180-day global freshness cutoff: trade records implemented longer ago
/// than this are excluded before merge, regardless of relevance.
pub fn passes_freshness_cutoff(intervention: &TradeIntervention, as_of: DateTime<Utc>) -> bool {
    match intervention.implemented_at() {
        Some(date) => (as_of - date).num_days() <= 180,
        None => true,
    }
}

pub fn normalize(intervention: &TradeIntervention, as_of: DateTime<Utc>) -> IntelligenceRecord {
    let corpus = format!("{} {}", intervention.title, intervention.description);
    let aviation_relevant = intervention
        .affected_sectors
        .iter()
        .any(|s| AVIATION_ADJACENT_SECTORS.iter().any(|kw| s.to_ascii_lowercase().contains(kw)));

    let mut relevance = 0.5;
    if matches!(intervention.gta_evaluation.as_str(), "Harmful" | "Red") {
        relevance += 0.3;
    } else if intervention.gta_evaluation == "Liberalising" {
        relevance += 0.2;
    }
    if aviation_relevant {
        relevance += 0.2;
    }
    relevance += freshness_adjustment(intervention.implemented_at(), as_of, aviation_relevant);

    let confidence = if intervention.sources.is_empty() { 0.8 } else { 0.9 };

    let mut affected_sectors = super::affected_sectors(&corpus);
    if aviation_relevant {
        affected_sectors.insert(crate::record::Sector::General);
    }

    let action_items = super::action_items(&corpus);

    IntelligenceRecord {
        raw_content: intervention.description.clone(),
        processed_content: intervention.title.clone(),
        category: "trade".to_string(),
        relevance_score: relevance,
        confidence,
        so_what_statement: so_what_for(&intervention.intervention_type, &intervention.gta_evaluation),
        affected_sectors,
        action_items,
        source_type: SourceType::Trade,
        sources: intervention.sources.clone(),
        payload: SourcePayload::Trade {
            intervention_id: intervention.intervention_id_string(),
            implementing_jurisdictions: intervention.implementing_names(),
            affected_jurisdictions: intervention.affected_names(),
            date_announced: intervention.announced_at(),
            date_implemented: intervention.implemented_at(),
        },
    }
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample(evaluation: &str, intervention_type: &str, days_ago: i64, aviation: bool) -> TradeIntervention {
        let as_of = Utc::now();
        let implemented = (as_of - Duration::days(days_ago)).format("%Y-%m-%d").to_string();
        let sectors = if aviation { vec!["Air transport".to_string()] } else { vec!["Retail".to_string()] };
        serde_json::from_value(json!({
            "intervention_id": 1,
            "title": "Sample intervention",
            "description": "A description of the measure.",
            "gta_evaluation": evaluation,
            "intervention_type": intervention_type,
            "affected_sectors": sectors,
            "date_implemented": implemented,
        }))
        .unwrap()
    }

    #[test]
    fn harmful_and_aviation_adjacent_scores_higher() {
        let harmful = normalize(&sample("Harmful", "Export tariff", 10, true), Utc::now());
        let unclear = normalize(&sample("Unclear", "Other", 10, false), Utc::now());
        assert!(harmful.relevance_score > unclear.relevance_score);
    }

    #[test]
    fn confidence_depends_on_provenance() {
        let record = normalize(&sample("Unclear", "Other", 10, false), Utc::now());
        assert_eq!(record.confidence, 0.8);
    }

    #[test]
    fn freshness_cutoff_excludes_old_interventions() {
        let old = sample("Harmful", "Sanctions", 200, true);
        assert!(!passes_freshness_cutoff(&old, Utc::now()));
        let recent = sample("Harmful", "Sanctions", 10, true);
        assert!(passes_freshness_cutoff(&recent, Utc::now()));
    }

    #[test]
    fn so_what_picks_sanction_phrasing() {
        let text = so_what_for("Export control measure", "Harmful");
        assert!(text.contains("Export controls"));
    }
}
