//! Lifts a FRED-style macro observation into an Intelligence Record.
//!
//! Sector mapping is series-specific rather than running the observation
//! through the general keyword tables: macro observations carry no prose,
//! so keyword matching would either miss everything or over-match on the
//! series' human name. High-signal series are restricted to their natural
//! sectors to avoid paging every sector for every rate move.

use crate::adapters::macro_source::{Category, MacroObservation};
use crate::record::{IntelligenceRecord, Sector, SourcePayload, SourceType};
use std::collections::BTreeSet;

fn category_relevance(category: Category, series_id: &str) -> f64 {
    match category {
        Category::FuelCosts if series_id == "WJFUELUSGULF" => 0.4,
        Category::FuelCosts => 0.25, // crude / gasoline
        Category::InterestRates => 0.3,
        Category::Inflation => 0.25,
        Category::GdpGrowth => 0.2,
        Category::Employment => 0.15,
    }
}

fn sectors_for(category: Category, series_id: &str) -> BTreeSet<Sector> {
    let mut set = BTreeSet::new();
    match category {
        Category::FuelCosts if series_id == "WJFUELUSGULF" => {
            set.insert(Sector::General);
            set.insert(Sector::Energy);
        }
        Category::FuelCosts => {
            set.insert(Sector::Energy);
        }
        Category::InterestRates | Category::Inflation => {
            set.insert(Sector::General);
            set.insert(Sector::Finance);
        }
        Category::GdpGrowth => {
            set.insert(Sector::General);
        }
        Category::Employment => {
            set.insert(Sector::General);
        }
    }
    set
}

fn format_value(category: Category, series_id: &str, value: f64) -> String {
    match category {
        Category::InterestRates => format!("{value:.2}%"),
        Category::Employment if series_id == "UNRATE" => format!("{value:.1}%"),
        Category::FuelCosts => format!("${value:.2}/unit"),
        Category::Inflation => format!("index {value:.1}"),
        Category::GdpGrowth if series_id == "GDPC1" => format!("${:.2}T", value / 1000.0),
        Category::GdpGrowth => format!("{value:.1}%"),
        Category::Employment => format!("{value:.0}"),
    }
}

fn so_what_for(observation: &MacroObservation, formatted_value: &str) -> String {
    format!(
        "{} is now {} as of {}; factor into client cost and demand projections.",
        observation.series_name,
        formatted_value,
        observation.date.format("%Y-%m-%d")
    )
}

pub fn normalize(observation: &MacroObservation) -> IntelligenceRecord {
    let relevance = category_relevance(observation.category, &observation.series_id);
    let affected_sectors = sectors_for(observation.category, &observation.series_id);
    let formatted_value = format_value(observation.category, &observation.series_id, observation.value);
    let processed_content = format!(
        "{}: {} ({})",
        observation.series_name, formatted_value, observation.units
    );

    IntelligenceRecord {
        raw_content: processed_content.clone(),
        processed_content: processed_content.clone(),
        category: "macro".to_string(),
        relevance_score: relevance,
        confidence: 0.95,
        so_what_statement: so_what_for(observation, &formatted_value),
        affected_sectors,
        action_items: super::action_items(&processed_content),
        source_type: SourceType::Macro,
        sources: Vec::new(),
        payload: SourcePayload::Macro {
            series_id: observation.series_id.clone(),
            observation_date: observation.date,
            units: observation.units.clone(),
            value: observation.value,
        },
    }
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(category: Category, series_id: &str, value: f64) -> MacroObservation {
        MacroObservation {
            series_id: series_id.to_string(),
            series_name: "Sample Series",
            category,
            value,
            date: Utc::now(),
            units: "Percent".to_string(),
        }
    }

    #[test]
    fn jet_fuel_restricted_to_general_and_energy() {
        let record = normalize(&sample(Category::FuelCosts, "WJFUELUSGULF", 2.5));
        assert_eq!(record.affected_sectors, [Sector::General, Sector::Energy].into_iter().collect());
        assert_eq!(record.relevance_score, 0.4);
    }

    #[test]
    fn interest_rate_maps_to_finance_and_general_only() {
        let record = normalize(&sample(Category::InterestRates, "DFF", 5.25));
        assert_eq!(record.affected_sectors, [Sector::General, Sector::Finance].into_iter().collect());
    }

    #[test]
    fn confidence_is_fixed_high() {
        let record = normalize(&sample(Category::Employment, "UNRATE", 4.1));
        assert_eq!(record.confidence, 0.95);
    }
}
