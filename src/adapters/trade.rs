//! Trade intervention catalog adapter.
//!
//! Unlike the narrative service this is a plain request/response API: POST
//! a filter document, get back either a bare JSON array or `{"data": [...]}`
//! — both shapes are accepted since the upstream has been observed to send
//! either depending on endpoint version.

use crate::config::SourceCredentials;
use crate::error::Error;
use crate::error::Result;
use crate::retry::{retry, RetryPolicy};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

const SOURCE: &str = "trade";
const API_HARD_CAP: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIntervention {
    pub intervention_id: Value,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_evaluation")]
    pub gta_evaluation: String,
    #[serde(default)]
    pub implementing_jurisdictions: Vec<Jurisdiction>,
    #[serde(default)]
    pub affected_jurisdictions: Vec<Jurisdiction>,
    #[serde(default = "default_intervention_type")]
    pub intervention_type: String,
    #[serde(default)]
    pub affected_sectors: Vec<String>,
    pub date_announced: Option<String>,
    pub date_implemented: Option<String>,
    #[serde(default)]
    pub sources: Vec<crate::record::Provenance>,
}

fn default_title() -> String {
    "Untitled Intervention".to_string()
}
fn default_evaluation() -> String {
    "Unclear".to_string()
}
fn default_intervention_type() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jurisdiction {
    #[serde(default)]
    pub name: String,
}

impl TradeIntervention {
    pub fn implementing_names(&self) -> Vec<String> {
        self.implementing_jurisdictions.iter().map(|j| j.name.clone()).collect()
    }

    pub fn affected_names(&self) -> Vec<String> {
        self.affected_jurisdictions.iter().map(|j| j.name.clone()).collect()
    }

    pub fn announced_at(&self) -> Option<DateTime<Utc>> {
        parse_gta_date(self.date_announced.as_deref())
    }

    pub fn implemented_at(&self) -> Option<DateTime<Utc>> {
        parse_gta_date(self.date_implemented.as_deref())
    }

    pub fn intervention_id_string(&self) -> String {
        match &self.intervention_id {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => "unknown".to_string(),
        }
    }
}

fn parse_gta_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// One of the five fixed query families the orchestrator fans out over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFamily {
    SanctionsAndExportControls,
    CapitalControls,
    TechnologyRestrictions,
    AviationSector,
    RecentHarmful,
}

impl QueryFamily {
    pub const ALL: [QueryFamily; 5] = [
        QueryFamily::SanctionsAndExportControls,
        QueryFamily::CapitalControls,
        QueryFamily::TechnologyRestrictions,
        QueryFamily::AviationSector,
        QueryFamily::RecentHarmful,
    ];

    fn default_limit(self) -> u32 {
        match self {
            QueryFamily::SanctionsAndExportControls => 50,
            QueryFamily::CapitalControls => 30,
            QueryFamily::TechnologyRestrictions => 30,
            QueryFamily::AviationSector => 50,
            QueryFamily::RecentHarmful => 100,
        }
    }

    fn filters(self, days_back: i64, as_of: DateTime<Utc>) -> Value {
        let start = (as_of - chrono::Duration::days(days_back)).format("%Y-%m-%d").to_string();
        let end = as_of.format("%Y-%m-%d").to_string();
        match self {
            QueryFamily::SanctionsAndExportControls => json!({
                "intervention_types": [47, 18, 51, 52],
                "gta_evaluation": [1, 4],
                "implementation_period": [start, end],
                "in_force_on_date": end,
                "keep_in_force_on_date": true,
            }),
            QueryFamily::CapitalControls => json!({
                "mast_chapters": [3],
                "implementation_period": [start, end],
                "gta_evaluation": [1, 4],
            }),
            QueryFamily::TechnologyRestrictions => json!({
                "mast_chapters": [15],
                "implementation_period": [start, end],
                "gta_evaluation": [1, 4],
            }),
            QueryFamily::AviationSector => json!({
                "affected_sectors": ["Air transport", "Manufacture of air and spacecraft"],
                "implementation_period": [start, end],
            }),
            QueryFamily::RecentHarmful => json!({
                "gta_evaluation": [1, 4],
                "implementation_period": [start, end],
                "in_force_on_date": end,
                "keep_in_force_on_date": true,
            }),
        }
    }
}

pub struct TradeAdapter {
    client: reqwest::Client,
    credentials: SourceCredentials,
}

impl TradeAdapter {
    pub fn new(credentials: SourceCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    pub async fn query_family(
        &self,
        family: QueryFamily,
        days_back: i64,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<TradeIntervention>> {
        let mut body = family.filters(days_back, as_of);
        let limit = family.default_limit().min(API_HARD_CAP);
        if let Value::Object(ref mut map) = body {
            map.insert("limit".into(), json!(limit));
            map.insert("offset".into(), json!(0));
        }

        let interventions = retry(
            &RetryPolicy::TRADE,
            "trade.query_family",
            Error::is_transient,
            || self.post(&body),
        )
        .await?;

        Ok(interventions.into_iter().take(limit as usize).collect())
    }

    async fn post(&self, body: &Value) -> Result<Vec<TradeIntervention>> {
        let response = self
            .client
            .post(&self.credentials.base_url)
            .header("Authorization", format!("APIKey {}", self.credentials.token))
            .json(body)
            .send()
            .await
            .map_err(|e| super::transport_error(SOURCE, &e))?;

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

        let payload: Value = response.json().await.map_err(|e| Error::Parse {
            source_name: SOURCE,
            message: e.to_string(),
        })?;

        let raw_items = match payload {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!(source = SOURCE, "unexpected response shape, no data array");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        Ok(raw_items
            .into_iter()
            .filter_map(|v| match serde_json::from_value(v) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(source = SOURCE, error = %e, "dropping unparseable intervention");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_family() {
        assert_eq!(QueryFamily::SanctionsAndExportControls.default_limit(), 50);
        assert_eq!(QueryFamily::CapitalControls.default_limit(), 30);
        assert_eq!(QueryFamily::RecentHarmful.default_limit(), 100);
    }

    #[test]
    fn parses_gta_style_date() {
        let dt = parse_gta_date(Some("2026-03-14")).unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2026-03-14");
    }

    #[test]
    fn missing_date_is_none() {
        assert!(parse_gta_date(None).is_none());
        assert!(parse_gta_date(Some("not-a-date")).is_none());
    }

    #[test]
    fn intervention_id_stringifies_numbers_and_strings() {
        let mut item: TradeIntervention = serde_json::from_value(json!({
            "intervention_id": 12345,
        }))
        .unwrap();
        assert_eq!(item.intervention_id_string(), "12345");
        item.intervention_id = json!("abc");
        assert_eq!(item.intervention_id_string(), "abc");
    }
}
