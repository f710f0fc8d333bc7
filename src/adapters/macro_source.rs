//! Macro time-series adapter: GET requests against a fixed category → series
//! table, returning only the latest valid observation per series.

use crate::config::SourceCredentials;
use crate::error::{Error, Result};
use crate::retry::{retry, RetryPolicy};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info};

const SOURCE: &str = "macro";
/// FRED's sentinel for a missing observation value.
const MISSING_VALUE: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Inflation,
    InterestRates,
    FuelCosts,
    GdpGrowth,
    Employment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Inflation,
        Category::InterestRates,
        Category::FuelCosts,
        Category::GdpGrowth,
        Category::Employment,
    ];

    /// Default lookback matches the reference client: quarterly GDP data
    /// needs a wider window than the other, higher-frequency categories.
    pub fn default_days_back(self) -> i64 {
        match self {
            Category::GdpGrowth => 180,
            _ => 90,
        }
    }

    pub fn series(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Category::Inflation => &[
                ("CPIAUCSL", "US Consumer Price Index (CPI)"),
                ("CPILFESL", "US Core CPI (Less Food & Energy)"),
                ("PCEPI", "Personal Consumption Expenditures Price Index"),
            ],
            Category::InterestRates => &[
                ("DFF", "Federal Funds Effective Rate"),
                ("DGS10", "10-Year Treasury Constant Maturity Rate"),
                ("MORTGAGE30US", "30-Year Fixed Rate Mortgage Average"),
            ],
            Category::FuelCosts => &[
                ("WJFUELUSGULF", "US Gulf Coast Kerosene-Type Jet Fuel Price"),
                ("DCOILWTICO", "Crude Oil Prices: West Texas Intermediate (WTI)"),
                ("GASREGW", "US Regular All Formulations Gas Price"),
            ],
            Category::GdpGrowth => &[
                ("GDPC1", "Real Gross Domestic Product"),
                ("A191RL1Q225SBEA", "Real GDP Percent Change from Preceding Period"),
            ],
            Category::Employment => &[
                ("UNRATE", "Unemployment Rate"),
                ("PAYEMS", "All Employees, Total Nonfarm"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroObservation {
    pub series_id: String,
    pub series_name: &'static str,
    pub category: Category,
    pub value: f64,
    pub date: DateTime<Utc>,
    pub units: String,
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
    #[serde(default)]
    units: Option<String>,
}

pub struct MacroAdapter {
    client: reqwest::Client,
    credentials: SourceCredentials,
}

impl MacroAdapter {
    pub fn new(credentials: SourceCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    /// Fetches the latest observation for every series in `category`,
    /// skipping series that return no valid (non-"`.`") observation.
    pub async fn fetch_category(&self, category: Category, as_of: DateTime<Utc>) -> Vec<MacroObservation> {
        let days_back = category.default_days_back();
        let mut out = Vec::new();
        for (series_id, series_name) in category.series() {
            match self.fetch_series(series_id, days_back, as_of).await {
                Ok(Some(raw_obs)) => {
                    info!(series_id, value = raw_obs.value, date = %raw_obs.date, "retrieved macro observation");
                    out.push(MacroObservation {
                        series_id: series_id.to_string(),
                        series_name,
                        category,
                        value: raw_obs.value,
                        date: raw_obs.date,
                        units: raw_obs.units,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    error!(series_id, error = %e, "failed to retrieve macro series");
                }
            }
        }
        out
    }

    async fn fetch_series(
        &self,
        series_id: &str,
        days_back: i64,
        as_of: DateTime<Utc>,
    ) -> Result<Option<LatestObservation>> {
        let observations = retry(
            &RetryPolicy::MACRO,
            "macro.fetch_series",
            Error::is_transient,
            || self.get_observations(series_id, days_back, as_of),
        )
        .await?;

        // FRED returns observations chronologically ascending; the last
        // valid one is the most recent.
        let Some(latest) = observations.last() else {
            return Ok(None);
        };
        let Ok(value) = latest.value.parse::<f64>() else {
            return Ok(None);
        };
        let date = NaiveDate::parse_from_str(&latest.date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc));
        let Some(date) = date else {
            return Ok(None);
        };
        let units = observations
            .first()
            .and_then(|o| o.units.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(Some(LatestObservation { value, date, units }))
    }

    async fn get_observations(
        &self,
        series_id: &str,
        days_back: i64,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<RawObservation>> {
        let start = (as_of - ChronoDuration::days(days_back)).format("%Y-%m-%d").to_string();
        let url = format!("{}/series/observations", self.credentials.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", &self.credentials.token),
                ("file_type", "json"),
                ("observation_start", &start),
                ("sort_order", "asc"),
            ])
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

        let parsed: ObservationsResponse = response.json().await.map_err(|e| Error::Parse {
            source_name: SOURCE,
            message: e.to_string(),
        })?;

        Ok(parsed
            .observations
            .into_iter()
            .filter(|o| o.value != MISSING_VALUE)
            .collect())
    }
}

struct LatestObservation {
    value: f64,
    date: DateTime<Utc>,
    units: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_category_has_three_series_including_jet_fuel() {
        let series = Category::FuelCosts.series();
        assert_eq!(series.len(), 3);
        assert!(series.iter().any(|(id, _)| *id == "WJFUELUSGULF"));
    }

    #[test]
    fn gdp_uses_wider_default_lookback() {
        assert_eq!(Category::GdpGrowth.default_days_back(), 180);
        assert_eq!(Category::Inflation.default_days_back(), 90);
    }
}
