//! Concurrent multi-source gather with bounded parallelism and
//! partial-failure tolerance: no single source's outage should block the
//! others, and the run still produces a (possibly sparse) result envelope.

use crate::adapters::macro_source::{Category, MacroAdapter};
use crate::adapters::narrative::{self, NarrativeAdapter, NarrativeQuery};
use crate::adapters::trade::{QueryFamily, TradeAdapter};
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::normalize;
use crate::record::{IntelligenceRecord, SourceStatus, SourceStatusReport};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const NARRATIVE_SEMAPHORE_WIDTH: usize = 3;
const FOLLOW_UP_SPACING: Duration = Duration::from_secs(1);
const FOLLOW_UP_CONFIDENCE_THRESHOLD: f64 = 0.6;
const MAX_FOLLOW_UPS: usize = 2;

pub struct CollectParams {
    pub user_id: String,
    pub conversation_id: String,
    pub as_of: DateTime<Utc>,
    pub trade_days_back: i64,
}

pub struct CollectResult {
    pub narrative: Vec<IntelligenceRecord>,
    pub trade: Vec<IntelligenceRecord>,
    pub macro_: Vec<IntelligenceRecord>,
    pub source_status: SourceStatusReport,
}

pub struct Orchestrator {
    config: Arc<Config>,
    cache: Arc<dyn ResponseCache>,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { config, cache }
    }

    pub async fn collect_all(&self, params: &CollectParams) -> CollectResult {
        let (narrative, trade, macro_) = tokio::join!(
            self.collect_narrative(params),
            self.collect_trade(params),
            self.collect_macro(params),
        );

        let (narrative_records, narrative_status) = narrative;
        let (trade_records, trade_status) = trade;
        let (macro_records, macro_status) = macro_;

        CollectResult {
            narrative: narrative_records,
            trade: trade_records,
            macro_: macro_records,
            source_status: SourceStatusReport {
                narrative: narrative_status,
                trade: trade_status,
                macro_: macro_status,
            },
        }
    }

    async fn collect_narrative(&self, params: &CollectParams) -> (Vec<IntelligenceRecord>, SourceStatus) {
        let Some(credentials) = self.config.narrative.clone() else {
            return (Vec::new(), SourceStatus::Unconfigured);
        };
        let adapter = Arc::new(NarrativeAdapter::new(credentials));
        let mut templates = narrative::default_templates();
        templates.sort_by(|a, b| b.priority.cmp(&a.priority));

        let semaphore = Arc::new(Semaphore::new(NARRATIVE_SEMAPHORE_WIDTH));
        let mut handles = Vec::new();
        for template in templates {
            let adapter = Arc::clone(&adapter);
            let semaphore = Arc::clone(&semaphore);
            let cache = Arc::clone(&self.cache);
            let user_id = params.user_id.clone();
            let conversation_id = params.conversation_id.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                run_template(adapter, cache, template, user_id, conversation_id).await
            }));
        }

        let mut records = Vec::new();
        let mut any_success = false;
        for handle in handles {
            match handle.await {
                Ok(Some(fragments)) => {
                    any_success = true;
                    records.extend(fragments);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "narrative template task panicked"),
            }
        }

        let status = if any_success { SourceStatus::Success } else { SourceStatus::Failed };
        (records, status)
    }

    async fn collect_trade(&self, params: &CollectParams) -> (Vec<IntelligenceRecord>, SourceStatus) {
        let Some(credentials) = self.config.trade.clone() else {
            return (Vec::new(), SourceStatus::Unconfigured);
        };
        let adapter = Arc::new(TradeAdapter::new(credentials));

        let futures = QueryFamily::ALL.iter().map(|family| {
            let adapter = Arc::clone(&adapter);
            let cache = Arc::clone(&self.cache);
            let family = *family;
            let as_of = params.as_of;
            let days_back = params.trade_days_back;
            async move { fetch_trade_family(adapter, cache, family, days_back, as_of).await }
        });

        let results = futures::future::join_all(futures).await;
        let mut records = Vec::new();
        let mut any_success = false;
        for interventions in results.into_iter().flatten() {
            any_success = true;
            for intervention in &interventions {
                if normalize::trade::passes_freshness_cutoff(intervention, params.as_of) {
                    records.push(normalize::trade::normalize(intervention, params.as_of));
                }
            }
        }

        let status = if any_success { SourceStatus::Success } else { SourceStatus::Failed };
        (records, status)
    }

    async fn collect_macro(&self, _params: &CollectParams) -> (Vec<IntelligenceRecord>, SourceStatus) {
        let Some(credentials) = self.config.macro_.clone() else {
            return (Vec::new(), SourceStatus::Unconfigured);
        };
        let adapter = Arc::new(MacroAdapter::new(credentials));
        let as_of = Utc::now();

        let futures = Category::ALL.iter().map(|category| {
            let adapter = Arc::clone(&adapter);
            let category = *category;
            async move { adapter.fetch_category(category, as_of).await }
        });

        let results = futures::future::join_all(futures).await;
        let mut records = Vec::new();
        let mut any_success = false;
        for observations in results {
            if !observations.is_empty() {
                any_success = true;
            }
            for observation in &observations {
                records.push(normalize::macro_source::normalize(observation));
            }
        }

        let status = if any_success { SourceStatus::Success } else { SourceStatus::Failed };
        (records, status)
    }
}

async fn run_template(
    adapter: Arc<NarrativeAdapter>,
    cache: Arc<dyn ResponseCache>,
    template: narrative::QueryTemplate,
    user_id: String,
    conversation_id: String,
) -> Option<Vec<IntelligenceRecord>> {
    let primary = query_with_cache(&adapter, &cache, &template.name.to_string(), &template.prompt, &user_id, &conversation_id).await?;

    let mut fragments = normalize::narrative::normalize(&primary, template.name);

    if primary.confidence_contribution > FOLLOW_UP_CONFIDENCE_THRESHOLD {
        for (i, follow_up) in template.follow_ups.iter().take(MAX_FOLLOW_UPS).enumerate() {
            tokio::time::sleep(FOLLOW_UP_SPACING).await;
            let key = format!("{}_follow_up_{i}", template.name);
            if let Some(response) = query_with_cache(&adapter, &cache, &key, follow_up, &user_id, &conversation_id).await {
                fragments.extend(normalize::narrative::normalize(&response, template.name));
            }
        }
    }

    Some(fragments)
}

async fn query_with_cache(
    adapter: &NarrativeAdapter,
    cache: &Arc<dyn ResponseCache>,
    cache_key: &str,
    message: &str,
    user_id: &str,
    conversation_id: &str,
) -> Option<narrative::NarrativeRawResponse> {
    let params = json!({ "key": cache_key, "message": message, "conversation_id": conversation_id });
    if let Some(cached) = cache.get("narrative", &params).await {
        if let Ok(response) = serde_json::from_value(cached) {
            return Some(response);
        }
    }

    let query = NarrativeQuery {
        message: message.to_string(),
        user_id: user_id.to_string(),
        conversation_id: conversation_id.to_string(),
        max_results: 10,
        min_score: 0.0,
    };

    match adapter.query(&query).await {
        Ok(response) => {
            if let Ok(value) = serde_json::to_value(NarrativeCacheShape::from(&response)) {
                cache.set("narrative", &params, value).await;
            }
            Some(response)
        }
        Err(e) => {
            warn!(cache_key, error = %e, "narrative query failed");
            None
        }
    }
}

/// Serializable mirror of [`narrative::NarrativeRawResponse`] for the cache
/// layer, which only understands `serde_json::Value`.
#[derive(serde::Serialize, serde::Deserialize)]
struct NarrativeCacheShape {
    content: String,
    sources: Vec<crate::record::Provenance>,
    confidence_contribution: f64,
}

impl From<&narrative::NarrativeRawResponse> for NarrativeCacheShape {
    fn from(r: &narrative::NarrativeRawResponse) -> Self {
        Self {
            content: r.content.clone(),
            sources: r.sources.clone(),
            confidence_contribution: r.confidence_contribution,
        }
    }
}

impl From<NarrativeCacheShape> for narrative::NarrativeRawResponse {
    fn from(s: NarrativeCacheShape) -> Self {
        Self {
            content: s.content,
            sources: s.sources,
            confidence_contribution: s.confidence_contribution,
        }
    }
}

async fn fetch_trade_family(
    adapter: Arc<TradeAdapter>,
    cache: Arc<dyn ResponseCache>,
    family: QueryFamily,
    days_back: i64,
    as_of: DateTime<Utc>,
) -> Option<Vec<crate::adapters::trade::TradeIntervention>> {
    let params = json!({ "family": format!("{family:?}"), "days_back": days_back });
    if let Some(cached) = cache.get("trade", &params).await {
        if let Ok(items) = serde_json::from_value(cached) {
            return Some(items);
        }
    }

    match adapter.query_family(family, days_back, as_of).await {
        Ok(items) => {
            if let Ok(value) = serde_json::to_value(&items) {
                cache.set("trade", &params, value).await;
            }
            info!(family = ?family, count = items.len(), "collected trade interventions");
            Some(items)
        }
        Err(e) => {
            warn!(family = ?family, error = %e, "trade query family failed");
            None
        }
    }
}
