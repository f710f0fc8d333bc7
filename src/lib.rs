//! Multi-source intelligence orchestration and merge engine: collect from
//! the narrative, trade, and macro services, normalize into a common
//! record shape, merge/dedup/score, organize by sector, optionally run AI
//! augmentation, and hand the result to a render sink.

pub mod adapters;
pub mod ai;
pub mod cache;
pub mod config;
pub mod error;
pub mod merger;
pub mod normalize;
pub mod orchestrator;
pub mod record;
pub mod render;
pub mod retry;
pub mod sector;

use ai::generator::AIClient;
use ai::Augmentor;
use cache::{DiskCache, NoopCache, ResponseCache};
use chrono::{DateTime, Utc};
use config::Config;
use orchestrator::{CollectParams, Orchestrator};
use record::{ExecutiveSummary, IntelligenceRecord, KeyFinding};
use render::{RenderPayload, RenderSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default fallback used when AI augmentation is disabled, unconfigured, or
/// its output fails validation: a template summary built purely from the
/// merged records, with no generated prose.
pub fn fallback_exec_summary(records: &[IntelligenceRecord]) -> ExecutiveSummary {
    let mut ranked: Vec<&IntelligenceRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal));

    let bottom_line = ranked
        .iter()
        .take(3)
        .map(|r| r.so_what_statement.clone())
        .collect();

    let key_findings = ranked
        .iter()
        .take(5)
        .map(|r| KeyFinding {
            subheader: r.category.clone(),
            content: r.so_what_statement.clone(),
            bullets: Vec::new(),
        })
        .collect();

    ExecutiveSummary {
        bottom_line,
        key_findings,
        watch_factors: Vec::new(),
    }
}

/// Template so-what fallback: the record already carries one from its
/// normalizer, so the fallback is simply that statement unchanged.
pub fn fallback_so_what(record: &IntelligenceRecord) -> String {
    record.so_what_statement.clone()
}

fn build_cache(config: &Config) -> Arc<dyn ResponseCache> {
    if config.cache_enabled {
        Arc::new(DiskCache::new(config.cache_dir.clone(), Duration::from_secs(config.cache_ttl_hours as u64 * 3600)))
    } else {
        Arc::new(NoopCache)
    }
}

fn build_augmentor(config: &Config) -> Augmentor {
    let client = match (config.ai_enabled, &config.ai_api_key) {
        (true, Some(api_key)) => Some(Arc::new(AIClient::new(
            api_key.clone(),
            config.ai_base_url.clone(),
            config.ai_model.clone(),
            config.ai_max_tokens,
        ))),
        _ => None,
    };
    Augmentor::new(client)
}

/// One end-to-end run: collect, merge, organize, augment, render. Returns
/// the source status report so the caller can decide an exit code without
/// re-deriving it from the payload.
pub async fn run(
    config: Arc<Config>,
    user_id: String,
    conversation_id: String,
    trade_days_back: i64,
    sink: &dyn RenderSink,
) -> error::Result<record::SourceStatusReport> {
    let as_of = Utc::now();
    let cache = build_cache(&config);
    let orchestrator = Orchestrator::new(Arc::clone(&config), cache);

    let collected = orchestrator
        .collect_all(&CollectParams { user_id, conversation_id, as_of, trade_days_back })
        .await;

    info!(
        narrative = collected.narrative.len(),
        trade = collected.trade.len(),
        macro_ = collected.macro_.len(),
        "collection complete"
    );

    let merged = merger::merge(collected.narrative, collected.trade, collected.macro_, as_of);
    let sector_bundles = sector::organize(&merged);

    let augmentor = build_augmentor(&config);
    let executive_summary = augmentor.generate_exec_summary(&merged, fallback_exec_summary).await;

    let payload = RenderPayload {
        generated_at: as_of,
        executive_summary,
        sector_bundles,
        source_status: collected.source_status.clone(),
    };
    sink.render(&payload)?;

    Ok(collected.source_status)
}

/// Exposed for callers that want per-record augmented so-what statements
/// before rendering (the default `run` leaves `so_what_statement` as the
/// normalizer-produced template text in the sector bundles).
pub async fn augment_so_what(augmentor: &Augmentor, records: Vec<IntelligenceRecord>) -> Vec<IntelligenceRecord> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let so_what = augmentor.generate_so_what(&record, fallback_so_what).await;
        out.push(record.with_so_what(so_what));
    }
    out
}

pub fn current_time() -> DateTime<Utc> {
    Utc::now()
}
