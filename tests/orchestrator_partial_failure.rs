//! Exercises the orchestrator's partial-failure tolerance end to end against
//! wiremock stand-ins for all three upstream services: narrative and macro
//! succeed, trade fails permanently, and the run still produces a
//! non-empty, correctly-tagged source status report.

use aerolens::cache::NoopCache;
use aerolens::config::{Config, NarrativeCredentials, SourceCredentials};
use aerolens::orchestrator::{CollectParams, Orchestrator};
use aerolens::record::SourceStatus;
use chrono::Utc;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn partial_failure_run_reports_per_source_status_and_partial_records() {
    let narrative_server = MockServer::start().await;
    let trade_server = MockServer::start().await;
    let macro_server = MockServer::start().await;

    let sse_body = "data: {\"type\":\"text\",\"content\":\"Rates steady.\"}\n\ndata: {\"type\":\"done\"}\n\n";
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(sse_body, "text/event-stream"),
        )
        .mount(&narrative_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&trade_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/series/observations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "observations": [{"date": "2026-01-01", "value": "5.25", "units": "Percent"}],
        })))
        .mount(&macro_server)
        .await;

    let config = Arc::new(Config {
        narrative: Some(NarrativeCredentials {
            base: Some(SourceCredentials { base_url: narrative_server.uri(), token: "test-token".into() }),
            secondary_header: None,
        }),
        trade: Some(SourceCredentials { base_url: trade_server.uri(), token: "test-key".into() }),
        macro_: Some(SourceCredentials { base_url: macro_server.uri(), token: "test-key".into() }),
        ai_enabled: false,
        ai_model: "claude-opus-4".into(),
        ai_api_key: None,
        ai_base_url: String::new(),
        ai_max_tokens: 0,
        cache_enabled: false,
        cache_ttl_hours: 0,
        cache_dir: std::env::temp_dir(),
        output_dir: std::env::temp_dir(),
    });

    let orchestrator = Orchestrator::new(Arc::clone(&config), Arc::new(NoopCache));
    let result = orchestrator
        .collect_all(&CollectParams {
            user_id: "tester".into(),
            conversation_id: "conv-1".into(),
            as_of: Utc::now(),
            trade_days_back: 90,
        })
        .await;

    assert_eq!(result.source_status.narrative, SourceStatus::Success);
    assert_eq!(result.source_status.trade, SourceStatus::Failed);
    assert_eq!(result.source_status.macro_, SourceStatus::Success);
    assert!(result.source_status.any_success());
    assert!(result.trade.is_empty());
    assert!(!result.narrative.is_empty() || !result.macro_.is_empty());
}
