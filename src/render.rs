//! The data contract a document renderer consumes. Document styling itself
//! is out of scope; this is the boundary the orchestration core is
//! exercised against without pulling in a styling dependency.

use crate::record::{ExecutiveSummary, SectorBundle, SourceStatusReport};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RenderPayload {
    pub generated_at: DateTime<Utc>,
    pub executive_summary: ExecutiveSummary,
    pub sector_bundles: Vec<SectorBundle>,
    pub source_status: SourceStatusReport,
}

pub trait RenderSink {
    fn render(&self, payload: &RenderPayload) -> crate::error::Result<()>;
}

/// Writes a readable plaintext rendition to stdout; the reference document
/// styling this stands in for lives outside this crate.
pub struct StdoutRenderSink;

impl RenderSink for StdoutRenderSink {
    fn render(&self, payload: &RenderPayload) -> crate::error::Result<()> {
        println!("=== Aerolens Intelligence Brief ({}) ===", payload.generated_at.format("%Y-%m-%d %H:%M UTC"));
        println!();
        println!("-- Bottom Line --");
        for line in &payload.executive_summary.bottom_line {
            println!("  {line}");
        }
        println!();
        println!("-- Key Findings --");
        for finding in &payload.executive_summary.key_findings {
            println!("  [{}] {}", finding.subheader, finding.content);
            for bullet in &finding.bullets {
                println!("    - {bullet}");
            }
        }
        println!();
        println!("-- Watch Factors --");
        for factor in &payload.executive_summary.watch_factors {
            println!("  {}: {} ({})", factor.indicator, factor.what_to_watch, factor.why_it_matters);
        }
        println!();
        println!("-- Sector Breakdown --");
        for bundle in &payload.sector_bundles {
            if bundle.records.is_empty() {
                continue;
            }
            println!("  {:?}: {} records", bundle.sector, bundle.records.len());
            println!("    {}", bundle.summary);
        }
        println!();
        println!(
            "-- Source Status: narrative={:?} trade={:?} macro={:?} --",
            payload.source_status.narrative, payload.source_status.trade, payload.source_status.macro_
        );
        Ok(())
    }
}

/// Discards the payload. Used by tests and by callers that only want the
/// collection/merge pipeline to run without a rendering side effect.
pub struct NoopRenderSink;

impl RenderSink for NoopRenderSink {
    fn render(&self, _payload: &RenderPayload) -> crate::error::Result<()> {
        Ok(())
    }
}
