//! The uniform Intelligence Record carried across the pipeline.
//!
//! Modeled as a common header plus a tagged `SourcePayload` variant rather
//! than an inheritance hierarchy, per the design notes: the merger and
//! sector organizer operate on the header and only dispatch on the tag
//! where source-specific logic (freshness, "so what" phrasing) requires it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Closed enumeration of client sectors a record can affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Technology,
    Finance,
    RealEstate,
    Entertainment,
    Energy,
    Healthcare,
    General,
}

impl Sector {
    pub const ALL: [Sector; 7] = [
        Sector::Technology,
        Sector::Finance,
        Sector::RealEstate,
        Sector::Entertainment,
        Sector::Energy,
        Sector::Healthcare,
        Sector::General,
    ];
}

/// Closed enumeration of the three upstream information services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Narrative,
    Trade,
    Macro,
}

/// Opaque provenance descriptor; shape is source-defined.
pub type Provenance = serde_json::Map<String, serde_json::Value>;

/// Source-specific payload. The merger and sector organizer never need to
/// look inside this; only the normalizers (to build it) and a few merger
/// phases (topic detection, freshness) dispatch on its tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourcePayload {
    Narrative,
    Trade {
        intervention_id: String,
        implementing_jurisdictions: Vec<String>,
        affected_jurisdictions: Vec<String>,
        date_announced: Option<DateTime<Utc>>,
        date_implemented: Option<DateTime<Utc>>,
    },
    Macro {
        series_id: String,
        observation_date: DateTime<Utc>,
        units: String,
        value: f64,
    },
}

/// The uniform intelligence carrier. Immutable after construction except
/// for the single `so_what_statement` substitution performed by the AI
/// augmentation step (see [`IntelligenceRecord::with_so_what`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceRecord {
    pub raw_content: String,
    pub processed_content: String,
    pub category: String,
    pub relevance_score: f64,
    pub confidence: f64,
    pub so_what_statement: String,
    pub affected_sectors: BTreeSet<Sector>,
    pub action_items: Vec<String>,
    pub source_type: SourceType,
    pub sources: Vec<Provenance>,
    pub payload: SourcePayload,
}

impl IntelligenceRecord {
    /// Clamp relevance/confidence into `[0, 1]` and guarantee at least one
    /// affected sector, tagging `general` when relevance clears the bar and
    /// nothing else matched. Called once by each normalizer right before
    /// the record is emitted.
    pub fn finish(mut self) -> Self {
        self.relevance_score = self.relevance_score.clamp(0.0, 1.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        // "at least one element" is the hard invariant; the common path to
        // an empty set is no keyword match, which `general` always covers.
        if self.affected_sectors.is_empty() {
            self.affected_sectors.insert(Sector::General);
        }
        self
    }

    /// Returns a new record with `so_what_statement` replaced. Used only by
    /// the AI augmentation step when a validated model output is available.
    #[must_use]
    pub fn with_so_what(mut self, so_what: String) -> Self {
        self.so_what_statement = so_what;
        self
    }

    /// Composite corpus of the record's free-text fields, used by the fact
    /// validator and by sanitization.
    pub fn text_fields_mut(&mut self) -> [&mut String; 3] {
        [
            &mut self.raw_content,
            &mut self.processed_content,
            &mut self.so_what_statement,
        ]
    }

    pub fn original_corpus(&self) -> String {
        format!(
            "{} {} {}",
            self.raw_content, self.processed_content, self.so_what_statement
        )
    }
}

/// Per-sector view produced after merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorBundle {
    pub sector: Sector,
    pub records: Vec<IntelligenceRecord>,
    pub summary: String,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
}

/// A structured finding within the executive summary's `key_findings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyFinding {
    pub subheader: String,
    pub content: String,
    pub bullets: Vec<String>,
}

/// A structured factor within the executive summary's `watch_factors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchFactor {
    pub indicator: String,
    pub what_to_watch: String,
    pub why_it_matters: String,
}

/// Three-section executive summary structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub bottom_line: Vec<String>,
    pub key_findings: Vec<KeyFinding>,
    pub watch_factors: Vec<WatchFactor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Success,
    Failed,
    Unconfigured,
}

/// Per-run status for all three sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatusReport {
    pub narrative: SourceStatus,
    pub trade: SourceStatus,
    pub macro_: SourceStatus,
}

impl SourceStatusReport {
    pub fn any_success(&self) -> bool {
        [self.narrative, self.trade, self.macro_]
            .iter()
            .any(|s| *s == SourceStatus::Success)
    }
}
