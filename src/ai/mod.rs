//! AI augmentation: sanitize → prompt → call with retry/timeout → parse →
//! validate → template fallback. Disabled or unconfigured runs always take
//! the fallback path; the augmented path never fails the overall run.

pub mod generator;
pub mod sanitize;
pub mod usage;
pub mod validate;

use crate::record::{ExecutiveSummary, IntelligenceRecord};
use generator::{AIClient, GenerationError};
use sanitize::Sanitizer;
use std::sync::Arc;
use tracing::warn;
use validate::FactValidator;

const MIN_SO_WHAT_LENGTH: usize = 20;

pub struct Augmentor {
    client: Option<Arc<AIClient>>,
    sanitizer: Sanitizer,
    validator: FactValidator,
}

impl Augmentor {
    pub fn new(client: Option<Arc<AIClient>>) -> Self {
        Self {
            client,
            sanitizer: Sanitizer::default_mapping(),
            validator: FactValidator::new(),
        }
    }

    pub async fn generate_exec_summary(
        &self,
        records: &[IntelligenceRecord],
        fallback: impl FnOnce(&[IntelligenceRecord]) -> ExecutiveSummary,
    ) -> ExecutiveSummary {
        let Some(client) = &self.client else {
            return fallback(records);
        };

        let sanitized: Vec<IntelligenceRecord> = records.iter().map(|r| self.sanitizer.sanitize_record(r)).collect();

        let generated = match client.generate_exec_summary(&sanitized).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "exec summary generation failed, using fallback");
                return fallback(records);
            }
        };

        let summary = generator::parse_exec_summary(&generated);
        let corpus = original_corpus(records);

        if !self.validates(&summary, &corpus, true) {
            warn!("exec summary failed strict grounding validation, using fallback");
            return fallback(records);
        }

        summary
    }

    pub async fn generate_so_what(
        &self,
        record: &IntelligenceRecord,
        fallback: impl FnOnce(&IntelligenceRecord) -> String,
    ) -> String {
        let Some(client) = &self.client else {
            return fallback(record);
        };

        let sanitized = self.sanitizer.sanitize_record(record);
        let generated = match client.generate_so_what(&sanitized).await {
            Ok(text) => text,
            Err(GenerationError::Timeout) | Err(GenerationError::Transport(_)) => return fallback(record),
            Err(e) => {
                warn!(error = %e, "so-what generation failed, using fallback");
                return fallback(record);
            }
        };

        if generated.trim().len() < MIN_SO_WHAT_LENGTH {
            return fallback(record);
        }

        let corpus = record.original_corpus();
        let (valid, _) = self.validator.validate(&generated, &corpus, false);
        let (safe, _) = self.validator.check_prohibited_content(&generated);
        if !valid || !safe {
            return fallback(record);
        }

        generated
    }

    fn validates(&self, summary: &ExecutiveSummary, corpus: &str, strict: bool) -> bool {
        let mut all_text = summary.bottom_line.join(" ");
        for finding in &summary.key_findings {
            all_text.push(' ');
            all_text.push_str(&finding.content);
            for bullet in &finding.bullets {
                all_text.push(' ');
                all_text.push_str(bullet);
            }
        }
        for factor in &summary.watch_factors {
            all_text.push(' ');
            all_text.push_str(&factor.what_to_watch);
            all_text.push(' ');
            all_text.push_str(&factor.why_it_matters);
        }

        let (valid, _) = self.validator.validate(&all_text, corpus, strict);
        let (safe, _) = self.validator.check_prohibited_content(&all_text);
        valid && safe
    }
}

fn original_corpus(records: &[IntelligenceRecord]) -> String {
    records.iter().map(|r| r.original_corpus()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{KeyFinding, Sector, SourcePayload, SourceType};
    use std::collections::BTreeSet;

    fn record(content: &str) -> IntelligenceRecord {
        IntelligenceRecord {
            raw_content: content.to_string(),
            processed_content: content.to_string(),
            category: "general".to_string(),
            relevance_score: 0.8,
            confidence: 0.9,
            so_what_statement: content.to_string(),
            affected_sectors: BTreeSet::from([Sector::General]),
            action_items: Vec::new(),
            source_type: SourceType::Narrative,
            sources: Vec::new(),
            payload: SourcePayload::Narrative,
        }
    }

    #[tokio::test]
    async fn disabled_augmentor_always_uses_fallback() {
        let augmentor = Augmentor::new(None);
        let records = vec![record("Inflation at 3.5% this quarter.")];
        let summary = augmentor
            .generate_exec_summary(&records, |_| ExecutiveSummary {
                bottom_line: vec!["Fallback line.".to_string()],
                key_findings: vec![KeyFinding::default()],
                watch_factors: Vec::new(),
            })
            .await;
        assert_eq!(summary.bottom_line, vec!["Fallback line.".to_string()]);
    }

    #[tokio::test]
    async fn disabled_augmentor_so_what_uses_fallback() {
        let augmentor = Augmentor::new(None);
        let r = record("Inflation at 3.5% this quarter.");
        let result = augmentor.generate_so_what(&r, |r| format!("fallback: {}", r.raw_content)).await;
        assert!(result.starts_with("fallback:"));
    }
}
