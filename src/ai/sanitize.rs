//! PII sanitizer: replaces configured client company names with a
//! sector-tagged token before anything leaves the process for the
//! external generation service.

use crate::record::{IntelligenceRecord, Sector};
use regex::Regex;

struct ClientEntry {
    sector: Sector,
    companies: &'static [&'static str],
}

/// Illustrative client roster, not a real client list. Grouped by sector so
/// the replacement token carries the sector tag the downstream prompt and
/// validator expect.
const CLIENT_ROSTER: &[ClientEntry] = &[
    ClientEntry { sector: Sector::Technology, companies: &["Meridian Systems", "Vantor Data", "Cobalt Foundry"] },
    ClientEntry { sector: Sector::Finance, companies: &["Northbridge Capital", "Aurelia Partners", "Castellan Equity"] },
    ClientEntry { sector: Sector::RealEstate, companies: &["Lattice Development", "Harborline Properties"] },
    ClientEntry { sector: Sector::Entertainment, companies: &["Redwing Media", "Solace Studios"] },
    ClientEntry { sector: Sector::Energy, companies: &["Ferrovant Energy", "Brightfield Power"] },
    ClientEntry { sector: Sector::Healthcare, companies: &["Pinegrove Health", "Candor Biotech"] },
];

struct CompanyPattern {
    regex: Regex,
    token: String,
}

pub struct Sanitizer {
    patterns: Vec<CompanyPattern>,
}

impl Sanitizer {
    pub fn default_mapping() -> Self {
        let mut patterns = Vec::new();
        for entry in CLIENT_ROSTER {
            let token = format!("[{}_CLIENT]", sector_tag(entry.sector));
            for company in entry.companies {
                let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(company))).expect("valid company pattern");
                patterns.push(CompanyPattern { regex, token: token.clone() });
            }
        }
        Self { patterns }
    }

    pub fn sanitize_text(&self, text: &str) -> String {
        let mut sanitized = text.to_string();
        for pattern in &self.patterns {
            if pattern.regex.is_match(&sanitized) {
                sanitized = pattern.regex.replace_all(&sanitized, pattern.token.as_str()).into_owned();
            }
        }
        sanitized
    }

    /// Sanitizes `raw_content`, `processed_content`, and `so_what_statement`
    /// only; structured fields are untouched.
    pub fn sanitize_record(&self, record: &IntelligenceRecord) -> IntelligenceRecord {
        let mut sanitized = record.clone();
        for field in sanitized.text_fields_mut() {
            *field = self.sanitize_text(field);
        }
        sanitized
    }
}

fn sector_tag(sector: Sector) -> &'static str {
    match sector {
        Sector::Technology => "TECHNOLOGY",
        Sector::Finance => "FINANCE",
        Sector::RealEstate => "REAL_ESTATE",
        Sector::Entertainment => "ENTERTAINMENT",
        Sector::Energy => "ENERGY",
        Sector::Healthcare => "HEALTHCARE",
        Sector::General => "GENERAL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_client_company_with_sector_token() {
        let sanitizer = Sanitizer::default_mapping();
        let sanitized = sanitizer.sanitize_text("Meridian Systems announced new hires with Vantor Data.");
        assert!(sanitized.contains("[TECHNOLOGY_CLIENT]"));
        assert!(!sanitized.contains("Meridian Systems"));
    }

    #[test]
    fn non_client_company_is_preserved() {
        let sanitizer = Sanitizer::default_mapping();
        let sanitized = sanitizer.sanitize_text("Meridian Systems announced with Acme new routers");
        assert_eq!(sanitized, "[TECHNOLOGY_CLIENT] announced with Acme new routers");
    }

    #[test]
    fn word_boundary_avoids_partial_match() {
        let sanitizer = Sanitizer::default_mapping();
        let sanitized = sanitizer.sanitize_text("MeridianSystemsLtd is unrelated.");
        assert_eq!(sanitized, "MeridianSystemsLtd is unrelated.");
    }
}
