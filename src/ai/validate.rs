//! Fact validator: extracts factual claims from generated text via a fixed
//! regex pattern set and checks each against the original (unsanitized)
//! source corpus as a case-folded substring.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Claim {
    pub claim_type: &'static str,
    pub value: String,
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.claim_type, self.value)
    }
}

fn patterns() -> &'static [(&'static str, fn() -> &'static Regex)] {
    &[
        ("percentages", percentages_re),
        ("dollar_amounts", dollar_amounts_re),
        ("dates", dates_re),
        ("numbers", numbers_re),
        ("specific_countries", countries_re),
        ("specific_companies", companies_re),
    ]
}

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

lazy_regex!(percentages_re, r"\d+(\.\d+)?%");
lazy_regex!(dollar_amounts_re, r"(?i)\$\d+(\.\d+)?\s*(billion|million|trillion)?");
lazy_regex!(
    dates_re,
    r"(?x)
      \b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b
      |\b\d{1,2}/\d{1,2}/\d{2,4}\b
      |\bQ[1-4]\s+\d{4}\b"
);
lazy_regex!(numbers_re, r"\b\d{1,3}(,\d{3})*(\.\d+)?\b");
lazy_regex!(
    countries_re,
    r"(?i)\b(United States|China|Russia|EU|European Union|Japan|India|Saudi Arabia|Iran|Israel)\b"
);
lazy_regex!(companies_re, r"\b[A-Z][a-z]+\s+(Technologies|Corporation|Inc\.|Ltd\.|Capital|Group|Partners)\b");

pub struct FactValidator;

impl FactValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_claims(&self, text: &str) -> HashSet<Claim> {
        let mut claims = HashSet::new();
        for (claim_type, pattern_fn) in patterns() {
            let re = pattern_fn();
            for m in re.find_iter(text) {
                let value = m.as_str().trim().to_string();
                if !value.is_empty() {
                    claims.insert(Claim { claim_type, value });
                }
            }
        }
        claims
    }

    /// `strict`: every claim must be supported. Lenient: up to 20% may be
    /// unsupported. Generic numbers of 2 digits or fewer are never counted
    /// against either mode — they're too common to be meaningful claims.
    pub fn validate(&self, text: &str, corpus: &str, strict: bool) -> (bool, Vec<Claim>) {
        let claims = self.extract_claims(text);
        if claims.is_empty() {
            return (true, Vec::new());
        }

        let corpus_lower = corpus.to_ascii_lowercase();
        let mut unsupported = Vec::new();
        for claim in &claims {
            if claim.claim_type == "numbers" && claim.value.len() <= 2 {
                continue;
            }
            if !corpus_lower.contains(&claim.value.to_ascii_lowercase()) {
                unsupported.push(claim.clone());
            }
        }

        let valid = if strict {
            unsupported.is_empty()
        } else {
            unsupported.len() as f64 <= claims.len() as f64 * 0.2
        };
        (valid, unsupported)
    }

    /// First-person language, self-assessment, and references to
    /// unavailable sources are rejected; an explicit honesty carve-out
    /// keeps "Information not available" from tripping the missing-data
    /// pattern it also matches.
    pub fn check_prohibited_content(&self, text: &str) -> (bool, Vec<&'static str>) {
        const PROHIBITED: &[(&str, &str)] = &[
            ("(?i)I believe|I think|In my opinion|From my perspective", "first_person_language"),
            ("(?i)Based on my analysis of|My assessment shows", "personal_assessment"),
            ("(?i)According to sources not provided|External research indicates", "unavailable_source_reference"),
            ("(?i)It is unclear|Information not available|Data missing", "missing_data_acknowledgment"),
        ];

        let mut violations = Vec::new();
        for (pattern, violation) in PROHIBITED {
            let re = Regex::new(pattern).unwrap();
            if re.is_match(text) {
                if *violation == "missing_data_acknowledgment" && text.contains("Information not available") {
                    continue;
                }
                violations.push(*violation);
            }
        }
        (violations.is_empty(), violations)
    }
}

impl Default for FactValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_rejects_fabricated_percentage() {
        let validator = FactValidator::new();
        let (valid, unsupported) = validator.validate("Inflation at 7.2% will rise.", "Inflation at 3.5% this quarter.", true);
        assert!(!valid);
        assert!(unsupported.iter().any(|c| c.claim_type == "percentages" && c.value == "7.2%"));
    }

    #[test]
    fn strict_mode_accepts_supported_claim() {
        let validator = FactValidator::new();
        let (valid, _) = validator.validate("Inflation at 3.5% persists.", "Inflation at 3.5% this quarter.", true);
        assert!(valid);
    }

    #[test]
    fn lenient_mode_tolerates_up_to_twenty_percent_unsupported() {
        let validator = FactValidator::new();
        let text = "Growth at 1.0%. Growth at 2.0%. Growth at 3.0%. Growth at 4.0%. Growth at 5.0%.";
        let corpus = "Growth at 1.0% reported. Growth at 2.0% reported. Growth at 3.0% reported. Growth at 4.0% reported.";
        let (valid, _) = validator.validate(text, corpus, false);
        assert!(valid);
    }

    #[test]
    fn short_generic_numbers_are_never_penalized() {
        let validator = FactValidator::new();
        let (valid, unsupported) = validator.validate("There were 12 items.", "Unrelated corpus text.", true);
        assert!(valid);
        assert!(unsupported.is_empty());
    }

    #[test]
    fn information_not_available_carve_out_is_honored() {
        let validator = FactValidator::new();
        let (safe, violations) = validator.check_prohibited_content("Information not available for this period.");
        assert!(safe);
        assert!(violations.is_empty());
    }

    #[test]
    fn first_person_language_is_flagged() {
        let validator = FactValidator::new();
        let (safe, violations) = validator.check_prohibited_content("I believe this trend will continue.");
        assert!(!safe);
        assert!(violations.contains(&"first_person_language"));
    }
}
