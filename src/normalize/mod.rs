//! Shared scoring and tagging logic used by all three per-source
//! normalizers. Each normalizer module (`narrative`, `trade`,
//! `macro_source`) owns its source-specific relevance formula and "so what"
//! phrasing; this module owns what's common: aviation-domain relevance,
//! sector tagging, and action-item generation.

pub mod macro_source;
pub mod narrative;
pub mod trade;

use crate::record::Sector;
use std::collections::BTreeSet;

struct KeywordBand {
    keywords: &'static [&'static str],
    per_match: f64,
    cap: f64,
}

const AVIATION_DIRECT: KeywordBand = KeywordBand {
    keywords: &[
        "aviation", "aircraft", "flight", "pilot", "airline", "airport", "faa", "easa", "icao",
        "air travel", "business jet", "fbo",
    ],
    per_match: 0.15,
    cap: 0.4,
};

const AVIATION_INDIRECT: KeywordBand = KeywordBand {
    keywords: &[
        "travel", "mobility", "transportation", "logistics", "customs", "visa", "border",
        "immigration", "security", "fuel prices",
    ],
    per_match: 0.10,
    cap: 0.2,
};

const BUSINESS_IMPACT: KeywordBand = KeywordBand {
    keywords: &[
        "corporate", "executive", "business travel", "global business", "international",
        "cross-border", "multinational", "supply chain",
    ],
    per_match: 0.08,
    cap: 0.2,
};

const RISK_INDICATORS: &[&str] = &[
    "risk", "threat", "instability", "conflict", "sanctions", "crisis", "disruption",
    "uncertainty", "volatility", "tension",
];

const OPPORTUNITY_INDICATORS: &[&str] = &[
    "growth", "expansion", "opportunity", "emerging", "recovery", "improvement", "investment",
    "development", "innovation",
];

fn band_score(text_lower: &str, band: &KeywordBand) -> f64 {
    let matches = band.keywords.iter().filter(|kw| text_lower.contains(*kw)).count();
    (matches as f64 * band.per_match).min(band.cap)
}

/// Keyword-weighted aviation/business-travel relevance shared by all three
/// sources; each normalizer adds its own source-specific adjustment on top.
pub fn base_relevance(text: &str) -> f64 {
    let lower = text.to_ascii_lowercase();
    let mut score = band_score(&lower, &AVIATION_DIRECT);
    score += band_score(&lower, &AVIATION_INDIRECT);
    score += band_score(&lower, &BUSINESS_IMPACT);
    let risk_opp = RISK_INDICATORS.iter().filter(|kw| lower.contains(**kw)).count()
        + OPPORTUNITY_INDICATORS.iter().filter(|kw| lower.contains(**kw)).count();
    score += (risk_opp as f64 * 0.05).min(0.2);
    score.min(1.0)
}

struct SectorTable {
    sector: Sector,
    keywords: &'static [&'static str],
    triggers: &'static [&'static str],
}

/// Per-sector keyword/trigger tables. Company names are illustrative
/// placeholders for a fictional client roster, not verbatim from any real
/// client list.
const SECTOR_TABLES: &[SectorTable] = &[
    SectorTable {
        sector: Sector::Technology,
        keywords: &[
            "technology", "silicon valley", "semiconductor", "ai", "cyber", "data", "software",
            "cloud", "digital", "innovation", "startup",
        ],
        triggers: &[
            "us-china", "export controls", "data sovereignty", "chips act",
            "technology transfer", "intellectual property", "sanctions",
        ],
    },
    SectorTable {
        sector: Sector::Finance,
        keywords: &[
            "financial", "investment", "private equity", "capital markets", "interest rates",
            "inflation", "banking", "credit", "currency", "m&a", "ipo", "valuation",
        ],
        triggers: &[
            "central bank", "federal reserve", "ecb", "monetary policy", "basel",
            "financial regulation", "capital controls", "sovereign debt",
        ],
    },
    SectorTable {
        sector: Sector::RealEstate,
        keywords: &[
            "real estate", "construction", "property", "development", "infrastructure", "urban",
            "commercial", "residential", "reit",
        ],
        triggers: &[
            "zoning", "housing policy", "infrastructure spending", "construction costs",
            "supply chain", "materials", "labor",
        ],
    },
    SectorTable {
        sector: Sector::Entertainment,
        keywords: &[
            "entertainment", "media", "sports", "content", "streaming", "production", "talent",
            "broadcasting", "gaming",
        ],
        triggers: &[
            "content regulation", "censorship", "cultural policy", "international co-production",
            "talent mobility", "visa",
        ],
    },
    SectorTable {
        sector: Sector::Energy,
        keywords: &[
            "energy", "oil", "gas", "renewable", "solar", "wind", "petroleum", "electricity",
            "power", "utilities", "carbon",
        ],
        triggers: &[
            "opec", "energy security", "pipeline", "sanctions", "climate", "paris agreement",
            "energy transition", "grid", "lng",
        ],
    },
    SectorTable {
        sector: Sector::Healthcare,
        keywords: &[
            "healthcare", "hospital", "pharma", "biotech", "medical", "clinical", "patient",
            "insurance", "fda",
        ],
        triggers: &["drug pricing", "health policy", "fda approval", "medicare", "medicaid"],
    },
];

/// Keyword match = +1, trigger match = +2, inclusion threshold >= 2.
pub fn affected_sectors(text: &str) -> BTreeSet<Sector> {
    let lower = text.to_ascii_lowercase();
    let mut sectors = BTreeSet::new();
    for table in SECTOR_TABLES {
        let mut points = 0u32;
        if table.keywords.iter().any(|kw| lower.contains(kw)) {
            points += 1;
        }
        if table.triggers.iter().any(|kw| lower.contains(kw)) {
            points += 2;
        }
        if points >= 2 {
            sectors.insert(table.sector);
        }
    }
    sectors
}

struct ActionPattern {
    trigger: &'static str,
    action: &'static str,
}

const ACTION_PATTERNS: &[ActionPattern] = &[
    ActionPattern { trigger: "sanctions", action: "Review exposure to sanctioned jurisdictions before scheduling travel." },
    ActionPattern { trigger: "export control", action: "Confirm export-control compliance for affected routes and cargo." },
    ActionPattern { trigger: "fuel", action: "Monitor fuel cost trends for charter pricing adjustments." },
    ActionPattern { trigger: "visa", action: "Verify visa requirements for affected jurisdictions before departure." },
    ActionPattern { trigger: "interest rate", action: "Reassess financing terms tied to current interest-rate moves." },
    ActionPattern { trigger: "inflation", action: "Factor inflation trends into client cost projections." },
    ActionPattern { trigger: "tariff", action: "Evaluate tariff impact on cross-border procurement." },
    ActionPattern { trigger: "border", action: "Confirm border and customs procedures remain unchanged for planned routes." },
    ActionPattern { trigger: "security", action: "Reassess security posture for affected destinations." },
    ActionPattern { trigger: "regulation", action: "Brief clients on new regulatory requirements affecting operations." },
];

/// Generates at most three action items by scanning the text for a fixed
/// set of trigger phrases, in table order, de-duplicated.
pub fn action_items(text: &str) -> Vec<String> {
    let lower = text.to_ascii_lowercase();
    let mut items = Vec::new();
    for pattern in ACTION_PATTERNS {
        if items.len() >= 3 {
            break;
        }
        if lower.contains(pattern.trigger) {
            items.push(pattern.action.to_string());
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_aviation_terms_dominate_relevance() {
        let score = base_relevance("The airline and airport authority issued new flight guidance for pilots.");
        assert!(score > 0.3);
    }

    #[test]
    fn irrelevant_text_scores_zero() {
        assert_eq!(base_relevance("A quiet afternoon with no notable developments."), 0.0);
    }

    #[test]
    fn sector_requires_two_points_not_one_keyword() {
        let sectors = affected_sectors("The software company announced a new product.");
        assert!(!sectors.contains(&Sector::Technology));
        let sectors = affected_sectors("The software company faced new export controls under the CHIPS Act.");
        assert!(sectors.contains(&Sector::Technology));
    }

    #[test]
    fn action_items_capped_at_three() {
        let text = "sanctions export control fuel visa interest rate inflation tariff";
        let items = action_items(text);
        assert_eq!(items.len(), 3);
    }
}
