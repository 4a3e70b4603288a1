//! Coverage-type vocabulary.
//!
//! Free-text coverage labels ("COMMERCIAL GENERAL LIABILITY", "GL", "Workers'
//! Comp") are mapped to [`CoverageType`] through one fixed synonym table.
//! Spelled-out phrases match case-insensitively; short abbreviations (GL, WC,
//! XS, ...) only match in upper case so that ordinary words are not mistaken
//! for coverage columns.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Category of insurance a requirement row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageType {
    /// Commercial general liability
    GeneralLiability,
    /// Business / commercial automobile liability
    AutomobileLiability,
    /// Workers' compensation and employers' liability
    WorkersCompensation,
    /// Umbrella or excess liability
    Umbrella,
    /// Professional liability / errors and omissions
    ProfessionalLiability,
    /// Contractors pollution liability
    PollutionLiability,
    /// Anything the synonym table does not know
    Other,
}

impl CoverageType {
    /// Every coverage type, in synonym-table order.
    pub const ALL: [CoverageType; 7] = [
        CoverageType::GeneralLiability,
        CoverageType::AutomobileLiability,
        CoverageType::WorkersCompensation,
        CoverageType::Umbrella,
        CoverageType::ProfessionalLiability,
        CoverageType::PollutionLiability,
        CoverageType::Other,
    ];

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            CoverageType::GeneralLiability => "General Liability",
            CoverageType::AutomobileLiability => "Automobile Liability",
            CoverageType::WorkersCompensation => "Workers Compensation",
            CoverageType::Umbrella => "Umbrella",
            CoverageType::ProfessionalLiability => "Professional Liability",
            CoverageType::PollutionLiability => "Pollution Liability",
            CoverageType::Other => "Other",
        }
    }
}

impl fmt::Display for CoverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Synonym table: one named group per coverage type.
///
/// Group order matters when two alternatives start at the same offset.
const SYNONYMS: &[(&str, CoverageType, &str)] = &[
    (
        "gl",
        CoverageType::GeneralLiability,
        r"\b(?i:commercial\s+general\s+liability|comprehensive\s+general\s+liability|general\s+liability)\b|\bC?GL\b",
    ),
    (
        "auto",
        CoverageType::AutomobileLiability,
        r"\b(?i:(?:commercial|business)\s+auto(?:mobile)?(?:\s+liability)?|auto(?:mobile)?(?:\s+liability)?)\b|\b(?:AL|BAL|CAL)\b",
    ),
    (
        "wc",
        CoverageType::WorkersCompensation,
        r"\b(?i:workers'?\s*comp(?:ensation)?(?:\s*(?:&|and)\s*employers'?\s+liability)?|worker'?s'?\s*comp(?:ensation)?|employers'?\s+liability)\b|\b(?:WC|EL)\b",
    ),
    (
        "umbrella",
        CoverageType::Umbrella,
        r"\b(?i:umbrella(?:\s+liability)?|excess(?:\s+liability)?)\b|\b(?:UMB|XS)\b",
    ),
    (
        "professional",
        CoverageType::ProfessionalLiability,
        r"\b(?i:professional\s+liability|errors\s*(?:&|and)\s*omissions(?:\s+liability)?)\b|\bE&O\b|\bPL\b",
    ),
    (
        "pollution",
        CoverageType::PollutionLiability,
        r"\b(?i:contractor'?s?'?\s+pollution(?:\s+liability)?|pollution(?:\s+legal)?(?:\s+liability)?)\b|\bCPL\b",
    ),
];

lazy_static! {
    static ref RE_COVERAGE: Regex = {
        let pattern = SYNONYMS
            .iter()
            .map(|(group, _, alternatives)| format!("(?P<{}>{})", group, alternatives))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&pattern).unwrap()
    };

    /// Text allowed between two mentions of the same coverage for them to
    /// be read as one label ("Umbrella / Excess Liability")
    static ref RE_JOINER: Regex = Regex::new(r"(?i)^[\s|/&,-]*(?:and|or)?[\s|/&,-]*$").unwrap();
}

/// A coverage keyword found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMention {
    /// Coverage the keyword maps to
    pub coverage: CoverageType,
    /// Byte range of the keyword (after merging adjacent synonyms)
    pub range: Range<usize>,
}

/// Find coverage keywords in a line, left to right.
///
/// Adjacent mentions of the same coverage separated only by a joiner are
/// merged into a single mention.
pub fn find_mentions(line: &str) -> Vec<CoverageMention> {
    let mut mentions: Vec<CoverageMention> = Vec::new();

    for caps in RE_COVERAGE.captures_iter(line) {
        let Some((coverage, m)) = SYNONYMS
            .iter()
            .find_map(|(group, coverage, _)| caps.name(group).map(|m| (*coverage, m)))
        else {
            continue;
        };

        if coverage == CoverageType::Umbrella && is_excess_phrase(line, m.range()) {
            continue;
        }

        if let Some(last) = mentions.last_mut() {
            if last.coverage == coverage && RE_JOINER.is_match(&line[last.range.end..m.start()]) {
                last.range.end = m.end();
                continue;
            }
        }

        mentions.push(CoverageMention {
            coverage,
            range: m.range(),
        });
    }

    mentions
}

/// "in excess of $X" states a threshold, not excess liability cover.
fn is_excess_phrase(line: &str, range: Range<usize>) -> bool {
    let word = &line[range.clone()];
    if !word.get(..6).is_some_and(|w| w.eq_ignore_ascii_case("excess")) {
        return false;
    }
    let before = line[..range.start].trim_end();
    let after = line[range.end..].trim_start();
    let preceded_by_in = before.len() >= 2
        && before.is_char_boundary(before.len() - 2)
        && before[before.len() - 2..].eq_ignore_ascii_case("in")
        && !before[..before.len() - 2]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
    let followed_by_of = after.get(..2).is_some_and(|w| w.eq_ignore_ascii_case("of"))
        && !after[2..].chars().next().is_some_and(char::is_alphanumeric);
    preceded_by_in || followed_by_of
}

/// Map a coverage label to its type.
///
/// Returns `None` when the label names no known coverage, or names more than
/// one distinct coverage.
///
/// # Examples
///
/// ```
/// use coi_program_parser::coverage::{classify, CoverageType};
///
/// assert_eq!(classify("COMMERCIAL GENERAL LIABILITY"), Some(CoverageType::GeneralLiability));
/// assert_eq!(classify("GL"), Some(CoverageType::GeneralLiability));
/// assert_eq!(classify("Builders Risk"), None);
/// ```
pub fn classify(label: &str) -> Option<CoverageType> {
    let mentions = find_mentions(label);
    let first = mentions.first()?.coverage;
    if mentions.iter().all(|m| m.coverage == first) {
        Some(first)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_excess_of_is_not_umbrella() {
        let mentions = find_mentions("General Liability with limits in excess of $1,000,000");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].coverage, CoverageType::GeneralLiability);
        assert!(find_mentions("amounts excess of the primary").is_empty());
        assert_eq!(classify("Excess Liability"), Some(CoverageType::Umbrella));
        assert_eq!(classify("Umbrella / Excess"), Some(CoverageType::Umbrella));
    }

    #[test]
    fn test_classify_spelled_out() {
        assert_eq!(classify("Commercial General Liability"), Some(CoverageType::GeneralLiability));
        assert_eq!(classify("Automobile Liability"), Some(CoverageType::AutomobileLiability));
        assert_eq!(classify("Workers' Compensation"), Some(CoverageType::WorkersCompensation));
        assert_eq!(classify("Worker's Comp"), Some(CoverageType::WorkersCompensation));
        assert_eq!(classify("Employers Liability"), Some(CoverageType::WorkersCompensation));
        assert_eq!(classify("Excess Liability"), Some(CoverageType::Umbrella));
        assert_eq!(classify("Errors & Omissions"), Some(CoverageType::ProfessionalLiability));
        assert_eq!(classify("Contractors Pollution Liability"), Some(CoverageType::PollutionLiability));
        assert_eq!(classify("Contractor's Pollution"), Some(CoverageType::PollutionLiability));
    }

    #[test]
    fn test_classify_abbreviations_are_case_sensitive() {
        assert_eq!(classify("CGL"), Some(CoverageType::GeneralLiability));
        assert_eq!(classify("WC"), Some(CoverageType::WorkersCompensation));
        assert_eq!(classify("E&O"), Some(CoverageType::ProfessionalLiability));
        assert_eq!(classify("gl"), None);
        assert_eq!(classify("al"), None);
    }

    #[test]
    fn test_classify_unknown_or_mixed() {
        assert_eq!(classify("Inland Marine"), None);
        assert_eq!(classify("GL and Auto"), None);
    }

    #[test]
    fn test_words_inside_trade_names_do_not_match() {
        assert!(find_mentions("Automatic Sprinklers").is_empty());
        assert!(find_mentions("General Contractor").is_empty());
        assert!(find_mentions("Professional Services").is_empty());
    }

    #[test]
    fn test_find_mentions_positions() {
        let line = "Tier 1 GL $1,000,000 | $2,000,000 Auto $1,000,000";
        let mentions = find_mentions(line);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].coverage, CoverageType::GeneralLiability);
        assert_eq!(&line[mentions[0].range.clone()], "GL");
        assert_eq!(mentions[1].coverage, CoverageType::AutomobileLiability);
    }

    #[test]
    fn test_adjacent_same_coverage_merged() {
        let line = "Umbrella | Excess Liability $5,000,000";
        let mentions = find_mentions(line);
        assert_eq!(mentions.len(), 1);
        assert_eq!(&line[mentions[0].range.clone()], "Umbrella | Excess Liability");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(CoverageType::WorkersCompensation.to_string(), "Workers Compensation");
    }
}
