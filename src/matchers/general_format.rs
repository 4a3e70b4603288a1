//! Loose coverage listing recognizer.
//!
//! Last in priority. Claims any line that pairs a coverage keyword (or a
//! limit label that implies one) with amounts. Rows apply to every trade.

use super::{split_segments, MatchResult, PatternMatcher, RawAmounts, RawRow};
use crate::coverage::{find_mentions, CoverageType};
use crate::flags::RowFlags;
use crate::normalizer::NormalizedText;
use crate::requirement::PatternKind;
use std::collections::HashMap;

/// Recognizer for loosely delimited coverage listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralFormatMatcher;

impl PatternMatcher for GeneralFormatMatcher {
    fn kind(&self) -> PatternKind {
        PatternKind::GeneralFormat
    }

    fn try_match(&self, text: &NormalizedText) -> Option<MatchResult> {
        let mut listing = Listing::default();

        for (number, line) in text.numbered_lines() {
            let split = split_segments(line);

            if !split.segments.is_empty() {
                for segment in split.segments {
                    listing.sticky = Some((segment.coverage, segment.coverage_label.clone()));
                    listing.push(number, segment.coverage, Some(segment.coverage_label), segment.amounts, segment.flags);
                }
                continue;
            }

            match split.orphans {
                RawAmounts::Positional(lexemes) if lexemes.is_empty() => {
                    if let Some(mention) = find_mentions(line).last() {
                        listing.sticky = Some((mention.coverage, line[mention.range.clone()].to_string()));
                    }
                },
                RawAmounts::Named(pairs) => {
                    let implied = pairs.iter().find_map(|(name, _)| name.implied_coverage());
                    let coverage = implied.or_else(|| listing.sticky.as_ref().map(|(c, _)| *c));
                    match coverage {
                        Some(coverage) => {
                            let label = listing
                                .sticky
                                .as_ref()
                                .filter(|(c, _)| *c == coverage)
                                .map(|(_, label)| label.clone());
                            listing.push(number, coverage, label, RawAmounts::Named(pairs), RowFlags::scan(line));
                        },
                        None => log::debug!("generalFormat: line {} has limits but no coverage", number),
                    }
                },
                RawAmounts::Positional(_) => {
                    log::trace!("generalFormat: line {} has amounts but no coverage keyword", number);
                },
            }
        }

        if listing.rows.is_empty() {
            log::debug!("generalFormat: no coverage lines");
            return None;
        }

        log::debug!("generalFormat: {} rows", listing.rows.len());
        Some(MatchResult {
            kind: PatternKind::GeneralFormat,
            rows: listing.rows,
        })
    }
}

#[derive(Debug, Default)]
struct Listing {
    rows: Vec<RawRow>,
    named: HashMap<CoverageType, usize>,
    sticky: Option<(CoverageType, String)>,
}

impl Listing {
    /// Add a row; labelled amounts for a coverage already seen are merged
    /// into that coverage's row.
    fn push(
        &mut self,
        line: usize,
        coverage: CoverageType,
        label: Option<String>,
        amounts: RawAmounts,
        flags: RowFlags,
    ) {
        if let RawAmounts::Named(pairs) = &amounts {
            if let Some(&idx) = self.named.get(&coverage) {
                let row = &mut self.rows[idx];
                if let RawAmounts::Named(existing) = &mut row.amounts {
                    existing.extend(pairs.iter().cloned());
                }
                row.flags.inherit(&flags);
                return;
            }
            self.named.insert(coverage, self.rows.len());
        }

        self.rows.push(RawRow {
            line,
            tier: None,
            trade: None,
            coverage_label: label,
            coverage_hint: Some(coverage),
            amounts,
            flags,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::LimitName;
    use crate::normalizer::TextNormalizer;

    fn run(raw: &str) -> Option<MatchResult> {
        GeneralFormatMatcher.try_match(&TextNormalizer::normalize(raw))
    }

    #[test]
    fn test_keyword_lines() {
        let result = run(
            "Commercial General Liability: $1,000,000 each occurrence / $2,000,000 general aggregate\n\
             Automobile Liability: $1,000,000 combined single limit\n\
             Umbrella: $5,000,000",
        )
        .unwrap();

        assert_eq!(result.rows.len(), 3);
        assert!(result.rows.iter().all(|row| row.trade.is_none()));
        assert_eq!(
            result.rows[0].amounts,
            RawAmounts::Named(vec![
                (LimitName::EachOccurrence, "$1,000,000".into()),
                (LimitName::GeneralAggregate, "$2,000,000".into())
            ])
        );
        assert_eq!(result.rows[2].coverage_hint, Some(CoverageType::Umbrella));
        assert_eq!(result.rows[2].amounts, RawAmounts::Positional(vec!["$5,000,000".into()]));
    }

    #[test]
    fn test_heading_then_labelled_limits() {
        let result = run(
            "Workers' Compensation and Employers' Liability\n\
             Each Accident $1,000,000 | Disease Each Employee $1,000,000 | Disease Policy Limit $1,000,000",
        )
        .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].coverage_hint, Some(CoverageType::WorkersCompensation));
        assert_eq!(result.rows[0].amounts.len(), 3);
        assert_eq!(result.rows[0].line, 2);
    }

    #[test]
    fn test_named_lines_for_same_coverage_merge() {
        let result = run(
            "General Liability each occurrence $1,000,000\n\
             General Liability aggregate $2,000,000",
        )
        .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].amounts.len(), 2);
    }

    #[test]
    fn test_prose_has_no_rows() {
        assert!(run("Please return the signed agreement by Friday.").is_none());
        assert!(run("The contract value is $2,500,000.").is_none());
    }
}
