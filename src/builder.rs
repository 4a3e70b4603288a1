//! Requirement builder.
//!
//! Turns the raw rows of whichever recognizer claimed the document into
//! [`TradeRequirement`]s:
//!
//! - coverage labels go through the synonym table; unknown labels become
//!   [`CoverageType::Other`] at low confidence
//! - every amount goes through the strict currency parser; a row with a
//!   negative or non-numeric amount is dropped, never guessed
//! - positional amounts are laid over the [`LimitSchedule`] layouts; a count
//!   that fits no layout is kept but marked low
//! - figures multiplied by a document scale caption are marked low
//! - rows sharing a trade and coverage are merged, higher confidence first;
//!   tied rows that disagree on limits are marked low

use crate::coverage::{classify, CoverageType};
use crate::currency::{has_unit_suffix, parse_amount, AmountScale, Dollars};
use crate::flags::RowFlags;
use crate::limits::LimitSchedule;
use crate::matchers::{MatchResult, RawAmounts, RawRow};
use crate::requirement::{Confidence, ParseIssue, PatternKind, TradeRequirement, ALL_TRADES};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Output of [`RequirementBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Deduplicated rows in document order
    pub requirements: Vec<TradeRequirement>,
    /// Conditions recorded while building
    pub diagnostics: Vec<ParseIssue>,
}

/// Builds requirement rows from matched raw rows.
#[derive(Debug, Clone)]
pub struct RequirementBuilder<'a> {
    schedule: &'a LimitSchedule,
    scale: AmountScale,
    document_flags: RowFlags,
}

impl<'a> RequirementBuilder<'a> {
    /// Create a builder over a limit schedule.
    pub fn new(schedule: &'a LimitSchedule) -> Self {
        Self {
            schedule,
            scale: AmountScale::Units,
            document_flags: RowFlags::default(),
        }
    }

    /// Scale applied to figures without a magnitude suffix.
    pub fn with_scale(mut self, scale: AmountScale) -> Self {
        self.scale = scale;
        self
    }

    /// Flags stated once for the whole document.
    pub fn with_document_flags(mut self, flags: RowFlags) -> Self {
        self.document_flags = flags;
        self
    }

    /// Build and deduplicate all rows of a match.
    pub fn build(&self, result: &MatchResult) -> BuildOutput {
        let mut diagnostics = Vec::new();
        let rows: Vec<TradeRequirement> = result
            .rows
            .iter()
            .filter_map(|row| self.build_row(result.kind, row, &mut diagnostics))
            .collect();

        let requirements = deduplicate(rows, &mut diagnostics);
        BuildOutput {
            requirements,
            diagnostics,
        }
    }

    /// Build one row; `None` when the row had to be dropped.
    pub fn build_row(
        &self,
        kind: PatternKind,
        row: &RawRow,
        diagnostics: &mut Vec<ParseIssue>,
    ) -> Option<TradeRequirement> {
        let trade_or_tier = row_label(row);

        let values = match self.parse_values(row, diagnostics) {
            Some(values) if !values.is_empty() => values,
            Some(_) => {
                log::debug!("line {}: row without amounts skipped", row.line);
                return None;
            },
            None => return None,
        };

        let (coverage_type, known_coverage) = resolve_coverage(row, diagnostics);
        let mut confidence = if known_coverage {
            Confidence::High
        } else {
            Confidence::Low
        };

        let mut limits = BTreeMap::new();
        let mut unassigned_amounts = Vec::new();

        match &row.amounts {
            RawAmounts::Positional(_) => {
                let assignment = self.schedule.assign(coverage_type, &values);
                if !assignment.exact {
                    confidence = Confidence::Low;
                    log::debug!(
                        "line {}: {} amounts fit no {} layout",
                        row.line,
                        values.len(),
                        coverage_type
                    );
                    diagnostics.push(ParseIssue::AmbiguousAmounts {
                        line: row.line,
                        trade_or_tier: trade_or_tier.clone(),
                        coverage_type,
                        amount_count: values.len(),
                    });
                }
                limits = assignment.limits;
                unassigned_amounts = assignment.unassigned;
            },
            RawAmounts::Named(pairs) => {
                for ((name, _), value) in pairs.iter().zip(&values) {
                    let slot = name.resolve_for(coverage_type);
                    let fits = coverage_type == CoverageType::Other || self.schedule.accepts(coverage_type, slot);
                    if fits && !limits.contains_key(&slot) {
                        limits.insert(slot, *value);
                    } else {
                        confidence = Confidence::Low;
                        unassigned_amounts.push(*value);
                        diagnostics.push(ParseIssue::DuplicateLimit {
                            line: row.line,
                            limit: slot,
                        });
                    }
                }
            },
        }

        for rule in self.schedule.ordering_violations(coverage_type, &limits) {
            confidence = Confidence::Low;
            log::debug!(
                "line {}: {:?} exceeds {:?}, figures may be out of order",
                row.line,
                rule.lesser,
                rule.greater
            );
            diagnostics.push(ParseIssue::OrderingViolation {
                line: row.line,
                coverage_type,
                lesser: rule.lesser,
                greater: rule.greater,
            });
        }

        if self.scale != AmountScale::Units && row.amounts.lexemes().iter().any(|l| !has_unit_suffix(l)) {
            confidence = Confidence::Low;
            log::debug!("line {}: figures scaled by {:?} caption", row.line, self.scale);
        }

        if kind == PatternKind::GeneralFormat && !(known_coverage && values.iter().all(|v| *v > 0)) {
            confidence = Confidence::Low;
        }

        let mut flags = row.flags;
        flags.inherit(&self.document_flags);

        Some(TradeRequirement {
            trade_or_tier,
            tier: row.tier,
            coverage_type,
            limits,
            unassigned_amounts,
            policy_type: flags.policy_form,
            additional_insured_required: flags.additional_insured,
            waiver_of_subrogation: flags.waiver_of_subrogation,
            source_pattern: kind,
            confidence,
            line: row.line,
        })
    }

    /// Parse every lexeme of a row; `None` if any is rejected.
    fn parse_values(&self, row: &RawRow, diagnostics: &mut Vec<ParseIssue>) -> Option<Vec<Dollars>> {
        let mut values = Vec::with_capacity(row.amounts.len());
        for lexeme in row.amounts.lexemes() {
            match parse_amount(lexeme, self.scale) {
                Ok(value) => values.push(value),
                Err(e) => {
                    log::warn!("line {}: dropping row, {}", row.line, e);
                    diagnostics.push(ParseIssue::RejectedAmount {
                        line: row.line,
                        token: lexeme.to_string(),
                        reason: e.to_string(),
                    });
                    return None;
                },
            }
        }
        Some(values)
    }
}

/// `tradeOrTier` label for a row.
fn row_label(row: &RawRow) -> String {
    match (&row.trade, row.tier) {
        (Some(trade), _) => trade.clone(),
        (None, Some(tier)) => format!("Tier {}", tier),
        (None, None) => ALL_TRADES.to_string(),
    }
}

/// Coverage type of a row and whether it came from a known keyword.
fn resolve_coverage(row: &RawRow, diagnostics: &mut Vec<ParseIssue>) -> (CoverageType, bool) {
    if let Some(coverage) = row.coverage_label.as_deref().and_then(classify).or(row.coverage_hint) {
        return (coverage, true);
    }

    let label = row.coverage_label.clone().unwrap_or_default();
    log::debug!("line {}: unknown coverage '{}'", row.line, label);
    diagnostics.push(ParseIssue::UnknownCoverage { line: row.line, label });
    (CoverageType::Other, false)
}

/// Merge rows that share `(tradeOrTier, coverageType)`.
///
/// The higher-confidence row wins; on a tie the earlier row is kept, and
/// marked low when the two rows state different limits. The surviving row
/// takes the position of the first occurrence.
pub fn deduplicate(rows: Vec<TradeRequirement>, diagnostics: &mut Vec<ParseIssue>) -> Vec<TradeRequirement> {
    let mut merged: IndexMap<(String, CoverageType), TradeRequirement> = IndexMap::with_capacity(rows.len());

    for row in rows {
        let key = (row.trade_or_tier.clone(), row.coverage_type);
        match merged.get_mut(&key) {
            Some(existing) => {
                let (kept_line, dropped_line) = if row.confidence > existing.confidence {
                    let dropped = existing.line;
                    *existing = row;
                    (existing.line, dropped)
                } else {
                    if row.confidence == existing.confidence && row.limits != existing.limits {
                        log::debug!(
                            "{} / {}: lines {} and {} disagree on limits",
                            key.0,
                            key.1,
                            existing.line,
                            row.line
                        );
                        existing.confidence = Confidence::Low;
                    }
                    (existing.line, row.line)
                };
                log::debug!(
                    "merged duplicate {} / {}: kept line {}, dropped line {}",
                    key.0,
                    key.1,
                    kept_line,
                    dropped_line
                );
                diagnostics.push(ParseIssue::DuplicateMerged {
                    trade_or_tier: key.0,
                    coverage_type: key.1,
                    kept_line,
                    dropped_line,
                });
            },
            None => {
                merged.insert(key, row);
            },
        }
    }

    merged.into_values().collect()
}
