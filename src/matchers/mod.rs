//! Layout recognizers.
//!
//! Each recognizer is tuned to one tabular convention found in insurance
//! program documents. They run in a fixed priority order and the first one
//! whose structural precondition holds claims the whole document; results
//! are never combined across recognizers.
//!
//! # Available Matchers
//!
//! - [`TierTableMatcher`]: rows that start with a tier number or trade name
//!   followed by amounts
//! - [`PrimeSubcontractorMatcher`]: contractor-keyed blocks of `label: value`
//!   pairs, tolerant of line wraps
//! - [`GeneralFormatMatcher`]: loose coverage-keyword-plus-amount lines

mod general_format;
mod prime_subcontractor;
mod tier_table;

pub use general_format::GeneralFormatMatcher;
pub use prime_subcontractor::PrimeSubcontractorMatcher;
pub use tier_table::TierTableMatcher;

use crate::coverage::{find_mentions, CoverageType};
use crate::currency::{contains_money, find_amount_lexemes};
use crate::flags::RowFlags;
use crate::limits::{contains_limit_label, find_limit_labels, LimitMention, LimitName};
use crate::normalizer::NormalizedText;
use crate::requirement::PatternKind;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;

lazy_static! {
    /// Words that mark a line prefix as prose rather than a trade name
    static ref RE_NOT_A_TRADE: Regex = Regex::new(
        r"(?i)\b(?:shall|must|will|should|may|maintain|maintains|carry|carries|provide|provides|require|required|requires|include|includes|including|limits?|minimums?|coverages?|insurance|requirements?|polic(?:y|ies)|the|with|per|each|not|be|is|are|has|have|following|shown|below|above|follows)\b"
    )
    .unwrap();
}

/// Amounts captured for one row, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAmounts {
    /// Amounts in source order with no label attached
    Positional(Vec<String>),
    /// Amounts paired with the limit label written next to them
    Named(Vec<(LimitName, String)>),
}

impl RawAmounts {
    /// Number of amount lexemes.
    pub fn len(&self) -> usize {
        match self {
            RawAmounts::Positional(amounts) => amounts.len(),
            RawAmounts::Named(pairs) => pairs.len(),
        }
    }

    /// True when no amounts were captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw lexemes in order.
    pub fn lexemes(&self) -> Vec<&str> {
        match self {
            RawAmounts::Positional(amounts) => amounts.iter().map(String::as_str).collect(),
            RawAmounts::Named(pairs) => pairs.iter().map(|(_, lexeme)| lexeme.as_str()).collect(),
        }
    }
}

/// A matched row: tokenized trade/tier, coverage keyword and amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based source line
    pub line: usize,
    /// Tier number, for tiered programs
    pub tier: Option<u32>,
    /// Trade or contractor name
    pub trade: Option<String>,
    /// Coverage keyword as written, when the row carried one
    pub coverage_label: Option<String>,
    /// Coverage inferred from context (table header, limit label, block)
    pub coverage_hint: Option<CoverageType>,
    /// Amount lexemes
    pub amounts: RawAmounts,
    /// Endorsement flags stated for the row
    pub flags: RowFlags,
}

/// Rows produced by the recognizer that claimed a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Recognizer that produced the rows
    pub kind: PatternKind,
    /// Rows in document order
    pub rows: Vec<RawRow>,
}

/// A recognizer for one document layout.
///
/// Implementations return `None` when their structural precondition does
/// not hold, so the next recognizer in priority order gets a chance.
pub trait PatternMatcher: Send + Sync {
    /// Which layout this recognizer handles.
    fn kind(&self) -> PatternKind;

    /// Try to claim the document.
    fn try_match(&self, text: &NormalizedText) -> Option<MatchResult>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// All recognizers in priority order.
pub fn default_matchers() -> Vec<Box<dyn PatternMatcher>> {
    vec![
        Box::new(TierTableMatcher),
        Box::new(PrimeSubcontractorMatcher),
        Box::new(GeneralFormatMatcher),
    ]
}

/// Recognizer for a specific layout.
pub fn create_matcher(kind: PatternKind) -> Option<Box<dyn PatternMatcher>> {
    match kind {
        PatternKind::TierTradeTable => Some(Box::new(TierTableMatcher)),
        PatternKind::PrimeSubcontractor => Some(Box::new(PrimeSubcontractorMatcher)),
        PatternKind::GeneralFormat => Some(Box::new(GeneralFormatMatcher)),
        PatternKind::Unmatched => None,
    }
}

/// Flags stated in lines that produced no row.
///
/// Only endorsement flags are carried document-wide. Policy form is stated
/// per coverage and is never spread to other rows.
pub fn document_flags(text: &NormalizedText, rows: &[RawRow]) -> RowFlags {
    let claimed: BTreeSet<usize> = rows.iter().map(|row| row.line).collect();
    let mut flags = RowFlags::default();

    for (number, line) in text.numbered_lines() {
        if claimed.contains(&number) || !find_amount_lexemes(line).is_empty() {
            continue;
        }
        flags.inherit(&RowFlags::scan(line));
    }

    flags.policy_form = None;
    flags
}

/// Coverage keyword with the amounts that follow it on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    pub coverage_label: String,
    pub coverage: CoverageType,
    pub amounts: RawAmounts,
    pub flags: RowFlags,
}

/// A line split into its leading text and coverage segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct LineSegments {
    /// Text before the first coverage segment or amount, trimmed
    pub prefix: String,
    /// Coverage segments that carry at least one amount
    pub segments: Vec<Segment>,
    /// Amounts not attached to any coverage keyword
    pub orphans: RawAmounts,
}

impl Default for RawAmounts {
    fn default() -> Self {
        RawAmounts::Positional(Vec::new())
    }
}

/// Split a normalized line into `prefix`, coverage segments and orphans.
///
/// A segment runs from a coverage keyword to the next keyword. Keywords with
/// no amounts of their own are skipped; when the only keyword comes after
/// the amounts ("$1M | $2M General Liability"), the amounts attach to it.
pub(crate) fn split_segments(line: &str) -> LineSegments {
    let mentions = find_mentions(line);
    let lexemes = find_amount_lexemes(line);
    let labels = find_limit_labels(line);

    let in_range = |range: &Range<usize>, start: usize| start >= range.start && start < range.end;

    let mut segments = Vec::new();
    let mut first_claimed: Option<usize> = None;

    for (idx, mention) in mentions.iter().enumerate() {
        let end = mentions.get(idx + 1).map(|m| m.range.start).unwrap_or(line.len());
        let region = mention.range.end..end;

        let seg_lexemes: Vec<_> = lexemes.iter().filter(|(r, _)| in_range(&region, r.start)).cloned().collect();
        if seg_lexemes.is_empty() {
            continue;
        }
        let seg_labels: Vec<_> = labels.iter().filter(|l| in_range(&region, l.range.start)).collect();

        if first_claimed.is_none() {
            first_claimed = Some(idx);
        }
        segments.push(Segment {
            coverage_label: line[mention.range.clone()].to_string(),
            coverage: mention.coverage,
            amounts: pair_amounts(&seg_labels, &seg_lexemes),
            flags: RowFlags::scan(&line[mention.range.start..end]),
        });
    }

    let first_amount = lexemes.first().map(|(r, _)| r.start).unwrap_or(line.len());
    let leading: Vec<_> = lexemes
        .iter()
        .filter(|(r, _)| mentions.first().map_or(true, |m| r.start < m.range.start))
        .cloned()
        .collect();

    // "$1M | $2M General Liability"
    if segments.is_empty() && mentions.len() == 1 && !leading.is_empty() {
        let mention = &mentions[0];
        let seg_labels: Vec<_> = labels.iter().filter(|l| l.range.start < mention.range.start).collect();
        return LineSegments {
            prefix: trim_label(&line[..first_amount]).to_string(),
            segments: vec![Segment {
                coverage_label: line[mention.range.clone()].to_string(),
                coverage: mention.coverage,
                amounts: pair_amounts(&seg_labels, &leading),
                flags: RowFlags::scan(line),
            }],
            orphans: RawAmounts::default(),
        };
    }

    // The prefix extends over keywords that carry no amounts ("Pollution
    // Remediation GL ..."), unless such a keyword names the same coverage as
    // the first segment ("Workers Comp Statutory | Employers Liability ...").
    let mut prefix_end = first_claimed
        .map(|idx| mentions[idx].range.start)
        .unwrap_or_else(|| mentions.first().map_or(line.len(), |m| m.range.start))
        .min(first_amount);
    if let (Some(idx), Some(first)) = (first_claimed, segments.first()) {
        if let Some(same) = mentions[..idx].iter().find(|m| m.coverage == first.coverage) {
            prefix_end = prefix_end.min(same.range.start);
        }
    }

    let orphans = if segments.is_empty() {
        pair_amounts(&labels.iter().collect::<Vec<_>>(), &lexemes)
    } else {
        RawAmounts::default()
    };

    LineSegments {
        prefix: trim_label(&line[..prefix_end]).to_string(),
        segments,
        orphans,
    }
}

/// Pair amounts with limit labels when every amount has exactly one label
/// written consistently before it or after it.
pub(crate) fn pair_amounts(labels: &[&LimitMention], lexemes: &[(Range<usize>, &str)]) -> RawAmounts {
    if !labels.is_empty() && labels.len() == lexemes.len() {
        let leading = labels
            .iter()
            .zip(lexemes)
            .all(|(label, (range, _))| label.range.end <= range.start);
        let trailing = labels
            .iter()
            .zip(lexemes)
            .all(|(label, (range, _))| range.end <= label.range.start);

        if leading || trailing {
            return RawAmounts::Named(
                labels
                    .iter()
                    .zip(lexemes)
                    .map(|(label, (_, lexeme))| (label.name, lexeme.to_string()))
                    .collect(),
            );
        }
    }

    RawAmounts::Positional(lexemes.iter().map(|(_, lexeme)| lexeme.to_string()).collect())
}

/// Strip separators and punctuation from both ends of a label.
pub(crate) fn trim_label(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '|' | '-' | '.' | ',' | ';' | '='))
}

/// Whether text reads like a trade or contractor name rather than prose.
pub(crate) fn is_plausible_trade(text: &str) -> bool {
    let text = trim_label(text);
    !text.is_empty()
        && text.len() <= 60
        && text.split_whitespace().count() <= 6
        && text.chars().any(char::is_alphabetic)
        && !RE_NOT_A_TRADE.is_match(text)
        && !contains_limit_label(text)
        && !contains_money(text)
}
