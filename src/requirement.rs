//! Parse output: requirement rows and the document-level result.

use crate::coverage::CoverageType;
use crate::currency::{AmountScale, Dollars};
use crate::error::Result;
use crate::flags::PolicyForm;
use crate::limits::LimitName;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Label used for rows that apply to every trade.
pub const ALL_TRADES: &str = "All Trades";

/// Which recognizer produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    /// Tier/trade matrix
    TierTradeTable,
    /// Contractor-keyed label/value list
    PrimeSubcontractor,
    /// Loose single-line listing
    GeneralFormat,
    /// No recognizer claimed the document
    #[serde(rename = "none")]
    Unmatched,
}

impl PatternKind {
    /// Stable identifier used in logs and output.
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::TierTradeTable => "tierTradeTable",
            PatternKind::PrimeSubcontractor => "primeSubcontractor",
            PatternKind::GeneralFormat => "generalFormat",
            PatternKind::Unmatched => "none",
        }
    }

    /// False only for [`PatternKind::Unmatched`].
    pub fn is_matched(self) -> bool {
        self != PatternKind::Unmatched
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether amount-to-limit assignment was asserted or inferred.
///
/// Ordered so that `High > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confidence {
    /// Positional guess, unknown coverage, or otherwise unverified
    Low,
    /// Structurally asserted
    High,
}

/// One parsed requirement row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequirement {
    /// Trade name, `"Tier N"`, or [`ALL_TRADES`]
    pub trade_or_tier: String,
    /// Tier number when the row came from a tiered program
    pub tier: Option<u32>,
    /// Coverage category
    pub coverage_type: CoverageType,
    /// Named limits in whole dollars
    pub limits: BTreeMap<LimitName, Dollars>,
    /// Amounts that could not be tied to a named limit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unassigned_amounts: Vec<Dollars>,
    /// Policy form, when stated
    pub policy_type: Option<PolicyForm>,
    /// Additional-insured requirement, when stated
    pub additional_insured_required: Option<bool>,
    /// Waiver-of-subrogation requirement, when stated
    pub waiver_of_subrogation: Option<bool>,
    /// Recognizer that produced the row
    pub source_pattern: PatternKind,
    /// Row confidence
    pub confidence: Confidence,
    /// 1-based line number in the source text
    pub line: usize,
}

impl TradeRequirement {
    /// Deduplication key.
    pub fn key(&self) -> (&str, CoverageType) {
        (&self.trade_or_tier, self.coverage_type)
    }

    /// Amount of a named limit.
    pub fn limit(&self, name: LimitName) -> Option<Dollars> {
        self.limits.get(&name).copied()
    }

    /// True when the row applies to every trade.
    pub fn applies_to_all_trades(&self) -> bool {
        self.trade_or_tier == ALL_TRADES
    }
}

/// A condition recorded while parsing.
///
/// None of these abort a parse; they explain why rows are low confidence,
/// why rows were dropped, or why the document needs review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ParseIssue {
    /// Input was blank
    EmptyInput,
    /// No recognizer claimed the document
    UnrecognizedFormat,
    /// Input exceeded the size bound and was cut at a line boundary
    Truncated {
        original_bytes: usize,
        kept_bytes: usize,
    },
    /// Amount count fits no known layout for the coverage
    AmbiguousAmounts {
        line: usize,
        trade_or_tier: String,
        coverage_type: CoverageType,
        amount_count: usize,
    },
    /// Coverage label not in the synonym table
    UnknownCoverage { line: usize, label: String },
    /// Negative or non-numeric amount; the row was dropped
    RejectedAmount {
        line: usize,
        token: String,
        reason: String,
    },
    /// Figures break an ordering rule and were probably read out of order
    OrderingViolation {
        line: usize,
        coverage_type: CoverageType,
        lesser: LimitName,
        greater: LimitName,
    },
    /// A named limit appeared twice or does not belong to the coverage
    DuplicateLimit { line: usize, limit: LimitName },
    /// Two rows shared a trade and coverage; one was discarded
    DuplicateMerged {
        trade_or_tier: String,
        coverage_type: CoverageType,
        kept_line: usize,
        dropped_line: usize,
    },
    /// A recognizer fired but produced only low-confidence rows
    AllRowsLowConfidence,
    /// A document-wide scale statement multiplied unit-less figures
    ScaleApplied { scale: AmountScale },
}

/// Document-level parse result.
///
/// Immutable once built. Human corrections go into a
/// [`ReviewOverlay`](crate::overlay::ReviewOverlay), never into this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ProgramRecord")]
pub struct ParsedProgram {
    requirements: Vec<TradeRequirement>,
    matched_pattern: PatternKind,
    raw_text: String,
    requires_manual_review: bool,
    scale: AmountScale,
    diagnostics: Vec<ParseIssue>,
}

/// Stored form of a [`ParsedProgram`]; the review flag is recomputed on load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgramRecord {
    requirements: Vec<TradeRequirement>,
    matched_pattern: PatternKind,
    raw_text: String,
    scale: AmountScale,
    diagnostics: Vec<ParseIssue>,
}

impl From<ProgramRecord> for ParsedProgram {
    fn from(record: ProgramRecord) -> Self {
        ParsedProgram::new(
            record.requirements,
            record.matched_pattern,
            record.raw_text,
            record.scale,
            record.diagnostics,
        )
    }
}

impl ParsedProgram {
    pub(crate) fn new(
        requirements: Vec<TradeRequirement>,
        matched_pattern: PatternKind,
        raw_text: String,
        scale: AmountScale,
        diagnostics: Vec<ParseIssue>,
    ) -> Self {
        let requires_manual_review = !matched_pattern.is_matched()
            || requirements.is_empty()
            || requirements.iter().any(|r| r.confidence == Confidence::Low);

        Self {
            requirements,
            matched_pattern,
            raw_text,
            requires_manual_review,
            scale,
            diagnostics,
        }
    }

    /// Result for text nothing could be extracted from.
    pub(crate) fn unmatched(
        raw_text: String,
        placeholder: Option<TradeRequirement>,
        diagnostics: Vec<ParseIssue>,
    ) -> Self {
        Self::new(
            placeholder.into_iter().collect(),
            PatternKind::Unmatched,
            raw_text,
            AmountScale::Units,
            diagnostics,
        )
    }

    /// Requirement rows in document order.
    pub fn requirements(&self) -> &[TradeRequirement] {
        &self.requirements
    }

    /// Recognizer that claimed the document.
    pub fn matched_pattern(&self) -> PatternKind {
        self.matched_pattern
    }

    /// Text the result was parsed from (after any truncation).
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Whether a human must verify the result before it is trusted.
    pub fn requires_manual_review(&self) -> bool {
        self.requires_manual_review
    }

    /// Scale applied to unit-less figures.
    pub fn scale(&self) -> AmountScale {
        self.scale
    }

    /// Conditions recorded while parsing.
    pub fn diagnostics(&self) -> &[ParseIssue] {
        &self.diagnostics
    }

    /// Row for a trade and coverage.
    pub fn requirement(&self, trade_or_tier: &str, coverage: CoverageType) -> Option<&TradeRequirement> {
        self.requirements
            .iter()
            .find(|r| r.trade_or_tier == trade_or_tier && r.coverage_type == coverage)
    }

    /// Rows a reviewer should look at first.
    pub fn low_confidence_rows(&self) -> impl Iterator<Item = &TradeRequirement> {
        self.requirements
            .iter()
            .filter(|r| r.confidence == Confidence::Low)
    }

    /// SHA-256 hex digest of the retained raw text.
    pub fn fingerprint(&self) -> String {
        format!("{:x}", Sha256::digest(self.raw_text.as_bytes()))
    }

    /// Compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
