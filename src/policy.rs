//! Fallback and confidence policy.
//!
//! Decides what a finished parse looks like when recognition went badly:
//! nothing claimed the document, the text was blank, or every row came out
//! low confidence. Coverage data is never invented for a document no
//! recognizer could claim.

use crate::coverage::CoverageType;
use crate::currency::AmountScale;
use crate::requirement::{Confidence, ParseIssue, ParsedProgram, PatternKind, TradeRequirement, ALL_TRADES};
use std::collections::BTreeMap;

/// Final step of a parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidencePolicy {
    emit_placeholder: bool,
}

impl ConfidencePolicy {
    /// Create a policy. With `emit_placeholder`, unrecognized documents get
    /// one empty row so reviewers have something to fill in.
    pub fn new(emit_placeholder: bool) -> Self {
        Self { emit_placeholder }
    }

    /// Empty `Other` row for "All Trades".
    pub fn placeholder() -> TradeRequirement {
        TradeRequirement {
            trade_or_tier: ALL_TRADES.to_string(),
            tier: None,
            coverage_type: CoverageType::Other,
            limits: BTreeMap::new(),
            unassigned_amounts: Vec::new(),
            policy_type: None,
            additional_insured_required: None,
            waiver_of_subrogation: None,
            source_pattern: PatternKind::Unmatched,
            confidence: Confidence::Low,
            line: 0,
        }
    }

    /// Result for blank input.
    pub fn empty(&self, raw_text: String, mut diagnostics: Vec<ParseIssue>) -> ParsedProgram {
        log::info!("empty requirement text");
        diagnostics.push(ParseIssue::EmptyInput);
        ParsedProgram::unmatched(raw_text, None, diagnostics)
    }

    /// Result for text no recognizer claimed.
    pub fn unrecognized(&self, raw_text: String, mut diagnostics: Vec<ParseIssue>) -> ParsedProgram {
        log::warn!("no pattern matched, document needs manual entry");
        diagnostics.push(ParseIssue::UnrecognizedFormat);
        let placeholder = self.emit_placeholder.then(Self::placeholder);
        ParsedProgram::unmatched(raw_text, placeholder, diagnostics)
    }

    /// Result for a claimed document.
    pub fn finalize(
        &self,
        kind: PatternKind,
        requirements: Vec<TradeRequirement>,
        raw_text: String,
        scale: AmountScale,
        mut diagnostics: Vec<ParseIssue>,
    ) -> ParsedProgram {
        if !requirements.is_empty() && requirements.iter().all(|r| r.confidence == Confidence::Low) {
            log::warn!("{}: all {} rows are low confidence", kind, requirements.len());
            diagnostics.push(ParseIssue::AllRowsLowConfidence);
        } else if requirements.is_empty() {
            log::warn!("{}: every row was dropped", kind);
        }

        let program = ParsedProgram::new(requirements, kind, raw_text, scale, diagnostics);
        log::info!(
            "{}: {} requirements, review {}",
            kind,
            program.requirements().len(),
            if program.requires_manual_review() {
                "required"
            } else {
                "not required"
            }
        );
        program
    }
}
