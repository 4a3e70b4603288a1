//! Endorsement and policy-form flags.
//!
//! Flags are only ever extracted from explicit wording. A flag that is not
//! mentioned stays `None`; the parser never infers "not required" from
//! silence.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref RE_AI_NEGATIVE: Regex = Regex::new(
        r"(?i)\b(?:no|not|without)\s+(?:an?\s+)?additional(?:ly)?\s+insureds?\b|\badditional(?:ly)?\s+insureds?\s+(?:is\s+|are\s+)?not\s+required\b"
    )
    .unwrap();
    static ref RE_AI_POSITIVE: Regex =
        Regex::new(r"(?i:\badditional(?:ly)?\s+insureds?\b)|\bAI\s+(?i:required|endorsement)\b").unwrap();
    static ref RE_WOS_NEGATIVE: Regex = Regex::new(
        r"(?i)\b(?:no|without)\s+waiver\s+of\s+subrogation\b|\bwaiver\s+of\s+subrogation\s+(?:is\s+)?not\s+required\b"
    )
    .unwrap();
    static ref RE_WOS_POSITIVE: Regex =
        Regex::new(r"(?i:\bwaiver\s+of\s+subrogation\b)|\bWOS\b").unwrap();
    static ref RE_CLAIMS_MADE: Regex = Regex::new(r"(?i)\bclaims?[-\s]made\b").unwrap();
    static ref RE_OCCURRENCE_FORM: Regex =
        Regex::new(r"(?i)\boccurrence\s+(?:form|basis)\b|\boccurrence[-\s]based\b").unwrap();
}

/// Coverage trigger of the required policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyForm {
    /// Occurrence-based form
    Occurrence,
    /// Claims-made form
    ClaimsMade,
}

/// Flags stated for a row, a block, or the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowFlags {
    /// Required policy form, when stated
    pub policy_form: Option<PolicyForm>,
    /// Whether additional-insured status is required, when stated
    pub additional_insured: Option<bool>,
    /// Whether a waiver of subrogation is required, when stated
    pub waiver_of_subrogation: Option<bool>,
}

impl RowFlags {
    /// Extract flags from a piece of text.
    pub fn scan(text: &str) -> Self {
        let additional_insured = if RE_AI_NEGATIVE.is_match(text) {
            Some(false)
        } else if RE_AI_POSITIVE.is_match(text) {
            Some(true)
        } else {
            None
        };

        let waiver_of_subrogation = if RE_WOS_NEGATIVE.is_match(text) {
            Some(false)
        } else if RE_WOS_POSITIVE.is_match(text) {
            Some(true)
        } else {
            None
        };

        let policy_form = if RE_CLAIMS_MADE.is_match(text) {
            Some(PolicyForm::ClaimsMade)
        } else if RE_OCCURRENCE_FORM.is_match(text) {
            Some(PolicyForm::Occurrence)
        } else {
            None
        };

        Self {
            policy_form,
            additional_insured,
            waiver_of_subrogation,
        }
    }

    /// True when nothing was stated.
    pub fn is_empty(&self) -> bool {
        self.policy_form.is_none()
            && self.additional_insured.is_none()
            && self.waiver_of_subrogation.is_none()
    }

    /// Fill unset flags from a broader scope (block or document).
    pub fn inherit(&mut self, outer: &RowFlags) {
        self.policy_form = self.policy_form.or(outer.policy_form);
        self.additional_insured = self.additional_insured.or(outer.additional_insured);
        self.waiver_of_subrogation = self.waiver_of_subrogation.or(outer.waiver_of_subrogation);
    }
}
