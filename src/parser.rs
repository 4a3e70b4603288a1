//! Program parser.
//!
//! Runs the whole pipeline over one block of requirement text:
//!
//! 1. Bound the input size ([`ParserOptions::bound_input`])
//! 2. Normalize the text ([`TextNormalizer`])
//! 3. Offer it to each recognizer in priority order; the first one whose
//!    structural precondition holds claims the document
//! 4. Build requirement rows from the claimed rows ([`RequirementBuilder`])
//! 5. Apply the fallback and confidence policy ([`ConfidencePolicy`])
//!
//! Parsing is a pure function of the input text and the options. A parser
//! holds no mutable state, so one instance can be shared across threads.

use crate::builder::RequirementBuilder;
use crate::currency::AmountScale;
use crate::error::Result;
use crate::matchers::{default_matchers, document_flags, PatternMatcher};
use crate::normalizer::TextNormalizer;
use crate::parser_config::ParserOptions;
use crate::policy::ConfidencePolicy;
use crate::requirement::{ParseIssue, ParsedProgram};
use std::fmt;

/// Parser for insurance program requirement text.
pub struct ProgramParser {
    options: ParserOptions,
    matchers: Vec<Box<dyn PatternMatcher>>,
}

impl ProgramParser {
    /// Parser with default options and the built-in recognizers.
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    /// Parser with custom options and the built-in recognizers.
    pub fn with_options(options: ParserOptions) -> Self {
        Self::with_matchers(options, default_matchers())
    }

    /// Parser with custom options and recognizers, tried in the given order.
    pub fn with_matchers(options: ParserOptions, matchers: Vec<Box<dyn PatternMatcher>>) -> Self {
        Self { options, matchers }
    }

    /// Options in effect.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse requirement text.
    ///
    /// The only error is [`Error::OversizedInput`](crate::Error::OversizedInput)
    /// under [`OversizePolicy::Reject`](crate::parser_config::OversizePolicy::Reject).
    /// Everything else the parser runs into is recorded on
    /// [`ParsedProgram::diagnostics`].
    pub fn parse(&self, raw: &str) -> Result<ParsedProgram> {
        let (text, truncation) = self.options.bound_input(raw)?;
        let mut diagnostics: Vec<ParseIssue> = truncation.into_iter().collect();
        let policy = ConfidencePolicy::new(self.options.emit_placeholder);

        let normalized = TextNormalizer::normalize(text);
        if normalized.is_blank() {
            return Ok(policy.empty(text.to_string(), diagnostics));
        }

        let claimed = self.matchers.iter().find_map(|matcher| {
            let result = matcher.try_match(&normalized);
            if result.is_none() {
                log::debug!("{} declined", matcher.name());
            }
            result
        });

        let Some(result) = claimed else {
            return Ok(policy.unrecognized(text.to_string(), diagnostics));
        };
        log::info!("{} claimed document with {} raw rows", result.kind, result.rows.len());

        let scale = AmountScale::detect(&normalized.to_text());
        if scale != AmountScale::Units {
            log::debug!("document scale {:?}", scale);
            diagnostics.push(ParseIssue::ScaleApplied { scale });
        }

        let built = RequirementBuilder::new(&self.options.schedule)
            .with_scale(scale)
            .with_document_flags(document_flags(&normalized, &result.rows))
            .build(&result);
        diagnostics.extend(built.diagnostics);

        Ok(policy.finalize(result.kind, built.requirements, text.to_string(), scale, diagnostics))
    }
}

impl Default for ProgramParser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProgramParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.matchers.iter().map(|m| m.name()).collect();
        f.debug_struct("ProgramParser")
            .field("options", &self.options)
            .field("matchers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::CoverageType;
    use crate::limits::LimitName;
    use crate::matchers::create_matcher;
    use crate::requirement::{Confidence, PatternKind};

    #[test]
    fn test_single_trade_line() {
        let program = ProgramParser::new()
            .parse("Electrical GL $1,000,000 / $2,000,000")
            .unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::TierTradeTable);
        assert_eq!(program.requirements().len(), 1);

        let row = &program.requirements()[0];
        assert_eq!(row.trade_or_tier, "Electrical");
        assert_eq!(row.coverage_type, CoverageType::GeneralLiability);
        assert_eq!(row.limit(LimitName::EachOccurrence), Some(1_000_000));
        assert_eq!(row.limit(LimitName::GeneralAggregate), Some(2_000_000));
        assert_eq!(row.confidence, Confidence::High);
        assert!(!program.requires_manual_review());
    }

    #[test]
    fn test_prose_is_unmatched() {
        let program = ProgramParser::new()
            .parse("All subcontractors shall maintain adequate insurance satisfactory to the owner.")
            .unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::Unmatched);
        assert!(program.requirements().is_empty());
        assert!(program.requires_manual_review());
        assert!(program.diagnostics().contains(&ParseIssue::UnrecognizedFormat));
    }

    #[test]
    fn test_blank_input() {
        let program = ProgramParser::new().parse(" \n\t\n").unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::Unmatched);
        assert!(program.requires_manual_review());
        assert_eq!(program.diagnostics(), &[ParseIssue::EmptyInput]);
    }

    #[test]
    fn test_scale_statement() {
        let program = ProgramParser::new()
            .parse("(in thousands)\nElectrical GL $1,000 / $2,000")
            .unwrap();
        let row = program.requirement("Electrical", CoverageType::GeneralLiability).unwrap();
        assert_eq!(row.limit(LimitName::EachOccurrence), Some(1_000_000));
        assert_eq!(program.scale(), AmountScale::Thousands);
        assert!(program.diagnostics().contains(&ParseIssue::ScaleApplied {
            scale: AmountScale::Thousands
        }));
    }

    #[test]
    fn test_custom_matcher_order() {
        let matchers = vec![create_matcher(PatternKind::GeneralFormat).unwrap()];
        let parser = ProgramParser::with_matchers(ParserOptions::default(), matchers);
        let program = parser.parse("Umbrella: $5,000,000").unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::GeneralFormat);
        assert_eq!(program.requirements()[0].trade_or_tier, "All Trades");
    }

    #[test]
    fn test_debug_lists_matchers() {
        let debug = format!("{:?}", ProgramParser::new());
        assert!(debug.contains("tierTradeTable"));
        assert!(debug.contains("generalFormat"));
    }
}
