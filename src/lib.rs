// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::type_complexity)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # COI Program Parser
//!
//! Turns the free-text insurance requirements of a construction program
//! into structured, per-trade coverage requirements that certificates of
//! insurance can be checked against.
//!
//! ## Core Features
//!
//! - **Normalization**: unicode dashes, quotes and box-drawing bars folded,
//!   whitespace collapsed, separators between figures unified to `" | "`
//! - **Layout recognition**: 3 pluggable recognizers tried in priority order
//!   (tier/trade tables, prime/subcontractor lists, general listings)
//! - **Strict amounts**: `$1,000,000`, `$1M`, `$2.5 million`, document scale
//!   statements; negative or malformed figures drop the row instead of
//!   guessing
//! - **Configurable limit schedule**: positional layouts and ordering
//!   constraints per coverage type, loadable from JSON
//! - **Confidence and review**: every row carries a confidence; anything
//!   uncertain flags the whole program for human review
//! - **Review overlays**: corrections stored beside the parse, never in it
//! - **Compliance**: certificate coverages checked against the rows for a
//!   trade
//!
//! ## Quick Start
//!
//! ```
//! use coi_program_parser::{CoverageType, LimitName, ProgramParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = ProgramParser::new();
//! let program = parser.parse("Electrical GL $1,000,000 / $2,000,000")?;
//!
//! let row = program
//!     .requirement("Electrical", CoverageType::GeneralLiability)
//!     .expect("row");
//! assert_eq!(row.limit(LimitName::EachOccurrence), Some(1_000_000));
//! assert_eq!(row.limit(LimitName::GeneralAggregate), Some(2_000_000));
//! assert!(!program.requires_manual_review());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! raw text -> TextNormalizer -> matchers (first claim wins)
//!          -> RequirementBuilder -> ConfidencePolicy -> ParsedProgram
//! ```

// Error handling
pub mod error;

// Vocabulary
pub mod coverage;
pub mod currency;
pub mod flags;
pub mod limits;

// Parsing pipeline
pub mod builder;
pub mod matchers;
pub mod normalizer;
pub mod parser;
/// Parser configuration options
pub mod parser_config;
pub mod policy;
pub mod requirement;

// Post-parse workflows
pub mod compliance;
pub mod overlay;

// Regression corpus
pub mod validation;

// Re-exports
pub use coverage::CoverageType;
pub use currency::{AmountScale, Dollars};
pub use error::{AmountError, Error, Result};
pub use flags::PolicyForm;
pub use limits::{LimitName, LimitSchedule};
pub use parser::ProgramParser;
pub use parser_config::{OversizePolicy, ParserOptions};
pub use requirement::{Confidence, ParseIssue, ParsedProgram, PatternKind, TradeRequirement, ALL_TRADES};

/// Parse requirement text with default options.
///
/// Shorthand for `ProgramParser::new().parse(raw)`.
pub fn parse(raw: &str) -> Result<ParsedProgram> {
    ProgramParser::new().parse(raw)
}
