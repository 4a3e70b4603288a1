//! Validation harness.
//!
//! A corpus of realistic program texts, one per project archetype, each
//! with the result the parser is expected to produce. Used as a regression
//! suite for recognizer changes and exposed through the CLI's `--validate`
//! flag.
//!
//! # Example
//!
//! ```
//! use coi_program_parser::validation::run_validation;
//! use coi_program_parser::ProgramParser;
//!
//! let report = run_validation(&ProgramParser::new());
//! assert_eq!(report.failed, 0, "{}", report);
//! ```

pub mod samples;

use crate::coverage::CoverageType;
use crate::currency::Dollars;
use crate::limits::LimitName;
use crate::parser::ProgramParser;
use crate::requirement::{ParsedProgram, PatternKind};
use serde::Serialize;
use std::fmt;
use std::time::Instant;

/// One sample program text with its expected parse.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub name: &'static str,
    pub text: &'static str,
    pub expect: Expectation,
}

/// Expected parse of a sample.
#[derive(Debug, Clone, Copy)]
pub struct Expectation {
    pub pattern: PatternKind,
    /// Number of requirement rows
    pub rows: usize,
    pub requires_review: bool,
    /// Additional insured flag expected on every row
    pub additional_insured: Option<bool>,
    /// Specific limits that must be present
    pub limits: &'static [LimitCheck],
}

/// A limit expected on a specific row.
#[derive(Debug, Clone, Copy)]
pub struct LimitCheck {
    pub trade_or_tier: &'static str,
    pub coverage: CoverageType,
    pub limit: LimitName,
    pub amount: Dollars,
}

/// Outcome for one sample.
#[derive(Debug, Clone, Serialize)]
pub struct SampleResult {
    pub name: String,
    pub passed: bool,
    pub failures: Vec<String>,
    pub parse_time_us: u128,
}

/// Outcome for a whole corpus.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub results: Vec<SampleResult>,
}

impl ValidationReport {
    /// True when every sample passed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            let status = if result.passed { "PASS" } else { "FAIL" };
            writeln!(f, "{} {} ({} us)", status, result.name, result.parse_time_us)?;
            for failure in &result.failures {
                writeln!(f, "    {}", failure)?;
            }
        }
        write!(
            f,
            "{}/{} samples passed ({:.1}%)",
            self.passed, self.total, self.success_rate
        )
    }
}

/// Run the built-in corpus through a parser.
pub fn run_validation(parser: &ProgramParser) -> ValidationReport {
    validate_samples(parser, &samples::all())
}

/// Run a set of samples through a parser.
pub fn validate_samples(parser: &ProgramParser, samples: &[Sample]) -> ValidationReport {
    let results: Vec<SampleResult> = samples.iter().map(|sample| validate_sample(parser, sample)).collect();

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let success_rate = if total > 0 {
        passed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    ValidationReport {
        total,
        passed,
        failed: total - passed,
        success_rate,
        results,
    }
}

fn validate_sample(parser: &ProgramParser, sample: &Sample) -> SampleResult {
    let start = Instant::now();
    let outcome = parser.parse(sample.text);
    let parse_time_us = start.elapsed().as_micros();

    let failures = match outcome {
        Ok(program) => check(&program, &sample.expect),
        Err(e) => vec![format!("parse failed: {}", e)],
    };

    if !failures.is_empty() {
        log::warn!("sample '{}' failed: {}", sample.name, failures.join("; "));
    }

    SampleResult {
        name: sample.name.to_string(),
        passed: failures.is_empty(),
        failures,
        parse_time_us,
    }
}

fn check(program: &ParsedProgram, expect: &Expectation) -> Vec<String> {
    let mut failures = Vec::new();

    if program.matched_pattern() != expect.pattern {
        failures.push(format!(
            "pattern: expected {}, got {}",
            expect.pattern,
            program.matched_pattern()
        ));
    }
    if program.requirements().len() != expect.rows {
        failures.push(format!(
            "rows: expected {}, got {}",
            expect.rows,
            program.requirements().len()
        ));
    }
    if program.requires_manual_review() != expect.requires_review {
        failures.push(format!(
            "review: expected {}, got {}",
            expect.requires_review,
            program.requires_manual_review()
        ));
    }

    if let Some(expected) = expect.additional_insured {
        let wrong = program
            .requirements()
            .iter()
            .filter(|r| r.additional_insured_required != Some(expected))
            .count();
        if wrong > 0 {
            failures.push(format!("additional insured: {} rows differ from {}", wrong, expected));
        }
    }

    for check in expect.limits {
        match program.requirement(check.trade_or_tier, check.coverage) {
            Some(row) => {
                if row.limit(check.limit) != Some(check.amount) {
                    failures.push(format!(
                        "{} / {} {:?}: expected {}, got {:?}",
                        check.trade_or_tier,
                        check.coverage,
                        check.limit,
                        check.amount,
                        row.limit(check.limit)
                    ));
                }
            },
            None => failures.push(format!("missing row {} / {}", check.trade_or_tier, check.coverage)),
        }
    }

    failures
}
