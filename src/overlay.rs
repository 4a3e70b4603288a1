//! Human review overlays.
//!
//! A [`ParsedProgram`] is never edited in place. A reviewer records
//! corrections in a [`ReviewOverlay`] tied to the program's fingerprint;
//! applying the overlay produces a separate [`ReviewedProgram`].

use crate::coverage::CoverageType;
use crate::currency::Dollars;
use crate::error::{Error, Result};
use crate::limits::LimitName;
use crate::requirement::{Confidence, ParsedProgram, TradeRequirement};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One reviewer correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Correction {
    /// Set or replace one limit on a row
    SetLimit {
        trade_or_tier: String,
        coverage_type: CoverageType,
        limit: LimitName,
        amount: Dollars,
    },
    /// Remove one limit from a row
    RemoveLimit {
        trade_or_tier: String,
        coverage_type: CoverageType,
        limit: LimitName,
    },
    /// Add a row the parser missed
    AddRequirement { requirement: TradeRequirement },
    /// Remove a row the parser should not have produced
    RemoveRequirement {
        trade_or_tier: String,
        coverage_type: CoverageType,
    },
    /// Accept a row as parsed
    Confirm {
        trade_or_tier: String,
        coverage_type: CoverageType,
    },
}

/// Corrections made by one reviewer against one parsed program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOverlay {
    pub id: Uuid,
    /// [`ParsedProgram::fingerprint`] of the program this overlay targets
    pub program_fingerprint: String,
    pub reviewer: String,
    pub created_at: DateTime<Utc>,
    pub corrections: Vec<Correction>,
}

/// Requirement row after review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedRequirement {
    #[serde(flatten)]
    pub requirement: TradeRequirement,
    /// Touched or confirmed by the reviewer
    pub reviewed: bool,
}

/// Program with an overlay applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedProgram {
    pub overlay_id: Uuid,
    pub reviewer: String,
    pub requirements: Vec<ReviewedRequirement>,
    /// Some low-confidence row is still unreviewed, or no rows remain
    pub requires_manual_review: bool,
}

impl ReviewedProgram {
    /// Reviewed row for a trade and coverage.
    pub fn requirement(&self, trade_or_tier: &str, coverage: CoverageType) -> Option<&ReviewedRequirement> {
        self.requirements.iter().find(|r| {
            r.requirement.trade_or_tier == trade_or_tier && r.requirement.coverage_type == coverage
        })
    }
}

impl ReviewOverlay {
    /// Start an empty overlay for a program.
    pub fn new(program: &ParsedProgram, reviewer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            program_fingerprint: program.fingerprint(),
            reviewer: reviewer.into(),
            created_at: Utc::now(),
            corrections: Vec::new(),
        }
    }

    /// Append a correction.
    pub fn with_correction(mut self, correction: Correction) -> Self {
        self.corrections.push(correction);
        self
    }

    /// Load an overlay from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the overlay to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Apply the corrections in order.
    ///
    /// Fails when the overlay was recorded against a different program or a
    /// correction targets a row that does not exist (or, for
    /// `AddRequirement`, one that already does).
    pub fn apply(&self, program: &ParsedProgram) -> Result<ReviewedProgram> {
        let fingerprint = program.fingerprint();
        if fingerprint != self.program_fingerprint {
            return Err(Error::Overlay(format!(
                "overlay {} targets program {}, not {}",
                self.id, self.program_fingerprint, fingerprint
            )));
        }

        let mut rows: Vec<ReviewedRequirement> = program
            .requirements()
            .iter()
            .cloned()
            .map(|requirement| ReviewedRequirement {
                requirement,
                reviewed: false,
            })
            .collect();

        for correction in &self.corrections {
            match correction {
                Correction::SetLimit {
                    trade_or_tier,
                    coverage_type,
                    limit,
                    amount,
                } => {
                    let row = find_row(&mut rows, trade_or_tier, *coverage_type)?;
                    row.requirement.limits.insert(*limit, *amount);
                    row.reviewed = true;
                },
                Correction::RemoveLimit {
                    trade_or_tier,
                    coverage_type,
                    limit,
                } => {
                    let row = find_row(&mut rows, trade_or_tier, *coverage_type)?;
                    if row.requirement.limits.remove(limit).is_none() {
                        return Err(Error::Overlay(format!(
                            "{} / {} has no {:?} limit",
                            trade_or_tier, coverage_type, limit
                        )));
                    }
                    row.reviewed = true;
                },
                Correction::AddRequirement { requirement } => {
                    let (trade, coverage) = requirement.key();
                    if position(&rows, trade, coverage).is_some() {
                        return Err(Error::Overlay(format!("{} / {} already exists", trade, coverage)));
                    }
                    rows.push(ReviewedRequirement {
                        requirement: requirement.clone(),
                        reviewed: true,
                    });
                },
                Correction::RemoveRequirement {
                    trade_or_tier,
                    coverage_type,
                } => {
                    let idx = position(&rows, trade_or_tier, *coverage_type)
                        .ok_or_else(|| missing(trade_or_tier, *coverage_type))?;
                    rows.remove(idx);
                },
                Correction::Confirm {
                    trade_or_tier,
                    coverage_type,
                } => {
                    find_row(&mut rows, trade_or_tier, *coverage_type)?.reviewed = true;
                },
            }
        }

        let requires_manual_review = rows.is_empty()
            || rows
                .iter()
                .any(|r| !r.reviewed && r.requirement.confidence == Confidence::Low);

        log::info!(
            "overlay {} by {}: {} corrections, {} rows",
            self.id,
            self.reviewer,
            self.corrections.len(),
            rows.len()
        );

        Ok(ReviewedProgram {
            overlay_id: self.id,
            reviewer: self.reviewer.clone(),
            requirements: rows,
            requires_manual_review,
        })
    }
}

fn position(rows: &[ReviewedRequirement], trade_or_tier: &str, coverage: CoverageType) -> Option<usize> {
    rows.iter()
        .position(|r| r.requirement.key() == (trade_or_tier, coverage))
}

fn find_row<'a>(
    rows: &'a mut [ReviewedRequirement],
    trade_or_tier: &str,
    coverage: CoverageType,
) -> Result<&'a mut ReviewedRequirement> {
    match position(rows, trade_or_tier, coverage) {
        Some(idx) => Ok(&mut rows[idx]),
        None => Err(missing(trade_or_tier, coverage)),
    }
}

fn missing(trade_or_tier: &str, coverage: CoverageType) -> Error {
    Error::Overlay(format!("no requirement for {} / {}", trade_or_tier, coverage))
}
