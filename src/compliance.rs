//! Certificate compliance checks.
//!
//! Compares the coverages on a contractor's certificate of insurance with the
//! requirement rows that apply to the contractor's trade. Rows labelled
//! "All Trades" apply to every trade.

use crate::coverage::CoverageType;
use crate::currency::Dollars;
use crate::limits::LimitName;
use crate::requirement::TradeRequirement;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One coverage as shown on a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCoverage {
    pub coverage_type: CoverageType,
    pub limits: BTreeMap<LimitName, Dollars>,
    pub additional_insured: bool,
    /// Expiration as written (`YYYY-MM-DD`, ISO date-time or `MM/DD/YYYY`)
    pub expiration: Option<String>,
}

/// Certificate of insurance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub holder: String,
    pub coverages: Vec<CertificateCoverage>,
}

impl Certificate {
    /// Coverage of a type, if the certificate lists one.
    pub fn coverage(&self, coverage: CoverageType) -> Option<&CertificateCoverage> {
        self.coverages.iter().find(|c| c.coverage_type == coverage)
    }
}

/// One reason a certificate falls short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ComplianceIssue {
    /// Required coverage is not on the certificate
    CoverageMissing { coverage_type: CoverageType },
    /// Limit is absent or below the requirement
    LimitInsufficient {
        coverage_type: CoverageType,
        limit: LimitName,
        required: Dollars,
        actual: Option<Dollars>,
    },
    /// Requirement calls for additional insured status
    AdditionalInsuredMissing { coverage_type: CoverageType },
    /// Policy expired before the check date
    Expired {
        coverage_type: CoverageType,
        expiration: NaiveDate,
    },
    /// Expiration could not be read
    InvalidExpirationDate { coverage_type: CoverageType, value: String },
}

/// Outcome of a compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub compliant: bool,
    pub issues: Vec<ComplianceIssue>,
}

impl Default for ComplianceReport {
    fn default() -> Self {
        Self {
            compliant: true,
            issues: Vec::new(),
        }
    }
}

impl ComplianceReport {
    /// Record an issue; any issue makes the certificate non-compliant.
    pub fn add_issue(&mut self, issue: ComplianceIssue) {
        self.issues.push(issue);
        self.compliant = false;
    }
}

/// Check a certificate against the requirements for `trade`.
///
/// A policy expiring on `as_of` is still in force; it lapses the day after.
pub fn check_compliance(
    requirements: &[TradeRequirement],
    trade: &str,
    certificate: &Certificate,
    as_of: NaiveDate,
) -> ComplianceReport {
    let mut report = ComplianceReport::default();

    let applicable = requirements
        .iter()
        .filter(|r| r.applies_to_all_trades() || r.trade_or_tier.eq_ignore_ascii_case(trade));

    let mut dated: Vec<CoverageType> = Vec::new();

    for requirement in applicable {
        let coverage_type = requirement.coverage_type;
        let Some(held) = certificate.coverage(coverage_type) else {
            if !report
                .issues
                .contains(&ComplianceIssue::CoverageMissing { coverage_type })
            {
                report.add_issue(ComplianceIssue::CoverageMissing { coverage_type });
            }
            continue;
        };

        for (&limit, &required) in &requirement.limits {
            let actual = held.limits.get(&limit).copied();
            if actual.map_or(true, |actual| actual < required) {
                report.add_issue(ComplianceIssue::LimitInsufficient {
                    coverage_type,
                    limit,
                    required,
                    actual,
                });
            }
        }

        if requirement.additional_insured_required == Some(true) && !held.additional_insured {
            report.add_issue(ComplianceIssue::AdditionalInsuredMissing { coverage_type });
        }

        if dated.contains(&coverage_type) {
            continue;
        }
        dated.push(coverage_type);

        match held.expiration.as_deref().map(|value| (value, parse_expiration(value))) {
            Some((_, Some(expiration))) if expiration < as_of => {
                report.add_issue(ComplianceIssue::Expired {
                    coverage_type,
                    expiration,
                });
            },
            Some((value, None)) => {
                report.add_issue(ComplianceIssue::InvalidExpirationDate {
                    coverage_type,
                    value: value.to_string(),
                });
            },
            _ => {},
        }
    }

    log::debug!(
        "{} for {}: {} issues",
        certificate.holder,
        trade,
        report.issues.len()
    );
    report
}

/// Parse an expiration date as certificates write them.
pub fn parse_expiration(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::{Confidence, PatternKind, ALL_TRADES};

    fn requirement(trade: &str, coverage: CoverageType, limits: &[(LimitName, Dollars)]) -> TradeRequirement {
        TradeRequirement {
            trade_or_tier: trade.to_string(),
            tier: None,
            coverage_type: coverage,
            limits: limits.iter().copied().collect(),
            unassigned_amounts: Vec::new(),
            policy_type: None,
            additional_insured_required: None,
            waiver_of_subrogation: None,
            source_pattern: PatternKind::TierTradeTable,
            confidence: Confidence::High,
            line: 1,
        }
    }

    fn gl(each: Dollars, aggregate: Dollars, expiration: &str) -> CertificateCoverage {
        CertificateCoverage {
            coverage_type: CoverageType::GeneralLiability,
            limits: [(LimitName::EachOccurrence, each), (LimitName::GeneralAggregate, aggregate)]
                .into_iter()
                .collect(),
            additional_insured: true,
            expiration: Some(expiration.to_string()),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn electrical_gl() -> Vec<TradeRequirement> {
        vec![requirement(
            "Electrical",
            CoverageType::GeneralLiability,
            &[(LimitName::EachOccurrence, 1_000_000), (LimitName::GeneralAggregate, 2_000_000)],
        )]
    }

    #[test]
    fn test_compliant_certificate() {
        let certificate = Certificate {
            holder: "Sparks LLC".into(),
            coverages: vec![gl(1_000_000, 2_000_000, "2027-01-01")],
        };
        let report = check_compliance(&electrical_gl(), "Electrical", &certificate, date(2026, 10, 19));
        assert!(report.compliant, "{:?}", report.issues);
    }

    #[test]
    fn test_expiring_today_is_valid() {
        let certificate = Certificate {
            holder: "Sparks LLC".into(),
            coverages: vec![gl(1_000_000, 2_000_000, "2026-10-19T23:59:59")],
        };
        let report = check_compliance(&electrical_gl(), "electrical", &certificate, date(2026, 10, 19));
        assert!(report.compliant, "{:?}", report.issues);
    }

    #[test]
    fn test_expired_yesterday() {
        let certificate = Certificate {
            holder: "Sparks LLC".into(),
            coverages: vec![gl(1_000_000, 2_000_000, "10/18/2026")],
        };
        let report = check_compliance(&electrical_gl(), "Electrical", &certificate, date(2026, 10, 19));
        assert_eq!(
            report.issues,
            vec![ComplianceIssue::Expired {
                coverage_type: CoverageType::GeneralLiability,
                expiration: date(2026, 10, 18),
            }]
        );
    }

    #[test]
    fn test_unreadable_expiration() {
        let certificate = Certificate {
            holder: "Sparks LLC".into(),
            coverages: vec![gl(1_000_000, 2_000_000, "next spring")],
        };
        let report = check_compliance(&electrical_gl(), "Electrical", &certificate, date(2026, 10, 19));
        assert!(!report.compliant);
        assert!(matches!(report.issues[0], ComplianceIssue::InvalidExpirationDate { .. }));
    }

    #[test]
    fn test_insufficient_and_missing() {
        let mut requirements = electrical_gl();
        requirements.push(requirement(
            ALL_TRADES,
            CoverageType::Umbrella,
            &[(LimitName::EachOccurrence, 5_000_000)],
        ));
        let certificate = Certificate {
            holder: "Sparks LLC".into(),
            coverages: vec![gl(500_000, 2_000_000, "2027-01-01")],
        };

        let report = check_compliance(&requirements, "Electrical", &certificate, date(2026, 10, 19));
        assert_eq!(
            report.issues,
            vec![
                ComplianceIssue::LimitInsufficient {
                    coverage_type: CoverageType::GeneralLiability,
                    limit: LimitName::EachOccurrence,
                    required: 1_000_000,
                    actual: Some(500_000),
                },
                ComplianceIssue::CoverageMissing {
                    coverage_type: CoverageType::Umbrella
                },
            ]
        );
    }

    #[test]
    fn test_additional_insured_required() {
        let mut requirements = electrical_gl();
        requirements[0].additional_insured_required = Some(true);
        let mut coverage = gl(1_000_000, 2_000_000, "2027-01-01");
        coverage.additional_insured = false;
        let certificate = Certificate {
            holder: "Sparks LLC".into(),
            coverages: vec![coverage],
        };
        let report = check_compliance(&requirements, "Electrical", &certificate, date(2026, 10, 19));
        assert_eq!(
            report.issues,
            vec![ComplianceIssue::AdditionalInsuredMissing {
                coverage_type: CoverageType::GeneralLiability
            }]
        );
    }

    #[test]
    fn test_other_trades_ignored() {
        let certificate = Certificate::default();
        let report = check_compliance(&electrical_gl(), "Plumbing", &certificate, date(2026, 10, 19));
        assert!(report.compliant);
    }

    #[test]
    fn test_parse_expiration_formats() {
        assert_eq!(parse_expiration("2027-01-01"), Some(date(2027, 1, 1)));
        assert_eq!(parse_expiration("01/01/2027"), Some(date(2027, 1, 1)));
        assert_eq!(parse_expiration("2027-01-01T00:00:00Z"), Some(date(2027, 1, 1)));
        assert_eq!(parse_expiration("2027-01-01T12:30:00"), Some(date(2027, 1, 1)));
        assert_eq!(parse_expiration("MM/DD/YYYY"), None);
    }
}
