//! End-to-end tests for requirement text parsing.

use coi_program_parser::{
    parse, AmountScale, Confidence, CoverageType, Error, LimitName, OversizePolicy, ParseIssue, ParserOptions,
    PatternKind, PolicyForm, ProgramParser, ALL_TRADES,
};

mod scenarios {
    use super::*;

    #[test]
    fn test_electrical_gl_row() {
        let program = parse("Electrical GL $1,000,000 / $2,000,000").unwrap();

        assert_eq!(program.matched_pattern(), PatternKind::TierTradeTable);
        assert_eq!(program.requirements().len(), 1);
        let row = &program.requirements()[0];
        assert_eq!(row.trade_or_tier, "Electrical");
        assert_eq!(row.coverage_type, CoverageType::GeneralLiability);
        assert_eq!(row.limits.len(), 2);
        assert_eq!(row.limit(LimitName::EachOccurrence), Some(1_000_000));
        assert_eq!(row.limit(LimitName::GeneralAggregate), Some(2_000_000));
        assert_eq!(row.confidence, Confidence::High);
        assert_eq!(row.source_pattern, PatternKind::TierTradeTable);
        assert!(!program.requires_manual_review());
    }

    #[test]
    fn test_prose_is_unmatched() {
        let program = parse(
            "The Subcontractor agrees to furnish certificates evidencing coverage acceptable to the Contractor \
             prior to commencing work.",
        )
        .unwrap();

        assert_eq!(program.matched_pattern(), PatternKind::Unmatched);
        assert!(program.requirements().is_empty());
        assert!(program.requires_manual_review());
    }

    #[test]
    fn test_canonical_arity_assigns_named_slots() {
        let program = parse(
            "Tier 1 GL $1,000,000 | $2,000,000 | $2,000,000 | $1,000,000\n\
             Tier 2 WC $500,000 | $500,000 | $500,000\n\
             Tier 3 Auto $100,000 | $300,000 | $50,000",
        )
        .unwrap();

        let gl = program.requirement("Tier 1", CoverageType::GeneralLiability).unwrap();
        assert_eq!(gl.tier, Some(1));
        assert_eq!(gl.limit(LimitName::ProductsCompletedOperationsAggregate), Some(2_000_000));
        assert_eq!(gl.limit(LimitName::PersonalAndAdvertisingInjury), Some(1_000_000));

        let wc = program.requirement("Tier 2", CoverageType::WorkersCompensation).unwrap();
        assert_eq!(wc.limit(LimitName::DiseasePolicyLimit), Some(500_000));

        let auto = program.requirement("Tier 3", CoverageType::AutomobileLiability).unwrap();
        assert_eq!(auto.limit(LimitName::BodilyInjuryPerPerson), Some(100_000));
        assert_eq!(auto.limit(LimitName::PropertyDamage), Some(50_000));

        assert!(program.requirements().iter().all(|r| r.confidence == Confidence::High));
        assert!(!program.requires_manual_review());
    }

    #[test]
    fn test_magnitude_suffixes() {
        let program = parse("Roofing GL $1M | $2M Umbrella $5 million").unwrap();
        let gl = program.requirement("Roofing", CoverageType::GeneralLiability).unwrap();
        assert_eq!(gl.limit(LimitName::GeneralAggregate), Some(2_000_000));
        let umbrella = program.requirement("Roofing", CoverageType::Umbrella).unwrap();
        assert_eq!(umbrella.limit(LimitName::EachOccurrence), Some(5_000_000));
    }

    #[test]
    fn test_scale_statement_applies_to_bare_figures() {
        let program = parse("All limits shown (in thousands)\nElectrical GL 1,000 / 2,000").unwrap();
        assert_eq!(program.scale(), AmountScale::Thousands);
        let gl = program.requirement("Electrical", CoverageType::GeneralLiability).unwrap();
        assert_eq!(gl.limit(LimitName::EachOccurrence), Some(1_000_000));
        assert_eq!(gl.limit(LimitName::GeneralAggregate), Some(2_000_000));
        assert!(program.requires_manual_review());
    }

    #[test]
    fn test_prose_mentioning_thousands_keeps_units() {
        let program = parse(
            "Our firm has delivered work in thousands of buildings.
             Electrical GL $1,000,000 / $2,000,000",
        )
        .unwrap();
        assert_eq!(program.scale(), AmountScale::Units);
        let gl = program.requirement("Electrical", CoverageType::GeneralLiability).unwrap();
        assert_eq!(gl.limit(LimitName::EachOccurrence), Some(1_000_000));
        assert_eq!(gl.confidence, Confidence::High);
        assert!(!program.requires_manual_review());
        assert!(!program
            .diagnostics()
            .iter()
            .any(|issue| matches!(issue, ParseIssue::ScaleApplied { .. })));
    }

    #[test]
    fn test_in_excess_of_is_a_threshold() {
        let program = parse("Subcontractors shall carry General Liability with limits in excess of $1,000,000.").unwrap();
        assert!(program
            .requirements()
            .iter()
            .all(|r| r.coverage_type != CoverageType::Umbrella));
    }

    #[test]
    fn test_policy_form_and_endorsements() {
        let program = parse(
            "All policies shall name the Owner as additional insured.\n\
             Electrical GL $1,000,000 | $2,000,000 occurrence basis, waiver of subrogation",
        )
        .unwrap();
        let gl = &program.requirements()[0];
        assert_eq!(gl.policy_type, Some(PolicyForm::Occurrence));
        assert_eq!(gl.additional_insured_required, Some(true));
        assert_eq!(gl.waiver_of_subrogation, Some(true));
    }
}

mod confidence {
    use super::*;

    #[test]
    fn test_unexpected_arity_is_low_and_flagged() {
        let program = parse("Electrical WC $1,000,000 / $1,000,000").unwrap();
        let row = &program.requirements()[0];
        assert_eq!(row.confidence, Confidence::Low);
        assert!(program.requires_manual_review());
        assert!(program
            .diagnostics()
            .iter()
            .any(|d| matches!(d, ParseIssue::AmbiguousAmounts { amount_count: 2, .. })));
        assert!(program.diagnostics().contains(&ParseIssue::AllRowsLowConfidence));
    }

    #[test]
    fn test_surplus_amounts_kept_unassigned() {
        let program = parse("Electrical Umbrella $5,000,000 / $5,000,000 / $1,000,000").unwrap();
        let row = &program.requirements()[0];
        assert_eq!(row.confidence, Confidence::Low);
        assert_eq!(row.limit(LimitName::EachOccurrence), Some(5_000_000));
        assert_eq!(row.limit(LimitName::Aggregate), Some(5_000_000));
        assert_eq!(row.unassigned_amounts, vec![1_000_000]);
    }

    #[test]
    fn test_one_low_row_flags_program() {
        let program = parse(
            "Electrical GL $1,000,000 / $2,000,000\n\
             Plumbing GL $2,000,000 / $1,000,000",
        )
        .unwrap();
        assert_eq!(program.requirements().len(), 2);
        assert_eq!(program.low_confidence_rows().count(), 1);
        assert!(program.requires_manual_review());
        assert!(!program.diagnostics().contains(&ParseIssue::AllRowsLowConfidence));
    }

    #[test]
    fn test_contractor_block_without_coverage_is_other() {
        let program = parse(
            "Subcontractor: XYZ Electric\n\
             Each Occurrence: $2,000,000\n\
             Aggregate: $4,000,000",
        )
        .unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::PrimeSubcontractor);
        let row = &program.requirements()[0];
        assert_eq!(row.trade_or_tier, "XYZ Electric");
        assert_eq!(row.coverage_type, CoverageType::Other);
        assert_eq!(row.confidence, Confidence::Low);
        assert_eq!(row.limit(LimitName::EachOccurrence), Some(2_000_000));
        assert!(program
            .diagnostics()
            .iter()
            .any(|d| matches!(d, ParseIssue::UnknownCoverage { .. })));
    }

    #[test]
    fn test_general_format_rows_are_all_trades() {
        let program = parse("Umbrella: $5,000,000\nProfessional Liability: $2,000,000 per claim").unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::GeneralFormat);
        assert!(program.requirements().iter().all(|r| r.trade_or_tier == ALL_TRADES));
        assert!(program.requirements().iter().all(|r| r.confidence == Confidence::High));
        let pl = program
            .requirement(ALL_TRADES, CoverageType::ProfessionalLiability)
            .unwrap();
        assert_eq!(pl.limit(LimitName::EachClaim), Some(2_000_000));
    }
}

mod rejected_amounts {
    use super::*;

    #[test]
    fn test_negative_amount_drops_row() {
        let program = parse(
            "Electrical GL $1,000,000 / $2,000,000\n\
             Roofing GL -$500,000",
        )
        .unwrap();
        assert_eq!(program.requirements().len(), 1);
        assert!(program.requirement("Roofing", CoverageType::GeneralLiability).is_none());
        assert!(program.diagnostics().iter().any(|d| matches!(
            d,
            ParseIssue::RejectedAmount { line: 2, token, .. } if token == "-$500,000"
        )));
    }

    #[test]
    fn test_minus_after_figure_stays_negative() {
        let program = parse("Roofing Umbrella $5,000,000 -$500").unwrap();
        assert!(program.requirements().is_empty());
        assert!(program.requires_manual_review());
        assert!(program.diagnostics().iter().any(|d| matches!(
            d,
            ParseIssue::RejectedAmount { token, .. } if token == "-$500"
        )));
    }

    #[test]
    fn test_non_numeric_amount_drops_row() {
        let program = parse("Roofing GL $1,OOO,000").unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::TierTradeTable);
        assert!(program.requirements().is_empty());
        assert!(program.requires_manual_review());
    }

    #[test]
    fn test_accounting_parentheses_are_negative() {
        let program = parse("Roofing GL ($1,000,000)").unwrap();
        assert!(program.requirements().is_empty());
    }
}

mod duplicates {
    use super::*;

    #[test]
    fn test_higher_confidence_row_wins() {
        let program = parse(
            "Electrical GL $1,000,000 / $2,000,000 / $3,000,000 / $4,000,000 / $5,000,000\n\
             Electrical GL $1,000,000 / $2,000,000",
        )
        .unwrap();
        assert_eq!(program.requirements().len(), 1);
        let row = &program.requirements()[0];
        assert_eq!(row.confidence, Confidence::High);
        assert_eq!(row.line, 2);
        assert_eq!(row.limits.len(), 2);
        assert!(row.unassigned_amounts.is_empty());
        assert!(program.diagnostics().iter().any(|d| matches!(
            d,
            ParseIssue::DuplicateMerged {
                kept_line: 2,
                dropped_line: 1,
                ..
            }
        )));
    }

    #[test]
    fn test_same_confidence_keeps_first() {
        let program = parse(
            "Electrical GL $1,000,000 / $2,000,000\n\
             Electrical GL $2,000,000 / $4,000,000",
        )
        .unwrap();
        assert_eq!(program.requirements().len(), 1);
        assert_eq!(program.requirements()[0].limit(LimitName::EachOccurrence), Some(1_000_000));
    }

    #[test]
    fn test_conflicting_tie_requires_review() {
        let program = parse(
            "Electrical GL $1,000,000 / $2,000,000
             Electrical GL $5,000,000 / $10,000,000",
        )
        .unwrap();
        assert_eq!(program.requirements().len(), 1);
        let row = &program.requirements()[0];
        assert_eq!(row.limit(LimitName::EachOccurrence), Some(1_000_000));
        assert_eq!(row.confidence, Confidence::Low);
        assert!(program.requires_manual_review());
    }

    #[test]
    fn test_repeated_row_stays_high() {
        let program = parse(
            "Electrical GL $1,000,000 / $2,000,000
             Electrical GL $1,000,000 / $2,000,000",
        )
        .unwrap();
        assert_eq!(program.requirements().len(), 1);
        assert!(!program.requires_manual_review());
    }

    #[test]
    fn test_keys_are_unique() {
        let program = parse(
            "Trade | GL | Auto\n\
             Electrical | $1,000,000 | $1,000,000\n\
             Electrical | $2,000,000 | $1,000,000\n\
             Plumbing | $1,000,000 | $1,000,000",
        )
        .unwrap();
        let mut keys: Vec<_> = program.requirements().iter().map(|r| r.key()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(total, 4);
    }
}

mod input_bounds {
    use super::*;

    #[test]
    fn test_blank_input_is_flagged() {
        for raw in ["", "   ", "\n\n\t\n"] {
            let program = parse(raw).unwrap();
            assert_eq!(program.matched_pattern(), PatternKind::Unmatched);
            assert!(program.requirements().is_empty());
            assert!(program.requires_manual_review());
            assert_eq!(program.diagnostics(), &[ParseIssue::EmptyInput]);
        }
    }

    #[test]
    fn test_oversize_rejected_by_default() {
        let parser = ProgramParser::with_options(ParserOptions::default().with_max_input_bytes(16));
        match parser.parse("Electrical GL $1,000,000 / $2,000,000") {
            Err(Error::OversizedInput { size, limit }) => {
                assert_eq!(size, 37);
                assert_eq!(limit, 16);
            },
            other => panic!("expected OversizedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_oversize_truncated_at_line() {
        let text = "Electrical GL $1,000,000 / $2,000,000\nPlumbing GL $1,000,000 / $2,000,000\n";
        let parser = ProgramParser::with_options(
            ParserOptions::default()
                .with_max_input_bytes(50)
                .with_oversize(OversizePolicy::Truncate),
        );
        let program = parser.parse(text).unwrap();
        assert_eq!(program.requirements().len(), 1);
        assert_eq!(program.raw_text(), "Electrical GL $1,000,000 / $2,000,000\n");
        assert_eq!(
            program.diagnostics()[0],
            ParseIssue::Truncated {
                original_bytes: text.len(),
                kept_bytes: 38
            }
        );
    }

    #[test]
    fn test_placeholder_for_unrecognized_text() {
        let parser = ProgramParser::with_options(ParserOptions::lenient());
        let program = parser.parse("Insurance to be determined.").unwrap();
        assert_eq!(program.matched_pattern(), PatternKind::Unmatched);
        assert_eq!(program.requirements().len(), 1);
        let placeholder = &program.requirements()[0];
        assert_eq!(placeholder.trade_or_tier, ALL_TRADES);
        assert_eq!(placeholder.coverage_type, CoverageType::Other);
        assert!(placeholder.limits.is_empty());
        assert!(program.requires_manual_review());
    }
}

mod output {
    use super::*;
    use coi_program_parser::ParsedProgram;

    #[test]
    fn test_json_shape() {
        let program = parse("Electrical GL $1,000,000 / $2,000,000").unwrap();
        let json = program.to_json().unwrap();
        assert!(json.contains("\"matchedPattern\":\"tierTradeTable\""));
        assert!(json.contains("\"tradeOrTier\":\"Electrical\""));
        assert!(json.contains("\"coverageType\":\"generalLiability\""));
        assert!(json.contains("\"eachOccurrence\":1000000"));
        assert!(json.contains("\"generalAggregate\":2000000"));
        assert!(json.contains("\"confidence\":\"high\""));
        assert!(json.contains("\"requiresManualReview\":false"));
        assert!(!json.contains("unassignedAmounts"));
    }

    #[test]
    fn test_unmatched_serializes_as_none() {
        let program = parse("Nothing to see here.").unwrap();
        let json = program.to_json().unwrap();
        assert!(json.contains("\"matchedPattern\":\"none\""));
        assert!(json.contains("\"kind\":\"unrecognizedFormat\""));
    }

    #[test]
    fn test_json_round_trip() {
        let program = parse("Tier 1 - Electrical: GL $1M | $2M Auto $1M").unwrap();
        let back: ParsedProgram = serde_json::from_str(&program.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn test_fingerprint_tracks_raw_text() {
        let a = parse("Electrical GL $1,000,000 / $2,000,000").unwrap();
        let b = parse("Electrical GL $1,000,000 - $2,000,000").unwrap();
        assert_eq!(a.requirements(), b.requirements());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
