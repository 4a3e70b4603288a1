//! Property tests for parser invariants.

use coi_program_parser::{parse, OversizePolicy, ParserOptions, ProgramParser};
use proptest::prelude::*;

fn dollars(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${}", grouped)
}

fn trade() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["Electrical", "Plumbing", "Roofing", "Concrete", "HVAC", "Masonry"])
}

fn amount() -> impl Strategy<Value = u64> {
    (1u64..50).prop_map(|n| n * 100_000)
}

#[test]
fn test_dollars_helper() {
    assert_eq!(dollars(100_000), "$100,000");
    assert_eq!(dollars(4_900_000), "$4,900,000");
}

proptest! {
    #[test]
    fn separator_choice_does_not_change_rows(trade in trade(), first in amount(), second in amount()) {
        let rows: Vec<_> = ["/", " / ", "-", " - ", ",", ", "]
            .iter()
            .map(|sep| {
                let line = format!("{} GL {}{}{}", trade, dollars(first), sep, dollars(second));
                parse(&line).unwrap().requirements().to_vec()
            })
            .collect();

        prop_assert_eq!(rows[0].len(), 1);
        for other in &rows[1..] {
            prop_assert_eq!(&rows[0], other);
        }
    }

    #[test]
    fn parsing_is_deterministic(text in "[A-Za-z0-9$,./|: \n-]{0,200}") {
        prop_assert_eq!(parse(&text).unwrap(), parse(&text).unwrap());
    }

    #[test]
    fn negative_amount_drops_row(trade in trade(), value in amount()) {
        let line = format!("{} GL -{}", trade, dollars(value));
        let program = parse(&line).unwrap();
        prop_assert!(program.requirements().is_empty());
        prop_assert!(program.requires_manual_review());
    }

    #[test]
    fn parsing_never_panics(text in "\\PC{0,300}") {
        let _ = parse(&text);
    }

    #[test]
    fn truncation_keeps_within_bound(text in "\\PC{0,200}(\n\\PC{0,40}){0,5}", max in 1usize..120) {
        let parser = ProgramParser::with_options(
            ParserOptions::default()
                .with_max_input_bytes(max)
                .with_oversize(OversizePolicy::Truncate),
        );
        let program = parser.parse(&text).unwrap();
        prop_assert!(program.raw_text().len() <= max);
        prop_assert!(text.starts_with(program.raw_text()));
    }

    #[test]
    fn review_flag_tracks_low_rows(text in "[A-Za-z0-9$,./|: \n-]{0,200}") {
        let program = parse(&text).unwrap();
        if program.low_confidence_rows().next().is_some() || program.requirements().is_empty() {
            prop_assert!(program.requires_manual_review());
        }
    }
}
