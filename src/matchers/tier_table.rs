//! Tier/trade matrix recognizer.
//!
//! Handles three shapes of the same convention:
//!
//! - one row per tier or trade, each coverage keyword followed by its
//!   amounts (`Tier 2 Electrical GL $1M | $2M Auto $1M`)
//! - a header line naming the coverage columns, then rows of bare amounts
//!   (`Trade | GL | Auto | Umbrella` / `Electrical | $1M | $1M | $5M`)
//! - a header of tier columns, then one line per coverage or limit
//!   (`Coverage | Tier 1 | Tier 2` / `GL Each Occurrence | $1M | $2M`)
//!
//! A tier heading without amounts (`Tier 1 - Major Trades`) scopes the
//! keyword-led lines beneath it.

use super::{is_plausible_trade, split_segments, MatchResult, PatternMatcher, RawAmounts, RawRow};
use crate::coverage::{find_mentions, CoverageType};
use crate::currency::find_amount_lexemes;
use crate::flags::RowFlags;
use crate::limits::{contains_limit_label, find_limit_labels, LimitName};
use crate::normalizer::NormalizedText;
use crate::requirement::PatternKind;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

lazy_static! {
    static ref RE_TIER_PREFIX: Regex =
        Regex::new(r"(?i)^(?:all\s+)?tier\s+(\d{1,2}|[ivx]{1,4})\b[\s:.)|-]*(?:trades?\b)?[\s:|-]*").unwrap();
    static ref RE_TIER_TOKEN: Regex = Regex::new(r"(?i)\btier\s+(\d{1,2}|[ivx]{1,4})\b").unwrap();
    static ref RE_HEADER: Regex = Regex::new(
        r"(?i)^(?:tiers?|trades?|subcontractors?|classifications?|scope(?:\s+of\s+work)?|contractor\s+type|categor(?:y|ies)|coverages?)\b"
    )
    .unwrap();
}

/// Recognizer for tier/trade matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierTableMatcher;

impl PatternMatcher for TierTableMatcher {
    fn kind(&self) -> PatternKind {
        PatternKind::TierTradeTable
    }

    fn try_match(&self, text: &NormalizedText) -> Option<MatchResult> {
        let mut table = TableState::default();
        for (number, line) in text.numbered_lines() {
            table.feed(number, line);
        }

        let rows = table.finish();
        if rows.is_empty() {
            log::debug!("tierTradeTable: no tier or trade rows");
            return None;
        }

        log::debug!("tierTradeTable: {} rows", rows.len());
        Some(MatchResult {
            kind: PatternKind::TierTradeTable,
            rows,
        })
    }
}

/// One column of a coverage header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Column {
    coverage: Option<CoverageType>,
    label: Option<LimitName>,
}

/// Row built up over several lines of a tier-column table.
#[derive(Debug, Clone)]
struct Accumulator {
    line: usize,
    tier: u32,
    coverage: CoverageType,
    coverage_label: Option<String>,
    named: Vec<(LimitName, String)>,
    positional: Vec<String>,
    flags: RowFlags,
}

impl Accumulator {
    fn into_row(self) -> RawRow {
        let amounts = if self.positional.is_empty() {
            RawAmounts::Named(self.named)
        } else {
            let mut all: Vec<String> = self.named.into_iter().map(|(_, lexeme)| lexeme).collect();
            all.extend(self.positional);
            RawAmounts::Positional(all)
        };

        RawRow {
            line: self.line,
            tier: Some(self.tier),
            trade: None,
            coverage_label: self.coverage_label,
            coverage_hint: Some(self.coverage),
            amounts,
            flags: self.flags,
        }
    }
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<RawRow>,
    columns: Vec<Column>,
    heading: Option<(u32, Option<String>)>,
    tier_columns: Vec<u32>,
    transposed: IndexMap<(u32, CoverageType), Accumulator>,
    transposed_coverage: Option<(CoverageType, Option<String>)>,
}

impl TableState {
    fn feed(&mut self, number: usize, line: &str) {
        let lexemes = find_amount_lexemes(line);
        if lexemes.is_empty() {
            self.feed_heading(line);
            return;
        }

        if !self.tier_columns.is_empty()
            && lexemes.len() == self.tier_columns.len()
            && self.feed_transposed(number, line, &lexemes)
        {
            return;
        }

        let (tier, rest) = split_tier_prefix(line);
        let split = split_segments(rest);
        let trade = Some(split.prefix.clone()).filter(|prefix| is_plausible_trade(prefix));

        let (tier, trade) = match (tier, trade) {
            (Some(tier), trade) => (Some(tier), trade),
            (None, Some(trade)) if !split.segments.is_empty() || !self.columns.is_empty() => {
                (self.heading.as_ref().map(|(tier, _)| *tier), Some(trade))
            },
            (None, None) if split.prefix.is_empty() && self.heading.is_some() => match &self.heading {
                Some((tier, trade)) => (Some(*tier), trade.clone()),
                None => return,
            },
            _ => {
                log::trace!("tierTradeTable: line {} is not a row", number);
                return;
            },
        };

        if !split.segments.is_empty() {
            for segment in split.segments {
                self.rows.push(RawRow {
                    line: number,
                    tier,
                    trade: trade.clone(),
                    coverage_label: Some(segment.coverage_label),
                    coverage_hint: None,
                    amounts: segment.amounts,
                    flags: segment.flags,
                });
            }
            return;
        }

        let flags = RowFlags::scan(rest);
        for (coverage, amounts) in assign_columns(&self.columns, split.orphans) {
            self.rows.push(RawRow {
                line: number,
                tier,
                trade: trade.clone(),
                coverage_label: None,
                coverage_hint: coverage,
                amounts,
                flags,
            });
        }
    }

    fn feed_heading(&mut self, line: &str) {
        let tier_tokens: Vec<u32> = RE_TIER_TOKEN
            .captures_iter(line)
            .filter_map(|caps| parse_tier(&caps[1]))
            .collect();
        if tier_tokens.len() >= 2 {
            log::debug!("tierTradeTable: tier columns {:?}", tier_tokens);
            self.tier_columns = tier_tokens;
            self.transposed_coverage = None;
            self.columns.clear();
            self.heading = None;
            return;
        }

        let (tier, rest) = split_tier_prefix(line);
        if let Some(tier) = tier {
            let trade = Some(rest.to_string()).filter(|rest| is_plausible_trade(rest));
            self.heading = Some((tier, trade.map(|t| super::trim_label(&t).to_string())));
            return;
        }

        if is_header(line) {
            self.columns = header_columns(line);
            self.tier_columns.clear();
            self.heading = None;
            log::debug!("tierTradeTable: {} header columns", self.columns.len());
            return;
        }

        if !self.tier_columns.is_empty() {
            if let Some(mention) = find_mentions(line).last() {
                self.transposed_coverage = Some((mention.coverage, Some(line[mention.range.clone()].to_string())));
            }
        }
    }

    /// One line of a tier-column table: one amount per tier.
    fn feed_transposed(&mut self, number: usize, line: &str, lexemes: &[(Range<usize>, &str)]) -> bool {
        let key = &line[..lexemes[0].0.start];
        let labels = find_limit_labels(key);

        let explicit = find_mentions(key)
            .last()
            .map(|m| (m.coverage, Some(key[m.range.clone()].to_string())));
        if explicit.is_some() {
            self.transposed_coverage = explicit.clone();
        }
        let Some((coverage, coverage_label)) = explicit
            .or_else(|| {
                labels
                    .iter()
                    .find_map(|l| l.name.implied_coverage())
                    .map(|coverage| (coverage, None))
            })
            .or_else(|| self.transposed_coverage.clone())
        else {
            return false;
        };

        let label = match labels.as_slice() {
            [single] => Some(single.name),
            _ => None,
        };
        let flags = RowFlags::scan(line);

        for (tier, (_, lexeme)) in self.tier_columns.iter().copied().zip(lexemes) {
            let acc = self
                .transposed
                .entry((tier, coverage))
                .or_insert_with(|| Accumulator {
                    line: number,
                    tier,
                    coverage,
                    coverage_label: coverage_label.clone(),
                    named: Vec::new(),
                    positional: Vec::new(),
                    flags: RowFlags::default(),
                });
            match label {
                Some(name) => acc.named.push((name, lexeme.to_string())),
                None => acc.positional.push(lexeme.to_string()),
            }
            acc.flags.inherit(&flags);
        }
        true
    }

    fn finish(mut self) -> Vec<RawRow> {
        let mut transposed: Vec<Accumulator> = self.transposed.into_values().collect();
        transposed.sort_by_key(|acc| acc.tier);
        self.rows.extend(transposed.into_iter().map(Accumulator::into_row));
        self.rows
    }
}

/// Split `Tier N ...` into the tier number and the rest of the line.
fn split_tier_prefix(line: &str) -> (Option<u32>, &str) {
    match RE_TIER_PREFIX.captures(line) {
        Some(caps) => match (caps.get(0), parse_tier(&caps[1])) {
            (Some(whole), Some(tier)) => (Some(tier), &line[whole.end()..]),
            _ => (None, line),
        },
        None => (None, line),
    }
}

/// Tier number in arabic or roman notation.
fn parse_tier(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return Some(n);
    }

    let mut total = 0u32;
    let mut prev = 0u32;
    for c in token.chars().rev() {
        let value = match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            prev = value;
        }
    }
    (total > 0).then_some(total)
}

fn is_header(line: &str) -> bool {
    RE_HEADER.is_match(line)
        && !line.contains(':')
        && (!find_mentions(line).is_empty() || contains_limit_label(line))
}

/// Coverage columns named by a header line.
fn header_columns(line: &str) -> Vec<Column> {
    enum Token {
        Coverage(CoverageType),
        Limit(LimitName),
    }

    let mut tokens: Vec<(usize, Token)> = find_mentions(line)
        .into_iter()
        .map(|m| (m.range.start, Token::Coverage(m.coverage)))
        .chain(
            find_limit_labels(line)
                .into_iter()
                .map(|l| (l.range.start, Token::Limit(l.name))),
        )
        .collect();
    tokens.sort_by_key(|(start, _)| *start);

    let mut columns: Vec<Column> = Vec::new();
    for (_, token) in tokens {
        match token {
            Token::Coverage(coverage) => columns.push(Column {
                coverage: Some(coverage),
                label: None,
            }),
            Token::Limit(name) => {
                let implied = name.implied_coverage();
                match columns.last_mut() {
                    Some(last)
                        if last.label.is_none()
                            && (implied.is_none() || last.coverage.is_none() || last.coverage == implied) =>
                    {
                        last.label = Some(name);
                        last.coverage = last.coverage.or(implied);
                    },
                    Some(last) => {
                        let coverage = implied.or(last.coverage);
                        columns.push(Column {
                            coverage,
                            label: Some(name),
                        });
                    },
                    None => columns.push(Column {
                        coverage: implied,
                        label: Some(name),
                    }),
                }
            },
        }
    }

    // A bare limit column belongs to the nearest coverage after it, else before it.
    for idx in 0..columns.len() {
        if columns[idx].coverage.is_none() {
            columns[idx].coverage = columns[idx + 1..]
                .iter()
                .find_map(|c| c.coverage)
                .or_else(|| columns[..idx].iter().rev().find_map(|c| c.coverage));
        }
    }

    columns
}

/// Distribute a row's bare amounts over the header columns.
///
/// With one amount per column, consecutive columns of the same coverage form
/// one row. Otherwise the amounts stay together under the header's single
/// coverage, or under no coverage when the header names several.
fn assign_columns(columns: &[Column], amounts: RawAmounts) -> Vec<(Option<CoverageType>, RawAmounts)> {
    let single_coverage = {
        let mut coverages = columns.iter().filter_map(|c| c.coverage);
        match coverages.next() {
            Some(first) if coverages.all(|c| c == first) => Some(first),
            _ => None,
        }
    };

    let lexemes = match amounts {
        RawAmounts::Named(pairs) => {
            let implied = pairs.iter().find_map(|(name, _)| name.implied_coverage());
            return vec![(implied.or(single_coverage), RawAmounts::Named(pairs))];
        },
        RawAmounts::Positional(lexemes) => lexemes,
    };

    if columns.is_empty() || columns.len() != lexemes.len() {
        return vec![(single_coverage, RawAmounts::Positional(lexemes))];
    }

    let mut groups: Vec<(Option<CoverageType>, Vec<(Option<LimitName>, String)>)> = Vec::new();
    for (column, lexeme) in columns.iter().zip(lexemes) {
        match groups.last_mut() {
            Some((coverage, members)) if *coverage == column.coverage => members.push((column.label, lexeme)),
            _ => groups.push((column.coverage, vec![(column.label, lexeme)])),
        }
    }

    groups
        .into_iter()
        .map(|(coverage, members)| {
            let amounts = if members.iter().all(|(label, _)| label.is_some()) {
                RawAmounts::Named(
                    members
                        .into_iter()
                        .filter_map(|(label, lexeme)| label.map(|name| (name, lexeme)))
                        .collect(),
                )
            } else {
                RawAmounts::Positional(members.into_iter().map(|(_, lexeme)| lexeme).collect())
            };
            (coverage, amounts)
        })
        .collect()
}
