//! Contractor-keyed `label: value` list recognizer.
//!
//! ```text
//! Prime Subcontractor: ABC Mechanical
//! General Liability
//!   Each Occurrence: $1,000,000
//!   General Aggregate: $2,000,000
//! Automobile Liability
//!   Combined Single Limit: $1,000,000
//! ```
//!
//! Limits belong to the most recent contractor heading. A limit's coverage
//! is taken from a keyword on its own line first, then from the label itself
//! (`Combined Single Limit` can only be auto), then from the last coverage
//! heading. Labels wrapped onto the line before their value are rejoined.

use super::{is_plausible_trade, trim_label, MatchResult, PatternMatcher, RawAmounts, RawRow};
use crate::coverage::{classify, find_mentions, CoverageType};
use crate::currency::find_amount_lexemes;
use crate::flags::RowFlags;
use crate::limits::{contains_limit_label, find_limit_labels, LimitName};
use crate::normalizer::NormalizedText;
use crate::requirement::PatternKind;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

lazy_static! {
    static ref RE_KEYED_ENTITY: Regex = Regex::new(
        r"(?i)^(?:prime\s+)?(?:sub)?contractor(?:\s*/\s*trade)?(?:\s+name)?\s*[:-]\s*(.+)$"
    )
    .unwrap();
    static ref RE_TRADE_ENTITY: Regex =
        Regex::new(r"(?i)^(?:trade|scope(?:\s+of\s+work)?)\s*[:-]\s*(.+)$").unwrap();
    static ref RE_SUFFIX_ENTITY: Regex =
        Regex::new(r"(?i)^((?:[\w&/'.-]+\s+){0,5}(?:sub)?contractors?)\s*:?$").unwrap();
    static ref RE_COLON_ENTITY: Regex = Regex::new(r"^(.{1,60}):$").unwrap();
    static ref RE_ENTITY_KEY: Regex = Regex::new(r"(?i)\b(?:sub)?contractors?\b|\btrades?\b").unwrap();
}

type CoverageRef = (CoverageType, Option<String>);

/// Recognizer for contractor-keyed limit lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimeSubcontractorMatcher;

impl PatternMatcher for PrimeSubcontractorMatcher {
    fn kind(&self) -> PatternKind {
        PatternKind::PrimeSubcontractor
    }

    fn try_match(&self, text: &NormalizedText) -> Option<MatchResult> {
        let mut list = ListState::default();
        for (number, line) in join_wrapped_labels(text) {
            list.feed(number, &line);
        }

        let (saw_entity, rows) = list.finish();
        if !saw_entity || rows.is_empty() {
            log::debug!(
                "primeSubcontractor: precondition failed (entity: {}, rows: {})",
                saw_entity,
                rows.len()
            );
            return None;
        }

        log::debug!("primeSubcontractor: {} rows", rows.len());
        Some(MatchResult {
            kind: PatternKind::PrimeSubcontractor,
            rows,
        })
    }
}

/// Rejoin a label-only line with the value line that follows it.
fn join_wrapped_labels(text: &NormalizedText) -> Vec<(usize, String)> {
    let lines: Vec<(usize, &str)> = text.numbered_lines().collect();
    let mut logical = Vec::with_capacity(lines.len());

    let mut idx = 0;
    while idx < lines.len() {
        let (number, line) = lines[idx];
        if find_amount_lexemes(line).is_empty() && contains_limit_label(line) && entity_heading(line).is_none() {
            if let Some((next_number, next)) = lines.get(idx + 1) {
                if !find_amount_lexemes(next).is_empty() {
                    logical.push((*next_number, format!("{} {}", line, next)));
                    idx += 2;
                    continue;
                }
            }
        }
        logical.push((number, line.to_string()));
        idx += 1;
    }

    logical
}

/// Contractor or trade name introduced by a heading line.
fn entity_heading(line: &str) -> Option<String> {
    let keyed = RE_KEYED_ENTITY
        .captures(line)
        .or_else(|| RE_TRADE_ENTITY.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| trim_label(m.as_str()).to_string());
    if let Some(name) = keyed {
        return is_plausible_trade(&name).then_some(name);
    }

    if let Some(caps) = RE_SUFFIX_ENTITY.captures(line) {
        return Some(trim_label(&caps[1]).to_string());
    }

    None
}

/// `Name:` on a line of its own.
fn colon_entity(line: &str) -> Option<String> {
    let caps = RE_COLON_ENTITY.captures(line)?;
    let name = trim_label(&caps[1]);
    (is_plausible_trade(name) && find_mentions(name).is_empty()).then(|| name.to_string())
}

/// A line that only names a coverage ("General Liability", "Professional
/// Liability (claims-made)").
fn coverage_heading(line: &str) -> Option<CoverageRef> {
    let coverage = classify(line)?;
    let mentions = find_mentions(line);

    let mut remainder = String::with_capacity(line.len());
    let mut cursor = 0;
    for mention in &mentions {
        remainder.push_str(&line[cursor..mention.range.start]);
        remainder.push(' ');
        cursor = mention.range.end;
    }
    remainder.push_str(&line[cursor..]);

    let extra_words = remainder
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphanumeric))
        .count();
    if extra_words > 4 {
        return None;
    }

    let label = mentions.first().map(|m| line[m.range.clone()].to_string());
    Some((coverage, label))
}

/// Consecutive amounts joined only by separators.
fn amount_runs(line: &str) -> Vec<(Range<usize>, Vec<&str>)> {
    let mut runs: Vec<(Range<usize>, Vec<&str>)> = Vec::new();
    for (range, lexeme) in find_amount_lexemes(line) {
        match runs.last_mut() {
            Some((run, members)) if matches!(line[run.end..range.start].trim(), "" | "|") => {
                run.end = range.end;
                members.push(lexeme);
            },
            _ => runs.push((range, vec![lexeme])),
        }
    }
    runs
}

fn labels_in(text: &str) -> Vec<LimitName> {
    find_limit_labels(text).into_iter().map(|m| m.name).collect()
}

#[derive(Debug, Default)]
struct ListState {
    rows: Vec<RawRow>,
    saw_entity: bool,
    entity: Option<String>,
    block_start: usize,
    block_flags: RowFlags,
    sticky: Option<CoverageRef>,
    sticky_flags: RowFlags,
    groups: HashMap<CoverageType, usize>,
    last_group: Option<usize>,
    floating: Vec<(usize, LimitName, String, RowFlags)>,
}

impl ListState {
    fn feed(&mut self, number: usize, line: &str) {
        let runs = amount_runs(line);
        if runs.is_empty() {
            self.feed_heading(line);
            return;
        }

        let keys: Vec<&str> = (0..runs.len())
            .map(|idx| {
                let start = if idx == 0 { 0 } else { runs[idx - 1].0.end };
                &line[start..runs[idx].0.start]
            })
            .collect();
        let tails: Vec<&str> = (0..runs.len())
            .map(|idx| {
                let end = runs.get(idx + 1).map_or(line.len(), |(range, _)| range.start);
                &line[runs[idx].0.end..end]
            })
            .collect();

        let leading = runs
            .iter()
            .zip(&keys)
            .all(|((_, lexemes), key)| labels_in(key).len() >= lexemes.len());
        let trailing = !leading
            && runs
                .iter()
                .zip(&tails)
                .all(|((_, lexemes), tail)| labels_in(tail).len() == lexemes.len());
        let line_flags = RowFlags::scan(line);

        for (idx, (_, lexemes)) in runs.iter().enumerate() {
            let key = keys[idx];
            let explicit: Option<CoverageRef> = find_mentions(key)
                .last()
                .map(|m| (m.coverage, Some(key[m.range.clone()].to_string())));
            if explicit.is_some() {
                self.sticky = explicit.clone();
                self.sticky_flags = RowFlags::default();
            }

            let names = if trailing {
                labels_in(tails[idx])
            } else {
                let labels = labels_in(key);
                if labels.len() >= lexemes.len() {
                    labels[labels.len() - lexemes.len()..].to_vec()
                } else {
                    Vec::new()
                }
            };

            if names.is_empty() {
                self.push_positional(number, key, explicit, lexemes, line_flags);
            } else {
                for (name, lexeme) in names.into_iter().zip(lexemes) {
                    self.push_named(number, name, lexeme, explicit.clone(), line_flags);
                }
            }
        }
    }

    fn feed_heading(&mut self, line: &str) {
        if let Some(entity) = entity_heading(line) {
            self.open_entity(entity);
        } else if let Some(coverage) = coverage_heading(line) {
            self.sticky = Some(coverage);
            self.sticky_flags = RowFlags::scan(line);
        } else if let Some(entity) = colon_entity(line) {
            self.open_entity(entity);
        } else {
            self.block_flags.inherit(&RowFlags::scan(line));
        }
    }

    fn open_entity(&mut self, entity: String) {
        self.close_block();
        log::trace!("primeSubcontractor: entity '{}'", entity);
        self.saw_entity = true;
        self.entity = Some(entity);
        self.sticky = None;
        self.sticky_flags = RowFlags::default();
    }

    fn close_block(&mut self) {
        let floating = std::mem::take(&mut self.floating);
        if !floating.is_empty() {
            match self.last_group {
                Some(idx) => {
                    for (_, name, lexeme, flags) in floating {
                        self.append_named(idx, name, lexeme, flags);
                    }
                },
                None => {
                    let line = floating[0].0;
                    let mut row = self.new_row(line, None, RawAmounts::Named(Vec::new()), RowFlags::default());
                    for (_, name, lexeme, flags) in floating {
                        if let RawAmounts::Named(pairs) = &mut row.amounts {
                            pairs.push((name, lexeme));
                        }
                        row.flags.inherit(&flags);
                    }
                    self.rows.push(row);
                },
            }
        }

        for row in &mut self.rows[self.block_start..] {
            row.flags.inherit(&self.block_flags);
        }
        self.block_start = self.rows.len();
        self.block_flags = RowFlags::default();
        self.groups.clear();
        self.last_group = None;
    }

    fn new_row(&self, line: usize, coverage: Option<CoverageRef>, amounts: RawAmounts, flags: RowFlags) -> RawRow {
        let (coverage_hint, coverage_label) = match coverage {
            Some((coverage, label)) => (Some(coverage), label),
            None => (None, None),
        };
        let mut flags = flags;
        if coverage_hint.is_some() && coverage_hint == self.sticky.as_ref().map(|(c, _)| *c) {
            flags.inherit(&self.sticky_flags);
        }

        RawRow {
            line,
            tier: None,
            trade: self.entity.clone(),
            coverage_label,
            coverage_hint,
            amounts,
            flags,
        }
    }

    fn append_named(&mut self, idx: usize, name: LimitName, lexeme: String, flags: RowFlags) {
        let row = &mut self.rows[idx];
        if let RawAmounts::Named(pairs) = &mut row.amounts {
            pairs.push((name, lexeme));
        }
        row.flags.inherit(&flags);
    }

    fn push_named(
        &mut self,
        number: usize,
        name: LimitName,
        lexeme: &str,
        explicit: Option<CoverageRef>,
        flags: RowFlags,
    ) {
        let coverage = explicit
            .or_else(|| name.implied_coverage().map(|coverage| (coverage, None)))
            .or_else(|| self.sticky.clone());

        let Some(coverage) = coverage else {
            self.floating.push((number, name, lexeme.to_string(), flags));
            return;
        };

        let idx = match self.groups.get(&coverage.0) {
            Some(idx) => *idx,
            None => {
                let key = coverage.0;
                let row = self.new_row(number, Some(coverage), RawAmounts::Named(Vec::new()), RowFlags::default());
                self.rows.push(row);
                let idx = self.rows.len() - 1;
                self.groups.insert(key, idx);
                idx
            },
        };

        for (_, floating_name, floating_lexeme, floating_flags) in std::mem::take(&mut self.floating) {
            self.append_named(idx, floating_name, floating_lexeme, floating_flags);
        }
        self.append_named(idx, name, lexeme.to_string(), flags);
        self.last_group = Some(idx);
    }

    fn push_positional(
        &mut self,
        number: usize,
        key: &str,
        explicit: Option<CoverageRef>,
        lexemes: &[&str],
        flags: RowFlags,
    ) {
        let amounts = RawAmounts::Positional(lexemes.iter().map(|s| s.to_string()).collect());

        if let Some(coverage) = explicit.or_else(|| self.sticky.clone()) {
            let row = self.new_row(number, Some(coverage), amounts, flags);
            self.rows.push(row);
            return;
        }

        let name = trim_label(key);
        if is_plausible_trade(name) && RE_ENTITY_KEY.is_match(name) {
            // "Prime Subcontractor: $5,000,000" names the contractor, not a limit
            self.saw_entity = true;
            let mut row = self.new_row(number, None, amounts, flags);
            row.trade = Some(name.to_string());
            self.rows.push(row);
        } else if self.entity.is_some() {
            let row = self.new_row(number, None, amounts, flags);
            self.rows.push(row);
        } else {
            log::debug!("primeSubcontractor: line {} has amounts with no owner", number);
        }
    }

    fn finish(mut self) -> (bool, Vec<RawRow>) {
        self.close_block();
        (self.saw_entity, self.rows)
    }
}
