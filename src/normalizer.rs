//! Text normalization ahead of pattern matching.
//!
//! PDF text extraction produces a mess of typographic variants: en dashes,
//! non-breaking spaces, curly apostrophes, tabs standing in for column gaps.
//! The normalizer folds all of that into a small, predictable alphabet so the
//! matchers only need to recognise one spelling of everything.
//!
//! Guarantees:
//! - line boundaries are preserved (line `n` of the output is line `n` of the
//!   input, so row line numbers stay meaningful for audit)
//! - runs of whitespace inside a line collapse to a single space
//! - `/`, `-`, `,` and `|` sitting between two dollar figures, or between two
//!   limit labels, become the canonical [`SEPARATOR`]
//! - digits, commas inside figures, and decimal points are never touched
//!
//! Normalizing already-normalized text is a no-op.

use crate::currency::RE_MONEY_TOKEN;
use crate::limits::find_limit_labels;
use std::ops::Range;

/// Canonical separator token between figures or between limit labels.
pub const SEPARATOR: &str = " | ";

/// Text after normalization, kept line by line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText {
    lines: Vec<String>,
}

impl NormalizedText {
    /// Normalized lines, including blank ones.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Non-blank lines with their 1-based source line numbers.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
            .map(|(idx, line)| (idx + 1, line.as_str()))
    }

    /// True when every line is blank.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.is_empty())
    }

    /// Joined text with `\n` line endings.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Stateless text normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Normalize a whole document.
    ///
    /// # Examples
    ///
    /// ```
    /// use coi_program_parser::normalizer::TextNormalizer;
    ///
    /// let text = TextNormalizer::normalize("Electrical\tGL  $1,000,000 /$2,000,000\r\nPlumbing");
    /// assert_eq!(text.lines()[0], "Electrical GL $1,000,000 | $2,000,000");
    /// assert_eq!(text.lines()[1], "Plumbing");
    /// ```
    pub fn normalize(raw: &str) -> NormalizedText {
        let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
        NormalizedText {
            lines: unified.split('\n').map(Self::normalize_line).collect(),
        }
    }

    /// Normalize a single line.
    pub fn normalize_line(line: &str) -> String {
        let folded: String = line.chars().map(fold_char).collect();
        let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");

        let money: Vec<Range<usize>> = RE_MONEY_TOKEN.find_iter(&collapsed).map(|m| m.range()).collect();
        let with_money_separators = unify_gaps(&collapsed, &money);

        let labels: Vec<Range<usize>> = find_limit_labels(&with_money_separators)
            .into_iter()
            .map(|m| m.range)
            .collect();
        unify_gaps(&with_money_separators, &labels)
    }
}

/// Map typographic variants onto their ASCII equivalent.
fn fold_char(c: char) -> char {
    match c {
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
        '\u{2018}' | '\u{2019}' | '\u{02BC}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2044}' | '\u{2215}' => '/',
        '\u{00A6}' | '\u{2502}' | '\u{2503}' => '|',
        '\u{FF04}' => '$',
        '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{000C}' | '\t' => ' ',
        other => other,
    }
}

fn is_separator_gap(gap: &str) -> bool {
    match gap.trim() {
        "/" | "," | "|" => true,
        // " -$500" is a negative figure, not a separator
        "-" => gap.starts_with(char::is_whitespace) == gap.ends_with(char::is_whitespace),
        _ => false,
    }
}

/// Rewrite separator-only gaps between consecutive tokens.
fn unify_gaps(line: &str, tokens: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut cursor = 0;

    for pair in tokens.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if is_separator_gap(&line[left.end..right.start]) {
            out.push_str(&line[cursor..left.end]);
            out.push_str(SEPARATOR);
            cursor = right.start;
        }
    }

    out.push_str(&line[cursor..]);
    out
}
