//! Dollar-amount recognition and parsing.
//!
//! Two layers live here:
//!
//! - **Lexing**: regexes that locate amount-like tokens in a normalized line.
//!   Lexing is deliberately loose (it accepts `-$500`, `$1,OOO,000`, `($2M`)
//!   so that bad tokens reach the strict parser and get rejected there
//!   instead of being skipped over.
//! - **Parsing**: a `nom` grammar that accepts exactly one well-formed figure
//!   and converts it to whole dollars, applying magnitude suffixes and the
//!   document-level [`AmountScale`].
//!
//! Amounts are always whole US dollars (`u64`). Fractional cents are
//! truncated.

use crate::error::AmountError;
use lazy_static::lazy_static;
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::{char, digit1, space0},
    combinator::{eof, map, opt, recognize},
    multi::many1,
    sequence::{pair, preceded, tuple},
    IResult,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Whole US dollars.
pub type Dollars = u64;

lazy_static! {
    /// Amount-like lexemes, loose enough to capture malformed tokens
    static ref RE_AMOUNT_LEXEME: Regex = Regex::new(
        r"(?x)
        \(?-?\$\s?\d[\w,.]*(?:\s(?i:million|thousand|mil)\b)?\)?
        | \(?-?\b\d{1,3}(?:,\d{3})+(?:\.\d+)?(?:\s?(?:MM|M|K|(?i:million|thousand|mil))\b)?\)?
        | \b\d+(?:\.\d+)?\s?(?:MM|M|K|(?i:million|thousand|mil))\b
        "
    )
    .unwrap();

    /// Well-formed money tokens (no sign, no parentheses), used to find
    /// separators sitting between two figures
    pub(crate) static ref RE_MONEY_TOKEN: Regex = Regex::new(
        r"(?x)
        \$\s?\d{1,3}(?:,\d{3})+(?:\.\d+)?(?:\s?(?:MM|M|K|(?i:million|thousand|mil))\b)?
        | \$\s?\d+(?:\.\d+)?(?:\s?(?:MM|M|K|(?i:million|thousand|mil))\b)?
        | \b\d{1,3}(?:,\d{3})+(?:\.\d+)?(?:\s?(?:MM|M|K|(?i:million|thousand|mil))\b)?
        | \b\d+(?:\.\d+)?\s?(?:MM|M|K|(?i:million|thousand|mil))\b
        "
    )
    .unwrap();

    /// Table captions such as "(in thousands)", "$000's omitted" or
    /// "limits shown in thousands"
    static ref RE_SCALE_THOUSANDS: Regex = Regex::new(
        r"(?ix)
        \(\s*(?:in\s+)?thousands(?:\s+of\s+dollars)?\s*\)
        | \(?\$\s?000'?s(?:\s+omitted)?\)?
        | \b000'?s\s+omitted\b
        | \b(?:amounts|figures|limits|values|dollars)(?:\s+(?:are|shown|stated|expressed|listed))*\s+in\s+thousands\b
        "
    )
    .unwrap();

    /// "(in millions)", "limits stated in millions"
    static ref RE_SCALE_MILLIONS: Regex = Regex::new(
        r"(?ix)
        \(\s*(?:in\s+)?millions(?:\s+of\s+dollars)?\s*\)
        | \b(?:amounts|figures|limits|values|dollars)(?:\s+(?:are|shown|stated|expressed|listed))*\s+in\s+millions\b
        "
    )
    .unwrap();
}

/// Document-level multiplier for figures that carry no explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountScale {
    /// Figures are dollars as written
    #[default]
    Units,
    /// Figures are stated in thousands of dollars
    Thousands,
    /// Figures are stated in millions of dollars
    Millions,
}

impl AmountScale {
    /// Detect a scale caption in the text.
    ///
    /// Only a caption standing on a line of its own counts: once the caption
    /// is removed the line must hold no amounts. Millions wins over
    /// thousands when both appear.
    pub fn detect(text: &str) -> Self {
        let mut scale = AmountScale::Units;
        for line in text.lines() {
            if is_caption(line, &RE_SCALE_MILLIONS) {
                return AmountScale::Millions;
            }
            if is_caption(line, &RE_SCALE_THOUSANDS) {
                scale = AmountScale::Thousands;
            }
        }
        scale
    }

    /// Multiplier applied to unit-less figures.
    pub fn multiplier(self) -> u128 {
        match self {
            AmountScale::Units => 1,
            AmountScale::Thousands => 1_000,
            AmountScale::Millions => 1_000_000,
        }
    }
}

fn is_caption(line: &str, pattern: &Regex) -> bool {
    if !pattern.is_match(line) {
        return false;
    }
    find_amount_lexemes(&pattern.replace_all(line, " ")).is_empty()
}

/// Magnitude suffix written next to a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Thousand,
    Million,
}

impl Unit {
    fn multiplier(self) -> u128 {
        match self {
            Unit::Thousand => 1_000,
            Unit::Million => 1_000_000,
        }
    }
}

/// Locate amount lexemes in a line.
///
/// Trailing sentence punctuation is trimmed off each lexeme so that
/// "limits of $1,000,000." does not produce a dangling decimal point.
pub fn find_amount_lexemes(line: &str) -> Vec<(Range<usize>, &str)> {
    RE_AMOUNT_LEXEME
        .find_iter(line)
        .map(|m| {
            let trimmed = m.as_str().trim_end_matches(['.', ',']);
            (m.start()..m.start() + trimmed.len(), trimmed)
        })
        .filter(|(_, lexeme)| !lexeme.is_empty())
        .collect()
}

/// Whether the text contains at least one well-formed money token.
pub fn contains_money(text: &str) -> bool {
    RE_MONEY_TOKEN.is_match(text)
}

struct Figure<'a> {
    negative: bool,
    integer: &'a str,
    fraction: Option<&'a str>,
    unit: Option<Unit>,
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Integer part: either properly grouped ("1,000,000") or a plain digit run.
fn integer_part(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(
            take_while_m_n(1, 3, is_digit),
            many1(pair(char(','), take_while_m_n(3, 3, is_digit))),
        )),
        digit1,
    ))(input)
}

fn unit(input: &str) -> IResult<&str, Unit> {
    alt((
        map(tag_no_case("million"), |_| Unit::Million),
        map(tag_no_case("thousand"), |_| Unit::Thousand),
        map(tag_no_case("mil"), |_| Unit::Million),
        map(tag_no_case("mm"), |_| Unit::Million),
        map(tag_no_case("m"), |_| Unit::Million),
        map(tag_no_case("k"), |_| Unit::Thousand),
    ))(input)
}

fn figure(input: &str) -> IResult<&str, Figure<'_>> {
    let (input, (open, minus, _, _)) =
        tuple((opt(char('(')), opt(char('-')), opt(char('$')), space0))(input)?;
    let (input, integer) = integer_part(input)?;
    let (input, fraction) = opt(preceded(char('.'), digit1))(input)?;
    let (input, unit) = opt(preceded(space0, unit))(input)?;
    let (input, close) = opt(char(')'))(input)?;
    let (input, _) = eof(input)?;

    Ok((
        input,
        Figure {
            negative: minus.is_some() || (open.is_some() && close.is_some()),
            integer,
            fraction,
            unit,
        },
    ))
}

/// Whether a lexeme carries its own magnitude suffix.
pub fn has_unit_suffix(lexeme: &str) -> bool {
    figure(lexeme.trim())
        .map(|(_, fig)| fig.unit.is_some())
        .unwrap_or(false)
}

/// Parse one amount lexeme into whole dollars.
///
/// Explicit suffixes (`K`, `M`, `MM`, `mil`, `million`, `thousand`) take
/// precedence over the document scale.
///
/// # Examples
///
/// ```
/// use coi_program_parser::currency::{parse_amount, AmountScale};
///
/// assert_eq!(parse_amount("$1,000,000", AmountScale::Units), Ok(1_000_000));
/// assert_eq!(parse_amount("$2.5M", AmountScale::Units), Ok(2_500_000));
/// assert_eq!(parse_amount("$1,000", AmountScale::Thousands), Ok(1_000_000));
/// assert!(parse_amount("-$500", AmountScale::Units).is_err());
/// ```
pub fn parse_amount(lexeme: &str, scale: AmountScale) -> Result<Dollars, AmountError> {
    let token = lexeme.trim();
    let (_, fig) = figure(token).map_err(|_| AmountError::NotNumeric(token.to_string()))?;

    if fig.negative {
        return Err(AmountError::Negative(token.to_string()));
    }

    let overflow = || AmountError::Overflow(token.to_string());

    let digits: String = fig.integer.chars().filter(|c| c.is_ascii_digit()).collect();
    let whole: u128 = digits.parse().map_err(|_| overflow())?;
    let multiplier = fig.unit.map(Unit::multiplier).unwrap_or_else(|| scale.multiplier());

    let mut value = whole.checked_mul(multiplier).ok_or_else(overflow)?;

    if let Some(fraction) = fig.fraction {
        // Anything past 12 places cannot move a whole-dollar result
        let fraction = &fraction[..fraction.len().min(12)];
        let numerator: u128 = fraction.parse().map_err(|_| overflow())?;
        let denominator = 10u128.pow(fraction.len() as u32);
        value = value
            .checked_add(numerator * multiplier / denominator)
            .ok_or_else(overflow)?;
    }

    Dollars::try_from(value).map_err(|_| overflow())
}
