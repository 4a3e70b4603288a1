//! Parser configuration for controlling input bounds and fallback output.

use crate::error::{Error, Result};
use crate::limits::LimitSchedule;
use crate::requirement::ParseIssue;

/// Default input bound: 1 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// What to do with input over [`ParserOptions::max_input_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Fail with [`Error::OversizedInput`]
    #[default]
    Reject,
    /// Keep whole lines up to the bound and record a `Truncated` issue
    Truncate,
}

/// Parser options.
///
/// # Example
///
/// ```
/// use coi_program_parser::parser_config::{OversizePolicy, ParserOptions};
///
/// // Reject oversize input, no placeholder rows (default)
/// let strict = ParserOptions::strict();
///
/// // Truncate oversize input, placeholder row for unrecognized text
/// let lenient = ParserOptions::lenient();
///
/// // Custom configuration
/// let custom = ParserOptions::default()
///     .with_max_input_bytes(64 * 1024)
///     .with_oversize(OversizePolicy::Truncate);
/// assert_eq!(custom.max_input_bytes, 64 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Maximum input size in bytes
    ///
    /// Default: 1 MiB. Set to 0 to disable check.
    pub max_input_bytes: usize,

    /// Handling of input over `max_input_bytes`
    pub oversize: OversizePolicy,

    /// Emit one empty placeholder row when no pattern matches
    pub emit_placeholder: bool,

    /// Positional layouts and ordering constraints per coverage type
    pub schedule: LimitSchedule,
}

impl Default for ParserOptions {
    /// Default configuration: strict mode
    fn default() -> Self {
        Self::strict()
    }
}

impl ParserOptions {
    /// Strict mode: oversize input is an error, unrecognized text yields no rows.
    pub fn strict() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            oversize: OversizePolicy::Reject,
            emit_placeholder: false,
            schedule: LimitSchedule::default(),
        }
    }

    /// Lenient mode: oversize input is truncated, unrecognized text yields a
    /// placeholder row.
    pub fn lenient() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            oversize: OversizePolicy::Truncate,
            emit_placeholder: true,
            schedule: LimitSchedule::default(),
        }
    }

    /// Set the input bound (0 disables it).
    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    /// Set the oversize handling.
    pub fn with_oversize(mut self, oversize: OversizePolicy) -> Self {
        self.oversize = oversize;
        self
    }

    /// Enable or disable the placeholder row.
    pub fn with_placeholder(mut self, emit: bool) -> Self {
        self.emit_placeholder = emit;
        self
    }

    /// Replace the limit schedule.
    pub fn with_schedule(mut self, schedule: LimitSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Apply the input bound.
    ///
    /// Returns the text to parse and, when it was cut, the issue to record.
    pub fn bound_input<'a>(&self, raw: &'a str) -> Result<(&'a str, Option<ParseIssue>)> {
        if self.max_input_bytes == 0 || raw.len() <= self.max_input_bytes {
            return Ok((raw, None));
        }

        match self.oversize {
            OversizePolicy::Reject => Err(Error::OversizedInput {
                size: raw.len(),
                limit: self.max_input_bytes,
            }),
            OversizePolicy::Truncate => {
                let cut = truncation_point(raw, self.max_input_bytes);
                log::warn!("input truncated from {} to {} bytes", raw.len(), cut);
                Ok((
                    &raw[..cut],
                    Some(ParseIssue::Truncated {
                        original_bytes: raw.len(),
                        kept_bytes: cut,
                    }),
                ))
            },
        }
    }
}

/// Byte offset to cut at: just past the last newline within `max` bytes, or
/// the last char boundary when the prefix holds no newline.
fn truncation_point(raw: &str, max: usize) -> usize {
    let mut boundary = max.min(raw.len());
    while !raw.is_char_boundary(boundary) {
        boundary -= 1;
    }

    match raw[..boundary].rfind('\n') {
        Some(newline) => newline + 1,
        None => boundary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict() {
        let options = ParserOptions::default();
        assert_eq!(options.oversize, OversizePolicy::Reject);
        assert!(!options.emit_placeholder);
        assert_eq!(options.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
    }

    #[test]
    fn test_lenient_preset() {
        let options = ParserOptions::lenient();
        assert_eq!(options.oversize, OversizePolicy::Truncate);
        assert!(options.emit_placeholder);
    }

    #[test]
    fn test_within_bound_untouched() {
        let options = ParserOptions::strict().with_max_input_bytes(10);
        let (text, issue) = options.bound_input("short").unwrap();
        assert_eq!(text, "short");
        assert!(issue.is_none());
    }

    #[test]
    fn test_reject_oversize() {
        let options = ParserOptions::strict().with_max_input_bytes(4);
        match options.bound_input("too long") {
            Err(Error::OversizedInput { size, limit }) => {
                assert_eq!(size, 8);
                assert_eq!(limit, 4);
            },
            other => panic!("expected OversizedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_truncate_at_line_boundary() {
        let options = ParserOptions::lenient().with_max_input_bytes(12);
        let (text, issue) = options.bound_input("line one\nline two\nline three").unwrap();
        assert_eq!(text, "line one\n");
        assert_eq!(
            issue,
            Some(ParseIssue::Truncated {
                original_bytes: 28,
                kept_bytes: 9
            })
        );
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let options = ParserOptions::lenient().with_max_input_bytes(2);
        let (text, _) = options.bound_input("a\u{00e9}bc").unwrap();
        assert_eq!(text, "a");
    }

    #[test]
    fn test_zero_disables_bound() {
        let options = ParserOptions::strict().with_max_input_bytes(0);
        assert!(options.bound_input(&"x".repeat(10_000)).is_ok());
    }
}
