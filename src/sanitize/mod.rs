//! Input sanitization for audit-finding text.
//!
//! [`Sanitizer::sanitize`] is a pure function: it never logs, so callers decide what metadata
//! (length, outcome) to record. Finding text itself must never reach a log.


use thiserror::Error;

use crate::constants::DEFAULT_MAX_INPUT_LENGTH;

/// Reasons a finding is refused before it reaches the index or the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectedInput {
    /// No text, or nothing left once control characters and surrounding whitespace are gone.
    #[error("input is empty")]
    Empty,

    /// Raw input exceeds the configured cap.
    #[error("input length {length} exceeds the maximum of {max} characters")]
    TooLong { length: usize, max: usize },
}

/// Strips control characters and enforces the input-length cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    max_length: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_LENGTH)
    }
}

impl Sanitizer {
    /// Creates a sanitizer accepting at most `max_length` characters.
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Returns the configured character cap.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Cleans `text` or explains why it was refused.
    ///
    /// Length is measured in characters of the raw input, before anything is removed.
    pub fn sanitize(&self, text: &str) -> Result<String, RejectedInput> {
        if text.is_empty() {
            return Err(RejectedInput::Empty);
        }

        let length = text.chars().count();
        if length > self.max_length {
            return Err(RejectedInput::TooLong {
                length,
                max: self.max_length,
            });
        }

        let cleaned: String = text.chars().filter(|c| !is_stripped_control(*c)).collect();
        let trimmed = cleaned.trim();

        if trimmed.is_empty() {
            return Err(RejectedInput::Empty);
        }

        Ok(trimmed.to_string())
    }
}

/// ASCII controls other than tab, line feed and carriage return.
#[inline]
pub fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}' | '\u{0B}'..='\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'
    )
}
