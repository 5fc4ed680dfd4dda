use regex::{Captures, Regex};

/// Mutable scan position over an immutable source buffer.
///
/// All matching is anchored at the current position. A failed attempt never
/// moves the position; multi-step attempts roll back explicitly through
/// [`mark`](ParseContext::mark) and [`set_index`](ParseContext::set_index).
pub struct ParseContext<'a> {
    input: &'a str,
    index: usize,
}

impl<'a> ParseContext<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, index: 0 }
    }

    /// Start scanning at an arbitrary byte offset, clamped to the buffer.
    pub fn at(input: &'a str, index: usize) -> Self {
        Self {
            input,
            index: index.min(input.len()),
        }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Save the current position for a later [`set_index`](Self::set_index).
    pub fn mark(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, mark: usize) {
        self.index = mark.min(self.input.len());
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.index..]
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.input.len()
    }

    pub fn skip_whitespace(&mut self) {
        let trimmed = self.remaining().trim_start();
        self.index = self.input.len() - trimmed.len();
    }

    /// Consume `literal` if the input continues with it.
    pub fn try_literal(&mut self, literal: &str) -> bool {
        if self.remaining().starts_with(literal) {
            self.index += literal.len();
            true
        } else {
            false
        }
    }

    /// Attempt an anchored regex match at the current position.
    ///
    /// On success the position advances past the match and the captures are
    /// returned; on failure the position is unchanged. Patterns must be
    /// written with a leading `^`; a match that does not start at the current
    /// position is treated as no match.
    pub fn try_pattern(&mut self, pattern: &Regex) -> Option<Captures<'a>> {
        let captures = pattern.captures(self.remaining())?;
        let whole = captures.get(0).filter(|m| m.start() == 0)?;
        self.index += whole.end();
        Some(captures)
    }

    /// Non-consuming variant of [`try_pattern`](Self::try_pattern), used for
    /// "must not be followed by" checks.
    pub fn looking_at(&self, pattern: &Regex) -> bool {
        pattern
            .captures(self.remaining())
            .and_then(|c| c.get(0))
            .is_some_and(|m| m.start() == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+").unwrap());
    static LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]+").unwrap());

    #[test]
    fn failed_attempts_leave_index_unchanged() {
        let mut ctx = ParseContext::new("abc123");
        assert!(ctx.try_pattern(&DIGITS).is_none());
        assert_eq!(ctx.index(), 0);
        assert!(!ctx.try_literal("xyz"));
        assert_eq!(ctx.index(), 0);
    }

    #[test]
    fn successful_match_advances() {
        let mut ctx = ParseContext::new("abc123");
        let caps = ctx.try_pattern(&LETTERS).unwrap();
        assert_eq!(&caps[0], "abc");
        assert_eq!(ctx.index(), 3);
        assert!(ctx.try_pattern(&DIGITS).is_some());
        assert!(ctx.is_eof());
    }

    #[test]
    fn mark_and_reset_round_trip() {
        let mut ctx = ParseContext::new("abc123");
        let mark = ctx.mark();
        assert!(ctx.try_pattern(&LETTERS).is_some());
        assert!(ctx.try_pattern(&DIGITS).is_some());
        ctx.set_index(mark);
        assert_eq!(ctx.index(), 0);
        assert_eq!(ctx.remaining(), "abc123");
    }

    #[test]
    fn looking_at_never_consumes() {
        let ctx = ParseContext::new("123abc");
        assert!(ctx.looking_at(&DIGITS));
        assert!(!ctx.looking_at(&LETTERS));
        assert_eq!(ctx.index(), 0);
    }

    #[test]
    fn skip_whitespace_and_eof() {
        let mut ctx = ParseContext::new("   x");
        ctx.skip_whitespace();
        assert_eq!(ctx.remaining(), "x");
        assert!(ctx.try_literal("x"));
        assert!(ctx.is_eof());
    }
}
