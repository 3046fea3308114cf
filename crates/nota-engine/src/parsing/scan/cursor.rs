/// A cursor for character-by-character scanning with position tracking.
///
/// Operates over one line of content while tracking the absolute byte
/// position in the rope (via `base` offset). The local index `i` always sits
/// on a UTF-8 character boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The line content being scanned (no trailing newline).
    pub s: &'a str,
    /// Base offset in the rope (added to local index for absolute positions).
    pub base: usize,
    /// Current local index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at `i` within `s` with the given base offset.
    pub fn new(s: &'a str, base: usize, i: usize) -> Self {
        Self { s, base, i }
    }

    /// Returns the current absolute byte position (base + local index).
    pub fn pos(&self) -> usize {
        self.base + self.i
    }

    /// Returns true if at end of the line.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// The character immediately before the cursor, if any.
    pub fn prev_char(&self) -> Option<char> {
        self.s[..self.i].chars().next_back()
    }

    /// The remaining, unscanned part of the line.
    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i..].starts_with(pat)
    }

    /// Advances by one character, returning it.
    pub fn bump_char(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.i += c.len_utf8();
        Some(c)
    }

    /// Advances by `n` bytes. The caller guarantees `n` lands on a
    /// character boundary.
    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }
}
