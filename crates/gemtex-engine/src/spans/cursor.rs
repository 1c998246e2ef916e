/// A byte cursor over a single string, used to scan inline protected spans.
///
/// Only ever stops on ASCII delimiters, so every position it reports is a
/// valid char boundary for slicing.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The string being scanned.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s`.
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns the current byte position.
    pub fn pos(&self) -> usize {
        self.i
    }

    /// Returns true if at end of string.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Peeks at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Peeks at the byte immediately before the current position.
    pub fn peek_back(&self) -> Option<u8> {
        self.i
            .checked_sub(1)
            .and_then(|i| self.s.as_bytes().get(i).copied())
    }

    /// Advances by one byte, returning the consumed byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    /// Moves the cursor forward until `stop` matches the current byte or EOF.
    pub fn bump_until(&mut self, stop: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek() {
            if stop(b) {
                break;
            }
            self.i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello");
        assert_eq!(cur.pos(), 0);
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some(b'h'));
        assert_eq!(cur.peek_back(), None);
        assert_eq!(cur.bump(), Some(b'h'));
        assert_eq!(cur.peek_back(), Some(b'h'));
        assert_eq!(cur.pos(), 1);
    }

    #[test]
    fn bump_until_stops_on_delimiter() {
        let mut cur = Cursor::new("abc`def");
        cur.bump_until(|b| b == b'`');
        assert_eq!(cur.pos(), 3);
        assert_eq!(cur.peek(), Some(b'`'));
    }

    #[test]
    fn bump_until_runs_to_eof() {
        let mut cur = Cursor::new("abc");
        cur.bump_until(|b| b == b'`');
        assert!(cur.eof());
        assert_eq!(cur.bump(), None);
    }
}
