//! Source text wrapper shared by the lexer, parser and translator for
//! position reporting.

use once_cell::unsync::OnceCell;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// A 1-indexed line/column pair derived from a byte offset.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A wrapper around the raw query text giving O(log n) byte-offset to
/// `Position` conversion and one-line excerpts for diagnostics.
pub struct Code<'c> {
    pub value: &'c str,
    line_breaks: OnceCell<Vec<usize>>,
}

impl<'c> From<&'c str> for Code<'c> {
    fn from(value: &'c str) -> Self {
        Code::new(value)
    }
}

impl<'c> Code<'c> {
    pub fn new(value: &'c str) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    fn line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .bytes()
                .enumerate()
                .filter_map(|(index, b)| if b == b'\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Resolve a byte offset into the source to a 1-indexed line/column pair.
    pub fn position_of(&self, pointer: usize) -> Position {
        let line_breaks = self.line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };
        if index == 0 {
            Position::new(1, pointer + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            Position::new(index + 1, pointer - break_point + 1)
        }
    }

    /// Return the full source line containing `pointer`, for error excerpts.
    pub fn line_excerpt(&self, pointer: usize) -> &'c str {
        let line_breaks = self.line_breaks();
        let index = match line_breaks.binary_search(&pointer) {
            Ok(index) | Err(index) => index,
        };
        let start = if index == 0 {
            0
        } else {
            line_breaks[index - 1] + 1
        };
        let end = line_breaks.get(index).copied().unwrap_or(self.value.len());
        &self.value[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_position() {
        let code = Code::new("foo bar");
        assert_eq!(code.position_of(4), Position::new(1, 5));
    }

    #[test]
    fn position_after_newline() {
        let code = Code::new("foo\nbar baz");
        assert_eq!(code.position_of(8), Position::new(2, 5));
    }

    #[test]
    fn excerpt_picks_failing_line() {
        let code = Code::new("title:foo\nbody:(bar");
        assert_eq!(code.line_excerpt(15), "body:(bar");
    }
}
