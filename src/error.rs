//! Error taxonomy for lexing, parsing, and translation.
//!
//! Every variant carries a byte offset into the source so the caller can
//! render a `Position` and a one-line excerpt via [`Code`](crate::code::Code).
//! Errors are never swallowed internally; translation in particular is
//! strict and fails fast on the first violated constraint.

use crate::code::Code;
use std::fmt::{self, Display, Formatter};

/// The lexer found a byte that starts none of the recognized token shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalCharacterError {
    pub pointer: usize,
    pub character: char,
}

impl Display for IllegalCharacterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IllegalCharacterError: unexpected character '{}' at byte {}",
            self.character, self.pointer
        )
    }
}

impl std::error::Error for IllegalCharacterError {}

/// The parser could not match the grammar at the given token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSyntaxError {
    pub pointer: usize,
    pub message: String,
    pub expected: Vec<&'static str>,
    pub at_eof: bool,
}

impl ParseSyntaxError {
    pub fn new(pointer: usize, message: impl Into<String>, expected: Vec<&'static str>) -> Self {
        Self {
            pointer,
            message: message.into(),
            expected,
            at_eof: false,
        }
    }

    pub fn eof(pointer: usize, expected: Vec<&'static str>) -> Self {
        Self {
            pointer,
            message: "unexpected end of input".to_string(),
            expected,
            at_eof: true,
        }
    }

    /// Render the error against the original source, including a one-line
    /// excerpt and the resolved line/column.
    pub fn render(&self, code: &Code) -> String {
        let position = code.position_of(self.pointer);
        let excerpt = code.line_excerpt(self.pointer);
        let expected = if self.expected.is_empty() {
            String::new()
        } else {
            format!(" (expected one of: {})", self.expected.join(", "))
        };
        format!(
            "ParseSyntaxError: {}{} at {}\n  {}",
            self.message, expected, position, excerpt
        )
    }
}

impl Display for ParseSyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ParseSyntaxError: {} at byte {}", self.message, self.pointer)
    }
}

impl std::error::Error for ParseSyntaxError {}

/// Umbrella error returned from lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LuceneError {
    IllegalCharacter(IllegalCharacterError),
    Syntax(ParseSyntaxError),
}

impl From<IllegalCharacterError> for LuceneError {
    fn from(value: IllegalCharacterError) -> Self {
        LuceneError::IllegalCharacter(value)
    }
}

impl From<ParseSyntaxError> for LuceneError {
    fn from(value: ParseSyntaxError) -> Self {
        LuceneError::Syntax(value)
    }
}

impl LuceneError {
    pub fn pointer(&self) -> usize {
        match self {
            LuceneError::IllegalCharacter(e) => e.pointer,
            LuceneError::Syntax(e) => e.pointer,
        }
    }

    pub fn render(&self, code: &Code) -> String {
        match self {
            LuceneError::IllegalCharacter(e) => {
                let position = code.position_of(e.pointer);
                let excerpt = code.line_excerpt(e.pointer);
                format!("{} at {}\n  {}", e, position, excerpt)
            }
            LuceneError::Syntax(e) => e.render(code),
        }
    }
}

impl Display for LuceneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LuceneError::IllegalCharacter(e) => write!(f, "{}", e),
            LuceneError::Syntax(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LuceneError {}

/// Errors raised while lowering an AST into the Elasticsearch JSON DSL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A search field under a nested path targets a sub-field not declared
    /// under that nested parent.
    NestedSearchField { path: String, field: String },
    /// A search path crosses a declared object field incorrectly.
    ObjectSearchField { path: String },
    /// An `UnknownOperation` survived to translation time with no
    /// `default_operator` configured to resolve it.
    UnknownOperationResolver { path: String },
    /// The translator detected a semantic inconsistency not covered by a
    /// more specific variant above.
    InconsistentQuery(String),
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::NestedSearchField { path, field } => write!(
                f,
                "NestedSearchFieldException: '{}' is not declared under nested path '{}'",
                field, path
            ),
            TranslateError::ObjectSearchField { path } => write!(
                f,
                "ObjectSearchFieldException: search path '{}' crosses an object field incorrectly",
                path
            ),
            TranslateError::UnknownOperationResolver { path } => write!(
                f,
                "UnknownOperationResolverError: unresolved implicit operator at '{}' and no default_operator configured",
                path
            ),
            TranslateError::InconsistentQuery(message) => {
                write!(f, "InconsistentQueryException: {}", message)
            }
        }
    }
}

impl std::error::Error for TranslateError {}

/// Raised by a [`Transformer`](crate::visitor::Transformer) when a visit
/// yields a child count a fixed-arity parent cannot accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    pub fn arity_violation(parent: &str, yielded: usize) -> Self {
        Self {
            message: format!(
                "ArityViolation: {} accepts exactly one replacement child, got {}",
                parent, yielded
            ),
        }
    }
}

impl Display for TransformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TransformError::{}", self.message)
    }
}

impl std::error::Error for TransformError {}

/// A structural problem reported by the peripheral consistency checker.
/// Never returned as an `Err`; the checker always completes and returns a
/// (possibly empty) list of warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyWarning {
    OrAndAndOnSameLevel { path: String },
    UndeclaredNestedField { path: String, field: String },
}

impl Display for ConsistencyWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyWarning::OrAndAndOnSameLevel { path } => {
                write!(f, "OrAndAndOnSameLevel: ambiguous mix at '{}'", path)
            }
            ConsistencyWarning::UndeclaredNestedField { path, field } => write!(
                f,
                "UndeclaredNestedField: '{}' queried under '{}' without declaring it nested",
                field, path
            ),
        }
    }
}
