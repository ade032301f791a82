//! C4 — lossless reprinting.
//!
//! The printer never inserts whitespace of its own. Every byte of
//! whitespace in the original query belongs to exactly one node's `head`
//! or `tail`, placed there by the parser at assembly time; `Display`
//! simply concatenates `head + surface + tail` recursively. Reprinting an
//! untouched tree reproduces the source byte for byte.

use crate::ast::Node;
use std::fmt::{self, Display, Formatter};

fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let trivia = self.trivia();
        f.write_str(&trivia.head)?;
        match self {
            Node::Word { value, .. } | Node::Phrase { value, .. } | Node::Regex { value, .. } => {
                f.write_str(value)?;
            }
            Node::SearchField { field, expr, .. } => {
                f.write_str(field)?;
                f.write_str(":")?;
                write!(f, "{}", expr)?;
            }
            Node::Group { expr, .. } | Node::FieldGroup { expr, .. } => {
                f.write_str("(")?;
                write!(f, "{}", expr)?;
                f.write_str(")")?;
            }
            Node::Range {
                low,
                high,
                include_low,
                include_high,
                ..
            } => {
                f.write_str(if *include_low { "[" } else { "{" })?;
                write!(f, "{}", low)?;
                f.write_str("TO")?;
                write!(f, "{}", high)?;
                f.write_str(if *include_high { "]" } else { "}" })?;
            }
            Node::Fuzzy { term, degree, .. } => {
                write!(f, "{}", term)?;
                f.write_str("~")?;
                if let Some(degree) = degree {
                    f.write_str(&fmt_number(*degree))?;
                }
            }
            Node::Proximity { phrase, degree, .. } => {
                write!(f, "{}", phrase)?;
                f.write_str("~")?;
                if let Some(degree) = degree {
                    f.write_str(&fmt_number(*degree))?;
                }
            }
            Node::Boost { expr, force, .. } => {
                write!(f, "{}", expr)?;
                f.write_str("^")?;
                f.write_str(&fmt_number(*force))?;
            }
            Node::Not { expr, .. } => {
                f.write_str("NOT")?;
                write!(f, "{}", expr)?;
            }
            Node::Plus { expr, .. } => {
                f.write_str("+")?;
                write!(f, "{}", expr)?;
            }
            Node::Prohibit { expr, .. } => {
                f.write_str("-")?;
                write!(f, "{}", expr)?;
            }
            Node::AndOperation { children, .. } => write_operator(f, children, "AND")?,
            Node::OrOperation { children, .. } => write_operator(f, children, "OR")?,
            Node::UnknownOperation { children, .. } => write_operator(f, children, "")?,
        }
        f.write_str(&trivia.tail)
    }
}

fn write_operator(f: &mut Formatter<'_>, children: &[Node], keyword: &str) -> fmt::Result {
    for (index, child) in children.iter().enumerate() {
        if index > 0 && !keyword.is_empty() {
            f.write_str(keyword)?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

impl Node {
    /// Reprint the tree to a `String`. Equivalent to `self.to_string()`,
    /// kept as an explicit method because callers translating from the
    /// design notes look for a named `to_query_string`.
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn roundtrip(source: &str) {
        let tokens = tokenize(source).unwrap();
        let tree = parse(&tokens).unwrap();
        assert_eq!(tree.to_query_string(), source);
    }

    #[test]
    fn word_roundtrips() {
        roundtrip("foo");
    }

    #[test]
    fn search_field_roundtrips() {
        roundtrip("title:foo");
    }

    #[test]
    fn group_roundtrips_with_inner_spacing() {
        roundtrip("( foo )");
    }

    #[test]
    fn and_operation_roundtrips() {
        roundtrip("a AND b AND c");
    }

    #[test]
    fn mixed_whitespace_roundtrips() {
        roundtrip("  foo   AND  bar  ");
    }

    #[test]
    fn not_prefix_roundtrips() {
        roundtrip("NOT foo");
    }

    #[test]
    fn fuzzy_and_boost_roundtrip() {
        roundtrip("foo~2");
        roundtrip("foo^2.5");
    }

    #[test]
    fn range_roundtrips_mixed_bounds() {
        roundtrip("field:[a TO b}");
    }

    #[test]
    fn implicit_operation_roundtrips() {
        roundtrip("foo bar");
    }
}
