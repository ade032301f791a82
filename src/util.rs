//! C9 — small tree utilities that sit above the core parser/printer but
//! below the translator: resolving implicit operators, filling in
//! printable trivia for programmatically built trees, and enumerating
//! wildcard positions inside a term.

use crate::ast::{Node, Trivia};
use crate::error::TransformError;
use crate::visitor::{VisitContext, Transformer};

/// Which operator an `UnknownOperation` resolves to when no more specific
/// signal is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultOperator {
    And,
    Or,
}

/// Replaces every `UnknownOperation` with an explicit `AndOperation` or
/// `OrOperation`. The heuristic: look at the nearest enclosing explicit
/// operator (tracked via a stack pushed/popped as the transformer
/// descends); match it if there is one, otherwise fall back to
/// `default`.
pub struct UnknownOperationResolver {
    default: DefaultOperator,
    enclosing: Vec<DefaultOperator>,
}

impl UnknownOperationResolver {
    pub fn new(default: DefaultOperator) -> Self {
        Self { default, enclosing: Vec::new() }
    }

    fn resolve(&self) -> DefaultOperator {
        *self.enclosing.last().unwrap_or(&self.default)
    }
}

impl Transformer for UnknownOperationResolver {
    fn visit(&mut self, node: &Node, ctx: &VisitContext) -> Result<Vec<Node>, TransformError> {
        match node {
            Node::AndOperation { .. } => {
                self.enclosing.push(DefaultOperator::And);
                let result = self.generic_visit(node, ctx);
                self.enclosing.pop();
                result
            }
            Node::OrOperation { .. } => {
                self.enclosing.push(DefaultOperator::Or);
                let result = self.generic_visit(node, ctx);
                self.enclosing.pop();
                result
            }
            Node::UnknownOperation { children, trivia } => {
                let mut new_children = Vec::with_capacity(children.len());
                for (index, child) in children.iter().enumerate() {
                    new_children.extend(self.visit(child, &ctx.child(index))?);
                }
                let trivia = trivia.clone();
                Ok(vec![match self.resolve() {
                    DefaultOperator::And => Node::AndOperation { children: new_children, trivia },
                    DefaultOperator::Or => Node::OrOperation { children: new_children, trivia },
                }])
            }
            _ => self.generic_visit(node, ctx),
        }
    }
}

/// Inserts the minimum trivia needed for a programmatically constructed
/// tree to reprint as syntactically valid Lucene: a single space between
/// a keyword operator and its operands, none inside parens/brackets.
/// Existing non-empty trivia is left untouched.
pub fn auto_head_tail(node: &mut Node) {
    fill(node, true);
}

fn fill(node: &mut Node, is_leading: bool) {
    if is_leading && node.trivia().head.is_empty() {
        node.trivia_mut().head = String::new();
    }
    match node {
        Node::SearchField { expr, .. }
        | Node::Group { expr, .. }
        | Node::FieldGroup { expr, .. }
        | Node::Boost { expr, .. }
        | Node::Fuzzy { term: expr, .. }
        | Node::Proximity { phrase: expr, .. } => fill(expr, false),
        Node::Not { expr, .. } | Node::Plus { expr, .. } | Node::Prohibit { expr, .. } => {
            if expr.trivia().head.is_empty() {
                expr.trivia_mut().head = " ".to_string();
            }
            fill(expr, false);
        }
        Node::Range { low, high, .. } => {
            fill(low, false);
            if low.trivia().tail.is_empty() {
                low.trivia_mut().tail = " ".to_string();
            }
            if high.trivia().head.is_empty() {
                high.trivia_mut().head = " ".to_string();
            }
            fill(high, false);
        }
        Node::AndOperation { children, .. } | Node::OrOperation { children, .. } => {
            let keyword_len = children.len();
            for (index, child) in children.iter_mut().enumerate() {
                fill(child, index == 0);
                if index + 1 < keyword_len {
                    if child.trivia().tail.is_empty() {
                        child.trivia_mut().tail = " ".to_string();
                    }
                }
            }
            for child in children.iter_mut().skip(1) {
                if child.trivia().head.is_empty() {
                    child.trivia_mut().head = " ".to_string();
                }
            }
        }
        Node::UnknownOperation { children, .. } => {
            for (index, child) in children.iter_mut().enumerate() {
                fill(child, index == 0);
                if index > 0 && child.trivia().head.is_empty() {
                    child.trivia_mut().head = " ".to_string();
                }
            }
        }
        Node::Word { .. } | Node::Phrase { .. } | Node::Regex { .. } => {}
    }
}

/// A wildcard occurrence inside a term's value: `*` matches any run of
/// characters (including none), `?` matches exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcard {
    Star(usize),
    Question(usize),
}

/// Enumerate wildcard positions (byte offsets into `value`) honoring
/// Lucene's backslash escaping: `\*` and `\?` are literal characters,
/// not wildcards.
pub fn iter_wildcards(value: &str) -> Vec<Wildcard> {
    let mut wildcards = Vec::new();
    let mut chars = value.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' => wildcards.push(Wildcard::Star(index)),
            '?' => wildcards.push(Wildcard::Question(index)),
            _ => {}
        }
    }
    wildcards
}

/// Strip Lucene backslash-escaping: `\c` becomes the literal character `c`
/// for any `c`. Used by the translator to turn a lexed token's source-exact
/// text (which keeps escapes intact, the same way the printer needs them)
/// into the literal string a search engine should match against.
pub fn unescape_lucene(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Split `value` into the literal segments between its wildcards, for
/// callers that want to reconstruct or rewrite around them.
pub fn split_wildcards(value: &str) -> Vec<&str> {
    let positions = iter_wildcards(value);
    if positions.is_empty() {
        return vec![value];
    }
    let mut segments = Vec::new();
    let mut start = 0;
    for wildcard in &positions {
        let at = match wildcard {
            Wildcard::Star(i) | Wildcard::Question(i) => *i,
        };
        segments.push(&value[start..at]);
        start = at + 1;
    }
    segments.push(&value[start..]);
    segments
}
