//! C3 — the tagged-union AST and its structural operations.
//!
//! Every variant embeds a [`Trivia`] so the printer (C4) can reconstruct the
//! exact source text of an unmodified tree. Trivia and `name` are excluded
//! from [`PartialEq`]; two trees compare equal when they have the same
//! shape and the same own attributes, independent of how they were spaced
//! or named.

/// Leading/trailing whitespace a node owns, plus its optional source span.
#[derive(Debug, Clone, Default)]
pub struct Trivia {
    pub head: String,
    pub tail: String,
    pub pos: Option<usize>,
    pub size: Option<usize>,
}

impl Trivia {
    pub fn spanned(head: impl Into<String>, pos: usize, size: usize) -> Self {
        Self {
            head: head.into(),
            tail: String::new(),
            pos: Some(pos),
            size: Some(size),
        }
    }

    /// Remove and return the head trivia, leaving an empty string behind.
    /// Used by the parser to move leading whitespace from a child onto a
    /// wrapper node whose surface begins exactly where the child begins
    /// (`Fuzzy`, `Boost`, the n-ary operators), so it prints once.
    pub(crate) fn take_head(&mut self) -> String {
        std::mem::take(&mut self.head)
    }

    /// Remove and return the tail trivia, leaving an empty string behind.
    /// Used symmetrically for wrappers whose surface ends exactly where a
    /// child ends (`SearchField`, `Not`, `Plus`, `Prohibit`, the n-ary
    /// operators).
    pub(crate) fn take_tail(&mut self) -> String {
        std::mem::take(&mut self.tail)
    }
}

/// The Lucene AST. Each variant owns its [`Trivia`] and an optional stable
/// `name` assigned by the naming component (C6); `name` is not part of
/// structural identity.
#[derive(Debug, Clone)]
pub enum Node {
    Word {
        value: String,
        trivia: Trivia,
        name: Option<String>,
    },
    Phrase {
        value: String,
        trivia: Trivia,
        name: Option<String>,
    },
    Regex {
        value: String,
        trivia: Trivia,
        name: Option<String>,
    },
    SearchField {
        field: String,
        expr: Box<Node>,
        trivia: Trivia,
    },
    Group {
        expr: Box<Node>,
        trivia: Trivia,
    },
    FieldGroup {
        expr: Box<Node>,
        trivia: Trivia,
    },
    Range {
        low: Box<Node>,
        high: Box<Node>,
        include_low: bool,
        include_high: bool,
        trivia: Trivia,
    },
    Fuzzy {
        term: Box<Node>,
        degree: Option<f64>,
        trivia: Trivia,
    },
    Proximity {
        phrase: Box<Node>,
        degree: Option<f64>,
        trivia: Trivia,
    },
    Boost {
        expr: Box<Node>,
        force: f64,
        trivia: Trivia,
    },
    Not {
        expr: Box<Node>,
        trivia: Trivia,
    },
    Plus {
        expr: Box<Node>,
        trivia: Trivia,
    },
    Prohibit {
        expr: Box<Node>,
        trivia: Trivia,
    },
    AndOperation {
        children: Vec<Node>,
        trivia: Trivia,
    },
    OrOperation {
        children: Vec<Node>,
        trivia: Trivia,
    },
    UnknownOperation {
        children: Vec<Node>,
        trivia: Trivia,
    },
}

impl Node {
    pub fn word(value: impl Into<String>) -> Self {
        Node::Word {
            value: value.into(),
            trivia: Trivia::default(),
            name: None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Word { .. } => "Word",
            Node::Phrase { .. } => "Phrase",
            Node::Regex { .. } => "Regex",
            Node::SearchField { .. } => "SearchField",
            Node::Group { .. } => "Group",
            Node::FieldGroup { .. } => "FieldGroup",
            Node::Range { .. } => "Range",
            Node::Fuzzy { .. } => "Fuzzy",
            Node::Proximity { .. } => "Proximity",
            Node::Boost { .. } => "Boost",
            Node::Not { .. } => "Not",
            Node::Plus { .. } => "Plus",
            Node::Prohibit { .. } => "Prohibit",
            Node::AndOperation { .. } => "AndOperation",
            Node::OrOperation { .. } => "OrOperation",
            Node::UnknownOperation { .. } => "UnknownOperation",
        }
    }

    /// The node's trivia, shared across all variants.
    pub fn trivia(&self) -> &Trivia {
        match self {
            Node::Word { trivia, .. }
            | Node::Phrase { trivia, .. }
            | Node::Regex { trivia, .. }
            | Node::SearchField { trivia, .. }
            | Node::Group { trivia, .. }
            | Node::FieldGroup { trivia, .. }
            | Node::Range { trivia, .. }
            | Node::Fuzzy { trivia, .. }
            | Node::Proximity { trivia, .. }
            | Node::Boost { trivia, .. }
            | Node::Not { trivia, .. }
            | Node::Plus { trivia, .. }
            | Node::Prohibit { trivia, .. }
            | Node::AndOperation { trivia, .. }
            | Node::OrOperation { trivia, .. }
            | Node::UnknownOperation { trivia, .. } => trivia,
        }
    }

    pub fn trivia_mut(&mut self) -> &mut Trivia {
        match self {
            Node::Word { trivia, .. }
            | Node::Phrase { trivia, .. }
            | Node::Regex { trivia, .. }
            | Node::SearchField { trivia, .. }
            | Node::Group { trivia, .. }
            | Node::FieldGroup { trivia, .. }
            | Node::Range { trivia, .. }
            | Node::Fuzzy { trivia, .. }
            | Node::Proximity { trivia, .. }
            | Node::Boost { trivia, .. }
            | Node::Not { trivia, .. }
            | Node::Plus { trivia, .. }
            | Node::Prohibit { trivia, .. }
            | Node::AndOperation { trivia, .. }
            | Node::OrOperation { trivia, .. }
            | Node::UnknownOperation { trivia, .. } => trivia,
        }
    }

    /// The stable name assigned by `auto_name`, if any. Only leaves and
    /// operator operands can carry one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Word { name, .. } | Node::Phrase { name, .. } | Node::Regex { name, .. } => {
                name.as_deref()
            }
            _ => None,
        }
    }

    pub fn set_name(&mut self, value: Option<String>) {
        match self {
            Node::Word { name, .. } | Node::Phrase { name, .. } | Node::Regex { name, .. } => {
                *name = value;
            }
            _ => {}
        }
    }

    /// Ordered, borrowed children, for read-only traversal.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Word { .. } | Node::Phrase { .. } | Node::Regex { .. } => Vec::new(),
            Node::SearchField { expr, .. }
            | Node::Group { expr, .. }
            | Node::FieldGroup { expr, .. }
            | Node::Not { expr, .. }
            | Node::Plus { expr, .. }
            | Node::Prohibit { expr, .. }
            | Node::Boost { expr, .. } => vec![expr.as_ref()],
            Node::Range { low, high, .. } => vec![low.as_ref(), high.as_ref()],
            Node::Fuzzy { term, .. } => vec![term.as_ref()],
            Node::Proximity { phrase, .. } => vec![phrase.as_ref()],
            Node::AndOperation { children, .. }
            | Node::OrOperation { children, .. }
            | Node::UnknownOperation { children, .. } => children.iter().collect(),
        }
    }

    /// Mutable children, used by transformers to rebuild a node in place
    /// before it is replaced wholesale.
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Word { .. } | Node::Phrase { .. } | Node::Regex { .. } => Vec::new(),
            Node::SearchField { expr, .. }
            | Node::Group { expr, .. }
            | Node::FieldGroup { expr, .. }
            | Node::Not { expr, .. }
            | Node::Plus { expr, .. }
            | Node::Prohibit { expr, .. }
            | Node::Boost { expr, .. } => vec![expr.as_mut()],
            Node::Range { low, high, .. } => vec![low.as_mut(), high.as_mut()],
            Node::Fuzzy { term, .. } => vec![term.as_mut()],
            Node::Proximity { phrase, .. } => vec![phrase.as_mut()],
            Node::AndOperation { children, .. }
            | Node::OrOperation { children, .. }
            | Node::UnknownOperation { children, .. } => children.iter_mut().collect(),
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Node::AndOperation { .. } | Node::OrOperation { .. } | Node::UnknownOperation { .. }
        )
    }

    /// A deep copy sharing nothing with `self`; `Node` derives `Clone`, so
    /// this is a thin, documented alias for callers translating from the
    /// "clone_item" vocabulary of the design notes.
    pub fn clone_item(&self) -> Node {
        self.clone()
    }
}

/// Structural equality: same kind, same own attributes, same children in
/// order. Trivia and `name` never participate.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Word { value: a, .. }, Node::Word { value: b, .. }) => a == b,
            (Node::Phrase { value: a, .. }, Node::Phrase { value: b, .. }) => a == b,
            (Node::Regex { value: a, .. }, Node::Regex { value: b, .. }) => a == b,
            (
                Node::SearchField { field: f1, expr: e1, .. },
                Node::SearchField { field: f2, expr: e2, .. },
            ) => f1 == f2 && e1 == e2,
            (Node::Group { expr: e1, .. }, Node::Group { expr: e2, .. }) => e1 == e2,
            (Node::FieldGroup { expr: e1, .. }, Node::FieldGroup { expr: e2, .. }) => e1 == e2,
            (
                Node::Range {
                    low: l1,
                    high: h1,
                    include_low: il1,
                    include_high: ih1,
                    ..
                },
                Node::Range {
                    low: l2,
                    high: h2,
                    include_low: il2,
                    include_high: ih2,
                    ..
                },
            ) => l1 == l2 && h1 == h2 && il1 == il2 && ih1 == ih2,
            (
                Node::Fuzzy { term: t1, degree: d1, .. },
                Node::Fuzzy { term: t2, degree: d2, .. },
            ) => t1 == t2 && d1 == d2,
            (
                Node::Proximity { phrase: p1, degree: d1, .. },
                Node::Proximity { phrase: p2, degree: d2, .. },
            ) => p1 == p2 && d1 == d2,
            (
                Node::Boost { expr: e1, force: f1, .. },
                Node::Boost { expr: e2, force: f2, .. },
            ) => e1 == e2 && f1 == f2,
            (Node::Not { expr: e1, .. }, Node::Not { expr: e2, .. }) => e1 == e2,
            (Node::Plus { expr: e1, .. }, Node::Plus { expr: e2, .. }) => e1 == e2,
            (Node::Prohibit { expr: e1, .. }, Node::Prohibit { expr: e2, .. }) => e1 == e2,
            (
                Node::AndOperation { children: c1, .. },
                Node::AndOperation { children: c2, .. },
            ) => c1 == c2,
            (Node::OrOperation { children: c1, .. }, Node::OrOperation { children: c2, .. }) => {
                c1 == c2
            }
            (
                Node::UnknownOperation { children: c1, .. },
                Node::UnknownOperation { children: c2, .. },
            ) => c1 == c2,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_trivia_and_name() {
        let mut a = Node::word("foo");
        a.trivia_mut().head = "  ".into();
        let mut b = Node::word("foo");
        b.set_name(Some("q1".into()));
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_structural_for_operators() {
        let a = Node::AndOperation {
            children: vec![Node::word("a"), Node::word("b")],
            trivia: Trivia::default(),
        };
        let b = Node::AndOperation {
            children: vec![Node::word("a"), Node::word("b")],
            trivia: Trivia::default(),
        };
        assert_eq!(a, b);
        let c = Node::OrOperation {
            children: vec![Node::word("a"), Node::word("b")],
            trivia: Trivia::default(),
        };
        assert_ne!(a, c);
    }

    #[test]
    fn clone_item_is_deep_and_detached() {
        let original = Node::SearchField {
            field: "title".into(),
            expr: Box::new(Node::word("foo")),
            trivia: Trivia::default(),
        };
        let cloned = original.clone_item();
        assert_eq!(original, cloned);
    }
}
