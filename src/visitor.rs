//! C5 — read-only traversal (`Visitor`) and rewriting traversal
//! (`Transformer`) over the tree.
//!
//! Both dispatch by node kind and walk pre-order, children in document
//! order. Neither ever mutates an existing tree in place: a `Transformer`
//! produces brand new nodes (via `clone_item` plus replacement) and the
//! caller swaps the old tree for the new one.

use crate::ast::Node;
use crate::error::TransformError;

/// Where a visit is positioned relative to the root.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    /// Child indices from the root down to (but not including) the
    /// current node.
    pub path: Vec<usize>,
    pub is_root: bool,
}

impl VisitContext {
    fn root() -> Self {
        Self { path: Vec::new(), is_root: true }
    }

    pub(crate) fn child(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(index);
        Self { path, is_root: false }
    }
}

/// Read-only, pre-order visitor. The default `visit` recurses into every
/// child and reports nothing; override it to inspect nodes of interest
/// without reimplementing the walk.
pub trait Visitor {
    fn visit(&mut self, node: &Node, ctx: &VisitContext) {
        self.generic_visit(node, ctx);
    }

    fn generic_visit(&mut self, node: &Node, ctx: &VisitContext) {
        for (index, child) in node.children().into_iter().enumerate() {
            self.visit(child, &ctx.child(index));
        }
    }

    fn run(&mut self, tree: &Node) {
        self.visit(tree, &VisitContext::root());
    }
}

/// Rewriting, pre-order traversal. `visit` yields zero, one, or many
/// replacement nodes for the node it was given; `generic_visit` is the
/// default, which rebuilds `node` from freshly transformed children.
pub trait Transformer {
    fn visit(&mut self, node: &Node, ctx: &VisitContext) -> Result<Vec<Node>, TransformError> {
        self.generic_visit(node, ctx)
    }

    fn generic_visit(&mut self, node: &Node, ctx: &VisitContext) -> Result<Vec<Node>, TransformError> {
        let children = node.children();
        if children.is_empty() {
            return Ok(vec![node.clone_item()]);
        }

        if node.is_operator() {
            let mut new_children = Vec::new();
            for (index, child) in children.into_iter().enumerate() {
                new_children.extend(self.visit(child, &ctx.child(index))?);
            }
            return Ok(rebuild_operator(node, new_children));
        }

        // Fixed-arity node (`Range` has two slots, everything else one):
        // each slot must resolve to exactly one replacement.
        let mut new_children = Vec::with_capacity(children.len());
        for (index, child) in children.into_iter().enumerate() {
            let mut results = self.visit(child, &ctx.child(index))?;
            if results.len() != 1 {
                return Err(TransformError::arity_violation(node.kind_name(), results.len()));
            }
            new_children.push(results.pop().unwrap());
        }
        Ok(vec![rebuild_fixed(node, new_children)])
    }

    fn run(&mut self, tree: &Node) -> Result<Option<Node>, TransformError> {
        let mut results = self.visit(tree, &VisitContext::root())?;
        if results.len() > 1 {
            return Err(TransformError::arity_violation("<root>", results.len()));
        }
        Ok(results.pop())
    }
}

/// Apply the operator arity rules: zero children removes the operator
/// entirely, one child downgrades the operator to that child, and any
/// other count rebuilds the same operator kind with the new children.
fn rebuild_operator(node: &Node, mut children: Vec<Node>) -> Vec<Node> {
    match children.len() {
        0 => Vec::new(),
        1 => vec![children.pop().unwrap()],
        _ => {
            let trivia = node.trivia().clone();
            vec![match node {
                Node::AndOperation { .. } => Node::AndOperation { children, trivia },
                Node::OrOperation { .. } => Node::OrOperation { children, trivia },
                Node::UnknownOperation { .. } => Node::UnknownOperation { children, trivia },
                _ => unreachable!("is_operator() guards this match"),
            }]
        }
    }
}

/// Rebuild a fixed-arity wrapper (everything but the leaves and the n-ary
/// operators) from its own attributes plus freshly transformed children.
/// `children` has exactly as many entries as `node.children()` did.
fn rebuild_fixed(node: &Node, mut children: Vec<Node>) -> Node {
    match node {
        Node::SearchField { field, trivia, .. } => Node::SearchField {
            field: field.clone(),
            expr: Box::new(children.remove(0)),
            trivia: trivia.clone(),
        },
        Node::Group { trivia, .. } => Node::Group {
            expr: Box::new(children.remove(0)),
            trivia: trivia.clone(),
        },
        Node::FieldGroup { trivia, .. } => Node::FieldGroup {
            expr: Box::new(children.remove(0)),
            trivia: trivia.clone(),
        },
        Node::Not { trivia, .. } => Node::Not {
            expr: Box::new(children.remove(0)),
            trivia: trivia.clone(),
        },
        Node::Plus { trivia, .. } => Node::Plus {
            expr: Box::new(children.remove(0)),
            trivia: trivia.clone(),
        },
        Node::Prohibit { trivia, .. } => Node::Prohibit {
            expr: Box::new(children.remove(0)),
            trivia: trivia.clone(),
        },
        Node::Boost { force, trivia, .. } => Node::Boost {
            expr: Box::new(children.remove(0)),
            force: *force,
            trivia: trivia.clone(),
        },
        Node::Fuzzy { degree, trivia, .. } => Node::Fuzzy {
            term: Box::new(children.remove(0)),
            degree: *degree,
            trivia: trivia.clone(),
        },
        Node::Proximity { degree, trivia, .. } => Node::Proximity {
            phrase: Box::new(children.remove(0)),
            degree: *degree,
            trivia: trivia.clone(),
        },
        Node::Range {
            include_low,
            include_high,
            trivia,
            ..
        } => Node::Range {
            low: Box::new(children.remove(0)),
            high: Box::new(children.remove(0)),
            include_low: *include_low,
            include_high: *include_high,
            trivia: trivia.clone(),
        },
        _ => unreachable!("leaves have no children and operators take the n-ary path"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Trivia;

    struct WordCollector(Vec<String>);

    impl Visitor for WordCollector {
        fn visit(&mut self, node: &Node, ctx: &VisitContext) {
            if let Node::Word { value, .. } = node {
                self.0.push(value.clone());
            }
            self.generic_visit(node, ctx);
        }
    }

    fn and_of(words: &[&str]) -> Node {
        Node::AndOperation {
            children: words.iter().map(|w| Node::word(*w)).collect(),
            trivia: Trivia::default(),
        }
    }

    #[test]
    fn visitor_walks_pre_order() {
        let tree = and_of(&["a", "b", "c"]);
        let mut collector = WordCollector(Vec::new());
        collector.run(&tree);
        assert_eq!(collector.0, vec!["a", "b", "c"]);
    }

    #[test]
    fn visit_context_reports_path() {
        struct PathRecorder(Vec<Vec<usize>>);
        impl Visitor for PathRecorder {
            fn visit(&mut self, node: &Node, ctx: &VisitContext) {
                self.0.push(ctx.path.clone());
                self.generic_visit(node, ctx);
            }
        }
        let tree = and_of(&["a", "b"]);
        let mut recorder = PathRecorder(Vec::new());
        recorder.run(&tree);
        assert_eq!(recorder.0, vec![vec![], vec![0], vec![1]]);
    }

    struct DropWord(&'static str);

    impl Transformer for DropWord {
        fn visit(&mut self, node: &Node, ctx: &VisitContext) -> Result<Vec<Node>, TransformError> {
            if let Node::Word { value, .. } = node {
                if value == self.0 {
                    return Ok(Vec::new());
                }
            }
            self.generic_visit(node, ctx)
        }
    }

    #[test]
    fn removing_one_child_downgrades_operator() {
        let tree = and_of(&["a", "b"]);
        let mut dropper = DropWord("a");
        let result = dropper.run(&tree).unwrap().unwrap();
        assert_eq!(result, Node::word("b"));
    }

    #[test]
    fn removing_all_children_removes_operator() {
        let tree = and_of(&["a"]);
        let mut dropper = DropWord("a");
        let result = dropper.run(&tree).unwrap();
        assert_eq!(result, None);
    }

    struct SplitWord;

    impl Transformer for SplitWord {
        fn visit(&mut self, node: &Node, ctx: &VisitContext) -> Result<Vec<Node>, TransformError> {
            if let Node::Word { value, .. } = node {
                if value == "ab" {
                    return Ok(vec![Node::word("a"), Node::word("b")]);
                }
            }
            self.generic_visit(node, ctx)
        }
    }

    #[test]
    fn splicing_into_unary_is_arity_violation() {
        let tree = Node::Not {
            expr: Box::new(Node::word("ab")),
            trivia: Trivia::default(),
        };
        let mut splitter = SplitWord;
        let err = splitter.run(&tree).unwrap_err();
        assert!(err.message.contains("Not"));
    }

    #[test]
    fn splicing_into_operator_is_allowed() {
        let tree = and_of(&["ab", "c"]);
        let mut splitter = SplitWord;
        let result = splitter.run(&tree).unwrap().unwrap();
        match result {
            Node::AndOperation { children, .. } => assert_eq!(children.len(), 3),
            other => panic!("expected AndOperation, got {:?}", other),
        }
    }
}
