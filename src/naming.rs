//! C6 — stable names for sub-expressions, and the machinery that maps a
//! search engine's per-query match report back onto the tree.
//!
//! Names are assigned to leaves and to operator operands (never to the
//! operator nodes themselves) in depth-first document order. A name
//! survives translation as an Elasticsearch `_name` attribute so a
//! caller can later correlate matched queries with the AST nodes that
//! produced them.

use crate::ast::Node;
use crate::visitor::{VisitContext, Visitor};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Maps a stable name to the path (child indices from the root) of the
/// node that owns it.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    paths: HashMap<String, Vec<usize>>,
}

impl NameIndex {
    pub fn path_of(&self, name: &str) -> Option<&[usize]> {
        self.paths.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

struct Namer {
    index: NameIndex,
    counter: usize,
}

impl Visitor for Namer {
    fn visit(&mut self, node: &Node, ctx: &VisitContext) {
        if is_nameable(node) {
            let name = format!("q{}", self.counter);
            self.counter += 1;
            self.index.paths.insert(name, ctx.path.clone());
        }
        self.generic_visit(node, ctx);
    }
}

fn is_nameable(node: &Node) -> bool {
    !node.is_operator()
}

/// Walk `tree` depth-first and assign a stable name to every leaf and
/// operator operand. The tree itself is not mutated; callers that need
/// the names recorded on the nodes should use `element_from_path` with
/// the returned index and call `Node::set_name` themselves.
pub fn auto_name(tree: &Node) -> NameIndex {
    let mut namer = Namer {
        index: NameIndex::default(),
        counter: 0,
    };
    namer.run(tree);
    namer.index
}

/// Resolve a path (sequence of child indices from the root) to the node
/// it addresses, or `None` if the path runs off the tree.
pub fn element_from_path<'a>(tree: &'a Node, path: &[usize]) -> Option<&'a Node> {
    let mut current = tree;
    for &index in path {
        current = current.children().into_iter().nth(index)?;
    }
    Some(current)
}

/// Resolve a name to its node via `index`. `index` is accepted as a
/// parameter (rather than looked up globally) so the same `NameIndex`
/// can back several queries against clones of the same shape.
pub fn element_from_name<'a>(tree: &'a Node, names: &NameIndex, name: &str) -> Option<&'a Node> {
    element_from_path(tree, names.path_of(name)?)
}

/// Given the set of names an engine reported as matching, computes the
/// disjoint `ok`/`ko` path sets implied by operator semantics: `AND`
/// requires every operand to be `ok`; `OR` is `ok` if any operand is;
/// `NOT`/`Prohibit` invert their operand's verdict.
pub struct MatchingPropagator<'a> {
    tree: &'a Node,
    matched: std::collections::HashSet<String>,
    ok: std::collections::HashSet<Vec<usize>>,
    ko: std::collections::HashSet<Vec<usize>>,
}

impl<'a> MatchingPropagator<'a> {
    pub fn new(tree: &'a Node, matched_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            tree,
            matched: matched_names.into_iter().collect(),
            ok: std::collections::HashSet::new(),
            ko: std::collections::HashSet::new(),
        }
    }

    pub fn propagate(mut self) -> (std::collections::HashSet<Vec<usize>>, std::collections::HashSet<Vec<usize>>) {
        self.walk(self.tree, &[]);
        (self.ok, self.ko)
    }

    fn walk(&mut self, node: &Node, path: &[usize]) -> bool {
        let verdict = match node {
            Node::AndOperation { children, .. } => {
                children
                    .iter()
                    .enumerate()
                    .map(|(i, c)| self.walk(c, &extend(path, i)))
                    .fold(true, |acc, ok| acc && ok)
            }
            Node::OrOperation { children, .. } | Node::UnknownOperation { children, .. } => {
                children
                    .iter()
                    .enumerate()
                    .map(|(i, c)| self.walk(c, &extend(path, i)))
                    .fold(false, |acc, ok| acc || ok)
            }
            Node::Not { expr, .. } | Node::Prohibit { expr, .. } => {
                !self.walk(expr, &extend(path, 0))
            }
            Node::Plus { expr, .. } | Node::Group { expr, .. } | Node::FieldGroup { expr, .. } => {
                self.walk(expr, &extend(path, 0))
            }
            Node::SearchField { expr, .. } => self.walk(expr, &extend(path, 0)),
            _ => node.name().map(|n| self.matched.contains(n)).unwrap_or(false),
        };
        if verdict {
            self.ok.insert(path.to_vec());
        } else {
            self.ko.insert(path.to_vec());
        }
        verdict
    }
}

fn extend(path: &[usize], index: usize) -> Vec<usize> {
    let mut next = path.to_vec();
    next.push(index);
    next
}

/// Reprint `tree`, HTML-escaping text content and wrapping every node in
/// `<span class="ok">`/`<span class="ko">` per the path sets computed by
/// [`MatchingPropagator`]. Paths absent from both sets are left
/// unwrapped (the engine made no claim about them).
pub struct HTMLMarker<'a> {
    ok: &'a std::collections::HashSet<Vec<usize>>,
    ko: &'a std::collections::HashSet<Vec<usize>>,
}

impl<'a> HTMLMarker<'a> {
    pub fn mark(tree: &Node, ok: &'a std::collections::HashSet<Vec<usize>>, ko: &'a std::collections::HashSet<Vec<usize>>) -> String {
        let marker = HTMLMarker { ok, ko };
        let mut out = String::new();
        marker.render(tree, &[], &mut out);
        out
    }

    fn render(&self, node: &Node, path: &[usize], out: &mut String) {
        let class = if self.ok.contains(path) {
            Some("ok")
        } else if self.ko.contains(path) {
            Some("ko")
        } else {
            None
        };
        if let Some(class) = class {
            write!(out, "<span class=\"{}\">", class).unwrap();
        }
        write!(out, "{}", html_escape(&node.trivia().head)).unwrap();
        match node {
            Node::Word { value, .. } | Node::Phrase { value, .. } | Node::Regex { value, .. } => {
                write!(out, "{}", html_escape(value)).unwrap();
            }
            Node::SearchField { field, expr, .. } => {
                write!(out, "{}:", html_escape(field)).unwrap();
                self.render(expr, &extend(path, 0), out);
            }
            Node::Group { expr, .. } | Node::FieldGroup { expr, .. } => {
                out.push('(');
                self.render(expr, &extend(path, 0), out);
                out.push(')');
            }
            Node::Not { expr, .. } => {
                out.push_str("NOT");
                self.render(expr, &extend(path, 0), out);
            }
            Node::Plus { expr, .. } => {
                out.push('+');
                self.render(expr, &extend(path, 0), out);
            }
            Node::Prohibit { expr, .. } => {
                out.push('-');
                self.render(expr, &extend(path, 0), out);
            }
            Node::AndOperation { children, .. } | Node::OrOperation { children, .. } | Node::UnknownOperation { children, .. } => {
                let keyword = match node {
                    Node::AndOperation { .. } => "AND",
                    Node::OrOperation { .. } => "OR",
                    _ => "",
                };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 && !keyword.is_empty() {
                        out.push_str(keyword);
                    }
                    self.render(child, &extend(path, i), out);
                }
            }
            other => {
                // Fuzzy, Proximity, Boost, Range: reuse the printer's
                // surface text for the parts the marker doesn't need to
                // recurse into individually.
                write!(out, "{}", surface_only(other)).unwrap();
            }
        }
        write!(out, "{}", html_escape(&node.trivia().tail)).unwrap();
        if class.is_some() {
            out.push_str("</span>");
        }
    }
}

/// The printer's rendering of `node` without its own head/tail, used by
/// `HTMLMarker` for node kinds it renders opaquely.
fn surface_only(node: &Node) -> String {
    let full = node.to_string();
    full[node.trivia().head.len()..full.len() - node.trivia().tail.len()].to_string()
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_query;

    #[test]
    fn auto_name_covers_every_leaf() {
        let tree = parse_query("a AND b").unwrap();
        let names = auto_name(&tree);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn auto_name_skips_operator_nodes() {
        let tree = parse_query("a AND (b OR c)").unwrap();
        let names = auto_name(&tree);
        // a, the Group, b, c -- the AndOperation/OrOperation themselves
        // are never named.
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn element_from_path_resolves() {
        let tree = parse_query("a AND b").unwrap();
        let names = auto_name(&tree);
        let path = names.path_of("q0").unwrap();
        let node = element_from_path(&tree, path).unwrap();
        assert_eq!(*node, Node::word("a"));
    }

    #[test]
    fn propagator_and_requires_all_matches() {
        let tree = parse_query("a AND b").unwrap();
        let mut a = Node::word("a");
        a.set_name(Some("na".into()));
        let mut b = Node::word("b");
        b.set_name(Some("nb".into()));
        let tree = Node::AndOperation {
            children: vec![a, b],
            trivia: tree.trivia().clone(),
        };
        let (ok, _ko) = MatchingPropagator::new(&tree, vec!["na".to_string()]).propagate();
        assert!(!ok.contains(&vec![]));
    }

    #[test]
    fn html_marker_escapes_and_wraps() {
        let mut word = Node::word("<b>");
        word.set_name(Some("n".into()));
        let ok: std::collections::HashSet<Vec<usize>> = [vec![]].into_iter().collect();
        let ko = std::collections::HashSet::new();
        let html = HTMLMarker::mark(&word, &ok, &ko);
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.starts_with("<span class=\"ok\">"));
    }
}
