//! C11 — a peripheral consistency pass over a parsed tree and a schema.
//!
//! Unlike translation, `check` never fails: it always walks the whole
//! tree and returns whatever it found, because its job is to surface
//! things worth a human's attention, not to gate anything.

use crate::ast::Node;
use crate::error::ConsistencyWarning;
use crate::schema::SchemaOptions;

/// Walk `tree` looking for two classes of likely-unintended query: mixing
/// `AND` and `OR` at the same nesting level with no grouping parens to
/// disambiguate precedence, and referencing a field under a path that
/// `schema` never declared `nested`.
pub fn check(tree: &Node, schema: Option<&SchemaOptions>) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();
    walk(tree, "", None, schema, &mut warnings);
    warnings
}

fn walk(node: &Node, path: &str, field: Option<&str>, schema: Option<&SchemaOptions>, warnings: &mut Vec<ConsistencyWarning>) {
    match node {
        Node::SearchField { field: name, expr, .. } => {
            let full = match field {
                Some(parent) => format!("{}.{}", parent, name),
                None => name.clone(),
            };
            check_nested(&full, schema, warnings);
            walk(expr, path, Some(&full), schema, warnings);
        }
        Node::Group { expr, .. } | Node::FieldGroup { expr, .. } => {
            // Parens resolve precedence; reset the "same level" check below
            // them by giving the subtree a fresh path.
            walk(expr, &format!("{}(", path), field, schema, warnings);
        }
        Node::Not { expr, .. } | Node::Plus { expr, .. } | Node::Prohibit { expr, .. } | Node::Boost { expr, .. } => {
            walk(expr, path, field, schema, warnings);
        }
        Node::Fuzzy { term, .. } => walk(term, path, field, schema, warnings),
        Node::Proximity { phrase, .. } => walk(phrase, path, field, schema, warnings),
        Node::Range { low, high, .. } => {
            walk(low, path, field, schema, warnings);
            walk(high, path, field, schema, warnings);
        }
        Node::AndOperation { children, .. } => {
            if contains_or_sibling(children) {
                warnings.push(ConsistencyWarning::OrAndAndOnSameLevel { path: path.to_string() });
            }
            for child in children {
                walk(child, path, field, schema, warnings);
            }
        }
        Node::OrOperation { children, .. } | Node::UnknownOperation { children, .. } => {
            for child in children {
                walk(child, path, field, schema, warnings);
            }
        }
        Node::Word { .. } | Node::Phrase { .. } | Node::Regex { .. } => {}
    }
}

/// `AndOperation`'s own children list never mixes in an `OrOperation`
/// directly (the grammar gives `AND` tighter precedence than `OR`), but an
/// `UnknownOperation` sibling collapsed from implicit concatenation can
/// still sit next to either, which is the actually ambiguous case this
/// warns about.
fn contains_or_sibling(children: &[Node]) -> bool {
    children.iter().any(|c| matches!(c, Node::OrOperation { .. } | Node::UnknownOperation { .. }))
}

fn check_nested(full_field: &str, schema: Option<&SchemaOptions>, warnings: &mut Vec<ConsistencyWarning>) {
    let Some(schema) = schema else { return };
    for (nested_path, children) in &schema.nested_fields {
        let prefix = format!("{}.", nested_path);
        if let Some(rest) = full_field.strip_prefix(&prefix) {
            let head = rest.split('.').next().unwrap_or(rest);
            if !children.contains(head) {
                warnings.push(ConsistencyWarning::UndeclaredNestedField {
                    path: nested_path.clone(),
                    field: rest.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_query;
    use serde_json::json;

    #[test]
    fn flags_and_with_or_sibling_at_same_level() {
        let tree = parse_query("a AND b c").unwrap();
        let schema = SchemaOptions::default();
        let warnings = check(&tree, Some(&schema));
        assert!(warnings.iter().any(|w| matches!(w, ConsistencyWarning::OrAndAndOnSameLevel { .. })));
    }

    #[test]
    fn grouped_or_does_not_warn() {
        let tree = parse_query("a AND (b OR c)").unwrap();
        let schema = SchemaOptions::default();
        let warnings = check(&tree, Some(&schema));
        assert!(!warnings.iter().any(|w| matches!(w, ConsistencyWarning::OrAndAndOnSameLevel { .. })));
    }

    #[test]
    fn without_a_schema_only_precedence_warnings_fire() {
        let tree = parse_query("a AND b c").unwrap();
        let warnings = check(&tree, None);
        assert!(warnings.iter().any(|w| matches!(w, ConsistencyWarning::OrAndAndOnSameLevel { .. })));
    }

    #[test]
    fn without_a_schema_nested_fields_are_never_flagged() {
        let tree = parse_query("comments.rating:5").unwrap();
        let warnings = check(&tree, None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn flags_field_outside_declared_nested_children() {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "comments": {
                        "type": "nested",
                        "properties": { "author": { "type": "keyword" } }
                    }
                }
            }
        });
        let schema = SchemaOptions::analyze(&mapping);
        let tree = parse_query("comments.rating:5").unwrap();
        let warnings = check(&tree, Some(&schema));
        assert!(warnings.iter().any(|w| matches!(w, ConsistencyWarning::UndeclaredNestedField { .. })));
    }

    #[test]
    fn declared_nested_field_does_not_warn() {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "comments": {
                        "type": "nested",
                        "properties": { "author": { "type": "keyword" } }
                    }
                }
            }
        });
        let schema = SchemaOptions::analyze(&mapping);
        let tree = parse_query("comments.author:alice").unwrap();
        let warnings = check(&tree, Some(&schema));
        assert!(warnings.is_empty());
    }
}
