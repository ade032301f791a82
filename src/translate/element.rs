//! Pass A: lower a [`Node`] tree into an [`Element`] tree.
//!
//! `Element` is deliberately flatter than `Node` — it drops trivia, has
//! already resolved every field reference to its full dotted path, and has
//! already classified each leaf against the schema (not-analyzed, nested,
//! wildcard-bearing). Pass B (`super::emit`) only has to decide syntax.

use crate::ast::Node;
use crate::error::TranslateError;
use crate::trace::TraceLevel;
use crate::translate::options::TranslateOptions;
use crate::util::DefaultOperator;

#[derive(Debug, Clone)]
pub enum Element {
    Word {
        field: String,
        value: String,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Phrase {
        field: String,
        value: String,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Exists {
        field: String,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Range {
        field: String,
        low: Option<String>,
        high: Option<String>,
        include_low: bool,
        include_high: bool,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Fuzzy {
        field: String,
        value: String,
        degree: Option<f64>,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Proximity {
        field: String,
        value: String,
        degree: Option<f64>,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Regex {
        field: String,
        value: String,
        nested_path: Option<String>,
        name: Option<String>,
    },
    Boost {
        inner: Box<Element>,
        force: f64,
    },
    BoolOperation {
        must: Vec<Element>,
        should: Vec<Element>,
        must_not: Vec<Element>,
    },
}

impl Element {
    /// The nested path a leaf element was resolved under, if any. Compound
    /// elements (`Boost`, `BoolOperation`) don't carry one of their own;
    /// grouping happens per-leaf in Pass B.
    pub(super) fn nested_path(&self) -> Option<&str> {
        match self {
            Element::Word { nested_path, .. }
            | Element::Phrase { nested_path, .. }
            | Element::Exists { nested_path, .. }
            | Element::Range { nested_path, .. }
            | Element::Fuzzy { nested_path, .. }
            | Element::Proximity { nested_path, .. }
            | Element::Regex { nested_path, .. } => nested_path.as_deref(),
            Element::Boost { inner, .. } => inner.nested_path(),
            Element::BoolOperation { .. } => None,
        }
    }
}

/// Field resolution and nesting state threaded through Pass A by value.
/// Each recursive call gets its own copy — nothing here is mutated and
/// shared; a deeper `SearchField` simply produces a new context for its
/// subtree.
#[derive(Debug, Clone, Default)]
pub struct TranslateContext {
    field: Option<String>,
    nested_path: Option<String>,
}

pub fn build(node: &Node, ctx: &TranslateContext, options: &TranslateOptions) -> Result<Element, TranslateError> {
    match node {
        Node::Word { value, name, .. } => leaf_word(value, name, ctx, options),
        Node::Phrase { value, name, .. } => leaf_phrase(value, name, ctx, options),
        Node::Regex { value, name, .. } => leaf_regex(value, name, ctx, options),
        Node::SearchField { field, expr, .. } => {
            let child_ctx = descend(field, ctx, options)?;
            build(expr, &child_ctx, options)
        }
        Node::Group { expr, .. } | Node::FieldGroup { expr, .. } => build(expr, ctx, options),
        Node::Range { low, high, include_low, include_high, .. } => {
            leaf_range(low, high, *include_low, *include_high, ctx, options)
        }
        Node::Fuzzy { term, degree, .. } => {
            let (value, name) = leaf_text(term);
            let field = resolve_leaf_field(ctx, options)?;
            Ok(Element::Fuzzy { field, value, degree: *degree, nested_path: ctx.nested_path.clone(), name })
        }
        Node::Proximity { phrase, degree, .. } => {
            let (value, name) = leaf_text(phrase);
            let field = resolve_leaf_field(ctx, options)?;
            Ok(Element::Proximity { field, value, degree: *degree, nested_path: ctx.nested_path.clone(), name })
        }
        Node::Boost { expr, force, .. } => Ok(Element::Boost { inner: Box::new(build(expr, ctx, options)?), force: *force }),
        Node::Not { expr, .. } | Node::Prohibit { expr, .. } => {
            Ok(Element::BoolOperation { must: Vec::new(), should: Vec::new(), must_not: vec![build(expr, ctx, options)?] })
        }
        Node::Plus { expr, .. } => {
            Ok(Element::BoolOperation { must: vec![build(expr, ctx, options)?], should: Vec::new(), must_not: Vec::new() })
        }
        Node::AndOperation { children, .. } => {
            let must = children.iter().map(|c| build(c, ctx, options)).collect::<Result<_, _>>()?;
            Ok(Element::BoolOperation { must, should: Vec::new(), must_not: Vec::new() })
        }
        Node::OrOperation { children, .. } => {
            let should = children.iter().map(|c| build(c, ctx, options)).collect::<Result<_, _>>()?;
            Ok(Element::BoolOperation { must: Vec::new(), should, must_not: Vec::new() })
        }
        Node::UnknownOperation { children, .. } => {
            let default = options.default_operator.ok_or_else(|| {
                let err = TranslateError::UnknownOperationResolver { path: ctx.field.clone().unwrap_or_default() };
                options.tracer.emit(TraceLevel::Default, "translate", &err);
                err
            })?;
            let built = children.iter().map(|c| build(c, ctx, options)).collect::<Result<_, _>>()?;
            Ok(match default {
                DefaultOperator::And => Element::BoolOperation { must: built, should: Vec::new(), must_not: Vec::new() },
                DefaultOperator::Or => Element::BoolOperation { must: Vec::new(), should: built, must_not: Vec::new() },
            })
        }
    }
}

/// Resolve a `SearchField`'s name against the enclosing context, validating
/// it against declared object and nested fields, and produce the context
/// its subtree should be built under.
fn descend(name: &str, ctx: &TranslateContext, options: &TranslateOptions) -> Result<TranslateContext, TranslateError> {
    let full = match &ctx.field {
        Some(parent) => format!("{}.{}", parent, name),
        None => name.to_string(),
    };

    // Naming a nested parent directly (`authors:(...)`) establishes the
    // nested context for its body; it is never an object-field crossing.
    if options.nested_fields.contains_key(&full) {
        options.tracer.emit(TraceLevel::Verbose, "translate", format!("{} enters nested scope", full));
        return Ok(TranslateContext { field: Some(full.clone()), nested_path: Some(full) });
    }

    // `object_fields` lists the full dotted paths that are themselves
    // leaves inside an object mapping. Reaching one exactly is valid;
    // stopping at a path that is only a strict prefix of one crosses the
    // object boundary without reaching a declared leaf.
    if !options.object_fields.contains(&full) {
        let prefix = format!("{}.", full);
        if options.object_fields.iter().any(|leaf| leaf.starts_with(&prefix)) {
            let err = TranslateError::ObjectSearchField { path: full };
            options.tracer.emit(TraceLevel::Default, "translate", &err);
            return Err(err);
        }
    }

    for (nested_path, children) in &options.nested_fields {
        let prefix = format!("{}.", nested_path);
        if let Some(rest) = full.strip_prefix(&prefix) {
            let head = rest.split('.').next().unwrap_or(rest);
            if !children.contains(head) {
                let err = TranslateError::NestedSearchField { path: nested_path.clone(), field: rest.to_string() };
                options.tracer.emit(TraceLevel::Default, "translate", &err);
                return Err(err);
            }
            options.tracer.emit(TraceLevel::Verbose, "translate", format!("{} resolved under nested path {}", full, nested_path));
            return Ok(TranslateContext { field: Some(full), nested_path: Some(nested_path.clone()) });
        }
    }

    Ok(TranslateContext { field: Some(full), nested_path: ctx.nested_path.clone() })
}

fn resolve_leaf_field(ctx: &TranslateContext, options: &TranslateOptions) -> Result<String, TranslateError> {
    ctx.field.clone().or_else(|| options.default_field.clone()).ok_or_else(|| {
        let err = TranslateError::InconsistentQuery("no field in scope and no default_field configured".to_string());
        options.tracer.emit(TraceLevel::Default, "translate", &err);
        err
    })
}

fn leaf_word(value: &str, name: &Option<String>, ctx: &TranslateContext, options: &TranslateOptions) -> Result<Element, TranslateError> {
    let field = resolve_leaf_field(ctx, options)?;
    if value == "*" {
        return Ok(Element::Exists { field, nested_path: ctx.nested_path.clone(), name: name.clone() });
    }
    Ok(Element::Word { field, value: value.to_string(), nested_path: ctx.nested_path.clone(), name: name.clone() })
}

fn leaf_phrase(value: &str, name: &Option<String>, ctx: &TranslateContext, options: &TranslateOptions) -> Result<Element, TranslateError> {
    let field = resolve_leaf_field(ctx, options)?;
    Ok(Element::Phrase { field, value: phrase_text(value), nested_path: ctx.nested_path.clone(), name: name.clone() })
}

/// Strip the surrounding quotes a phrase keeps in its source-exact lexeme
/// (kept there for the printer's sake) and unescape it into the literal
/// text a search engine should match against.
fn phrase_text(raw: &str) -> String {
    let inner = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(raw);
    crate::util::unescape_lucene(inner)
}

fn leaf_regex(value: &str, name: &Option<String>, ctx: &TranslateContext, options: &TranslateOptions) -> Result<Element, TranslateError> {
    let field = resolve_leaf_field(ctx, options)?;
    Ok(Element::Regex { field, value: regex_pattern(value), nested_path: ctx.nested_path.clone(), name: name.clone() })
}

/// Strip the delimiting `/`s a regex literal keeps in its source-exact
/// lexeme. `\/` is only an artifact of the delimiter, not a regex escape,
/// so it collapses to a literal `/`; every other backslash sequence is left
/// alone since it's part of the regex syntax itself, not Lucene escaping.
fn regex_pattern(raw: &str) -> String {
    let inner = raw.strip_prefix('/').and_then(|s| s.strip_suffix('/')).unwrap_or(raw);
    inner.replace(r"\/", "/")
}

fn leaf_range(
    low: &Node,
    high: &Node,
    include_low: bool,
    include_high: bool,
    ctx: &TranslateContext,
    options: &TranslateOptions,
) -> Result<Element, TranslateError> {
    let field = resolve_leaf_field(ctx, options)?;
    Ok(Element::Range {
        field,
        low: bound_value(low),
        high: bound_value(high),
        include_low,
        include_high,
        nested_path: ctx.nested_path.clone(),
        name: None,
    })
}

/// `*` as a range bound means "unbounded on this side". The parser only
/// ever produces a `Word` here (or the sentinel `"*"`); other variants
/// can't reach a range bound position.
fn bound_value(node: &Node) -> Option<String> {
    match node {
        Node::Word { value, .. } if value == "*" => None,
        Node::Word { value, .. } => Some(crate::util::unescape_lucene(value)),
        _ => None,
    }
}

fn leaf_text(node: &Node) -> (String, Option<String>) {
    match node {
        Node::Word { value, name, .. } => (crate::util::unescape_lucene(value), name.clone()),
        Node::Phrase { value, name, .. } => (phrase_text(value), name.clone()),
        other => (other.to_string(), None),
    }
}
