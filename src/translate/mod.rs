//! C8 — lowering a parsed query into an Elasticsearch `query` DSL body.
//!
//! Translation runs in two passes. Pass A ([`element::build`]) walks the
//! [`Node`] tree once, resolving every field reference against
//! [`TranslateOptions`] and producing an [`Element`] tree that already
//! knows which leaves are analyzed, which sit under a nested path, and
//! which carry wildcards. Pass B ([`emit`]) turns that `Element` tree into
//! `serde_json::Value`, with no further field-resolution logic — it is
//! pure syntax.

mod element;
mod options;

pub use element::{Element, TranslateContext};
pub use options::{FieldOptions, MatchType, TranslateOptions};

use crate::ast::Node;
use crate::error::TranslateError;
use crate::trace::TraceLevel;
use crate::util::{iter_wildcards, unescape_lucene};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Translate a parsed query into the body of an Elasticsearch `query`
/// clause (the DSL that would sit under `{"query": ...}` in a search
/// request).
pub fn translate(tree: &Node, options: &TranslateOptions) -> Result<Value, TranslateError> {
    options.tracer.emit(TraceLevel::Default, "translate", "lowering tree");
    let element = element::build(tree, &TranslateContext::default(), options)?;
    let value = emit(&element, options);
    options.tracer.emit(TraceLevel::Success, "translate", "translation complete");
    Ok(value)
}

fn emit(element: &Element, options: &TranslateOptions) -> Value {
    match element {
        Element::Word { field, value, name, .. } => emit_word(field, value, name, options),
        Element::Phrase { field, value, name, .. } => emit_phrase(field, value, name, options),
        Element::Exists { field, name, .. } => {
            let mut v = json!({ "exists": { "field": field } });
            attach_name(&mut v, name);
            v
        }
        Element::Range { field, low, high, include_low, include_high, name, .. } => {
            emit_range(field, low.as_deref(), high.as_deref(), *include_low, *include_high, name)
        }
        Element::Fuzzy { field, value, degree, name, .. } => {
            let mut body = Map::new();
            body.insert("value".to_string(), Value::String(value.clone()));
            if let Some(degree) = degree {
                body.insert("fuzziness".to_string(), json!(degree));
            }
            let mut v = json!({ "fuzzy": { field.clone(): Value::Object(body) } });
            attach_name(&mut v, name);
            v
        }
        Element::Proximity { field, value, degree, name, .. } => {
            let mut v = json!({
                "match_phrase": {
                    field.clone(): {
                        "query": value,
                        "slop": degree.unwrap_or(0.0),
                    }
                }
            });
            attach_name(&mut v, name);
            v
        }
        Element::Regex { field, value, name, .. } => {
            let mut v = json!({ "regexp": { field.clone(): { "value": value } } });
            attach_name(&mut v, name);
            v
        }
        Element::Boost { inner, force } => emit_boost(inner, *force, options),
        Element::BoolOperation { must, should, must_not } => emit_bool(must, should, must_not, options),
    }
}

/// `value` keeps its Lucene backslash-escaping intact so wildcard detection
/// (which must tell `\*` from a real `*`) still works here. A wildcard
/// query is handed the escaped form straight through, since `query_string`
/// parses Lucene syntax itself; every other branch unescapes it first, so
/// the engine matches the literal text rather than its Lucene spelling.
fn emit_word(field: &str, value: &str, name: &Option<String>, options: &TranslateOptions) -> Value {
    let mut v = if options.not_analyzed_fields.contains(field) {
        json!({ "term": { field: { "value": unescape_lucene(value) } } })
    } else if !iter_wildcards(value).is_empty() {
        json!({
            "query_string": {
                "default_field": field,
                "query": value,
                "analyze_wildcard": true,
                "allow_leading_wildcard": true,
            }
        })
    } else {
        let literal = unescape_lucene(value);
        match match_type_for(field, options) {
            MatchType::MatchPhrase => json!({ "match_phrase": { field: { "query": literal } } }),
            MatchType::MultiMatch => json!({ "multi_match": { "query": literal, "fields": [field] } }),
            MatchType::Match => json!({ "match": { field: { "query": literal, "zero_terms_query": "all" } } }),
        }
    };
    attach_name(&mut v, name);
    v
}

fn emit_phrase(field: &str, value: &str, name: &Option<String>, options: &TranslateOptions) -> Value {
    let mut v = if options.not_analyzed_fields.contains(field) {
        json!({ "term": { field: { "value": value } } })
    } else {
        json!({ "match_phrase": { field: { "query": value } } })
    };
    attach_name(&mut v, name);
    v
}

fn match_type_for(field: &str, options: &TranslateOptions) -> MatchType {
    if let Some(explicit) = options.field_options.get(field).and_then(|fo| fo.match_type) {
        return explicit;
    }
    if options.match_word_as_phrase {
        MatchType::MatchPhrase
    } else {
        MatchType::Match
    }
}

fn emit_range(field: &str, low: Option<&str>, high: Option<&str>, include_low: bool, include_high: bool, name: &Option<String>) -> Value {
    let mut bounds = Map::new();
    if let Some(low) = low {
        bounds.insert(if include_low { "gte" } else { "gt" }.to_string(), Value::String(low.to_string()));
    }
    if let Some(high) = high {
        bounds.insert(if include_high { "lte" } else { "lt" }.to_string(), Value::String(high.to_string()));
    }
    let mut v = json!({ "range": { field: Value::Object(bounds) } });
    attach_name(&mut v, name);
    v
}

fn emit_boost(inner: &Element, force: f64, options: &TranslateOptions) -> Value {
    let mut value = emit(inner, options);
    if matches!(inner, Element::BoolOperation { .. }) {
        json!({ "function_score": { "query": value, "boost_factor": force } })
    } else {
        attach_number(&mut value, "boost", force);
        value
    }
}

/// Find the innermost object a leaf query's attributes live in (one level
/// down for `{"term": {"field": {...}}}` shapes, the clause body itself
/// for flat shapes like `query_string`) and insert a key into it.
fn innermost_object(value: &mut Value) -> Option<&mut Map<String, Value>> {
    let outer = value.as_object_mut()?;
    let (_, inner) = outer.iter_mut().next()?;
    let inner_obj = inner.as_object_mut()?;
    let has_nested_leaf = inner_obj.values().next().map(Value::is_object).unwrap_or(false);
    if has_nested_leaf {
        let (_, leaf) = inner_obj.iter_mut().next()?;
        leaf.as_object_mut()
    } else {
        Some(inner_obj)
    }
}

fn attach_name(value: &mut Value, name: &Option<String>) {
    if let Some(name) = name {
        if let Some(obj) = innermost_object(value) {
            obj.insert("_name".to_string(), Value::String(name.clone()));
        }
    }
}

fn attach_number(value: &mut Value, key: &str, number: f64) {
    if let Some(obj) = innermost_object(value) {
        obj.insert(key.to_string(), json!(number));
    }
}

fn emit_bool(must: &[Element], should: &[Element], must_not: &[Element], options: &TranslateOptions) -> Value {
    let mut obj = Map::new();
    let must_v = emit_clause(must, options);
    let should_v = emit_clause(should, options);
    let must_not_v = emit_clause(must_not, options);
    if !must_v.is_empty() {
        obj.insert("must".to_string(), Value::Array(must_v));
    }
    if !should_v.is_empty() {
        obj.insert("should".to_string(), Value::Array(should_v));
    }
    if !must_not_v.is_empty() {
        obj.insert("must_not".to_string(), Value::Array(must_not_v));
    }
    collapse_single_clause(obj)
}

/// A `bool` with exactly one entry in exactly one positive clause carries
/// no information the entry itself doesn't: return the entry directly.
/// `must_not` is never collapsed — a lone negation is not the same query
/// as the thing it negates.
fn collapse_single_clause(obj: Map<String, Value>) -> Value {
    if obj.len() == 1 {
        for key in ["must", "should"] {
            if let Some(Value::Array(items)) = obj.get(key) {
                if items.len() == 1 {
                    return items[0].clone();
                }
            }
        }
    }
    json!({ "bool": obj })
}

/// Emit one `bool` clause's worth of elements, grouping consecutive-or-not
/// siblings that share a nested path under a single `nested` wrapper
/// instead of one `nested` query per leaf.
fn emit_clause(elements: &[Element], options: &TranslateOptions) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();
    let mut nested_index: HashMap<String, usize> = HashMap::new();
    for element in elements {
        let emitted = emit(element, options);
        match element.nested_path() {
            None => result.push(emitted),
            Some(path) => {
                if let Some(&index) = nested_index.get(path) {
                    if let Some(inner) = result[index].pointer_mut("/nested/query") {
                        append_to_bool_must(inner, emitted);
                    }
                } else {
                    nested_index.insert(path.to_string(), result.len());
                    result.push(json!({ "nested": { "path": path, "query": emitted } }));
                }
            }
        }
    }
    result
}

fn append_to_bool_must(inner: &mut Value, addition: Value) {
    let already_bool_must = inner
        .get("bool")
        .and_then(|b| b.get("must"))
        .map(Value::is_array)
        .unwrap_or(false);
    if already_bool_must {
        inner["bool"]["must"].as_array_mut().unwrap().push(addition);
    } else {
        let existing = inner.clone();
        *inner = json!({ "bool": { "must": [existing, addition] } });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_query;
    use crate::schema::SchemaOptions;
    use crate::util::DefaultOperator;
    use serde_json::json;

    fn translate_str(source: &str, options: &TranslateOptions) -> Value {
        let tree = parse_query(source).unwrap();
        translate(&tree, options).unwrap()
    }

    #[test]
    fn plain_word_on_analyzed_field_is_match() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str("hello", &options);
        assert_eq!(value, json!({ "match": { "body": { "query": "hello", "zero_terms_query": "all" } } }));
    }

    #[test]
    fn word_on_not_analyzed_field_is_term() {
        let options = TranslateOptions::new().not_analyzed_field("status");
        let value = translate_str("status:open", &options);
        assert_eq!(value, json!({ "term": { "status": { "value": "open" } } }));
    }

    #[test]
    fn wildcard_word_is_query_string() {
        let options = TranslateOptions::new().default_field("title");
        let value = translate_str("tit*le", &options);
        assert_eq!(
            value,
            json!({
                "query_string": {
                    "default_field": "title",
                    "query": "tit*le",
                    "analyze_wildcard": true,
                    "allow_leading_wildcard": true,
                }
            })
        );
    }

    #[test]
    fn bare_star_is_exists() {
        let options = TranslateOptions::new().default_field("title");
        let value = translate_str("title:*", &options);
        assert_eq!(value, json!({ "exists": { "field": "title" } }));
    }

    #[test]
    fn phrase_is_match_phrase() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str("\"hello world\"", &options);
        assert_eq!(value, json!({ "match_phrase": { "body": { "query": "hello world" } } }));
    }

    #[test]
    fn escaped_word_is_unescaped_for_match() {
        let options = TranslateOptions::new().default_field("title");
        let value = translate_str(r"foo\:bar", &options);
        assert_eq!(value, json!({ "match": { "title": { "query": "foo:bar", "zero_terms_query": "all" } } }));
    }

    #[test]
    fn escaped_wildcard_is_not_treated_as_a_wildcard() {
        let options = TranslateOptions::new().default_field("title");
        let value = translate_str(r"foo\*bar", &options);
        assert_eq!(value, json!({ "match": { "title": { "query": "foo*bar", "zero_terms_query": "all" } } }));
    }

    #[test]
    fn phrase_with_escaped_quote_is_unescaped() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str(r#""say \"hi\"""#, &options);
        assert_eq!(value, json!({ "match_phrase": { "body": { "query": "say \"hi\"" } } }));
    }

    #[test]
    fn regex_strips_delimiting_slashes() {
        let options = TranslateOptions::new().default_field("title");
        let value = translate_str("title:/[a-z]+/", &options);
        assert_eq!(value, json!({ "regexp": { "title": { "value": "[a-z]+" } } }));
    }

    #[test]
    fn range_omits_star_bound() {
        let options = TranslateOptions::new();
        let value = translate_str("count:[5 TO *]", &options);
        assert_eq!(value, json!({ "range": { "count": { "gte": "5" } } }));
    }

    #[test]
    fn and_collapses_to_bare_term_when_single() {
        let options = TranslateOptions::new().default_field("body");
        let tree = parse_query("hello").unwrap();
        let result = translate(&tree, &options).unwrap();
        assert_eq!(result, json!({ "match": { "body": { "query": "hello", "zero_terms_query": "all" } } }));
    }

    #[test]
    fn and_of_two_builds_must_array() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str("foo AND bar", &options);
        let must = value.get("bool").unwrap().get("must").unwrap().as_array().unwrap();
        assert_eq!(must.len(), 2);
    }

    #[test]
    fn not_becomes_must_not() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str("NOT foo", &options);
        let must_not = value.get("bool").unwrap().get("must_not").unwrap().as_array().unwrap();
        assert_eq!(must_not.len(), 1);
    }

    #[test]
    fn boost_attaches_to_leaf_query() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str("foo^2", &options);
        assert_eq!(value["match"]["body"]["boost"], json!(2.0));
    }

    #[test]
    fn boost_of_compound_uses_function_score() {
        let options = TranslateOptions::new().default_field("body");
        let value = translate_str("(foo AND bar)^2", &options);
        assert!(value.get("function_score").is_some());
        assert_eq!(value["function_score"]["boost_factor"], json!(2.0));
    }

    #[test]
    fn unknown_operation_without_default_operator_errors() {
        let options = TranslateOptions::new().default_field("body");
        let tree = parse_query("foo bar").unwrap();
        let err = translate(&tree, &options).unwrap_err();
        assert!(matches!(err, TranslateError::UnknownOperationResolver { .. }));
    }

    #[test]
    fn unknown_operation_resolves_via_default_operator() {
        let options = TranslateOptions::new().default_field("body").default_operator(DefaultOperator::Or);
        let value = translate_str("foo bar", &options);
        let should = value.get("bool").unwrap().get("should").unwrap().as_array().unwrap();
        assert_eq!(should.len(), 2);
    }

    #[test]
    fn name_is_attached_as_underscore_name() {
        let options = TranslateOptions::new().default_field("body");
        let mut tree = parse_query("foo").unwrap();
        tree.set_name(Some("q0".to_string()));
        let value = translate(&tree, &options).unwrap();
        assert_eq!(value["match"]["body"]["_name"], json!("q0"));
    }

    #[test]
    fn nested_field_without_declared_child_errors() {
        let options = TranslateOptions::new().nested_field("comments", ["author"]);
        let tree = parse_query("comments.body:hi").unwrap();
        let err = translate(&tree, &options).unwrap_err();
        assert!(matches!(err, TranslateError::NestedSearchField { .. }));
    }

    #[test]
    fn nested_siblings_group_under_one_wrapper() {
        let options = TranslateOptions::new().nested_field("comments", ["author", "body"]);
        let value = translate_str("comments.author:alice AND comments.body:hi", &options);
        let must = value.get("bool").unwrap().get("must").unwrap().as_array().unwrap();
        assert_eq!(must.len(), 1);
        assert!(must[0].get("nested").is_some());
        assert_eq!(must[0]["nested"]["path"], json!("comments"));
    }

    #[test]
    fn grouped_nested_field_wraps_its_children_in_one_nested_query() {
        let options = TranslateOptions::new()
            .default_field("title")
            .nested_field("authors", ["given_name", "last_name", "city"])
            .object_field("authors.city.name");
        let value = translate_str(
            r#"title:"quick brown fox" AND authors:(given_name:Ja* AND last_name:London AND city.name:"San Francisco")"#,
            &options,
        );
        let must = value.get("bool").unwrap().get("must").unwrap().as_array().unwrap();
        assert_eq!(must.len(), 2);
        let nested = must.iter().find(|v| v.get("nested").is_some()).expect("nested wrapper");
        assert_eq!(nested["nested"]["path"], json!("authors"));
        let inner_must = nested["nested"]["query"]["bool"]["must"].as_array().unwrap();
        assert_eq!(inner_must.len(), 3);
    }

    #[test]
    fn object_field_leaf_path_resolves() {
        let options = TranslateOptions::new().object_field("authors.city.name");
        let value = translate_str(r#"authors.city.name:"San Francisco""#, &options);
        assert_eq!(value, json!({ "match_phrase": { "authors.city.name": { "query": "San Francisco" } } }));
    }

    #[test]
    fn stopping_short_of_an_object_leaf_errors() {
        let options = TranslateOptions::new()
            .nested_field("authors", ["given_name", "last_name", "city"])
            .object_field("authors.city.name");
        let tree = parse_query("authors.city:oakland").unwrap();
        let err = translate(&tree, &options).unwrap_err();
        assert!(matches!(err, TranslateError::ObjectSearchField { .. }));
    }

    #[test]
    fn schema_options_feed_not_analyzed_fields() {
        let mapping = json!({
            "mappings": { "properties": { "status": { "type": "keyword" } } }
        });
        let schema = SchemaOptions::analyze(&mapping);
        let options = TranslateOptions::new().with_schema(&schema);
        let value = translate_str("status:open", &options);
        assert_eq!(value, json!({ "term": { "status": { "value": "open" } } }));
    }

    #[test]
    fn tracing_does_not_change_the_translated_query() {
        use crate::trace::Tracer;
        let options = TranslateOptions::new().default_field("title");
        let traced = options.clone().tracer(Tracer::new(TraceLevel::Verbose));
        assert_eq!(translate_str("hello", &traced), translate_str("hello", &options));
    }
}
