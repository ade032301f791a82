//! C7 — turns an Elasticsearch index mapping into the field classification
//! the translator (C8) needs: which fields are analyzed, which are
//! nested, which are plain objects, and which carry Lucene-style
//! multi-fields.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

const NOT_ANALYZED_TYPES: &[&str] = &["keyword", "long", "integer", "short", "byte", "double", "float", "date", "boolean", "ip"];

/// Field classification derived from an index mapping, ready to merge
/// into a [`crate::translate::TranslateOptions`].
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    pub not_analyzed_fields: HashSet<String>,
    pub nested_fields: HashMap<String, HashSet<String>>,
    pub object_fields: Vec<String>,
    pub sub_fields: HashMap<String, String>,
    pub default_field: Option<String>,
}

impl SchemaOptions {
    /// Walk `mapping` (an Elasticsearch mapping body, e.g. the value of
    /// `{"mappings": {...}}`) and classify every field it declares.
    pub fn analyze(mapping: &Value) -> SchemaOptions {
        let mut options = SchemaOptions::default();
        if let Some(properties) = mapping.pointer("/mappings/properties").or_else(|| mapping.get("properties")) {
            walk_properties(properties, "", &mut options);
        }
        options.default_field = mapping
            .pointer("/settings/index/query/default_field")
            .or_else(|| mapping.pointer("/settings/query/default_field"))
            .and_then(Value::as_str)
            .map(str::to_string);
        options
    }
}

fn walk_properties(properties: &Value, prefix: &str, options: &mut SchemaOptions) {
    let Some(fields) = properties.as_object() else { return };
    for (name, definition) in fields {
        let path = join_path(prefix, name);
        let field_type = definition.get("type").and_then(Value::as_str).unwrap_or("object");

        if NOT_ANALYZED_TYPES.contains(&field_type) {
            options.not_analyzed_fields.insert(path.clone());
        }

        if let Some(sub_fields) = definition.get("fields").and_then(Value::as_object) {
            for (sub_name, sub_def) in sub_fields {
                let sub_type = sub_def.get("type").and_then(Value::as_str).unwrap_or("keyword").to_string();
                options.sub_fields.insert(format!("{}.{}", path, sub_name), sub_type);
            }
        }

        match field_type {
            "nested" => {
                if let Some(nested_props) = definition.get("properties").and_then(Value::as_object) {
                    let children: HashSet<String> = nested_props.keys().cloned().collect();
                    options.nested_fields.insert(path.clone(), children);
                }
                if let Some(nested_props) = definition.get("properties") {
                    walk_properties(nested_props, &path, options);
                }
            }
            "object" => {
                if let Some(object_props) = definition.get("properties") {
                    if object_props.as_object().map(|m| !m.is_empty()).unwrap_or(false) {
                        walk_properties(object_props, &path, options);
                    } else {
                        options.object_fields.push(path.clone());
                    }
                } else {
                    options.object_fields.push(path.clone());
                }
            }
            _ => {}
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_not_analyzed_fields() {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "status": { "type": "keyword" },
                    "title": { "type": "text" }
                }
            }
        });
        let options = SchemaOptions::analyze(&mapping);
        assert!(options.not_analyzed_fields.contains("status"));
        assert!(!options.not_analyzed_fields.contains("title"));
    }

    #[test]
    fn collects_nested_children() {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "comments": {
                        "type": "nested",
                        "properties": {
                            "author": { "type": "keyword" },
                            "body": { "type": "text" }
                        }
                    }
                }
            }
        });
        let options = SchemaOptions::analyze(&mapping);
        let children = options.nested_fields.get("comments").unwrap();
        assert!(children.contains("author"));
        assert!(children.contains("body"));
        assert!(options.not_analyzed_fields.contains("comments.author"));
    }

    #[test]
    fn dotted_sub_fields_are_recorded() {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "title": {
                        "type": "text",
                        "fields": { "raw": { "type": "keyword" } }
                    }
                }
            }
        });
        let options = SchemaOptions::analyze(&mapping);
        assert_eq!(options.sub_fields.get("title.raw"), Some(&"keyword".to_string()));
    }

    #[test]
    fn default_field_from_settings() {
        let mapping = json!({
            "mappings": { "properties": {} },
            "settings": { "index": { "query": { "default_field": "body" } } }
        });
        let options = SchemaOptions::analyze(&mapping);
        assert_eq!(options.default_field.as_deref(), Some("body"));
    }
}
