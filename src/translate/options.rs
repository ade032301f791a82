//! Configuration for [`super::translate`]: which fields are analyzed,
//! which live under a `nested` mapping, and how ambiguity (implicit
//! operators, bare words) should resolve.

use crate::schema::SchemaOptions;
use crate::trace::Tracer;
use crate::util::DefaultOperator;
use std::collections::{HashMap, HashSet};

/// How a single analyzed-field word query should be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Match,
    MatchPhrase,
    MultiMatch,
}

/// Per-field overrides that a schema-derived default doesn't cover.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldOptions {
    pub match_type: Option<MatchType>,
}

/// Everything [`super::translate`] needs beyond the AST itself.
///
/// Built with [`TranslateOptions::new`] and then either populated field by
/// field or seeded from a [`SchemaOptions`] via [`TranslateOptions::with_schema`];
/// explicit setters always win over whatever the schema contributed.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub(crate) default_field: Option<String>,
    pub(crate) default_operator: Option<DefaultOperator>,
    pub(crate) not_analyzed_fields: HashSet<String>,
    pub(crate) nested_fields: HashMap<String, HashSet<String>>,
    pub(crate) object_fields: HashSet<String>,
    pub(crate) sub_fields: HashMap<String, String>,
    pub(crate) field_options: HashMap<String, FieldOptions>,
    pub(crate) match_word_as_phrase: bool,
    pub(crate) tracer: Tracer,
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer a schema's field classification underneath whatever has
    /// already been set explicitly. Call this first if you intend to also
    /// call the other setters, since it does not clear prior state.
    pub fn with_schema(mut self, schema: &SchemaOptions) -> Self {
        self.not_analyzed_fields.extend(schema.not_analyzed_fields.iter().cloned());
        for (path, children) in &schema.nested_fields {
            self.nested_fields.entry(path.clone()).or_default().extend(children.iter().cloned());
        }
        self.object_fields.extend(schema.object_fields.iter().cloned());
        self.sub_fields.extend(schema.sub_fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        if self.default_field.is_none() {
            self.default_field = schema.default_field.clone();
        }
        self
    }

    pub fn default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn default_operator(mut self, operator: DefaultOperator) -> Self {
        self.default_operator = Some(operator);
        self
    }

    pub fn not_analyzed_field(mut self, field: impl Into<String>) -> Self {
        self.not_analyzed_fields.insert(field.into());
        self
    }

    pub fn nested_field(mut self, path: impl Into<String>, children: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.nested_fields.insert(path.into(), children.into_iter().map(Into::into).collect());
        self
    }

    pub fn object_field(mut self, field: impl Into<String>) -> Self {
        self.object_fields.insert(field.into());
        self
    }

    pub fn field_options(mut self, field: impl Into<String>, options: FieldOptions) -> Self {
        self.field_options.insert(field.into(), options);
        self
    }

    /// When set, a bare word on an analyzed field is translated as
    /// `match_phrase` instead of `match`, unless overridden per-field.
    pub fn match_word_as_phrase(mut self, value: bool) -> Self {
        self.match_word_as_phrase = value;
        self
    }

    /// Report field-resolution steps and errors through `tracer` while
    /// translating.
    pub fn tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }
}
