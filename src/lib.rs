//! Parses the Lucene query mini-language into a lossless, reprintable
//! abstract syntax tree, and lowers that tree into an Elasticsearch
//! `query` DSL body.
//!
//! # Overview
//!
//! A query like `title:"rust lang" AND (tags:systems OR tags:parsing)^2`
//! goes through four stages:
//!
//! 1. [`lexer`] splits the source into [`token::Lex`] tokens, attaching
//!    whitespace to whichever token follows it.
//! 2. [`parser`] builds an [`ast::Node`] tree from those tokens.
//! 3. [`printer`] reprints a [`ast::Node`] tree back to source; an
//!    unmodified tree reprints byte-for-byte.
//! 4. [`translate`] lowers a tree into the JSON body of an Elasticsearch
//!    `query` clause, given a [`translate::TranslateOptions`] describing
//!    the target index (or derived from one via [`schema::SchemaOptions`]).
//!
//! [`visitor`] and [`naming`] sit alongside the pipeline: the former gives
//! read-only and rewriting traversals over the tree, the latter assigns
//! stable names to sub-expressions and maps a search engine's per-query
//! match report back onto them.
//!
//! # Example
//!
//! ```
//! use lucene_ql::parser::parse_query;
//! use lucene_ql::translate::{TranslateOptions, translate};
//!
//! let tree = parse_query("title:rust AND year:[2015 TO *]").unwrap();
//! assert_eq!(tree.to_string(), "title:rust AND year:[2015 TO *]");
//!
//! let options = TranslateOptions::new();
//! let query = translate(&tree, &options).unwrap();
//! assert!(query["bool"]["must"].is_array());
//! ```
//!
//! # License
//! Provided under the MIT license. See [LICENSE](https://github.com/creative-forest/lucene-ql/blob/main/LICENSE).

pub mod ast;
pub mod checker;
pub mod code;
pub mod error;
pub mod lexer;
pub mod naming;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod token;
pub mod trace;
pub mod translate;
pub mod util;
pub mod visitor;

pub use ast::Node;
pub use error::LuceneError;
pub use parser::parse_query;
pub use translate::translate;
