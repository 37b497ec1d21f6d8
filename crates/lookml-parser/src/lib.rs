//! Parser for the LookML dialect used by the tools: brace-delimited nested
//! records with `key: value` pairs, quoted strings, `sql_* ... ;;` values,
//! and bracketed lists. Produces a typed tree of views, explores, and fields.

pub mod ast;
pub mod parser;

pub use ast::{Block, Field, LookmlFile, Value, View};
pub use parser::{parse_file, parse_str};
