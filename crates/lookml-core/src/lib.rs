//! Shared foundation for the LookML tools: the error taxonomy, field and
//! definition types, typed configuration, and input file collection.

pub mod collect;
pub mod config;
pub mod error;
pub mod types;

pub use collect::collect_lookml_files;
pub use config::{
    Config, DefinitionsConfig, GitConfig, GrapherConfig, LintOutputConfig, LinterConfig,
    RuleConfig, RulesConfig, UpdaterConfig,
};
pub use error::{LookmlError, Result};
pub use types::{Definition, FieldKind};
