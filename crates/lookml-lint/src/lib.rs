//! Linter for LookML style and structure rules: per-file checks, per-field
//! checks, and a whole-project orphan-view check, reported as CSV.

pub mod linter;
pub mod rules;

pub use linter::{FieldReportRow, FileReportRow, LintReport, LookmlLinter};
pub use rules::{field_rule, file_rule, FieldRule, FileRule};
