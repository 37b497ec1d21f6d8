use std::path::Path;

use lookml_core::{FieldKind, LookmlError, Result, RuleConfig};
use lookml_parser::{Field, LookmlFile, Value};

/// A check over one parsed file. Returns true on pass.
pub trait FileRule {
    fn name(&self) -> &'static str;
    fn check(&self, path: &Path, file: &LookmlFile) -> bool;
}

/// A check over one field of a view. Returns true on pass.
pub trait FieldRule {
    fn name(&self) -> &'static str;
    fn applies_to(&self, field: &Field<'_>) -> bool;
    fn check(&self, field: &Field<'_>) -> bool;
}

/// Closed name → rule registries. Unknown names fail configuration at
/// linter construction, not at first use.
pub fn file_rule(config: &RuleConfig) -> Result<Box<dyn FileRule>> {
    match config.name.as_str() {
        "DataSourceRule" => Ok(Box::new(DataSourceRule)),
        "OneViewPerFileRule" => Ok(Box::new(OneViewPerFileRule)),
        "FilenameViewnameMatchRule" => Ok(Box::new(FilenameViewnameMatchRule)),
        other => Err(LookmlError::Configuration(format!(
            "unknown file-level rule '{}'",
            other
        ))),
    }
}

pub fn field_rule(config: &RuleConfig) -> Result<Box<dyn FieldRule>> {
    match config.name.as_str() {
        "DescriptionRule" => Ok(Box::new(DescriptionRule)),
        "DrillDownRule" => Ok(Box::new(DrillDownRule)),
        "YesNoNameRule" => Ok(Box::new(YesNoNameRule)),
        "CountNameRule" => Ok(Box::new(CountNameRule)),
        "AllCapsRule" => Ok(Box::new(AllCapsRule)),
        "LexiconRule" => Ok(Box::new(LexiconRule {
            phrases: config.phrases.clone(),
        })),
        other => Err(LookmlError::Configuration(format!(
            "unknown field-level rule '{}'",
            other
        ))),
    }
}

fn field_type<'a>(field: &Field<'a>) -> Option<&'a str> {
    field.property("type").and_then(Value::as_text)
}

/// Every view declares where its data comes from.
pub struct DataSourceRule;

impl FileRule for DataSourceRule {
    fn name(&self) -> &'static str {
        "DataSourceRule"
    }

    fn check(&self, _path: &Path, file: &LookmlFile) -> bool {
        file.views().iter().all(|view| {
            view.property("sql_table_name").is_some()
                || view.property("extends").is_some()
                || view.block.blocks_of("derived_table").next().is_some()
        })
    }
}

pub struct OneViewPerFileRule;

impl FileRule for OneViewPerFileRule {
    fn name(&self) -> &'static str {
        "OneViewPerFileRule"
    }

    fn check(&self, _path: &Path, file: &LookmlFile) -> bool {
        file.views().len() <= 1
    }
}

/// `foo.view.lkml` must contain `view: foo`.
pub struct FilenameViewnameMatchRule;

impl FileRule for FilenameViewnameMatchRule {
    fn name(&self) -> &'static str {
        "FilenameViewnameMatchRule"
    }

    fn check(&self, path: &Path, file: &LookmlFile) -> bool {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let base = stem.strip_suffix(".view").unwrap_or(&stem);
        file.views().iter().all(|view| view.name == base)
    }
}

pub struct DescriptionRule;

impl FieldRule for DescriptionRule {
    fn name(&self) -> &'static str {
        "DescriptionRule"
    }

    fn applies_to(&self, _field: &Field<'_>) -> bool {
        true
    }

    fn check(&self, field: &Field<'_>) -> bool {
        field.description().map(|d| !d.is_empty()).unwrap_or(false)
    }
}

/// Measures should offer drill fields.
pub struct DrillDownRule;

impl FieldRule for DrillDownRule {
    fn name(&self) -> &'static str {
        "DrillDownRule"
    }

    fn applies_to(&self, field: &Field<'_>) -> bool {
        field.kind == FieldKind::Measure
    }

    fn check(&self, field: &Field<'_>) -> bool {
        field.property("drill_fields").is_some()
    }
}

/// yesno dimensions read as questions: is_* or has_*.
pub struct YesNoNameRule;

impl FieldRule for YesNoNameRule {
    fn name(&self) -> &'static str {
        "YesNoNameRule"
    }

    fn applies_to(&self, field: &Field<'_>) -> bool {
        field.kind == FieldKind::Dimension && field_type(field) == Some("yesno")
    }

    fn check(&self, field: &Field<'_>) -> bool {
        field.name.starts_with("is_") || field.name.starts_with("has_")
    }
}

/// count measures end in _count.
pub struct CountNameRule;

impl FieldRule for CountNameRule {
    fn name(&self) -> &'static str {
        "CountNameRule"
    }

    fn applies_to(&self, field: &Field<'_>) -> bool {
        field.kind == FieldKind::Measure && field_type(field) == Some("count")
    }

    fn check(&self, field: &Field<'_>) -> bool {
        field.name.ends_with("_count")
    }
}

pub struct AllCapsRule;

impl FieldRule for AllCapsRule {
    fn name(&self) -> &'static str {
        "AllCapsRule"
    }

    fn applies_to(&self, _field: &Field<'_>) -> bool {
        true
    }

    fn check(&self, field: &Field<'_>) -> bool {
        !(field.name.chars().any(|c| c.is_ascii_alphabetic())
            && field.name == field.name.to_uppercase())
    }
}

/// Configured phrases must not appear in labels or descriptions.
pub struct LexiconRule {
    pub phrases: Vec<String>,
}

impl FieldRule for LexiconRule {
    fn name(&self) -> &'static str {
        "LexiconRule"
    }

    fn applies_to(&self, _field: &Field<'_>) -> bool {
        true
    }

    fn check(&self, field: &Field<'_>) -> bool {
        let texts = [
            field.description().unwrap_or(""),
            field
                .property("label")
                .and_then(Value::as_text)
                .unwrap_or(""),
        ];
        !self
            .phrases
            .iter()
            .any(|phrase| texts.iter().any(|t| t.contains(phrase.as_str())))
    }
}
