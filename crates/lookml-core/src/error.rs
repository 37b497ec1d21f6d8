use crate::types::FieldKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LookmlError>;

#[derive(Debug, Error)]
pub enum LookmlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Field not found: {kind} {name}")]
    Lookup { kind: FieldKind, name: String },

    #[error("Structural mismatch between parse tree and raw text: {0}")]
    StructuralMismatch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl LookmlError {
    pub fn lookup(kind: FieldKind, name: impl Into<String>) -> Self {
        LookmlError::Lookup {
            kind,
            name: name.into(),
        }
    }
}
