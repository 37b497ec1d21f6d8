//! Description updater: loads desired field descriptions from a definitions
//! source and splices them into LookML source text while preserving the rest
//! of the file byte for byte.

pub mod definitions;
pub mod file_modifier;
pub mod modifier;

pub use definitions::{provider_for, CsvDefinitionsProvider, DefinitionsProvider};
pub use file_modifier::FileModifier;
pub use modifier::LookmlModifier;
