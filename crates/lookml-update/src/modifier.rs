use std::path::Path;

use tracing::info;

use lookml_core::{Definition, FieldKind, LookmlError, Result, UpdaterConfig};
use lookml_parser::{parse_file, View};

use crate::definitions::provider_for;
use crate::file_modifier::FileModifier;

/// Orchestrates description updates for one file at a time: decides which
/// definitions apply and what changed, and delegates the text splice to
/// [`FileModifier`].
pub struct LookmlModifier {
    config: UpdaterConfig,
    definitions: Vec<Definition>,
}

impl LookmlModifier {
    /// Loads the definitions once; the provider discriminator is validated
    /// here, not at first use.
    pub fn new(config: UpdaterConfig) -> Result<Self> {
        let provider = provider_for(&config.definitions)?;
        let definitions = provider.get_definitions()?;
        Ok(Self {
            config,
            definitions,
        })
    }

    /// The description currently on `kind name`, or None when the field
    /// exists without one. A missing field is a lookup error, distinct from
    /// "field exists, no description".
    fn find_description<'a>(
        view: &View<'a>,
        kind: FieldKind,
        name: &str,
    ) -> Result<Option<&'a str>> {
        let field = view
            .field(kind, name)
            .ok_or_else(|| LookmlError::lookup(kind, name))?;
        Ok(field.description())
    }

    fn applicable<'a>(&'a self, infile: &Path) -> Vec<&'a Definition> {
        let full = infile.to_string_lossy();
        let basename = infile
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.config.use_basename {
            info!("Matching definitions on basename");
            self.definitions
                .iter()
                .filter(|d| d.file == basename)
                .collect()
        } else {
            self.definitions.iter().filter(|d| d.file == full).collect()
        }
    }

    /// Apply every matching definition to `infile` and write the result to
    /// `outfile`. The output is always written, even when nothing changed;
    /// on error nothing is written at all.
    pub fn modify<P: AsRef<Path>, Q: AsRef<Path>>(&self, infile: P, outfile: Q) -> Result<()> {
        let infile = infile.as_ref();
        let parsed = parse_file(infile)?;
        let view = parsed.single_view()?;

        let mut patcher = FileModifier::from_file(infile)?;

        for definition in self.applicable(infile) {
            info!("Processing {}: {}", definition.kind, definition.name);

            let existing = Self::find_description(&view, definition.kind, &definition.name)?;
            match existing {
                Some(text) => info!(
                    "Existing description for {}.{}: '{}'",
                    definition.kind, definition.name, text
                ),
                None => info!("No description for {}.{}", definition.kind, definition.name),
            }

            let current = existing.unwrap_or("");
            if current == definition.definition {
                info!(
                    "Description of {}.{} already up to date, skipping",
                    definition.kind, definition.name
                );
                continue;
            }

            let num_lines = current.split('\n').count();
            if existing.is_some() {
                info!(
                    "Update needed: {}.{} -> '{}' ({} line existing description)",
                    definition.kind, definition.name, definition.definition, num_lines
                );
            } else {
                info!(
                    "Injection needed: {}.{} -> '{}'",
                    definition.kind, definition.name, definition.definition
                );
            }

            patcher.modify(
                num_lines,
                definition.kind,
                &definition.name,
                &definition.definition,
                existing.is_some(),
            )?;
        }

        patcher.write(outfile.as_ref())
    }
}
