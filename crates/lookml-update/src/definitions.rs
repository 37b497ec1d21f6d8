use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::info;

use lookml_core::{Definition, DefinitionsConfig, FieldKind, LookmlError, Result};

/// A source of desired field descriptions. Read-only; loaded once per run.
pub trait DefinitionsProvider {
    fn get_definitions(&self) -> Result<Vec<Definition>>;
}

/// Closed registry mapping the configuration discriminator to a provider.
/// Validated at construction, not at first use.
pub fn provider_for(config: &DefinitionsConfig) -> Result<Box<dyn DefinitionsProvider>> {
    match config.kind.as_str() {
        "csv" => Ok(Box::new(CsvDefinitionsProvider::new(&config.filename))),
        other => Err(LookmlError::Configuration(format!(
            "unknown definitions provider '{}' (expected one of: csv)",
            other
        ))),
    }
}

/// Definitions backed by a CSV file with columns {file, type, name, definition}.
pub struct CsvDefinitionsProvider {
    path: PathBuf,
}

impl CsvDefinitionsProvider {
    const REQUIRED_COLUMNS: [&'static str; 4] = ["file", "type", "name", "definition"];

    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DefinitionsProvider for CsvDefinitionsProvider {
    fn get_definitions(&self) -> Result<Vec<Definition>> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            LookmlError::Csv(format!(
                "failed to open definitions file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let headers = reader
            .headers()
            .map_err(|e| LookmlError::Csv(e.to_string()))?
            .clone();
        let column = |name: &str| -> Result<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                LookmlError::Configuration(format!(
                    "definitions file {} is missing required column '{}'",
                    self.path.display(),
                    name
                ))
            })
        };
        let [file_col, type_col, name_col, definition_col] = [
            column(Self::REQUIRED_COLUMNS[0])?,
            column(Self::REQUIRED_COLUMNS[1])?,
            column(Self::REQUIRED_COLUMNS[2])?,
            column(Self::REQUIRED_COLUMNS[3])?,
        ];

        let mut definitions = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| LookmlError::Csv(e.to_string()))?;
            let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
            definitions.push(Definition {
                file: field(file_col),
                kind: FieldKind::from_str(record.get(type_col).unwrap_or(""))?,
                name: field(name_col),
                definition: field(definition_col),
            });
        }
        info!(
            "Loaded {} definitions from {}",
            definitions.len(),
            self.path.display()
        );
        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unknown_discriminator_rejected_at_construction() {
        let config = DefinitionsConfig {
            kind: "bigquery".to_string(),
            filename: PathBuf::from("defs.csv"),
        };
        assert!(matches!(
            provider_for(&config).err(),
            Some(LookmlError::Configuration(_))
        ));
    }

    #[test]
    fn loads_definitions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.csv");
        fs::write(
            &path,
            "file,type,name,definition\n\
             a.view.lkml,dimension,city,City of the order\n\
             a.view.lkml,measure,total,Total revenue\n",
        )
        .unwrap();

        let defs = CsvDefinitionsProvider::new(&path).get_definitions().unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].kind, FieldKind::Dimension);
        assert_eq!(defs[0].name, "city");
        assert_eq!(defs[1].kind, FieldKind::Measure);
    }

    #[test]
    fn missing_column_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.csv");
        fs::write(&path, "file,name,definition\na,b,c\n").unwrap();

        let err = CsvDefinitionsProvider::new(&path)
            .get_definitions()
            .unwrap_err();
        assert!(matches!(err, LookmlError::Configuration(_)));
    }

    #[test]
    fn bad_type_value_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definitions.csv");
        fs::write(
            &path,
            "file,type,name,definition\na.view.lkml,filter,city,Text\n",
        )
        .unwrap();

        let err = CsvDefinitionsProvider::new(&path)
            .get_definitions()
            .unwrap_err();
        assert!(matches!(err, LookmlError::Configuration(_)));
    }

    #[test]
    fn missing_file_is_csv_error() {
        let err = CsvDefinitionsProvider::new("no/such/definitions.csv")
            .get_definitions()
            .unwrap_err();
        assert!(matches!(err, LookmlError::Csv(_)));
    }
}
