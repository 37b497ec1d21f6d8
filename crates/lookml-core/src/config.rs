use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LookmlError, Result};

/// Top-level configuration for the tools. Loaded once and passed explicitly
/// into each tool's constructor; there is no process-global configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub grapher: GrapherConfig,
    #[serde(default)]
    pub linter: LinterConfig,
    #[serde(default)]
    pub updater: UpdaterConfig,
    #[serde(default = "Config::default_globs")]
    pub infile_globs: Vec<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&raw).map_err(|e| {
            LookmlError::Configuration(format!(
                "failed to parse config {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    fn default_globs() -> Vec<String> {
        vec!["*.lkml".to_string(), "**/*.lkml".to_string()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git: GitConfig::default(),
            grapher: GrapherConfig::default(),
            linter: LinterConfig::default(),
            updater: UpdaterConfig::default(),
            infile_globs: Self::default_globs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    pub url: String,
    pub folder: PathBuf,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            folder: PathBuf::from("gitrepo"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrapherConfig {
    /// Output image path for the rendered graph.
    pub output: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    /// External layout engine driven for raster output. "none" emits DOT only.
    #[serde(default = "GrapherConfig::default_engine")]
    pub render_engine: String,
}

impl GrapherConfig {
    fn default_engine() -> String {
        "dot".to_string()
    }
}

impl Default for GrapherConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("graph.png"),
            title: None,
            render_engine: Self::default_engine(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinterConfig {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub output: LintOutputConfig,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            output: LintOutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub file_level_rules: Vec<RuleConfig>,
    #[serde(default)]
    pub field_level_rules: Vec<RuleConfig>,
    #[serde(default)]
    pub other_rules: Vec<RuleConfig>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let on = |name: &str| RuleConfig {
            name: name.to_string(),
            run: true,
            phrases: Vec::new(),
        };
        Self {
            file_level_rules: vec![
                on("DataSourceRule"),
                on("OneViewPerFileRule"),
                on("FilenameViewnameMatchRule"),
            ],
            field_level_rules: vec![
                on("DescriptionRule"),
                on("DrillDownRule"),
                on("YesNoNameRule"),
                on("CountNameRule"),
                on("AllCapsRule"),
                // no default phrase list; populate via config to activate
                on("LexiconRule"),
            ],
            other_rules: vec![on("NoOrphansRule")],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    #[serde(default = "RuleConfig::default_run")]
    pub run: bool,
    /// Phrase list for LexiconRule; unused by other rules.
    #[serde(default)]
    pub phrases: Vec<String>,
}

impl RuleConfig {
    fn default_run() -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintOutputConfig {
    pub file_output: PathBuf,
    pub field_output: PathBuf,
}

impl Default for LintOutputConfig {
    fn default() -> Self {
        Self {
            file_output: PathBuf::from("linter_file_report.csv"),
            field_output: PathBuf::from("linter_field_report.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    /// Match definitions on the input file's basename instead of its full
    /// path. Needed when pipelines clone into transient directories such as
    /// timestamped checkouts.
    #[serde(default)]
    pub use_basename: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Provider discriminator, e.g. "csv".
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: PathBuf,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            kind: "csv".to_string(),
            filename: PathBuf::from("definitions.csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.updater.definitions.kind, "csv");
        assert!(!config.updater.use_basename);
        assert_eq!(config.grapher.render_engine, "dot");
        let field_rules: Vec<&str> = config
            .linter
            .rules
            .field_level_rules
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert!(field_rules.contains(&"LexiconRule"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"updater": {"definitions": {"type": "csv", "filename": "defs.csv"}, "use_basename": true}}"#,
        )
        .unwrap();
        assert!(config.updater.use_basename);
        assert_eq!(config.updater.definitions.filename, PathBuf::from("defs.csv"));
        assert_eq!(config.infile_globs.len(), 2);
    }
}
