use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use lookml_core::{collect_lookml_files, LinterConfig, LookmlError, Result};
use lookml_graph::LookmlGrapher;
use lookml_parser::parse_file;

use crate::rules::{field_rule, file_rule, FieldRule, FileRule};

#[derive(Debug, Clone, Serialize)]
pub struct FileReportRow {
    pub time: String,
    pub file: String,
    pub rule: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReportRow {
    pub time: String,
    pub file: String,
    pub rule: String,
    pub field_type: String,
    pub field_name: String,
    pub passed: bool,
}

#[derive(Debug, Default)]
pub struct LintReport {
    pub file_rows: Vec<FileReportRow>,
    pub field_rows: Vec<FieldReportRow>,
}

impl LintReport {
    pub fn failures(&self) -> usize {
        self.file_rows.iter().filter(|r| !r.passed).count()
            + self.field_rows.iter().filter(|r| !r.passed).count()
    }
}

/// Runs the configured rules over a set of LookML files and writes the
/// CSV reports.
pub struct LookmlLinter {
    config: LinterConfig,
    file_rules: Vec<Box<dyn FileRule>>,
    field_rules: Vec<Box<dyn FieldRule>>,
    check_orphans: bool,
}

impl LookmlLinter {
    /// Instantiates every enabled rule up front so that misconfigured rule
    /// names fail here rather than mid-run.
    pub fn new(config: LinterConfig) -> Result<Self> {
        let mut file_rules = Vec::new();
        for rule in config.rules.file_level_rules.iter().filter(|r| r.run) {
            file_rules.push(file_rule(rule)?);
        }
        let mut field_rules = Vec::new();
        for rule in config.rules.field_level_rules.iter().filter(|r| r.run) {
            field_rules.push(field_rule(rule)?);
        }
        let mut check_orphans = false;
        for rule in config.rules.other_rules.iter().filter(|r| r.run) {
            match rule.name.as_str() {
                "NoOrphansRule" => check_orphans = true,
                other => {
                    return Err(LookmlError::Configuration(format!(
                        "unknown rule '{}'",
                        other
                    )))
                }
            }
        }
        Ok(Self {
            config,
            file_rules,
            field_rules,
            check_orphans,
        })
    }

    pub fn lint_file(&self, path: &Path) -> Result<LintReport> {
        let parsed = parse_file(path)?;
        let now = Utc::now().to_rfc3339();
        let file = path.display().to_string();
        let mut report = LintReport::default();

        for rule in &self.file_rules {
            report.file_rows.push(FileReportRow {
                time: now.clone(),
                file: file.clone(),
                rule: rule.name().to_string(),
                passed: rule.check(path, &parsed),
            });
        }

        for view in parsed.views() {
            for field in view.all_fields() {
                for rule in &self.field_rules {
                    if !rule.applies_to(&field) {
                        continue;
                    }
                    report.field_rows.push(FieldReportRow {
                        time: now.clone(),
                        file: file.clone(),
                        rule: rule.name().to_string(),
                        field_type: field.kind.to_string(),
                        field_name: field.name.to_string(),
                        passed: rule.check(&field),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Lint every LookML file under `dir` and write the CSV reports.
    pub fn run(&self, dir: &Path, globs: &[String]) -> Result<LintReport> {
        let files = collect_lookml_files(dir, globs)?;
        let mut report = LintReport::default();
        for file in &files {
            match self.lint_file(file) {
                Ok(mut one) => {
                    report.file_rows.append(&mut one.file_rows);
                    report.field_rows.append(&mut one.field_rows);
                }
                Err(LookmlError::Format(reason)) => {
                    warn!("Skipping {}: {}", file.display(), reason);
                }
                Err(e) => return Err(e),
            }
        }

        if self.check_orphans {
            self.append_orphan_rows(dir, globs, &mut report)?;
        }

        info!(
            "Linted {} files: {} findings failed",
            files.len(),
            report.failures()
        );
        self.write_reports(&report)?;
        Ok(report)
    }

    /// Whole-project rule: every view should be reachable from an explore.
    fn append_orphan_rows(&self, dir: &Path, globs: &[String], report: &mut LintReport) -> Result<()> {
        let mut grapher = LookmlGrapher::new(Default::default());
        for file in collect_lookml_files(dir, globs)? {
            if let Err(e) = grapher.process_file(&file) {
                warn!("NoOrphansRule skipping {}: {}", file.display(), e);
            }
        }
        grapher.tag_orphans();
        let now = Utc::now().to_rfc3339();
        for orphan in grapher.orphans() {
            report.file_rows.push(FileReportRow {
                time: now.clone(),
                file: orphan,
                rule: "NoOrphansRule".to_string(),
                passed: false,
            });
        }
        Ok(())
    }

    fn write_reports(&self, report: &LintReport) -> Result<()> {
        let to_csv_err = |e: csv::Error| LookmlError::Csv(e.to_string());

        let mut writer = csv::Writer::from_path(&self.config.output.file_output)
            .map_err(to_csv_err)?;
        for row in &report.file_rows {
            writer.serialize(row).map_err(to_csv_err)?;
        }
        writer.flush()?;

        let mut writer = csv::Writer::from_path(&self.config.output.field_output)
            .map_err(to_csv_err)?;
        for row in &report.field_rows {
            writer.serialize(row).map_err(to_csv_err)?;
        }
        writer.flush()?;

        info!(
            "Wrote {} and {}",
            self.config.output.file_output.display(),
            self.config.output.field_output.display()
        );
        Ok(())
    }
}
