use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::{debug, info};

use crate::error::{LookmlError, Result};

fn build_glob_set(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let compiled = Glob::new(glob)
            .map_err(|e| LookmlError::Configuration(format!("invalid glob '{}': {}", glob, e)))?;
        builder.add(compiled);
    }
    builder
        .build()
        .map_err(|e| LookmlError::Configuration(format!("failed to build glob set: {}", e)))
}

/// Walk `dir` and collect the LookML files matching any of `globs`,
/// relative to `dir`. Hidden and git-internal paths are skipped.
pub fn collect_lookml_files(dir: &Path, globs: &[String]) -> Result<Vec<PathBuf>> {
    info!("Collecting LookML files from: {:?}", dir);
    let glob_set = build_glob_set(globs)?;

    let mut files = Vec::new();
    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .ignore(true)
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        if glob_set.is_match(relative) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    debug!("Collected {} LookML files", files.len());
    Ok(files)
}
