use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{GraphError, Result};

/// Drives the external graphviz layout engine. The DOT source is always
/// written next to the raster output; the engine "none" stops there.
pub struct Renderer {
    engine: String,
}

impl Renderer {
    pub fn new(engine: &str) -> Self {
        Self {
            engine: engine.to_string(),
        }
    }

    pub fn dot_path(output: &Path) -> PathBuf {
        output.with_extension("dot")
    }

    pub fn render(&self, dot: &str, output: &Path) -> Result<()> {
        let dot_path = Self::dot_path(output);
        fs::write(&dot_path, dot)?;
        debug!("Wrote DOT to {}", dot_path.display());

        if self.engine == "none" {
            return Ok(());
        }

        let status = Command::new(&self.engine)
            .arg("-Tpng")
            .arg(&dot_path)
            .arg("-o")
            .arg(output)
            .status()
            .map_err(|e| {
                GraphError::Render(format!(
                    "failed to run layout engine '{}': {} (is graphviz installed?)",
                    self.engine, e
                ))
            })?;
        if !status.success() {
            return Err(GraphError::Render(format!(
                "layout engine '{}' exited with {}",
                self.engine, status
            )));
        }
        info!("Rendered graph to {}", output.display());
        Ok(())
    }
}
