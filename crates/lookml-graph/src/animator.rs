use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use git2::{ObjectType, Repository, Sort, TreeWalkMode, TreeWalkResult};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame as GifFrame};
use tracing::{debug, info, warn};

use lookml_core::GrapherConfig;

use crate::error::{GraphError, Result};
use crate::grapher::LookmlGrapher;
use crate::render::Renderer;

const FRAME_DELAY_MS: u32 = 750;

/// One snapshot of the dependency graph at a commit.
#[derive(Debug, Clone)]
pub struct Frame {
    pub commit: String,
    pub timestamp: i64,
    pub summary: String,
    pub dot: String,
}

/// Builds a GIF of the dependency graph's evolution across git history.
pub struct GraphAnimator {
    config: GrapherConfig,
}

impl GraphAnimator {
    pub fn new(config: GrapherConfig) -> Self {
        Self { config }
    }

    /// One graph per commit on `branch`, oldest first, read straight from
    /// each commit's tree without touching the working copy. Commits whose
    /// tree yields no parseable LookML are skipped.
    pub fn collect_frames(&self, repo_path: &Path, branch: &str) -> Result<Vec<Frame>> {
        let repo = Repository::open(repo_path)
            .map_err(|_| GraphError::BranchNotFound(format!("no repository at {}", repo_path.display())))?;
        let reference = repo
            .resolve_reference_from_short_name(branch)
            .map_err(|_| GraphError::BranchNotFound(branch.to_string()))?;

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::REVERSE)?;
        revwalk.push(
            reference
                .target()
                .ok_or_else(|| git2::Error::from_str("invalid reference target"))?,
        )?;

        let mut frames = Vec::new();
        for oid_res in revwalk {
            let oid = match oid_res {
                Ok(oid) => oid,
                Err(_) => continue,
            };
            let commit = match repo.find_commit(oid) {
                Ok(c) => c,
                Err(_) => continue,
            };

            let mut grapher = LookmlGrapher::new(self.config.clone());
            let tree = commit.tree()?;
            tree.walk(TreeWalkMode::PreOrder, |root, entry| {
                if entry.kind() != Some(ObjectType::Blob) {
                    return TreeWalkResult::Ok;
                }
                let Some(name) = entry.name() else {
                    return TreeWalkResult::Ok;
                };
                if !name.ends_with(".lkml") {
                    return TreeWalkResult::Ok;
                }
                if let Ok(object) = entry.to_object(&repo) {
                    if let Some(blob) = object.as_blob() {
                        if let Ok(source) = std::str::from_utf8(blob.content()) {
                            let path = PathBuf::from(format!("{}{}", root, name));
                            if grapher.process_source(&path, source).is_err() {
                                debug!("Skipping unparseable blob {}", path.display());
                            }
                        }
                    }
                }
                TreeWalkResult::Ok
            })?;

            if grapher.is_empty() {
                debug!("Commit {} has no LookML, skipping frame", oid);
                continue;
            }
            grapher.tag_orphans();

            let short = oid.to_string()[..8].to_string();
            let timestamp = commit.time().seconds();
            let date = Utc
                .timestamp_opt(timestamp, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let title = format!("{} ({})", date, short);
            frames.push(Frame {
                commit: short,
                timestamp,
                summary: commit.summary().unwrap_or("").to_string(),
                dot: grapher.to_dot(Some(&title)),
            });
        }
        info!("Collected {} graph frames from {}", frames.len(), branch);
        Ok(frames)
    }

    /// Render numbered PNG frames into `image_dir` and assemble them into a
    /// GIF at `gif_path`.
    pub fn create_gif(
        &self,
        repo_path: &Path,
        branch: &str,
        image_dir: &Path,
        gif_path: &Path,
    ) -> Result<()> {
        let frames = self.collect_frames(repo_path, branch)?;
        if frames.is_empty() {
            warn!("No frames collected, not writing a GIF");
            return Ok(());
        }
        fs::create_dir_all(image_dir)?;

        let renderer = Renderer::new(&self.config.render_engine);
        let mut pngs = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            let png = image_dir.join(format!("frame_{:04}.png", i));
            renderer.render(&frame.dot, &png)?;
            pngs.push(png);
        }

        if self.config.render_engine == "none" {
            info!("Render engine is 'none': wrote DOT frames only, skipping GIF");
            return Ok(());
        }

        let mut encoder = GifEncoder::new(File::create(gif_path)?);
        encoder.set_repeat(Repeat::Infinite)?;
        for png in &pngs {
            let img = image::open(png)?.to_rgba8();
            encoder.encode_frame(GifFrame::from_parts(
                img,
                0,
                0,
                Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1),
            ))?;
        }
        info!("Wrote {}-frame GIF to {}", frames.len(), gif_path.display());
        Ok(())
    }
}
