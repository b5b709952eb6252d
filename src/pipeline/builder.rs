// Theme build: config-driven batch over the cursor encoders

use anyhow::{Context, Result, bail};
use glob::{MatchOptions, Pattern};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::bitmap::ingest;
use super::fs_ops::{ensure_dir, install_dirs};
use super::windows::{WinOptions, to_win_with};
use super::xcursor_writer::to_x11;
use crate::config::{CursorJob, Platform, ThemeConfig};

/// Files written by a successful build, at their final locations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub x11: Vec<PathBuf>,
    pub windows: Vec<PathBuf>,
    /// Cursor keys whose pattern matched no bitmaps.
    pub skipped: Vec<String>,
}

impl BuildReport {
    pub fn len(&self) -> usize {
        self.x11.len() + self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.x11.iter().chain(self.windows.iter())
    }
}

/// What one cursor produced, relative to its theme directory.
#[derive(Debug, Default)]
struct CursorOutput {
    key: String,
    x11: Option<PathBuf>,
    windows: Option<PathBuf>,
}

pub struct ThemeBuilder {
    config: ThemeConfig,
}

impl ThemeBuilder {
    pub fn new(config: ThemeConfig) -> Self {
        Self { config }
    }

    pub fn x11_dir(&self) -> PathBuf {
        self.config.config.out_dir.join(&self.config.theme.name)
    }

    pub fn windows_dir(&self) -> PathBuf {
        self.config
            .config
            .out_dir
            .join(format!("{}-Windows", self.config.theme.name))
    }

    /// Render every configured cursor and move the finished themes into
    /// `out_dir`. Nothing under `out_dir` changes unless all cursors succeed,
    /// and a failed install puts back the themes it replaced.
    pub fn build(&self) -> Result<BuildReport> {
        let name = &self.config.theme.name;
        if name.is_empty() || name.contains(['/', '\\']) {
            bail!("invalid theme name '{}'", name);
        }

        let jobs = self.config.jobs().context("Invalid cursor settings")?;
        check_unique_names(&jobs)?;

        let bitmaps_dir = &self.config.config.bitmaps_dir;
        if !bitmaps_dir.is_dir() {
            bail!("Bitmaps directory not found: {}", bitmaps_dir.display());
        }

        let out_dir = &self.config.config.out_dir;
        ensure_dir(out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(".clickgen-")
            .tempdir_in(out_dir)
            .with_context(|| {
                format!("Failed to create staging directory in {}", out_dir.display())
            })?;

        let x11_stage = staging.path().join(name);
        let win_stage = staging.path().join(format!("{}-Windows", name));
        let x11_enabled = self.config.has_platform(Platform::X11);
        let win_enabled = self.config.has_platform(Platform::Windows);

        if x11_enabled {
            fs::create_dir_all(x11_stage.join("cursors"))?;
        }
        if win_enabled {
            fs::create_dir_all(&win_stage)?;
        }

        info!(theme = %name, cursors = jobs.len(), "building theme");

        let render = || -> Result<Vec<CursorOutput>> {
            jobs.par_iter()
                .map(|job| {
                    self.build_cursor(job, &x11_stage, &win_stage)
                        .with_context(|| format!("Failed to build cursor '{}'", job.key))
                })
                .collect()
        };

        let outputs = match self.config.config.thread_count {
            0 => render()?,
            n => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .context("Failed to start worker pool")?
                .install(render)?,
        };

        let mut report = BuildReport::default();
        for output in outputs {
            if output.x11.is_none() && output.windows.is_none() {
                report.skipped.push(output.key);
                continue;
            }
            if let Some(rel) = output.x11 {
                report.x11.push(self.x11_dir().join(rel));
            }
            if let Some(rel) = output.windows {
                report.windows.push(self.windows_dir().join(rel));
            }
        }

        let mut moves = Vec::new();
        if x11_enabled {
            moves.push((x11_stage.clone(), self.x11_dir()));
        }
        if win_enabled {
            moves.push((win_stage.clone(), self.windows_dir()));
        }
        install_dirs(&moves, staging.path())
            .with_context(|| format!("Failed to install theme into {}", out_dir.display()))?;

        info!(
            theme = %name,
            x11 = report.x11.len(),
            windows = report.windows.len(),
            skipped = report.skipped.len(),
            "theme built"
        );
        Ok(report)
    }

    fn build_cursor(
        &self,
        job: &CursorJob,
        x11_stage: &Path,
        win_stage: &Path,
    ) -> Result<CursorOutput> {
        let mut output = CursorOutput {
            key: job.key.clone(),
            ..Default::default()
        };

        let paths = find_bitmaps(&self.config.config.bitmaps_dir, &job.png)?;
        if paths.is_empty() {
            warn!(cursor = %job.key, pattern = %job.png, "no bitmaps matched, skipping");
            return Ok(output);
        }

        let blobs = paths
            .iter()
            .map(|path| {
                fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.config.has_platform(Platform::X11) {
            let cursor = ingest(&blobs, job.hotspot, &job.x11_sizes, job.x11_delay)?;
            let data = to_x11(cursor.frames())?;
            let rel = Path::new("cursors").join(&job.x11_name);
            fs::write(x11_stage.join(&rel), data)?;
            output.x11 = Some(rel);
        }

        let windows = job
            .windows
            .as_ref()
            .filter(|_| self.config.has_platform(Platform::Windows));
        if let Some(target) = windows {
            let cursor = ingest(&blobs, job.hotspot, &target.sizes, target.delay)?;
            let options = match &self.config.shadow {
                Some(shadow) => WinOptions::new().with_shadow_config(shadow.clone()),
                None => WinOptions::new(),
            };
            let (ext, data) = to_win_with(cursor, &options)?;
            let rel = PathBuf::from(format!("{}{}", target.name, ext));
            fs::write(win_stage.join(&rel), data)?;
            output.windows = Some(rel);
        }

        info!(cursor = %job.key, frames = blobs.len(), "cursor built");
        Ok(output)
    }
}

/// Bitmaps under `dir` whose relative path matches the glob `pattern`,
/// sorted by path. Wildcards stop at `/`; only `**` descends.
pub fn find_bitmaps(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher =
        Pattern::new(pattern).with_context(|| format!("Invalid bitmap pattern '{}'", pattern))?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        if matcher.matches_path_with(rel, options) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

fn check_unique_names(jobs: &[CursorJob]) -> Result<()> {
    let mut x11 = HashSet::new();
    let mut win = HashSet::new();
    for job in jobs {
        if !x11.insert(job.x11_name.as_str()) {
            bail!("x11_name '{}' is used by more than one cursor", job.x11_name);
        }
        if let Some(target) = &job.windows {
            if !win.insert(target.name.as_str()) {
                bail!("win_name '{}' is used by more than one cursor", target.name);
            }
        }
    }
    Ok(())
}
