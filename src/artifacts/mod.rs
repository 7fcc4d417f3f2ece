//! Rolling directory of annotated debug screenshots.
//!
//! Every scan cycle writes one PNG named by its capture time and then trims
//! the directory to the newest `keep_count` files. Write and trim happen
//! together in [`ArtifactStore::save`]; the scan loop runs one cycle at a
//! time, so two trims never race.

pub mod annotate;

use chrono::{DateTime, Local};
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{ArtifactError, ConfigError};

pub const DEFAULT_KEEP_COUNT: usize = 5;
const FILE_PREFIX: &str = "screenshot_";
const FILE_EXTENSION: &str = "png";
const DIR_NAME: &str = "MacAux_tmp";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    keep_count: usize,
}

impl ArtifactStore {
    /// Uses `dir` as-is; the directory is created on first save.
    pub fn new(dir: PathBuf, keep_count: usize) -> Result<Self, ConfigError> {
        if keep_count == 0 {
            return Err(ConfigError::ZeroKeepCount);
        }
        Ok(Self { dir, keep_count })
    }

    /// Picks the first creatable, writable directory from `candidates`.
    pub fn resolve(candidates: &[PathBuf], keep_count: usize) -> anyhow::Result<Self> {
        let dir = resolve_dir(candidates)?;
        log::info!("artifact directory: {}", dir.display());
        Ok(Self::new(dir, keep_count)?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keep_count(&self) -> usize {
        self.keep_count
    }

    /// Writes `image` under a name derived from the current local time, then
    /// trims old artifacts.
    pub fn save(&self, image: &RgbaImage, placeholder: bool) -> Result<PathBuf, ArtifactError> {
        self.save_at(image, placeholder, Local::now())
    }

    pub(crate) fn save_at(
        &self,
        image: &RgbaImage,
        placeholder: bool,
        captured_at: DateTime<Local>,
    ) -> Result<PathBuf, ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.unique_path(&artifact_file_stem(captured_at, placeholder));
        image.save(&path).map_err(|source| ArtifactError::Encode {
            path: path.clone(),
            source,
        })?;
        log::debug!("saved artifact {}", path.display());

        let removed = self.trim()?;
        for old in &removed {
            log::debug!("removed old artifact {}", old.display());
        }
        Ok(path)
    }

    /// Artifacts currently on disk, newest first.
    pub fn list(&self) -> Result<Vec<PathBuf>, ArtifactError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ArtifactError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut artifacts: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_artifact(path))
            .map(|path| (created_time(&path), path))
            .collect();

        artifacts.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(artifacts.into_iter().map(|(_, path)| path).collect())
    }

    /// Deletes everything past the newest `keep_count` artifacts.
    pub fn trim(&self) -> Result<Vec<PathBuf>, ArtifactError> {
        let stale: Vec<PathBuf> = self.list()?.into_iter().skip(self.keep_count).collect();
        for path in &stale {
            fs::remove_file(path).map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(stale)
    }

    fn unique_path(&self, stem: &str) -> PathBuf {
        let first = self.dir.join(format!("{stem}.{FILE_EXTENSION}"));
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| self.dir.join(format!("{stem}_{n}.{FILE_EXTENSION}")))
            .find(|path| !path.exists())
            .unwrap_or(first)
    }
}

fn artifact_file_stem(captured_at: DateTime<Local>, placeholder: bool) -> String {
    let stamp = captured_at.format("%Y%m%d_%H%M%S_%3f");
    if placeholder {
        format!("{FILE_PREFIX}{stamp}_placeholder")
    } else {
        format!("{FILE_PREFIX}{stamp}")
    }
}

fn is_artifact(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(FILE_PREFIX))
        .unwrap_or(false);
    let is_png = path
        .extension()
        .map(|ext| ext == FILE_EXTENSION)
        .unwrap_or(false);
    has_prefix && is_png && path.is_file()
}

/// Creation time where the filesystem records it, else modification time.
fn created_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Candidate directories in fallback order: explicit override, app bundle,
/// next to the executable, Documents, then the OS temp dir.
pub fn default_candidates(override_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = override_dir {
        candidates.push(dir.to_path_buf());
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        if let Some(contents) = bundle_contents_dir(&exe_dir) {
            candidates.push(contents.join("tmp"));
        }
        candidates.push(exe_dir.join("tmp"));
    }

    if let Some(documents) = dirs::document_dir() {
        candidates.push(documents.join(DIR_NAME));
    }
    candidates.push(std::env::temp_dir().join(DIR_NAME));
    candidates
}

/// `<App>.app/Contents` when the executable lives in `Contents/MacOS`.
fn bundle_contents_dir(exe_dir: &Path) -> Option<PathBuf> {
    let contents = exe_dir.parent()?;
    let is_bundle = exe_dir.file_name()? == "MacOS"
        && contents.file_name()? == "Contents"
        && contents
            .parent()?
            .extension()
            .map(|ext| ext == "app")
            .unwrap_or(false);
    is_bundle.then(|| contents.to_path_buf())
}

pub fn resolve_dir(candidates: &[PathBuf]) -> Result<PathBuf, ArtifactError> {
    candidates
        .iter()
        .find(|dir| is_writable_dir(dir))
        .cloned()
        .ok_or_else(|| ArtifactError::NoWritableDirectory(candidates.to_vec()))
}

fn is_writable_dir(dir: &Path) -> bool {
    if let Err(err) = fs::create_dir_all(dir) {
        log::debug!("artifact candidate {} not creatable: {err}", dir.display());
        return false;
    }
    let check_file = dir.join(".macaux_write_check");
    match fs::write(&check_file, b"") {
        Ok(()) => {
            let _ = fs::remove_file(&check_file);
            true
        }
        Err(err) => {
            log::debug!("artifact candidate {} not writable: {err}", dir.display());
            false
        }
    }
}
