//! Collision-free destination paths for uploads, with exclusive-create writes.

use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Reduces a client-declared file name to its final path segment.
///
/// The declared name is untrusted: `../../etc/passwd` must land as `passwd`
/// inside the upload directory, never outside it. Returns `None` when no
/// usable segment remains (empty name, bare `..`, root, etc.).
pub fn sanitize_file_name(declared: &str) -> Option<String> {
    let name = Path::new(declared)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .next_back()?;

    if name.is_empty() || name.contains('\0') {
        return None;
    }

    Some(name.to_string())
}

/// Finds an available path in `dir` for `requested` by appending `_N` before
/// the extension: `report.pdf`, `report_1.pdf`, `report_2.pdf`, …
///
/// `occupied` answers "does this path already exist?". Only a definitive
/// "no" returns the path; a predicate error aborts allocation so a stat
/// failure can never turn into a silent overwrite.
///
/// Probing only reserves the name conceptually. The caller must create the
/// file with `ExclusiveFile` so a lost race fails loudly instead of
/// truncating — an accepted limitation for a single-operator tool.
pub fn allocate_with<F>(dir: &Path, requested: &str, mut occupied: F) -> io::Result<PathBuf>
where
    F: FnMut(&Path) -> io::Result<bool>,
{
    let (stem, ext) = split_extension(requested);

    let mut candidate = dir.join(requested);
    let mut counter = 1u32;
    loop {
        if !occupied(&candidate)? {
            return Ok(candidate);
        }
        candidate = dir.join(format!("{stem}_{counter}{ext}"));
        counter += 1;
    }
}

/// Filesystem-backed allocation. "Absent" is strictly a not-found stat;
/// permission or I/O errors propagate.
pub fn allocate(dir: &Path, requested: &str) -> io::Result<PathBuf> {
    allocate_with(dir, requested, |path| {
        match std::fs::symlink_metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    })
}

/// Splits `report.tar.gz` into `("report.tar", ".gz")` — the suffix goes
/// before the final extension only, matching `stem_1.gz` style names.
/// Dotfiles like `.gitignore` keep the whole name as the stem.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Exclusively-created output file.
///
/// RAII: the destination is unlinked on drop unless `commit` ran. A failed
/// or abandoned upload never leaves a partial file claiming the name.
pub struct ExclusiveFile {
    file: File,
    path: PathBuf,
    committed: bool,
}

impl ExclusiveFile {
    /// Creates `path` with create-new semantics. Fails (rather than
    /// truncates) if another writer claimed the name after allocation.
    pub async fn create(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to create {}", path.display()))?;

        Ok(Self {
            file,
            path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Flushes and syncs the file, then disarms the drop cleanup. The upload
    /// is durable once this returns.
    pub async fn commit(mut self) -> Result<()> {
        self.file.flush().await.context("flush upload")?;
        self.file.sync_all().await.context("sync upload")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for ExclusiveFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(err) = std::fs::remove_file(&self.path) {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove partial upload"
                );
            }
        }
    }
}
