//! Process-lifetime share configuration and its startup validation.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Bytes of entropy behind the access token (16 hex chars on the wire).
pub const TOKEN_BYTES: usize = 8;

pub const DEFAULT_PORT: u16 = 8000;

/// Everything a request handler may read. Fixed at startup, never mutated;
/// handlers hold it behind an `Arc`.
#[derive(Debug)]
pub struct ShareConfig {
    pub token: String,
    pub download: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub port: u16,
}

impl ShareConfig {
    /// Builds and validates the configuration. Every failure here is fatal —
    /// request handlers rely on these invariants and never re-check them.
    pub fn new(download: Option<PathBuf>, upload_dir: Option<PathBuf>, port: u16) -> Result<Self> {
        let token = new_token(TOKEN_BYTES)?;

        if let Some(path) = &download {
            check_download_file(path)?;
        }

        let upload_dir = match upload_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("failed to get current working directory")?,
        };
        check_upload_dir(&upload_dir)?;

        Ok(Self {
            token,
            download,
            upload_dir,
            port,
        })
    }

    /// Base name of the configured download, for the home page.
    pub fn download_basename(&self) -> Option<&str> {
        self.download
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }
}

/// Generates the shared secret from the OS CSPRNG. Hex keeps it short
/// enough to type by hand if the QR scan fails.
fn new_token(num_bytes: usize) -> Result<String> {
    let mut bytes = vec![0u8; num_bytes];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to read random bytes for token")?;
    Ok(hex::encode(bytes))
}

/// The download target must be a readable regular file right now.
fn check_download_file(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("download file {} is not accessible", path.display()))?;
    if metadata.is_dir() {
        bail!("download path {} is a directory", path.display());
    }
    // Open it too: metadata can succeed on a file we cannot read.
    std::fs::File::open(path)
        .with_context(|| format!("download file {} cannot be opened", path.display()))?;
    Ok(())
}

/// The upload directory must exist and accept writes. Probed with a
/// throwaway tempfile that is removed immediately.
fn check_upload_dir(dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dir)
        .with_context(|| format!("upload directory {} is not accessible", dir.display()))?;
    if !metadata.is_dir() {
        bail!("upload path {} is not a directory", dir.display());
    }

    tempfile::Builder::new()
        .prefix(".permcheck")
        .tempfile_in(dir)
        .with_context(|| format!("upload directory {} is not writable", dir.display()))?;

    Ok(())
}

/// Replaces a home-directory prefix with `~` for display.
pub fn collapse_home(path: &Path) -> String {
    if let Some(dirs) = directories::UserDirs::new() {
        if let Ok(rest) = path.strip_prefix(dirs.home_dir()) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rest.display());
        }
    }
    path.display().to_string()
}
