//! On-disk token persistence

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::tokens::TokenSet;
use crate::error::{Error, Result};

/// Single JSON record at a fixed path, readable only by the owner.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored token set. A missing file means "never authorized".
    pub fn load(&self) -> Result<Option<TokenSet>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::StorageCorrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Replace the stored record. The new content is written to a sibling
    /// temp file and renamed over the target, so readers never see a torn
    /// record.
    pub fn save(&self, tokens: &TokenSet) -> Result<()> {
        let mut content = serde_json::to_string_pretty(tokens).map_err(|e| Error::StorageIo {
            path: self.path.clone(),
            message: format!("failed to serialize tokens: {}", e),
        })?;
        content.push('\n');

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.temp_path();
        let written =
            write_private(&tmp, content.as_bytes()).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        tracing::debug!("Saved tokens to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tokens.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, err: io::Error) -> Error {
        Error::StorageIo {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

/// Create (or truncate) `path` with owner-only permissions and write `bytes`.
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;

    // `mode` only applies on creation; tighten a pre-existing temp file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(bytes)?;
    file.sync_all()
}
