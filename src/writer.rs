//! Durable note writing into the vault, with deterministic collision
//! resolution.

use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Result, VoxnoteError};

/// Writes Markdown documents into `<vault>/<output_folder>`.
pub struct NoteWriter {
    vault_path: PathBuf,
    output_path: PathBuf,
}

impl NoteWriter {
    pub fn new(vault_path: &Path, output_folder: &str) -> Self {
        Self {
            vault_path: vault_path.to_path_buf(),
            output_path: vault_path.join(output_folder),
        }
    }

    /// Verify the vault is an existing, writable directory.
    ///
    /// Write access is tested by creating the output folder.
    pub fn verify_vault_access(&self) -> Result<()> {
        if !self.vault_path.exists() {
            return Err(VoxnoteError::Write {
                message: format!("vault path does not exist: {}", self.vault_path.display()),
            });
        }
        if !self.vault_path.is_dir() {
            return Err(VoxnoteError::Write {
                message: format!(
                    "vault path is not a directory: {}",
                    self.vault_path.display()
                ),
            });
        }
        fs::create_dir_all(&self.output_path).map_err(|e| VoxnoteError::Write {
            message: format!("no write permission for vault {}: {e}", self.vault_path.display()),
        })?;
        Ok(())
    }

    /// Write content under the desired filename, exactly once, resolving
    /// name collisions with a `_N` suffix.
    ///
    /// A post-write existence check turns a silently dropped write into an
    /// error rather than a false success.
    pub fn write(&self, content: &str, filename: &str) -> Result<PathBuf> {
        self.ensure_output_directory()?;

        let path = self.unique_path(filename)?;

        tracing::info!(file = %path.display(), "writing note");
        fs::write(&path, content).map_err(|e| VoxnoteError::Write {
            message: format!("failed to write {filename}: {e}"),
        })?;

        if !path.exists() {
            return Err(VoxnoteError::Write {
                message: format!("file was not created: {}", path.display()),
            });
        }

        Ok(path)
    }

    fn ensure_output_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.output_path).map_err(|e| VoxnoteError::Write {
            message: format!(
                "failed to create output directory {}: {e}",
                self.output_path.display()
            ),
        })
    }

    /// First free path for the desired name: the bare name if unused,
    /// otherwise `<stem>_1<ext>`, `<stem>_2<ext>`, ... up to the probe
    /// ceiling.
    fn unique_path(&self, filename: &str) -> Result<PathBuf> {
        let base_path = self.output_path.join(filename);
        if !base_path.exists() {
            return Ok(base_path);
        }

        let stem = base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let extension = base_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        for counter in 1..=defaults::MAX_COLLISION_PROBES {
            let candidate = self.output_path.join(format!("{stem}_{counter}{extension}"));
            if !candidate.exists() {
                tracing::info!(
                    requested = filename,
                    using = %candidate.display(),
                    "filename already exists, using suffixed name"
                );
                return Ok(candidate);
            }
        }

        Err(VoxnoteError::Write {
            message: format!(
                "could not find unique filename for {filename} after {} attempts",
                defaults::MAX_COLLISION_PROBES
            ),
        })
    }
}
