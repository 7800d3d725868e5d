//! Implements MediaFiles on the local uploads directory.
//!
//! Layout under the uploads root:
//! - `<name>`: original upload
//! - `rescaled/rescaled_<name>`: rescaled variant
//! - `profilepics/<name>`: profile pictures
//! - `deleted/`: everything relocated by a user cleanup

use crate::domain::DomainError;
use crate::ports::MediaFiles;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const DELETED_DIR: &str = "deleted";
const RESCALED_DIR: &str = "rescaled";
const PROFILE_PICS_DIR: &str = "profilepics";
const RESCALED_PREFIX: &str = "rescaled_";

/// Moves files into `deleted/` instead of unlinking them, so an admin can restore them.
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn deleted_dir(&self) -> PathBuf {
        self.root.join(DELETED_DIR)
    }

    /// Rejects names that would escape their directory.
    fn checked_name(file_name: &str) -> Result<&str, DomainError> {
        let bad = file_name.is_empty()
            || file_name == "."
            || file_name == ".."
            || file_name.contains(['/', '\\']);
        if bad {
            return Err(DomainError::Files(format!(
                "refusing to relocate {:?}",
                file_name
            )));
        }
        Ok(file_name)
    }

    async fn relocate(&self, from: PathBuf, to_name: &str) -> Result<(), DomainError> {
        let deleted = self.deleted_dir();
        fs::create_dir_all(&deleted)
            .await
            .map_err(|e| DomainError::Files(format!("create {}: {}", deleted.display(), e)))?;
        let to = deleted.join(to_name);
        fs::rename(&from, &to).await.map_err(|e| {
            DomainError::Files(format!(
                "move {} -> {}: {}",
                from.display(),
                to.display(),
                e
            ))
        })?;
        debug!(from = %from.display(), to = %to.display(), "file relocated");
        Ok(())
    }
}

#[async_trait::async_trait]
impl MediaFiles for UploadDir {
    async fn relocate_upload(&self, file_name: &str) -> Result<(), DomainError> {
        let name = Self::checked_name(file_name)?;
        self.relocate(self.root.join(name), name).await
    }

    async fn relocate_rescaled(&self, file_name: &str) -> Result<(), DomainError> {
        let name = format!("{}{}", RESCALED_PREFIX, Self::checked_name(file_name)?);
        self.relocate(self.root.join(RESCALED_DIR).join(&name), &name)
            .await
    }

    async fn relocate_profile_picture(&self, file_name: &str) -> Result<(), DomainError> {
        let name = Self::checked_name(file_name)?;
        self.relocate(self.root.join(PROFILE_PICS_DIR).join(name), name)
            .await
    }
}
