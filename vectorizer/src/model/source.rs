//! Resolves model source identifiers to loadable locations.
//!
//! Packaged `.zip` artifacts that exist on the local filesystem are staged into a
//! working directory first; everything else is handed to the loader unchanged.
//! Staging goes through `tokio::fs`, so copying a large artifact never stalls a
//! runtime worker.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::EmbedError;

/// Maps a model source identifier to the location a [`super::ModelLoader`] should load.
#[derive(Clone, Debug)]
pub struct SourceResolver {
    staging_dir: PathBuf,
}

impl SourceResolver {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Resolves `identifier`:
    ///
    /// - `.zip` naming an existing local file (plain path or `file://` URI): copied into the
    ///   staging directory, returns the staged `file://` URI.
    /// - `.zip` not found locally: logged and passed through for the loader to try.
    /// - anything else: passed through.
    ///
    /// Copy failures are [`EmbedError::ModelUnavailable`]; nothing is cached, so the next
    /// call tries again.
    pub async fn resolve(&self, identifier: &str) -> Result<String, EmbedError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(EmbedError::unavailable(identifier, "empty model source"));
        }
        if !identifier.ends_with(".zip") {
            return Ok(identifier.to_string());
        }

        let local = Path::new(identifier.strip_prefix("file://").unwrap_or(identifier));
        let is_file = tokio::fs::metadata(local)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            warn!(
                model = %identifier,
                "packaged model not found locally; passing the identifier to the loader as is"
            );
            return Ok(identifier.to_string());
        }

        let staged = self
            .stage(local)
            .await
            .map_err(|e| EmbedError::unavailable(identifier, format!("staging failed: {}", e)))?;
        info!(model = %identifier, staged = %staged.display(), "staged packaged model");
        Ok(format!("file://{}", staged.display()))
    }

    async fn stage(&self, artifact: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let file_name = artifact.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "artifact has no file name")
        })?;
        let target = self.staging_dir.join(file_name);
        tokio::fs::copy(artifact, &target).await?;
        Ok(tokio::fs::canonicalize(&target).await.unwrap_or(target))
    }
}
