//! Filesystem-based output service implementation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::application::{ApplicationError, OutputService};
use crate::generation::Artifact;

/// Output service that writes schema files to the filesystem
pub struct FileSystemOutputService;

impl FileSystemOutputService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemOutputService {
    fn default() -> Self {
        Self::new()
    }
}

fn output_error(action: &str, path: &Path, e: std::io::Error) -> ApplicationError {
    ApplicationError::OutputError(format!("Failed to {action} {}: {e}", path.display()))
}

#[async_trait]
impl OutputService for FileSystemOutputService {
    async fn write_artifacts(
        &self,
        root: &Path,
        artifacts: &[Artifact],
    ) -> Result<Vec<PathBuf>, ApplicationError> {
        fs::create_dir_all(root)
            .await
            .map_err(|e| output_error("create directory", root, e))?;

        let mut written = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            if artifact.path.is_absolute() {
                return Err(ApplicationError::OutputError(format!(
                    "artifact path must be relative: {}",
                    artifact.path.display()
                )));
            }
            let target = root.join(&artifact.path);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| output_error("create directory", parent, e))?;
            }

            let mut file = fs::File::create(&target)
                .await
                .map_err(|e| output_error("create file", &target, e))?;
            file.write_all(artifact.content.as_bytes())
                .await
                .map_err(|e| output_error("write file", &target, e))?;
            file.flush()
                .await
                .map_err(|e| output_error("flush file", &target, e))?;

            debug!(path = %target.display(), bytes = artifact.content.len(), "schema written");
            written.push(target);
        }

        Ok(written)
    }
}
