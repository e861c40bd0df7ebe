//! Port interfaces for the application layer

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ApplicationError;
use crate::generation::Artifact;

/// Destination for generated schema files
#[async_trait]
pub trait OutputService: Send + Sync {
    /// Write `artifacts` below `root`, returning the paths written in order.
    /// Artifact paths are relative; missing directories are created.
    async fn write_artifacts(
        &self,
        root: &Path,
        artifacts: &[Artifact],
    ) -> Result<Vec<PathBuf>, ApplicationError>;
}
