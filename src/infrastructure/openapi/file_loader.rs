//! File-based OpenAPI document loader
//!
//! This loader handles only file I/O. Parsing is done by [`JsonOasDocument`].

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::parser::JsonOasDocument;
use crate::generation::{OasDocument, OpenApiLoader, ParserError};

/// Loads OpenAPI documents from local files
pub struct FileOpenApiLoader;

impl FileOpenApiLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileOpenApiLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpenApiLoader for FileOpenApiLoader {
    async fn load(&self, source: &str) -> Result<Box<dyn OasDocument>, ParserError> {
        let content = fs::read_to_string(source).await?;
        debug!(source, bytes = content.len(), "read OpenAPI document");
        Ok(Box::new(JsonOasDocument::from_content(&content, source)?))
    }
}
