//! Composite OpenAPI loader that routes by source kind

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::{FileOpenApiLoader, HttpOpenApiLoader};
use crate::generation::{OasDocument, OpenApiLoader, ParserError};

/// Loads URLs over HTTP and everything else from the filesystem
pub struct CompositeOpenApiLoader {
    http: HttpOpenApiLoader,
    file: FileOpenApiLoader,
}

impl CompositeOpenApiLoader {
    pub fn new() -> Self {
        Self {
            http: HttpOpenApiLoader::new(),
            file: FileOpenApiLoader::new(),
        }
    }
}

impl Default for CompositeOpenApiLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `source` parses as an `http` or `https` URL
pub fn is_http_url(source: &str) -> bool {
    Url::parse(source).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[async_trait]
impl OpenApiLoader for CompositeOpenApiLoader {
    async fn load(&self, source: &str) -> Result<Box<dyn OasDocument>, ParserError> {
        if is_http_url(source) {
            debug!(source, "loading OpenAPI document over HTTP");
            self.http.load(source).await
        } else {
            debug!(source, "loading OpenAPI document from file");
            self.file.load(source).await
        }
    }
}
