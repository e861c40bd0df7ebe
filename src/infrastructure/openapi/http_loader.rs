//! HTTP-based OpenAPI document loader

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::composite_loader::is_http_url;
use super::parser::JsonOasDocument;
use crate::generation::{OasDocument, OpenApiLoader, ParserError};

/// Loads OpenAPI documents from HTTP/HTTPS URLs
pub struct HttpOpenApiLoader {
    client: Client,
}

impl HttpOpenApiLoader {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });

        Self { client }
    }
}

impl Default for HttpOpenApiLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpenApiLoader for HttpOpenApiLoader {
    async fn load(&self, source: &str) -> Result<Box<dyn OasDocument>, ParserError> {
        if !is_http_url(source) {
            return Err(ParserError::Load(format!(
                "HttpOpenApiLoader only handles HTTP(S) URLs, got: {source}"
            )));
        }

        let response = self.client.get(source).send().await.map_err(|e| {
            ParserError::Load(format!("Failed to fetch OpenAPI document from {source}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParserError::Load(format!(
                "HTTP {status} when fetching {source}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let content = response
            .text()
            .await
            .map_err(|e| ParserError::Load(format!("Failed to read response body: {e}")))?;
        debug!(source, content_type = %content_type, bytes = content.len(), "fetched OpenAPI document");

        // the URL extension wins over the content type
        let has_extension = [".json", ".yaml", ".yml"]
            .iter()
            .any(|ext| source.ends_with(ext));
        let hint = if has_extension { source } else { content_type.as_str() };
        Ok(Box::new(JsonOasDocument::from_content(&content, hint)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ParserErrorCode;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_loader_json() {
        let mock_server = MockServer::start().await;

        let spec_json = r#"{
            "openapi": "3.0.0",
            "paths": {"/pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
        }"#;

        Mock::given(method("GET"))
            .and(path("/openapi"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(spec_json)
                    .insert_header("content-type", "application/json"),
            )
            .mount(&mock_server)
            .await;

        let loader = HttpOpenApiLoader::new();
        let url = format!("{}/openapi", mock_server.uri());
        let document = loader.load(&url).await.unwrap();
        assert!(document.find_path("/pets").is_some());
    }

    #[tokio::test]
    async fn test_http_loader_yaml() {
        let mock_server = MockServer::start().await;

        let spec_yaml = "openapi: 3.0.0\npaths:\n  /pets: {}\n";

        Mock::given(method("GET"))
            .and(path("/openapi.yaml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(spec_yaml)
                    .insert_header("content-type", "text/plain"),
            )
            .mount(&mock_server)
            .await;

        let loader = HttpOpenApiLoader::new();
        let url = format!("{}/openapi.yaml", mock_server.uri());
        let document = loader.load(&url).await.unwrap();
        assert!(document.find_path("/pets").is_some());
    }

    #[tokio::test]
    async fn test_http_loader_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/notfound"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let loader = HttpOpenApiLoader::new();
        let url = format!("{}/notfound", mock_server.uri());
        match loader.load(&url).await {
            Err(ParserError::Load(msg)) => assert!(msg.contains("HTTP 404")),
            Err(other) => panic!("Expected Load error, got {other}"),
            Ok(_) => panic!("Expected Load error"),
        }
    }

    #[tokio::test]
    async fn test_http_loader_invalid_document() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/broken.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"paths": {}}"#))
            .mount(&mock_server)
            .await;

        let loader = HttpOpenApiLoader::new();
        let url = format!("{}/broken.json", mock_server.uri());
        let err = loader.load(&url).await.err().unwrap();
        assert_eq!(err.code(), ParserErrorCode::ModelBuild);
    }

    #[tokio::test]
    async fn test_http_loader_non_http_url() {
        let loader = HttpOpenApiLoader::new();
        match loader.load("file:///path/to/spec.yaml").await {
            Err(ParserError::Load(msg)) => assert!(msg.contains("only handles HTTP")),
            Err(other) => panic!("Expected Load error, got {other}"),
            Ok(_) => panic!("Expected Load error"),
        }
    }
}
