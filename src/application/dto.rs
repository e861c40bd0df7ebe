//! Data Transfer Objects for application layer

use std::path::PathBuf;

use crate::application::ApplicationError;
use crate::core::GeneratorConfig;
use crate::generation::{GenerationError, GenerationResult, ResourceConfig, ValidationError};

/// Request to compile the schemas of one resource
#[derive(Debug, Clone)]
pub struct GenerateSchemasRequest {
    /// File path or `http(s)://` URL of the OpenAPI document
    pub openapi_source: String,
    pub resource: ResourceConfig,
    pub config: GeneratorConfig,
    /// Where to write the schema files; nothing is written when unset
    pub output_dir: Option<PathBuf>,
}

impl GenerateSchemasRequest {
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.openapi_source.trim().is_empty() {
            return Err(ApplicationError::InvalidRequest(
                "OpenAPI source cannot be empty".to_string(),
            ));
        }
        if self.resource.verbs.is_empty() {
            return Err(ApplicationError::InvalidRequest(
                "resource declares no verbs".to_string(),
            ));
        }
        self.resource
            .validate()
            .map_err(|e| ApplicationError::InvalidRequest(e.to_string()))?;
        self.config
            .validate()
            .map_err(|e| ApplicationError::InvalidRequest(e.to_string()))?;
        Ok(())
    }
}

/// Response from schema generation
#[derive(Debug, Clone)]
pub struct GenerateSchemasResponse {
    pub artifacts_count: usize,
    pub output_path: Option<PathBuf>,
    pub result: GenerationResult,
}

impl GenerateSchemasResponse {
    pub fn generation_warnings(&self) -> &[GenerationError] {
        &self.result.generation_warnings
    }

    pub fn validation_warnings(&self) -> &[ValidationError] {
        &self.result.validation_warnings
    }
}
