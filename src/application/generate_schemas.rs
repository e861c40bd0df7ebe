//! Use case for compiling resource schemas

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use crate::application::{
    ApplicationError, GenerateSchemasRequest, GenerateSchemasResponse, OutputService,
};
use crate::generation::{OpenApiLoader, SchemaGenerator, ValidationError};

/// Use case for compiling the schemas of one resource
pub struct GenerateSchemasUseCase {
    openapi_loader: Arc<dyn OpenApiLoader>,
    output_service: Arc<dyn OutputService>,
    cancellation: Option<Arc<AtomicBool>>,
}

impl GenerateSchemasUseCase {
    pub fn new(
        openapi_loader: Arc<dyn OpenApiLoader>,
        output_service: Arc<dyn OutputService>,
    ) -> Self {
        Self {
            openapi_loader,
            output_service,
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub async fn execute(
        &self,
        request: GenerateSchemasRequest,
    ) -> Result<GenerateSchemasResponse, ApplicationError> {
        // 1. Validate request
        request.validate()?;

        // 2. Load the OpenAPI document
        let document = self.openapi_loader.load(&request.openapi_source).await?;

        // 3. Compile; schema trees never outlive this block
        let result = {
            let mut generator =
                SchemaGenerator::new(document.as_ref(), request.config, request.resource);
            if let Some(flag) = &self.cancellation {
                generator = generator.with_cancellation(Arc::clone(flag));
            }
            generator.generate()?
        };

        for warning in &result.validation_warnings {
            warn!(code = %warning.code(), field = %warning.field_path(), "{warning}");
        }

        // 4. Write artifacts
        let artifacts_count = match &request.output_dir {
            Some(output_dir) => {
                let artifacts = result.artifacts()?;
                self.output_service
                    .write_artifacts(output_dir, &artifacts)
                    .await?
                    .len()
            }
            None => 0,
        };

        info!(
            source = %request.openapi_source,
            artifacts = artifacts_count,
            generation_warnings = result.generation_warnings.len(),
            validation_warnings = result.validation_warnings.len(),
            "schema generation finished"
        );

        Ok(GenerateSchemasResponse {
            artifacts_count,
            output_path: request.output_dir,
            result,
        })
    }

    /// Load the document and run only the cross-action validation
    pub async fn validate(
        &self,
        request: GenerateSchemasRequest,
    ) -> Result<Vec<ValidationError>, ApplicationError> {
        request.validate()?;
        let document = self.openapi_loader.load(&request.openapi_source).await?;
        let generator = SchemaGenerator::new(document.as_ref(), request.config, request.resource);
        Ok(generator.validate())
    }
}
