//! Generation orchestration - runs the builders in order

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

use crate::core::GeneratorConfig;
use crate::generation::auth::supported_schemes;
use crate::generation::configuration::build_configuration_schema;
use crate::generation::context::{GenerationContext, Warnings};
use crate::generation::serializer::serialize;
use crate::generation::spec::build_spec_schema;
use crate::generation::status::build_status_schema;
use crate::generation::validation::validate_schemas;
use crate::generation::{
    GenerationError, GenerationResult, OasDocument, RecursionGuard, ResourceConfig, SchemaBlob,
    SchemaRef, ValidationError,
};

pub const SPEC: &str = "spec";
pub const STATUS: &str = "status";
pub const CONFIGURATION: &str = "configuration";

/// Compiles one resource declaration against one OpenAPI document.
///
/// A generator holds no state between calls; build a new one per request.
pub struct SchemaGenerator<'a> {
    document: &'a dyn OasDocument,
    config: GeneratorConfig,
    resource: ResourceConfig,
    cancellation: Option<Arc<AtomicBool>>,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(
        document: &'a dyn OasDocument,
        config: GeneratorConfig,
        resource: ResourceConfig,
    ) -> Self {
        Self {
            document,
            config,
            resource,
            cancellation: None,
        }
    }

    /// Abort guarded walks once `flag` is raised
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    fn context(&self) -> GenerationContext<'_> {
        let mut guard = RecursionGuard::new(self.config.guard);
        if let Some(flag) = &self.cancellation {
            guard = guard.with_cancellation(Arc::clone(flag));
        }
        GenerationContext::new(self.document, &self.config, &self.resource, guard)
    }

    /// Build every schema, then validate the declared actions.
    ///
    /// Only a serialization failure is returned as an error; everything else
    /// ends up in one of the two warning lists.
    pub fn generate(&self) -> Result<GenerationResult, GenerationError> {
        let ctx = self.context();
        let mut warnings = Warnings::default();

        debug!(verbs = self.resource.verbs.len(), "building spec schema");
        let spec = build_spec_schema(&ctx, &mut warnings);
        let spec = SchemaBlob::new(SPEC, Some(emit(&ctx, SPEC, &spec, &mut warnings)?));

        debug!("building status schema");
        let status = build_status_schema(&ctx, &mut warnings)
            .map(|schema| emit(&ctx, STATUS, &schema, &mut warnings))
            .transpose()?;
        let status = SchemaBlob::new(STATUS, status);

        debug!("building configuration schema");
        let configuration = build_configuration_schema(&ctx, &mut warnings)
            .map(|schema| emit(&ctx, CONFIGURATION, &schema, &mut warnings))
            .transpose()?;
        let configuration = SchemaBlob::new(CONFIGURATION, configuration);

        let authentication = supported_schemes(&self.document.security_schemes())
            .into_iter()
            .map(|kind| {
                let bytes = emit(&ctx, kind.name(), &kind.payload_schema(), &mut warnings)?;
                Ok(SchemaBlob::new(kind.name(), Some(bytes)))
            })
            .collect::<Result<Vec<_>, GenerationError>>()?;

        let validation_warnings = validate_schemas(&ctx);

        info!(
            status = status.is_present(),
            configuration = configuration.is_present(),
            authentication = authentication.len(),
            generation_warnings = warnings.len(),
            validation_warnings = validation_warnings.len(),
            "schemas generated"
        );

        Ok(GenerationResult {
            spec,
            status,
            configuration,
            authentication,
            generation_warnings: warnings.into_vec(),
            validation_warnings,
        })
    }

    /// Run only the cross-action validation
    pub fn validate(&self) -> Vec<ValidationError> {
        validate_schemas(&self.context())
    }
}

/// Serialize a finished tree, reporting a cut walk as a warning. The tree is
/// released with the context.
fn emit(
    ctx: &GenerationContext<'_>,
    name: &str,
    schema: &SchemaRef,
    warnings: &mut Warnings,
) -> Result<Vec<u8>, GenerationError> {
    ctx.track(schema);
    let serialized = serialize(schema, &ctx.guard)?;
    if let Some(source) = serialized.truncated {
        warnings.record(GenerationError::RecursionLimit {
            field: name.to_string(),
            source,
        });
    }
    Ok(serialized.bytes)
}
