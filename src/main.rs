//! oasgen CLI entrypoint
//! Parses command-line arguments and dispatches to the schema use case.
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use oasgen::application::{GenerateSchemasRequest, GenerateSchemasUseCase};
use oasgen::core::GeneratorConfig;
use oasgen::generation::ResourceConfig;
use oasgen::infrastructure::openapi::CompositeOpenApiLoader;
use oasgen::infrastructure::output::FileSystemOutputService;

#[derive(Parser)]
#[command(name = "oasgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Compile spec, status, configuration and authentication schemas
    Generate {
        #[command(flatten)]
        input: InputArgs,
        /// Directory for the schema files; the spec schema is printed when omitted
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Accepted media type, in preference order (repeatable)
        #[arg(long = "mime-type")]
        mime_types: Vec<String>,
        /// Success status code, in preference order (repeatable)
        #[arg(long = "success-code")]
        success_codes: Vec<u16>,
        /// Do not echo identifier fields into the spec schema
        #[arg(long)]
        no_identifiers_in_spec: bool,
    },
    /// Check that the declared actions agree on the resource shape
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path or URL to the OpenAPI document (YAML or JSON)
    #[arg(long)]
    openapi: String,
    /// Resource declaration file (YAML or JSON)
    #[arg(long)]
    resource: PathBuf,
    /// Generator configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str())),
        )
        .with_writer(std::io::stderr)
        .init();

    let use_case = GenerateSchemasUseCase::new(
        Arc::new(CompositeOpenApiLoader::new()),
        Arc::new(FileSystemOutputService::new()),
    );

    match cli.command {
        Commands::Generate {
            input,
            output_dir,
            mime_types,
            success_codes,
            no_identifiers_in_spec,
        } => {
            let mut request = build_request(&input)?;
            if !mime_types.is_empty() {
                request.config.accepted_mime_types = mime_types;
            }
            if !success_codes.is_empty() {
                request.config.success_codes = success_codes;
            }
            if no_identifiers_in_spec {
                request.config.include_identifiers_in_spec = false;
            }
            request.output_dir = output_dir;
            generate(&use_case, request).await?
        }
        Commands::Validate { input } => {
            let request = build_request(&input)?;
            let warnings = use_case
                .validate(request)
                .await
                .context("Failed to validate resource")?;
            if warnings.is_empty() {
                println!("No validation warnings.");
            } else {
                for warning in &warnings {
                    println!("[{}] {}", warning.code(), warning);
                }
                println!("Found {} validation warning(s)", warnings.len());
            }
        }
    }
    Ok(())
}

fn build_request(input: &InputArgs) -> anyhow::Result<GenerateSchemasRequest> {
    let resource = ResourceConfig::from_file(&input.resource).with_context(|| {
        format!(
            "Failed to load resource declaration {}",
            input.resource.display()
        )
    })?;
    let config = match &input.config {
        Some(path) => load_config(path)?,
        None => GeneratorConfig::default(),
    };
    Ok(GenerateSchemasRequest {
        openapi_source: input.openapi.clone(),
        resource,
        config,
        output_dir: None,
    })
}

fn load_config(path: &Path) -> anyhow::Result<GeneratorConfig> {
    GeneratorConfig::from_file(path)
        .with_context(|| format!("Failed to load generator configuration {}", path.display()))
}

async fn generate(
    use_case: &GenerateSchemasUseCase,
    request: GenerateSchemasRequest,
) -> anyhow::Result<()> {
    let print_spec = request.output_dir.is_none();
    let response = use_case
        .execute(request)
        .await
        .context("Failed to generate schemas")?;

    for warning in response.generation_warnings() {
        eprintln!("warning[{}]: {}", warning.code(), warning);
    }
    for warning in response.validation_warnings() {
        eprintln!("validation[{}]: {}", warning.code(), warning);
    }

    if print_spec {
        let spec = response
            .result
            .spec
            .to_json()
            .context("Failed to read spec schema")?;
        println!("{}", serde_json::to_string_pretty(&spec)?);
    } else if let Some(path) = &response.output_path {
        info!(
            path = %path.display(),
            files = response.artifacts_count,
            "schemas written"
        );
        println!(
            "Wrote {} schema file(s) to {}",
            response.artifacts_count,
            path.display()
        );
    }
    Ok(())
}
