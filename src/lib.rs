//! oasgen compiles an OpenAPI description and a resource declaration into
//! the JSON Schemas of a custom resource definition: the desired state
//! (`spec`), the observed state (`status`), external configuration and
//! authentication payloads.
//!
//! ```no_run
//! use oasgen::core::GeneratorConfig;
//! use oasgen::generation::{ResourceConfig, SchemaGenerator};
//! use oasgen::infrastructure::openapi::JsonOasDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = JsonOasDocument::from_content(
//!     &std::fs::read_to_string("openapi.yaml")?,
//!     "openapi.yaml",
//! )?;
//! let resource = ResourceConfig::from_file("resource.yaml".as_ref())?;
//! let result = SchemaGenerator::new(&document, GeneratorConfig::default(), resource).generate()?;
//! println!("{}", String::from_utf8_lossy(result.spec.get()?));
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod application;
pub mod core;
pub mod generation;
pub mod infrastructure;
