//! Generation domain module - the OpenAPI-to-schema compiler
//!
//! This module turns a resource declaration plus an OpenAPI document into
//! the spec, status, configuration and authentication schemas of a managed
//! resource. It performs no I/O: documents come in through the
//! [`OasDocument`] port and results leave as serialized [`SchemaBlob`]s.

pub mod auth;
pub mod configuration;
pub mod context;
pub mod errors;
pub mod guard;
pub mod orchestrator;
pub mod path;
pub mod resource;
pub mod schema;
pub mod serializer;
pub mod spec;
pub mod status;
pub mod traits;
pub mod types;
pub mod utils;
pub mod validation;

pub use context::GenerationContext;
pub use errors::*;
pub use guard::{GuardContext, GuardError, RecursionGuard};
pub use orchestrator::SchemaGenerator;
pub use path::{PathParseError, format_path, parse_path};
pub use resource::*;
pub use schema::{
    Property, Schema, SchemaRef, coerce_number_to_integer, deep_copy, deep_copy_property,
    flatten_all_of, release_tree,
};
pub use traits::*;
pub use types::*;
