//! Application layer - wires loaders, the generator and output together

pub mod dto;
pub mod errors;
pub mod generate_schemas;
pub mod traits;

pub use dto::*;
pub use errors::*;
pub use generate_schemas::GenerateSchemasUseCase;
pub use traits::*;
