//! Core configuration shared by every layer
//!
//! Holds the generator tunables and the error type used while loading them.

pub mod config;
pub mod error;

pub use config::{GeneratorConfig, GuardLimits};
pub use error::Error;
