//! Error types for the generation domain
//!
//! Three families never mix: [`ParserError`] aborts a request,
//! [`GenerationError`] and [`ValidationError`] are collected into separate
//! warning lists on the result.

use std::fmt;
use thiserror::Error;

use crate::generation::{GuardError, PathParseError};

/// Fatal errors raised while reading an OpenAPI document
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("failed to create document: {0}")]
    DocumentCreation(String),

    #[error("failed to build OpenAPI model: {0}")]
    ModelBuild(String),

    #[error("failed to resolve reference '{reference}': {reason}")]
    ReferenceResolution { reference: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OpenAPI loading error: {0}")]
    Load(String),
}

/// Machine-readable parser error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserErrorCode {
    DocumentCreation,
    ModelBuild,
    ReferenceResolution,
    Io,
    Load,
}

impl ParserErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserErrorCode::DocumentCreation => "DocumentCreation",
            ParserErrorCode::ModelBuild => "ModelBuild",
            ParserErrorCode::ReferenceResolution => "ReferenceResolution",
            ParserErrorCode::Io => "Io",
            ParserErrorCode::Load => "Load",
        }
    }
}

impl ParserError {
    pub fn code(&self) -> ParserErrorCode {
        match self {
            ParserError::DocumentCreation(_) => ParserErrorCode::DocumentCreation,
            ParserError::ModelBuild(_) => ParserErrorCode::ModelBuild,
            ParserError::ReferenceResolution { .. } => ParserErrorCode::ReferenceResolution,
            ParserError::Io(_) => ParserErrorCode::Io,
            ParserError::Load(_) => ParserErrorCode::Load,
        }
    }
}

/// Degraded-but-valid outcomes recorded while building schemas
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("parameter '{parameter}' ({location}) of {action} collides with an existing property")]
    DuplicateParameter {
        parameter: String,
        location: String,
        action: String,
    },

    #[error("path '{path}' not found for {action}")]
    PathNotFound { action: String, path: String },

    #[error("status field '{field}' not found in response schema")]
    StatusFieldNotFound { field: String },

    #[error("no usable request body schema for {action} {path}")]
    NoRootSchema { action: String, path: String },

    #[error("excluded field '{field}' not found in spec schema")]
    ExcludedFieldNotFound { field: String },

    #[error("no usable response schema for the status")]
    NoStatusSchema,

    #[error("configuration field '{name}' ({location}) not found in {action}")]
    ConfigurationFieldNotFound {
        name: String,
        location: String,
        action: String,
    },

    #[error(transparent)]
    InvalidPathExpression(#[from] PathParseError),

    #[error("recursion limit while processing '{field}': {source}")]
    RecursionLimit {
        field: String,
        #[source]
        source: GuardError,
    },

    #[error("{0} schema was not generated")]
    SchemaUnavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Serialization(err.to_string())
    }
}

/// Machine-readable generation error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorCode {
    DuplicateParameter,
    PathNotFound,
    StatusFieldNotFound,
    NoRootSchema,
    ExcludedFieldNotFound,
    NoStatusSchema,
    ConfigurationFieldNotFound,
    InvalidPathExpression,
    RecursionLimit,
    SchemaUnavailable,
    Serialization,
}

impl GenerationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationErrorCode::DuplicateParameter => "DuplicateParameter",
            GenerationErrorCode::PathNotFound => "PathNotFound",
            GenerationErrorCode::StatusFieldNotFound => "StatusFieldNotFound",
            GenerationErrorCode::NoRootSchema => "NoRootSchema",
            GenerationErrorCode::ExcludedFieldNotFound => "ExcludedFieldNotFound",
            GenerationErrorCode::NoStatusSchema => "NoStatusSchema",
            GenerationErrorCode::ConfigurationFieldNotFound => "ConfigurationFieldNotFound",
            GenerationErrorCode::InvalidPathExpression => "InvalidPathExpression",
            GenerationErrorCode::RecursionLimit => "RecursionLimit",
            GenerationErrorCode::SchemaUnavailable => "SchemaUnavailable",
            GenerationErrorCode::Serialization => "Serialization",
        }
    }
}

impl fmt::Display for GenerationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GenerationError {
    pub fn code(&self) -> GenerationErrorCode {
        match self {
            GenerationError::DuplicateParameter { .. } => GenerationErrorCode::DuplicateParameter,
            GenerationError::PathNotFound { .. } => GenerationErrorCode::PathNotFound,
            GenerationError::StatusFieldNotFound { .. } => GenerationErrorCode::StatusFieldNotFound,
            GenerationError::NoRootSchema { .. } => GenerationErrorCode::NoRootSchema,
            GenerationError::ExcludedFieldNotFound { .. } => {
                GenerationErrorCode::ExcludedFieldNotFound
            }
            GenerationError::NoStatusSchema => GenerationErrorCode::NoStatusSchema,
            GenerationError::ConfigurationFieldNotFound { .. } => {
                GenerationErrorCode::ConfigurationFieldNotFound
            }
            GenerationError::InvalidPathExpression(_) => GenerationErrorCode::InvalidPathExpression,
            GenerationError::RecursionLimit { .. } => GenerationErrorCode::RecursionLimit,
            GenerationError::SchemaUnavailable(_) => GenerationErrorCode::SchemaUnavailable,
            GenerationError::Serialization(_) => GenerationErrorCode::Serialization,
        }
    }
}

/// Structural disagreements between the schemas of two actions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("neither a get nor a findby action is declared")]
    MissingBaseAction,

    #[error("{action} has no {kind} schema to compare")]
    ActionSchemaMissing { action: String, kind: String },

    #[error("{field_path}: type '{expected}' in {base} but '{actual}' in {action}")]
    TypeMismatch {
        field_path: String,
        base: String,
        action: String,
        expected: String,
        actual: String,
    },

    #[error("{field_path}: properties present in {present_in} but not in {missing_in}")]
    PropertyMismatch {
        field_path: String,
        present_in: String,
        missing_in: String,
    },

    #[error("{field_path}: array items declared in {present_in} but not in {missing_in}")]
    MissingArrayItems {
        field_path: String,
        present_in: String,
        missing_in: String,
    },

    #[error("{field_path}: comparison aborted: {source}")]
    RecursionLimitExceeded {
        field_path: String,
        #[source]
        source: GuardError,
    },
}

/// Machine-readable validation error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    MissingBaseAction,
    ActionSchemaMissing,
    TypeMismatch,
    PropertyMismatch,
    MissingArrayItems,
    RecursionLimitExceeded,
}

impl ValidationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorCode::MissingBaseAction => "MissingBaseAction",
            ValidationErrorCode::ActionSchemaMissing => "ActionSchemaMissing",
            ValidationErrorCode::TypeMismatch => "TypeMismatch",
            ValidationErrorCode::PropertyMismatch => "PropertyMismatch",
            ValidationErrorCode::MissingArrayItems => "MissingArrayItems",
            ValidationErrorCode::RecursionLimitExceeded => "RecursionLimitExceeded",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ValidationError {
    pub fn code(&self) -> ValidationErrorCode {
        match self {
            ValidationError::MissingBaseAction => ValidationErrorCode::MissingBaseAction,
            ValidationError::ActionSchemaMissing { .. } => ValidationErrorCode::ActionSchemaMissing,
            ValidationError::TypeMismatch { .. } => ValidationErrorCode::TypeMismatch,
            ValidationError::PropertyMismatch { .. } => ValidationErrorCode::PropertyMismatch,
            ValidationError::MissingArrayItems { .. } => ValidationErrorCode::MissingArrayItems,
            ValidationError::RecursionLimitExceeded { .. } => {
                ValidationErrorCode::RecursionLimitExceeded
            }
        }
    }

    /// Dotted path of the offending field; empty for whole-document findings
    pub fn field_path(&self) -> &str {
        match self {
            ValidationError::MissingBaseAction | ValidationError::ActionSchemaMissing { .. } => "",
            ValidationError::TypeMismatch { field_path, .. }
            | ValidationError::PropertyMismatch { field_path, .. }
            | ValidationError::MissingArrayItems { field_path, .. }
            | ValidationError::RecursionLimitExceeded { field_path, .. } => field_path,
        }
    }
}
