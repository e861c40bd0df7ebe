//! Core types for the generation domain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::generation::{GenerationError, SchemaRef};

/// HTTP methods an operation can be declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Get all HTTP methods in OpenAPI path-item order
    pub fn all() -> &'static [HttpMethod] {
        &[
            HttpMethod::Get,
            HttpMethod::Put,
            HttpMethod::Post,
            HttpMethod::Delete,
            HttpMethod::Options,
            HttpMethod::Head,
            HttpMethod::Patch,
            HttpMethod::Trace,
        ]
    }

    /// Lowercase key used in OpenAPI path items
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    /// Capitalized form used in generated descriptions (`Get`, `Post`, ...)
    pub fn capitalized(&self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Put => "Put",
            HttpMethod::Post => "Post",
            HttpMethod::Delete => "Delete",
            HttpMethod::Options => "Options",
            HttpMethod::Head => "Head",
            HttpMethod::Patch => "Patch",
            HttpMethod::Trace => "Trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::all()
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown HTTP method: {s}"))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(ParameterLocation::Path),
            "query" => Ok(ParameterLocation::Query),
            "header" => Ok(ParameterLocation::Header),
            "cookie" => Ok(ParameterLocation::Cookie),
            _ => Err(format!("invalid parameter location: {s}")),
        }
    }
}

/// Operation parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<SchemaRef>,
}

/// One entry of a `content` map
#[derive(Debug, Clone)]
pub struct MediaType {
    pub mime_type: String,
    pub schema: Option<SchemaRef>,
}

/// Request body
#[derive(Debug, Clone, Default)]
pub struct RequestBody {
    pub required: bool,
    pub description: Option<String>,
    pub content: Vec<MediaType>,
}

/// Response
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: String,
    pub description: String,
    pub content: Vec<MediaType>,
}

/// Pick the schema of the first accepted media type present in `content`
pub fn schema_for_mime_types(content: &[MediaType], accepted: &[String]) -> Option<SchemaRef> {
    accepted.iter().find_map(|mime| {
        content
            .iter()
            .find(|m| m.mime_type.eq_ignore_ascii_case(mime))
            .and_then(|m| m.schema.clone())
    })
}

/// Security scheme declared under `components.securitySchemes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityScheme {
    pub name: String,
    /// `http`, `apiKey`, `oauth2`, `openIdConnect`, ...
    pub scheme_type: String,
    /// HTTP scheme name (`basic`, `bearer`) for `http` schemes
    pub scheme: Option<String>,
}

/// Generated artifact
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub content: String,
}

/// Serialized schema bytes, pulled lazily by downstream generators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaBlob {
    name: String,
    bytes: Option<Vec<u8>>,
}

impl SchemaBlob {
    pub fn new(name: impl Into<String>, bytes: Option<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_present(&self) -> bool {
        self.bytes.is_some()
    }

    /// The serialized schema, or `SchemaUnavailable` when none was produced
    pub fn get(&self) -> Result<&[u8], GenerationError> {
        self.bytes
            .as_deref()
            .ok_or_else(|| GenerationError::SchemaUnavailable(self.name.clone()))
    }

    /// Parse the bytes back into JSON
    pub fn to_json(&self) -> Result<serde_json::Value, GenerationError> {
        Ok(serde_json::from_slice(self.get()?)?)
    }
}

/// Output of one generation request
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub spec: SchemaBlob,
    pub status: SchemaBlob,
    pub configuration: SchemaBlob,
    /// Authentication payload schemas keyed by canonical scheme name
    pub authentication: Vec<SchemaBlob>,
    pub generation_warnings: Vec<GenerationError>,
    pub validation_warnings: Vec<crate::generation::ValidationError>,
}

impl GenerationResult {
    /// Authentication schema for a canonical scheme name (`BasicAuth`, `BearerAuth`)
    pub fn authentication(&self, name: &str) -> Option<&SchemaBlob> {
        self.authentication.iter().find(|b| b.name() == name)
    }

    /// Lay out every present blob as a file artifact
    pub fn artifacts(&self) -> Result<Vec<Artifact>, GenerationError> {
        let mut artifacts = Vec::new();
        let named = [&self.spec, &self.status, &self.configuration];
        for blob in named.into_iter().filter(|b| b.is_present()) {
            artifacts.push(Artifact {
                path: PathBuf::from(format!("{}.schema.json", blob.name())),
                content: pretty(blob)?,
            });
        }
        for blob in self.authentication.iter().filter(|b| b.is_present()) {
            artifacts.push(Artifact {
                path: PathBuf::from("auth").join(format!("{}.schema.json", blob.name())),
                content: pretty(blob)?,
            });
        }
        Ok(artifacts)
    }
}

fn pretty(blob: &SchemaBlob) -> Result<String, GenerationError> {
    let mut content = serde_json::to_string_pretty(&blob.to_json()?)?;
    content.push('\n');
    Ok(content)
}
