//! Managed-resource declaration
//!
//! A `ResourceConfig` tells the compiler which API operations back each
//! resource action and which fields play special roles. It is read once per
//! request and never mutated by the builders.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::core::error::{Error, Result};
use crate::generation::{HttpMethod, ParameterLocation};

/// Abstract resource actions a verb can implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    Create,
    Get,
    Update,
    Delete,
    FindBy,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[
            Action::Create,
            Action::Get,
            Action::Update,
            Action::Delete,
            Action::FindBy,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Get => "get",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::FindBy => "findby",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "get" => Ok(Action::Get),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "findby" | "find_by" | "find-by" => Ok(Action::FindBy),
            _ => Err(format!("unknown action: {s}")),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

/// A parameter fed from an existing resource field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_query: Option<String>,
    pub in_custom_resource: String,
}

impl FieldMapping {
    /// The (location, name) of the mapped API parameter
    pub fn parameter(&self) -> Option<(ParameterLocation, &str)> {
        self.in_path
            .as_deref()
            .map(|name| (ParameterLocation::Path, name))
            .or_else(|| {
                self.in_query
                    .as_deref()
                    .map(|name| (ParameterLocation::Query, name))
            })
    }
}

/// Maps an action onto a concrete API operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verb {
    pub action: Action,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_field_mapping: Vec<FieldMapping>,
}

impl Verb {
    pub fn new(action: Action, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            action,
            method,
            path: path.into(),
            request_field_mapping: Vec::new(),
        }
    }

    /// Whether a parameter is fed through a field mapping
    pub fn maps_parameter(&self, name: &str, location: ParameterLocation) -> bool {
        self.request_field_mapping
            .iter()
            .filter_map(FieldMapping::parameter)
            .any(|(loc, mapped)| loc == location && mapped == name)
    }
}

/// The OpenAPI side of a configuration field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiParameterRef {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
}

/// The actions a configuration field applies to; `"*"` means every action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestDefinitionActions {
    #[serde(default)]
    pub actions: Vec<String>,
}

/// An OAS parameter surfaced in the configuration schema instead of the spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationField {
    #[serde(rename = "fromOpenAPI")]
    pub from_open_api: OpenApiParameterRef,
    #[serde(rename = "fromRestDefinition", default)]
    pub from_rest_definition: RestDefinitionActions,
}

impl ConfigurationField {
    pub fn new(name: impl Into<String>, location: ParameterLocation, actions: &[&str]) -> Self {
        Self {
            from_open_api: OpenApiParameterRef {
                name: name.into(),
                location,
            },
            from_rest_definition: RestDefinitionActions {
                actions: actions.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.from_open_api.name
    }

    pub fn location(&self) -> ParameterLocation {
        self.from_open_api.location
    }

    pub fn applies_to(&self, action: Action) -> bool {
        self.from_rest_definition
            .actions
            .iter()
            .any(|a| a == "*" || a.parse::<Action>() == Ok(action))
    }

    /// Whether this field consumes the parameter `(name, location)`
    pub fn matches(&self, name: &str, location: ParameterLocation) -> bool {
        self.name() == name && self.location() == location
    }
}

/// Declaration of one managed resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceConfig {
    pub verbs: Vec<Verb>,
    pub identifiers: Vec<String>,
    pub additional_status_fields: Vec<String>,
    pub configuration_fields: Vec<ConfigurationField>,
    pub excluded_spec_fields: Vec<String>,
}

impl ResourceConfig {
    /// Parse a declaration from YAML (JSON is accepted as a YAML subset)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Reject declarations with repeated actions or empty paths
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for verb in &self.verbs {
            if !seen.insert(verb.action) {
                return Err(Error::config(format!(
                    "action '{}' is declared more than once",
                    verb.action
                )));
            }
            if verb.path.trim().is_empty() {
                return Err(Error::config(format!(
                    "verb '{}' has an empty path",
                    verb.action
                )));
            }
        }
        Ok(())
    }

    pub fn verb(&self, action: Action) -> Option<&Verb> {
        self.verbs.iter().find(|v| v.action == action)
    }

    /// Configuration field consuming `(name, location)`, if any
    pub fn configuration_field(
        &self,
        name: &str,
        location: ParameterLocation,
    ) -> Option<&ConfigurationField> {
        self.configuration_fields
            .iter()
            .find(|f| f.matches(name, location))
    }

    pub fn is_configuration_field_name(&self, name: &str) -> bool {
        self.configuration_fields.iter().any(|f| f.name() == name)
    }

    /// Identifiers followed by additional status fields, duplicates removed
    pub fn status_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for field in self
            .identifiers
            .iter()
            .chain(self.additional_status_fields.iter())
        {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
        fields
    }
}
