//! JSON-backed OpenAPI document
//!
//! [`JsonOasDocument`] implements the [`OasDocument`] port over a raw
//! `serde_json::Value` (JSON or YAML input, OpenAPI 3.0 and 3.1). The
//! document is checked once at construction, including every local `$ref`;
//! after that every read is infallible and malformed fragments simply read
//! as absent.
//!
//! Schema fragments are converted to domain schemas on each read. A `$ref`
//! that is still being expanded is linked back to the node under
//! construction, so recursive definitions become cyclic trees.

use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::generation::{
    HttpMethod, MediaType, OasDocument, Operation, Parameter, ParameterLocation, ParserError,
    PathItem, Property, RequestBody, Response, Schema, SchemaRef, SecurityScheme, release_tree,
};

/// Follow at most this many chained `$ref`s before giving up
const MAX_REF_CHAIN: usize = 32;

/// Parse raw document text. `hint` (a path, URL or content type) selects
/// JSON or YAML; without a usable hint JSON is tried first, then YAML.
pub fn parse_content(content: &str, hint: &str) -> Result<JsonValue, ParserError> {
    let hint = hint.to_ascii_lowercase();
    let hint = hint.split(['?', '#']).next().unwrap_or_default();

    let is_yaml = hint.ends_with(".yaml") || hint.ends_with(".yml");
    if hint.ends_with(".json") || (!is_yaml && hint.contains("json")) {
        serde_json::from_str(content)
            .map_err(|e| ParserError::DocumentCreation(format!("invalid JSON: {e}")))
    } else if is_yaml || hint.contains("yaml") {
        serde_yaml::from_str(content)
            .map_err(|e| ParserError::DocumentCreation(format!("invalid YAML: {e}")))
    } else {
        serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| ParserError::DocumentCreation(format!("unrecognized document: {e}")))
    }
}

/// OpenAPI document held as JSON
#[derive(Debug, Clone)]
pub struct JsonOasDocument {
    root: JsonValue,
}

impl JsonOasDocument {
    /// Validate and wrap a parsed document
    pub fn from_value(root: JsonValue) -> Result<Self, ParserError> {
        let object = root
            .as_object()
            .ok_or_else(|| ParserError::ModelBuild("document root is not an object".to_string()))?;
        if !object.get("openapi").is_some_and(JsonValue::is_string) {
            return Err(ParserError::ModelBuild(
                "missing 'openapi' version string".to_string(),
            ));
        }
        if !object.get("paths").is_some_and(JsonValue::is_object) {
            return Err(ParserError::ModelBuild("missing 'paths' object".to_string()));
        }

        let document = Self { root };
        document.check_references()?;
        debug!(
            version = document.version(),
            paths = document.paths().map(Map::len).unwrap_or_default(),
            "OpenAPI document loaded"
        );
        Ok(document)
    }

    /// Parse text and validate it
    pub fn from_content(content: &str, hint: &str) -> Result<Self, ParserError> {
        Self::from_value(parse_content(content, hint)?)
    }

    pub fn version(&self) -> &str {
        self.root
            .get("openapi")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
    }

    pub fn title(&self) -> Option<&str> {
        self.root.get("info")?.get("title")?.as_str()
    }

    fn paths(&self) -> Option<&Map<String, JsonValue>> {
        self.root.get("paths")?.as_object()
    }

    /// Every `$ref` must be local and must point at something
    fn check_references(&self) -> Result<(), ParserError> {
        let mut pending = vec![&self.root];
        while let Some(value) = pending.pop() {
            match value {
                JsonValue::Object(map) => {
                    if let Some(reference) = map.get("$ref").and_then(JsonValue::as_str) {
                        if !reference.starts_with('#') {
                            return Err(ParserError::ReferenceResolution {
                                reference: reference.to_string(),
                                reason: "only local references are supported".to_string(),
                            });
                        }
                        if self.pointer(reference).is_none() {
                            return Err(ParserError::ReferenceResolution {
                                reference: reference.to_string(),
                                reason: "target not found".to_string(),
                            });
                        }
                    }
                    pending.extend(map.values());
                }
                JsonValue::Array(items) => pending.extend(items.iter()),
                _ => {}
            }
        }
        Ok(())
    }

    fn pointer(&self, reference: &str) -> Option<&JsonValue> {
        self.root.pointer(reference.strip_prefix('#')?)
    }

    /// Follow `$ref` chains of a non-schema object (parameter, body, response)
    fn resolve<'d>(&'d self, mut value: &'d JsonValue) -> Option<&'d JsonValue> {
        for _ in 0..MAX_REF_CHAIN {
            match value.get("$ref").and_then(JsonValue::as_str) {
                Some(reference) => value = self.pointer(reference)?,
                None => return Some(value),
            }
        }
        warn!("reference chain too long");
        None
    }

    /// Convert a schema fragment into a fresh domain tree.
    ///
    /// Recursive definitions come back as cycles; hand the tree to
    /// [`release_tree`] when done with it.
    pub fn build_schema(&self, value: &JsonValue) -> SchemaRef {
        SchemaBuilder {
            document: self,
            in_progress: HashMap::new(),
            completed: HashMap::new(),
        }
        .build(value)
    }

    fn build_content(&self, content: Option<&JsonValue>) -> Vec<MediaType> {
        content
            .and_then(JsonValue::as_object)
            .map(|media| {
                media
                    .iter()
                    .map(|(mime_type, entry)| MediaType {
                        mime_type: mime_type.clone(),
                        schema: entry.get("schema").map(|schema| self.build_schema(schema)),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn build_parameter(&self, value: &JsonValue) -> Option<Parameter> {
        let value = self.resolve(value)?;
        let name = value.get("name")?.as_str()?.to_string();
        let location = ParameterLocation::from_str(value.get("in")?.as_str()?).ok()?;
        let schema = match value.get("schema") {
            Some(schema) => Some(self.build_schema(schema)),
            None => self
                .build_content(value.get("content"))
                .into_iter()
                .find_map(|media| media.schema),
        };
        Some(Parameter {
            name,
            location,
            required: value
                .get("required")
                .and_then(JsonValue::as_bool)
                .unwrap_or(location == ParameterLocation::Path),
            description: value
                .get("description")
                .and_then(JsonValue::as_str)
                .map(String::from),
            schema,
        })
    }

    fn build_parameters(&self, value: Option<&JsonValue>) -> Vec<Parameter> {
        value
            .and_then(JsonValue::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| self.build_parameter(item))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl OasDocument for JsonOasDocument {
    fn find_path(&self, path: &str) -> Option<Box<dyn PathItem + '_>> {
        let item = self.resolve(self.paths()?.get(path)?)?;
        if !item.is_object() {
            return None;
        }
        Some(Box::new(JsonPathItem {
            document: self,
            item,
        }))
    }

    fn security_schemes(&self) -> Vec<SecurityScheme> {
        let Some(schemes) = self
            .root
            .get("components")
            .and_then(|c| c.get("securitySchemes"))
            .and_then(JsonValue::as_object)
        else {
            return Vec::new();
        };

        schemes
            .iter()
            .filter_map(|(name, scheme)| {
                let scheme = self.resolve(scheme)?;
                Some(SecurityScheme {
                    name: name.clone(),
                    scheme_type: scheme.get("type")?.as_str()?.to_string(),
                    scheme: scheme
                        .get("scheme")
                        .and_then(JsonValue::as_str)
                        .map(String::from),
                })
            })
            .collect()
    }
}

struct JsonPathItem<'d> {
    document: &'d JsonOasDocument,
    item: &'d JsonValue,
}

impl PathItem for JsonPathItem<'_> {
    fn operations(&self) -> BTreeMap<HttpMethod, Box<dyn Operation + '_>> {
        let mut operations: BTreeMap<HttpMethod, Box<dyn Operation + '_>> = BTreeMap::new();
        for method in HttpMethod::all() {
            if let Some(operation) = self.item.get(method.as_str()).filter(|op| op.is_object()) {
                operations.insert(
                    *method,
                    Box::new(JsonOperation {
                        document: self.document,
                        path_item: self.item,
                        operation,
                    }),
                );
            }
        }
        operations
    }
}

struct JsonOperation<'d> {
    document: &'d JsonOasDocument,
    path_item: &'d JsonValue,
    operation: &'d JsonValue,
}

impl Operation for JsonOperation<'_> {
    /// Path-level parameters followed by operation-level ones; an
    /// operation-level parameter replaces a path-level one with the same
    /// name and location
    fn parameters(&self) -> Vec<Parameter> {
        let mut parameters = self
            .document
            .build_parameters(self.path_item.get("parameters"));
        for parameter in self
            .document
            .build_parameters(self.operation.get("parameters"))
        {
            match parameters
                .iter_mut()
                .find(|p| p.name == parameter.name && p.location == parameter.location)
            {
                Some(existing) => {
                    if let Some(schema) = std::mem::replace(existing, parameter).schema {
                        release_tree(&schema);
                    }
                }
                None => parameters.push(parameter),
            }
        }
        parameters
    }

    fn request_body(&self) -> Option<RequestBody> {
        let body = self.document.resolve(self.operation.get("requestBody")?)?;
        Some(RequestBody {
            required: body
                .get("required")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
            description: body
                .get("description")
                .and_then(JsonValue::as_str)
                .map(String::from),
            content: self.document.build_content(body.get("content")),
        })
    }

    fn responses(&self) -> Vec<Response> {
        let Some(responses) = self
            .operation
            .get("responses")
            .and_then(JsonValue::as_object)
        else {
            return Vec::new();
        };
        responses
            .iter()
            .filter_map(|(status_code, response)| {
                let response = self.document.resolve(response)?;
                Some(Response {
                    status_code: status_code.clone(),
                    description: response
                        .get("description")
                        .and_then(JsonValue::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    content: self.document.build_content(response.get("content")),
                })
            })
            .collect()
    }
}

/// Converts one schema fragment, tracking the `$ref`s being expanded.
///
/// Each definition is expanded once per fragment: a `$ref` met again after
/// its expansion finished shares the finished node, and one met while it is
/// still being expanded links back to it.
struct SchemaBuilder<'d> {
    document: &'d JsonOasDocument,
    in_progress: HashMap<String, SchemaRef>,
    completed: HashMap<String, SchemaRef>,
}

impl SchemaBuilder<'_> {
    fn build(&mut self, value: &JsonValue) -> SchemaRef {
        match value.get("$ref").and_then(JsonValue::as_str) {
            Some(reference) => self.build_reference(reference),
            None => {
                let node = Schema::default().into_ref();
                self.fill(&node, value);
                node
            }
        }
    }

    fn build_reference(&mut self, reference: &str) -> SchemaRef {
        if let Some(node) = self
            .completed
            .get(reference)
            .or_else(|| self.in_progress.get(reference))
        {
            return Rc::clone(node);
        }

        let document = self.document;
        let node = Schema::default().into_ref();
        let mut expanding = vec![reference.to_string()];
        self.in_progress
            .insert(reference.to_string(), Rc::clone(&node));

        let mut target = document.pointer(reference);
        // an aliased definition (`A: {$ref: B}`) shares the node of its target
        while let Some(next) = target
            .and_then(|t| t.get("$ref"))
            .and_then(JsonValue::as_str)
        {
            if expanding.len() >= MAX_REF_CHAIN || expanding.iter().any(|r| r == next) {
                warn!(reference = %reference, "circular reference alias");
                target = None;
                break;
            }
            if let Some(existing) = self
                .completed
                .get(next)
                .or_else(|| self.in_progress.get(next))
                .cloned()
            {
                for alias in &expanding {
                    self.in_progress.remove(alias);
                }
                return existing;
            }
            self.in_progress.insert(next.to_string(), Rc::clone(&node));
            expanding.push(next.to_string());
            target = document.pointer(next);
        }

        match target {
            Some(target) => self.fill(&node, target),
            None => warn!(reference = %reference, "unresolvable schema reference"),
        }
        for alias in expanding {
            self.in_progress.remove(&alias);
            self.completed.insert(alias, Rc::clone(&node));
        }
        node
    }

    fn fill(&mut self, node: &SchemaRef, value: &JsonValue) {
        let Some(object) = value.as_object() else {
            return;
        };

        let mut types: Vec<String> = match object.get("type") {
            Some(JsonValue::String(single)) => vec![single.clone()],
            Some(JsonValue::Array(many)) => many
                .iter()
                .filter_map(JsonValue::as_str)
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        };
        if object.get("nullable").and_then(JsonValue::as_bool) == Some(true)
            && !types.iter().any(|t| t == "null")
        {
            types.push("null".to_string());
        }

        let properties = object
            .get("properties")
            .and_then(JsonValue::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| Property::new(name.clone(), self.build(schema)))
                    .collect()
            })
            .unwrap_or_default();
        let items = object.get("items").map(|items| self.build(items));
        let all_of = object
            .get("allOf")
            .and_then(JsonValue::as_array)
            .map(|subs| subs.iter().map(|sub| self.build(sub)).collect())
            .unwrap_or_default();
        let required = object
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let extensions = object
            .iter()
            .filter(|(key, _)| key.starts_with("x-"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        *node.borrow_mut() = Schema {
            types,
            description: object
                .get("description")
                .and_then(JsonValue::as_str)
                .map(String::from),
            properties,
            items,
            all_of,
            required,
            enum_values: object
                .get("enum")
                .and_then(JsonValue::as_array)
                .cloned()
                .unwrap_or_default(),
            default: object.get("default").cloned(),
            format: object
                .get("format")
                .and_then(JsonValue::as_str)
                .map(String::from),
            extensions,
        };
    }
}
