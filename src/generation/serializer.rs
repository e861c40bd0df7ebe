//! Canonical JSON-Schema output
//!
//! Keys are emitted in a fixed order (`type`, `description`, `format`,
//! `enum`, `default`, `items`, `properties`, `required`, `allOf`, then
//! extensions) and properties keep their insertion order, so the same tree
//! always produces the same bytes.

use serde_json::{Map, Value as JsonValue};
use std::collections::HashSet;

use crate::generation::schema::{NodeId, node_id};
use crate::generation::{
    GenerationError, GuardContext, GuardError, RecursionGuard, SchemaRef, coerce_number_to_integer,
};

/// Extension emitted where a cyclic tree points back at one of its ancestors
pub const PRESERVE_UNKNOWN_FIELDS: &str = "x-kubernetes-preserve-unknown-fields";

/// Serialized tree
#[derive(Debug)]
pub struct Serialized {
    pub bytes: Vec<u8>,
    /// Set when the guard stopped the walk. Subtrees past that point are
    /// emitted as preserve-unknown-fields objects.
    pub truncated: Option<GuardError>,
}

/// Normalize a tree for output and serialize it under `guard`.
///
/// Every `number` type is rewritten to `integer` in place first. A tree
/// reusing one definition in many places expands on output, so the walk
/// counts every emitted node.
pub fn serialize(schema: &SchemaRef, guard: &RecursionGuard) -> Result<Serialized, GenerationError> {
    coerce_number_to_integer(schema);
    let (value, truncated) = to_json_guarded(schema, guard);
    Ok(Serialized {
        bytes: serde_json::to_vec(&value)?,
        truncated,
    })
}

/// Convert a tree into a JSON value without modifying it, under the default
/// guard limits
pub fn to_json(schema: &SchemaRef) -> JsonValue {
    to_json_guarded(schema, &RecursionGuard::default()).0
}

/// Convert a tree into a JSON value, cutting the walk where `guard` trips
pub fn to_json_guarded(
    schema: &SchemaRef,
    guard: &RecursionGuard,
) -> (JsonValue, Option<GuardError>) {
    let mut walk = Walk {
        guard,
        gctx: guard.with_context(),
        ancestors: HashSet::new(),
        truncated: None,
    };
    let value = walk.node(schema, 0);
    (value, walk.truncated)
}

fn opaque_object() -> JsonValue {
    let mut out = Map::new();
    out.insert("type".to_string(), JsonValue::from("object"));
    out.insert(PRESERVE_UNKNOWN_FIELDS.to_string(), JsonValue::Bool(true));
    JsonValue::Object(out)
}

struct Walk<'g> {
    guard: &'g RecursionGuard,
    gctx: GuardContext,
    ancestors: HashSet<NodeId>,
    truncated: Option<GuardError>,
}

impl Walk<'_> {
    fn node(&mut self, schema: &SchemaRef, depth: usize) -> JsonValue {
        if let Err(err) = self.guard.check(&self.gctx, depth) {
            if self.truncated.is_none() {
                self.truncated = Some(err);
            }
            return opaque_object();
        }
        let id = node_id(schema);
        if !self.ancestors.insert(id) {
            return opaque_object();
        }

        let node = schema.borrow();
        let mut out = Map::new();

        match node.types.as_slice() {
            [] => {}
            [single] => {
                out.insert("type".to_string(), JsonValue::from(single.as_str()));
            }
            many => {
                out.insert(
                    "type".to_string(),
                    JsonValue::Array(many.iter().map(|t| JsonValue::from(t.as_str())).collect()),
                );
            }
        }
        if let Some(description) = &node.description {
            out.insert("description".to_string(), JsonValue::from(description.as_str()));
        }
        if let Some(format) = &node.format {
            out.insert("format".to_string(), JsonValue::from(format.as_str()));
        }
        if !node.enum_values.is_empty() {
            out.insert("enum".to_string(), JsonValue::Array(node.enum_values.clone()));
        }
        if let Some(default) = &node.default {
            out.insert("default".to_string(), default.clone());
        }
        if let Some(items) = &node.items {
            out.insert("items".to_string(), self.node(items, depth + 1));
        }
        if !node.properties.is_empty() {
            let mut properties = Map::new();
            for property in &node.properties {
                properties.insert(
                    property.name.clone(),
                    self.node(&property.schema, depth + 1),
                );
            }
            out.insert("properties".to_string(), JsonValue::Object(properties));
        }
        if !node.required.is_empty() {
            out.insert(
                "required".to_string(),
                JsonValue::Array(node.required.iter().map(|r| JsonValue::from(r.as_str())).collect()),
            );
        }
        if !node.all_of.is_empty() {
            let all_of = node
                .all_of
                .iter()
                .map(|sub| self.node(sub, depth + 1))
                .collect();
            out.insert("allOf".to_string(), JsonValue::Array(all_of));
        }
        for (key, value) in &node.extensions {
            out.insert(key.clone(), value.clone());
        }

        drop(node);
        self.ancestors.remove(&id);
        JsonValue::Object(out)
    }
}
