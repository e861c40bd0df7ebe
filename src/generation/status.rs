//! Observed-state ("status") schema builder
//!
//! Each requested field is looked up in one base response schema and copied
//! into a fresh tree at the same path. Containers created on the way carry a
//! type-name hint so struct generators can tell them apart.

use serde_json::Value as JsonValue;
use std::rc::Rc;
use tracing::debug;

use crate::generation::context::{GenerationContext, Warnings};
use crate::generation::guard::{GuardContext, GuardError, RecursionGuard};
use crate::generation::utils::status_type_name;
use crate::generation::{
    Action, GenerationError, Property, Schema, SchemaRef, deep_copy, deep_copy_property,
    flatten_all_of, parse_path,
};

/// Extension carrying the type-name hint of a synthesized container
pub const IDENTIFIER_NAME_EXTENSION: &str = "x-crdgen-identifier-name";

/// Response schema describing one resource instance, as a flattened copy.
///
/// Prefers the get response; falls back to the findby response with one
/// array level unwrapped.
pub fn base_response_schema(ctx: &GenerationContext<'_>) -> Option<SchemaRef> {
    let from_get = ctx
        .resource
        .verb(Action::Get)
        .and_then(|verb| ctx.response_schema(verb).found().flatten());
    let schema = match from_get {
        Some(schema) => schema,
        None => {
            let verb = ctx.resource.verb(Action::FindBy)?;
            unwrap_collection(ctx.response_schema(verb).found().flatten()?)
        }
    };

    let copy = deep_copy(&schema);
    flatten_all_of(&copy);
    ctx.track(&copy);
    Some(copy)
}

/// The element schema of an array, or the schema itself
pub fn unwrap_collection(schema: SchemaRef) -> SchemaRef {
    let items = {
        let node = schema.borrow();
        if node.is_array() { node.items.clone() } else { None }
    };
    items.unwrap_or(schema)
}

/// Build the status schema tree, or `None` when no field is requested
pub fn build_status_schema(
    ctx: &GenerationContext<'_>,
    warnings: &mut Warnings,
) -> Option<SchemaRef> {
    let fields = ctx.resource.status_fields();
    if fields.is_empty() {
        debug!("no status fields requested");
        return None;
    }

    let base = base_response_schema(ctx);
    if base.is_none() {
        warnings.record(GenerationError::NoStatusSchema);
    }

    let status = Schema::object().into_ref();
    for field in &fields {
        let segments = match parse_path(field) {
            Ok(segments) => segments,
            Err(err) => {
                warnings.record(err.into());
                continue;
            }
        };

        let found = match &base {
            Some(base) => match find_property(&ctx.guard, base, &segments) {
                Ok(Some(property)) => Some(deep_copy_property(&property)),
                Ok(None) => {
                    warnings.record(GenerationError::StatusFieldNotFound {
                        field: field.clone(),
                    });
                    None
                }
                Err(source) => {
                    warnings.record(GenerationError::RecursionLimit {
                        field: field.clone(),
                        source,
                    });
                    None
                }
            },
            None => None,
        };

        let (parents, leaf) = match segments.split_last() {
            Some((leaf, parents)) => (parents, leaf),
            None => continue,
        };
        let property = found.unwrap_or_else(|| {
            debug!(field = %field, "falling back to a string status field");
            Property::new(leaf.clone(), Schema::string().into_ref())
        });
        if let Err(source) = insert_property(&ctx.guard, &status, parents, property) {
            warnings.record(GenerationError::RecursionLimit {
                field: field.clone(),
                source,
            });
        }
    }

    Some(status)
}

/// Follow `segments` through object-typed properties of `root`
pub fn find_property(
    guard: &RecursionGuard,
    root: &SchemaRef,
    segments: &[String],
) -> Result<Option<Property>, GuardError> {
    let gctx = guard.with_context();
    find_in(guard, &gctx, root, segments, 0)
}

fn find_in(
    guard: &RecursionGuard,
    gctx: &GuardContext,
    node: &SchemaRef,
    segments: &[String],
    depth: usize,
) -> Result<Option<Property>, GuardError> {
    guard.check(gctx, depth)?;
    let Some((first, rest)) = segments.split_first() else {
        return Ok(None);
    };
    let child = node
        .borrow()
        .properties
        .iter()
        .find(|p| &p.name == first)
        .cloned();
    let Some(child) = child else {
        return Ok(None);
    };
    if rest.is_empty() {
        return Ok(Some(child));
    }
    if !child.schema.borrow().is_object() {
        return Ok(None);
    }
    find_in(guard, gctx, &child.schema, rest, depth + 1)
}

/// Place `property` under the containers named by `parents`, creating
/// missing containers as annotated objects
pub fn insert_property(
    guard: &RecursionGuard,
    root: &SchemaRef,
    parents: &[String],
    property: Property,
) -> Result<(), GuardError> {
    let gctx = guard.with_context();
    insert_in(guard, &gctx, root, parents, property, 0)
}

fn insert_in(
    guard: &RecursionGuard,
    gctx: &GuardContext,
    node: &SchemaRef,
    parents: &[String],
    property: Property,
    depth: usize,
) -> Result<(), GuardError> {
    guard.check(gctx, depth)?;
    let Some((first, rest)) = parents.split_first() else {
        node.borrow_mut()
            .set_property(&property.name, property.schema);
        return Ok(());
    };

    let existing = node.borrow_mut().detach_property(first);
    let container = match existing {
        Some(container) if container.borrow().is_object() => container,
        _ => {
            let container = Schema::object().into_ref();
            container.borrow_mut().extensions.insert(
                IDENTIFIER_NAME_EXTENSION.to_string(),
                JsonValue::from(status_type_name(first)),
            );
            node.borrow_mut().set_property(first, Rc::clone(&container));
            container
        }
    };
    insert_in(guard, gctx, &container, rest, property, depth + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GeneratorConfig, GuardLimits};
    use crate::generation::serializer::to_json;
    use crate::generation::{GenerationErrorCode, ResourceConfig, release_tree};
    use crate::infrastructure::openapi::JsonOasDocument;
    use serde_json::{Value, json};

    fn user_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "metadata": {"type": "object", "properties": {
                    "user": {"type": "object", "properties": {
                        "profile": {"type": "object", "properties": {
                            "email": {"type": "string", "format": "email"}
                        }}
                    }},
                    "tags": {"type": "array", "items": {"type": "string"}}
                }}
            }
        })
    }

    fn document(get_response: Option<Value>, findby_response: Option<Value>) -> JsonOasDocument {
        let mut paths = serde_json::Map::new();
        if let Some(schema) = get_response {
            paths.insert(
                "/users/{id}".to_string(),
                json!({"get": {"responses": {"200": {"description": "ok",
                    "content": {"application/json": {"schema": schema}}}}}}),
            );
        }
        if let Some(schema) = findby_response {
            paths.insert(
                "/users".to_string(),
                json!({"get": {"responses": {"200": {"description": "ok",
                    "content": {"application/json": {"schema": schema}}}}}}),
            );
        }
        JsonOasDocument::from_value(json!({"openapi": "3.0.0", "paths": paths})).unwrap()
    }

    fn resource(fields: &[&str]) -> ResourceConfig {
        let fields: Vec<String> = fields.iter().map(|f| format!("  - {f:?}\n")).collect();
        ResourceConfig::from_yaml_str(&format!(
            "verbs:\n  - {{action: get, method: GET, path: '/users/{{id}}'}}\n  - {{action: findby, method: GET, path: /users}}\nidentifiers: [id]\nadditionalStatusFields:\n{}",
            fields.concat()
        ))
        .unwrap()
    }

    fn build(doc: &JsonOasDocument, resource: &ResourceConfig) -> (Option<Value>, Warnings) {
        let config = GeneratorConfig::default();
        let ctx = GenerationContext::new(doc, &config, resource, RecursionGuard::default());
        let mut warnings = Warnings::default();
        let status = build_status_schema(&ctx, &mut warnings).map(|s| to_json(&s));
        (status, warnings)
    }

    #[test]
    fn test_nested_field_is_reconstructed() {
        let doc = document(Some(user_schema()), None);
        let (status, warnings) = build(&doc, &resource(&["metadata.user.profile.email"]));
        let status = status.unwrap();

        assert!(warnings.is_empty());
        assert_eq!(status["properties"]["id"], json!({"type": "integer"}));
        let metadata = &status["properties"]["metadata"];
        assert_eq!(metadata[IDENTIFIER_NAME_EXTENSION], "StatusMetadata");
        let user = &metadata["properties"]["user"];
        assert_eq!(user[IDENTIFIER_NAME_EXTENSION], "StatusUser");
        let profile = &user["properties"]["profile"];
        assert_eq!(profile[IDENTIFIER_NAME_EXTENSION], "StatusProfile");
        assert_eq!(
            profile["properties"]["email"],
            json!({"type": "string", "format": "email"})
        );
        // only the requested leaf is carried over
        assert!(metadata["properties"].get("tags").is_none());
    }

    #[test]
    fn test_missing_field_falls_back_to_string() {
        let doc = document(Some(user_schema()), None);
        let (status, warnings) = build(&doc, &resource(&["nonexistent"]));
        let status = status.unwrap();

        assert_eq!(status["properties"]["nonexistent"], json!({"type": "string"}));
        let codes: Vec<_> = warnings.iter().map(|w| w.code()).collect();
        assert_eq!(codes, vec![GenerationErrorCode::StatusFieldNotFound]);
    }

    #[test]
    fn test_path_through_non_object_is_not_found() {
        let doc = document(Some(user_schema()), None);
        let (status, warnings) = build(&doc, &resource(&["metadata.tags.first"]));
        let status = status.unwrap();

        let tags = &status["properties"]["metadata"]["properties"]["tags"];
        assert_eq!(tags[IDENTIFIER_NAME_EXTENSION], "StatusTags");
        assert_eq!(tags["properties"]["first"], json!({"type": "string"}));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_findby_response_is_unwrapped() {
        let collection = json!({"type": "array", "items": user_schema()});
        let doc = document(None, Some(collection));
        let (status, warnings) = build(&doc, &resource(&["metadata.user"]));
        let status = status.unwrap();

        assert!(warnings.is_empty());
        assert_eq!(status["properties"]["id"]["type"], "integer");
        assert!(status["properties"]["metadata"]["properties"]["user"]["properties"]
            .get("profile")
            .is_some());
    }

    #[test]
    fn test_composed_response_is_searched() {
        let composed = json!({"allOf": [
            {"type": "object", "properties": {"id": {"type": "string"}}},
            {"type": "object", "properties": {"phase": {"type": "string"}}}
        ]});
        let doc = document(Some(composed), None);
        let (status, warnings) = build(&doc, &resource(&["phase"]));
        let status = status.unwrap();

        assert!(warnings.is_empty());
        assert_eq!(status["properties"]["id"]["type"], "string");
        assert_eq!(status["properties"]["phase"]["type"], "string");
    }

    #[test]
    fn test_no_base_schema() {
        let doc = document(None, None);
        let (status, warnings) = build(&doc, &resource(&["phase"]));
        let status = status.unwrap();

        assert_eq!(status["properties"]["id"]["type"], "string");
        assert_eq!(status["properties"]["phase"]["type"], "string");
        let codes: Vec<_> = warnings.iter().map(|w| w.code()).collect();
        assert_eq!(codes, vec![GenerationErrorCode::NoStatusSchema]);
    }

    #[test]
    fn test_no_requested_fields() {
        let doc = document(Some(user_schema()), None);
        let resource = ResourceConfig::default();
        let (status, warnings) = build(&doc, &resource);
        assert!(status.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_invalid_expression_is_reported() {
        let doc = document(Some(user_schema()), None);
        let (status, warnings) = build(&doc, &resource(&["metadata..user"]));
        let status = status.unwrap();
        assert_eq!(status["properties"].as_object().unwrap().len(), 1);
        let codes: Vec<_> = warnings.iter().map(|w| w.code()).collect();
        assert_eq!(codes, vec![GenerationErrorCode::InvalidPathExpression]);
    }

    #[test]
    fn test_found_property_is_copied_not_shared() {
        let base = Schema::object().into_ref();
        let name = Schema::string().into_ref();
        base.borrow_mut().add_property("name", Rc::clone(&name));

        let guard = RecursionGuard::default();
        let found = find_property(&guard, &base, &["name".to_string()])
            .unwrap()
            .unwrap();
        let copy = deep_copy_property(&found);
        let status = Schema::object().into_ref();
        insert_property(&guard, &status, &[], copy).unwrap();

        let inserted = status.borrow().property("name").unwrap();
        assert!(!Rc::ptr_eq(&inserted, &name));
    }

    #[test]
    fn test_guard_limits_deep_paths() {
        let guard = RecursionGuard::new(GuardLimits {
            max_depth: 2,
            ..Default::default()
        });
        let status = Schema::object().into_ref();
        let parents: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let result = insert_property(
            &guard,
            &status,
            &parents,
            Property::new("leaf", Schema::string().into_ref()),
        );
        assert!(matches!(result, Err(GuardError::DepthExceeded { .. })));
    }

    #[test]
    fn test_find_property_in_cyclic_schema() {
        let node = Schema::object().into_ref();
        node.borrow_mut()
            .add_property("name", Schema::string().into_ref());
        node.borrow_mut().add_property("parent", Rc::clone(&node));

        let guard = RecursionGuard::default();
        let segments: Vec<String> = ["parent", "parent", "parent", "name"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let found = find_property(&guard, &node, &segments).unwrap().unwrap();
        assert_eq!(found.name, "name");

        release_tree(&node);
    }
}
