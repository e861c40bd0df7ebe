//! Desired-state ("spec") schema builder
//!
//! The spec starts from the create request body and is then shaped for a
//! managed resource: compositions are flattened, configured and excluded
//! fields are removed, operation parameters and identifiers are injected,
//! and references to the configuration and authentication payloads are
//! added.

use std::collections::HashSet;
use std::rc::Rc;
use tracing::debug;

use crate::generation::auth::supported_schemes;
use crate::generation::context::{GenerationContext, Lookup, Warnings};
use crate::generation::utils::is_authorization_header;
use crate::generation::{
    Action, GenerationError, Parameter, ParameterLocation, Schema, SchemaRef, Verb, deep_copy,
    flatten_all_of, parse_path,
};

pub const CONFIGURATION_REF: &str = "configurationRef";
pub const AUTHENTICATION_REFS: &str = "authenticationRefs";

/// Build the spec schema tree
pub fn build_spec_schema(ctx: &GenerationContext<'_>, warnings: &mut Warnings) -> SchemaRef {
    let root = base_schema(ctx, warnings);
    flatten_all_of(&root);
    {
        let mut root = root.borrow_mut();
        if root.types.is_empty() {
            root.types.push("object".to_string());
        }
    }

    add_configuration_ref(&root);
    remove_configuration_fields(ctx, &root);
    for expression in &ctx.resource.excluded_spec_fields {
        exclude_field(&root, expression, warnings);
    }
    inject_parameters(ctx, &root, warnings);
    if ctx.config.include_identifiers_in_spec {
        for identifier in &ctx.resource.identifiers {
            inject_identifier(&root, identifier);
        }
    }
    add_authentication_refs(ctx, &root);

    root
}

/// Create request body, wrapped into an object when it is an array
fn base_schema(ctx: &GenerationContext<'_>, warnings: &mut Warnings) -> SchemaRef {
    let Some(verb) = ctx.resource.verb(Action::Create) else {
        debug!("no create verb declared, starting from an empty object");
        return Schema::object().into_ref();
    };

    let body = match ctx.request_schema(verb) {
        Lookup::Found(Some(body)) => body,
        Lookup::Found(None) => {
            warnings.record(GenerationError::NoRootSchema {
                action: verb.action.to_string(),
                path: verb.path.clone(),
            });
            return Schema::object().into_ref();
        }
        Lookup::MissingOperation => {
            warnings.record(path_not_found(verb));
            return Schema::object().into_ref();
        }
    };

    let body = deep_copy(&body);
    let primary = body.borrow().primary_type().map(str::to_string);
    match primary.as_deref() {
        Some("array") => {
            debug!(path = %verb.path, "wrapping array request body into an object");
            let wrapper = Schema::object().into_ref();
            wrapper.borrow_mut().add_property("items", body);
            wrapper
        }
        Some("object") | None => body,
        Some(other) => {
            debug!(path = %verb.path, body_type = %other, "request body is not an object");
            warnings.record(GenerationError::NoRootSchema {
                action: verb.action.to_string(),
                path: verb.path.clone(),
            });
            Schema::object().into_ref()
        }
    }
}

fn path_not_found(verb: &Verb) -> GenerationError {
    GenerationError::PathNotFound {
        action: verb.action.to_string(),
        path: format!("{} {}", verb.method.as_str().to_uppercase(), verb.path),
    }
}

fn add_configuration_ref(root: &SchemaRef) {
    let reference = Schema::object()
        .with_description("Reference to the configuration resource of this resource")
        .into_ref();
    {
        let mut reference = reference.borrow_mut();
        reference.add_property("name", Schema::string().into_ref());
        reference.add_property("namespace", Schema::string().into_ref());
        reference.mark_required("name");
    }
    let mut root = root.borrow_mut();
    root.set_property(CONFIGURATION_REF, reference);
    root.mark_required(CONFIGURATION_REF);
}

/// Configured parameters live in the configuration schema only. Identifiers
/// stay even when a configuration field shares their name.
fn remove_configuration_fields(ctx: &GenerationContext<'_>, root: &SchemaRef) {
    let names = root.borrow().property_names();
    for name in names {
        if name == CONFIGURATION_REF || ctx.resource.identifiers.contains(&name) {
            continue;
        }
        if ctx.resource.is_configuration_field_name(&name) {
            debug!(field = %name, "removing configured field from spec");
            root.borrow_mut().remove_property(&name);
        }
    }
}

/// Remove the property a path expression points at.
/// Returns false when the path does not resolve.
pub fn remove_field(root: &SchemaRef, segments: &[String]) -> bool {
    let Some((leaf, parents)) = segments.split_last() else {
        return false;
    };
    let mut parent = Rc::clone(root);
    for segment in parents {
        let child = parent.borrow_mut().detach_property(segment);
        match child {
            Some(child) if child.borrow().is_object() => parent = child,
            _ => return false,
        }
    }
    let removed = parent.borrow_mut().remove_property(leaf);
    removed.is_some()
}

fn exclude_field(root: &SchemaRef, expression: &str, warnings: &mut Warnings) {
    match parse_path(expression) {
        Ok(segments) => {
            if remove_field(root, &segments) {
                debug!(field = %expression, "excluded field removed from spec");
            } else {
                warnings.record(GenerationError::ExcludedFieldNotFound {
                    field: expression.to_string(),
                });
            }
        }
        Err(err) => warnings.record(err.into()),
    }
}

fn parameter_description(parameter: &Parameter, verb: &Verb) -> String {
    let original = parameter.description.clone().or_else(|| {
        parameter
            .schema
            .as_ref()
            .and_then(|schema| schema.borrow().description.clone())
    });
    let prefix = format!(
        "PARAMETER: {}, VERB: {}",
        parameter.location,
        verb.method.capitalized()
    );
    match original {
        Some(description) if !description.is_empty() => format!("{prefix} - {description}"),
        _ => prefix,
    }
}

fn is_injectable(ctx: &GenerationContext<'_>, verb: &Verb, parameter: &Parameter) -> bool {
    if ctx
        .resource
        .configuration_field(&parameter.name, parameter.location)
        .is_some()
    {
        return false;
    }
    if parameter.location == ParameterLocation::Header && is_authorization_header(&parameter.name)
    {
        return false;
    }
    !verb.maps_parameter(&parameter.name, parameter.location)
}

fn inject_parameters(ctx: &GenerationContext<'_>, root: &SchemaRef, warnings: &mut Warnings) {
    let mut injected: HashSet<String> = HashSet::new();

    for verb in &ctx.resource.verbs {
        let parameters = match ctx.parameters(verb) {
            Lookup::Found(parameters) => parameters,
            Lookup::MissingOperation => {
                // a missing create operation was already reported with the base schema
                if verb.action != Action::Create {
                    warnings.record(path_not_found(verb));
                }
                continue;
            }
        };

        for parameter in parameters {
            if !is_injectable(ctx, verb, &parameter) {
                continue;
            }
            if root.borrow().has_property(&parameter.name) {
                // a parameter injected for an earlier verb is the same field;
                // only clashes with body properties are reported
                if !injected.contains(&parameter.name) {
                    warnings.record(GenerationError::DuplicateParameter {
                        parameter: parameter.name.clone(),
                        location: parameter.location.to_string(),
                        action: verb.action.to_string(),
                    });
                }
                continue;
            }

            let schema = match &parameter.schema {
                Some(schema) => deep_copy(schema),
                None => Schema::string().into_ref(),
            };
            schema.borrow_mut().description = Some(parameter_description(&parameter, verb));
            debug!(
                parameter = %parameter.name,
                location = %parameter.location,
                action = %verb.action,
                "injecting parameter into spec"
            );
            root.borrow_mut().add_property(&parameter.name, schema);
            injected.insert(parameter.name);
        }
    }
}

/// Add an identifier as a string property, or tag an existing property.
/// Injecting the same identifier twice changes nothing.
pub fn inject_identifier(root: &SchemaRef, identifier: &str) {
    let annotation = format!("IDENTIFIER: {identifier}");
    let existing = root.borrow().property(identifier);
    match existing {
        None => {
            root.borrow_mut().add_property(
                identifier,
                Schema::string().with_description(annotation).into_ref(),
            );
        }
        Some(property) => {
            let mut property = property.borrow_mut();
            match property.description.as_mut() {
                Some(description) if description.contains(&annotation) => {}
                Some(description) if !description.is_empty() => {
                    description.push_str(&format!(" ({annotation})"));
                }
                _ => property.description = Some(annotation),
            }
        }
    }
}

fn add_authentication_refs(ctx: &GenerationContext<'_>, root: &SchemaRef) {
    let kinds = supported_schemes(&ctx.document.security_schemes());
    if kinds.is_empty() {
        return;
    }
    let refs = Schema::object()
        .with_description("References to the authentication resources")
        .into_ref();
    for kind in kinds {
        refs.borrow_mut()
            .add_property(&kind.ref_name(), Schema::string().into_ref());
    }
    let mut root = root.borrow_mut();
    root.set_property(AUTHENTICATION_REFS, refs);
    root.mark_required(AUTHENTICATION_REFS);
}
