//! Configuration schema builder
//!
//! Parameters declared as externally configurable are grouped as
//! `<location>.<action>.<parameter>`, next to an `authentication` section
//! holding one payload per supported security scheme.

use std::rc::Rc;
use tracing::debug;

use crate::generation::auth::supported_schemes;
use crate::generation::context::{GenerationContext, Lookup, Warnings};
use crate::generation::{
    ConfigurationField, GenerationError, Parameter, Schema, SchemaRef, deep_copy,
};

pub const AUTHENTICATION: &str = "authentication";

/// Build the configuration schema tree, or `None` when there is nothing to
/// configure
pub fn build_configuration_schema(
    ctx: &GenerationContext<'_>,
    warnings: &mut Warnings,
) -> Option<SchemaRef> {
    let root = Schema::object().into_ref();

    for field in &ctx.resource.configuration_fields {
        add_configuration_field(ctx, &root, field, warnings);
    }

    let kinds = supported_schemes(&ctx.document.security_schemes());
    if !kinds.is_empty() {
        let authentication = Schema::object().into_ref();
        for kind in kinds {
            authentication
                .borrow_mut()
                .add_property(kind.configuration_key(), kind.payload_schema());
        }
        root.borrow_mut().set_property(AUTHENTICATION, authentication);
    }

    if root.borrow().properties.is_empty() {
        debug!("nothing to configure");
        return None;
    }
    Some(root)
}

fn add_configuration_field(
    ctx: &GenerationContext<'_>,
    root: &SchemaRef,
    field: &ConfigurationField,
    warnings: &mut Warnings,
) {
    let verbs: Vec<_> = ctx
        .resource
        .verbs
        .iter()
        .filter(|verb| field.applies_to(verb.action))
        .collect();

    if verbs.is_empty() {
        warnings.record(GenerationError::ConfigurationFieldNotFound {
            name: field.name().to_string(),
            location: field.location().to_string(),
            action: field.from_rest_definition.actions.join(","),
        });
        return;
    }

    for verb in verbs {
        let parameter = match ctx.parameters(verb) {
            Lookup::Found(parameters) => parameters
                .into_iter()
                .find(|p| field.matches(&p.name, p.location)),
            Lookup::MissingOperation => None,
        };
        let Some(parameter) = parameter else {
            warnings.record(GenerationError::ConfigurationFieldNotFound {
                name: field.name().to_string(),
                location: field.location().to_string(),
                action: verb.action.to_string(),
            });
            continue;
        };

        let location = child_object(root, parameter.location.as_str());
        let action = child_object(&location, verb.action.as_str());
        let mut action = action.borrow_mut();
        action.set_property(&parameter.name, parameter_schema(&parameter));
        if parameter.required {
            action.mark_required(&parameter.name);
        }
        debug!(
            parameter = %parameter.name,
            location = %parameter.location,
            action = %verb.action,
            "configuration field added"
        );
    }
}

fn parameter_schema(parameter: &Parameter) -> SchemaRef {
    let schema = match &parameter.schema {
        Some(schema) => deep_copy(schema),
        None => Schema::string().into_ref(),
    };
    if let Some(description) = &parameter.description {
        schema.borrow_mut().description = Some(description.clone());
    }
    schema
}

/// Existing object child `name` of `parent`, created when absent
fn child_object(parent: &SchemaRef, name: &str) -> SchemaRef {
    let existing = parent.borrow().property(name);
    match existing {
        Some(child) if child.borrow().is_object() => child,
        _ => {
            let child = Schema::object().into_ref();
            parent.borrow_mut().set_property(name, Rc::clone(&child));
            child
        }
    }
}
