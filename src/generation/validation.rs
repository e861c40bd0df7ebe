//! Cross-action consistency checks
//!
//! The get response (or, failing that, the findby element) is the reference
//! shape of the resource. Request and response schemas of the other actions
//! are compared against it structurally. Findings never block generation.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::generation::context::{GenerationContext, Lookup};
use crate::generation::guard::{GuardContext, GuardError, RecursionGuard};
use crate::generation::schema::{NodeId, node_id};
use crate::generation::status::unwrap_collection;
use crate::generation::{Action, SchemaRef, ValidationError, deep_copy, flatten_all_of};

/// Compare the schemas of every declared action against the base action
pub fn validate_schemas(ctx: &GenerationContext<'_>) -> Vec<ValidationError> {
    let mut findings = Vec::new();

    let base_action = if ctx.resource.verb(Action::Get).is_some() {
        Action::Get
    } else if ctx.resource.verb(Action::FindBy).is_some() {
        Action::FindBy
    } else {
        record(&mut findings, ValidationError::MissingBaseAction);
        return findings;
    };

    let Some(base) = response_schema(ctx, base_action) else {
        record(
            &mut findings,
            ValidationError::ActionSchemaMissing {
                action: base_action.to_string(),
                kind: "response".to_string(),
            },
        );
        return findings;
    };

    let mut targets: Vec<(Action, &'static str)> = Vec::new();
    for action in [Action::Create, Action::Update] {
        if ctx.resource.verb(action).is_some() {
            targets.push((action, "request"));
            targets.push((action, "response"));
        }
    }
    if base_action == Action::Get && ctx.resource.verb(Action::FindBy).is_some() {
        targets.push((Action::FindBy, "response"));
    }

    for (action, kind) in targets {
        let other = match kind {
            "request" => request_schema(ctx, action),
            _ => response_schema(ctx, action),
        };
        let Some(other) = other else {
            record(
                &mut findings,
                ValidationError::ActionSchemaMissing {
                    action: action.to_string(),
                    kind: kind.to_string(),
                },
            );
            continue;
        };

        debug!(base = %base_action, action = %action, kind, "comparing schemas");
        let mut comparison = Comparison {
            guard: &ctx.guard,
            gctx: ctx.guard.with_context(),
            base: base_action.to_string(),
            action: format!("{action} {kind}"),
            visited: HashSet::new(),
            findings: Vec::new(),
        };
        if let Err(source) = comparison.compare(&base, &other, "", 0) {
            comparison.findings.push(ValidationError::RecursionLimitExceeded {
                field_path: String::new(),
                source,
            });
        }
        for finding in comparison.findings {
            record(&mut findings, finding);
        }
    }

    findings
}

fn record(findings: &mut Vec<ValidationError>, finding: ValidationError) {
    warn!(code = %finding.code(), "{finding}");
    findings.push(finding);
}

/// Flattened private copy, so comparisons never touch document trees
fn prepared(ctx: &GenerationContext<'_>, schema: SchemaRef) -> SchemaRef {
    let copy = deep_copy(&schema);
    flatten_all_of(&copy);
    ctx.track(&copy);
    copy
}

fn request_schema(ctx: &GenerationContext<'_>, action: Action) -> Option<SchemaRef> {
    let verb = ctx.resource.verb(action)?;
    match ctx.request_schema(verb) {
        Lookup::Found(schema) => schema.map(|schema| prepared(ctx, schema)),
        Lookup::MissingOperation => None,
    }
}

fn response_schema(ctx: &GenerationContext<'_>, action: Action) -> Option<SchemaRef> {
    let verb = ctx.resource.verb(action)?;
    let schema = ctx.response_schema(verb).found().flatten()?;
    let schema = if action == Action::FindBy {
        unwrap_collection(schema)
    } else {
        schema
    };
    Some(prepared(ctx, schema))
}

/// Primary type with `number` folded into `integer`; untyped schemas with
/// properties count as objects
fn effective_type(schema: &SchemaRef) -> Option<String> {
    let node = schema.borrow();
    match node.primary_type() {
        Some("number") => Some("integer".to_string()),
        Some(other) => Some(other.to_string()),
        None if !node.properties.is_empty() => Some("object".to_string()),
        None => None,
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

struct Comparison<'g> {
    guard: &'g RecursionGuard,
    gctx: GuardContext,
    base: String,
    action: String,
    visited: HashSet<(NodeId, NodeId)>,
    findings: Vec<ValidationError>,
}

impl Comparison<'_> {
    fn compare(
        &mut self,
        base: &SchemaRef,
        other: &SchemaRef,
        path: &str,
        depth: usize,
    ) -> Result<(), GuardError> {
        self.guard.check(&self.gctx, depth)?;
        if !self.visited.insert((node_id(base), node_id(other))) {
            return Ok(());
        }

        let (base_type, other_type) = (effective_type(base), effective_type(other));
        let (Some(base_type), Some(other_type)) = (base_type, other_type) else {
            return Ok(());
        };
        if base_type != other_type {
            self.findings.push(ValidationError::TypeMismatch {
                field_path: path.to_string(),
                base: self.base.clone(),
                action: self.action.clone(),
                expected: base_type,
                actual: other_type,
            });
            return Ok(());
        }

        match base_type.as_str() {
            "object" => self.compare_objects(base, other, path, depth),
            "array" => self.compare_arrays(base, other, path, depth),
            _ => Ok(()),
        }
    }

    fn compare_objects(
        &mut self,
        base: &SchemaRef,
        other: &SchemaRef,
        path: &str,
        depth: usize,
    ) -> Result<(), GuardError> {
        let base_props = base.borrow().properties.clone();
        let other_props = other.borrow().properties.clone();

        match (base_props.is_empty(), other_props.is_empty()) {
            (true, true) => return Ok(()),
            (false, true) => {
                self.findings.push(ValidationError::PropertyMismatch {
                    field_path: path.to_string(),
                    present_in: self.base.clone(),
                    missing_in: self.action.clone(),
                });
                return Ok(());
            }
            (true, false) => {
                self.findings.push(ValidationError::PropertyMismatch {
                    field_path: path.to_string(),
                    present_in: self.action.clone(),
                    missing_in: self.base.clone(),
                });
                return Ok(());
            }
            (false, false) => {}
        }

        for property in &base_props {
            if let Some(counterpart) = other_props.iter().find(|p| p.name == property.name) {
                self.compare(
                    &property.schema,
                    &counterpart.schema,
                    &child_path(path, &property.name),
                    depth + 1,
                )?;
            }
        }
        Ok(())
    }

    fn compare_arrays(
        &mut self,
        base: &SchemaRef,
        other: &SchemaRef,
        path: &str,
        depth: usize,
    ) -> Result<(), GuardError> {
        let base_items = base.borrow().items.clone();
        let other_items = other.borrow().items.clone();
        match (base_items, other_items) {
            (Some(base_items), Some(other_items)) => {
                self.compare(&base_items, &other_items, &format!("{path}[]"), depth + 1)
            }
            (None, None) => Ok(()),
            (Some(_), None) => {
                self.findings.push(ValidationError::MissingArrayItems {
                    field_path: path.to_string(),
                    present_in: self.base.clone(),
                    missing_in: self.action.clone(),
                });
                Ok(())
            }
            (None, Some(_)) => {
                self.findings.push(ValidationError::MissingArrayItems {
                    field_path: path.to_string(),
                    present_in: self.action.clone(),
                    missing_in: self.base.clone(),
                });
                Ok(())
            }
        }
    }
}
