//! Generation context - the inputs every builder reads

use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

use crate::core::GeneratorConfig;
use crate::generation::{
    GenerationError, MediaType, OasDocument, Operation, Parameter, RecursionGuard, ResourceConfig,
    SchemaRef, Verb, release_tree, schema_for_mime_types,
};

/// Read-only inputs of one generation request
///
/// Every schema read from the document, and every tree handed to
/// [`GenerationContext::track`], is torn down with [`release_tree`] when the
/// context is dropped.
pub struct GenerationContext<'a> {
    pub document: &'a dyn OasDocument,
    pub config: &'a GeneratorConfig,
    pub resource: &'a ResourceConfig,
    pub guard: RecursionGuard,
    trees: RefCell<Vec<SchemaRef>>,
}

/// Whether the operation behind a verb could be reached
pub enum Lookup<T> {
    Found(T),
    /// The path or the method is not declared
    MissingOperation,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::MissingOperation => None,
        }
    }
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        document: &'a dyn OasDocument,
        config: &'a GeneratorConfig,
        resource: &'a ResourceConfig,
        guard: RecursionGuard,
    ) -> Self {
        Self {
            document,
            config,
            resource,
            guard,
            trees: RefCell::new(Vec::new()),
        }
    }

    /// Keep `schema` until the request ends, then release it
    pub fn track(&self, schema: &SchemaRef) {
        self.trees.borrow_mut().push(Rc::clone(schema));
    }

    fn track_content(&self, content: &[MediaType]) {
        for media in content {
            if let Some(schema) = &media.schema {
                self.track(schema);
            }
        }
    }

    /// Run `f` against the operation a verb points at
    pub fn with_operation<T>(&self, verb: &Verb, f: impl FnOnce(&dyn Operation) -> T) -> Lookup<T> {
        let Some(item) = self.document.find_path(&verb.path) else {
            return Lookup::MissingOperation;
        };
        let operation = item.operation(verb.method);
        match operation {
            Some(operation) => Lookup::Found(f(operation.as_ref())),
            None => Lookup::MissingOperation,
        }
    }

    /// Request body schema for the first accepted media type
    pub fn request_schema(&self, verb: &Verb) -> Lookup<Option<SchemaRef>> {
        self.with_operation(verb, |operation| {
            let body = operation.request_body()?;
            self.track_content(&body.content);
            schema_for_mime_types(&body.content, &self.config.accepted_mime_types)
        })
    }

    /// Schema of the first configured success response that declares an
    /// accepted media type
    pub fn response_schema(&self, verb: &Verb) -> Lookup<Option<SchemaRef>> {
        self.with_operation(verb, |operation| {
            let responses = operation.responses();
            for response in &responses {
                self.track_content(&response.content);
            }
            self.config.success_codes.iter().find_map(|code| {
                let code = code.to_string();
                responses
                    .iter()
                    .find(|r| r.status_code == code)
                    .and_then(|r| {
                        schema_for_mime_types(&r.content, &self.config.accepted_mime_types)
                    })
            })
        })
    }

    pub fn parameters(&self, verb: &Verb) -> Lookup<Vec<Parameter>> {
        self.with_operation(verb, |operation| {
            let parameters = operation.parameters();
            for schema in parameters.iter().filter_map(|p| p.schema.as_ref()) {
                self.track(schema);
            }
            parameters
        })
    }
}

impl Drop for GenerationContext<'_> {
    fn drop(&mut self) {
        for schema in self.trees.get_mut().drain(..) {
            release_tree(&schema);
        }
    }
}

/// Accumulates generation warnings, logging each one as it is recorded
#[derive(Debug, Default)]
pub struct Warnings {
    entries: Vec<GenerationError>,
}

impl Warnings {
    pub fn record(&mut self, warning: GenerationError) {
        warn!(code = %warning.code(), "{warning}");
        self.entries.push(warning);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationError> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<GenerationError> {
        self.entries
    }
}
