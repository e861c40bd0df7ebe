//! Port interfaces for the generation domain
//!
//! The builders only ever see an OpenAPI document through [`OasDocument`],
//! [`PathItem`] and [`Operation`]. Implementations must be pure reads and
//! report malformed input as "not found" rather than failing. Schema trees
//! handed out are owned by the caller, who releases them with
//! [`release_tree`](crate::generation::release_tree).

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::generation::{
    HttpMethod, Parameter, ParserError, RequestBody, Response, SecurityScheme,
};

/// Read-only view over an OpenAPI document
pub trait OasDocument: Send + Sync {
    /// Look up a path item by its exact template (`/widgets/{id}`)
    fn find_path(&self, path: &str) -> Option<Box<dyn PathItem + '_>>;

    /// Security schemes declared under `components.securitySchemes`, in
    /// declaration order
    fn security_schemes(&self) -> Vec<SecurityScheme>;
}

/// Operations of a single path
pub trait PathItem {
    fn operations(&self) -> BTreeMap<HttpMethod, Box<dyn Operation + '_>>;

    fn operation(&self, method: HttpMethod) -> Option<Box<dyn Operation + '_>> {
        self.operations().remove(&method)
    }
}

/// A single HTTP operation
pub trait Operation {
    fn parameters(&self) -> Vec<Parameter>;

    fn request_body(&self) -> Option<RequestBody>;

    /// Responses keyed by status code as written in the document
    fn responses(&self) -> Vec<Response>;

    fn response(&self, status_code: &str) -> Option<Response> {
        self.responses()
            .into_iter()
            .find(|r| r.status_code == status_code)
    }
}

/// Loads OpenAPI documents
#[async_trait]
pub trait OpenApiLoader: Send + Sync {
    /// Load a document from a source (file path or URL)
    async fn load(&self, source: &str) -> Result<Box<dyn OasDocument>, ParserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{MediaType, ParameterLocation, Schema};

    struct StaticDocument;
    struct StaticPath;
    struct StaticOperation;

    impl OasDocument for StaticDocument {
        fn find_path(&self, path: &str) -> Option<Box<dyn PathItem + '_>> {
            if path == "/things" {
                Some(Box::new(StaticPath))
            } else {
                None
            }
        }

        fn security_schemes(&self) -> Vec<SecurityScheme> {
            Vec::new()
        }
    }

    impl PathItem for StaticPath {
        fn operations(&self) -> BTreeMap<HttpMethod, Box<dyn Operation + '_>> {
            let mut operations: BTreeMap<HttpMethod, Box<dyn Operation + '_>> = BTreeMap::new();
            operations.insert(HttpMethod::Get, Box::new(StaticOperation));
            operations
        }
    }

    impl Operation for StaticOperation {
        fn parameters(&self) -> Vec<Parameter> {
            vec![Parameter {
                name: "limit".to_string(),
                location: ParameterLocation::Query,
                required: false,
                description: None,
                schema: Some(Schema::typed("integer").into_ref()),
            }]
        }

        fn request_body(&self) -> Option<RequestBody> {
            None
        }

        fn responses(&self) -> Vec<Response> {
            vec![Response {
                status_code: "200".to_string(),
                description: "ok".to_string(),
                content: vec![MediaType {
                    mime_type: "application/json".to_string(),
                    schema: Some(Schema::object().into_ref()),
                }],
            }]
        }
    }

    #[test]
    fn test_default_lookups() {
        let document = StaticDocument;
        assert!(document.find_path("/missing").is_none());

        let path = document.find_path("/things").unwrap();
        assert!(path.operation(HttpMethod::Post).is_none());
        let operation = path.operation(HttpMethod::Get).unwrap();
        assert_eq!(operation.parameters()[0].name, "limit");
        assert!(operation.response("200").is_some());
        assert!(operation.response("404").is_none());
    }
}
