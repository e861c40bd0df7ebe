//! End-to-end tests of the schema compiler through the public API

use oasgen::core::GeneratorConfig;
use oasgen::generation::{
    GenerationErrorCode, ResourceConfig, SchemaGenerator, ValidationErrorCode,
};
use oasgen::infrastructure::openapi::JsonOasDocument;
use serde_json::{Value, json};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {path}: {e}"))
}

fn widgets_document() -> JsonOasDocument {
    JsonOasDocument::from_content(&fixture("widgets.yaml"), "widgets.yaml").unwrap()
}

fn widgets_resource() -> ResourceConfig {
    ResourceConfig::from_yaml_str(&fixture("widget-resource.yaml")).unwrap()
}

fn property_names(schema: &Value) -> Vec<&str> {
    schema["properties"]
        .as_object()
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

#[test]
fn test_create_only_widget_spec() {
    let document = JsonOasDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {"/widgets": {"post": {
            "requestBody": {"content": {"application/json": {"schema": {
                "type": "object",
                "properties": {"name": {"type": "string"}, "size": {"type": "number"}}
            }}}},
            "responses": {"201": {"description": "created"}}
        }}}
    }))
    .unwrap();
    let resource =
        ResourceConfig::from_yaml_str("verbs:\n  - {action: create, method: POST, path: /widgets}\n")
            .unwrap();

    let result = SchemaGenerator::new(&document, GeneratorConfig::default(), resource)
        .generate()
        .unwrap();
    let spec = result.spec.to_json().unwrap();

    assert_eq!(spec["properties"]["name"]["type"], "string");
    assert_eq!(spec["properties"]["size"]["type"], "integer");
    assert_eq!(
        spec["properties"]["configurationRef"]["required"],
        json!(["name"])
    );
    assert!(
        spec["required"]
            .as_array()
            .unwrap()
            .contains(&json!("configurationRef"))
    );
    assert!(!String::from_utf8_lossy(result.spec.get().unwrap()).contains("\"number\""));
}

#[test]
fn test_missing_base_action() {
    let document = JsonOasDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {"/widgets": {"post": {"responses": {"201": {"description": "created"}}}}}
    }))
    .unwrap();
    let resource = ResourceConfig::from_yaml_str(
        "verbs:\n  - {action: create, method: POST, path: /widgets}\n  - {action: delete, method: DELETE, path: '/widgets/{id}'}\n",
    )
    .unwrap();

    let warnings = SchemaGenerator::new(&document, GeneratorConfig::default(), resource).validate();
    let codes: Vec<_> = warnings.iter().map(|w| w.code()).collect();
    assert_eq!(codes, vec![ValidationErrorCode::MissingBaseAction]);
}

fn profile_document() -> JsonOasDocument {
    JsonOasDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {"/users/{id}": {"get": {"responses": {"200": {
            "description": "ok",
            "content": {"application/json": {"schema": {
                "type": "object",
                "properties": {
                    "id": {"type": "string"},
                    "metadata": {"type": "object", "properties": {
                        "user": {"type": "object", "properties": {
                            "profile": {"type": "object", "properties": {
                                "email": {"type": "string"}
                            }}
                        }}
                    }}
                }
            }}}
        }}}}}
    }))
    .unwrap()
}

fn status_resource(field: &str) -> ResourceConfig {
    ResourceConfig::from_yaml_str(&format!(
        "verbs:\n  - {{action: get, method: GET, path: '/users/{{id}}'}}\nadditionalStatusFields: ['{field}']\n"
    ))
    .unwrap()
}

#[test]
fn test_nested_status_field() {
    let document = profile_document();
    let result = SchemaGenerator::new(
        &document,
        GeneratorConfig::default(),
        status_resource("metadata.user.profile.email"),
    )
    .generate()
    .unwrap();

    assert!(result.generation_warnings.is_empty());
    let status = result.status.to_json().unwrap();
    let metadata = &status["properties"]["metadata"];
    let user = &metadata["properties"]["user"];
    let profile = &user["properties"]["profile"];
    assert_eq!(profile["properties"]["email"], json!({"type": "string"}));
    assert_eq!(metadata["x-crdgen-identifier-name"], "StatusMetadata");
    assert_eq!(user["x-crdgen-identifier-name"], "StatusUser");
    // the leaf itself carries no container annotation
    assert!(
        profile["properties"]["email"]
            .get("x-crdgen-identifier-name")
            .is_none()
    );
}

#[test]
fn test_unknown_status_field() {
    let document = profile_document();
    let result = SchemaGenerator::new(
        &document,
        GeneratorConfig::default(),
        status_resource("nonexistent"),
    )
    .generate()
    .unwrap();

    let status = result.status.to_json().unwrap();
    assert_eq!(status["properties"]["nonexistent"], json!({"type": "string"}));
    let not_found: Vec<_> = result
        .generation_warnings
        .iter()
        .filter(|w| w.code() == GenerationErrorCode::StatusFieldNotFound)
        .collect();
    assert_eq!(not_found.len(), 1);
}

#[test]
fn test_basic_and_bearer_authentication() {
    let document = JsonOasDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {"/widgets": {"post": {"responses": {"201": {"description": "created"}}}}},
        "components": {"securitySchemes": {
            "basicAuth": {"type": "http", "scheme": "basic"},
            "bearerAuth": {"type": "http", "scheme": "bearer"}
        }}
    }))
    .unwrap();
    let resource =
        ResourceConfig::from_yaml_str("verbs:\n  - {action: create, method: POST, path: /widgets}\n")
            .unwrap();

    let result = SchemaGenerator::new(&document, GeneratorConfig::default(), resource)
        .generate()
        .unwrap();

    assert_eq!(result.authentication.len(), 2);
    let basic = result.authentication("BasicAuth").unwrap().to_json().unwrap();
    assert_eq!(basic["required"], json!(["username", "passwordRef"]));
    let bearer = result.authentication("BearerAuth").unwrap().to_json().unwrap();
    assert_eq!(
        bearer["properties"]["tokenRef"]["required"],
        json!(["name", "key"])
    );

    let spec = result.spec.to_json().unwrap();
    let refs = &spec["properties"]["authenticationRefs"];
    assert_eq!(refs["properties"]["basicAuthRef"], json!({"type": "string"}));
    assert_eq!(refs["properties"]["bearerAuthRef"], json!({"type": "string"}));
    assert!(
        spec["required"]
            .as_array()
            .unwrap()
            .contains(&json!("authenticationRefs"))
    );
}

#[test]
fn test_widgets_fixture() {
    let document = widgets_document();
    let result = SchemaGenerator::new(&document, GeneratorConfig::default(), widgets_resource())
        .generate()
        .unwrap();

    assert!(
        result.generation_warnings.is_empty(),
        "{:?}",
        result.generation_warnings
    );
    assert!(
        result.validation_warnings.is_empty(),
        "{:?}",
        result.validation_warnings
    );

    let spec = result.spec.to_json().unwrap();
    assert_eq!(
        property_names(&spec),
        vec![
            "name",
            "size",
            "configurationRef",
            "dryRun",
            "id",
            "authenticationRefs"
        ]
    );
    assert_eq!(
        spec["properties"]["dryRun"]["description"],
        "PARAMETER: query, VERB: Post - Validate only"
    );
    assert_eq!(
        spec["properties"]["id"]["description"],
        "PARAMETER: path, VERB: Get (IDENTIFIER: id)"
    );
    // configured and credential headers stay out of the spec
    assert!(spec["properties"].get("api-version").is_none());
    assert!(spec["properties"].get("X-Authorization").is_none());

    let status = result.status.to_json().unwrap();
    assert_eq!(property_names(&status), vec!["id", "state"]);
    assert_eq!(status["properties"]["state"]["enum"], json!(["pending", "ready"]));

    let configuration = result.configuration.to_json().unwrap();
    let findby = &configuration["properties"]["header"]["properties"]["findby"];
    assert_eq!(findby["required"], json!(["api-version"]));
    assert_eq!(
        property_names(&configuration["properties"]["authentication"]),
        vec!["basic", "bearer"]
    );

    let paths: Vec<_> = result
        .artifacts()
        .unwrap()
        .into_iter()
        .map(|a| a.path.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(
        paths,
        vec![
            "spec.schema.json",
            "status.schema.json",
            "configuration.schema.json",
            "auth/BasicAuth.schema.json",
            "auth/BearerAuth.schema.json",
        ]
    );
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let document = widgets_document();
    let run = || {
        SchemaGenerator::new(&document, GeneratorConfig::default(), widgets_resource())
            .generate()
            .unwrap()
    };
    let (first, second) = (run(), run());
    assert_eq!(first.spec.get().unwrap(), second.spec.get().unwrap());
    assert_eq!(first.status.get().unwrap(), second.status.get().unwrap());
    assert_eq!(
        first.configuration.get().unwrap(),
        second.configuration.get().unwrap()
    );
}

#[test]
fn test_identifiers_can_stay_out_of_spec() {
    let document = widgets_document();
    let config = GeneratorConfig {
        include_identifiers_in_spec: false,
        ..Default::default()
    };
    let result = SchemaGenerator::new(&document, config, widgets_resource())
        .generate()
        .unwrap();

    let spec = result.spec.to_json().unwrap();
    assert_eq!(
        spec["properties"]["id"]["description"],
        "PARAMETER: path, VERB: Get"
    );
}

#[test]
fn test_recursive_document_terminates() {
    let document = JsonOasDocument::from_value(json!({
        "openapi": "3.1.0",
        "paths": {
            "/nodes": {"post": {
                "requestBody": {"content": {"application/json": {"schema": {
                    "$ref": "#/components/schemas/Node"
                }}}},
                "responses": {"201": {"description": "created"}}
            }},
            "/nodes/{id}": {"get": {"responses": {"200": {"description": "ok",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Node"}}}
            }}}}
        },
        "components": {"schemas": {"Node": {
            "type": "object",
            "properties": {
                "id": {"type": ["string", "null"]},
                "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}}
            }
        }}}
    }))
    .unwrap();
    let resource = ResourceConfig::from_yaml_str(
        "verbs:\n  - {action: create, method: POST, path: /nodes}\n  - {action: get, method: GET, path: '/nodes/{id}'}\nadditionalStatusFields: [children]\n",
    )
    .unwrap();

    let result = SchemaGenerator::new(&document, GeneratorConfig::default(), resource)
        .generate()
        .unwrap();

    let spec = result.spec.to_json().unwrap();
    assert_eq!(spec["properties"]["id"]["type"], json!(["string", "null"]));
    let items = &spec["properties"]["children"]["items"];
    assert_eq!(items["x-kubernetes-preserve-unknown-fields"], true);

    let status = result.status.to_json().unwrap();
    assert_eq!(status["properties"]["children"]["type"], "array");
    assert!(
        result
            .validation_warnings
            .iter()
            .all(|w| w.code() != ValidationErrorCode::RecursionLimitExceeded)
    );
}
