//! Authentication payload synthesis
//!
//! Only HTTP Basic and HTTP Bearer schemes are modelled. Other schemes are
//! skipped, and repeated schemes of the same kind collapse into one.

use tracing::debug;

use crate::generation::utils::auth_ref_name;
use crate::generation::{Schema, SchemaRef, SecurityScheme};

/// Supported authentication methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Basic,
    Bearer,
}

impl AuthKind {
    /// Recognize an HTTP Basic or Bearer scheme, case-insensitively
    pub fn from_scheme(scheme: &SecurityScheme) -> Option<Self> {
        if !scheme.scheme_type.eq_ignore_ascii_case("http") {
            return None;
        }
        match scheme.scheme.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("basic") => Some(AuthKind::Basic),
            Some("bearer") => Some(AuthKind::Bearer),
            _ => None,
        }
    }

    /// Canonical payload name
    pub fn name(&self) -> &'static str {
        match self {
            AuthKind::Basic => "BasicAuth",
            AuthKind::Bearer => "BearerAuth",
        }
    }

    /// Key of this method inside the configuration `authentication` section
    pub fn configuration_key(&self) -> &'static str {
        match self {
            AuthKind::Basic => "basic",
            AuthKind::Bearer => "bearer",
        }
    }

    /// Name of the spec property referencing the payload (`basicAuthRef`)
    pub fn ref_name(&self) -> String {
        auth_ref_name(self.name())
    }

    pub fn payload_schema(&self) -> SchemaRef {
        let payload = Schema::object().into_ref();
        {
            let mut payload = payload.borrow_mut();
            match self {
                AuthKind::Basic => {
                    payload.add_property(
                        "username",
                        Schema::string()
                            .with_description("Username for HTTP Basic authentication")
                            .into_ref(),
                    );
                    payload.add_property("passwordRef", secret_key_selector());
                    payload.mark_required("username");
                    payload.mark_required("passwordRef");
                }
                AuthKind::Bearer => {
                    payload.add_property("tokenRef", secret_key_selector());
                    payload.mark_required("tokenRef");
                }
            }
        }
        payload
    }
}

/// Reference to a key inside an external secret
pub fn secret_key_selector() -> SchemaRef {
    let selector = Schema::object()
        .with_description("A reference to a key of a secret")
        .into_ref();
    {
        let mut selector = selector.borrow_mut();
        selector.add_property("name", Schema::string().into_ref());
        selector.add_property("key", Schema::string().into_ref());
        selector.mark_required("name");
        selector.mark_required("key");
    }
    selector
}

/// Supported methods among `schemes`, in declaration order, without repeats
pub fn supported_schemes(schemes: &[SecurityScheme]) -> Vec<AuthKind> {
    let mut kinds = Vec::new();
    for scheme in schemes {
        match AuthKind::from_scheme(scheme) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => debug!(scheme = %scheme.name, "duplicate authentication scheme collapsed"),
            None => debug!(
                scheme = %scheme.name,
                scheme_type = %scheme.scheme_type,
                "unsupported security scheme skipped"
            ),
        }
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::serializer::to_json;
    use serde_json::json;

    fn scheme(name: &str, scheme_type: &str, scheme: Option<&str>) -> SecurityScheme {
        SecurityScheme {
            name: name.to_string(),
            scheme_type: scheme_type.to_string(),
            scheme: scheme.map(str::to_string),
        }
    }

    #[test]
    fn test_from_scheme() {
        assert_eq!(
            AuthKind::from_scheme(&scheme("basic", "http", Some("basic"))),
            Some(AuthKind::Basic)
        );
        assert_eq!(
            AuthKind::from_scheme(&scheme("token", "HTTP", Some("Bearer"))),
            Some(AuthKind::Bearer)
        );
        assert_eq!(AuthKind::from_scheme(&scheme("key", "apiKey", None)), None);
        assert_eq!(
            AuthKind::from_scheme(&scheme("digest", "http", Some("digest"))),
            None
        );
        assert_eq!(AuthKind::from_scheme(&scheme("bare", "http", None)), None);
    }

    #[test]
    fn test_supported_schemes_dedup() {
        let kinds = supported_schemes(&[
            scheme("first", "http", Some("bearer")),
            scheme("oauth", "oauth2", None),
            scheme("second", "http", Some("bearer")),
            scheme("basic", "http", Some("basic")),
        ]);
        assert_eq!(kinds, vec![AuthKind::Bearer, AuthKind::Basic]);
    }

    #[test]
    fn test_basic_payload() {
        let value = to_json(&AuthKind::Basic.payload_schema());
        assert_eq!(value["required"], json!(["username", "passwordRef"]));
        assert_eq!(value["properties"]["username"]["type"], "string");
        assert_eq!(
            value["properties"]["passwordRef"]["required"],
            json!(["name", "key"])
        );
    }

    #[test]
    fn test_bearer_payload() {
        let value = to_json(&AuthKind::Bearer.payload_schema());
        assert_eq!(value["required"], json!(["tokenRef"]));
        assert_eq!(
            value["properties"]["tokenRef"]["properties"]["key"]["type"],
            "string"
        );
    }

    #[test]
    fn test_ref_names() {
        assert_eq!(AuthKind::Basic.ref_name(), "basicAuthRef");
        assert_eq!(AuthKind::Bearer.ref_name(), "bearerAuthRef");
    }
}
