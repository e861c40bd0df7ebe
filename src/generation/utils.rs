//! Name transformations used when synthesizing schema properties
//!
//! Generated type names and reference property names are derived from field
//! and scheme names found in the document, so they go through the same
//! normalization: split into words, then re-joined in the target case.

/// Converts a string to snake_case.
///
/// Handles camelCase, PascalCase, kebab-case and space-separated input.
///
/// # Examples
/// ```
/// use oasgen::generation::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("profileId"), "profile_id");
/// assert_eq!(to_snake_case("BasicAuth"), "basic_auth");
/// assert_eq!(to_snake_case("x-request-id"), "x_request_id");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for ch in s.chars() {
        if ch.is_uppercase() {
            if prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        } else if !result.is_empty() && !result.ends_with('_') {
            // any separator (`-`, `_`, space, `.`, `/`) becomes a single underscore
            result.push('_');
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to TitleCase (PascalCase).
///
/// # Examples
/// ```
/// use oasgen::generation::utils::to_title_case;
///
/// assert_eq!(to_title_case("profile"), "Profile");
/// assert_eq!(to_title_case("user_profile"), "UserProfile");
/// assert_eq!(to_title_case("app.io/name"), "AppIoName");
/// ```
pub fn to_title_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Converts a string to camelCase.
///
/// # Examples
/// ```
/// use oasgen::generation::utils::to_camel_case;
///
/// assert_eq!(to_camel_case("BasicAuth"), "basicAuth");
/// assert_eq!(to_camel_case("bearer_auth"), "bearerAuth");
/// ```
pub fn to_camel_case(s: &str) -> String {
    let title = to_title_case(s);
    let mut chars = title.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Type name hint attached to synthesized status containers
pub fn status_type_name(property_name: &str) -> String {
    format!("Status{}", to_title_case(property_name))
}

/// Name of the spec property referencing an authentication payload
/// (`BasicAuth` -> `basicAuthRef`)
pub fn auth_ref_name(scheme_name: &str) -> String {
    format!("{}Ref", to_camel_case(scheme_name))
}

/// Header parameters carrying credentials are never spec fields.
/// Matches `Authorization` case-insensitively, with or without a prefix.
pub fn is_authorization_header(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("authorization")
}
