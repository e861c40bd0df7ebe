//! Field path expressions
//!
//! A path addresses a nested field: `metadata.user.email`. Field names that
//! contain a dot are written in brackets with quotes, either after a dot or
//! directly after the previous segment: `labels.['app.io/name']` or
//! `labels['app.io/name']`.
//!
//! Bare segments may contain ASCII letters, digits, `_` and `-`. The empty
//! expression parses to a single empty segment.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static BARE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid segment pattern"));

/// A malformed path expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field path '{expression}' at position {position}: {reason}")]
pub struct PathParseError {
    pub expression: String,
    pub position: usize,
    pub reason: String,
}

impl PathParseError {
    fn new(expression: &str, position: usize, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            position,
            reason: reason.into(),
        }
    }
}

/// Parse an expression into literal field-name segments
pub fn parse_path(expression: &str) -> Result<Vec<String>, PathParseError> {
    if expression.is_empty() {
        return Ok(vec![String::new()]);
    }

    let chars: Vec<(usize, char)> = expression.char_indices().collect();
    let mut segments = Vec::new();
    let mut i = 0;
    // true when the next token must start a segment (start of input or after a dot)
    let mut expect_segment = true;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        match ch {
            '.' => {
                if expect_segment {
                    let reason = if segments.is_empty() {
                        "leading dot"
                    } else {
                        "empty segment"
                    };
                    return Err(PathParseError::new(expression, pos, reason));
                }
                expect_segment = true;
                i += 1;
            }
            '[' => {
                let (segment, next) = parse_bracket(expression, &chars, i)?;
                segments.push(segment);
                expect_segment = false;
                i = next;
            }
            _ => {
                if !expect_segment {
                    return Err(PathParseError::new(
                        expression,
                        pos,
                        "expected '.' or '[' after a bracketed segment",
                    ));
                }
                let start = i;
                while i < chars.len() && chars[i].1 != '.' && chars[i].1 != '[' {
                    i += 1;
                }
                let end = chars.get(i).map(|(p, _)| *p).unwrap_or(expression.len());
                let segment = &expression[pos..end];
                if !BARE_SEGMENT.is_match(segment) {
                    let (bad_pos, bad_char) = chars[start..i]
                        .iter()
                        .copied()
                        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
                        .unwrap_or((pos, ch));
                    let reason = if bad_char.is_whitespace() {
                        "unescaped space".to_string()
                    } else {
                        format!("unexpected character '{bad_char}'")
                    };
                    return Err(PathParseError::new(expression, bad_pos, reason));
                }
                segments.push(segment.to_string());
                expect_segment = false;
            }
        }
    }

    if expect_segment {
        return Err(PathParseError::new(
            expression,
            expression.len(),
            "trailing dot",
        ));
    }

    Ok(segments)
}

/// Parse `['token']` starting at `chars[start] == '['`.
/// Returns the token and the index just past the closing bracket.
fn parse_bracket(
    expression: &str,
    chars: &[(usize, char)],
    start: usize,
) -> Result<(String, usize), PathParseError> {
    let open_pos = chars[start].0;
    let quote = match chars.get(start + 1) {
        Some((_, q @ ('\'' | '"'))) => *q,
        Some((pos, _)) => {
            return Err(PathParseError::new(
                expression,
                *pos,
                "bracket must contain a quoted name",
            ));
        }
        None => {
            return Err(PathParseError::new(expression, open_pos, "unclosed bracket"));
        }
    };

    let mut i = start + 2;
    let mut token = String::new();
    while i < chars.len() && chars[i].1 != quote {
        token.push(chars[i].1);
        i += 1;
    }
    if i >= chars.len() {
        return Err(PathParseError::new(expression, open_pos, "unterminated quote"));
    }
    if token.is_empty() {
        return Err(PathParseError::new(
            expression,
            open_pos,
            "bracket name must not be empty",
        ));
    }
    match chars.get(i + 1) {
        Some((_, ']')) => Ok((token, i + 2)),
        Some((pos, _)) => Err(PathParseError::new(
            expression,
            *pos,
            "expected ']' after quoted name",
        )),
        None => Err(PathParseError::new(expression, open_pos, "unclosed bracket")),
    }
}

/// Render segments back into an expression, quoting segments that are not
/// valid bare identifiers.
///
/// A lone empty segment renders as the empty expression. Names holding both
/// quote characters, and empty segments inside a longer path, have no
/// expression form; they are rendered quoted but do not parse back.
pub fn format_path(segments: &[String]) -> String {
    if let [only] = segments {
        if only.is_empty() {
            return String::new();
        }
    }
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let rendered = if BARE_SEGMENT.is_match(segment) {
                segment.clone()
            } else if segment.contains('\'') {
                format!("[\"{segment}\"]")
            } else {
                format!("['{segment}']")
            };
            if index == 0 {
                rendered
            } else {
                format!(".{rendered}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_paths() {
        assert_eq!(parse_path("name").unwrap(), segs(&["name"]));
        assert_eq!(
            parse_path("metadata.user.profile_id").unwrap(),
            segs(&["metadata", "user", "profile_id"])
        );
        assert_eq!(parse_path("a-b.c_d.9").unwrap(), segs(&["a-b", "c_d", "9"]));
    }

    #[test]
    fn test_parse_bracketed_segments() {
        assert_eq!(
            parse_path("labels.['app.io/name']").unwrap(),
            segs(&["labels", "app.io/name"])
        );
        assert_eq!(
            parse_path("labels['app.io/name'].value").unwrap(),
            segs(&["labels", "app.io/name", "value"])
        );
        assert_eq!(
            parse_path("['a.b']").unwrap(),
            segs(&["a.b"])
        );
        assert_eq!(
            parse_path("[\"it's.here\"]").unwrap(),
            segs(&["it's.here"])
        );
        assert_eq!(
            parse_path("x.['with space']").unwrap(),
            segs(&["x", "with space"])
        );
    }

    #[test]
    fn test_parse_empty_expression() {
        assert_eq!(parse_path("").unwrap(), segs(&[""]));
    }

    #[test]
    fn test_parse_rejects_malformed_dots() {
        assert_eq!(parse_path(".a").unwrap_err().reason, "leading dot");
        assert_eq!(parse_path("a.").unwrap_err().reason, "trailing dot");
        assert_eq!(parse_path("a..b").unwrap_err().reason, "empty segment");
        assert_eq!(parse_path(".").unwrap_err().reason, "leading dot");
    }

    #[test]
    fn test_parse_rejects_spaces_and_symbols() {
        let err = parse_path("a b").unwrap_err();
        assert_eq!(err.reason, "unescaped space");
        assert_eq!(err.position, 1);

        let err = parse_path("a.b$").unwrap_err();
        assert_eq!(err.reason, "unexpected character '$'");
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_parse_rejects_bad_brackets() {
        assert!(parse_path("a.['b'").is_err());
        assert!(parse_path("a.['b").is_err());
        assert!(parse_path("a.[b]").is_err());
        assert!(parse_path("a.['']").is_err());
        assert!(parse_path("a.[").is_err());
        assert!(parse_path("['a']b").is_err());
        assert!(parse_path("['a'x]").is_err());
    }

    #[test]
    fn test_error_message_is_descriptive() {
        let err = parse_path("a..b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid field path 'a..b' at position 2: empty segment"
        );
    }

    #[test]
    fn test_format_round_trips() {
        for expression in [
            "name",
            "metadata.user.email",
            "labels.['app.io/name']",
            "a.['b c'].d",
        ] {
            let segments = parse_path(expression).unwrap();
            let rendered = format_path(&segments);
            assert_eq!(parse_path(&rendered).unwrap(), segments, "{expression}");
        }

        let dotted = segs(&["spec", "a.b", "it's"]);
        assert_eq!(parse_path(&format_path(&dotted)).unwrap(), dotted);
    }

    #[test]
    fn test_format_empty_expression_round_trips() {
        let empty = parse_path("").unwrap();
        assert_eq!(format_path(&empty), "");
        assert_eq!(parse_path(&format_path(&empty)).unwrap(), empty);
    }
}
