//! Route pattern segments
//!
//! Pure parsing of URI patterns like `user/{id}` into typed segments.
//! Parsing has no shared state: identical inputs always produce identical
//! output, which the compiled-table cache relies on.

use crate::Error;
use std::collections::HashMap;

/// Default constraint for parameters without an explicit pattern:
/// one or more non-slash characters.
pub const DEFAULT_PARAM_PATTERN: &str = "[^/]+";

/// A single `/`-delimited component of a URI pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Static segment (exact, case-sensitive match)
    Static(String),
    /// Named parameter: `{name}`, or `{name?}` when optional
    Param {
        name: String,
        /// Explicit regex constraint; `None` falls back to
        /// [`DEFAULT_PARAM_PATTERN`] at compile time.
        constraint: Option<String>,
        optional: bool,
    },
}

impl Segment {
    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param { .. })
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Segment::Param { optional: true, .. })
    }

    /// Parameter name, if this is a parameter segment
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Param { name, .. } => Some(name),
            Segment::Static(_) => None,
        }
    }
}

/// Parse a URI pattern into its ordered segments.
///
/// `conditions` maps parameter names to explicit regex constraints; a
/// parameter without an entry gets the default any-non-slash pattern.
/// A single leading and trailing `/` are ignored, so `""`, `"/"` and the
/// root pattern all parse to one empty static segment.
pub fn parse(pattern: &str, conditions: &HashMap<String, String>) -> Result<Vec<Segment>, Error> {
    let trimmed = pattern.strip_prefix('/').unwrap_or(pattern);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let mut segments = Vec::new();
    for part in trimmed.split('/') {
        segments.push(parse_part(pattern, part, conditions)?);
    }

    validate(pattern, &segments)?;
    Ok(segments)
}

fn parse_part(
    pattern: &str,
    part: &str,
    conditions: &HashMap<String, String>,
) -> Result<Segment, Error> {
    let Some(rest) = part.strip_prefix('{') else {
        // Anything not introduced by `{` is static, verbatim.
        return Ok(Segment::Static(part.to_string()));
    };

    let Some(inner) = rest.strip_suffix('}') else {
        if rest.contains('}') {
            // Terminated brace with trailing text (e.g. a `.json`
            // suffix glued onto `{id}`): static, verbatim.
            return Ok(Segment::Static(part.to_string()));
        }
        return Err(invalid(pattern, format!("unterminated parameter `{part}`")));
    };

    let (name, optional) = match inner.strip_suffix('?') {
        Some(name) => (name, true),
        None => (inner, false),
    };

    if name.is_empty() {
        return Err(invalid(pattern, "empty parameter name".to_string()));
    }
    if !is_valid_name(name) {
        return Err(invalid(
            pattern,
            format!("parameter name `{name}` must match [A-Za-z_][A-Za-z0-9_]*"),
        ));
    }

    Ok(Segment::Param {
        name: name.to_string(),
        constraint: conditions.get(name).cloned(),
        optional,
    })
}

fn validate(pattern: &str, segments: &[Segment]) -> Result<(), Error> {
    let mut seen = Vec::new();
    let mut in_optional_tail = false;

    for segment in segments {
        if let Some(name) = segment.param_name() {
            if seen.contains(&name) {
                return Err(invalid(pattern, format!("duplicate parameter `{name}`")));
            }
            seen.push(name);
        }

        if segment.is_optional() {
            in_optional_tail = true;
        } else if in_optional_tail {
            return Err(invalid(
                pattern,
                "optional parameters may only occupy trailing positions".to_string(),
            ));
        }
    }

    Ok(())
}

// Parameter names double as regex capture-group names, so they are held
// to the group-name grammar.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(pattern: &str, reason: String) -> Error {
    Error::InvalidRoutePattern {
        pattern: pattern.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_conditions() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_parse_static_and_param() {
        let segments = parse("user/{id}", &no_conditions()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::Static("user".to_string()));
        assert_eq!(
            segments[1],
            Segment::Param {
                name: "id".to_string(),
                constraint: None,
                optional: false,
            }
        );
    }

    #[test]
    fn test_segment_count_matches_parts() {
        for (pattern, parts) in [
            ("users", 1),
            ("user/{id}", 2),
            ("a/b/c", 3),
            ("api/v1/users/{id}", 4),
        ] {
            assert_eq!(parse(pattern, &no_conditions()).unwrap().len(), parts);
        }
    }

    #[test]
    fn test_root_pattern() {
        for root in ["", "/"] {
            let segments = parse(root, &no_conditions()).unwrap();
            assert_eq!(segments, vec![Segment::Static(String::new())]);
        }
    }

    #[test]
    fn test_explicit_constraint() {
        let mut conditions = HashMap::new();
        conditions.insert("id".to_string(), r"\d+".to_string());

        let segments = parse("user/{id}", &conditions).unwrap();
        assert_eq!(
            segments[1],
            Segment::Param {
                name: "id".to_string(),
                constraint: Some(r"\d+".to_string()),
                optional: false,
            }
        );
    }

    #[test]
    fn test_unterminated_parameter() {
        let err = parse("user/{id", &no_conditions()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoutePattern { .. }));
    }

    #[test]
    fn test_empty_parameter_name() {
        let err = parse("user/{}", &no_conditions()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoutePattern { .. }));

        let err = parse("user/{?}", &no_conditions()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoutePattern { .. }));
    }

    #[test]
    fn test_invalid_parameter_name() {
        let err = parse("user/{user-id}", &no_conditions()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoutePattern { .. }));
    }

    #[test]
    fn test_optional_parameter() {
        let segments = parse("pages/{slug?}", &no_conditions()).unwrap();
        assert!(segments[1].is_optional());
    }

    #[test]
    fn test_optional_must_be_trailing() {
        let err = parse("pages/{slug?}/edit", &no_conditions()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoutePattern { .. }));

        // Consecutive trailing optionals are fine.
        assert!(parse("archive/{year?}/{month?}", &no_conditions()).is_ok());
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = parse("{id}/x/{id}", &no_conditions()).unwrap_err();
        assert!(matches!(err, Error::InvalidRoutePattern { .. }));
    }

    #[test]
    fn test_braces_inside_static_are_verbatim() {
        let segments = parse("v1.0/us{er}s", &no_conditions()).unwrap();
        assert_eq!(segments[1], Segment::Static("us{er}s".to_string()));

        // A suffixed parameter part no longer matches `{...}` and falls
        // back to a literal.
        let segments = parse("user/{id}.json", &no_conditions()).unwrap();
        assert_eq!(segments[1], Segment::Static("{id}.json".to_string()));
    }

    #[test]
    fn test_pure_function() {
        let a = parse("user/{id}/posts/{post?}", &no_conditions()).unwrap();
        let b = parse("user/{id}/posts/{post?}", &no_conditions()).unwrap();
        assert_eq!(a, b);
    }
}
