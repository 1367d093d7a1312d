//! Path template parsing and matching.
//!
//! # Responsibilities
//! - Normalize paths to a canonical `/`-prefixed, untrailed form
//! - Compile `{name}` templates into anchored regular expressions
//! - Extract placeholder values from matched request paths
//!
//! # Design Decisions
//! - Matching is case-insensitive end to end (templates and request paths)
//! - A placeholder captures exactly one segment: `[^/]+`, never across `/`
//! - Literal template text is regex-escaped, so `.` and friends stay literal
//! - Invalid templates fail at compile time, not at request time

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Canonical form of a path: exactly one leading `/`, no trailing slashes.
///
/// `""`, `"users"`, `"/users"` and `"/users/"` all normalize to the same
/// string, so registration and lookup agree on slash placement.
pub fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push('/');
    normalized.push_str(trimmed);
    normalized
}

/// Error produced when a path template cannot be compiled.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("unclosed '{{' in path template `{template}`")]
    UnclosedBrace { template: String },
    #[error("invalid placeholder name `{name}` in path template `{template}`")]
    InvalidPlaceholder { template: String, name: String },
    #[error("duplicate placeholder `{name}` in path template `{template}`")]
    DuplicatePlaceholder { template: String, name: String },
    #[error("failed to compile path template `{template}`: {source}")]
    Regex {
        template: String,
        source: regex::Error,
    },
}

/// A compiled path template such as `/runtime/{id}/versions`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    path: String,
    regex: Regex,
    placeholders: Vec<String>,
}

impl PathTemplate {
    /// Compile a template. The input is normalized first, so `users/{id}/`
    /// and `/users/{id}` produce the same template.
    pub fn compile(raw: &str) -> Result<Self, TemplateError> {
        let path = normalize_path(raw);
        let mut pattern = String::with_capacity(path.len() + 16);
        pattern.push('^');
        let mut placeholders: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = path.chars();
        while let Some(ch) = chars.next() {
            if ch != '{' {
                // Stray '}' is literal text, same as any other character.
                literal.push(ch);
                continue;
            }
            pattern.push_str(&regex::escape(&literal));
            literal.clear();
            let mut name = String::new();
            let mut closed = false;
            for inner in chars.by_ref() {
                if inner == '}' {
                    closed = true;
                    break;
                }
                name.push(inner);
            }
            if !closed {
                return Err(TemplateError::UnclosedBrace { template: path });
            }
            if !is_valid_placeholder(&name) {
                return Err(TemplateError::InvalidPlaceholder {
                    template: path,
                    name,
                });
            }
            if placeholders.iter().any(|existing| existing == &name) {
                return Err(TemplateError::DuplicatePlaceholder {
                    template: path,
                    name,
                });
            }
            pattern.push_str("(?P<");
            pattern.push_str(&name);
            pattern.push_str(">[^/]+)");
            placeholders.push(name);
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| TemplateError::Regex {
                template: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            regex,
            placeholders,
        })
    }

    /// The normalized template text.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Placeholder names in declaration order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Match a path already run through [`normalize_path`].
    ///
    /// Returns the placeholder values in declaration order, or `None` when
    /// the path does not match.
    pub fn match_path(&self, normalized: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(normalized)?;
        let params = self
            .placeholders
            .iter()
            .map(|name| {
                let value = captures
                    .name(name)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        Some(params)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Placeholder names follow identifier rules so they map cleanly to regex
/// capture groups and JSON object keys.
fn is_valid_placeholder(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path("/users"), "/users");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("//users//"), "/users");
    }

    #[test]
    fn test_literal_match_is_case_insensitive() {
        let template = PathTemplate::compile("/runtime/status").unwrap();
        assert!(template.match_path("/runtime/status").is_some());
        assert!(template.match_path("/RUNTIME/Status").is_some());
        assert!(template.match_path("/runtime/other").is_none());
    }

    #[test]
    fn test_placeholder_extraction() {
        let template = PathTemplate::compile("/runtime/{id}/versions").unwrap();
        let params = template.match_path("/runtime/node-18/versions").unwrap();
        assert_eq!(params, vec![("id".to_string(), "node-18".to_string())]);
    }

    #[test]
    fn test_placeholder_does_not_span_segments() {
        let template = PathTemplate::compile("/runtime/{id}").unwrap();
        assert!(template.match_path("/runtime/a/b").is_none());
        assert!(template.match_path("/runtime/").is_none());
    }

    #[test]
    fn test_multiple_placeholders() {
        let template = PathTemplate::compile("/orgs/{org}/repos/{repo}").unwrap();
        assert_eq!(template.placeholders(), ["org", "repo"]);
        let params = template.match_path("/orgs/acme/repos/widget").unwrap();
        assert_eq!(
            params,
            vec![
                ("org".to_string(), "acme".to_string()),
                ("repo".to_string(), "widget".to_string()),
            ]
        );
    }

    #[test]
    fn test_literal_dots_are_escaped() {
        let template = PathTemplate::compile("/v1.0/status").unwrap();
        assert!(template.match_path("/v1.0/status").is_some());
        assert!(template.match_path("/v1x0/status").is_none());
    }

    #[test]
    fn test_unclosed_brace_is_rejected() {
        let err = PathTemplate::compile("/runtime/{id").unwrap_err();
        assert!(matches!(err, TemplateError::UnclosedBrace { .. }));
    }

    #[test]
    fn test_invalid_placeholder_name_is_rejected() {
        let err = PathTemplate::compile("/runtime/{bad-name}").unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPlaceholder { .. }));
    }

    #[test]
    fn test_duplicate_placeholder_is_rejected() {
        let err = PathTemplate::compile("/pairs/{id}/{id}").unwrap_err();
        assert!(matches!(err, TemplateError::DuplicatePlaceholder { .. }));
    }

    #[test]
    fn test_stray_closing_brace_is_literal() {
        let template = PathTemplate::compile("/odd}/path").unwrap();
        assert!(template.match_path("/odd}/path").is_some());
        assert!(template.match_path("/odd/path").is_none());
    }

    #[test]
    fn test_template_normalizes_before_compiling() {
        let template = PathTemplate::compile("users/{id}/").unwrap();
        assert_eq!(template.path(), "/users/{id}");
        assert!(template.match_path("/users/42").is_some());
    }
}
