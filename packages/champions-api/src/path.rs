//! Route templates compiled into path matchers.
//!
//! A template such as `/champions/:id` holds literal text and `:name`
//! markers (`name` is one or more ASCII letters). Each marker matches one
//! or more characters other than `/`. The whole path must match, and an
//! optional `?query` suffix is captured separately.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathMatch {
    /// Parameter name to its (percent-decoded) value
    pub params: HashMap<String, String>,
    /// Raw text after `?`, when the target had one
    pub query: Option<String>,
}

/// A compiled route template.
pub struct RoutePath {
    template: String,
    params: Vec<String>,
    matcher: matchit::Router<()>,
}

impl RoutePath {
    /// Compiles `template`.
    pub fn compile(template: &str) -> Result<Self, matchit::InsertError> {
        let (pattern, params) = translate(template);
        let mut matcher = matchit::Router::new();
        matcher.insert(pattern, ())?;
        Ok(Self {
            template: template.to_string(),
            params,
            matcher,
        })
    }

    /// The template this path was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Matches a request target (path plus optional `?query`).
    pub fn matches(&self, target: &str) -> Option<PathMatch> {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };

        let matched = self.matcher.at(path).ok()?;
        let mut params = HashMap::with_capacity(self.params.len());
        for (name, value) in matched.params.iter() {
            if value.is_empty() {
                return None;
            }
            params.insert(name.to_string(), decode_component(value));
        }

        Some(PathMatch { params, query })
    }
}

impl std::fmt::Debug for RoutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutePath")
            .field("template", &self.template)
            .field("params", &self.params)
            .finish()
    }
}

/// Percent-decodes a path component, replacing invalid UTF-8.
pub fn decode_component(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Rewrites `:name` markers into matchit's `{name}` syntax and escapes
/// literal braces.
fn translate(template: &str) -> (String, Vec<String>) {
    let mut pattern = String::with_capacity(template.len() + 8);
    let mut params = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek().is_some_and(char::is_ascii_alphabetic) => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_alphabetic() {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                pattern.push('{');
                pattern.push_str(&name);
                pattern.push('}');
                params.push(name);
            }
            '{' => pattern.push_str("{{"),
            '}' => pattern.push_str("}}"),
            other => pattern.push(other),
        }
    }

    (pattern, params)
}
