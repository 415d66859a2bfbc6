//! URI template compilation and matching.
//!
//! # Responsibilities
//! - Parse `/users/{id}/orders` style patterns into literals and variables
//! - Compile them to anchored regular expressions (exact and prefix forms)
//! - Match a path, report the consumed length and extract variables
//! - Format a template back into a concrete path
//!
//! # Design Decisions
//! - Templates are immutable; changing a route's template swaps a new one in
//! - Each variable owns exactly one capturing group, inner groups never capture
//! - Prefix matches must end on a segment boundary

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::variable::Variable;

/// How much of the input a template has to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchingMode {
    /// The whole input must match.
    #[default]
    Equals,
    /// A prefix ending on a segment boundary is enough.
    StartsWith,
}

/// Outcome of a successful [`Template::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    /// Number of bytes of the input covered by the template.
    pub consumed: usize,
    /// Extracted variable values, keyed by variable name.
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

#[derive(Debug, Clone)]
enum Source {
    Uri(Vec<Segment>),
    Regex,
}

/// A compiled URI template.
#[derive(Debug, Clone)]
pub struct Template {
    pattern: String,
    mode: MatchingMode,
    source: Source,
    default_variable: Variable,
    variables: HashMap<String, Variable>,
    names: Vec<String>,
    exact: Regex,
    prefix: Regex,
}

/// Configures variables before a [`Template`] is compiled.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    pattern: String,
    mode: MatchingMode,
    default_variable: Variable,
    variables: HashMap<String, Variable>,
}

impl TemplateBuilder {
    pub fn matching_mode(mut self, mode: MatchingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Descriptor used by variables without an explicit one.
    pub fn default_variable(mut self, variable: Variable) -> Self {
        self.default_variable = variable;
        self
    }

    pub fn variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }

    pub fn build(self) -> RoutingResult<Template> {
        let segments = parse_pattern(&self.pattern)?;

        let mut body = String::with_capacity(self.pattern.len() * 2);
        let mut names = Vec::new();
        for segment in &segments {
            match segment {
                Segment::Literal(text) => body.push_str(&regex::escape(text)),
                Segment::Variable(name) => {
                    let variable = self.variables.get(name).unwrap_or(&self.default_variable);
                    body.push_str(&variable.regex());
                    names.push(name.clone());
                }
            }
        }

        let (exact, prefix) = anchored(&body)?;
        Ok(Template {
            pattern: self.pattern,
            mode: self.mode,
            source: Source::Uri(segments),
            default_variable: self.default_variable,
            variables: self.variables,
            names,
            exact,
            prefix,
        })
    }
}

impl Template {
    /// Compile a URI template in [`MatchingMode::Equals`] with URI segment variables.
    pub fn compile(pattern: &str) -> RoutingResult<Self> {
        Self::builder(pattern).build()
    }

    pub fn builder(pattern: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder {
            pattern: pattern.into(),
            mode: MatchingMode::Equals,
            default_variable: Variable::default(),
            variables: HashMap::new(),
        }
    }

    /// Compile a raw regular expression. Named capture groups become variables.
    pub fn regex(expression: &str, mode: MatchingMode) -> RoutingResult<Self> {
        let (exact, prefix) = anchored(expression)?;
        let names = exact.capture_names().flatten().map(str::to_string).collect();
        Ok(Self {
            pattern: expression.to_string(),
            mode,
            source: Source::Regex,
            default_variable: Variable::default(),
            variables: HashMap::new(),
            names,
            exact,
            prefix,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matching_mode(&self) -> MatchingMode {
        self.mode
    }

    /// Copy of this template using another matching mode.
    pub fn with_matching_mode(&self, mode: MatchingMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Variable names in pattern order.
    pub fn variable_names(&self) -> &[String] {
        &self.names
    }

    /// Descriptor of a variable, falling back to the default descriptor.
    pub fn variable(&self, name: &str) -> &Variable {
        self.variables.get(name).unwrap_or(&self.default_variable)
    }

    /// Number of bytes matched, or `None`.
    pub fn matches(&self, input: &str) -> Option<usize> {
        match self.mode {
            MatchingMode::Equals => self.exact.is_match(input).then_some(input.len()),
            MatchingMode::StartsWith => {
                let end = self.prefix.find(input)?.end();
                on_boundary(input, end).then_some(end)
            }
        }
    }

    /// Match and extract the variable values.
    pub fn parse(&self, input: &str) -> Option<TemplateMatch> {
        let captures = self.captures(input)?;
        let consumed = captures.get(0)?.end();

        let mut variables = HashMap::with_capacity(self.names.len());
        for (index, name) in self.names.iter().enumerate() {
            let group = match self.source {
                Source::Uri(_) => captures.get(index + 1),
                Source::Regex => captures.name(name),
            };
            if let Some(group) = group {
                let value = self.variable(name).decode(group.as_str());
                tracing::trace!(variable = %name, value = %value, "Template variable matched");
                variables.insert(name.clone(), value);
            }
        }

        Some(TemplateMatch { consumed, variables })
    }

    /// Substitute variables into the pattern. Unresolved variables use their
    /// default value.
    pub fn format<F>(&self, resolve: F) -> RoutingResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Source::Uri(segments) = &self.source else {
            return Err(RoutingError::NotFormattable(self.pattern.clone()));
        };

        let mut out = String::with_capacity(self.pattern.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let variable = self.variable(name);
                    let value = resolve(name).unwrap_or_else(|| variable.default_value.clone());
                    out.push_str(&variable.encode(&value));
                }
            }
        }
        Ok(out)
    }

    pub fn format_map(&self, values: &HashMap<String, String>) -> RoutingResult<String> {
        self.format(|name| values.get(name).cloned())
    }

    fn captures<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        match self.mode {
            MatchingMode::Equals => self.exact.captures(input),
            MatchingMode::StartsWith => {
                let captures = self.prefix.captures(input)?;
                let end = captures.get(0)?.end();
                on_boundary(input, end).then_some(captures)
            }
        }
    }
}

fn anchored(body: &str) -> RoutingResult<(Regex, Regex)> {
    let exact = Regex::new(&format!("^(?:{body})$"))?;
    let prefix = Regex::new(&format!("^(?:{body})"))?;
    Ok((exact, prefix))
}

/// A prefix match may not stop in the middle of a segment.
fn on_boundary(input: &str, end: usize) -> bool {
    if end == 0 || end >= input.len() || input[..end].ends_with('/') {
        return true;
    }
    matches!(input.as_bytes()[end], b'/' | b'?' | b';' | b'#')
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~')
}

fn parse_pattern(pattern: &str) -> RoutingResult<Vec<Segment>> {
    let invalid = |reason: String| RoutingError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let mut segments = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut in_variable = false;

    for ch in pattern.chars() {
        if in_variable {
            if ch == '}' {
                if buffer.is_empty() {
                    return Err(invalid("empty variable name".into()));
                }
                let name = std::mem::take(&mut buffer);
                if seen.contains(&name) {
                    return Err(RoutingError::DuplicateVariable {
                        pattern: pattern.to_string(),
                        name,
                    });
                }
                seen.push(name.clone());
                segments.push(Segment::Variable(name));
                in_variable = false;
            } else if is_name_char(ch) {
                buffer.push(ch);
            } else {
                return Err(invalid(format!("illegal character {ch:?} in variable name")));
            }
        } else if ch == '{' {
            if !buffer.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut buffer)));
            }
            in_variable = true;
        } else if ch == '}' {
            return Err(invalid("unmatched '}'".into()));
        } else {
            buffer.push(ch);
        }
    }

    if in_variable {
        return Err(invalid("unclosed '{'".into()));
    }
    if !buffer.is_empty() {
        segments.push(Segment::Literal(buffer));
    }
    Ok(segments)
}
