//! Routing view of an incoming request.
//!
//! # Responsibilities
//! - Split the request target into path and raw query
//! - Track the base reference: the part of the path consumed by routers so far
//! - Carry the attribute map written by templates and query extracts
//!
//! # Design Decisions
//! - The base path is always a prefix of the path; only routes advance it
//! - Attributes hold text values; typed data goes in `extensions`

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use axum::body::Bytes;
use axum::http::{request::Parts, Extensions, HeaderMap, Method};
use serde::Serialize;

/// A value stored in the request attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// The text value, or the first element of a list.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::List(values) => values.first().map(String::as_str),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::List(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::List(values)
    }
}

/// A request as seen by routers and handlers.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    entity: Option<Bytes>,
    base_path: String,
    attributes: HashMap<String, AttributeValue>,
    extensions: Extensions,
}

impl Request {
    /// Build a request from a method and a target such as `/users/42?full=true`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            entity: None,
            base_path: String::new(),
            attributes: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Convert an HTTP request head and its buffered body.
    pub fn from_parts(parts: Parts, entity: Bytes) -> Self {
        let mut request = Self::new(parts.method, parts.uri.path());
        request.query = parts.uri.query().map(str::to_string);
        request.headers = parts.headers;
        request.extensions = parts.extensions;
        if !entity.is_empty() {
            request.entity = Some(entity);
        }
        request
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Decoded query parameters in order of appearance.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.query {
            Some(query) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn entity(&self) -> Option<&Bytes> {
        self.entity.as_ref()
    }

    pub fn set_entity(&mut self, entity: impl Into<Bytes>) {
        self.entity = Some(entity.into());
    }

    /// The part of the path already consumed by routing.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The part of the path left for the next router.
    pub fn remaining_path(&self) -> &str {
        &self.path[self.base_path.len()..]
    }

    /// Remaining path, followed by `?query` when requested and present.
    pub fn remaining_part(&self, with_query: bool) -> Cow<'_, str> {
        match (&self.query, with_query) {
            (Some(query), true) => Cow::Owned(format!("{}?{}", self.remaining_path(), query)),
            _ => Cow::Borrowed(self.remaining_path()),
        }
    }

    /// Move `consumed` bytes of the remaining path into the base path.
    /// Bytes beyond the path (a matched query string) are ignored.
    pub fn advance_base(&mut self, consumed: usize) {
        let start = self.base_path.len();
        let mut end = (start + consumed).min(self.path.len());
        while !self.path.is_char_boundary(end) {
            end -= 1;
        }
        self.base_path.push_str(&self.path[start..end]);
    }

    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut HashMap<String, AttributeValue> {
        &mut self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}
