//! Response produced by routers and handlers.
//!
//! The router only ever touches the status (404 when nothing matches, 400 when
//! attribute validation fails). Entities and headers belong to handlers.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    entity: Option<String>,
    media_type: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// An empty `200 OK` response.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            entity: None,
            media_type: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Value of the `Location` header, if set.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn set_location(&mut self, location: HeaderValue) {
        self.headers.insert(header::LOCATION, location);
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn set_entity(&mut self, entity: impl Into<String>, media_type: Option<&str>) {
        self.entity = Some(entity.into());
        self.media_type = media_type.map(str::to_string);
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status, self.headers, self.entity.unwrap_or_default()).into_response();
        if let Some(value) = self
            .media_type
            .as_deref()
            .and_then(|media_type| HeaderValue::from_str(media_type).ok())
        {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
    }
}
