//! HTTP response building module
//!
//! Builders for every response the server sends. All of them permit
//! cross-origin reads: the service is public and read-only.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ALLOW, CACHE_CONTROL, CONTENT_LENGTH,
    CONTENT_TYPE, ETAG,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::cache::{CachePolicy, ValidationToken};

const JSON_CONTENT_TYPE: &str = "application/json";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Structured error payload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Build 200 document response with cache control
pub fn build_document_response(
    body: String,
    etag: &ValidationToken,
    cache: CachePolicy,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(body) };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .header(CACHE_CONTROL, cache.to_header_value())
        .header(ETAG, etag.as_str())
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &ValidationToken) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, etag.as_str())
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_EXPOSE_HEADERS, "ETag")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build JSON response from any serializable value
pub fn build_json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
    cache: Option<CachePolicy>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_fallback_500();
        }
    };
    let content_length = json.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(json) };

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    if let Some(policy) = cache {
        builder = builder.header(CACHE_CONTROL, policy.to_header_value());
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        build_fallback_500()
    })
}

/// Build JSON error response
pub fn build_error_response(
    status: StatusCode,
    error: &ErrorBody,
    is_head: bool,
) -> Response<Full<Bytes>> {
    build_json_response(status, error, None, is_head)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(method: &str) -> Response<Full<Bytes>> {
    let mut response = build_error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorBody::new(format!("Method not allowed: {method}")),
        false,
    );
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build OPTIONS response (CORS preflight)
pub fn build_options_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "If-None-Match, Content-Type")
        .header(ACCESS_CONTROL_MAX_AGE, "86400")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Last-resort 500 when a response cannot be built normally
fn build_fallback_500() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(
        br#"{"error":"Internal server error"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        hyper::header::HeaderValue::from_static("*"),
    );
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
