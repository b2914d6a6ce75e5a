//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, the key
//! listing route, and document resolution for every other path.

use crate::config::AppState;
use crate::content::{list_all_keys, resolve_document, Resolution, StorageKey};
use crate::http::{self, CachePolicy, ErrorBody};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, ETAG, IF_NONE_MATCH, REFERER, SERVER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let mut response = dispatch(&parts, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if state.cached_access_log.load(Ordering::Relaxed) {
        log_access(&parts, &response, peer_addr, started, &state);
    }

    Ok(response)
}

async fn dispatch(req: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    let method = &req.method;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method) {
        return resp;
    }

    // 2. Extract headers for conditional requests
    let ctx = RequestContext {
        path: req.uri.path(),
        is_head: *method == Method::HEAD,
        if_none_match: req
            .headers
            .get(IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok()),
    };

    // 3. Route by exact path
    if ctx.path == state.config.content.list_keys_path {
        serve_key_listing(&ctx, state).await
    } else {
        serve_document(&ctx, state).await
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response(method.as_str()))
        }
    }
}

/// Enumerate every stored key as a JSON array
async fn serve_key_listing(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let limits = state.config.content.enumeration_limits();

    match list_all_keys(state.store.as_ref(), limits).await {
        Ok(keys) => {
            logger::log_debug(&format!("Listed {} keys", keys.len()));
            http::build_json_response(
                StatusCode::OK,
                &keys,
                Some(CachePolicy::NoCache),
                ctx.is_head,
            )
        }
        Err(e) => {
            logger::log_error(&format!("Key enumeration failed: {e}"));
            http::build_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorBody::new("Failed to list keys").with_details(e.details()),
                ctx.is_head,
            )
        }
    }
}

/// Resolve a document and answer with 200, 304 or 404
///
/// Store faults on this path become 502: the store is an upstream the
/// server could not reach, not a missing document.
async fn serve_document(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let content = &state.config.content;

    match resolve_document(
        state.store.as_ref(),
        ctx.path,
        ctx.if_none_match,
        &content.suffix,
    )
    .await
    {
        Ok(Resolution::Found { body, etag, .. }) => http::build_document_response(
            body,
            &etag,
            CachePolicy::Public(content.max_age),
            ctx.is_head,
        ),
        Ok(Resolution::NotModified { etag, .. }) => http::build_304_response(&etag),
        Ok(Resolution::NotFound { key }) => {
            logger::log_debug(&format!("No document for key: {key}"));
            http::build_error_response(
                StatusCode::NOT_FOUND,
                &ErrorBody::new(format!("JSON not found for key: {key}")),
                ctx.is_head,
            )
        }
        Err(e) => {
            let key = StorageKey::from_path(ctx.path, &content.suffix);
            logger::log_error(&format!("Store lookup failed for key {key}: {e}"));
            http::build_error_response(
                StatusCode::BAD_GATEWAY,
                &ErrorBody::new(format!("Failed to fetch JSON for key: {key}"))
                    .with_details(e.details()),
                ctx.is_head,
            )
        }
    }
}

fn log_access(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: Option<SocketAddr>,
    started: Instant,
    state: &AppState,
) {
    let header = |name: HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry =
        AccessLogEntry::new(peer_addr, req.method.to_string(), req.uri.path().to_string());
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version)
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.etag = response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::StoreError;
    use crate::http::cache::fingerprint;
    use crate::store::{Entry, KvStore, ListOptions, ListPage, MemoryStore};
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, CACHE_CONTROL, CONTENT_TYPE,
    };

    const DOC: &str = "{\n  \"title\": \"Hello\"\n}";

    fn test_config() -> Config {
        let mut cfg = Config::load_from("definitely-not-a-config-file").unwrap();
        cfg.logging.access_log = false;
        cfg
    }

    fn create_state(store: Arc<dyn KvStore>) -> Arc<AppState> {
        Arc::new(AppState::new(&test_config(), store))
    }

    fn memory_state() -> Arc<AppState> {
        create_state(Arc::new(MemoryStore::from_pairs([
            ("hello.json", DOC),
            ("nested/deep.json", "[1,2,3]"),
        ])))
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        path: &str,
        if_none_match: Option<&str>,
    ) -> Response<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(value) = if_none_match {
            builder = builder.header(IF_NONE_MATCH, value);
        }
        let req = builder.body(()).unwrap();
        handle_request(req, Arc::clone(state), None).await.unwrap()
    }

    async fn get(state: &Arc<AppState>, path: &str) -> Response<Full<Bytes>> {
        call(state, Method::GET, path, None).await
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Store whose every call fails with the given error
    struct FailingStore {
        error: fn() -> StoreError,
    }

    #[async_trait]
    impl KvStore for FailingStore {
        async fn get_with_metadata(&self, _key: &str) -> Result<Option<Entry>, StoreError> {
            Err((self.error)())
        }

        async fn list(&self, _options: ListOptions) -> Result<ListPage, StoreError> {
            Err((self.error)())
        }
    }

    #[tokio::test]
    async fn test_document_full_response() {
        let state = memory_state();
        let response = get(&state, "/hello").await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=300");
        assert_eq!(headers[ETAG], format!("\"{}\"", fingerprint(DOC)).as_str());
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[SERVER], "jsonkv-edge");
        assert_eq!(body_string(response).await, DOC);
    }

    #[tokio::test]
    async fn test_nested_path_with_suffix() {
        let state = memory_state();
        let response = get(&state, "/nested/deep.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[1,2,3]");
    }

    #[tokio::test]
    async fn test_conditional_round_trip() {
        let state = memory_state();
        let first = get(&state, "/hello").await;
        let etag = first.headers()[ETAG].to_str().unwrap().to_string();

        let second = call(&state, Method::GET, "/hello", Some(&etag)).await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(second.headers()[ETAG], etag.as_str());
        assert_eq!(second.headers()[ACCESS_CONTROL_EXPOSE_HEADERS], "ETag");
        assert_eq!(second.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body_string(second).await, "");
    }

    #[tokio::test]
    async fn test_weak_validator_is_not_modified() {
        let state = memory_state();
        let weak = format!("W/\"{}\"", fingerprint(DOC));
        let response = call(&state, Method::GET, "/hello", Some(&weak)).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_stale_validator_gets_document() {
        let state = memory_state();
        let response = call(&state, Method::GET, "/hello", Some("\"stale\"")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, DOC);
    }

    #[tokio::test]
    async fn test_missing_document_404_body() {
        let state = memory_state();
        let response = get(&state, "/missing").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            body_string(response).await,
            r#"{"error":"JSON not found for key: missing.json"}"#
        );
    }

    #[tokio::test]
    async fn test_list_keys() {
        let state = memory_state();
        let response = get(&state, "/list-keys").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let keys: Vec<String> = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(keys, vec!["hello.json", "nested/deep.json"]);
    }

    #[tokio::test]
    async fn test_list_keys_failure_with_message() {
        let state = create_state(Arc::new(FailingStore {
            error: || StoreError::Backend("KV namespace unreachable".to_string()),
        }));
        let response = get(&state, "/list-keys").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Failed to list keys","details":"KV namespace unreachable"}"#
        );
    }

    #[tokio::test]
    async fn test_list_keys_failure_without_message() {
        let state = create_state(Arc::new(FailingStore {
            error: || StoreError::Unknown,
        }));
        let response = get(&state, "/list-keys").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Failed to list keys","details":"Unknown error"}"#
        );
    }

    #[tokio::test]
    async fn test_document_store_failure_is_502() {
        let state = create_state(Arc::new(FailingStore {
            error: || StoreError::Backend("timeout".to_string()),
        }));
        let response = get(&state, "/hello").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Failed to fetch JSON for key: hello.json","details":"timeout"}"#
        );
    }

    #[tokio::test]
    async fn test_list_route_is_exact() {
        let state = memory_state();
        let response = get(&state, "/list-keys/extra").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"JSON not found for key: list-keys/extra.json"}"#
        );
    }

    #[tokio::test]
    async fn test_head_request() {
        let state = memory_state();
        let response = call(&state, Method::HEAD, "/hello", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(ETAG));
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_options_and_disallowed_methods() {
        let state = memory_state();

        let response = call(&state, Method::OPTIONS, "/hello", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let response = call(&state, Method::PUT, "/hello", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Method not allowed: PUT"}"#
        );
    }

    #[tokio::test]
    async fn test_custom_list_route_and_max_age() {
        let mut cfg = test_config();
        cfg.content.list_keys_path = "/_keys".to_string();
        cfg.content.max_age = 60;
        let state = Arc::new(AppState::new(
            &cfg,
            Arc::new(MemoryStore::from_pairs([("hello.json", DOC)])),
        ));

        let response = get(&state, "/_keys").await;
        assert_eq!(body_string(response).await, r#"["hello.json"]"#);

        let response = get(&state, "/hello").await;
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=60");
    }
}
