//! Single HTTP entry point composing the mounted sub-applications.
//!
//! Every request passes the CORS filter, then `GET /` is answered from a
//! precomputed index and anything else is dispatched to the sub-application
//! owning the longest matching path prefix.

mod cors;
mod error;
mod log;
mod mount;

pub use cors::CorsPolicy;
pub use error::GatewayError;
pub use log::{EventLog, TracingLog};
pub use mount::{Mount, MountTable, MountTableBuilder, MountedAt, RouterApp, SubApplication};

#[cfg(test)]
pub(crate) use log::recording::RecordingLog;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, uri::PathAndQuery, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower::util::MapRequestLayer;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::infrastructure::config::GatewaySettings;

pub struct Gateway {
    mounts: MountTable,
    index: Bytes,
    log: Arc<dyn EventLog>,
}

impl Gateway {
    pub fn new(mounts: MountTable, settings: &GatewaySettings, log: Arc<dyn EventLog>) -> Self {
        let index = root_index(&mounts, settings);
        Self { mounts, index, log }
    }

    fn root(&self) -> Response {
        self.log.log(Level::INFO, "[/] Root check endpoint called.");
        (
            [(header::CONTENT_TYPE, "application/json")],
            self.index.clone(),
        )
            .into_response()
    }

    async fn forward(&self, mount: &Mount, rest: &str, request: Request) -> Response {
        let (mut parts, body) = request.into_parts();
        parts.uri = match rewrite_path(&parts.uri, rest) {
            Ok(uri) => uri,
            Err(e) => {
                self.log.log(Level::WARN, &e.to_string());
                return error_response(StatusCode::BAD_REQUEST, "Bad Request");
            }
        };
        parts.extensions.insert(MountedAt(mount.prefix().to_string()));

        match mount.app().handle(Request::from_parts(parts, body)).await {
            Ok(response) => response,
            Err(e) => {
                self.log.log(
                    Level::ERROR,
                    &format!("sub-application {} failed: {e}", mount.name()),
                );
                internal_error()
            }
        }
    }
}

/// Builds the gateway router with CORS, tracing and panic containment.
pub fn create_gateway(
    mounts: MountTable,
    cors: &CorsPolicy,
    settings: &GatewaySettings,
    log: Arc<dyn EventLog>,
) -> Result<Router, GatewayError> {
    let cors = cors.layer()?;
    let gateway = Arc::new(Gateway::new(mounts, settings, log.clone()));

    Ok(Router::new()
        .fallback(dispatch)
        .layer(CatchPanicLayer::custom(PanicResponder { log }))
        .layer(TraceLayer::new_for_http())
        .layer(MapRequestLayer::new(restore_plain_options))
        .layer(cors)
        .layer(MapRequestLayer::new(mask_plain_options))
        .with_state(gateway))
}

/// Marks an `OPTIONS` request that is not a CORS pre-flight.
#[derive(Clone, Copy)]
struct PlainOptions;

/// `CorsLayer` answers every `OPTIONS` itself. An `OPTIONS` without
/// `Access-Control-Request-Method` crosses it as `GET` so it gets forwarded
/// with simple-request CORS headers.
fn mask_plain_options(mut request: Request) -> Request {
    if request.method() == Method::OPTIONS
        && !request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    {
        *request.method_mut() = Method::GET;
        request.extensions_mut().insert(PlainOptions);
    }
    request
}

fn restore_plain_options(mut request: Request) -> Request {
    if request.extensions_mut().remove::<PlainOptions>().is_some() {
        *request.method_mut() = Method::OPTIONS;
    }
    request
}

async fn dispatch(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    let path = request.uri().path();
    if path == "/" && request.method() == Method::GET {
        return gateway.root();
    }

    let Some((mount, rest)) = gateway.mounts.resolve(path) else {
        return error_response(StatusCode::NOT_FOUND, "Not Found");
    };
    let (mount, rest) = (mount.clone(), rest.to_string());

    gateway.forward(&mount, &rest, request).await
}

/// `message` first, then one `<name>_docs` entry per mount in registration
/// order. Serialized once so every response is byte-identical.
fn root_index(mounts: &MountTable, settings: &GatewaySettings) -> Bytes {
    let mut index = serde_json::Map::new();
    index.insert("message".into(), json!(settings.message));
    for mount in mounts.iter() {
        index.insert(
            format!("{}_docs", mount.name()),
            json!(format!("{}{}", mount.prefix(), settings.docs_path)),
        );
    }
    Bytes::from(serde_json::Value::Object(index).to_string())
}

fn rewrite_path(uri: &Uri, path: &str) -> Result<Uri, GatewayError> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse::<PathAndQuery>()
            .map_err(|e| GatewayError::InvalidUri(e.to_string()))?,
    );
    Uri::from_parts(parts).map_err(|e| GatewayError::InvalidUri(e.to_string()))
}

fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[derive(Clone)]
struct PanicResponder {
    log: Arc<dyn EventLog>,
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s
        } else {
            "unknown panic payload"
        };
        self.log
            .log(Level::ERROR, &format!("request handler panicked: {detail}"));
        internal_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use async_trait::async_trait;
    use axum::http::HeaderMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:3000";
    const INDEX: &str = r#"{"message":"Unified service for RAG + Predictive Analytics","rag_docs":"/rag/docs","predictive_docs":"/predictive/docs"}"#;

    /// Reports what it received as JSON and counts calls.
    struct EchoApp {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl EchoApp {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SubApplication for EchoApp {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, request: Request) -> Result<Response, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(|e| DomainError::internal(e.to_string()))?;
            let echo = json!({
                "app": self.name,
                "method": parts.method.as_str(),
                "path": parts.uri.path_and_query().map(|pq| pq.as_str()),
                "mounted_at": parts.extensions.get::<MountedAt>().map(|m| m.0.clone()),
                "trace": parts.headers.get("x-trace").and_then(|v| v.to_str().ok()),
                "body": String::from_utf8_lossy(&body),
            });
            Ok((
                StatusCode::ACCEPTED,
                [("x-sub-app", self.name)],
                Json(echo),
            )
                .into_response())
        }
    }

    struct FailingApp;

    #[async_trait]
    impl SubApplication for FailingApp {
        fn name(&self) -> &str {
            "failing"
        }

        async fn handle(&self, _request: Request) -> Result<Response, DomainError> {
            Err(DomainError::internal("vector index offline"))
        }
    }

    struct PanickingApp;

    #[async_trait]
    impl SubApplication for PanickingApp {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn handle(&self, _request: Request) -> Result<Response, DomainError> {
            panic!("model tensor shape mismatch");
        }
    }

    struct Harness {
        router: Router,
        log: Arc<RecordingLog>,
        rag: Arc<EchoApp>,
        predictive: Arc<EchoApp>,
    }

    fn harness() -> Harness {
        let rag = EchoApp::new("rag");
        let predictive = EchoApp::new("predictive");
        let mounts = MountTable::builder()
            .mount("/rag", rag.clone())
            .mount("/predictive", predictive.clone())
            .mount("/broken", Arc::new(FailingApp))
            .mount("/explode", Arc::new(PanickingApp));
        let log = Arc::new(RecordingLog::default());
        let router = build(mounts, log.clone());
        Harness {
            router,
            log,
            rag,
            predictive,
        }
    }

    fn build(mounts: MountTableBuilder, log: Arc<RecordingLog>) -> Router {
        create_gateway(
            mounts.build().unwrap(),
            &CorsPolicy::from(&crate::infrastructure::config::CorsConfig::default()),
            &GatewaySettings::default(),
            log,
        )
        .unwrap()
    }

    async fn send(router: &Router, request: Request) -> (StatusCode, HeaderMap, Bytes) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    fn get(uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(header::ORIGIN, ORIGIN)
            .body(Body::empty())
            .unwrap()
    }

    fn json_body(body: &Bytes) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_root_returns_index() {
        let h = harness();
        let plain = build(
            MountTable::builder()
                .mount("/rag", EchoApp::new("rag"))
                .mount("/predictive", EchoApp::new("predictive")),
            Arc::new(RecordingLog::default()),
        );

        let (status, headers, body) = send(&plain, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(body, INDEX.as_bytes());

        send(&h.router, get("/")).await;
        assert_eq!(h.log.at(Level::INFO), vec!["[/] Root check endpoint called."]);
        assert_eq!(h.rag.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_root_is_idempotent() {
        let h = harness();
        let (_, _, first) = send(&h.router, get("/")).await;
        for _ in 0..5 {
            let (_, _, again) = send(&h.router, get("/")).await;
            assert_eq!(again, first);
        }
    }

    #[tokio::test]
    async fn test_rag_docs_forwarded_as_docs() {
        let docs =
            Router::new().route("/docs", axum::routing::get(|| async { "rag documentation" }));
        let router = build(
            MountTable::builder()
                .mount("/rag", Arc::new(RouterApp::new("rag", docs.clone())))
                .mount("/predictive", EchoApp::new("predictive")),
            Arc::new(RecordingLog::default()),
        );

        let direct = docs.oneshot(get("/docs")).await.unwrap();
        let direct_status = direct.status();
        let direct_body = axum::body::to_bytes(direct.into_body(), usize::MAX)
            .await
            .unwrap();

        let (status, headers, body) = send(&router, get("/rag/docs")).await;
        assert_eq!(status, direct_status);
        assert_eq!(body, direct_body);
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_prefix_stripped_and_query_kept() {
        let h = harness();
        let (status, headers, body) =
            send(&h.router, get("/predictive/api/predict?debug=1")).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(headers["x-sub-app"], "predictive");
        let echo = json_body(&body);
        assert_eq!(echo["path"], "/api/predict?debug=1");
        assert_eq!(echo["mounted_at"], "/predictive");
        assert_eq!(h.predictive.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.rag.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bare_prefix_forwards_root() {
        let h = harness();
        let (_, _, body) = send(&h.router, get("/rag")).await;
        assert_eq!(json_body(&body)["path"], "/");
    }

    #[tokio::test]
    async fn test_method_headers_and_body_forwarded() {
        let h = harness();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/rag/ask_rag")
            .header(header::ORIGIN, ORIGIN)
            .header("x-trace", "abc123")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message":"hi"}"#))
            .unwrap();

        let (_, _, body) = send(&h.router, request).await;
        let echo = json_body(&body);
        assert_eq!(echo["app"], "rag");
        assert_eq!(echo["method"], "POST");
        assert_eq!(echo["trace"], "abc123");
        assert_eq!(echo["body"], r#"{"message":"hi"}"#);
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_found() {
        let h = harness();
        for uri in ["/unknown", "/ragged", "/predictive-analytics", "/docs"] {
            let (status, headers, body) = send(&h.router, get(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(json_body(&body), json!({ "detail": "Not Found" }));
            assert_cors(&headers);
        }

        let post_root = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&h.router, post_root).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_headers_on_every_response() {
        let h = harness();
        for uri in ["/", "/rag/docs", "/nowhere", "/broken/x"] {
            let (_, headers, _) = send(&h.router, get(uri)).await;
            assert_cors(&headers);
        }

        let no_origin = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (_, headers, _) = send(&h.router, no_origin).await;
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_preflight_answered_without_forwarding() {
        let h = harness();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/rag/ask_rag")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let (status, headers, _) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
        assert_eq!(h.rag.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plain_options_is_forwarded() {
        let h = harness();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/rag/x")
            .body(Body::empty())
            .unwrap();

        let (status, headers, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json_body(&body)["method"], "OPTIONS");
        assert_eq!(json_body(&body)["path"], "/x");
        assert_cors(&headers);
        assert_eq!(h.rag.calls.load(Ordering::SeqCst), 1);

        let root = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .header(header::ORIGIN, ORIGIN)
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&h.router, root).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sub_application_error_is_generic_500() {
        let h = harness();
        let (status, headers, body) = send(&h.router, get("/broken/anything")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body), json!({ "detail": "Internal Server Error" }));
        assert!(!String::from_utf8_lossy(&body).contains("vector index"));
        assert_cors(&headers);

        let errors = h.log.at(Level::ERROR);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("failing"));
        assert!(errors[0].contains("vector index offline"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let h = harness();
        let (status, headers, body) = send(&h.router, get("/explode/now")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body), json!({ "detail": "Internal Server Error" }));
        assert_cors(&headers);
        assert!(h.log.at(Level::ERROR)[0].contains("model tensor shape mismatch"));

        // The gateway keeps serving after a panic.
        let (status, _, _) = send(&h.router, get("/")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_cors_fails_construction() {
        let policy = CorsPolicy {
            allowed_origins: vec![],
            ..CorsPolicy::from(&crate::infrastructure::config::CorsConfig::default())
        };
        let result = create_gateway(
            MountTable::builder().build().unwrap(),
            &policy,
            &GatewaySettings::default(),
            Arc::new(RecordingLog::default()),
        );
        assert!(matches!(result, Err(GatewayError::InvalidCors(_))));
    }
}
