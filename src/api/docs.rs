use axum::{extract::Request, response::Html, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::gateway::MountedAt;

/// Static description of a sub-application's HTTP surface.
pub struct ApiDocs {
    pub title: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    /// OpenAPI `paths` object.
    pub paths: Value,
}

impl ApiDocs {
    pub fn openapi(&self) -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {
                "title": self.title,
                "description": self.description,
                "version": self.version,
            },
            "paths": self.paths,
        })
    }

    /// HTML overview; links are prefixed with the mount point when served
    /// behind the gateway.
    pub fn page(&self, mounted_at: Option<&str>) -> String {
        let prefix = mounted_at.unwrap_or("");
        let mut rows = String::new();
        if let Some(paths) = self.paths.as_object() {
            for (path, operations) in paths {
                let Some(operations) = operations.as_object() else {
                    continue;
                };
                for (method, operation) in operations {
                    let summary = operation["summary"].as_str().unwrap_or("");
                    rows.push_str(&format!(
                        "<tr><td><code>{}</code></td><td><code>{prefix}{path}</code></td><td>{summary}</td></tr>\n",
                        method.to_uppercase()
                    ));
                }
            }
        }

        format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
             <body>\n<h1>{title} <small>{version}</small></h1>\n<p>{description}</p>\n\
             <table>\n<tr><th>Method</th><th>Path</th><th>Summary</th></tr>\n{rows}</table>\n\
             <p><a href=\"{prefix}/openapi.json\">openapi.json</a></p>\n</body></html>\n",
            title = self.title,
            version = self.version,
            description = self.description,
        )
    }
}

/// `GET /docs` and `GET /openapi.json` for a sub-application.
pub fn router(docs: Arc<ApiDocs>) -> Router {
    let document = docs.openapi();
    Router::new()
        .route("/openapi.json", get(move || async move { Json(document) }))
        .route(
            "/docs",
            get(move |request: Request| async move {
                let mounted_at = request.extensions().get::<MountedAt>().map(|m| m.0.as_str());
                Html(docs.page(mounted_at))
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use tower::ServiceExt;

    fn docs() -> Arc<ApiDocs> {
        Arc::new(ApiDocs {
            title: "Test API",
            description: "For tests",
            version: "0.0.1",
            paths: json!({ "/ping": { "get": { "summary": "Ping" } } }),
        })
    }

    #[test]
    fn test_page_lists_operations_with_prefix() {
        let page = docs().page(Some("/rag"));
        assert!(page.contains("<code>GET</code>"));
        assert!(page.contains("<code>/rag/ping</code>"));
        assert!(page.contains("href=\"/rag/openapi.json\""));

        let bare = docs().page(None);
        assert!(bare.contains("href=\"/openapi.json\""));
    }

    #[tokio::test]
    async fn test_openapi_route() {
        let response = router(docs())
            .oneshot(
                axum::http::Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let document: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(document["info"]["title"], "Test API");
        assert!(document["paths"]["/ping"].is_object());
    }

    #[tokio::test]
    async fn test_docs_route_uses_mount_extension() {
        let mut request = axum::http::Request::builder()
            .uri("/docs")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(MountedAt("/predictive".to_string()));

        let response = router(docs()).oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/predictive/openapi.json"));
    }
}
