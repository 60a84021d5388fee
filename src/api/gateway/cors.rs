use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use super::error::GatewayError;
use crate::infrastructure::config::CorsConfig;

const WILDCARD: &str = "*";

/// Cross-origin policy applied to every gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl From<&CorsConfig> for CorsPolicy {
    fn from(config: &CorsConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            allow_credentials: config.allow_credentials,
            allowed_methods: config.allowed_methods.clone(),
            allowed_headers: config.allowed_headers.clone(),
        }
    }
}

impl CorsPolicy {
    /// Builds the tower-http layer.
    ///
    /// A browser ignores a literal `*` on credentialed requests, so wildcards
    /// are mirrored from the request when credentials are allowed. A single
    /// origin is always emitted; several origins are matched per request.
    pub fn layer(&self) -> Result<CorsLayer, GatewayError> {
        Ok(CorsLayer::new()
            .allow_origin(self.origin()?)
            .allow_methods(self.methods()?)
            .allow_headers(self.headers()?)
            .allow_credentials(self.allow_credentials))
    }

    fn origin(&self) -> Result<AllowOrigin, GatewayError> {
        if is_wildcard(&self.allowed_origins) {
            return Ok(if self.allow_credentials {
                AllowOrigin::mirror_request()
            } else {
                AllowOrigin::any()
            });
        }

        let mut origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim_end_matches('/'))
                    .map_err(|_| GatewayError::InvalidCors(format!("invalid origin {origin:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match origins.len() {
            0 => Err(GatewayError::InvalidCors(
                "at least one allowed origin is required".to_string(),
            )),
            1 => Ok(AllowOrigin::exact(origins.remove(0))),
            _ => Ok(AllowOrigin::list(origins)),
        }
    }

    fn methods(&self) -> Result<AllowMethods, GatewayError> {
        if is_wildcard(&self.allowed_methods) {
            return Ok(if self.allow_credentials {
                AllowMethods::mirror_request()
            } else {
                AllowMethods::any()
            });
        }

        let methods = self
            .allowed_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| GatewayError::InvalidCors(format!("invalid method {m:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AllowMethods::list(methods))
    }

    fn headers(&self) -> Result<AllowHeaders, GatewayError> {
        if is_wildcard(&self.allowed_headers) {
            return Ok(if self.allow_credentials {
                AllowHeaders::mirror_request()
            } else {
                AllowHeaders::any()
            });
        }

        let headers = self
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.trim().as_bytes())
                    .map_err(|_| GatewayError::InvalidCors(format!("invalid header {h:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AllowHeaders::list(headers))
    }
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == WILDCARD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn policy(origins: &[&str]) -> CorsPolicy {
        CorsPolicy {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            ..CorsPolicy::from(&CorsConfig::default())
        }
    }

    async fn allow_origin_for(policy: &CorsPolicy, origin: &str) -> Option<String> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(policy.layer().unwrap());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_default_policy_builds() {
        let policy = CorsPolicy::from(&CorsConfig::default());
        assert_eq!(policy.allowed_origins, vec!["http://localhost:3000"]);
        assert!(policy.layer().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            policy(&[]).layer(),
            Err(GatewayError::InvalidCors(_))
        ));
        assert!(policy(&["http://bad\norigin"]).layer().is_err());

        let mut bad_method = policy(&["http://localhost:3000"]);
        bad_method.allowed_methods = vec!["GE T".to_string()];
        assert!(bad_method.layer().is_err());

        let mut bad_header = policy(&["http://localhost:3000"]);
        bad_header.allowed_headers = vec!["x header".to_string()];
        assert!(bad_header.layer().is_err());
    }

    #[tokio::test]
    async fn test_origin_list_matches_per_request() {
        let policy = policy(&["http://localhost:3000", "http://127.0.0.1:3000"]);
        assert_eq!(
            allow_origin_for(&policy, "http://127.0.0.1:3000").await,
            Some("http://127.0.0.1:3000".to_string())
        );
        assert_eq!(allow_origin_for(&policy, "http://evil.example").await, None);
    }

    #[tokio::test]
    async fn test_wildcard_origin_with_credentials_mirrors() {
        let policy = policy(&["*"]);
        assert_eq!(
            allow_origin_for(&policy, "http://any.example").await,
            Some("http://any.example".to_string())
        );
    }

    #[tokio::test]
    async fn test_explicit_method_list() {
        let mut policy = policy(&["http://localhost:3000"]);
        policy.allowed_methods = vec!["get".to_string(), "POST".to_string()];
        policy.allow_credentials = false;
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(policy.layer().unwrap());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let methods = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(methods, "GET,POST");
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .is_none());
    }
}
