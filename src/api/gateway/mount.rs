use async_trait::async_trait;
use axum::{extract::Request, response::Response, Router};
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use tower::ServiceExt;

use super::error::GatewayError;
use crate::domain::DomainError;

/// An independently built HTTP application served under a path prefix.
///
/// The gateway hands over the request with the prefix already stripped and
/// returns whatever response comes back. An `Err` is reported to the client
/// as a generic server error.
#[async_trait]
pub trait SubApplication: Send + Sync {
    fn name(&self) -> &str;
    async fn handle(&self, request: Request) -> Result<Response, DomainError>;
}

/// Request extension carrying the prefix a request was dispatched under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedAt(pub String);

/// Adapts an axum [`Router`] to [`SubApplication`].
pub struct RouterApp {
    name: String,
    router: Router,
}

impl RouterApp {
    pub fn new(name: impl Into<String>, router: Router) -> Self {
        Self {
            name: name.into(),
            router,
        }
    }
}

#[async_trait]
impl SubApplication for RouterApp {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, request: Request) -> Result<Response, DomainError> {
        let result: Result<Response, Infallible> = self.router.clone().oneshot(request).await;
        match result {
            Ok(response) => Ok(response),
            Err(never) => match never {},
        }
    }
}

#[derive(Clone)]
pub struct Mount {
    prefix: String,
    app: Arc<dyn SubApplication>,
}

impl Mount {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self) -> &str {
        self.app.name()
    }

    pub fn app(&self) -> &Arc<dyn SubApplication> {
        &self.app
    }

    /// Remainder of `path` below this prefix, or `None` when the prefix does
    /// not match on a segment boundary.
    fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Immutable prefix → application table, kept in registration order.
pub struct MountTable {
    mounts: Vec<Mount>,
}

impl MountTable {
    pub fn builder() -> MountTableBuilder {
        MountTableBuilder::default()
    }

    /// Longest registered prefix matching `path`, with the stripped remainder.
    pub fn resolve<'p>(&self, path: &'p str) -> Option<(&Mount, &'p str)> {
        self.mounts
            .iter()
            .filter_map(|mount| mount.strip(path).map(|rest| (mount, rest)))
            .max_by_key(|(mount, _)| mount.prefix.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter()
    }
}

#[derive(Default)]
pub struct MountTableBuilder {
    mounts: Vec<Mount>,
}

impl MountTableBuilder {
    pub fn mount(mut self, prefix: impl Into<String>, app: Arc<dyn SubApplication>) -> Self {
        self.mounts.push(Mount {
            prefix: prefix.into(),
            app,
        });
        self
    }

    pub fn build(self) -> Result<MountTable, GatewayError> {
        let mut prefixes = HashSet::new();
        let mut names = HashSet::new();

        for mount in &self.mounts {
            validate_prefix(&mount.prefix)?;
            if !prefixes.insert(mount.prefix.as_str()) {
                return Err(GatewayError::DuplicatePrefix(mount.prefix.clone()));
            }
            if !names.insert(mount.name()) {
                return Err(GatewayError::DuplicateName(mount.name().to_string()));
            }
        }

        Ok(MountTable {
            mounts: self.mounts,
        })
    }
}

fn validate_prefix(prefix: &str) -> Result<(), GatewayError> {
    let invalid = |reason| {
        Err(GatewayError::InvalidPrefix {
            prefix: prefix.to_string(),
            reason,
        })
    };

    if !prefix.starts_with('/') {
        return invalid("must start with '/'");
    }
    if prefix == "/" {
        return invalid("the root path is served by the gateway");
    }
    if prefix.ends_with('/') {
        return invalid("must not end with '/'");
    }
    if prefix.contains("//") {
        return invalid("must not contain empty segments");
    }
    if prefix.contains(['?', '#', '*', '{', '}']) || prefix.chars().any(char::is_whitespace) {
        return invalid("must be a literal path");
    }
    Ok(())
}
