use crate::domain::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid mount prefix {prefix:?}: {reason}")]
    InvalidPrefix {
        prefix: String,
        reason: &'static str,
    },

    #[error("mount prefix {0} is registered more than once")]
    DuplicatePrefix(String),

    #[error("sub-application name {0} is registered more than once")]
    DuplicateName(String),

    #[error("invalid CORS configuration: {0}")]
    InvalidCors(String),

    #[error("sub-application {name} failed to start: {source}")]
    Startup {
        name: String,
        #[source]
        source: DomainError,
    },

    #[error("cannot rewrite request uri: {0}")]
    InvalidUri(String),
}

impl GatewayError {
    pub fn startup(name: impl Into<String>, source: DomainError) -> Self {
        Self::Startup {
            name: name.into(),
            source,
        }
    }
}
