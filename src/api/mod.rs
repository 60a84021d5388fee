pub mod docs;
pub mod error;
pub mod gateway;
pub mod predictive;
pub mod rag;

pub use error::ApiError;
pub use gateway::{create_gateway, CorsPolicy, EventLog, GatewayError, MountTable, TracingLog};
