pub mod health;
pub mod query;
pub mod session;

pub use health::{HealthResponse, HealthStatus, ServiceInfo};
pub use query::{QueryRequest, QueryResponse};
pub use session::{CreateSessionParams, SessionCreatedResponse, SessionResponse};
