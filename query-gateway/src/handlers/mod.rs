pub mod health;
pub mod metrics;
pub mod query;
pub mod session;

pub use health::{health_check, readiness_check, root};
pub use query::submit_query;
pub use session::{create_session, get_session};
