pub mod knowledge;
pub mod metrics;
pub mod providers;
pub mod query;
pub mod rag;
pub mod session_store;

pub use knowledge::KnowledgeBase;
pub use query::QueryService;
pub use rag::{KnowledgeRagAdapter, RagAdapter};
pub use session_store::{InMemorySessionStore, SessionStore};
