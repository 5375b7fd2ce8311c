//! Domain models for the query gateway.

pub mod session;

pub use session::{Session, Turn};
