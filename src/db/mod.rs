pub mod models;
pub mod queries;

pub use models::{Message, MessageSubmission, NewMessage, Session};
pub use queries::{init_db, DbPool, MessageRepo, SessionRepo};

#[cfg(test)]
pub use queries::setup_test_db;
