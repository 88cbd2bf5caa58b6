//! Database access as seen by the service.
//!
//! Only one capability is required here: open a session and run a liveness
//! query on it. Dropping a session releases it.

pub mod postgres;

use async_trait::async_trait;

use loanstat_core::error::Result;

pub use postgres::PgDatabase;

/// A live session against the database.
#[async_trait]
pub trait Session: Send {
    /// Run the cheapest query that proves the session works.
    async fn execute_probe(&mut self) -> Result<()>;
}

/// Source of sessions.
#[async_trait]
pub trait Database: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn Session>>;
}
