use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};

use loanstat_core::error::{LoanstatError, Result};

use super::{Database, Session};
use crate::config::DatabaseSection;

/// Postgres-backed [`Database`] on a lazily connecting pool.
///
/// The pool never connects at startup, so the service boots while the
/// database is down and reports it through `/health`. Probe latency is bounded
/// by `acquire_timeout_ms`.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn connect_lazy(cfg: &DatabaseSection) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_millis(cfg.acquire_timeout_ms))
            .connect_lazy(&cfg.url)
            .map_err(|e| LoanstatError::BadRequest(format!("invalid database url: {e}")))?;
        Ok(Self { pool })
    }
}

/// Pooled connection; returned to the pool on drop.
struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Session for PgSession {
    async fn execute_probe(&mut self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(|e| LoanstatError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| LoanstatError::Unavailable(e.to_string()))?;
        Ok(Box::new(PgSession { conn }))
    }
}
