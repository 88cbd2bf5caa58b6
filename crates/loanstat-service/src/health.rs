//! Database liveness probe.
//!
//! Each [`HealthProbe::check`] opens its own session, runs one query and drops
//! the session before returning, whatever the outcome. Failures are folded
//! into the returned [`HealthVerdict`]; nothing is retried or cached.

use std::sync::Arc;

use serde_json::{json, Value};

use loanstat_core::error::Result;

use crate::db::Database;
use crate::obs::metrics::{MetricRegistry, DB_UP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthVerdict {
    pub status: HealthStatus,
    /// `"connected"` or `"disconnected"`.
    pub db: &'static str,
    pub error: Option<String>,
}

impl HealthVerdict {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            db: "connected",
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            db: "disconnected",
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Wire body for `/health`: `db` on success, `error` on failure.
    pub fn to_json(&self) -> Value {
        match &self.error {
            None => json!({ "status": self.status.as_str(), "db": self.db }),
            Some(e) => json!({ "status": self.status.as_str(), "error": e }),
        }
    }
}

pub struct HealthProbe {
    db: Arc<dyn Database>,
    metrics: Arc<MetricRegistry>,
}

impl HealthProbe {
    pub fn new(db: Arc<dyn Database>, metrics: Arc<MetricRegistry>) -> Self {
        Self { db, metrics }
    }

    pub async fn check(&self) -> HealthVerdict {
        let verdict = match self.probe_once().await {
            Ok(()) => HealthVerdict::healthy(),
            Err(e) => {
                tracing::warn!(error = %e, "database health probe failed");
                HealthVerdict::unhealthy(e.to_string())
            }
        };

        let up = i64::from(verdict.is_healthy());
        if let Err(e) = self.metrics.set_gauge(DB_UP, &[], up) {
            tracing::warn!(error = %e, "dropping db_up sample");
        }
        verdict
    }

    async fn probe_once(&self) -> Result<()> {
        let mut session = self.db.open_session().await?;
        session.execute_probe().await
    }
}
