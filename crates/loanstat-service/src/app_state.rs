//! Shared application state for the loanstat service.
//!
//! Built once at startup. The metrics registry lives here (not in a global)
//! so tests can build a fresh one per run.

use std::sync::Arc;

use crate::db::Database;
use crate::health::HealthProbe;
use crate::obs::metrics::MetricRegistry;
use crate::services::LoanBook;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    metrics: Arc<MetricRegistry>,
    probe: Arc<HealthProbe>,
}

struct AppStateInner {
    loans: LoanBook,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        let metrics = Arc::new(MetricRegistry::new());
        let probe = Arc::new(HealthProbe::new(db, Arc::clone(&metrics)));

        Self {
            inner: Arc::new(AppStateInner { loans: LoanBook::new() }),
            metrics,
            probe,
        }
    }

    pub fn loans(&self) -> &LoanBook {
        &self.inner.loans
    }

    pub fn metrics(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.metrics)
    }

    pub fn probe(&self) -> Arc<HealthProbe> {
        Arc::clone(&self.probe)
    }
}
