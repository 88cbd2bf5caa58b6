//! Loan records and portfolio aggregates.
//!
//! These are plain data types; storage lives in the service crate.

use serde::{Deserialize, Serialize};

use crate::error::{LoanstatError, Result};

/// A stored loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Identifier assigned on insert (1-based, monotonic).
    pub id: u64,
    pub borrower: String,
    /// Principal in minor currency units.
    pub principal: u64,
    /// Annual interest rate, percent.
    pub rate: f64,
}

/// Inbound payload for creating a loan.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewLoan {
    pub borrower: String,
    pub principal: u64,
    pub rate: f64,
}

impl NewLoan {
    pub fn validate(&self) -> Result<()> {
        if self.borrower.trim().is_empty() {
            return Err(LoanstatError::BadRequest("borrower must not be empty".into()));
        }
        if self.principal == 0 {
            return Err(LoanstatError::BadRequest("principal must be greater than 0".into()));
        }
        if !(0.0..=100.0).contains(&self.rate) {
            return Err(LoanstatError::BadRequest("rate must be between 0 and 100".into()));
        }
        Ok(())
    }
}

/// Aggregate view over every stored loan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoanStats {
    pub total_loans: usize,
    pub total_principal: u64,
    pub average_principal: f64,
    pub average_rate: f64,
}

impl LoanStats {
    /// Aggregate a slice of loans. An empty slice yields all-zero stats.
    pub fn from_loans(loans: &[Loan]) -> Self {
        if loans.is_empty() {
            return Self::default();
        }
        let n = loans.len();
        let total_principal = loans.iter().map(|l| l.principal).fold(0u64, u64::saturating_add);
        let rate_sum: f64 = loans.iter().map(|l| l.rate).sum();
        Self {
            total_loans: n,
            total_principal,
            average_principal: total_principal as f64 / n as f64,
            average_rate: rate_sum / n as f64,
        }
    }
}
