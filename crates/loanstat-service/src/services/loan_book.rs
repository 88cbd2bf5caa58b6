use std::sync::{PoisonError, RwLock};

use loanstat_core::error::Result;
use loanstat_core::loan::{Loan, LoanStats, NewLoan};

/// In-memory loan store backing `/api/loans` and `/api/stats`.
#[derive(Debug, Default)]
pub struct LoanBook {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: u64,
    loans: Vec<Loan>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<Loan> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        g.loans.clone()
    }

    pub fn get(&self, id: u64) -> Option<Loan> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        g.loans.iter().find(|l| l.id == id).cloned()
    }

    /// Validate and store, assigning the next id.
    pub fn insert(&self, new: NewLoan) -> Result<Loan> {
        new.validate()?;
        let mut g = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        g.last_id += 1;
        let loan = Loan {
            id: g.last_id,
            borrower: new.borrower,
            principal: new.principal,
            rate: new.rate,
        };
        g.loans.push(loan.clone());
        Ok(loan)
    }

    pub fn stats(&self) -> LoanStats {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        LoanStats::from_loans(&g.loans)
    }
}
