//! Business collaborators behind the `/api` routes.

pub mod loan_book;

pub use loan_book::LoanBook;
