//! loanstat service library entry.
//!
//! This crate wires the request instrumentation, structured logging, database
//! health probe and the loan/stat routes into one axum application. It is
//! intended to be consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod context;
pub mod db;
pub mod health;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
