//! Loan ledger for a small lending library.
//!
//! The crate keeps the lifecycle of loans consistent across concurrent
//! callers: a book has at most one open loan, every loan references an
//! existing user and book, and a book's availability follows its loans.
//!
//! - [`domain`]: aggregates and pure functions
//! - [`ports`]: storage traits the services depend on
//! - [`application`]: service functions taking explicit [`ServiceDependencies`]
//! - [`adapters`]: PostgreSQL and in-memory storage
//!
//! [`ServiceDependencies`]: application::ServiceDependencies

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
