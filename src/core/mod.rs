//! Core business logic - framework-agnostic billing-cycle reconciliation.
//!
//! Parsing, validation and calendar math are pure functions; the stateful
//! operations hang off [`engine::BillingEngine`], which is wired to storage,
//! notifications and time through traits so it can run against any transport.

pub mod claim;
pub mod due_date;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod overlap;
pub mod period;
pub mod reminder;
