//! Leave-request lifecycle and balance-reservation core.
//!
//! The crate is the transactional heart of an HR leave system: a strict
//! request state machine (submit, return, resubmit, approve, cancel), a
//! per-employee-per-year entitlement ledger mutated only inside those
//! transitions, a weekend/holiday-aware span calculator, and the yearly
//! provisioner that creates ledger rows. Persistence is behind the
//! [`store::LeaveStore`] trait with a Postgres implementation as the system
//! of record and an in-memory implementation for tests.

pub mod cache;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod files;
pub mod models;
pub mod notify;
pub mod overlap;
pub mod policy;
pub mod provision;
pub mod service;
pub mod span;
pub mod store;

pub use calendar::BusinessCalendar;
pub use config::{LeaveRules, Settings};
pub use error::{ErrorKind, LeaveError, LeaveResult};
pub use service::{
    BalanceSnapshot, EditLeave, LeaveCounts, LeaveReceipt, LeaveService, RequestDetails,
    ResubmitLeave, SubmitLeave,
};
pub use store::{LeaveStore, MemoryStore, PgStore};
