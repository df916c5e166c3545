#![warn(clippy::all, missing_docs)]

//! Core ledger logic for the tablebank board-game bank.
//!
//! This crate hosts the player registry, the selection state machine,
//! the transaction engine and the single-step history used by the
//! terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod registry;
pub mod selection;
pub mod session;
pub mod transaction;

pub use config::AppConfig;
pub use error::{ConfigError, TransactionError};
pub use history::{History, TransactionRecord};
pub use models::{Player, PlayerId};
pub use registry::Registry;
pub use selection::{Selection, SelectionMode};
pub use session::{Action, Outcome, Session};
pub use transaction::{AppliedTransaction, TransactionKind, TransactionRequest};
