#![allow(missing_docs)]

//! Error types surfaced by the ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Reasons a pending transaction is not ready to be applied.
///
/// None of these are fatal: the submit is simply inert and the
/// registry, history and selection stay untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("no amount entered")]
    EmptyAmount,
    #[error("\"{0}\" is not a whole number")]
    InvalidAmount(String),
    #[error("no source player selected")]
    MissingSource,
    #[error("no target players selected")]
    MissingTargets,
    #[error("no player selected")]
    MissingOperand,
}

/// Failures while loading or bootstrapping the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("failed to write default configuration to {path}: {source}")]
    WriteDefault {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}
