//! Error types for docbench
//!
//! This module defines the various error types that can occur
//! while driving the document store.

use thiserror::Error;

/// Errors that can occur during a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("Unexpected document shape: {0}")]
    Bson(#[from] bson::document::ValueAccessError),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Prompt error: {0}")]
    Prompt(#[from] rustyline::error::ReadlineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;
