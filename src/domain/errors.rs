//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. The recovery parser never
//! produces one; it degrades to a fallback value instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("AI request failed: {0}")]
    Ai(String),

    #[error("Repository error: {0}")]
    Repo(String),

    /// Missing or unusable request input (empty document, zero count, ...).
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("UI error: {0}")]
    Ui(String),
}
