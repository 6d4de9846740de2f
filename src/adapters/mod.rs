//! Infrastructure adapters. Implement outbound ports.
//!
//! AI providers, storage, exports, terminal UI. Map errors to DomainError.

pub mod ai;
pub mod export;
pub mod persistence;
pub mod ui;
