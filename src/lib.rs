//! studyforge: AI study assistant with Hexagonal Architecture.
//!
//! Model replies are never trusted to be clean JSON; every structured call
//! goes through `domain::recovery`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
