//! Application use cases. Orchestrate domain logic via ports.

pub mod generation_service;
pub mod library_service;
pub mod profiles;
pub mod prompts;

pub use generation_service::{GenerationLimits, GenerationService, Generated};
pub use library_service::LibraryService;
