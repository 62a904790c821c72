//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services use infrastructure adapters to perform I/O operations.

pub mod dry_run;
pub mod extraction;
pub mod release_service;

// Re-export commonly used types
pub use dry_run::DryRunBackend;
pub use release_service::{
    CliSession, CliTarget, Collaborators, ReleaseCheck, ReleaseOutput, ReleaseService, UploadController,
    UploadResponse,
};
