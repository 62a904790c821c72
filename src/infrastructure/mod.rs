//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with the outside world:
//! - Process environment (CI variables, orchestrator detection)
//! - File system (existence checks, globbing, tar/zip extraction)

pub mod environment;
pub mod filesystem;

// Re-export commonly used types
pub use environment::{EnvironmentResourceNames, ProcessEnvironment};
pub use filesystem::{FileSystem, LocalFileSystem};
