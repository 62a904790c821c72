//! Domain layer - pure release resolution logic
//!
//! This module contains business logic with no external I/O.
//! Collaborators (environment, image and resource-name resolution) are
//! traits, so everything here can be unit tested with small fakes.

pub mod descriptor;
pub mod download_urls;
pub mod environment;
pub mod image;
pub mod login;
pub mod resolver;
pub mod validation;
pub mod watch_policy;

// Re-export commonly used types
pub use descriptor::{ArtifactDescriptor, DescriptorBase, DescriptorFactory};
pub use environment::{EnvironmentLookup, Orchestrator, OrchestratorDetector};
pub use image::{ContainerImageResolver, PromotedImageResolver};
pub use login::{select_login, LoginDescriptor};
pub use resolver::{ConfigurationResolver, ResourceNameResolver};
pub use watch_policy::{StageOutcome, StageWatchPolicy};
