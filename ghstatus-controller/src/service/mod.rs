//! Service layer
//!
//! Services hold the controller's decision logic: reading settings from
//! annotations, locating the built revision, and reconciling a pipeline run
//! into GitHub commit statuses.
//!
//! Collaborators are trait-based to enable testing and dependency injection.

pub mod publisher;
pub mod reconciler;
pub mod revision;
pub mod settings;

#[cfg(test)]
pub mod testing;

// Re-export traits
pub use publisher::StatusClientFactory;

// Re-export implementations
pub use publisher::GithubClientFactory;
pub use reconciler::{ReconcileOutcome, Reconciler};
