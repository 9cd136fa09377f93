//! Repository layer
//!
//! Repositories give the reconciler read access to cluster state without any
//! business logic: the latest observed pipeline-run snapshots and the
//! secrets holding GitHub credentials.
//!
//! All repositories are trait-based to enable testing and mocking.

mod pipeline_runs;
mod secrets;

// Re-export traits
pub use pipeline_runs::PipelineRunRepository;
pub use secrets::SecretRepository;

// Re-export implementations
pub use pipeline_runs::PipelineRunCache;
pub use secrets::MountedSecretRepository;
