//! Scheduler layer for the controller
//!
//! This layer turns a watch feed into reconciliations. It filters events
//! by label and by condition changes, and serializes work per pipeline run.

pub mod dispatcher;
pub mod feed;
pub mod predicate;

pub use dispatcher::Dispatcher;
pub use feed::WatchEvent;
pub use predicate::LabelSelector;
