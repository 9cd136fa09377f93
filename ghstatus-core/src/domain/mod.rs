//! Core domain types
//!
//! This module contains the structures the controller reads from the cluster
//! (pipeline runs, secrets) and the commit status it writes to GitHub.

pub mod pipeline_run;
pub mod secret;
pub mod status;
