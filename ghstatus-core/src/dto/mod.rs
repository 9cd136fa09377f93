//! Data Transfer Objects for the GitHub REST API
//!
//! DTOs are the exact JSON shapes sent to and received from GitHub. Domain
//! types convert into them at the client boundary.

pub mod status;
pub mod token;
