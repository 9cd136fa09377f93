//! ghstatus Core
//!
//! Core types shared by the ghstatus client and controller.
//!
//! This crate contains:
//! - Domain types: the pipeline-run snapshot, secrets, and commit statuses
//! - DTOs: wire payloads exchanged with the GitHub REST API

pub mod domain;
pub mod dto;
