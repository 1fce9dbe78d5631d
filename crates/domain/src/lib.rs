//! Domain layer for the invitation service.
//!
//! This crate contains:
//! - Domain models (InviteRequest, ValidationResult, InviteState, responses)
//! - Collaborator traits for user, group, preference, mail and link services
//! - The invitation workflow and its field validators
//! - In-memory collaborators for tests (`test-utils` feature)

pub mod models;
pub mod services;
