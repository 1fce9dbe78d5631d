//! Persistence layer for the invitation service.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the user, group and preference stores

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
