//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod group;
pub mod user;

pub use group::GroupEntity;
pub use user::UserEntity;
