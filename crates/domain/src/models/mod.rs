//! Domain models for the invitation service.

pub mod context;
pub mod invite;
pub mod join;

pub use context::RequestContext;
pub use invite::{
    InviteOutcome, InviteRequest, InviteResponse, InviteState, ValidationReport, ValidationResult,
};
pub use join::{JoinOutcome, JoinRequest, JoinResponse, TokenCheckQuery, TokenCheckResponse};
