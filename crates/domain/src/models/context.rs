//! Per-request caller context.

/// Who is performing the request.
///
/// Built by the transport layer and passed explicitly through the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Username of the authenticated requester.
    pub requester: String,
    /// Whether the requester is an administrator.
    pub is_admin: bool,
}

impl RequestContext {
    pub fn new(requester: impl Into<String>, is_admin: bool) -> Self {
        Self {
            requester: requester.into(),
            is_admin,
        }
    }
}
