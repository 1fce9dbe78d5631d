//! Service adapters that bind the invitation workflow to this deployment.

pub mod email;
pub mod links;
pub mod settings;

pub use email::EmailService;
pub use links::RouteLinks;
pub use settings::SystemSettings;
