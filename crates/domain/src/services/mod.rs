//! Domain services for the invitation service.
//!
//! Services contain business logic that operates on domain models.

pub mod invitation;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod ports;
pub mod templates;
pub mod token;
pub mod validation;

pub use invitation::{Collaborators, InvitationWorkflow, InviteError, InviteSettings};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{FixedLinks, InMemoryDirectory, RecordingMailSender, StaticConfigStore};
pub use ports::{
    ConfigStore, GroupDirectory, LinkGenerator, MailError, MailMessage, MailSender,
    PreferenceStore, StoreError, TemplateError, TemplateRenderer, TemplateVars, Translator,
    UserDirectory,
};
pub use templates::{BuiltinTemplates, PlaceholderTranslator, INVITE_EMAIL_TEMPLATE};
pub use token::{TokenService, SALT_CONFIG_KEY};
