//! Invitation workflow.
//!
//! Runs one invite request through
//! `Received -> Validating -> (Rejected | Provisioning) -> Provisioned -> Emailing -> Completed`,
//! with `Failed` reachable from every step after validation starts.
//!
//! Side effects are not rolled back. An account that was created stays, even
//! if adding it to a group or mailing the invitee fails afterwards.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::ports::{
    ConfigStore, GroupDirectory, LinkGenerator, MailMessage, MailSender, PreferenceStore,
    StoreError, TemplateRenderer, TemplateVars, Translator, UserDirectory,
};
use super::templates::INVITE_EMAIL_TEMPLATE;
use super::token::TokenService;
use super::validation::{validate_email, validate_groups, validate_password, validate_username};
use crate::models::invite::{EMAIL_KEY, SETTINGS_NAMESPACE};
use crate::models::{
    InviteOutcome, InviteRequest, InviteState, JoinOutcome, JoinRequest, RequestContext,
    ValidationReport,
};

pub const MSG_OK: &str = "OK";
pub const MSG_INVALID_REQUEST: &str = "Invalid invitation request";
pub const MSG_CREATE_FAILED: &str = "Failed to create user %s";
pub const MSG_GROUP_FAILED: &str = "Failed to add user %s to group %s";
pub const MSG_STORE_FAILED: &str = "Failed to store invitation for %s";
pub const MSG_MAIL_FAILED: &str = "Failed to send invitation email";
pub const MSG_SUBJECT: &str = "You are invited to join %s";
pub const MSG_INVALID_TOKEN: &str = "Invalid or expired invitation";
pub const MSG_JOIN_FAILED: &str = "Failed to activate account %s";
pub const MSG_LOOKUP_FAILED: &str = "Failed to look up account data";

/// Route name of the page the invitee lands on.
pub const JOIN_ROUTE: &str = "invite.join";

/// Local part of the fallback sender address.
pub const NO_REPLY_LOCAL_PART: &str = "no-reply";

/// Ways an invitation can end without completing.
#[derive(Debug, Error)]
pub enum InviteError {
    #[error("Validation failed")]
    Validation(ValidationReport),

    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

/// Everything the workflow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserDirectory>,
    pub groups: Arc<dyn GroupDirectory>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub links: Arc<dyn LinkGenerator>,
    pub templates: Arc<dyn TemplateRenderer>,
    pub mailer: Arc<dyn MailSender>,
    pub config: Arc<dyn ConfigStore>,
    pub translator: Arc<dyn Translator>,
}

/// Product-level settings for invitation mails.
#[derive(Debug, Clone)]
pub struct InviteSettings {
    /// Name shown in the subject and body, e.g. "Example Cloud".
    pub product_name: String,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self {
            product_name: "ownCloud".to_string(),
        }
    }
}

/// Tracks the current state and refuses illegal steps.
#[derive(Debug)]
struct Progress {
    state: InviteState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: InviteState::Received,
        }
    }

    fn advance(&mut self, next: InviteState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal invite transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Invite state transition");
        self.state = next;
    }
}

pub struct InvitationWorkflow {
    users: Arc<dyn UserDirectory>,
    groups: Arc<dyn GroupDirectory>,
    preferences: Arc<dyn PreferenceStore>,
    links: Arc<dyn LinkGenerator>,
    templates: Arc<dyn TemplateRenderer>,
    mailer: Arc<dyn MailSender>,
    config: Arc<dyn ConfigStore>,
    translator: Arc<dyn Translator>,
    tokens: TokenService,
    settings: InviteSettings,
}

impl InvitationWorkflow {
    pub fn new(collaborators: Collaborators, settings: InviteSettings) -> Self {
        let tokens = TokenService::new(
            collaborators.config.clone(),
            collaborators.preferences.clone(),
        );
        Self::with_tokens(collaborators, settings, tokens)
    }

    pub fn with_tokens(
        collaborators: Collaborators,
        settings: InviteSettings,
        tokens: TokenService,
    ) -> Self {
        Self {
            users: collaborators.users,
            groups: collaborators.groups,
            preferences: collaborators.preferences,
            links: collaborators.links,
            templates: collaborators.templates,
            mailer: collaborators.mailer,
            config: collaborators.config,
            translator: collaborators.translator,
            tokens,
            settings,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Validates, provisions and notifies a new user.
    pub async fn invite(&self, ctx: &RequestContext, request: InviteRequest) -> InviteOutcome {
        let mut progress = Progress::new();

        match self.run_invite(ctx, &request, &mut progress).await {
            Ok(()) => {
                progress.advance(InviteState::Completed);
                info!(
                    requester = %ctx.requester,
                    username = %request.username,
                    groups = request.groups.len(),
                    "Invitation sent"
                );
                InviteOutcome::completed(self.t(MSG_OK, &[]))
            }
            Err(InviteError::Validation(report)) => {
                progress.advance(InviteState::Rejected);
                debug!(
                    requester = %ctx.requester,
                    valid_user = report.username.valid,
                    valid_email = report.email.valid,
                    valid_groups = report.groups,
                    "Invitation rejected"
                );
                let msg = match report.messages() {
                    messages if messages.is_empty() => self.t(MSG_INVALID_REQUEST, &[]),
                    messages => messages.join(" "),
                };
                InviteOutcome::rejected(&report, msg)
            }
            Err(InviteError::Provisioning(msg)) | Err(InviteError::Mail(msg)) => {
                warn!(
                    requester = %ctx.requester,
                    username = %request.username,
                    failed_in = %progress.state,
                    error = %msg,
                    "Invitation failed"
                );
                progress.advance(InviteState::Failed);
                InviteOutcome::failed(msg)
            }
        }
    }

    async fn run_invite(
        &self,
        ctx: &RequestContext,
        request: &InviteRequest,
        progress: &mut Progress,
    ) -> Result<(), InviteError> {
        let username = request.username.as_str();

        progress.advance(InviteState::Validating);
        let report = self.validate(ctx, request).await?;
        if !report.is_valid() {
            return Err(InviteError::Validation(report));
        }

        progress.advance(InviteState::Provisioning);
        let password = self.tokens.generate_token();
        let created = match self.users.create(username, &password).await {
            Ok(created) => created,
            Err(e) => {
                warn!(username = %username, error = %e, "User store rejected account creation");
                false
            }
        };
        if !created {
            return Err(InviteError::Provisioning(
                self.t(MSG_CREATE_FAILED, &[username]),
            ));
        }

        progress.advance(InviteState::Provisioned);
        for group in &request.groups {
            self.groups
                .add_member(username, group)
                .await
                .map_err(|e| {
                    warn!(username = %username, group = %group, error = %e, "Group assignment failed");
                    InviteError::Provisioning(self.t(MSG_GROUP_FAILED, &[username, group]))
                })?;
        }

        let token = self.tokens.generate_token();
        self.store_invite(username, &request.email, &token)
            .await
            .map_err(|e| {
                warn!(username = %username, error = %e, "Storing invitation data failed");
                InviteError::Provisioning(self.t(MSG_STORE_FAILED, &[username]))
            })?;

        progress.advance(InviteState::Emailing);
        self.send_invitation(ctx, username, &request.email, &token)
            .await
    }

    async fn validate(
        &self,
        ctx: &RequestContext,
        request: &InviteRequest,
    ) -> Result<ValidationReport, InviteError> {
        let lookup_failed = |e: StoreError| {
            warn!(error = %e, "Store lookup failed during validation");
            InviteError::Provisioning(self.t(MSG_LOOKUP_FAILED, &[]))
        };

        let username =
            validate_username(&request.username, self.users.as_ref(), self.translator.as_ref())
                .await
                .map_err(lookup_failed)?;
        let email = validate_email(&request.email, self.translator.as_ref());
        let groups = validate_groups(&request.groups, ctx.is_admin, self.groups.as_ref())
            .await
            .map_err(lookup_failed)?;

        Ok(ValidationReport {
            username,
            email,
            groups,
        })
    }

    async fn store_invite(&self, username: &str, email: &str, token: &str) -> Result<(), StoreError> {
        self.preferences
            .set(username, SETTINGS_NAMESPACE, EMAIL_KEY, email)
            .await?;
        self.tokens.store_token(username, token).await
    }

    async fn send_invitation(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        token: &str,
    ) -> Result<(), InviteError> {
        let product = self.settings.product_name.as_str();
        let link = self.links.to_absolute(
            &self
                .links
                .link_for(JOIN_ROUTE, &[("username", username), ("token", token)]),
        );

        let inviter = match self.users.display_name(&ctx.requester).await {
            Ok(name) => name,
            Err(e) => {
                debug!(requester = %ctx.requester, error = %e, "Display name lookup failed");
                ctx.requester.clone()
            }
        };

        let vars: TemplateVars = [
            ("link", link.as_str()),
            ("inviter", inviter.as_str()),
            ("invitee", username),
            ("product", product),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let body = self
            .templates
            .render(INVITE_EMAIL_TEMPLATE, &vars)
            .map_err(|e| {
                warn!(error = %e, "Rendering invitation email failed");
                InviteError::Mail(self.t(MSG_MAIL_FAILED, &[]))
            })?;

        let from = self.sender_address(&ctx.requester).await;

        let message = MailMessage {
            to: email.to_string(),
            to_name: username.to_string(),
            subject: self.t(MSG_SUBJECT, &[product]),
            body,
            from,
            from_name: inviter,
        };

        self.mailer.send(message).await.map_err(|e| {
            warn!(username = %username, error = %e, "Mail transport failed");
            InviteError::Mail(self.t(MSG_MAIL_FAILED, &[]))
        })
    }

    /// The requester's own email, or the system no-reply address.
    async fn sender_address(&self, requester: &str) -> String {
        match self
            .preferences
            .get(requester, SETTINGS_NAMESPACE, EMAIL_KEY)
            .await
        {
            Ok(Some(address)) if !address.trim().is_empty() => address,
            Ok(_) => self.config.default_email_address(NO_REPLY_LOCAL_PART),
            Err(e) => {
                debug!(requester = %requester, error = %e, "Sender address lookup failed");
                self.config.default_email_address(NO_REPLY_LOCAL_PART)
            }
        }
    }

    /// Returns true if `token` is the pending invite token of `username`.
    pub async fn check(&self, username: &str, token: &str) -> bool {
        match self.tokens.validate_token(username, token).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(username = %username, error = %e, "Token lookup failed");
                false
            }
        }
    }

    /// Lets an invitee replace the generated password using their token.
    ///
    /// The token is consumed on success. A weak password leaves it usable.
    pub async fn accept(&self, request: JoinRequest) -> JoinOutcome {
        let username = request.username.as_str();

        match self.tokens.validate_token(username, &request.token).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(username = %username, "Join attempted with invalid token");
                return JoinOutcome::invalid_token(self.t(MSG_INVALID_TOKEN, &[]));
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Token lookup failed");
                return JoinOutcome::failed(self.t(MSG_LOOKUP_FAILED, &[]));
            }
        }

        let password = validate_password(&request.password, self.translator.as_ref());
        if !password.valid {
            return JoinOutcome::weak_password(password.message);
        }

        match self.users.set_password(username, &request.password).await {
            Ok(true) => {}
            Ok(false) => return JoinOutcome::failed(self.t(MSG_JOIN_FAILED, &[username])),
            Err(e) => {
                warn!(username = %username, error = %e, "Setting password failed");
                return JoinOutcome::failed(self.t(MSG_JOIN_FAILED, &[username]));
            }
        }

        if let Err(e) = self.tokens.revoke_token(username).await {
            warn!(username = %username, error = %e, "Revoking invite token failed");
            return JoinOutcome::failed(self.t(MSG_JOIN_FAILED, &[username]));
        }

        info!(username = %username, "Invitation accepted");
        JoinOutcome::joined(self.t(MSG_OK, &[]))
    }

    fn t(&self, message: &str, args: &[&str]) -> String {
        self.translator.t(message, args)
    }
}

impl std::fmt::Debug for InvitationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationWorkflow")
            .field("tokens", &self.tokens)
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invite::{INVITE_NAMESPACE, TOKEN_KEY};
    use crate::services::memory::{
        FixedLinks, InMemoryDirectory, RecordingMailSender, StaticConfigStore,
    };
    use crate::services::templates::{BuiltinTemplates, PlaceholderTranslator};
    use crate::services::token::SALT_CONFIG_KEY;
    use crate::services::validation::{EMAIL_INVALID, PASSWORD_TOO_WEAK, USERNAME_EXISTS};
    use shared::crypto::sha256_hex;

    struct Harness {
        directory: Arc<InMemoryDirectory>,
        mailer: Arc<RecordingMailSender>,
        workflow: InvitationWorkflow,
    }

    fn harness(directory: InMemoryDirectory, mailer: RecordingMailSender) -> Harness {
        let directory = Arc::new(directory);
        let mailer = Arc::new(mailer);
        let collaborators = Collaborators {
            users: directory.clone(),
            groups: directory.clone(),
            preferences: directory.clone(),
            links: Arc::new(FixedLinks::new("https://cloud.example.com")),
            templates: Arc::new(BuiltinTemplates::new()),
            mailer: mailer.clone(),
            config: Arc::new(
                StaticConfigStore::new("cloud.example.com").with_value(SALT_CONFIG_KEY, "salt"),
            ),
            translator: Arc::new(PlaceholderTranslator),
        };
        let workflow = InvitationWorkflow::new(
            collaborators,
            InviteSettings {
                product_name: "Example Cloud".to_string(),
            },
        );
        Harness {
            directory,
            mailer,
            workflow,
        }
    }

    fn base_directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_user("admin", "pw")
            .with_display_name("admin", "The Admin")
            .with_group("admin")
            .with_member("admin", "admin")
            .with_group("users")
    }

    fn request(username: &str, email: &str, groups: &[&str]) -> InviteRequest {
        InviteRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: None,
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn admin() -> RequestContext {
        RequestContext::new("admin", true)
    }

    /// Pulls the plaintext token out of the mailed join link.
    fn mailed_token(body: &str) -> String {
        let start = body.find("token=").expect("link in body") + "token=".len();
        body[start..start + 64].to_string()
    }

    #[tokio::test]
    async fn test_invite_success() {
        let h = harness(base_directory(), RecordingMailSender::new());
        let outcome = h
            .workflow
            .invite(&admin(), request("bob", "bob@x.com", &["users"]))
            .await;

        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.state, InviteState::Completed);
        assert_eq!(
            serde_json::to_value(&outcome.body).unwrap(),
            serde_json::json!({"msg": "OK"})
        );
        assert!(h.directory.has_user("bob"));
        assert_eq!(h.directory.members_of("users"), vec!["bob"]);
        assert_eq!(
            h.directory.preference("bob", SETTINGS_NAMESPACE, EMAIL_KEY).as_deref(),
            Some("bob@x.com")
        );
    }

    #[tokio::test]
    async fn test_invite_mail_contents() {
        let h = harness(base_directory(), RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &["users"]))
            .await;

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        let mail = &sent[0];
        assert_eq!(mail.to, "bob@x.com");
        assert_eq!(mail.to_name, "bob");
        assert_eq!(mail.subject, "You are invited to join Example Cloud");
        assert_eq!(mail.from, "no-reply@cloud.example.com");
        assert_eq!(mail.from_name, "The Admin");
        assert!(mail
            .body
            .contains("https://cloud.example.com/invite.join?username=bob&token="));
        assert!(mail.body.contains("The Admin invited you to join Example Cloud"));
    }

    #[tokio::test]
    async fn test_stored_token_is_hash_of_mailed_token() {
        let h = harness(base_directory(), RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &[]))
            .await;

        let token = mailed_token(&h.mailer.sent()[0].body);
        let stored = h
            .directory
            .preference("bob", INVITE_NAMESPACE, TOKEN_KEY)
            .unwrap();
        assert_eq!(stored, sha256_hex(&token));
        assert!(h.workflow.check("bob", &token).await);
        assert!(!h.workflow.check("bob", "").await);
    }

    #[tokio::test]
    async fn test_generated_password_differs_from_token() {
        let h = harness(base_directory(), RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &[]))
            .await;

        let token = mailed_token(&h.mailer.sent()[0].body);
        let password = h.directory.password_of("bob").unwrap();
        assert_eq!(password.len(), 64);
        assert_ne!(password, token);
    }

    #[tokio::test]
    async fn test_sender_uses_requester_email() {
        let directory =
            base_directory().with_preference("admin", SETTINGS_NAMESPACE, EMAIL_KEY, "boss@x.com");
        let h = harness(directory, RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &[]))
            .await;

        assert_eq!(h.mailer.sent()[0].from, "boss@x.com");
    }

    #[tokio::test]
    async fn test_invalid_email_rejected_without_side_effects() {
        let h = harness(base_directory(), RecordingMailSender::new());
        let outcome = h
            .workflow
            .invite(&admin(), request("bob", "not-an-email", &["users"]))
            .await;

        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.state, InviteState::Rejected);
        let json = serde_json::to_value(&outcome.body).unwrap();
        assert_eq!(json["validUser"], true);
        assert_eq!(json["validEmail"], false);
        assert_eq!(json["validGroups"], true);
        assert_eq!(json["msg"], EMAIL_INVALID);
        assert!(!h.directory.has_user("bob"));
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_existing_user_rejected() {
        let h = harness(base_directory(), RecordingMailSender::new());
        let outcome = h
            .workflow
            .invite(&admin(), request("admin", "a@x.com", &[]))
            .await;

        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.body.valid_user, Some(false));
        assert_eq!(outcome.body.msg, USERNAME_EXISTS);
    }

    #[tokio::test]
    async fn test_non_admin_needs_groups() {
        let h = harness(
            base_directory().with_user("carol", "pw"),
            RecordingMailSender::new(),
        );
        let outcome = h
            .workflow
            .invite(
                &RequestContext::new("carol", false),
                request("bob", "bob@x.com", &[]),
            )
            .await;

        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.body.valid_groups, Some(false));
        assert_eq!(outcome.body.valid_user, Some(true));
        assert_eq!(outcome.body.msg, MSG_INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_group_rejected() {
        let h = harness(base_directory(), RecordingMailSender::new());
        let outcome = h
            .workflow
            .invite(&admin(), request("bob", "bob@x.com", &["nonexistent"]))
            .await;

        assert_eq!(outcome.status, 400);
        assert_eq!(outcome.body.valid_groups, Some(false));
        assert!(!h.directory.has_user("bob"));
    }

    #[tokio::test]
    async fn test_create_failure_names_username() {
        let h = harness(
            InMemoryDirectory::refusing_create().with_group("users"),
            RecordingMailSender::new(),
        );
        let outcome = h
            .workflow
            .invite(&admin(), request("bob", "bob@x.com", &["users"]))
            .await;

        assert_eq!(outcome.status, 500);
        assert_eq!(outcome.state, InviteState::Failed);
        assert_eq!(outcome.body.msg, "Failed to create user bob");
        assert!(h.directory.members_of("users").is_empty());
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_group_failure_keeps_partial_state() {
        let directory = base_directory().with_group("staff").failing_group("staff");
        let h = harness(directory, RecordingMailSender::new());
        let outcome = h
            .workflow
            .invite(&admin(), request("bob", "bob@x.com", &["users", "staff"]))
            .await;

        assert_eq!(outcome.status, 500);
        assert_eq!(outcome.body.msg, "Failed to add user bob to group staff");
        assert!(h.directory.has_user("bob"));
        assert_eq!(h.directory.members_of("users"), vec!["bob"]);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_account() {
        let h = harness(base_directory(), RecordingMailSender::failing());
        let outcome = h
            .workflow
            .invite(&admin(), request("bob", "bob@x.com", &["users"]))
            .await;

        assert_eq!(outcome.status, 500);
        assert_eq!(outcome.state, InviteState::Failed);
        assert_eq!(outcome.body.msg, MSG_MAIL_FAILED);
        assert!(h.directory.has_user("bob"));
        assert_eq!(h.directory.members_of("users"), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_accept_sets_password_and_consumes_token() {
        let h = harness(base_directory(), RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &[]))
            .await;
        let token = mailed_token(&h.mailer.sent()[0].body);

        let join = |password: &str| JoinRequest {
            username: "bob".to_string(),
            token: token.clone(),
            password: password.to_string(),
        };

        let weak = h.workflow.accept(join("weak")).await;
        assert_eq!(weak.status, 400);
        assert_eq!(weak.body.valid_password, Some(false));
        assert_eq!(weak.body.msg, PASSWORD_TOO_WEAK);
        assert!(h.workflow.check("bob", &token).await);

        let joined = h.workflow.accept(join("Secret1")).await;
        assert_eq!(joined.status, 200);
        assert_eq!(h.directory.password_of("bob").as_deref(), Some("Secret1"));
        assert!(!h.workflow.check("bob", &token).await);

        let again = h.workflow.accept(join("Secret2")).await;
        assert_eq!(again.status, 403);
    }

    #[tokio::test]
    async fn test_accept_rejects_wrong_token() {
        let h = harness(base_directory(), RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &[]))
            .await;

        let outcome = h
            .workflow
            .accept(JoinRequest {
                username: "bob".to_string(),
                token: "0".repeat(64),
                password: "Secret1".to_string(),
            })
            .await;

        assert_eq!(outcome.status, 403);
        assert_eq!(outcome.body.msg, MSG_INVALID_TOKEN);
    }

    #[tokio::test]
    async fn test_reinvite_invalidates_previous_token() {
        let h = harness(base_directory(), RecordingMailSender::new());
        h.workflow
            .invite(&admin(), request("bob", "bob@x.com", &[]))
            .await;
        let first = mailed_token(&h.mailer.sent()[0].body);

        let second = h.workflow.tokens().generate_token();
        h.workflow.tokens().store_token("bob", &second).await.unwrap();

        assert!(!h.workflow.check("bob", &first).await);
        assert!(h.workflow.check("bob", &second).await);
    }
}
