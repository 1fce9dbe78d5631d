//! In-memory collaborators for development and testing.
//!
//! Nothing here is persisted; state lives for the lifetime of the value.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::ports::{
    ConfigStore, GroupDirectory, LinkGenerator, MailError, MailMessage, MailSender,
    PreferenceStore, StoreError, UserDirectory,
};

#[derive(Debug, Default)]
struct DirectoryState {
    /// username -> password
    users: HashMap<String, String>,
    display_names: HashMap<String, String>,
    /// group -> members
    groups: HashMap<String, BTreeSet<String>>,
    /// (user, namespace, key) -> value
    preferences: HashMap<(String, String, String), String>,
}

/// User, group and preference store backed by hash maps.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    refuse_create: bool,
    failing_group: Option<String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory whose `create` always reports failure.
    pub fn refusing_create() -> Self {
        Self {
            refuse_create: true,
            ..Self::default()
        }
    }

    /// Makes `add_member` fail for the named group.
    pub fn failing_group(mut self, group: impl Into<String>) -> Self {
        self.failing_group = Some(group.into());
        self
    }

    pub fn with_user(self, name: &str, password: &str) -> Self {
        self.write().users.insert(name.to_string(), password.to_string());
        self
    }

    pub fn with_display_name(self, name: &str, display_name: &str) -> Self {
        self.write()
            .display_names
            .insert(name.to_string(), display_name.to_string());
        self
    }

    pub fn with_group(self, group: &str) -> Self {
        self.write().groups.entry(group.to_string()).or_default();
        self
    }

    pub fn with_member(self, group: &str, user: &str) -> Self {
        self.write()
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(user.to_string());
        self
    }

    pub fn with_preference(self, user: &str, namespace: &str, key: &str, value: &str) -> Self {
        self.write().preferences.insert(
            (user.to_string(), namespace.to_string(), key.to_string()),
            value.to_string(),
        );
        self
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.read().users.contains_key(name)
    }

    pub fn password_of(&self, name: &str) -> Option<String> {
        self.read().users.get(name).cloned()
    }

    pub fn members_of(&self, group: &str) -> Vec<String> {
        self.read()
            .groups
            .get(group)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn preference(&self, user: &str, namespace: &str, key: &str) -> Option<String> {
        self.read()
            .preferences
            .get(&(user.to_string(), namespace.to_string(), key.to_string()))
            .cloned()
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.read().users.contains_key(name))
    }

    async fn create(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        if self.refuse_create {
            return Ok(false);
        }
        let mut state = self.write();
        if state.users.contains_key(name) {
            return Ok(false);
        }
        state.users.insert(name.to_string(), password.to_string());
        Ok(true)
    }

    async fn display_name(&self, id: &str) -> Result<String, StoreError> {
        Ok(self
            .read()
            .display_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string()))
    }

    async fn set_password(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        let mut state = self.write();
        match state.users.get_mut(name) {
            Some(stored) => {
                *stored = password.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl GroupDirectory for InMemoryDirectory {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.read().groups.contains_key(name))
    }

    async fn add_member(&self, user: &str, group: &str) -> Result<(), StoreError> {
        if self.failing_group.as_deref() == Some(group) {
            return Err(StoreError::Backend(format!("cannot add {} to {}", user, group)));
        }
        match self.write().groups.get_mut(group) {
            Some(members) => {
                members.insert(user.to_string());
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("group {}", group))),
        }
    }

    async fn is_member(&self, user: &str, group: &str) -> Result<bool, StoreError> {
        Ok(self
            .read()
            .groups
            .get(group)
            .is_some_and(|members| members.contains(user)))
    }
}

#[async_trait::async_trait]
impl PreferenceStore for InMemoryDirectory {
    async fn get(
        &self,
        user: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.preference(user, namespace, key))
    }

    async fn set(
        &self,
        user: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.write().preferences.insert(
            (user.to_string(), namespace.to_string(), key.to_string()),
            value.to_string(),
        );
        Ok(())
    }

    async fn delete(&self, user: &str, namespace: &str, key: &str) -> Result<(), StoreError> {
        self.write()
            .preferences
            .remove(&(user.to_string(), namespace.to_string(), key.to_string()));
        Ok(())
    }
}

/// Mail sender that keeps every message instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<MailMessage>>,
    simulate_failure: bool,
}

impl RecordingMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose transport always fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.simulate_failure {
            return Err(MailError::SendFailed("simulated transport failure".into()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

/// Config store with fixed values.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigStore {
    values: HashMap<String, String>,
    mail_domain: String,
}

impl StaticConfigStore {
    pub fn new(mail_domain: impl Into<String>) -> Self {
        Self {
            values: HashMap::new(),
            mail_domain: mail_domain.into(),
        }
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl ConfigStore for StaticConfigStore {
    fn system_value(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn default_email_address(&self, local_part: &str) -> String {
        format!("{}@{}", local_part, self.mail_domain)
    }
}

/// Link generator that joins names and parameters without escaping.
#[derive(Debug, Clone)]
pub struct FixedLinks {
    base_url: String,
}

impl FixedLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl LinkGenerator for FixedLinks {
    fn link_for(&self, route: &str, params: &[(&str, &str)]) -> String {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        if query.is_empty() {
            format!("/{}", route)
        } else {
            format!("/{}?{}", route, query.join("&"))
        }
    }

    fn to_absolute(&self, url: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), url)
    }
}
