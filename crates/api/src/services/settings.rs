//! System-wide values exposed to the workflow.

use domain::services::{ConfigStore, SALT_CONFIG_KEY};
use reqwest::Url;
use std::collections::HashMap;

use crate::config::InviteConfig;

/// Domain used when neither `mail_domain` nor a host in `base_url` is available.
const FALLBACK_MAIL_DOMAIN: &str = "localhost";

/// Read-only system values backed by the loaded configuration.
#[derive(Debug, Clone)]
pub struct SystemSettings {
    values: HashMap<String, String>,
    mail_domain: String,
}

impl SystemSettings {
    pub fn from_config(config: &InviteConfig) -> Self {
        let mut values = HashMap::new();
        values.insert(SALT_CONFIG_KEY.to_string(), config.token_salt.clone());

        Self {
            values,
            mail_domain: mail_domain(config),
        }
    }
}

/// The configured mail domain, else the host of the public base URL.
fn mail_domain(config: &InviteConfig) -> String {
    if !config.mail_domain.trim().is_empty() {
        return config.mail_domain.trim().to_string();
    }

    Url::parse(&config.base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MAIL_DOMAIN.to_string())
}

impl ConfigStore for SystemSettings {
    fn system_value(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn default_email_address(&self, local_part: &str) -> String {
        format!("{}@{}", local_part, self.mail_domain)
    }
}
