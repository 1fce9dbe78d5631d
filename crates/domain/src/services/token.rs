//! Invite token generation and verification.
//!
//! A token is `sha256(random ‖ salt)` rendered as hex. The same construction
//! produces the throwaway password of a freshly provisioned account. Only
//! `sha256(token)` is persisted, under the user's `invite` namespace, so a
//! stored value can confirm a token but never reveal it.

use std::sync::Arc;

use shared::crypto::{constant_time_eq, salted_sha256_hex, sha256_hex};
use shared::random::RandomGenerator;

use super::ports::{ConfigStore, PreferenceStore, StoreError};
use crate::models::invite::{INVITE_NAMESPACE, TOKEN_KEY};

/// System config key of the server-wide token salt.
pub const SALT_CONFIG_KEY: &str = "passwordsalt";

/// Default number of random characters fed into each token.
pub const DEFAULT_ENTROPY_LENGTH: usize = 32;

pub struct TokenService {
    generator: RandomGenerator,
    entropy_length: usize,
    config: Arc<dyn ConfigStore>,
    preferences: Arc<dyn PreferenceStore>,
}

impl TokenService {
    pub fn new(config: Arc<dyn ConfigStore>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self::with_generator(
            RandomGenerator::default(),
            DEFAULT_ENTROPY_LENGTH,
            config,
            preferences,
        )
    }

    pub fn with_generator(
        generator: RandomGenerator,
        entropy_length: usize,
        config: Arc<dyn ConfigStore>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            generator,
            entropy_length,
            config,
            preferences,
        }
    }

    /// Produces a new plaintext token.
    pub fn generate_token(&self) -> String {
        let raw = self.generator.generate(self.entropy_length);
        let salt = self.config.system_value(SALT_CONFIG_KEY, "");
        Self::derive_token(&raw, &salt)
    }

    /// Token for a given random input and salt.
    pub fn derive_token(raw: &str, salt: &str) -> String {
        salted_sha256_hex(raw, salt)
    }

    /// Value persisted for a plaintext token.
    pub fn hash_token(token: &str) -> String {
        sha256_hex(token)
    }

    /// Stores the hash of `token` as the user's pending invite, replacing any earlier one.
    pub async fn store_token(&self, user: &str, token: &str) -> Result<(), StoreError> {
        self.preferences
            .set(user, INVITE_NAMESPACE, TOKEN_KEY, &Self::hash_token(token))
            .await
    }

    /// Returns true iff `candidate` hashes to the stored invite token of `user`.
    pub async fn validate_token(&self, user: &str, candidate: &str) -> Result<bool, StoreError> {
        if candidate.is_empty() {
            return Ok(false);
        }

        let stored = self
            .preferences
            .get(user, INVITE_NAMESPACE, TOKEN_KEY)
            .await?;

        Ok(match stored {
            Some(hash) if !hash.is_empty() => {
                constant_time_eq(&hash, &Self::hash_token(candidate))
            }
            _ => false,
        })
    }

    /// Removes the pending invite token of `user`.
    pub async fn revoke_token(&self, user: &str) -> Result<(), StoreError> {
        self.preferences
            .delete(user, INVITE_NAMESPACE, TOKEN_KEY)
            .await
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("generator", &self.generator)
            .field("entropy_length", &self.entropy_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::{InMemoryDirectory, StaticConfigStore};
    use shared::random::EntropySource;

    struct Zeros;

    impl EntropySource for Zeros {
        fn name(&self) -> &'static str {
            "zeros"
        }

        fn fill(&self, len: usize) -> Option<Vec<u8>> {
            Some(vec![0; len])
        }
    }

    fn service(salt: &str) -> (TokenService, Arc<InMemoryDirectory>) {
        let directory = Arc::new(InMemoryDirectory::new());
        let config = Arc::new(StaticConfigStore::new("example.com").with_value(SALT_CONFIG_KEY, salt));
        (TokenService::new(config, directory.clone()), directory)
    }

    #[test]
    fn test_token_is_salted_sha256() {
        let directory = Arc::new(InMemoryDirectory::new());
        let config = Arc::new(StaticConfigStore::new("example.com").with_value(SALT_CONFIG_KEY, "pepper"));
        let tokens = TokenService::with_generator(
            RandomGenerator::with_sources(vec![Box::new(Zeros)]),
            4,
            config,
            directory,
        );

        assert_eq!(tokens.generate_token(), sha256_hex("0000pepper"));
        assert_eq!(tokens.generate_token(), tokens.generate_token());
    }

    #[test]
    fn test_tokens_are_hex_digests() {
        let (tokens, _) = service("salt");
        let token = tokens.generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, tokens.generate_token());
    }

    #[tokio::test]
    async fn test_only_hash_is_persisted() {
        let (tokens, directory) = service("salt");
        let token = tokens.generate_token();
        tokens.store_token("bob", &token).await.unwrap();

        let stored = directory.preference("bob", INVITE_NAMESPACE, TOKEN_KEY).unwrap();
        assert_eq!(stored, sha256_hex(&token));
        assert_ne!(stored, token);
    }

    #[tokio::test]
    async fn test_validate_token() {
        let (tokens, _) = service("salt");
        let token = tokens.generate_token();
        tokens.store_token("bob", &token).await.unwrap();

        assert!(tokens.validate_token("bob", &token).await.unwrap());
        assert!(!tokens.validate_token("bob", "").await.unwrap());
        assert!(!tokens.validate_token("bob", "guess").await.unwrap());
        assert!(!tokens.validate_token("alice", &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_new_token_replaces_previous() {
        let (tokens, _) = service("salt");
        let first = tokens.generate_token();
        tokens.store_token("bob", &first).await.unwrap();
        let second = tokens.generate_token();
        tokens.store_token("bob", &second).await.unwrap();

        assert!(!tokens.validate_token("bob", &first).await.unwrap());
        assert!(tokens.validate_token("bob", &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoked_token_is_invalid() {
        let (tokens, _) = service("salt");
        let token = tokens.generate_token();
        tokens.store_token("bob", &token).await.unwrap();
        tokens.revoke_token("bob").await.unwrap();

        assert!(!tokens.validate_token("bob", &token).await.unwrap());
    }
}
