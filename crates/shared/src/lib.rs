//! Shared utilities for the invitation service.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (SHA-256 hashing, constant-time comparison)
//! - Tiered random string generation
//! - Password hashing with Argon2id
//! - Syntax validation for usernames, emails and passwords
//! - JWT verification for requester authentication

pub mod crypto;
pub mod jwt;
pub mod password;
pub mod random;
pub mod validation;
