// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Credential Store
//!
//! Persistence contract for the shared credentials file: one section per
//! profile, each holding an access key id and secret.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Store interface; implemented in `crate::infrastructure::credentials_file`

use std::path::{Path, PathBuf};

use crate::domain::credentials::AccessKey;

/// Key holding the access key id inside a profile section
pub const ACCESS_KEY_ID_KEY: &str = "aws_access_key_id";

/// Key holding the secret access key inside a profile section
pub const SECRET_ACCESS_KEY_KEY: &str = "aws_secret_access_key";

/// In-memory view of the credentials file.
///
/// Mutations only touch memory; nothing reaches stable storage until
/// [`CredentialStore::save_to`] rewrites the whole file.
pub trait CredentialStore: Send {
    /// Key pair currently recorded for the profile
    fn access_key(&self, profile: &str) -> Result<AccessKey, CredentialStoreError>;

    /// Record a key pair for the profile, creating the section if needed
    fn set_access_key(&mut self, profile: &str, key: &AccessKey);

    /// Rewrite the whole store to `path`
    fn save_to(&self, path: &Path) -> Result<(), CredentialStoreError>;

    /// Section names in file order
    fn profiles(&self) -> Vec<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("Credentials file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read credentials file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse credentials file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Profile '{0}' not found in credentials file")]
    MissingProfile(String),

    #[error("Profile '{profile}' has no {key}")]
    MissingKey { profile: String, key: &'static str },

    #[error("Failed to write credentials file {path}: {message}")]
    Write { path: PathBuf, message: String },
}
