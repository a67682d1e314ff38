// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared Credentials File
//!
//! INI-backed [`CredentialStore`] for `~/.aws/credentials`, plus discovery
//! of the file's location.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Load once, mutate in memory, atomically replace the whole file per save

use ini::{Ini, WriteOption};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::credential_store::{
    CredentialStore, CredentialStoreError, ACCESS_KEY_ID_KEY, SECRET_ACCESS_KEY_KEY,
};
use crate::domain::credentials::AccessKey;

/// Environment variable that overrides the credentials file location
pub const CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

/// Discover the shared credentials file using precedence order
/// 1. Explicit path (`--credentials-file`)
/// 2. AWS_SHARED_CREDENTIALS_FILE environment variable
/// 3. ~/.aws/credentials (user home; USERPROFILE on Windows)
pub fn discover_credentials_file(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    if let Some(path) = std::env::var_os(CREDENTIALS_FILE_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .ok_or_else(|| anyhow::anyhow!("Unable to find AWS shared credentials file: no home directory"))
}

/// The shared credentials file held in memory
pub struct SharedCredentialsFile {
    ini: Ini,
}

impl SharedCredentialsFile {
    /// Parse the file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialStoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CredentialStoreError::NotFound(path.to_path_buf()));
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(err) => CredentialStoreError::Read {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
            ini::Error::Parse(err) => CredentialStoreError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        })?;

        debug!(path = %path.display(), "Loaded credentials file");
        Ok(Self { ini })
    }

    /// Parse credentials from a string
    pub fn parse(content: &str) -> Result<Self, CredentialStoreError> {
        let ini = Ini::load_from_str(content).map_err(|e| CredentialStoreError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        Ok(Self { ini })
    }

    fn write_option() -> WriteOption {
        WriteOption {
            kv_separator: " = ",
            ..Default::default()
        }
    }
}

/// Atomically replace `path` with whatever `write` produces.
///
/// Content goes to a temporary file in the same directory which is synced and
/// then renamed over the target, so the old file stays intact until the new
/// one is complete. A symlinked target is replaced at its destination. The
/// existing file's permissions are kept; new files are owner-only.
fn replace_file<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let target = match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping the handle on any error removes the temporary file
    let mut temp = tempfile::Builder::new()
        .prefix(".credentials.")
        .tempfile_in(dir)?;

    if let Ok(metadata) = std::fs::metadata(&target) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

impl CredentialStore for SharedCredentialsFile {
    fn access_key(&self, profile: &str) -> Result<AccessKey, CredentialStoreError> {
        let section = self
            .ini
            .section(Some(profile))
            .ok_or_else(|| CredentialStoreError::MissingProfile(profile.to_string()))?;

        let value = |key: &'static str| {
            section
                .get(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| CredentialStoreError::MissingKey {
                    profile: profile.to_string(),
                    key,
                })
        };

        Ok(AccessKey {
            access_key_id: value(ACCESS_KEY_ID_KEY)?,
            secret_access_key: value(SECRET_ACCESS_KEY_KEY)?,
        })
    }

    fn set_access_key(&mut self, profile: &str, key: &AccessKey) {
        self.ini
            .with_section(Some(profile))
            .set(ACCESS_KEY_ID_KEY, key.access_key_id.as_str())
            .set(SECRET_ACCESS_KEY_KEY, key.secret_access_key.as_str());
    }

    fn save_to(&self, path: &Path) -> Result<(), CredentialStoreError> {
        let mut buffer = Vec::new();
        self.ini
            .write_to_opt(&mut buffer, Self::write_option())
            .map_err(|e| CredentialStoreError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        replace_file(path, |file| file.write_all(&buffer)).map_err(|e| {
            CredentialStoreError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        debug!(path = %path.display(), bytes = buffer.len(), "Rewrote credentials file");
        Ok(())
    }

    fn profiles(&self) -> Vec<String> {
        self.ini
            .sections()
            .flatten()
            .map(str::to_string)
            .collect()
    }
}
