// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Rotation
//!
//! State machine, errors and outcomes of a single profile's key rotation.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Describes what a rotation did; `crate::application::rotation` drives it
//!
//! ```text
//! START -> IDENTITY_RESOLVED -> KEY_CREATED -> PERSISTED -> OLD_KEY_DELETED
//!                                          \-> PERSIST_FAILED
//! START | IDENTITY_RESOLVED | KEY_CREATED  -> FAILED
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::credential_store::CredentialStoreError;
use crate::domain::credentials::{AccessKey, Identity};
use crate::domain::identity_service::IdentityServiceError;

/// Position of a profile in the rotation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStage {
    Start,
    IdentityResolved,
    KeyCreated,
    Persisted,
    OldKeyDeleted,
    PersistFailed,
    Failed,
}

impl RotationStage {
    /// Whether no further transition can happen from this stage
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RotationStage::OldKeyDeleted | RotationStage::PersistFailed | RotationStage::Failed
        )
    }
}

/// Profile-local failure of one rotation step
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("failed to read credentials: {0}")]
    CredentialRead(#[source] CredentialStoreError),

    #[error("failed to resolve identity: {0}")]
    IdentityLookup(#[source] IdentityServiceError),

    #[error("failed to create access key: {0}")]
    KeyCreation(#[source] IdentityServiceError),

    #[error("failed to persist new access key: {0}")]
    StoreWrite(#[source] CredentialStoreError),

    #[error("failed to delete old access key: {0}")]
    KeyDeletion(#[source] IdentityServiceError),
}

impl RotationError {
    /// Last stage the profile reached before this error
    pub fn stage(&self) -> RotationStage {
        match self {
            RotationError::CredentialRead(_) | RotationError::IdentityLookup(_) => {
                RotationStage::Start
            }
            RotationError::KeyCreation(_) => RotationStage::IdentityResolved,
            RotationError::StoreWrite(_) => RotationStage::KeyCreated,
            RotationError::KeyDeletion(_) => RotationStage::Persisted,
        }
    }
}

/// Result of rotating one profile
#[derive(Debug)]
pub enum RotationOutcome {
    /// New key recorded and old key deleted
    Rotated {
        identity: Identity,
        old_key_id: String,
        new_key_id: String,
    },

    /// New key could not be written to disk; old key left active.
    /// The new key is carried here so the operator can record it by hand.
    PersistFailed {
        identity: Identity,
        old_key_id: String,
        new_key: AccessKey,
        error: RotationError,
    },

    /// New key recorded, but the old key is still active remotely
    OldKeyNotDeleted {
        identity: Identity,
        old_key_id: String,
        new_key_id: String,
        error: RotationError,
    },

    /// Aborted before any new key was recorded
    Failed { error: RotationError },

    /// Credentials and identity checked, nothing changed
    DryRun { identity: Identity, key_id: String },
}

impl RotationOutcome {
    /// Stage the state machine ended in
    pub fn final_stage(&self) -> RotationStage {
        match self {
            RotationOutcome::Rotated { .. } => RotationStage::OldKeyDeleted,
            RotationOutcome::PersistFailed { .. } => RotationStage::PersistFailed,
            // The old key lingers but the profile did reach PERSISTED
            RotationOutcome::OldKeyNotDeleted { .. } => RotationStage::Persisted,
            RotationOutcome::Failed { .. } => RotationStage::Failed,
            RotationOutcome::DryRun { .. } => RotationStage::IdentityResolved,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RotationOutcome::Rotated { .. } | RotationOutcome::DryRun { .. }
        )
    }

    pub fn error(&self) -> Option<&RotationError> {
        match self {
            RotationOutcome::PersistFailed { error, .. }
            | RotationOutcome::OldKeyNotDeleted { error, .. }
            | RotationOutcome::Failed { error } => Some(error),
            RotationOutcome::Rotated { .. } | RotationOutcome::DryRun { .. } => None,
        }
    }
}

/// Outcome for one entry of the resolved profile list
#[derive(Debug)]
pub struct ProfileRotation {
    pub profile: String,
    pub outcome: RotationOutcome,
}

/// Outcomes of a whole run, in processing order
#[derive(Debug, Default)]
pub struct RotationReport {
    pub rotations: Vec<ProfileRotation>,
}

impl RotationReport {
    pub fn push(&mut self, profile: impl Into<String>, outcome: RotationOutcome) {
        self.rotations.push(ProfileRotation {
            profile: profile.into(),
            outcome,
        });
    }

    pub fn succeeded(&self) -> usize {
        self.rotations
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.rotations.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn outcome_for(&self, profile: &str) -> Option<&RotationOutcome> {
        self.rotations
            .iter()
            .find(|r| r.profile == profile)
            .map(|r| &r.outcome)
    }
}
