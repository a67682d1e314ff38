// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::rotation::RotationStage;

/// Most events a single profile rotation can publish (started, identity,
/// created, persisted, deleted or failed)
pub const MAX_EVENTS_PER_PROFILE: usize = 5;

/// Audit trail of a rotation, one event per state machine transition.
///
/// Events never carry secret access keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RotationEvent {
    RotationStarted {
        profile: String,
        old_key_id: String,
        started_at: DateTime<Utc>,
    },
    IdentityResolved {
        profile: String,
        user_name: String,
        resolved_at: DateTime<Utc>,
    },
    AccessKeyCreated {
        profile: String,
        user_name: String,
        access_key_id: String,
        created_at: DateTime<Utc>,
    },
    CredentialsPersisted {
        profile: String,
        access_key_id: String,
        persisted_at: DateTime<Utc>,
    },
    PersistFailed {
        profile: String,
        access_key_id: String,
        error: String,
        failed_at: DateTime<Utc>,
    },
    OldAccessKeyDeleted {
        profile: String,
        access_key_id: String,
        deleted_at: DateTime<Utc>,
    },
    RotationFailed {
        profile: String,
        stage: RotationStage,
        error: String,
        failed_at: DateTime<Utc>,
    },
    DryRunCompleted {
        profile: String,
        user_name: String,
        access_key_id: String,
        completed_at: DateTime<Utc>,
    },
}

impl RotationEvent {
    pub fn profile(&self) -> &str {
        match self {
            RotationEvent::RotationStarted { profile, .. }
            | RotationEvent::IdentityResolved { profile, .. }
            | RotationEvent::AccessKeyCreated { profile, .. }
            | RotationEvent::CredentialsPersisted { profile, .. }
            | RotationEvent::PersistFailed { profile, .. }
            | RotationEvent::OldAccessKeyDeleted { profile, .. }
            | RotationEvent::RotationFailed { profile, .. }
            | RotationEvent::DryRunCompleted { profile, .. } => profile,
        }
    }

    /// Short snake_case name, matches the serialized `event` tag
    pub fn kind(&self) -> &'static str {
        match self {
            RotationEvent::RotationStarted { .. } => "rotation_started",
            RotationEvent::IdentityResolved { .. } => "identity_resolved",
            RotationEvent::AccessKeyCreated { .. } => "access_key_created",
            RotationEvent::CredentialsPersisted { .. } => "credentials_persisted",
            RotationEvent::PersistFailed { .. } => "persist_failed",
            RotationEvent::OldAccessKeyDeleted { .. } => "old_access_key_deleted",
            RotationEvent::RotationFailed { .. } => "rotation_failed",
            RotationEvent::DryRunCompleted { .. } => "dry_run_completed",
        }
    }
}
