// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Rotation Engine
//!
//! Drives one access key rotation per profile:
//!
//! 1. Read the profile's current key pair from the store
//! 2. Resolve the IAM identity with that pair
//! 3. Create a new access key
//! 4. Record the new pair in the store and rewrite the file
//! 5. Delete the old access key
//!
//! The new key is created and durably written before the old one is deleted,
//! so any failure up to step 5 leaves the profile's original key working.
//! Every failure is local to its profile; the next profile still runs.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates the identity service and the credential store

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::domain::credential_store::CredentialStore;
use crate::domain::events::RotationEvent;
use crate::domain::identity_service::IdentityServiceFactory;
use crate::domain::profile::duplicate_profiles;
use crate::domain::rotation::{
    ProfileRotation, RotationError, RotationOutcome, RotationReport,
};
use crate::infrastructure::event_bus::EventBus;

pub struct RotationEngine {
    services: Arc<dyn IdentityServiceFactory>,
    event_bus: EventBus,
    dry_run: bool,
}

impl RotationEngine {
    pub fn new(services: Arc<dyn IdentityServiceFactory>, event_bus: EventBus) -> Self {
        Self {
            services,
            event_bus,
            dry_run: false,
        }
    }

    /// Stop after resolving the identity; nothing is created, written or deleted
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Rotate every profile in order, sharing one in-memory store.
    ///
    /// `on_outcome` is called as soon as each profile finishes, before the
    /// next one starts.
    pub async fn rotate_profiles<F>(
        &self,
        path: &Path,
        profiles: &[String],
        store: &mut dyn CredentialStore,
        mut on_outcome: F,
    ) -> RotationReport
    where
        F: FnMut(&ProfileRotation),
    {
        let duplicates = duplicate_profiles(profiles);
        if !duplicates.is_empty() {
            warn!(
                profiles = ?duplicates,
                "Profiles listed more than once will be rotated once per occurrence"
            );
        }

        let mut report = RotationReport::default();
        for profile in profiles {
            let outcome = self.rotate_profile(path, profile, store).await;
            let rotation = ProfileRotation {
                profile: profile.clone(),
                outcome,
            };
            on_outcome(&rotation);
            report.rotations.push(rotation);
        }

        info!(
            total = report.rotations.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Rotation run finished"
        );
        report
    }

    /// Rotate a single profile. Never returns an error: failures are folded
    /// into the outcome.
    pub async fn rotate_profile(
        &self,
        path: &Path,
        profile: &str,
        store: &mut dyn CredentialStore,
    ) -> RotationOutcome {
        self.run(path, profile, store)
            .instrument(info_span!("rotate", profile = %profile))
            .await
    }

    async fn run(
        &self,
        path: &Path,
        profile: &str,
        store: &mut dyn CredentialStore,
    ) -> RotationOutcome {
        // 1. Scoped credential context from the key currently on file
        let old_key = match store.access_key(profile) {
            Ok(key) => key,
            Err(e) => {
                debug!(available = ?store.profiles(), "Profiles in credentials file");
                return self.fail(profile, RotationError::CredentialRead(e));
            }
        };
        info!(access_key_id = %old_key.access_key_id, "Starting access key rotation");
        self.event_bus.publish(RotationEvent::RotationStarted {
            profile: profile.to_string(),
            old_key_id: old_key.access_key_id.clone(),
            started_at: Utc::now(),
        });
        let service = self.services.scoped(&old_key);

        // 2. Identity
        let identity = match service.get_current_identity().await {
            Ok(identity) => identity,
            Err(e) => return self.fail(profile, RotationError::IdentityLookup(e)),
        };
        info!(user_name = %identity, "Resolved identity");
        self.event_bus.publish(RotationEvent::IdentityResolved {
            profile: profile.to_string(),
            user_name: identity.user_name.clone(),
            resolved_at: Utc::now(),
        });

        if self.dry_run {
            info!(user_name = %identity, "Dry run: access key would be rotated");
            self.event_bus.publish(RotationEvent::DryRunCompleted {
                profile: profile.to_string(),
                user_name: identity.user_name.clone(),
                access_key_id: old_key.access_key_id.clone(),
                completed_at: Utc::now(),
            });
            return RotationOutcome::DryRun {
                identity,
                key_id: old_key.access_key_id,
            };
        }

        // 3. New key
        let new_key = match service.create_access_key(&identity).await {
            Ok(key) => key,
            Err(e) => return self.fail(profile, RotationError::KeyCreation(e)),
        };
        info!(access_key_id = %new_key.access_key_id, "Created new access key");
        self.event_bus.publish(RotationEvent::AccessKeyCreated {
            profile: profile.to_string(),
            user_name: identity.user_name.clone(),
            access_key_id: new_key.access_key_id.clone(),
            created_at: Utc::now(),
        });

        // 4. Persist before anything is deleted
        store.set_access_key(profile, &new_key);
        if let Err(e) = store.save_to(path) {
            let error = RotationError::StoreWrite(e);
            error!(
                access_key_id = %new_key.access_key_id,
                error = %error,
                "New access key is active but was not saved; old key left in place"
            );
            self.event_bus.publish(RotationEvent::PersistFailed {
                profile: profile.to_string(),
                access_key_id: new_key.access_key_id.clone(),
                error: error.to_string(),
                failed_at: Utc::now(),
            });
            return RotationOutcome::PersistFailed {
                identity,
                old_key_id: old_key.access_key_id,
                new_key,
                error,
            };
        }
        info!(path = %path.display(), "Saved new access key");
        self.event_bus.publish(RotationEvent::CredentialsPersisted {
            profile: profile.to_string(),
            access_key_id: new_key.access_key_id.clone(),
            persisted_at: Utc::now(),
        });

        // 5. Retire the old key
        if let Err(e) = service
            .delete_access_key(&identity, &old_key.access_key_id)
            .await
        {
            let error = RotationError::KeyDeletion(e);
            error!(
                access_key_id = %old_key.access_key_id,
                error = %error,
                "Old access key is still active"
            );
            self.event_bus.publish(RotationEvent::RotationFailed {
                profile: profile.to_string(),
                stage: error.stage(),
                error: error.to_string(),
                failed_at: Utc::now(),
            });
            return RotationOutcome::OldKeyNotDeleted {
                identity,
                old_key_id: old_key.access_key_id,
                new_key_id: new_key.access_key_id,
                error,
            };
        }
        info!(access_key_id = %old_key.access_key_id, "Deleted old access key");
        self.event_bus.publish(RotationEvent::OldAccessKeyDeleted {
            profile: profile.to_string(),
            access_key_id: old_key.access_key_id.clone(),
            deleted_at: Utc::now(),
        });

        RotationOutcome::Rotated {
            identity,
            old_key_id: old_key.access_key_id,
            new_key_id: new_key.access_key_id,
        }
    }

    fn fail(&self, profile: &str, error: RotationError) -> RotationOutcome {
        let stage = error.stage();
        error!(stage = ?stage, error = %error, "Rotation failed");
        self.event_bus.publish(RotationEvent::RotationFailed {
            profile: profile.to_string(),
            stage,
            error: error.to_string(),
            failed_at: Utc::now(),
        });
        RotationOutcome::Failed { error }
    }
}

