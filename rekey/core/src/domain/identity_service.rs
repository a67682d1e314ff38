// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identity Service
//!
//! Domain interface for the remote identity and access management API.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-Corruption Layer between the rotation engine and IAM

// Only the three calls a rotation needs are modelled. Transport, signing and
// retries belong to the implementation in infrastructure/aws_iam.rs.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::credentials::{AccessKey, Identity};

/// Remote key-management operations, authenticated as one fixed key pair
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolve the principal the scoped credentials belong to
    async fn get_current_identity(&self) -> Result<Identity, IdentityServiceError>;

    /// Issue a new access key for the identity
    async fn create_access_key(&self, identity: &Identity) -> Result<AccessKey, IdentityServiceError>;

    /// Deactivate and remove an access key of the identity
    async fn delete_access_key(
        &self,
        identity: &Identity,
        access_key_id: &str,
    ) -> Result<(), IdentityServiceError>;
}

/// Builds an [`IdentityService`] scoped to a single profile's credentials.
///
/// The returned service must authenticate with exactly the given key pair and
/// never fall back to ambient credentials.
pub trait IdentityServiceFactory: Send + Sync {
    fn scoped(&self, credentials: &AccessKey) -> Arc<dyn IdentityService>;
}

/// Errors that can occur during identity service calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityServiceError {
    #[error("Access key quota exceeded: {0}")]
    LimitExceeded(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
