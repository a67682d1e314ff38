// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// AWS IAM Adapter
//
// Anti-Corruption Layer for the AWS IAM API. Each client is built from a
// single profile's static key pair so lookups and mutations always act as
// that profile's user and never pick up ambient credentials.

use async_trait::async_trait;
use aws_sdk_iam::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::Client;
use std::sync::Arc;
use tracing::debug;

use crate::domain::credentials::{AccessKey, Identity};
use crate::domain::identity_service::{
    IdentityService, IdentityServiceError, IdentityServiceFactory,
};

/// IAM is a global service; requests are signed for us-east-1
pub const DEFAULT_REGION: &str = "us-east-1";

const CREDENTIALS_PROVIDER_NAME: &str = "aws-rekey-profile";

/// Builds IAM clients scoped to one profile's credentials
#[derive(Debug, Clone)]
pub struct AwsIamServiceFactory {
    region: String,
    endpoint_url: Option<String>,
}

impl AwsIamServiceFactory {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
        }
    }

    /// Send requests to a custom IAM endpoint (e.g. a local emulator)
    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }
}

impl Default for AwsIamServiceFactory {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl IdentityServiceFactory for AwsIamServiceFactory {
    fn scoped(&self, credentials: &AccessKey) -> Arc<dyn IdentityService> {
        let static_credentials = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None, // session token
            None, // expiration
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut builder = aws_sdk_iam::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(static_credentials);
        if let Some(endpoint_url) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint_url.clone());
        }

        Arc::new(AwsIamService {
            client: Client::from_conf(builder.build()),
        })
    }
}

/// IAM client authenticated as a single access key
pub struct AwsIamService {
    client: Client,
}

#[async_trait]
impl IdentityService for AwsIamService {
    async fn get_current_identity(&self) -> Result<Identity, IdentityServiceError> {
        let output = self
            .client
            .get_user()
            .send()
            .await
            .map_err(|e| IdentityServiceError::Service(DisplayErrorContext(&e).to_string()))?;

        let user = output.user().ok_or_else(|| {
            IdentityServiceError::MalformedResponse("GetUser returned no user".to_string())
        })?;

        debug!(user_name = %user.user_name(), "Resolved IAM user");
        Ok(Identity::new(user.user_name()))
    }

    async fn create_access_key(&self, identity: &Identity) -> Result<AccessKey, IdentityServiceError> {
        let output = self
            .client
            .create_access_key()
            .user_name(&identity.user_name)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                let quota_hit = e
                    .as_service_error()
                    .map(|se| se.is_limit_exceeded_exception())
                    .unwrap_or(false);
                if quota_hit {
                    IdentityServiceError::LimitExceeded(message)
                } else {
                    IdentityServiceError::Service(message)
                }
            })?;

        let key = output.access_key().ok_or_else(|| {
            IdentityServiceError::MalformedResponse(
                "CreateAccessKey returned no access key".to_string(),
            )
        })?;

        Ok(AccessKey::new(key.access_key_id(), key.secret_access_key()))
    }

    async fn delete_access_key(
        &self,
        identity: &Identity,
        access_key_id: &str,
    ) -> Result<(), IdentityServiceError> {
        self.client
            .delete_access_key()
            .user_name(&identity.user_name)
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| IdentityServiceError::Service(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
