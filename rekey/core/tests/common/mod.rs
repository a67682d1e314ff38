// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Test doubles shared by the rotation integration tests.
//!
//! `FakeIam` keeps a user -> active keys table and appends every remote call
//! to a journal shared with `MemoryStore`, so tests can assert on ordering
//! across the service and the store.

#![allow(dead_code)]

use async_trait::async_trait;
use aws_rekey_core::domain::credential_store::{CredentialStore, CredentialStoreError};
use aws_rekey_core::domain::credentials::{AccessKey, Identity};
use aws_rekey_core::domain::identity_service::{
    IdentityService, IdentityServiceError, IdentityServiceFactory,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct IamState {
    /// access key id -> (user, secret)
    keys: HashMap<String, (String, String)>,
    next_key: u32,
    fail_identity: HashSet<String>,
    fail_create: HashSet<String>,
    fail_delete: HashSet<String>,
    scoped_count: usize,
}

#[derive(Clone, Default)]
pub struct FakeIam {
    state: Arc<Mutex<IamState>>,
    journal: Journal,
}

impl FakeIam {
    pub fn new(journal: Journal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    /// Register an existing key for a user
    pub fn add_key(&self, user: &str, key: &AccessKey) {
        self.state.lock().unwrap().keys.insert(
            key.access_key_id.clone(),
            (user.to_string(), key.secret_access_key.clone()),
        );
    }

    pub fn active_keys(&self, user: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut keys: Vec<String> = state
            .keys
            .iter()
            .filter(|(_, (owner, _))| owner == user)
            .map(|(id, _)| id.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn fail_identity_for_key(&self, key_id: &str) {
        self.state.lock().unwrap().fail_identity.insert(key_id.to_string());
    }

    pub fn fail_create_for_user(&self, user: &str) {
        self.state.lock().unwrap().fail_create.insert(user.to_string());
    }

    pub fn fail_delete_for_user(&self, user: &str) {
        self.state.lock().unwrap().fail_delete.insert(user.to_string());
    }

    pub fn scoped_count(&self) -> usize {
        self.state.lock().unwrap().scoped_count
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

impl IdentityServiceFactory for FakeIam {
    fn scoped(&self, credentials: &AccessKey) -> Arc<dyn IdentityService> {
        self.state.lock().unwrap().scoped_count += 1;
        Arc::new(FakeIamSession {
            iam: self.clone(),
            credentials: credentials.clone(),
        })
    }
}

struct FakeIamSession {
    iam: FakeIam,
    credentials: AccessKey,
}

impl FakeIamSession {
    fn record(&self, entry: String) {
        self.iam.journal.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl IdentityService for FakeIamSession {
    async fn get_current_identity(&self) -> Result<Identity, IdentityServiceError> {
        self.record(format!("get_user:{}", self.credentials.access_key_id));
        let state = self.iam.state.lock().unwrap();

        if state.fail_identity.contains(&self.credentials.access_key_id) {
            return Err(IdentityServiceError::Service("RequestExpired".to_string()));
        }

        match state.keys.get(&self.credentials.access_key_id) {
            Some((user, secret)) if *secret == self.credentials.secret_access_key => {
                Ok(Identity::new(user.clone()))
            }
            _ => Err(IdentityServiceError::Service(
                "InvalidClientTokenId".to_string(),
            )),
        }
    }

    async fn create_access_key(&self, identity: &Identity) -> Result<AccessKey, IdentityServiceError> {
        self.record(format!("create_key:{}", identity.user_name));
        let mut state = self.iam.state.lock().unwrap();

        if state.fail_create.contains(&identity.user_name) {
            return Err(IdentityServiceError::Service("ServiceFailure".to_string()));
        }
        let owned = state
            .keys
            .values()
            .filter(|(owner, _)| *owner == identity.user_name)
            .count();
        if owned >= 2 {
            return Err(IdentityServiceError::LimitExceeded(
                "Cannot exceed quota for AccessKeysPerUser: 2".to_string(),
            ));
        }

        state.next_key += 1;
        let key = AccessKey::new(
            format!("AKIANEW{:04}", state.next_key),
            format!("new-secret-{}", state.next_key),
        );
        state.keys.insert(
            key.access_key_id.clone(),
            (identity.user_name.clone(), key.secret_access_key.clone()),
        );
        Ok(key)
    }

    async fn delete_access_key(
        &self,
        identity: &Identity,
        access_key_id: &str,
    ) -> Result<(), IdentityServiceError> {
        self.record(format!("delete_key:{}:{}", identity.user_name, access_key_id));
        let mut state = self.iam.state.lock().unwrap();

        if state.fail_delete.contains(&identity.user_name) {
            return Err(IdentityServiceError::Service("Throttling".to_string()));
        }
        match state.keys.remove(access_key_id) {
            Some(_) => Ok(()),
            None => Err(IdentityServiceError::Service(format!(
                "NoSuchEntity: {}",
                access_key_id
            ))),
        }
    }
}

/// In-memory credential store; `disk` mirrors what the last save wrote
pub struct MemoryStore {
    current: Vec<(String, AccessKey)>,
    disk: Arc<Mutex<Vec<(String, AccessKey)>>>,
    pub fail_saves: bool,
    journal: Journal,
}

impl MemoryStore {
    pub fn new(journal: Journal, profiles: &[(&str, &AccessKey)]) -> Self {
        let current: Vec<(String, AccessKey)> = profiles
            .iter()
            .map(|(name, key)| (name.to_string(), (*key).clone()))
            .collect();
        Self {
            disk: Arc::new(Mutex::new(current.clone())),
            current,
            fail_saves: false,
            journal,
        }
    }

    pub fn saved_key(&self, profile: &str) -> Option<AccessKey> {
        self.disk
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == profile)
            .map(|(_, key)| key.clone())
    }
}

impl CredentialStore for MemoryStore {
    fn access_key(&self, profile: &str) -> Result<AccessKey, CredentialStoreError> {
        self.current
            .iter()
            .find(|(name, _)| name == profile)
            .map(|(_, key)| key.clone())
            .ok_or_else(|| CredentialStoreError::MissingProfile(profile.to_string()))
    }

    fn set_access_key(&mut self, profile: &str, key: &AccessKey) {
        match self.current.iter_mut().find(|(name, _)| name == profile) {
            Some((_, existing)) => *existing = key.clone(),
            None => self.current.push((profile.to_string(), key.clone())),
        }
    }

    fn save_to(&self, path: &Path) -> Result<(), CredentialStoreError> {
        self.journal.lock().unwrap().push("save".to_string());
        if self.fail_saves {
            return Err(CredentialStoreError::Write {
                path: path.to_path_buf(),
                message: "Permission denied (os error 13)".to_string(),
            });
        }
        *self.disk.lock().unwrap() = self.current.clone();
        Ok(())
    }

    fn profiles(&self) -> Vec<String> {
        self.current.iter().map(|(name, _)| name.clone()).collect()
    }
}
