// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod credential_store;
pub mod credentials;
pub mod events;
pub mod identity_service;
pub mod profile;
pub mod rotation;
