// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Access key rotation for AWS shared credentials profiles.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, the rotation engine, and the adapters it drives

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
