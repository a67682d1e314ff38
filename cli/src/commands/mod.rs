// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the aws-rekey CLI

pub mod rotate;

pub use self::rotate::{OutputFormat, RotateOptions};
