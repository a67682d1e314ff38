// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod aws_iam;
pub mod credentials_file;
pub mod event_bus;
