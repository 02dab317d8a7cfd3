// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod algorithms;
pub mod reports;
pub mod run;
pub mod seed;
pub mod validate;
