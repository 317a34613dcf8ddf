// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the command line to the extraction and comparison
// crates.

pub mod app_services;
pub mod config;
pub mod report;
pub mod worker;
