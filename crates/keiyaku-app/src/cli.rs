// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Seconds a single request may run before it is abandoned.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Parser)]
#[command(name = "keiyaku")]
#[command(version, about = "Extract text from contracts and compare two versions", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// JSON file with extractor settings (engine paths, OCR options)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Abandon a request after this many seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Directory holding the ocrs detection/recognition models; replaces tesseract
    #[cfg(feature = "ocrs")]
    #[arg(long, global = true)]
    pub ocrs_models: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract the text of one document
    Extract {
        file: PathBuf,

        /// Print the extraction report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare two documents line by line
    Compare {
        file_a: PathBuf,
        file_b: PathBuf,

        /// Print the comparison report as JSON
        #[arg(long)]
        json: bool,

        /// Mark changed characters with [-..-] {+..+} [~..~] instead of HTML spans
        #[arg(long)]
        plain: bool,
    },
    /// List the supported file extensions
    Formats,
}
