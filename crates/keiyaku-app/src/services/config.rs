// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extractor configuration loading. This is the only place the process
// environment is consulted.

use std::path::{Path, PathBuf};

use keiyaku_core::ExtractorConfig;
use keiyaku_core::error::Result;
use tracing::{debug, info};

/// Overrides the tesseract executable.
pub const TESSERACT_ENV: &str = "KEIYAKU_TESSERACT";
/// Overrides the pdftoppm executable.
pub const PDFTOPPM_ENV: &str = "KEIYAKU_PDFTOPPM";

/// Load the extractor config from `path` (defaults when absent), apply the
/// environment overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ExtractorConfig> {
    let config = match path {
        Some(path) => read_config_file(path)?,
        None => ExtractorConfig::default(),
    };
    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ExtractorConfig> {
    let data = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&data)?;
    info!(path = %path.display(), "loaded extractor config");
    Ok(config)
}

/// Replace engine paths with any non-empty value `lookup` returns for the
/// override variables.
pub fn apply_env_overrides(
    mut config: ExtractorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ExtractorConfig {
    let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(cmd) = value(TESSERACT_ENV) {
        debug!(env = TESSERACT_ENV, %cmd, "overriding tesseract command");
        config.tesseract_cmd = PathBuf::from(cmd);
    }
    if let Some(cmd) = value(PDFTOPPM_ENV) {
        debug!(env = PDFTOPPM_ENV, %cmd, "overriding pdftoppm command");
        config.pdftoppm_cmd = PathBuf::from(cmd);
    }
    config
}
