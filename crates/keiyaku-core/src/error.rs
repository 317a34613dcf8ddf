// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Keiyaku.

use thiserror::Error;

/// Top-level error type for all Keiyaku operations.
///
/// Only the first three variants cross the extraction/comparison boundary.
/// The library-specific variants are raised by individual extractors and are
/// folded into [`KeiyakuError::ExtractionFailed`] by the dispatcher, which
/// knows the offending file.
#[derive(Debug, Error)]
pub enum KeiyakuError {
    // -- Request-level errors --
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("text extraction failed for {path}: {reason}")]
    ExtractionFailed { path: String, reason: String },

    #[error("comparison failed: {0}")]
    ComparisonFailed(String),

    // -- Extractor errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("office document could not be read: {0}")]
    Office(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KeiyakuError {
    /// Wrap an extractor-level error with the identity of the file being read.
    ///
    /// Request-level errors pass through untouched so that an
    /// `UnsupportedFormat` is never relabelled as an extraction failure.
    pub fn for_file(self, path: impl Into<String>) -> Self {
        match self {
            Self::UnsupportedFormat(_)
            | Self::ExtractionFailed { .. }
            | Self::ComparisonFailed(_) => self,
            other => Self::ExtractionFailed {
                path: path.into(),
                reason: other.to_string(),
            },
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KeiyakuError>;
