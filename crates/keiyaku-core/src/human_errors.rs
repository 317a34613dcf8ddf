// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people reviewing contracts.
//
// Every technical error is mapped to a plain sentence with a concrete
// suggestion. Severity drives how the front end presents it.

use crate::error::KeiyakuError;
use crate::types::SUPPORTED_EXTENSIONS;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth another try as-is (engine hiccup, timeout).
    Transient,
    /// The user has to change something (install a tool, fix a setting).
    ActionRequired,
    /// This input will never work.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `KeiyakuError` into a `HumanError`.
pub fn humanize_error(err: &KeiyakuError) -> HumanError {
    match err {
        KeiyakuError::UnsupportedFormat(detail) => HumanError {
            message: "This file type can't be read.".into(),
            suggestion: format!(
                "Use one of: {}. ({detail})",
                SUPPORTED_EXTENSIONS
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            severity: Severity::Permanent,
        },

        KeiyakuError::ExtractionFailed { path, reason } => humanize_extraction(path, reason),

        KeiyakuError::ComparisonFailed(detail) => {
            if detail.contains("timed out") {
                HumanError {
                    message: "The comparison took too long.".into(),
                    suggestion: "Large scanned PDFs can take minutes. Try again with a longer timeout or fewer pages.".into(),
                    severity: Severity::Transient,
                }
            } else {
                HumanError {
                    message: "The two documents couldn't be compared.".into(),
                    suggestion: format!("Try again; if it keeps happening, please report it. ({detail})"),
                    severity: Severity::Transient,
                }
            }
        }

        KeiyakuError::Pdf(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged or encrypted. Try re-exporting it as PDF.".into(),
            severity: Severity::Permanent,
        },

        KeiyakuError::Image(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "Try saving it as PNG or JPEG and upload it again.".into(),
            severity: Severity::Permanent,
        },

        KeiyakuError::Ocr(detail) => humanize_engine("tesseract", detail),

        KeiyakuError::Office(_) => HumanError {
            message: "This Word or Excel file couldn't be opened.".into(),
            suggestion: "Only .docx, .xlsx and .xls are supported. Re-save older .doc files as .docx.".into(),
            severity: Severity::Permanent,
        },

        KeiyakuError::Config(detail) => HumanError {
            message: "The configuration is invalid.".into(),
            suggestion: format!("Fix the setting and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        KeiyakuError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Choose the file again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "No permission to read that file.".into(),
                suggestion: "Check the file permissions or copy it somewhere readable first.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                severity: Severity::Transient,
            },
        },

        KeiyakuError::Serialization(_) => HumanError {
            message: "A settings or result file is malformed.".into(),
            suggestion: "Check that the configuration file is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Extraction failures wrap the underlying cause as text; pick the message
/// from what the cause says.
fn humanize_extraction(path: &str, reason: &str) -> HumanError {
    let lower = reason.to_ascii_lowercase();

    if lower.contains("pdftoppm") {
        humanize_engine("pdftoppm", reason)
    } else if lower.contains("tesseract") {
        humanize_engine("tesseract", reason)
    } else if lower.contains("timed out") {
        HumanError {
            message: format!("Reading {path} took too long."),
            suggestion: "Scanned documents with many pages are slow to recognise. Try again with a longer timeout.".into(),
            severity: Severity::Transient,
        }
    } else if lower.contains("encrypt") || lower.contains("password") {
        HumanError {
            message: format!("{path} is password protected."),
            suggestion: "Remove the password and save a new copy, then try again.".into(),
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: format!("Text couldn't be read from {path}."),
            suggestion: format!("The file may be damaged. Open it on a computer to check it. (Detail: {reason})"),
            severity: Severity::Permanent,
        }
    }
}

fn humanize_engine(engine: &str, detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();
    if lower.contains("not found") || lower.contains("no such file") || lower.contains("failed to start") {
        HumanError {
            message: format!("The {engine} program isn't installed."),
            suggestion: format!(
                "Install {engine} (with the Japanese language pack for tesseract) or point the configuration at it."
            ),
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Text recognition didn't work on this scan.".into(),
            suggestion: "Try scanning again at a higher resolution with even lighting.".into(),
            severity: Severity::Transient,
        }
    }
}
