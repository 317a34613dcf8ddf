// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engines.
//
// The dispatcher talks to OCR through the `OcrEngine` trait so tests can count
// calls and alternative engines can be swapped in. The default engine shells
// out to Tesseract with the page handed over as PNG on stdin.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::{DynamicImage, ImageFormat};
use keiyaku_core::{ExtractorConfig, KeiyakuError};
use tracing::{debug, instrument, warn};

/// Recognises text in a single preprocessed page image.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Return the recognised text, lines separated by `\n`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, KeiyakuError>;
}

/// Tesseract command-line engine.
///
/// Invoked as `tesseract stdin stdout <args>`; the arguments come from
/// [`ExtractorConfig::tesseract_args`].
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
    args: Vec<String>,
}

impl TesseractEngine {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            args: config.tesseract_args(),
        }
    }

    pub fn command(&self) -> &PathBuf {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<String, KeiyakuError> {
        let png = encode_png(image)?;

        let mut child = Command::new(&self.command)
            .arg("stdin")
            .arg("stdout")
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                KeiyakuError::Ocr(format!(
                    "failed to start tesseract ({}): {}",
                    self.command.display(),
                    err
                ))
            })?;

        // Tesseract reads the whole image before writing anything, so the
        // input can be written in full before collecting output.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };

        let output = child.wait_with_output().map_err(|err| {
            KeiyakuError::Ocr(format!("failed to wait for tesseract: {}", err))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeiyakuError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        if let Err(err) = write_result {
            warn!(error = %err, "Tesseract closed stdin early");
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            png_bytes = png.len(),
            chars = text.chars().count(),
            "Tesseract recognition complete"
        );
        Ok(text)
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, KeiyakuError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).map_err(|err| {
        KeiyakuError::Image(format!("failed to encode page as PNG: {}", err))
    })?;
    Ok(buf.into_inner())
}
