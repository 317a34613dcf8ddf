// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — OCR preprocessing and text recognition engines.

pub mod enhance;
pub mod ocr;

#[cfg(feature = "ocrs")]
pub mod ocrs_backend;

pub use enhance::{ScanPreprocessor, preprocess_for_ocr};
pub use ocr::{OcrEngine, TesseractEngine};

#[cfg(feature = "ocrs")]
pub use ocrs_backend::{OcrsEngine, OcrsModels};
