// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// keiyaku-document — Text extraction for the Keiyaku contract comparer.
//
// Provides the extraction dispatcher, PDF text layer reading and rasterization,
// OCR engines with their scan preprocessing pipeline, and Word/Excel walkers.

pub mod dispatch;
pub mod office;
pub mod pdf;
pub mod scan;

// Re-export the primary types so callers can use `keiyaku_document::Extractor` etc.
pub use dispatch::{Extractor, page_marker, text_layer_len};
pub use pdf::{LopdfTextLayer, PageRasterizer, PdfReader, PdfTextLayer, PdftoppmRasterizer};
pub use scan::{OcrEngine, ScanPreprocessor, TesseractEngine, preprocess_for_ocr};

#[cfg(feature = "ocrs")]
pub use scan::{OcrsEngine, OcrsModels};
