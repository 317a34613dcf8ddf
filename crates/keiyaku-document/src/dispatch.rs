// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction dispatcher — picks the strategy for a document and runs it.
//
// The extension alone decides the family. PDFs then go through a content
// check: a text layer with enough characters is used as-is, anything else is
// rasterized and OCR'd. The fallback only runs one way.

use std::path::Path;

use image::DynamicImage;
use keiyaku_core::integrity::short_fingerprint;
use keiyaku_core::{
    DetectedKind, DocumentFormat, ExtractionResult, ExtractorConfig, KeiyakuError, SourceDocument,
};
use tracing::{debug, info, instrument, warn};

use crate::office::{extract_docx_text, extract_workbook_text};
use crate::pdf::{LopdfTextLayer, PageRasterizer, PdfTextLayer, PdftoppmRasterizer};
use crate::scan::{OcrEngine, TesseractEngine, preprocess_for_ocr};

/// Page header inserted before each page's text.
pub fn page_marker(page_number: usize) -> String {
    format!("\n--- Page {page_number} ---\n")
}

/// Number of characters the text layer holds, ignoring surrounding
/// whitespace on each page.
pub fn text_layer_len(pages: &[String]) -> usize {
    pages.iter().map(|page| page.trim().chars().count()).sum()
}

/// The strategy a document resolved to, carrying whatever was already read
/// while deciding.
enum Strategy {
    TextPdf(Vec<String>),
    ImagePdf,
    ImageFile,
    WordDoc,
    ExcelDoc,
}

impl Strategy {
    fn kind(&self) -> DetectedKind {
        match self {
            Self::TextPdf(_) => DetectedKind::TextPdf,
            Self::ImagePdf => DetectedKind::ImagePdf,
            Self::ImageFile => DetectedKind::ImageFile,
            Self::WordDoc => DetectedKind::WordDoc,
            Self::ExcelDoc => DetectedKind::ExcelDoc,
        }
    }
}

/// Turns supported documents into raw text.
///
/// Holds no per-document state; one extractor can serve any number of calls.
pub struct Extractor {
    config: ExtractorConfig,
    text_layer: Box<dyn PdfTextLayer>,
    rasterizer: Box<dyn PageRasterizer>,
    ocr: Box<dyn OcrEngine>,
}

impl Extractor {
    // -- Construction ---------------------------------------------------------

    /// Extractor with the default engines (lopdf, pdftoppm, tesseract)
    /// configured from `config`.
    pub fn new(config: ExtractorConfig) -> Result<Self, KeiyakuError> {
        config.validate()?;
        Ok(Self {
            text_layer: Box::new(LopdfTextLayer),
            rasterizer: Box::new(PdftoppmRasterizer::new(&config)),
            ocr: Box::new(TesseractEngine::new(&config)),
            config,
        })
    }

    pub fn with_text_layer(mut self, text_layer: impl PdfTextLayer + 'static) -> Self {
        self.text_layer = Box::new(text_layer);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: impl PageRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    pub fn with_ocr(mut self, ocr: impl OcrEngine + 'static) -> Self {
        self.ocr = Box::new(ocr);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    // -- Extraction -----------------------------------------------------------

    /// Read a file from disk and extract it.
    ///
    /// Unsupported extensions fail before the file is opened.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn extract_path(&self, path: impl AsRef<Path>) -> Result<ExtractionResult, KeiyakuError> {
        let document = SourceDocument::open(path)?;
        self.extract(&document)
    }

    /// Extract a document already in memory.
    ///
    /// Every failure past the format check is reported as
    /// [`KeiyakuError::ExtractionFailed`] naming the document.
    #[instrument(skip_all, fields(
        name = %document.name(),
        format = document.format().as_str(),
        fingerprint = short_fingerprint(document.fingerprint()),
    ))]
    pub fn extract(&self, document: &SourceDocument) -> Result<ExtractionResult, KeiyakuError> {
        let strategy = self.resolve(document);
        let kind = strategy.kind();
        debug!(kind = ?kind, "Strategy resolved");

        let (raw_text, page_count) = self
            .run(strategy, document)
            .map_err(|err| err.for_file(document.name()))?;

        let result = ExtractionResult::new(raw_text, kind, document.extension(), page_count);
        info!(
            kind = %result.kind_label,
            chars = result.char_count(),
            pages = ?result.page_count,
            "Extraction complete"
        );
        Ok(result)
    }

    /// Decide the strategy. Never fails: a PDF whose text layer can't be read
    /// is treated as an image PDF.
    fn resolve(&self, document: &SourceDocument) -> Strategy {
        match document.format() {
            DocumentFormat::Pdf => match self.text_layer.page_texts(document.bytes()) {
                Ok(pages) => {
                    let chars = text_layer_len(&pages);
                    if chars > self.config.text_pdf_threshold {
                        Strategy::TextPdf(pages)
                    } else {
                        debug!(
                            chars,
                            threshold = self.config.text_pdf_threshold,
                            "Text layer too sparse; using OCR"
                        );
                        Strategy::ImagePdf
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Text layer unreadable; using OCR");
                    Strategy::ImagePdf
                }
            },
            DocumentFormat::Image => Strategy::ImageFile,
            DocumentFormat::Word => Strategy::WordDoc,
            DocumentFormat::Excel => Strategy::ExcelDoc,
        }
    }

    fn run(
        &self,
        strategy: Strategy,
        document: &SourceDocument,
    ) -> Result<(String, Option<usize>), KeiyakuError> {
        match strategy {
            Strategy::TextPdf(pages) => {
                let count = pages.len();
                Ok((join_text_pages(&pages), Some(count)))
            }
            Strategy::ImagePdf => {
                let images = self
                    .rasterizer
                    .rasterize(document.bytes(), self.config.raster_dpi)?;
                let count = images.len();
                Ok((self.ocr_pages(&images)?, Some(count)))
            }
            Strategy::ImageFile => {
                let image = image::load_from_memory(document.bytes()).map_err(|err| {
                    KeiyakuError::Image(format!("failed to decode image: {}", err))
                })?;
                Ok((self.recognize(&image)?, None))
            }
            Strategy::WordDoc => Ok((extract_docx_text(document.bytes())?, None)),
            Strategy::ExcelDoc => Ok((
                extract_workbook_text(document.bytes(), document.extension())?,
                None,
            )),
        }
    }

    /// Preprocess then OCR one image.
    fn recognize(&self, image: &DynamicImage) -> Result<String, KeiyakuError> {
        let prepared = preprocess_for_ocr(image, &self.config.preprocess)?;
        self.ocr.recognize(&prepared)
    }

    /// OCR every page exactly once, each under its page marker.
    fn ocr_pages(&self, images: &[DynamicImage]) -> Result<String, KeiyakuError> {
        let mut text = String::new();
        for (index, image) in images.iter().enumerate() {
            let page_number = index + 1;
            debug!(page_number, engine = self.ocr.name(), "Recognising page");
            let page_text = self.recognize(image)?;
            text.push_str(&page_marker(page_number));
            text.push_str(&page_text);
            text.push('\n');
        }
        Ok(text)
    }
}

/// Join text-layer pages under page markers, skipping blank pages. Page
/// numbers keep counting across skipped pages.
fn join_text_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for (index, page_text) in pages.iter().enumerate() {
        if page_text.trim().is_empty() {
            continue;
        }
        text.push_str(&page_marker(index + 1));
        text.push_str(page_text);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_format() {
        assert_eq!(page_marker(3), "\n--- Page 3 ---\n");
    }

    #[test]
    fn text_layer_len_counts_scalars_and_trims() {
        let pages = vec!["  契約書  ".to_string(), "\n\n".to_string(), "ab".to_string()];
        assert_eq!(text_layer_len(&pages), 5);
    }

    #[test]
    fn blank_pages_are_skipped_but_numbered() {
        let pages = vec!["first".to_string(), "   ".to_string(), "third".to_string()];
        assert_eq!(
            join_text_pages(&pages),
            "\n--- Page 1 ---\nfirst\n\n--- Page 3 ---\nthird\n"
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = ExtractorConfig {
            raster_dpi: 5,
            ..ExtractorConfig::default()
        };
        assert!(matches!(Extractor::new(config), Err(KeiyakuError::Config(_))));
    }
}
