// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: source documents, extraction results, and the highlight
// segments produced by a comparison.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KeiyakuError, Result};
use crate::integrity::hash_bytes;

/// Every file extension the extraction dispatcher accepts (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: [&str; 10] = [
    "pdf", "jpg", "jpeg", "png", "tiff", "tif", "bmp", "docx", "xlsx", "xls",
];

/// Declared input format, derived from the file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Image,
    Word,
    Excel,
}

impl DocumentFormat {
    /// Infer the declared format from a file extension (with or without the
    /// leading dot, any case).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" | "tiff" | "tif" | "bmp" => Some(Self::Image),
            "docx" => Some(Self::Word),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Format tag as used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Word => "word",
            Self::Excel => "excel",
        }
    }
}

/// The extraction strategy that actually ran for a document.
///
/// PDFs resolve to either [`DetectedKind::TextPdf`] or
/// [`DetectedKind::ImagePdf`] depending on their content, so this can differ
/// from what the declared [`DocumentFormat`] alone would suggest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectedKind {
    TextPdf,
    ImagePdf,
    ImageFile,
    WordDoc,
    ExcelDoc,
}

impl DetectedKind {
    /// Human-readable label shown next to the extracted text.
    pub fn label(&self, extension: &str) -> String {
        let upper = extension.trim_start_matches('.').to_ascii_uppercase();
        match self {
            Self::TextPdf => "Text PDF".to_string(),
            Self::ImagePdf => "Image PDF".to_string(),
            Self::ImageFile => format!("Image file (.{upper})"),
            Self::WordDoc => "Word document (.docx)".to_string(),
            Self::ExcelDoc => format!("Excel workbook (.{upper})"),
        }
    }

    /// Whether the text was produced by optical character recognition.
    pub fn used_ocr(&self) -> bool {
        matches!(self, Self::ImagePdf | Self::ImageFile)
    }
}

/// Immutable handle to one input file.
///
/// Owned by the extraction call that consumes it; the bytes are never
/// retained past that call.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    extension: String,
    format: DocumentFormat,
    bytes: Vec<u8>,
    fingerprint: String,
}

impl SourceDocument {
    /// Open a file from disk.
    ///
    /// The extension is checked before the file is read, so an unsupported
    /// file fails with [`KeiyakuError::UnsupportedFormat`] without any I/O.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let (extension, format) = classify(&name)?;
        let bytes = std::fs::read(path).map_err(|err| KeiyakuError::ExtractionFailed {
            path: name.clone(),
            reason: format!("cannot read file: {err}"),
        })?;
        Ok(Self::assemble(name, extension, format, bytes))
    }

    /// Wrap bytes already in memory (e.g. an upload) under the given file name.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let (extension, format) = classify(&name)?;
        Ok(Self::assemble(name, extension, format, bytes))
    }

    fn assemble(name: String, extension: String, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        let fingerprint = hash_bytes(&bytes);
        Self {
            name,
            extension,
            format,
            bytes,
            fingerprint,
        }
    }

    /// File name or path the document was created from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 of the file bytes, lowercase hex.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Split off and validate the extension of a file name.
fn classify(name: &str) -> Result<(String, DocumentFormat)> {
    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match DocumentFormat::from_extension(&extension) {
        Some(format) if !extension.is_empty() => Ok((extension, format)),
        _ => Err(KeiyakuError::UnsupportedFormat(format!(
            "'.{}' (supported: {})",
            extension,
            SUPPORTED_EXTENSIONS
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Text pulled out of one document, plus which strategy produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub raw_text: String,
    pub detected_kind: DetectedKind,
    /// Display label, e.g. "Image file (.PNG)".
    pub kind_label: String,
    /// Pages read (PDF paths only).
    pub page_count: Option<usize>,
}

impl ExtractionResult {
    pub fn new(
        raw_text: String,
        detected_kind: DetectedKind,
        extension: &str,
        page_count: Option<usize>,
    ) -> Self {
        Self {
            kind_label: detected_kind.label(extension),
            raw_text,
            detected_kind,
            page_count,
        }
    }

    /// Number of Unicode scalar values in the extracted text.
    pub fn char_count(&self) -> usize {
        self.raw_text.chars().count()
    }
}

/// Visual treatment of one highlighted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Present unchanged on both sides.
    Normal,
    /// Only on the left (document A).
    Delete,
    /// Only on the right (document B).
    Insert,
    /// Paired with a line on the other side; content carries inline markers.
    Change,
}

/// One render-ready line of a comparison result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSegment {
    pub kind: SegmentKind,
    pub content: String,
}

impl HighlightSegment {
    pub fn new(kind: SegmentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn normal(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Normal, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_extension_has_a_format() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(
                DocumentFormat::from_extension(ext).is_some(),
                "extension {ext} should map to a format"
            );
        }
    }

    #[test]
    fn extension_lookup_ignores_case_and_dot() {
        assert_eq!(DocumentFormat::from_extension(".PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("Tif"), Some(DocumentFormat::Image));
        assert_eq!(DocumentFormat::from_extension("XLS"), Some(DocumentFormat::Excel));
        assert_eq!(DocumentFormat::from_extension("doc"), None);
    }

    #[test]
    fn txt_is_unsupported() {
        let err = SourceDocument::from_bytes("notes.txt", b"hello".to_vec()).unwrap_err();
        match err {
            KeiyakuError::UnsupportedFormat(detail) => {
                assert!(detail.contains(".txt"), "got {detail}");
                assert!(detail.contains(".docx"), "supported list missing: {detail}");
            }
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn missing_extension_is_unsupported() {
        assert!(matches!(
            SourceDocument::from_bytes("README", Vec::new()),
            Err(KeiyakuError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn open_rejects_before_reading() {
        // The file does not exist; an I/O error here would mean we read first.
        let err = SourceDocument::open("/nonexistent/contract.txt").unwrap_err();
        assert!(matches!(err, KeiyakuError::UnsupportedFormat(_)));
    }

    #[test]
    fn source_document_records_extension_and_fingerprint() {
        let doc = SourceDocument::from_bytes("Scan_01.JPG", b"hello".to_vec()).unwrap();
        assert_eq!(doc.extension(), "jpg");
        assert_eq!(doc.format(), DocumentFormat::Image);
        assert_eq!(
            doc.fingerprint(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn kind_labels() {
        assert_eq!(DetectedKind::ImageFile.label("png"), "Image file (.PNG)");
        assert_eq!(DetectedKind::ExcelDoc.label(".xls"), "Excel workbook (.XLS)");
        assert_eq!(DetectedKind::TextPdf.label("pdf"), "Text PDF");
        assert!(DetectedKind::ImagePdf.used_ocr());
        assert!(!DetectedKind::WordDoc.used_ocr());
    }

    #[test]
    fn segment_kind_serializes_lowercase() {
        let json = serde_json::to_string(&HighlightSegment::normal("第1条")).unwrap();
        assert_eq!(json, r#"{"kind":"normal","content":"第1条"}"#);
    }
}
