// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF text layer — per-page text extraction from embedded text using the
// `lopdf` crate.

use std::path::Path;

use keiyaku_core::KeiyakuError;
use lopdf::Document;
use tracing::{debug, instrument};

/// Reads the embedded text layer of a PDF, page by page.
pub trait PdfTextLayer: Send + Sync {
    /// Text of every page in page order. A page without text yields an empty
    /// string, so the result always has one entry per page.
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<String>, KeiyakuError>;
}

/// Default text layer backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextLayer;

impl PdfTextLayer for LopdfTextLayer {
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<String>, KeiyakuError> {
        PdfReader::from_bytes(pdf)?.page_texts()
    }
}

/// Read-only view of a loaded PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KeiyakuError> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            KeiyakuError::Pdf(format!("failed to open {}: {}", path_ref.display(), err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Load a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, KeiyakuError> {
        let document = Document::load_mem(data).map_err(|err| {
            KeiyakuError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }

    // -- Text -----------------------------------------------------------------

    /// Text of one page (1-indexed).
    pub fn page_text(&self, page_number: u32) -> Result<String, KeiyakuError> {
        let page_count = self.page_count();
        if page_number == 0 || page_number as usize > page_count {
            return Err(KeiyakuError::Pdf(format!(
                "page {} out of range (document has {} pages)",
                page_number, page_count
            )));
        }
        self.document.extract_text(&[page_number]).map_err(|err| {
            KeiyakuError::Pdf(format!("failed to extract text of page {}: {}", page_number, err))
        })
    }

    /// Text of every page in order. Fails if any single page can't be read.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn page_texts(&self) -> Result<Vec<String>, KeiyakuError> {
        if self.is_encrypted() {
            return Err(KeiyakuError::Pdf("document is encrypted".into()));
        }
        let texts = self
            .document
            .get_pages()
            .keys()
            .map(|&page_number| self.page_text(page_number))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            chars = texts.iter().map(|t| t.chars().count()).sum::<usize>(),
            "Text layer read"
        );
        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a PDF with one Courier text line per page.
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn page_texts_follow_page_order() {
        let pdf = pdf_with_pages(&["Article one", "Article two"]);
        let texts = LopdfTextLayer.page_texts(&pdf).unwrap();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("Article one"), "got {:?}", texts[0]);
        assert!(texts[1].contains("Article two"), "got {:?}", texts[1]);
    }

    #[test]
    fn page_number_out_of_range() {
        let reader = PdfReader::from_bytes(&pdf_with_pages(&["x"])).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert!(reader.page_text(0).is_err());
        assert!(reader.page_text(2).is_err());
    }

    #[test]
    fn garbage_bytes_are_a_pdf_error() {
        assert!(matches!(
            LopdfTextLayer.page_texts(b"definitely not a pdf"),
            Err(KeiyakuError::Pdf(_))
        ));
    }
}
