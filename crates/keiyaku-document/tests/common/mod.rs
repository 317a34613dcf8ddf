// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures and fake engines for the extraction integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use keiyaku_core::KeiyakuError;
use keiyaku_document::{OcrEngine, PageRasterizer, PdfTextLayer};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// -- Fake engines ---------------------------------------------------------

/// Text layer that returns fixed pages regardless of input.
pub struct FixedTextLayer(pub Vec<String>);

impl PdfTextLayer for FixedTextLayer {
    fn page_texts(&self, _pdf: &[u8]) -> Result<Vec<String>, KeiyakuError> {
        Ok(self.0.clone())
    }
}

/// Text layer that always fails, like a PDF with a damaged xref table.
pub struct BrokenTextLayer;

impl PdfTextLayer for BrokenTextLayer {
    fn page_texts(&self, _pdf: &[u8]) -> Result<Vec<String>, KeiyakuError> {
        Err(KeiyakuError::Pdf("xref table damaged".into()))
    }
}

/// Rasterizer producing `n` small white pages.
pub struct BlankPages(pub usize);

impl PageRasterizer for BlankPages {
    fn rasterize(&self, _pdf: &[u8], _dpi: u32) -> Result<Vec<DynamicImage>, KeiyakuError> {
        Ok((0..self.0)
            .map(|_| DynamicImage::ImageLuma8(GrayImage::from_pixel(24, 24, Luma([250u8]))))
            .collect())
    }
}

/// OCR engine that counts calls and checks it only ever sees binarized input.
#[derive(Clone, Default)]
pub struct CountingOcr {
    pub calls: Arc<AtomicUsize>,
    pub saw_non_binary: Arc<AtomicBool>,
}

impl CountingOcr {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saw_non_binary(&self) -> bool {
        self.saw_non_binary.load(Ordering::SeqCst)
    }
}

impl OcrEngine for CountingOcr {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, KeiyakuError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if image.to_luma8().pixels().any(|p| p.0[0] != 0 && p.0[0] != 255) {
            self.saw_non_binary.store(true, Ordering::SeqCst);
        }
        Ok(format!("認識結果{n}"))
    }
}

// -- PDF fixtures ---------------------------------------------------------

/// A PDF with one Courier text line per page.
pub fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
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
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![40.into(), 760.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

// -- Image fixtures -------------------------------------------------------

/// A noisy synthetic "scan": dark text-like bars on off-white paper.
pub fn synthetic_scan_png() -> Vec<u8> {
    let mut page = RgbImage::from_pixel(64, 48, Rgb([236, 232, 220]));
    for line in 0..4 {
        draw_filled_rect_mut(
            &mut page,
            Rect::at(6, 6 + line * 10).of_size(40 + (line as u32 * 4), 4),
            Rgb([40, 40, 48]),
        );
    }
    let noisy = imageproc::noise::gaussian_noise(&page, 0.0, 12.0, 42);

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(noisy)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// -- Office fixtures ------------------------------------------------------

/// Write a zip archive with the given entries to `dir/name`.
pub fn write_zip(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (entry, body) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

pub fn docx_fixture(dir: &Path, body: &str) -> PathBuf {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );
    write_zip(
        dir,
        "contract.docx",
        &[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
            ),
            ("word/document.xml", &document),
        ],
    )
}

/// A two-sheet workbook: "契約" with a few rows (one of them blank) and an
/// empty sheet "空".
pub fn xlsx_fixture(dir: &Path) -> PathBuf {
    write_zip(
        dir,
        "terms.xlsx",
        &[
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#,
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="契約" sheetId="1" r:id="rId1"/><sheet name="空" sheetId="2" r:id="rId2"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#,
            ),
            (
                "xl/sharedStrings.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="6" uniqueCount="6"><si><t>項目</t></si><si><t>金額</t></si><si><t>報酬</t></si><si><t xml:space="preserve">  </t></si><si><t>消費税率</t></si><si><t>自動更新</t></si></sst>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>1500000</v></c></row><row r="3"><c r="A3" t="s"><v>3</v></c></row><row r="4"><c r="A4" t="s"><v>4</v></c><c r="B4"><f>0.05*2</f><v>0.1</v></c></row><row r="5"><c r="A5" t="s"><v>5</v></c><c r="B5" t="b"><v>1</v></c></row></sheetData></worksheet>"#,
            ),
            (
                "xl/worksheets/sheet2.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#,
            ),
        ],
    )
}
