// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word (.docx) text extraction: a streaming walk over `word/document.xml`.

use std::io::{Cursor, Read};

use keiyaku_core::KeiyakuError;
use quick_xml::Reader as XmlReader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, instrument};
use zip::ZipArchive;

const DOC_XML_PATH: &str = "word/document.xml";

/// Body text and tables of a Word document, in the shape they are rendered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocxContent {
    /// Paragraphs outside any table, in document order.
    pub paragraphs: Vec<String>,
    /// Top-level tables: rows of grid cells, each its paragraphs joined by
    /// `\n`. A merged cell fills every grid column it covers, so rows of one
    /// table have equal width.
    pub tables: Vec<Vec<Vec<String>>>,
}

impl DocxContent {
    /// Every body paragraph followed by `\n`, then every table row as
    /// tab-separated cells followed by `\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for paragraph in &self.paragraphs {
            out.push_str(paragraph);
            out.push('\n');
        }
        for table in &self.tables {
            for row in table {
                out.push_str(&row.join("\t"));
                out.push('\n');
            }
        }
        out
    }
}

/// Extract the text of a .docx file.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, KeiyakuError> {
    let content = read_docx(bytes)?;
    debug!(
        paragraphs = content.paragraphs.len(),
        tables = content.tables.len(),
        "Word document parsed"
    );
    Ok(content.render())
}

/// Open the archive and walk its main document part.
pub fn read_docx(bytes: &[u8]) -> Result<DocxContent, KeiyakuError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| KeiyakuError::Office(format!("failed to open docx archive: {err}")))?;

    let mut file = archive
        .by_name(DOC_XML_PATH)
        .map_err(|err| KeiyakuError::Office(format!("docx missing {DOC_XML_PATH}: {err}")))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|err| KeiyakuError::Office(format!("failed to read {DOC_XML_PATH}: {err}")))?;

    walk_document_xml(&xml)
}

/// Collect body paragraphs and top-level tables from WordprocessingML.
///
/// Paragraph text is the concatenation of its `w:t` runs, with `w:tab` as a
/// tab and `w:br`/`w:cr` as a newline. Paragraphs nested inside another
/// paragraph (text boxes) are skipped. Paragraphs of nested tables fold into
/// the enclosing top-level cell. A cell spanning columns (`w:gridSpan`) is
/// repeated once per column, and a vertical merge continuation (`w:vMerge`
/// without `restart`) repeats the text of the cell above it.
pub fn walk_document_xml(xml: &str) -> Result<DocxContent, KeiyakuError> {
    let mut reader = XmlReader::from_str(xml);
    let mut content = DocxContent::default();

    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut in_text = false;
    let mut paragraph = String::new();
    let mut cell: Vec<String> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut grid_span = 1usize;
    let mut merge_continue = false;

    loop {
        let event = reader.read_event().map_err(|err| {
            KeiyakuError::Office(format!(
                "malformed {DOC_XML_PATH} at byte {}: {err}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        content.tables.push(Vec::new());
                    }
                }
                b"tr" if table_depth == 1 => row.clear(),
                b"tc" if table_depth == 1 => {
                    cell.clear();
                    grid_span = 1;
                    merge_continue = false;
                }
                b"p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        paragraph.clear();
                    }
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if paragraph_depth == 1 => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Event::Empty(e) if table_depth == 1 && paragraph_depth == 0 => {
                match e.local_name().as_ref() {
                    b"gridSpan" => {
                        grid_span = attribute_value(&e, b"val")
                            .and_then(|v| v.parse::<usize>().ok())
                            .unwrap_or(1)
                            .max(1);
                    }
                    b"vMerge" => {
                        merge_continue = attribute_value(&e, b"val").as_deref() != Some("restart");
                    }
                    b"p" => cell.push(String::new()),
                    _ => {}
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"p" && paragraph_depth == 0 => {
                // <w:p/>: an empty paragraph.
                if table_depth == 0 {
                    content.paragraphs.push(String::new());
                } else {
                    cell.push(String::new());
                }
            }
            Event::Text(t) if in_text && paragraph_depth == 1 => {
                let text = t.unescape().map_err(|err| {
                    KeiyakuError::Office(format!("bad text in {DOC_XML_PATH}: {err}"))
                })?;
                paragraph.push_str(&text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if paragraph_depth == 1 {
                        let finished = std::mem::take(&mut paragraph);
                        if table_depth == 0 {
                            content.paragraphs.push(finished);
                        } else {
                            cell.push(finished);
                        }
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"tc" if table_depth == 1 => {
                    let column = row.len();
                    let above = content
                        .tables
                        .last()
                        .and_then(|table| table.last())
                        .and_then(|previous| previous.get(column));
                    let text = match above {
                        Some(above) if merge_continue => above.clone(),
                        _ => cell.join("\n"),
                    };
                    row.extend(std::iter::repeat_n(text, grid_span));
                }
                b"tr" if table_depth == 1 => {
                    if let Some(table) = content.tables.last_mut() {
                        table.push(std::mem::take(&mut row));
                    }
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(content)
}

/// Unescaped value of the attribute whose local name is `name`.
fn attribute_value(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}
