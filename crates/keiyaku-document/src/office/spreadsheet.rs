// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Excel (.xlsx / .xls) text extraction via calamine.

use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

use calamine::{DataType, Range, Reader as CalamineReader, Xls, Xlsx};
use keiyaku_core::KeiyakuError;
use tracing::{debug, instrument, warn};

/// Extract every sheet of an Excel workbook.
///
/// `extension` picks the container: `xls` for the legacy binary format,
/// anything else is read as Office Open XML.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn extract_workbook_text(bytes: &[u8], extension: &str) -> Result<String, KeiyakuError> {
    let cursor = Cursor::new(bytes);
    if extension.eq_ignore_ascii_case("xls") {
        let workbook: Xls<_> = Xls::new(cursor)
            .map_err(|err| KeiyakuError::Office(format!("failed to read xls workbook: {err}")))?;
        render_workbook(workbook)
    } else {
        let workbook: Xlsx<_> = Xlsx::new(cursor)
            .map_err(|err| KeiyakuError::Office(format!("failed to read xlsx workbook: {err}")))?;
        render_workbook(workbook)
    }
}

/// Header written before each sheet's rows.
pub fn sheet_marker(name: &str) -> String {
    format!("\n=== Sheet: {name} ===\n\n")
}

fn render_workbook<RS, R>(mut workbook: R) -> Result<String, KeiyakuError>
where
    RS: Read + Seek,
    R: CalamineReader<RS>,
    R::Error: Display,
{
    let mut out = String::new();
    let sheet_names = workbook.sheet_names();
    for name in &sheet_names {
        out.push_str(&sheet_marker(name));
        match workbook.worksheet_range(name) {
            Some(Ok(range)) => render_sheet(&range, &mut out),
            Some(Err(err)) => {
                return Err(KeiyakuError::Office(format!("failed to read sheet '{name}': {err}")));
            }
            None => warn!(sheet = %name, "Sheet listed but not found; leaving it empty"),
        }
    }
    debug!(sheets = sheet_names.len(), "Workbook rendered");
    Ok(out)
}

/// Append the sheet's non-blank rows, cells joined by tabs.
///
/// Rows start at column A even when the used range starts further right, so
/// leading empty columns show up as leading tabs.
fn render_sheet(range: &Range<DataType>, out: &mut String) {
    let leading_cols = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    for row in range.rows() {
        let cells: Vec<String> = std::iter::repeat_n(String::new(), leading_cols)
            .chain(row.iter().map(cell_text))
            .collect();
        let line = cells.join("\t");
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(&line);
        out.push('\n');
    }
}

/// Display form of one cell's cached value.
pub fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) | DataType::DateTimeIso(s) | DataType::DurationIso(s) => s.clone(),
        DataType::Int(v) => v.to_string(),
        DataType::Float(v) | DataType::Duration(v) => format_number(*v),
        DataType::Bool(true) => "True".to_string(),
        DataType::Bool(false) => "False".to_string(),
        DataType::DateTime(serial) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| format_number(*serial)),
        DataType::Error(e) => e.to_string(),
    }
}

/// Integral values print without a fractional part.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
