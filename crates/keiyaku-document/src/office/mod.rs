// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office documents — Word body/table walking and Excel sheet rendering.

pub mod docx;
pub mod spreadsheet;

pub use docx::{DocxContent, extract_docx_text};
pub use spreadsheet::extract_workbook_text;
