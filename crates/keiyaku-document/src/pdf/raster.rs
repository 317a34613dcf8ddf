// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization for the PDF OCR path, via Poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use keiyaku_core::{ExtractorConfig, KeiyakuError};
use tracing::{debug, info, instrument};

/// Renders every page of a PDF to an image.
pub trait PageRasterizer: Send + Sync {
    /// One image per page, in page order.
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, KeiyakuError>;
}

/// Rasterizer that runs `pdftoppm -r <dpi> -png` in a scratch directory.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    command: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            command: config.pdftoppm_cmd.clone(),
        }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len()))]
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, KeiyakuError> {
        // Removed (with every rendered page) when it goes out of scope.
        let scratch = tempfile::Builder::new().prefix("keiyaku-raster-").tempdir()?;
        let input = scratch.path().join("input.pdf");
        std::fs::write(&input, pdf)?;
        let prefix = scratch.path().join("page");

        let output = Command::new(&self.command)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|err| {
                KeiyakuError::Pdf(format!(
                    "failed to start pdftoppm ({}): {}",
                    self.command.display(),
                    err
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeiyakuError::Pdf(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pages = rendered_pages(scratch.path())?;
        if pages.is_empty() {
            return Err(KeiyakuError::Pdf("pdftoppm produced no pages".into()));
        }
        debug!(pages = pages.len(), "Pages rendered");

        let images = pages
            .iter()
            .map(|(_, path)| {
                image::open(path).map_err(|err| {
                    KeiyakuError::Image(format!("failed to read rendered page {}: {}", path.display(), err))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(pages = images.len(), dpi, "PDF rasterized");
        Ok(images)
    }
}

/// Collect `page-N.png` files in page order.
///
/// pdftoppm zero-pads the page number to the width of the page count
/// (`page-01.png` .. `page-12.png`), so the suffix is parsed rather than
/// sorted as text.
fn rendered_pages(dir: &Path) -> Result<Vec<(u32, PathBuf)>, KeiyakuError> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(number) = page_number(name) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}
