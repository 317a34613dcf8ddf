// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration.
//
// Engine locations and tuning constants are passed explicitly to the
// dispatcher at construction time. Nothing below the binary reads the process
// environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{KeiyakuError, Result};

/// Settings for the extraction dispatcher and its external engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Tesseract executable (name on `PATH` or absolute path).
    pub tesseract_cmd: PathBuf,
    /// Poppler `pdftoppm` executable used to rasterize image-only PDFs.
    pub pdftoppm_cmd: PathBuf,
    /// Tesseract language hint.
    pub ocr_languages: String,
    /// Tesseract page segmentation mode (6 = assume a uniform block of text).
    pub page_segmentation_mode: u8,
    /// Tesseract OCR engine mode (3 = default, whatever is available).
    pub engine_mode: u8,
    /// Keep runs of spaces between words in the OCR output.
    pub preserve_interword_spaces: bool,
    /// Rasterization resolution for the PDF OCR path.
    pub raster_dpi: u32,
    /// A PDF whose text layer holds more than this many characters is
    /// treated as a text PDF; anything else goes through OCR.
    pub text_pdf_threshold: usize,
    /// Image preprocessing applied before every OCR call.
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            ocr_languages: "jpn+eng".to_string(),
            page_segmentation_mode: 6,
            engine_mode: 3,
            preserve_interword_spaces: true,
            raster_dpi: 300,
            text_pdf_threshold: 100,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Command-line arguments passed to tesseract after the input/output
    /// positional arguments.
    pub fn tesseract_args(&self) -> Vec<String> {
        let mut args = vec![
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
            "-l".to_string(),
            self.ocr_languages.clone(),
        ];
        if self.preserve_interword_spaces {
            args.push("-c".to_string());
            args.push("preserve_interword_spaces=1".to_string());
        }
        args
    }

    pub fn validate(&self) -> Result<()> {
        if self.ocr_languages.trim().is_empty() {
            return Err(KeiyakuError::Config("ocr_languages must not be empty".into()));
        }
        if self.page_segmentation_mode > 13 {
            return Err(KeiyakuError::Config(format!(
                "page_segmentation_mode must be 0..=13, got {}",
                self.page_segmentation_mode
            )));
        }
        if self.engine_mode > 3 {
            return Err(KeiyakuError::Config(format!(
                "engine_mode must be 0..=3, got {}",
                self.engine_mode
            )));
        }
        if !(72..=1200).contains(&self.raster_dpi) {
            return Err(KeiyakuError::Config(format!(
                "raster_dpi must be within 72..=1200, got {}",
                self.raster_dpi
            )));
        }
        self.preprocess.validate()
    }
}

/// Parameters of the OCR image preprocessing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Non-local-means filter strength `h`.
    pub denoise_strength: f32,
    /// Side of the square patch compared between pixels (odd).
    pub denoise_template_window: u32,
    /// Side of the square area searched for similar patches (odd).
    pub denoise_search_window: u32,
    /// CLAHE contrast limit, relative to a uniform histogram.
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per axis.
    pub clahe_tile_grid: u32,
    /// Adaptive threshold neighbourhood size (odd).
    pub threshold_block_size: u32,
    /// Constant subtracted from the Gaussian-weighted local mean.
    pub threshold_offset: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denoise_strength: 10.0,
            denoise_template_window: 7,
            denoise_search_window: 21,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
            threshold_block_size: 11,
            threshold_offset: 2.0,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("denoise_template_window", self.denoise_template_window),
            ("denoise_search_window", self.denoise_search_window),
            ("threshold_block_size", self.threshold_block_size),
        ] {
            if value < 3 || value % 2 == 0 {
                return Err(KeiyakuError::Config(format!(
                    "{name} must be an odd number >= 3, got {value}"
                )));
            }
        }
        if self.denoise_template_window > self.denoise_search_window {
            return Err(KeiyakuError::Config(
                "denoise_template_window must not exceed denoise_search_window".into(),
            ));
        }
        for (name, value) in [
            ("denoise_strength", self.denoise_strength),
            ("clahe_clip_limit", self.clahe_clip_limit),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(KeiyakuError::Config(format!(
                    "{name} must be a finite positive number, got {value}"
                )));
            }
        }
        if !self.threshold_offset.is_finite() {
            return Err(KeiyakuError::Config(format!(
                "threshold_offset must be finite, got {}",
                self.threshold_offset
            )));
        }
        if self.clahe_tile_grid == 0 {
            return Err(KeiyakuError::Config("clahe_tile_grid must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tesseract_args() {
        let args = ExtractorConfig::default().tesseract_args();
        assert_eq!(
            args,
            vec![
                "--oem",
                "3",
                "--psm",
                "6",
                "-l",
                "jpn+eng",
                "-c",
                "preserve_interword_spaces=1"
            ]
        );
    }

    #[test]
    fn defaults_validate() {
        assert!(ExtractorConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{ "text_pdf_threshold": 250, "preprocess": { "clahe_tile_grid": 4 } }"#)
                .unwrap();
        assert_eq!(config.text_pdf_threshold, 250);
        assert_eq!(config.raster_dpi, 300);
        assert_eq!(config.preprocess.clahe_tile_grid, 4);
        assert_eq!(config.preprocess.threshold_block_size, 11);
    }

    #[test]
    fn even_window_is_rejected() {
        let config = PreprocessConfig {
            threshold_block_size: 10,
            ..PreprocessConfig::default()
        };
        assert!(matches!(config.validate(), Err(KeiyakuError::Config(_))));
    }

    #[test]
    fn oversized_template_is_rejected() {
        let config = PreprocessConfig {
            denoise_template_window: 23,
            ..PreprocessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_finite_preprocess_numbers_are_rejected() {
        for config in [
            PreprocessConfig {
                denoise_strength: f32::NAN,
                ..PreprocessConfig::default()
            },
            PreprocessConfig {
                clahe_clip_limit: f32::NAN,
                ..PreprocessConfig::default()
            },
            PreprocessConfig {
                clahe_clip_limit: f32::INFINITY,
                ..PreprocessConfig::default()
            },
            PreprocessConfig {
                threshold_offset: f32::NAN,
                ..PreprocessConfig::default()
            },
        ] {
            assert!(
                matches!(config.validate(), Err(KeiyakuError::Config(_))),
                "accepted {config:?}"
            );
        }
    }
}
