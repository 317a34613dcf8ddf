// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust OCR backend using the `ocrs` crate (neural models run by `rten`).
//
// Only available with the `ocrs` feature. The published ocrs models recognise
// Latin script only, so this backend suits English-language contracts; the
// Tesseract engine remains the default for Japanese.
//
// The engine needs two model files, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to its cache
// directory.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use keiyaku_core::KeiyakuError;

use super::ocr::OcrEngine;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Locations of the two ocrs model files.
#[derive(Debug, Clone)]
pub struct OcrsModels {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl OcrsModels {
    /// Models stored side by side under their well-known file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    fn check(&self) -> Result<(), KeiyakuError> {
        for (what, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(KeiyakuError::Ocr(format!(
                    "{what} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// OCR engine backed by ocrs. Load once, reuse for every page.
pub struct OcrsEngine {
    engine: ocrs::OcrEngine,
}

impl OcrsEngine {
    /// Load both models. This is the expensive step.
    ///
    /// ocrs and rten must be compiled with optimizations; debug builds are
    /// 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %models.detection_model_path.display(),
        recognition = %models.recognition_model_path.display(),
    ))]
    pub fn load(models: &OcrsModels) -> Result<Self, KeiyakuError> {
        models.check()?;

        let load = |path: &PathBuf| {
            Model::load_file(path).map_err(|err| {
                KeiyakuError::Ocr(format!("failed to load model {}: {}", path.display(), err))
            })
        };
        let detection_model = load(&models.detection_model_path)?;
        let recognition_model = load(&models.recognition_model_path)?;

        let engine = ocrs::OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| KeiyakuError::Ocr(format!("failed to initialise ocrs: {}", err)))?;

        info!("ocrs engine ready");
        Ok(Self { engine })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<String, KeiyakuError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            KeiyakuError::Ocr(format!("bad image source ({}x{}): {}", width, height, err))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| KeiyakuError::Ocr(format!("ocrs input preparation failed: {}", err)))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| KeiyakuError::Ocr(format!("ocrs recognition failed: {}", err)))?;

        debug!(lines = text.lines().count(), "ocrs recognition complete");
        Ok(text)
    }
}
