// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan preprocessing pipeline: grayscale, non-local-means denoising, CLAHE
// contrast equalization and Gaussian adaptive binarization. Every image is run
// through this before it reaches an OCR engine.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::separable_filter_equal;
use keiyaku_core::{KeiyakuError, PreprocessConfig};
use tracing::{debug, info, instrument};

/// Non-local-means weights below this are dropped entirely.
const NLM_WEIGHT_CUTOFF: f32 = 0.001;

/// Prepares scanned page images for character recognition.
///
/// Each stage consumes the preprocessor and returns a new one, so stages can
/// be chained or run individually. The working image is always 8-bit gray.
pub struct ScanPreprocessor {
    image: GrayImage,
}

impl ScanPreprocessor {
    // -- Construction ---------------------------------------------------------

    /// Create a preprocessor from raw image bytes (JPEG, PNG, TIFF, BMP).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, KeiyakuError> {
        let image = image::load_from_memory(data).map_err(|err| {
            KeiyakuError::Image(format!("failed to decode image: {}", err))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            "Scan image loaded"
        );
        Ok(Self::from_dynamic(&image))
    }

    /// Wrap an existing image, converting it to gray (ITU-R BT.601 weights).
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            image: to_gray_bt601(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageLuma8(self.image)
    }

    // -- Stages ---------------------------------------------------------------

    /// Non-local-means denoising.
    ///
    /// Every pixel becomes a weighted mean of the pixels in a `search_window`
    /// neighbourhood, weighted by how similar the `template_window` patches
    /// around them are: `w = exp(-d / h²)` where `d` is the mean squared patch
    /// difference.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn denoise(self, strength: f32, template_window: u32, search_window: u32) -> Self {
        debug!(strength, template_window, search_window, "Applying non-local-means denoising");
        Self {
            image: non_local_means(&self.image, strength, template_window, search_window),
        }
    }

    /// Contrast-limited adaptive histogram equalization.
    ///
    /// The image is split into a `tile_grid` x `tile_grid` grid; each tile's
    /// histogram is clipped at `clip_limit` times the uniform bin height and
    /// equalized, and pixels are remapped by bilinear interpolation between
    /// the four nearest tile mappings.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn equalize(self, clip_limit: f32, tile_grid: u32) -> Self {
        debug!(clip_limit, tile_grid, "Applying CLAHE");
        Self {
            image: clahe(&self.image, clip_limit, tile_grid),
        }
    }

    /// Adaptive threshold against a Gaussian-weighted local mean.
    ///
    /// A pixel becomes white (255) when it is brighter than the local mean
    /// minus `offset`; otherwise black (0).
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn binarize(self, block_size: u32, offset: f32) -> Self {
        debug!(block_size, offset, "Applying Gaussian adaptive threshold");
        Self {
            image: adaptive_threshold_gaussian(&self.image, block_size, offset),
        }
    }

    /// Run every stage with the parameters from `config`.
    #[instrument(skip_all)]
    pub fn run(self, config: &PreprocessConfig) -> Self {
        info!(
            width = self.image.width(),
            height = self.image.height(),
            "Running OCR preprocessing pipeline"
        );
        self.denoise(
            config.denoise_strength,
            config.denoise_template_window,
            config.denoise_search_window,
        )
        .equalize(config.clahe_clip_limit, config.clahe_tile_grid)
        .binarize(config.threshold_block_size, config.threshold_offset)
    }
}

/// Preprocess one page image for OCR.
///
/// Output has the input's dimensions and contains only the values 0 and 255.
pub fn preprocess_for_ocr(
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<DynamicImage, KeiyakuError> {
    config.validate()?;
    Ok(ScanPreprocessor::from_dynamic(image).run(config).into_dynamic())
}

// -- Grayscale ----------------------------------------------------------------

/// `Y = 0.299 R + 0.587 G + 0.114 B`, rounded. Alpha is ignored.
fn to_gray_bt601(image: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = image {
        return gray.clone();
    }
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        output.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    output
}

// -- Non-local means ----------------------------------------------------------

fn non_local_means(gray: &GrayImage, strength: f32, template_window: u32, search_window: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let (w, h) = (width as i64, height as i64);
    let tr = (template_window / 2) as i64;
    let sr = (search_window / 2) as i64;
    let template = 2 * tr + 1;
    let area = (template * template) as f32;

    // Edge-replicated copy large enough for every patch at every offset.
    let pad = sr + tr;
    let pw = w + 2 * pad;
    let ph = h + 2 * pad;
    let mut padded = vec![0u8; (pw * ph) as usize];
    for py in 0..ph {
        let sy = (py - pad).clamp(0, h - 1) as u32;
        for px in 0..pw {
            let sx = (px - pad).clamp(0, w - 1) as u32;
            padded[(py * pw + px) as usize] = gray.get_pixel(sx, sy).0[0];
        }
    }

    // Weight lookup by patch SSD. Anything past the table is below the cutoff.
    let h2 = strength * strength;
    let max_dist = h2 * -(NLM_WEIGHT_CUTOFF.ln());
    let lut_len = (max_dist * area).ceil() as usize + 1;
    let weights: Vec<f32> = (0..lut_len)
        .map(|ssd| (-(ssd as f32 / area) / h2).exp())
        .collect();

    // Region of image coordinates [-tr, w+tr) x [-tr, h+tr) covered by patches.
    let rw = w + 2 * tr;
    let rh = h + 2 * tr;
    let stride = (rw + 1) as usize;
    let mut integral = vec![0u64; stride * (rh + 1) as usize];

    let pixel_count = (w * h) as usize;
    let mut accum = vec![0f32; pixel_count];
    let mut weight_sum = vec![0f32; pixel_count];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            let shift = dy * pw + dx;

            for ry in 0..rh {
                let mut row_sum = 0u64;
                let base = (ry - tr + pad) * pw + (pad - tr);
                for rx in 0..rw {
                    let a = (base + rx) as usize;
                    let b = (base + rx + shift) as usize;
                    let diff = padded[a] as i32 - padded[b] as i32;
                    row_sum += (diff * diff) as u64;
                    let idx = (ry as usize + 1) * stride + rx as usize + 1;
                    table_set(&mut integral, idx, stride, row_sum);
                }
            }

            let t = template as usize;
            for y in 0..h as usize {
                let top = y * stride;
                let bottom = (y + t) * stride;
                for x in 0..w as usize {
                    let ssd = integral[bottom + x + t] + integral[top + x]
                        - integral[top + x + t]
                        - integral[bottom + x];
                    let ssd = ssd as usize;
                    if ssd >= lut_len {
                        continue;
                    }
                    let weight = weights[ssd];
                    if weight < NLM_WEIGHT_CUTOFF {
                        continue;
                    }
                    let neighbour =
                        padded[((y as i64 + pad + dy) * pw + x as i64 + pad + dx) as usize];
                    let i = y * w as usize + x;
                    accum[i] += weight * neighbour as f32;
                    weight_sum[i] += weight;
                }
            }
        }
    }

    let mut output = GrayImage::new(width, height);
    for (i, pixel) in output.pixels_mut().enumerate() {
        // The zero offset always contributes weight 1.
        let value = accum[i] / weight_sum[i];
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }
    output
}

/// Summed-area table update: `row_sum` plus the entry directly above.
#[inline]
fn table_set(table: &mut [u64], idx: usize, stride: usize, row_sum: u64) {
    table[idx] = row_sum + table[idx - stride];
}

// -- CLAHE --------------------------------------------------------------------

fn clahe(gray: &GrayImage, clip_limit: f32, tile_grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let tiles_x = tile_grid.clamp(1, width) as usize;
    let tiles_y = tile_grid.clamp(1, height) as usize;
    let (w, h) = (width as usize, height as usize);

    // Pixel x belongs to tile floor(x * tiles_x / w).
    let tile_of_x: Vec<usize> = (0..w).map(|x| x * tiles_x / w).collect();
    let tile_of_y: Vec<usize> = (0..h).map(|y| y * tiles_y / h).collect();

    let mut histograms = vec![[0u32; 256]; tiles_x * tiles_y];
    for (x, y, pixel) in gray.enumerate_pixels() {
        let tile = tile_of_y[y as usize] * tiles_x + tile_of_x[x as usize];
        histograms[tile][pixel.0[0] as usize] += 1;
    }

    let luts: Vec<[u8; 256]> = histograms
        .iter_mut()
        .map(|histogram| {
            let tile_area: u32 = histogram.iter().sum();
            clip_histogram(histogram, clip_limit, tile_area);
            equalization_lut(histogram, tile_area)
        })
        .collect();

    let inv_tw = tiles_x as f32 / w as f32;
    let inv_th = tiles_y as f32 / h as f32;
    let last_x = tiles_x as i64 - 1;
    let last_y = tiles_y as i64 - 1;

    let mut output = GrayImage::new(width, height);
    for y in 0..h {
        let tyf = y as f32 * inv_th - 0.5;
        let ty1 = tyf.floor() as i64;
        let ya = tyf - ty1 as f32;
        let ty2 = (ty1 + 1).min(last_y) as usize;
        let ty1 = ty1.max(0) as usize;

        for x in 0..w {
            let txf = x as f32 * inv_tw - 0.5;
            let tx1 = txf.floor() as i64;
            let xa = txf - tx1 as f32;
            let tx2 = (tx1 + 1).min(last_x) as usize;
            let tx1 = tx1.max(0) as usize;

            let v = gray.get_pixel(x as u32, y as u32).0[0] as usize;
            let top = luts[ty1 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                + luts[ty1 * tiles_x + tx2][v] as f32 * xa;
            let bottom = luts[ty2 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                + luts[ty2 * tiles_x + tx2][v] as f32 * xa;
            let value = top * (1.0 - ya) + bottom * ya;
            output.put_pixel(x as u32, y as u32, Luma([value.round().clamp(0.0, 255.0) as u8]));
        }
    }
    output
}

/// Clip bins at `clip_limit` times the uniform height and spread the excess
/// evenly over all bins.
fn clip_histogram(histogram: &mut [u32; 256], clip_limit: f32, tile_area: u32) {
    let limit = ((clip_limit * tile_area as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in histogram.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let per_bin = excess / 256;
    let mut residual = excess % 256;
    for bin in histogram.iter_mut() {
        *bin += per_bin;
    }
    if residual > 0 {
        let step = (256 / residual as usize).max(1);
        for bin in histogram.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }
}

fn equalization_lut(histogram: &[u32; 256], tile_area: u32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if tile_area == 0 {
        return lut;
    }
    let scale = 255.0 / tile_area as f32;
    let mut cumulative = 0u32;
    for (value, &count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[value] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// -- Adaptive threshold -------------------------------------------------------

fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    let kernel = gaussian_kernel(block_size);
    let local_mean = gaussian_local_mean(gray, &kernel);
    let delta = offset.ceil() as i32;

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y).0[0] as i32;
        let binary = if pixel.0[0] as i32 - mean > -delta { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([binary]));
    }
    output
}

/// Normalized 1-D Gaussian with the sigma conventionally derived from the
/// kernel size: `0.3 * ((size - 1) / 2 - 1) + 0.8`.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let radius = (size / 2) as i32;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;
    let raw: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let total: f32 = raw.iter().sum();
    raw.into_iter().map(|k| k / total).collect()
}

/// Gaussian-weighted local mean, via imageproc's separable filter (borders
/// are clamped, i.e. edge pixels replicate).
fn gaussian_local_mean(gray: &GrayImage, kernel: &[f32]) -> GrayImage {
    separable_filter_equal(gray, kernel)
}

// -- Tests --------------------------------------------------------------------
