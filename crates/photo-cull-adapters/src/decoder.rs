//! Photo decoder adapter: camera raw files through rawloader and bayer,
//! everything else through the image crate.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use bayer::{BayerDepth, Demosaic, RasterDepth, RasterMut, CFA};
use image::{imageops, DynamicImage, RgbImage};
use photo_cull_core::domain::ImageInfo;
use photo_cull_core::ports::RawDecoder;
use rawloader::{RawImage, RawImageData};
use tracing::debug;

use crate::fs::is_raw;

/// Display gamma applied to linear sensor values.
const GAMMA: f32 = 1.0 / 2.2;

/// Decodes raw and raster photos into 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl FileDecoder {
    /// Creates a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RawDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<ImageInfo> {
        let image = if is_raw(path) {
            decode_raw(path)?
        } else {
            image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?
        };
        Ok(ImageInfo::new(path.to_string_lossy(), image))
    }
}

/// Decodes a camera raw file and develops it to 8-bit sRGB-ish RGB.
fn decode_raw(path: &Path) -> Result<DynamicImage> {
    let raw = rawloader::decode_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to decode RAW {}: {e}", path.display()))?;
    debug!(
        make = %raw.clean_make,
        model = %raw.clean_model,
        width = raw.width,
        height = raw.height,
        cfa = %raw.cfa.name,
        "Decoded RAW"
    );

    let samples = to_u16_samples(&raw.data);
    let width = u32::try_from(raw.width).context("RAW width out of range")?;
    let height = u32::try_from(raw.height).context("RAW height out of range")?;

    let linear = if raw.cpp == 3 {
        samples
    } else {
        demosaic(&samples, raw.width, raw.height, &raw.cfa.name)?
    };
    let rgb = develop(&raw, &linear, width, height)?;

    Ok(DynamicImage::ImageRgb8(apply_crops(rgb, raw.crops)))
}

fn to_u16_samples(data: &RawImageData) -> Vec<u16> {
    match data {
        RawImageData::Integer(values) => values.clone(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        RawImageData::Float(values) => values
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * f32::from(u16::MAX)) as u16)
            .collect(),
    }
}

/// Maps a rawloader pattern name to the bayer crate's CFA.
fn cfa_from_name(name: &str) -> Result<CFA> {
    match name {
        "RGGB" => Ok(CFA::RGGB),
        "BGGR" => Ok(CFA::BGGR),
        "GRBG" => Ok(CFA::GRBG),
        "GBRG" => Ok(CFA::GBRG),
        other => anyhow::bail!("Unsupported color filter array: {other}"),
    }
}

/// Linear demosaic of a 2x2 Bayer mosaic into interleaved 16-bit RGB.
fn demosaic(samples: &[u16], width: usize, height: usize, cfa: &str) -> Result<Vec<u16>> {
    let cfa = cfa_from_name(cfa)?;
    let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut output = vec![0u8; width * height * 3 * 2];

    {
        let mut raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output);
        bayer::run_demosaic(
            &mut Cursor::new(&bytes[..]),
            BayerDepth::Depth16LE,
            cfa,
            Demosaic::Linear,
            &mut raster,
        )
        .map_err(|e| anyhow::anyhow!("Demosaic failed: {e:?}"))?;
    }

    Ok(output
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Black level, white balance and gamma on interleaved linear RGB.
fn develop(raw: &RawImage, linear: &[u16], width: u32, height: u32) -> Result<RgbImage> {
    let black = f32::from(raw.blacklevels[0]);
    let white = f32::from(raw.whitelevels[0]);
    let range = (white - black).max(1.0);
    let gains = white_balance(raw.wb_coeffs);

    let pixels: Vec<u8> = linear
        .chunks_exact(3)
        .flat_map(|rgb| {
            [0, 1, 2].map(|c| develop_sample(f32::from(rgb[c]), black, range, gains[c]))
        })
        .collect();

    RgbImage::from_raw(width, height, pixels).context("Developed RAW buffer has the wrong size")
}

/// Per-channel gains normalized to green. Missing coefficients give unit gain.
fn white_balance(coeffs: [f32; 4]) -> [f32; 3] {
    let green = coeffs[1];
    if !green.is_finite() || green <= 0.0 {
        return [1.0; 3];
    }
    [coeffs[0], coeffs[1], coeffs[2]].map(|c| {
        let gain = c / green;
        if gain.is_finite() && gain > 0.0 {
            gain
        } else {
            1.0
        }
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn develop_sample(value: f32, black: f32, range: f32, gain: f32) -> u8 {
    let normalized = ((value - black).max(0.0) / range * gain).clamp(0.0, 1.0);
    (normalized.powf(GAMMA) * 255.0).round() as u8
}

/// Applies the `[top, right, bottom, left]` sensor crop, when it leaves pixels.
fn apply_crops(image: RgbImage, crops: [usize; 4]) -> RgbImage {
    let [top, right, bottom, left] = crops.map(|c| u32::try_from(c).unwrap_or(u32::MAX));
    let width = image.width().saturating_sub(left.saturating_add(right));
    let height = image.height().saturating_sub(top.saturating_add(bottom));
    if width == 0 || height == 0 || (width, height) == image.dimensions() {
        return image;
    }
    imageops::crop_imm(&image, left, top, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_cfa_names() {
        assert!(matches!(cfa_from_name("RGGB"), Ok(CFA::RGGB)));
        assert!(matches!(cfa_from_name("GBRG"), Ok(CFA::GBRG)));
        assert!(cfa_from_name("XTRANS").is_err());
    }

    #[test]
    fn test_white_balance_normalized_to_green() {
        let gains = white_balance([2.0, 1.0, 1.5, f32::NAN]);
        assert!((gains[0] - 2.0).abs() < f32::EPSILON);
        assert!((gains[1] - 1.0).abs() < f32::EPSILON);
        assert!((gains[2] - 1.5).abs() < f32::EPSILON);
        assert_eq!(white_balance([f32::NAN, f32::NAN, f32::NAN, f32::NAN]), [1.0; 3]);
    }

    #[test]
    fn test_develop_sample_levels() {
        assert_eq!(develop_sample(512.0, 512.0, 15872.0, 1.0), 0);
        assert_eq!(develop_sample(16384.0, 512.0, 15872.0, 1.0), 255);
        assert_eq!(develop_sample(100.0, 512.0, 15872.0, 1.0), 0);
        let mid = develop_sample(512.0 + 15872.0 / 4.0, 512.0, 15872.0, 1.0);
        assert!(mid > 128, "gamma lifts midtones, got {mid}");
    }

    #[test]
    fn test_float_samples_scaled() {
        let samples = to_u16_samples(&RawImageData::Float(vec![0.0, 1.0, 2.0]));
        assert_eq!(samples, vec![0, u16::MAX, u16::MAX]);
    }

    #[test]
    fn test_demosaic_flat_field() {
        let samples = vec![1000u16; 8 * 8];
        let Ok(rgb) = demosaic(&samples, 8, 8, "RGGB") else {
            panic!("demosaic failed");
        };
        assert_eq!(rgb.len(), 8 * 8 * 3);
        assert!(rgb.iter().all(|&v| v == 1000));
    }

    #[test]
    fn test_apply_crops() {
        let img = RgbImage::from_pixel(10, 8, Rgb([1, 2, 3]));
        assert_eq!(apply_crops(img.clone(), [1, 2, 1, 2]).dimensions(), (6, 6));
        assert_eq!(apply_crops(img.clone(), [0; 4]).dimensions(), (10, 8));
        assert_eq!(apply_crops(img, [10, 0, 10, 0]).dimensions(), (10, 8));
    }

    #[test]
    fn test_decode_raster_png() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("a.png");
        RgbImage::from_pixel(12, 7, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap_or_else(|e| panic!("{e}"));

        let info = FileDecoder::new().decode(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!((info.width, info.height), (12, 7));
        assert!(info.path.ends_with("a.png"));
    }

    #[test]
    fn test_decode_missing_file() {
        assert!(FileDecoder::new().decode(Path::new("/nonexistent/a.jpg")).is_err());
        assert!(FileDecoder::new().decode(Path::new("/nonexistent/a.cr2")).is_err());
    }
}
