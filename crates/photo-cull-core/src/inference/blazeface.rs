//! `BlazeFace` face detection network.
//!
//! Architecture from "`BlazeFace`: Sub-millisecond Neural Face Detection on
//! Mobile GPUs", with weight names following
//! <https://github.com/hollance/BlazeFace-PyTorch>. Photos are letterboxed to
//! the square network input so faces in landscape and portrait frames keep
//! their proportions.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use std::collections::VecDeque;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

use super::runtime::sigmoid;
use crate::domain::Region;

/// Input image size for `BlazeFace`.
pub const INPUT_SIZE: usize = 128;

/// Number of anchor boxes (detections).
const NUM_ANCHORS: usize = 896;

/// Detection thresholds.
#[derive(Debug, Clone, Copy)]
pub struct BlazeFaceConfig {
    /// Minimum face confidence (0.0-1.0).
    pub score_threshold: f32,
    /// Overlap above which the weaker of two detections is dropped.
    pub nms_threshold: f32,
}

impl Default for BlazeFaceConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.75,
            nms_threshold: 0.3,
        }
    }
}

/// A detected face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetection {
    /// `[x_min, y_min, x_max, y_max]` normalized to the source frame.
    pub bbox: [f32; 4],
    /// Detection confidence score.
    pub score: f32,
}

impl FaceDetection {
    /// Converts the normalized box to pixels of a `width x height` frame.
    ///
    /// Returns `None` if the box is empty after rounding.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn to_region(&self, width: u32, height: u32) -> Option<Region> {
        let (w, h) = (width as f32, height as f32);
        let x_min = (self.bbox[0] * w).floor().max(0.0);
        let y_min = (self.bbox[1] * h).floor().max(0.0);
        let x_max = (self.bbox[2] * w).ceil().min(w);
        let y_max = (self.bbox[3] * h).ceil().min(h);
        if x_max <= x_min || y_max <= y_min {
            return None;
        }
        Some(Region::new(
            x_min as u32,
            y_min as u32,
            (x_max - x_min) as u32,
            (y_max - y_min) as u32,
        ))
    }
}

/// Placement of the source frame inside the square network input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Horizontal padding as a fraction of the input side.
    pub pad_x: f32,
    /// Vertical padding as a fraction of the input side.
    pub pad_y: f32,
    /// Frame width as a fraction of the input side.
    pub scale_x: f32,
    /// Frame height as a fraction of the input side.
    pub scale_y: f32,
}

impl Letterbox {
    /// Fits a `width x height` frame into the square input, centred.
    #[must_use]
    pub fn fit(width: u32, height: u32) -> Self {
        let longest = width.max(height).max(1) as f32;
        let scale_x = width as f32 / longest;
        let scale_y = height as f32 / longest;
        Self {
            pad_x: (1.0 - scale_x) / 2.0,
            pad_y: (1.0 - scale_y) / 2.0,
            scale_x,
            scale_y,
        }
    }

    /// Maps a normalized input-space box back to the source frame.
    #[must_use]
    pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
        [
            ((bbox[0] - self.pad_x) / self.scale_x).clamp(0.0, 1.0),
            ((bbox[1] - self.pad_y) / self.scale_y).clamp(0.0, 1.0),
            ((bbox[2] - self.pad_x) / self.scale_x).clamp(0.0, 1.0),
            ((bbox[3] - self.pad_y) / self.scale_y).clamp(0.0, 1.0),
        ]
    }
}

/// `BlazeBlock` - the core building block of `BlazeFace`.
///
/// Uses depthwise separable convolution with optional stride.
/// Note: This implementation uses biased convolutions (BatchNorm folded in)
/// to match the pretrained hollance/BlazeFace-PyTorch weights.
struct BlazeBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    channel_pad: usize,
    stride: usize,
}

impl BlazeBlock {
    #[allow(clippy::similar_names)]
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let padding = if stride == 2 {
            0
        } else {
            (kernel_size - 1) / 2
        };

        // Depthwise convolution (with bias - BatchNorm folded in)
        let depthwise = conv2d(
            in_channels,
            in_channels,
            kernel_size,
            Conv2dConfig {
                stride,
                padding,
                groups: in_channels,
                dilation: 1,
            },
            vb.pp("depthwise"),
        )?;

        // Pointwise convolution (with bias - BatchNorm folded in)
        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;

        let channel_pad = out_channels.saturating_sub(in_channels);

        Ok(Self {
            depthwise,
            pointwise,
            channel_pad,
            stride,
        })
    }
}

impl Module for BlazeBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // Pad input for stride=2 (asymmetric padding)
        let x_padded = if self.stride == 2 {
            x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?
        } else {
            x.clone()
        };

        // Depthwise + ReLU (bias included, no BatchNorm)
        let h = self.depthwise.forward(&x_padded)?;
        let h = h.relu()?;

        // Pointwise (bias included, no BatchNorm)
        let h = self.pointwise.forward(&h)?;

        // Residual connection
        let residual = if self.stride == 2 {
            // Max pool for spatial downsampling
            let pool_size = 2;
            x.max_pool2d(pool_size)?
        } else {
            x.clone()
        };

        // Pad channels if needed
        let residual = if self.channel_pad > 0 {
            residual.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            residual
        };

        // Add residual and apply ReLU
        (h + residual)?.relu()
    }
}

/// `BlazeFace` face detection model.
///
/// Weights are read-only after construction, so one instance serves every
/// worker thread.
pub struct BlazeFace {
    // Initial convolution (with bias, no BatchNorm)
    conv0: Conv2d,

    // Backbone 1 (produces 16x16 feature map)
    backbone1: Vec<BlazeBlock>,

    // Backbone 2 (produces 8x8 feature map)
    backbone2: Vec<BlazeBlock>,

    // Detection heads for 16x16
    classifier_16: Conv2d,
    regressor_16: Conv2d,

    // Detection heads for 8x8
    classifier_8: Conv2d,
    regressor_8: Conv2d,

    // Anchor boxes
    anchors: Tensor,

    config: BlazeFaceConfig,
    device: Device,
}

impl BlazeFace {
    /// Creates a new `BlazeFace` model from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights cannot be loaded or are invalid.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder, config: BlazeFaceConfig) -> Result<Self> {
        let device = vb.device().clone();

        // Initial 5x5 conv: 3 -> 24 channels, stride 2 (with bias, no BatchNorm)
        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                padding: 0,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        // Backbone 1: 128 -> 64 -> 32 -> 16 -> 8 (produces 88 channels at 8x8 after all strides)
        // Input: 64x64 after initial conv, two stride-2 blocks reduce to 16x16
        let backbone1_config = [
            (24, 24, 3, 1),
            (24, 28, 3, 1),
            (28, 32, 3, 2), // stride 2: 64x64 -> 32x32
            (32, 36, 3, 1),
            (36, 42, 3, 1),
            (42, 48, 3, 2), // stride 2: 32x32 -> 16x16
            (48, 56, 3, 1),
            (56, 64, 3, 1),
            (64, 72, 3, 1),
            (72, 80, 3, 1),
            (80, 88, 3, 1),
        ];

        let mut backbone1 = Vec::new();
        for (i, (in_c, out_c, k, s)) in backbone1_config.iter().enumerate() {
            let block = BlazeBlock::new(*in_c, *out_c, *k, *s, &vb.pp(format!("backbone1.{i}")))?;
            backbone1.push(block);
        }

        // Backbone 2: produces 96 channels at 8x8
        let backbone2_config = [
            (88, 96, 3, 2), // stride 2: 16x16 -> 8x8
            (96, 96, 3, 1),
            (96, 96, 3, 1),
            (96, 96, 3, 1),
            (96, 96, 3, 1),
        ];

        let mut backbone2 = Vec::new();
        for (i, (in_c, out_c, k, s)) in backbone2_config.iter().enumerate() {
            let block = BlazeBlock::new(*in_c, *out_c, *k, *s, &vb.pp(format!("backbone2.{i}")))?;
            backbone2.push(block);
        }

        // Detection heads for 16x16 (512 anchors, 2 per location)
        let classifier_16 =
            conv2d(88, 2, 1, Conv2dConfig::default(), vb.pp("classifier_16"))?;
        let regressor_16 =
            conv2d(88, 32, 1, Conv2dConfig::default(), vb.pp("regressor_16"))?;

        // Detection heads for 8x8 (384 anchors, 6 per location)
        let classifier_8 =
            conv2d(96, 6, 1, Conv2dConfig::default(), vb.pp("classifier_8"))?;
        let regressor_8 = conv2d(96, 96, 1, Conv2dConfig::default(), vb.pp("regressor_8"))?;

        // Generate anchor boxes
        let anchors = Self::generate_anchors(&device)?;

        Ok(Self {
            conv0,
            backbone1,
            backbone2,
            classifier_16,
            regressor_16,
            classifier_8,
            regressor_8,
            anchors,
            config,
            device,
        })
    }

    /// Generates anchor boxes for the two feature map scales.
    fn generate_anchors(device: &Device) -> Result<Tensor> {
        let mut anchors = Vec::with_capacity(NUM_ANCHORS * 4);

        // 16x16 feature map: 2 anchors per location = 512 anchors
        for y in 0..16_u8 {
            for x in 0..16_u8 {
                for _ in 0..2 {
                    let cx = (f32::from(x) + 0.5) / 16.0;
                    let cy = (f32::from(y) + 0.5) / 16.0;
                    anchors.extend_from_slice(&[cx, cy, 1.0, 1.0]);
                }
            }
        }

        // 8x8 feature map: 6 anchors per location = 384 anchors
        for y in 0..8_u8 {
            for x in 0..8_u8 {
                for _ in 0..6 {
                    let cx = (f32::from(x) + 0.5) / 8.0;
                    let cy = (f32::from(y) + 0.5) / 8.0;
                    anchors.extend_from_slice(&[cx, cy, 1.0, 1.0]);
                }
            }
        }

        Tensor::from_vec(anchors, (NUM_ANCHORS, 4), device)
            .context("Failed to create anchors tensor")
    }

    /// Letterboxes an image into the network input tensor.
    ///
    /// Returns a `(1, 3, 128, 128)` tensor normalized to `[-1, 1]` and the
    /// placement needed to map detections back.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor creation fails.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<(Tensor, Letterbox)> {
        let letterbox = Letterbox::fit(image.width(), image.height());
        let side = INPUT_SIZE as f32;
        let fit_w = ((letterbox.scale_x * side).round() as u32).max(1);
        let fit_h = ((letterbox.scale_y * side).round() as u32).max(1);
        let resized = image.resize_exact(fit_w, fit_h, FilterType::Triangle).to_rgb8();

        // Gray padding maps to 0 after normalization.
        let mut canvas = RgbImage::from_pixel(INPUT_SIZE as u32, INPUT_SIZE as u32, Rgb([127, 127, 127]));
        let offset_x = (INPUT_SIZE as u32 - fit_w) / 2;
        let offset_y = (INPUT_SIZE as u32 - fit_h) / 2;
        imageops::replace(&mut canvas, &resized, i64::from(offset_x), i64::from(offset_y));

        let data: Vec<f32> = canvas
            .pixels()
            .flat_map(|p| p.0.map(|c| f32::from(c) / 127.5 - 1.0))
            .collect();

        // HWC -> NCHW
        let tensor = Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))?
            .to_dtype(DType::F32)
            .context("Failed to preprocess image")?;

        // Use the exact placement of the resized frame.
        let letterbox = Letterbox {
            pad_x: offset_x as f32 / side,
            pad_y: offset_y as f32 / side,
            scale_x: fit_w as f32 / side,
            scale_y: fit_h as f32 / side,
        };
        Ok((tensor, letterbox))
    }

    /// Runs face detection on a preprocessed input tensor.
    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        // Initial convolution with asymmetric padding (bias included, no BatchNorm)
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let x = self.conv0.forward(&x)?;
        let x = x.relu()?;

        // Backbone 1
        let mut h = x;
        for block in &self.backbone1 {
            h = block.forward(&h)?;
        }
        let feature_16 = h.clone();

        // Backbone 2
        for block in &self.backbone2 {
            h = block.forward(&h)?;
        }
        let feature_8 = h;

        // Detection heads for 16x16
        let c1 = self.classifier_16.forward(&feature_16)?;
        let c1 = c1.permute((0, 2, 3, 1))?.reshape((1, 512, 1))?;

        let r1 = self.regressor_16.forward(&feature_16)?;
        let r1 = r1.permute((0, 2, 3, 1))?.reshape((1, 512, 16))?;

        // Detection heads for 8x8
        let c2 = self.classifier_8.forward(&feature_8)?;
        let c2 = c2.permute((0, 2, 3, 1))?.reshape((1, 384, 1))?;

        let r2 = self.regressor_8.forward(&feature_8)?;
        let r2 = r2.permute((0, 2, 3, 1))?.reshape((1, 384, 16))?;

        // Concatenate outputs
        let scores = Tensor::cat(&[c1, c2], 1)?;
        let boxes = Tensor::cat(&[r1, r2], 1)?;

        Ok((scores, boxes))
    }

    /// Detects faces in an image.
    ///
    /// Boxes are normalized to the source frame, strongest first.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceDetection>> {
        let (input, letterbox) = self.preprocess(image)?;
        let (scores, boxes) = self.forward(&input)?;
        let detections = self.decode(&scores, &boxes)?;

        Ok(detections
            .into_iter()
            .map(|d| FaceDetection {
                bbox: letterbox.unmap(d.bbox),
                score: d.score,
            })
            .collect())
    }

    /// Decodes raw network output into input-space detections.
    fn decode(&self, scores: &Tensor, boxes: &Tensor) -> Result<Vec<FaceDetection>> {
        let scores = scores.squeeze(0)?.to_vec2::<f32>()?;
        let boxes = boxes.squeeze(0)?.to_vec2::<f32>()?;
        let anchors = self.anchors.to_vec2::<f32>()?;

        let side = INPUT_SIZE as f32;
        let candidates = scores
            .iter()
            .zip(&boxes)
            .zip(&anchors)
            .filter_map(|((score, raw), anchor)| {
                let score = sigmoid(score[0]);
                if score < self.config.score_threshold {
                    return None;
                }
                // Centre offsets and size are in input pixels.
                let cx = anchor[0] + raw[0] / side;
                let cy = anchor[1] + raw[1] / side;
                let w = raw[2] / side;
                let h = raw[3] / side;
                Some(FaceDetection {
                    bbox: [
                        (cx - w / 2.0).clamp(0.0, 1.0),
                        (cy - h / 2.0).clamp(0.0, 1.0),
                        (cx + w / 2.0).clamp(0.0, 1.0),
                        (cy + h / 2.0).clamp(0.0, 1.0),
                    ],
                    score,
                })
            })
            .collect();

        Ok(suppress_overlaps(candidates, self.config.nms_threshold))
    }
}

/// Greedy non-maximum suppression, strongest detection first.
fn suppress_overlaps(mut detections: Vec<FaceDetection>, threshold: f32) -> Vec<FaceDetection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut queue = VecDeque::from(detections);
    let mut keep = Vec::new();

    while let Some(best) = queue.pop_front() {
        queue.retain(|other| iou(&best.bbox, &other.bbox) < threshold);
        keep.push(best);
    }

    keep
}

/// Intersection over Union for two bounding boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);

    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
