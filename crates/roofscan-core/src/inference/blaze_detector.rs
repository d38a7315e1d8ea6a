//! Multi-class single-shot detector on a `BlazeBlock` backbone.
//!
//! The network is the compact mobile detector layout: a stride-2 stem, two
//! stacks of depthwise separable blocks producing 16x16 and 8x8 feature maps,
//! and 1x1 heads predicting per-class logits and box offsets for 896 anchors
//! (2 per cell on the 16x16 map, 6 per cell on the 8x8 map).

// Tensor shapes and pixel coordinates move between usize, u32 and f32.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{ensure, Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{iou, sigmoid};
use crate::domain::{BoundingBox, Detection};
use crate::ports::ObjectDetector;

/// Side of the square network input.
pub const INPUT_SIZE: usize = 128;

const ANCHORS_16: usize = 16 * 16 * 2;
const ANCHORS_8: usize = 8 * 8 * 6;
const NUM_ANCHORS: usize = ANCHORS_16 + ANCHORS_8;

/// Detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Class labels, in head output order.
    pub labels: Vec<String>,
    /// Minimum class probability for a candidate box.
    pub score_threshold: f32,
    /// Overlap above which a lower-scoring box of the same class is dropped.
    pub nms_threshold: f32,
    /// Upper bound on detections per image.
    pub max_detections: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            labels: ["debris", "vent", "pipe", "skylight", "chimney", "satellite_dish"]
                .into_iter()
                .map(String::from)
                .collect(),
            score_threshold: 0.5,
            nms_threshold: 0.3,
            max_detections: 20,
        }
    }
}

/// Depthwise separable residual block.
///
/// Convolutions carry biases with batch norm folded in.
struct BlazeBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    channel_pad: usize,
    stride: usize,
}

impl BlazeBlock {
    fn new(in_channels: usize, out_channels: usize, stride: usize, vb: &VarBuilder) -> Result<Self> {
        let depthwise = conv2d(
            in_channels,
            in_channels,
            3,
            Conv2dConfig {
                stride,
                padding: if stride == 2 { 0 } else { 1 },
                groups: in_channels,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;
        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;

        Ok(Self {
            depthwise,
            pointwise,
            channel_pad: out_channels.saturating_sub(in_channels),
            stride,
        })
    }

    fn stack(config: &[(usize, usize, usize)], vb: &VarBuilder) -> Result<Vec<Self>> {
        config
            .iter()
            .enumerate()
            .map(|(i, &(in_c, out_c, stride))| Self::new(in_c, out_c, stride, &vb.pp(i.to_string())))
            .collect()
    }
}

impl Module for BlazeBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (input, shortcut) = if self.stride == 2 {
            (
                x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?,
                x.max_pool2d(2)?,
            )
        } else {
            (x.clone(), x.clone())
        };

        let h = self.depthwise.forward(&input)?.relu()?;
        let h = self.pointwise.forward(&h)?;

        let shortcut = if self.channel_pad > 0 {
            shortcut.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            shortcut
        };
        (h + shortcut)?.relu()
    }
}

/// Candidate box before suppression, in normalized coordinates.
#[derive(Debug, Clone)]
struct Candidate {
    bbox: [f32; 4],
    class: usize,
    score: f32,
}

/// Candle object detector.
pub struct BlazeDetector {
    stem: Conv2d,
    backbone_16: Vec<BlazeBlock>,
    backbone_8: Vec<BlazeBlock>,
    classifier_16: Conv2d,
    regressor_16: Conv2d,
    classifier_8: Conv2d,
    regressor_8: Conv2d,
    anchors: Vec<[f32; 2]>,
    config: DetectorConfig,
    device: Device,
}

impl BlazeDetector {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if `config.labels` is empty or a tensor is missing or
    /// has the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder, config: DetectorConfig) -> Result<Self> {
        ensure!(!config.labels.is_empty(), "Detector needs at least one class label");
        let classes = config.labels.len();
        let device = vb.device().clone();

        let stem = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("stem"),
        )?;

        // 64x64 -> 16x16, ending at 88 channels.
        let backbone_16 = BlazeBlock::stack(
            &[
                (24, 24, 1),
                (24, 28, 1),
                (28, 32, 2),
                (32, 36, 1),
                (36, 42, 1),
                (42, 48, 2),
                (48, 56, 1),
                (56, 64, 1),
                (64, 72, 1),
                (72, 80, 1),
                (80, 88, 1),
            ],
            &vb.pp("backbone_16"),
        )?;
        // 16x16 -> 8x8 at 96 channels.
        let backbone_8 = BlazeBlock::stack(
            &[(88, 96, 2), (96, 96, 1), (96, 96, 1), (96, 96, 1), (96, 96, 1)],
            &vb.pp("backbone_8"),
        )?;

        let head = Conv2dConfig::default();
        let classifier_16 = conv2d(88, 2 * classes, 1, head, vb.pp("classifier_16"))?;
        let regressor_16 = conv2d(88, 2 * 4, 1, head, vb.pp("regressor_16"))?;
        let classifier_8 = conv2d(96, 6 * classes, 1, head, vb.pp("classifier_8"))?;
        let regressor_8 = conv2d(96, 6 * 4, 1, head, vb.pp("regressor_8"))?;

        Ok(Self {
            stem,
            backbone_16,
            backbone_8,
            classifier_16,
            regressor_16,
            classifier_8,
            regressor_8,
            anchors: anchor_centers(),
            config,
            device,
        })
    }

    /// Returns the detector settings.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Resizes to the network input and scales channels to `[-1, 1]` (NCHW).
    fn preprocess(&self, image: &image::DynamicImage) -> Result<Tensor> {
        let rgb = image
            .resize_exact(
                INPUT_SIZE as u32,
                INPUT_SIZE as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgb8();

        let data: Vec<f32> = rgb
            .into_raw()
            .into_iter()
            .map(|v| f32::from(v) / 127.5 - 1.0)
            .collect();

        Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))?
            .to_dtype(DType::F32)
            .context("Failed to build detector input")
    }

    /// Returns `(logits, offsets)` shaped `(896, classes)` and `(896, 4)`.
    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let classes = self.config.labels.len();

        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let mut h = self.stem.forward(&x)?.relu()?;
        for block in &self.backbone_16 {
            h = block.forward(&h)?;
        }
        let map_16 = h.clone();
        for block in &self.backbone_8 {
            h = block.forward(&h)?;
        }
        let map_8 = h;

        let head = |conv: &Conv2d, map: &Tensor, anchors: usize, width: usize| -> Result<Tensor> {
            Ok(conv
                .forward(map)?
                .permute((0, 2, 3, 1))?
                .reshape((anchors, width))?)
        };

        let logits = Tensor::cat(
            &[
                head(&self.classifier_16, &map_16, ANCHORS_16, classes)?,
                head(&self.classifier_8, &map_8, ANCHORS_8, classes)?,
            ],
            0,
        )?;
        let offsets = Tensor::cat(
            &[
                head(&self.regressor_16, &map_16, ANCHORS_16, 4)?,
                head(&self.regressor_8, &map_8, ANCHORS_8, 4)?,
            ],
            0,
        )?;
        Ok((logits, offsets))
    }

    /// Turns raw head output into thresholded candidates.
    fn decode(&self, logits: &Tensor, offsets: &Tensor) -> Result<Vec<Candidate>> {
        let logits = logits.to_vec2::<f32>()?;
        let offsets = offsets.to_vec2::<f32>()?;
        let scale = INPUT_SIZE as f32;

        let mut candidates = Vec::new();
        for ((anchor, row), offset) in self.anchors.iter().zip(&logits).zip(&offsets) {
            let Some((class, score)) = row
                .iter()
                .map(|&logit| sigmoid(logit))
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1))
            else {
                continue;
            };
            if score < self.config.score_threshold {
                continue;
            }

            let cx = anchor[0] + offset[0] / scale;
            let cy = anchor[1] + offset[1] / scale;
            let half_w = offset[2] / scale / 2.0;
            let half_h = offset[3] / scale / 2.0;

            candidates.push(Candidate {
                bbox: [
                    (cx - half_w).clamp(0.0, 1.0),
                    (cy - half_h).clamp(0.0, 1.0),
                    (cx + half_w).clamp(0.0, 1.0),
                    (cy + half_h).clamp(0.0, 1.0),
                ],
                class,
                score,
            });
        }
        Ok(candidates)
    }

    /// Maps a normalized candidate onto the pixel grid of the source image.
    fn to_detection(&self, candidate: &Candidate, width: u32, height: u32) -> Detection {
        let [x0, y0, x1, y1] = candidate.bbox;
        let (w, h) = (width as f32, height as f32);
        let left = (x0 * w).round() as u32;
        let top = (y0 * h).round() as u32;

        Detection {
            bbox: BoundingBox::new(
                left,
                top,
                ((x1 * w).round() as u32).saturating_sub(left),
                ((y1 * h).round() as u32).saturating_sub(top),
            ),
            label: self.config.labels[candidate.class].clone(),
            confidence: candidate.score,
        }
    }
}

impl ObjectDetector for BlazeDetector {
    fn name(&self) -> &'static str {
        "blaze"
    }

    fn detect(&self, image: &image::DynamicImage) -> Result<Vec<Detection>> {
        let input = self.preprocess(image)?;
        let (logits, offsets) = self.forward(&input)?;
        let candidates = self.decode(&logits, &offsets)?;
        let kept = suppress(
            candidates,
            self.config.nms_threshold,
            self.config.max_detections,
        );
        debug!("Detector kept {} box(es)", kept.len());

        Ok(kept
            .iter()
            .map(|c| self.to_detection(c, image.width(), image.height()))
            .collect())
    }
}

/// Anchor centres in the order the heads emit them.
fn anchor_centers() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for (grid, per_cell) in [(16_u8, 2), (8, 6)] {
        let size = f32::from(grid);
        for y in 0..grid {
            for x in 0..grid {
                let center = [(f32::from(x) + 0.5) / size, (f32::from(y) + 0.5) / size];
                anchors.extend(std::iter::repeat(center).take(per_cell));
            }
        }
    }
    anchors
}

/// Class-aware non-maximum suppression, best score first.
fn suppress(mut candidates: Vec<Candidate>, threshold: f32, limit: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() == limit {
            break;
        }
        let overlaps = kept
            .iter()
            .any(|k| k.class == candidate.class && iou(&k.bbox, &candidate.bbox) >= threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
