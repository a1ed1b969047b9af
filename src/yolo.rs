//! Ultralytics-style YOLO detector running an ONNX export through `tract-onnx`.
//!
//! The model is expected to take a `[1, 3, S, S]` f32 input in `[0, 1]` and to produce a
//! `[1, 4 + num_classes, num_anchors]` output whose rows are `cx, cy, w, h` followed by one
//! score per class.

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

use crate::detector::{default_class_name, Detector};
use crate::error::{Error, Result};
use crate::types::{BoundingBox, Detection};

type YoloPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Inference settings shared by every image run through a [`YoloDetector`].
#[derive(Debug, Clone, Copy)]
pub struct YoloConfig {
    pub input_size: u32,
    pub conf_thresh: f32,
    pub iou_thresh: f32,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_thresh: 0.25,
            iou_thresh: 0.7,
        }
    }
}

pub struct YoloDetector {
    model: YoloPlan,
    model_path: PathBuf,
    config: YoloConfig,
    classes: Vec<String>,
}

impl YoloDetector {
    /// Load and optimize the ONNX model at `model_path`.
    pub fn load<P: AsRef<Path>>(model_path: P, config: YoloConfig) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = config.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, 3, size, size]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| Error::Model {
                path: model_path.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        debug!(
            "Loaded {} with {}x{} input",
            model_path.display(),
            size,
            size
        );
        Ok(Self {
            model,
            model_path: model_path.to_path_buf(),
            config,
            classes: Vec::new(),
        })
    }

    pub fn with_class_names(mut self, classes: Vec<String>) -> Self {
        self.classes = classes;
        self
    }

    fn model_error(&self, e: impl std::fmt::Display) -> Error {
        Error::Model {
            path: self.model_path.clone(),
            message: format!("{:#}", e),
        }
    }
}

impl Detector for YoloDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let size = self.config.input_size;
        let (letterboxed, scale) = letterbox(image, size);
        let (lw, lh) = letterboxed.dimensions();
        let size = size as usize;

        let input: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
                if (x as u32) < lw && (y as u32) < lh {
                    letterboxed.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
                } else {
                    0.0
                }
            })
            .into();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| self.model_error(e))?;
        let output = outputs
            .first()
            .ok_or_else(|| self.model_error("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| self.model_error(e))?;

        let shape = view.shape().to_vec();
        let (rows, anchors) = match shape.as_slice() {
            [1, rows, anchors] if *rows > 4 => (*rows, *anchors),
            _ => {
                return Err(self.model_error(format!(
                    "unexpected output shape {:?}, expected [1, 4 + classes, anchors]",
                    shape
                )))
            }
        };
        let data: Vec<f32> = view.iter().copied().collect();

        let candidates = decode_predictions(
            &data,
            rows,
            anchors,
            self.config.conf_thresh,
            scale,
            image.dimensions(),
        );
        Ok(non_maximum_suppression(candidates, self.config.iou_thresh))
    }

    fn class_name(&self, class_id: usize) -> String {
        self.classes
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| default_class_name(class_id))
    }
}

/// Read a class-name list, one name per line. Blank lines are ignored.
pub fn load_class_names(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Resize `image` so its longer side is `size`, keeping the aspect ratio.
///
/// Returns the resized image (to be padded at the right/bottom up to `size` x `size`) and
/// the factor that maps model coordinates back to `image` pixels.
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, f32) {
    let (width, height) = image.dimensions();
    let longer = width.max(height).max(1);
    let scale = longer as f32 / size as f32;

    let (resized_width, resized_height) = if width > height {
        (size, (size as u64 * height as u64 / width as u64) as u32)
    } else {
        ((size as u64 * width as u64 / longer as u64) as u32, size)
    };

    let resized = imageops::resize(
        image,
        resized_width.max(1),
        resized_height.max(1),
        FilterType::Triangle,
    );
    (resized, scale)
}

/// Turn the raw `rows x anchors` output into detections above `conf_thresh`.
///
/// `data` is row-major: row 0 holds every anchor's `cx`, row 1 every `cy`, and so on.
pub fn decode_predictions(
    data: &[f32],
    rows: usize,
    anchors: usize,
    conf_thresh: f32,
    scale: f32,
    (image_width, image_height): (u32, u32),
) -> Vec<Detection> {
    let at = |row: usize, anchor: usize| data[row * anchors + anchor];
    let mut detections = Vec::new();

    for anchor in 0..anchors {
        let (class_id, confidence) = (4..rows)
            .map(|row| (row - 4, at(row, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });
        if confidence < conf_thresh {
            continue;
        }

        let (cx, cy, w, h) = (
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        );
        let clamp_x = |v: f32| (v * scale).clamp(0.0, image_width as f32) as f64;
        let clamp_y = |v: f32| (v * scale).clamp(0.0, image_height as f32) as f64;

        detections.push(Detection {
            bbox: BoundingBox::new(
                clamp_x(cx - 0.5 * w),
                clamp_y(cy - 0.5 * h),
                clamp_x(cx + 0.5 * w),
                clamp_y(cy + 0.5 * h),
            ),
            class_id,
            confidence,
        });
    }
    detections
}

/// Intersection over union of two boxes.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let inter_w = (a.x_max.min(b.x_max) - a.x_min.max(b.x_min)).max(0.0);
    let inter_h = (a.y_max.min(b.y_max) - a.y_min.max(b.y_min)).max(0.0);
    let intersection = inter_w * inter_h;
    let union = a.width() * a.height() + b.width() * b.height() - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Class-wise greedy non-maximum suppression. The result is ordered by descending confidence.
pub fn non_maximum_suppression(mut candidates: Vec<Detection>, iou_thresh: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = keep.iter().any(|kept| {
            kept.class_id == candidate.class_id
                && iou(&kept.bbox, &candidate.bbox) > iou_thresh as f64
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}
