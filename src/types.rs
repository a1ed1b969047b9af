use std::fmt;

use crate::utils::format_decimal;

// Supported input image extensions for the detection pipeline (case-sensitive)
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".png"];

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Express the box as fractions of an image of `image_width` x `image_height` pixels.
    pub fn normalize(&self, class_id: usize, image_width: f64, image_height: f64) -> NormalizedLabel {
        NormalizedLabel {
            class_id,
            x_center: (self.x_min + self.x_max) / 2.0 / image_width,
            y_center: (self.y_min + self.y_max) / 2.0 / image_height,
            width: (self.x_max - self.x_min) / image_width,
            height: (self.y_max - self.y_min) / image_height,
        }
    }

    /// Integer corners `(x1, y1, x2, y2)`, truncated toward zero.
    pub fn truncated(&self) -> (i32, i32, i32, i32) {
        (
            self.x_min as i32,
            self.y_min as i32,
            self.x_max as i32,
            self.y_max as i32,
        )
    }

    /// Integer crop window `(x, y, width, height)` clipped to an image of the given size.
    ///
    /// Returns `None` when nothing of the box remains inside the image.
    pub fn crop_window(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let (x1, y1, x2, y2) = self.truncated();
        let clip = |v: i32, limit: u32| v.clamp(0, limit as i32) as u32;
        let (x1, x2) = (clip(x1, image_width), clip(x2, image_width));
        let (y1, y2) = (clip(y1, image_height), clip(y2, image_height));
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

/// One object predicted by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub confidence: f32,
}

/// A YOLO label line: class id plus centre/size as fractions of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedLabel {
    pub class_id: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for NormalizedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            format_decimal(self.x_center),
            format_decimal(self.y_center),
            format_decimal(self.width),
            format_decimal(self.height)
        )
    }
}

// Counters for a PascalVOC -> YOLO conversion run
#[derive(Debug, Default, Clone)]
pub struct ConversionStats {
    pub files_converted: usize,
    pub objects_written: usize,
    pub objects_skipped: usize,
}

impl ConversionStats {
    pub fn print_summary(&self) {
        log::info!("=== Conversion Summary ===");
        log::info!("Annotation files converted: {}", self.files_converted);
        log::info!("Objects written: {}", self.objects_written);
        if self.objects_skipped > 0 {
            log::warn!(
                "Objects skipped (class not in classes.txt): {}",
                self.objects_skipped
            );
        }
    }
}

// Counters for a two-stage detection run
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub images_processed: usize,
    pub person_detections: usize,
    pub crops_written: usize,
    pub crops_skipped: usize,
    pub ppe_detections: usize,
}

impl PipelineStats {
    pub fn print_summary(&self) {
        log::info!("=== Inference Summary ===");
        log::info!("Images processed: {}", self.images_processed);
        log::info!("Person detections: {}", self.person_detections);
        log::info!("Crops written: {}", self.crops_written);
        log::info!("PPE detections: {}", self.ppe_detections);
        if self.crops_skipped > 0 {
            log::warn!("Degenerate person crops skipped: {}", self.crops_skipped);
        }
    }
}
