use image::RgbImage;

use crate::error::Result;
use crate::types::Detection;

/// An object detector treated as a pure function of its input image.
///
/// The pipeline only ever sees this trait, so any model (or a fixed fake in tests) can be
/// plugged in. Implementations must not mutate their weights during `detect`.
pub trait Detector {
    /// Detect objects in `image`. Boxes are in the pixel space of `image`.
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>>;

    /// Human-readable name for `class_id`.
    fn class_name(&self, class_id: usize) -> String;
}

/// Fallback name for a class id with no known label.
pub fn default_class_name(class_id: usize) -> String {
    format!("class{}", class_id)
}
