use ab_glyph::{Font, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::detector::Detector;
use crate::types::Detection;

pub const PERSON_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const PPE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const STROKE_WIDTH: u32 = 2;

const LABEL_SCALE: f32 = 16.0;
const LABEL_OFFSET: i32 = 10;

/// How boxes are painted onto an image.
pub struct BoxStyle<'a, F: Font> {
    pub color: Rgb<u8>,
    pub thickness: u32,
    pub font: &'a F,
}

/// Label text for one detection: class name and confidence with two decimals.
pub fn detection_label(class_name: &str, confidence: f32) -> String {
    format!("{} {:.2}", class_name, confidence)
}

/// Draw every detection as a rectangle plus a `"{class} {conf}"` label above its top-left corner.
///
/// Corners are truncated to whole pixels and are part of the outline; zero-area boxes are
/// skipped. Label pixels falling outside the image are clipped.
pub fn draw_detections<D, F>(
    image: &mut RgbImage,
    detections: &[Detection],
    detector: &D,
    style: &BoxStyle<'_, F>,
) where
    D: Detector + ?Sized,
    F: Font,
{
    for detection in detections {
        let (x1, y1, x2, y2) = detection.bbox.truncated();
        if x2 <= x1 || y2 <= y1 {
            continue;
        }
        draw_thick_rect(image, x1, y1, x2, y2, style.thickness, style.color);

        let text = detection_label(&detector.class_name(detection.class_id), detection.confidence);
        let scale = PxScale::from(LABEL_SCALE);
        // Baseline sits LABEL_OFFSET pixels above the box; imageproc positions the text's top edge.
        let ascent = style.font.as_scaled(scale).ascent().ceil() as i32;
        draw_text_mut(
            image,
            style.color,
            x1,
            y1 - LABEL_OFFSET - ascent,
            scale,
            style.font,
            &text,
        );
    }
}

// Nested one-pixel outlines growing inward; the outer one covers both corner pixels
fn draw_thick_rect(
    image: &mut RgbImage,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    thickness: u32,
    color: Rgb<u8>,
) {
    for inset in 0..thickness.max(1) as i32 {
        let width = x2 - x1 + 1 - 2 * inset;
        let height = y2 - y1 + 1 - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x1 + inset, y1 + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}
