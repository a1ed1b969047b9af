use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use crate::yolo::YoloConfig;

/// Convert PascalVOC annotations to YOLO format.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct ConvertArgs {
    /// Directory containing classes.txt and an annotations/ folder of PascalVOC XML files
    pub input_dir: PathBuf,

    /// Directory that receives the labels/ folder of YOLO text files
    pub output_dir: PathBuf,
}

/// Run person detection, then PPE detection on every detected person.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct InferenceArgs {
    /// Directory containing the .jpg/.png images to process
    pub input_dir: PathBuf,

    /// Directory that receives annotated images and person crops
    pub output_dir: PathBuf,

    /// ONNX model used to detect persons
    pub person_det_model: PathBuf,

    /// ONNX model used to detect PPE on person crops
    pub ppe_detection_model: PathBuf,

    /// Minimum confidence for a detection to be kept
    #[arg(long = "conf", default_value_t = 0.25, value_parser = validate_threshold)]
    pub conf_thresh: f32,

    /// IoU above which overlapping boxes of the same class are suppressed
    #[arg(long = "iou", default_value_t = 0.7, value_parser = validate_threshold)]
    pub iou_thresh: f32,

    /// Square input size both models were exported with
    #[arg(long = "imgsz", default_value_t = 640, value_parser = clap::value_parser!(u32).range(32..))]
    pub input_size: u32,

    /// Class names of the person model, one per line
    #[arg(long = "person-names")]
    pub person_names: Option<PathBuf>,

    /// Class names of the PPE model, one per line
    #[arg(long = "ppe-names")]
    pub ppe_names: Option<PathBuf>,

    /// TTF/OTF font for box labels; the bundled DejaVu Sans is used when omitted
    #[arg(long = "font")]
    pub font: Option<PathBuf>,

    /// How person crops are named: a single overwritten file per image, or one file per person
    #[arg(long = "crop-naming", value_enum, default_value = "overwrite")]
    pub crop_naming: CropNaming,
}

impl InferenceArgs {
    pub fn yolo_config(&self) -> YoloConfig {
        YoloConfig {
            input_size: self.input_size,
            conf_thresh: self.conf_thresh,
            iou_thresh: self.iou_thresh,
        }
    }
}

// Naming scheme for person crops written by the pipeline
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum CropNaming {
    /// cropped_<image>; later persons overwrite earlier ones
    #[default]
    Overwrite,
    /// cropped_<index>_<image>, one file per person
    Indexed,
}

// Validate that a threshold is between 0.0 and 1.0
pub fn validate_threshold(s: &str) -> Result<f32, String> {
    match f32::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("threshold must be between 0.0 and 1.0".to_string()),
    }
}
