//! Offline tools for a person/PPE computer-vision pipeline.
//!
//! Two independent pieces live here: a PascalVOC to YOLO label converter, and a two-stage
//! detection pipeline that finds persons in a folder of images and then looks for PPE inside
//! each person crop. The detectors themselves sit behind the [`Detector`] trait.

pub mod config;
pub mod conversion;
pub mod detector;
pub mod draw;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod voc;
pub mod yolo;

// Re-export commonly used types and functions
pub use config::{ConvertArgs, CropNaming, InferenceArgs};
pub use conversion::{convert, ClassMapping};
pub use detector::Detector;
pub use error::{Error, Result};
pub use pipeline::{run, run_with_options, PipelineOptions};
pub use types::{BoundingBox, ConversionStats, Detection, NormalizedLabel, PipelineStats};
pub use yolo::{YoloConfig, YoloDetector};
