use ab_glyph::FontVec;
use image::{imageops, RgbImage};
use log::{debug, info, warn};
use std::path::Path;

use crate::config::CropNaming;
use crate::detector::Detector;
use crate::draw::{draw_detections, BoxStyle, PERSON_COLOR, PPE_COLOR, STROKE_WIDTH};
use crate::error::{Error, Result};
use crate::types::{PipelineStats, IMAGE_EXTENSIONS};
use crate::utils::{
    create_progress_bar, embedded_label_font, ensure_directory, list_files_with_suffixes,
};

pub const CROP_PREFIX: &str = "cropped_";

/// Knobs of the two-stage pipeline that do not come from the detectors.
pub struct PipelineOptions {
    pub crop_naming: CropNaming,
    pub font: FontVec,
}

impl PipelineOptions {
    /// Options labelling boxes with the bundled font.
    pub fn new(crop_naming: CropNaming) -> Result<Self> {
        Ok(Self {
            crop_naming,
            font: embedded_label_font()?,
        })
    }
}

/// File name for the crop of the `index`-th person found in `image_file`.
pub fn crop_file_name(naming: CropNaming, index: usize, image_file: &str) -> String {
    match naming {
        CropNaming::Overwrite => format!("{}{}", CROP_PREFIX, image_file),
        CropNaming::Indexed => format!("{}{}_{}", CROP_PREFIX, index, image_file),
    }
}

/// Run person detection then per-person PPE detection over every `.jpg`/`.png` in `input_dir`.
pub fn run(
    input_dir: &Path,
    output_dir: &Path,
    person_model: &dyn Detector,
    ppe_model: &dyn Detector,
) -> Result<PipelineStats> {
    run_with_options(
        input_dir,
        output_dir,
        person_model,
        ppe_model,
        &PipelineOptions::new(CropNaming::default())?,
    )
}

/// [`run`] with explicit crop naming and label font.
///
/// Images are handled one at a time in file-name order; the first error stops the run and
/// leaves whatever was already written in `output_dir`.
pub fn run_with_options(
    input_dir: &Path,
    output_dir: &Path,
    person_model: &dyn Detector,
    ppe_model: &dyn Detector,
    options: &PipelineOptions,
) -> Result<PipelineStats> {
    ensure_directory(output_dir)?;
    let images = list_files_with_suffixes(input_dir, IMAGE_EXTENSIONS)?;
    info!("Found {} images in {}", images.len(), input_dir.display());

    let pb = create_progress_bar(images.len() as u64, "Inference");
    let mut stats = PipelineStats::default();
    for image_path in &images {
        if let Err(e) = process_image(
            image_path,
            output_dir,
            person_model,
            ppe_model,
            options,
            &mut stats,
        ) {
            pb.abandon();
            return Err(e);
        }
        pb.inc(1);
    }
    pb.finish_with_message("Inference complete");

    Ok(stats)
}

/// Both stages for a single image.
///
/// Stage A writes the full image with every person box drawn to `output_dir/<name>`.
/// Stage B crops each person from the undrawn image, runs the PPE model on the crop and writes
/// the annotated crop under [`crop_file_name`]. Person detection runs once and feeds both stages.
pub fn process_image(
    image_path: &Path,
    output_dir: &Path,
    person_model: &dyn Detector,
    ppe_model: &dyn Detector,
    options: &PipelineOptions,
    stats: &mut PipelineStats,
) -> Result<()> {
    let file_name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let original = load_rgb(image_path)?;
    let persons = person_model.detect(&original)?;
    debug!("{}: {} person(s)", file_name, persons.len());
    stats.person_detections += persons.len();

    let mut annotated = original.clone();
    let person_style = BoxStyle {
        color: PERSON_COLOR,
        thickness: STROKE_WIDTH,
        font: &options.font,
    };
    draw_detections(&mut annotated, &persons, person_model, &person_style);
    save_rgb(&annotated, &output_dir.join(&file_name))?;

    let ppe_style = BoxStyle {
        color: PPE_COLOR,
        thickness: STROKE_WIDTH,
        font: &options.font,
    };
    let (width, height) = original.dimensions();
    for (index, person) in persons.iter().enumerate() {
        let Some((x, y, crop_width, crop_height)) = person.bbox.crop_window(width, height) else {
            warn!(
                "{}: person box {:?} is empty after truncation, no crop written",
                file_name, person.bbox
            );
            stats.crops_skipped += 1;
            continue;
        };

        let mut crop = imageops::crop_imm(&original, x, y, crop_width, crop_height).to_image();
        let crop_path = output_dir.join(crop_file_name(options.crop_naming, index, &file_name));
        save_rgb(&crop, &crop_path)?;

        let ppe = ppe_model.detect(&crop)?;
        stats.ppe_detections += ppe.len();
        draw_detections(&mut crop, &ppe, ppe_model, &ppe_style);
        save_rgb(&crop, &crop_path)?;
        stats.crops_written += 1;
    }

    stats.images_processed += 1;
    Ok(())
}

fn load_rgb(path: &Path) -> Result<RgbImage> {
    Ok(image::open(path)
        .map_err(|e| Error::image(path, e))?
        .to_rgb8())
}

fn save_rgb(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|e| Error::image(path, e))
}
