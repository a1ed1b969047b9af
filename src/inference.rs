use clap::Parser;
use log::{error, info};

use ppe_vision::utils::load_label_font;
use ppe_vision::yolo::load_class_names;
use ppe_vision::{run_with_options, InferenceArgs, PipelineOptions, PipelineStats, YoloDetector};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = InferenceArgs::parse();

    info!("Starting two-stage inference...");

    match run_inference(&args) {
        Ok(stats) => {
            stats.print_summary();
            info!("Inference completed successfully.");
        }
        Err(e) => {
            error!("Inference failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_inference(args: &InferenceArgs) -> ppe_vision::Result<PipelineStats> {
    let config = args.yolo_config();

    let mut person_model = YoloDetector::load(&args.person_det_model, config)?;
    if let Some(path) = &args.person_names {
        person_model = person_model.with_class_names(load_class_names(path)?);
    }
    info!("Loaded person model {}", args.person_det_model.display());

    let mut ppe_model = YoloDetector::load(&args.ppe_detection_model, config)?;
    if let Some(path) = &args.ppe_names {
        ppe_model = ppe_model.with_class_names(load_class_names(path)?);
    }
    info!("Loaded PPE model {}", args.ppe_detection_model.display());

    let options = PipelineOptions {
        crop_naming: args.crop_naming,
        font: load_label_font(args.font.as_deref())?,
    };

    run_with_options(
        &args.input_dir,
        &args.output_dir,
        &person_model,
        &ppe_model,
        &options,
    )
}
