use clap::Parser;
use log::{error, info};

use ppe_vision::{convert, ConvertArgs};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = ConvertArgs::parse();

    info!(
        "Converting PascalVOC annotations from {} to {}",
        args.input_dir.display(),
        args.output_dir.display()
    );

    match convert(&args.input_dir, &args.output_dir) {
        Ok(stats) => {
            stats.print_summary();
            info!("Conversion process completed successfully.");
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            std::process::exit(1);
        }
    }
}
