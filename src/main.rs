use clap::Parser;
use log::{error, info};

use braille2yolo::{run, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Starting the conversion process...");

    if let Err(e) = run(&args) {
        error!("Conversion failed: {}", e);
        std::process::exit(1);
    }

    info!("Conversion process completed successfully.");
}
