use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Command-line arguments for converting Braille page annotations to a YOLO
/// dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Root of the DSBI dataset (recto/verso pages with text annotations)
    #[arg(long = "dsbi_root")]
    pub dsbi_root: Option<PathBuf>,

    /// Root of the Angelina books dataset (labeled pages with JSON annotations)
    #[arg(long = "angelina_root")]
    pub angelina_root: Option<PathBuf>,

    /// Directory for the per-source label files and the class map
    #[arg(long = "labels_dir", default_value = "yolo_labels")]
    pub labels_dir: PathBuf,

    /// Directory for the final train/val split and data.yaml
    #[arg(long = "output_dir", default_value = "yolo_dataset")]
    pub output_dir: PathBuf,

    /// Fraction of image/label pairs assigned to the training split
    #[arg(long = "train_ratio", default_value_t = 0.8, value_parser = validate_ratio)]
    pub train_ratio: f64,

    /// Seed for random shuffling
    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Tolerance forwarded to the layout annotation reader
    #[arg(long = "tolerance", default_value_t = 0.0)]
    pub tolerance: f64,
}

// Validate that the ratio is between 0.0 and 1.0
fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("RATIO must be between 0.0 and 1.0".to_string()),
    }
}
