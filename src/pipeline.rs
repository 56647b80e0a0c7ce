use std::fs;
use std::sync::Mutex;

use log::{info, warn};

use crate::angelina::{process_angelina, AngelinaLabelTransform};
use crate::class_map::ClassMap;
use crate::config::Args;
use crate::dataset::{collect_pairs, copy_split, split_pairs};
use crate::dsbi::{process_dsbi, DsbiAnnotationReader};
use crate::error::Result;
use crate::io::{create_split_directories, write_data_yaml};

/// Run the full conversion: both source adapters into the label tree, class
/// map persistence, then the seeded split and the training manifest.
///
/// The class map and the label files are regenerated together on every run;
/// an earlier run's class ids are never carried over.
pub fn run(args: &Args) -> Result<()> {
    let class_map = Mutex::new(ClassMap::new());
    fs::create_dir_all(&args.labels_dir)?;

    match &args.dsbi_root {
        Some(root) if root.exists() => {
            info!("Processing DSBI pages from {}", root.display());
            let stats = process_dsbi(
                root,
                &args.labels_dir,
                &class_map,
                &DsbiAnnotationReader,
                args.tolerance,
            )?;
            stats.log_summary("DSBI");
        }
        Some(root) => warn!("DSBI root {} does not exist, skipping", root.display()),
        None => info!("No DSBI root configured, skipping"),
    }

    match &args.angelina_root {
        Some(root) if root.exists() => {
            info!("Processing Angelina books from {}", root.display());
            let stats = process_angelina(
                root,
                &args.labels_dir,
                &class_map,
                &AngelinaLabelTransform,
            )?;
            stats.log_summary("Angelina");
        }
        Some(root) => warn!("Angelina root {} does not exist, skipping", root.display()),
        None => info!("No Angelina root configured, skipping"),
    }

    let class_map = class_map.into_inner().unwrap();
    if class_map.is_empty() {
        warn!("No cell labels were registered; the class map is empty");
    }
    let class_map_path = args.labels_dir.join("class_map.json");
    class_map.save(&class_map_path)?;
    info!(
        "Class map with {} classes written to {}",
        class_map.len(),
        class_map_path.display()
    );

    let pairs = collect_pairs(&args.labels_dir)?;
    info!("Found {} image/label pairs", pairs.len());

    let (train_pairs, val_pairs) = split_pairs(pairs, args.train_ratio, args.seed);
    let split_dirs = create_split_directories(&args.output_dir)?;
    let (n_train, n_val) = copy_split(&train_pairs, &val_pairs, &split_dirs, &args.labels_dir)?;
    info!("Split: {} train, {} val", n_train, n_val);

    let yaml_path = write_data_yaml(&class_map_path, &args.output_dir)?;
    info!("data.yaml written to {}", yaml_path.display());

    Ok(())
}
