use std::fs;
use std::path::Path;

use glob::glob;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::Result;
use crate::io::SplitDirs;
use crate::types::{ImageLabelPair, IMG_EXTENSIONS};
use crate::utils::flat_name;

/// Walk the generated label trees and pair every image with its sibling
/// `.txt` label file. Images without one are left out. The result is sorted
/// by image path so the later shuffle starts from a deterministic order.
pub fn collect_pairs(labels_root: &Path) -> Result<Vec<ImageLabelPair>> {
    let mut pairs = Vec::new();
    for ext in IMG_EXTENSIONS {
        let pattern = format!("{}/**/*.{}", labels_root.display(), ext);
        for image_path in glob(&pattern)?.filter_map(|entry| entry.ok()) {
            let label_path = image_path.with_extension("txt");
            if label_path.exists() {
                pairs.push(ImageLabelPair {
                    image_path,
                    label_path,
                });
            }
        }
    }
    pairs.sort_by(|a, b| a.image_path.cmp(&b.image_path));
    Ok(pairs)
}

/// Shuffle the pairs with a seeded generator and split them into train and
/// val partitions. The same seed always produces the same partition, and the
/// train size is `floor(n * train_ratio)` regardless of seed.
pub fn split_pairs(
    mut pairs: Vec<ImageLabelPair>,
    train_ratio: f64,
    seed: u64,
) -> (Vec<ImageLabelPair>, Vec<ImageLabelPair>) {
    let mut rng = StdRng::seed_from_u64(seed);
    pairs.shuffle(&mut rng);

    let n_train = (pairs.len() as f64 * train_ratio).floor() as usize;
    let val_pairs = pairs.split_off(n_train);
    (pairs, val_pairs)
}

/// Copy each partition's images and labels into the flat split directories
/// and return the partition sizes.
pub fn copy_split(
    train: &[ImageLabelPair],
    val: &[ImageLabelPair],
    dirs: &SplitDirs,
    labels_root: &Path,
) -> Result<(usize, usize)> {
    copy_partition(train, &dirs.train_images, &dirs.train_labels, labels_root)?;
    copy_partition(val, &dirs.val_images, &dirs.val_labels, labels_root)?;
    Ok((train.len(), val.len()))
}

fn copy_partition(
    pairs: &[ImageLabelPair],
    images_dir: &Path,
    labels_dir: &Path,
    labels_root: &Path,
) -> Result<()> {
    pairs.par_iter().try_for_each(|pair| {
        fs::copy(
            &pair.image_path,
            images_dir.join(flat_name(labels_root, &pair.image_path)),
        )?;
        fs::copy(
            &pair.label_path,
            labels_dir.join(flat_name(labels_root, &pair.label_path)),
        )?;
        Ok(())
    })
}
