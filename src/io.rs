use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::class_map::ClassMap;
use crate::error::{ConvertError, Result};
use crate::types::YoloBox;

/// Probe an image file for its pixel dimensions without decoding it.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32)> {
    let size = imagesize::size(path).map_err(|source| ConvertError::ImageProbe {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((size.width as u32, size.height as u32))
}

/// Write one line per box, newline-separated with no trailing newline.
/// An empty box list still produces the (empty) file, and an existing label
/// file is always replaced.
pub fn write_label_file(path: &Path, boxes: &[YoloBox]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let lines: Vec<String> = boxes.iter().map(|b| b.to_line()).collect();
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(lines.join("\n").as_bytes())?;
    Ok(())
}

/// Copy `src` to `dst` unless `dst` already exists. Re-running a conversion
/// never overwrites previously copied images.
pub fn copy_image(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        return Ok(());
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// Safely create an output directory, replacing any previous contents
pub fn create_output_directory(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).and_then(|_| fs::create_dir_all(path))?;
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

// Paths of the four flat split directories under the output root
pub struct SplitDirs {
    pub train_images: PathBuf,
    pub val_images: PathBuf,
    pub train_labels: PathBuf,
    pub val_labels: PathBuf,
}

/// Set up the directory structure for the split dataset output. Existing
/// split directories are wiped so a re-run with another seed cannot leave
/// stale pairs behind.
pub fn create_split_directories(output_dir: &Path) -> Result<SplitDirs> {
    let images_dir = create_output_directory(&output_dir.join("images"))?;
    let labels_dir = create_output_directory(&output_dir.join("labels"))?;

    Ok(SplitDirs {
        train_images: create_output_directory(&images_dir.join("train"))?,
        val_images: create_output_directory(&images_dir.join("val"))?,
        train_labels: create_output_directory(&labels_dir.join("train"))?,
        val_labels: create_output_directory(&labels_dir.join("val"))?,
    })
}

/// Create the data.yaml manifest for YOLO training from the persisted class
/// map: absolute train/val image directories, class count, and the ordered
/// class name list.
pub fn write_data_yaml(class_map_path: &Path, output_dir: &Path) -> Result<PathBuf> {
    let class_map = ClassMap::load(class_map_path)?;

    let train_dir = fs::canonicalize(output_dir.join("images").join("train"))?;
    let val_dir = fs::canonicalize(output_dir.join("images").join("val"))?;

    let names = class_map
        .id_to_label
        .iter()
        .map(|label| format!("'{}'", label))
        .collect::<Vec<_>>()
        .join(", ");

    let yaml_path = output_dir.join("data.yaml");
    let mut writer = BufWriter::new(File::create(&yaml_path)?);
    write!(
        writer,
        "train: {}\nval: {}\n\nnc: {}\nnames: [{}]\n",
        train_dir.display(),
        val_dir.display(),
        class_map.len(),
        names
    )?;
    Ok(yaml_path)
}
