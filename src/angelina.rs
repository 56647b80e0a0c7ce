use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use glob::glob;
use rayon::prelude::*;

use crate::class_map::ClassMap;
use crate::error::{ConvertError, Result};
use crate::io::{copy_image, image_dimensions, write_label_file};
use crate::label::{try_canonicalize, CanonicalLabel, RawLabel};
use crate::types::{PolygonAnnotation, SourceStats, YoloBox};
use crate::utils::create_progress_bar;

/// Decoder for the raw label string attached to an Angelina polygon.
pub trait LabelTransform {
    fn transform(&self, raw: &str) -> RawLabel;
}

/// Default transform: the raw string is forwarded unchanged and the
/// canonicalizer resolves the usual dot-digit encodings. Datasets with an
/// exotic label scheme plug in their own [`LabelTransform`].
pub struct AngelinaLabelTransform;

impl LabelTransform for AngelinaLabelTransform {
    fn transform(&self, raw: &str) -> RawLabel {
        RawLabel::text(raw)
    }
}

/// Convert every labeled page in every book under `root` into YOLO label
/// files and copied images below `output_dir/Angelina/<book>`. Pages without
/// a JSON annotation are skipped.
pub fn process_angelina<T>(
    root: &Path,
    output_dir: &Path,
    class_map: &Mutex<ClassMap>,
    transform: &T,
) -> Result<SourceStats>
where
    T: LabelTransform + Sync,
{
    let pages = discover_book_pages(root)?;
    let pb = create_progress_bar(pages.len() as u64, "Angelina");

    let stats = pages
        .par_iter()
        .map(|image_path| {
            let result = convert_page(root, output_dir, class_map, transform, image_path);
            pb.inc(1);
            result
        })
        .try_reduce(SourceStats::default, |a, b| Ok(a.merge(b)))?;

    pb.finish_with_message("Angelina processing complete");
    Ok(stats)
}

// Labeled page images one level down, inside each book directory
fn discover_book_pages(root: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let pattern = format!("{}/*.labeled.jpg", entry.path().display());
        pages.extend(glob(&pattern)?.filter_map(|entry| entry.ok()));
    }
    pages.sort();
    Ok(pages)
}

fn read_annotation(path: &Path) -> Result<PolygonAnnotation> {
    let file = File::open(path)?;
    serde_json::from_reader(file).map_err(|source| ConvertError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

fn convert_page<T>(
    root: &Path,
    output_dir: &Path,
    class_map: &Mutex<ClassMap>,
    transform: &T,
    image_path: &Path,
) -> Result<SourceStats>
where
    T: LabelTransform + Sync,
{
    let json_path = image_path.with_extension("json");
    if !json_path.exists() {
        return Ok(SourceStats {
            skipped_missing_annotation: 1,
            ..Default::default()
        });
    }

    let (width, height) = image_dimensions(image_path)?;
    let annotation = read_annotation(&json_path)?;

    let mut stats = SourceStats {
        images_processed: 1,
        ..Default::default()
    };
    let mut boxes = Vec::with_capacity(annotation.shapes.len());
    for shape in &annotation.shapes {
        if shape.points.is_empty() {
            return Err(ConvertError::Annotation {
                path: json_path.clone(),
                message: format!("shape labeled {:?} has no points", shape.label),
            });
        }
        let (x_min, y_min, x_max, y_max) = shape.points.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x_min, y_min, x_max, y_max), &(x, y)| {
                (x_min.min(x), y_min.min(y), x_max.max(x), y_max.max(y))
            },
        );

        let raw = transform.transform(&shape.label);
        let label = match try_canonicalize(&raw) {
            Some(label) => label,
            None => {
                log::warn!(
                    "unrecognized cell label {:?} in {}, using blank cell",
                    raw,
                    json_path.display()
                );
                stats.fallback_labels += 1;
                CanonicalLabel::blank()
            }
        };
        let class_id = class_map.lock().unwrap().get_id(&label);
        boxes.push(YoloBox::from_rect(
            class_id, x_min, y_min, x_max, y_max, width, height,
        ));
    }
    stats.boxes_written = boxes.len();

    let rel_dir = image_path
        .parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .unwrap_or(Path::new(""));
    let out_dir = output_dir.join("Angelina").join(rel_dir);

    let stem = image_path.file_stem().unwrap().to_string_lossy();
    write_label_file(&out_dir.join(format!("{}.txt", stem)), &boxes)?;
    copy_image(
        image_path,
        &out_dir.join(image_path.file_name().unwrap()),
    )?;

    Ok(stats)
}
