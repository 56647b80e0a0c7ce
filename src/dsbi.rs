use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use glob::glob;
use rayon::prelude::*;

use crate::class_map::ClassMap;
use crate::error::{ConvertError, Result};
use crate::io::{copy_image, image_dimensions, write_label_file};
use crate::label::{try_canonicalize, CanonicalLabel, RawLabel};
use crate::types::{SourceStats, YoloBox};
use crate::utils::create_progress_bar;

/// One cell rectangle produced by a layout annotation reader, in pixel
/// coordinates of the page image.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub label: RawLabel,
}

/// Parser for the fixed-layout text annotation that sits next to each DSBI
/// page image. Implementations receive the page dimensions and a tolerance
/// for readers that derive cell boxes from dot positions.
pub trait LayoutAnnotationReader {
    fn read_rects(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        tolerance: f64,
    ) -> Result<Vec<LayoutRect>>;
}

/// Reader for cell records stored one per line as
/// `left;top;right;bottom;dots`, e.g. `102;37;131;84;123456`.
pub struct DsbiAnnotationReader;

impl LayoutAnnotationReader for DsbiAnnotationReader {
    fn read_rects(
        &self,
        path: &Path,
        _width: u32,
        _height: u32,
        _tolerance: f64,
    ) -> Result<Vec<LayoutRect>> {
        let content = fs::read_to_string(path)?;
        let mut rects = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(';').map(str::trim).collect();
            if fields.len() != 5 {
                return Err(ConvertError::Annotation {
                    path: path.to_path_buf(),
                    message: format!(
                        "line {}: expected 5 ';'-separated fields, found {}",
                        line_no + 1,
                        fields.len()
                    ),
                });
            }
            rects.push(LayoutRect {
                left: parse_coord(path, line_no, fields[0])?,
                top: parse_coord(path, line_no, fields[1])?,
                right: parse_coord(path, line_no, fields[2])?,
                bottom: parse_coord(path, line_no, fields[3])?,
                label: RawLabel::text(fields[4]),
            });
        }
        Ok(rects)
    }
}

fn parse_coord(path: &Path, line_no: usize, field: &str) -> Result<f64> {
    field.parse().map_err(|_| ConvertError::Annotation {
        path: path.to_path_buf(),
        message: format!("line {}: invalid coordinate {:?}", line_no + 1, field),
    })
}

/// Convert every annotated DSBI page under `root` into YOLO label files and
/// copied images below `output_dir/DSBI`, mirroring the source's relative
/// directory layout. Pages without an annotation file are skipped.
pub fn process_dsbi<R>(
    root: &Path,
    output_dir: &Path,
    class_map: &Mutex<ClassMap>,
    reader: &R,
    tolerance: f64,
) -> Result<SourceStats>
where
    R: LayoutAnnotationReader + Sync,
{
    let pages = discover_pages(root)?;
    let pb = create_progress_bar(pages.len() as u64, "DSBI");

    let stats = pages
        .par_iter()
        .map(|image_path| {
            let result = convert_page(root, output_dir, class_map, reader, tolerance, image_path);
            pb.inc(1);
            result
        })
        .try_reduce(SourceStats::default, |a, b| Ok(a.merge(b)))?;

    pb.finish_with_message("DSBI processing complete");
    Ok(stats)
}

// Recto and verso page images anywhere under the dataset root
fn discover_pages(root: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for suffix in ["+recto.jpg", "+verso.jpg"] {
        let pattern = format!("{}/**/*{}", root.display(), suffix);
        pages.extend(glob(&pattern)?.filter_map(|entry| entry.ok()));
    }
    pages.sort();
    Ok(pages)
}

fn convert_page<R>(
    root: &Path,
    output_dir: &Path,
    class_map: &Mutex<ClassMap>,
    reader: &R,
    tolerance: f64,
    image_path: &Path,
) -> Result<SourceStats>
where
    R: LayoutAnnotationReader + Sync,
{
    let annotation_path = image_path.with_extension("txt");
    if !annotation_path.exists() {
        return Ok(SourceStats {
            skipped_missing_annotation: 1,
            ..Default::default()
        });
    }

    let (width, height) = image_dimensions(image_path)?;
    let rects = reader.read_rects(&annotation_path, width, height, tolerance)?;

    let mut stats = SourceStats {
        images_processed: 1,
        ..Default::default()
    };
    let mut boxes = Vec::with_capacity(rects.len());
    for rect in &rects {
        let label = match try_canonicalize(&rect.label) {
            Some(label) => label,
            None => {
                log::warn!(
                    "unrecognized cell label {:?} in {}, using blank cell",
                    rect.label,
                    annotation_path.display()
                );
                stats.fallback_labels += 1;
                CanonicalLabel::blank()
            }
        };
        let class_id = class_map.lock().unwrap().get_id(&label);
        boxes.push(YoloBox::from_rect(
            class_id,
            rect.left,
            rect.top,
            rect.right,
            rect.bottom,
            width,
            height,
        ));
    }
    stats.boxes_written = boxes.len();

    let rel_dir = image_path
        .parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .unwrap_or(Path::new(""));
    let out_dir = output_dir.join("DSBI").join(rel_dir);

    let stem = image_path.file_stem().unwrap().to_string_lossy();
    write_label_file(&out_dir.join(format!("{}.txt", stem)), &boxes)?;
    copy_image(
        image_path,
        &out_dir.join(image_path.file_name().unwrap()),
    )?;

    Ok(stats)
}
