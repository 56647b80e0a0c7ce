use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// Image formats the assembler pairs with label files
pub const IMG_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

// One annotated polygon in an Angelina page JSON
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Shape {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

// Annotation file of one Angelina page; extra keys in the JSON are ignored
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolygonAnnotation {
    pub shapes: Vec<Shape>,
}

/// One detection box in YOLO format: class id plus center/size expressed as
/// fractions of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloBox {
    pub class_id: usize,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloBox {
    /// Convert a pixel-space rectangle into normalized center/size form.
    pub fn from_rect(
        class_id: usize,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        img_width: u32,
        img_height: u32,
    ) -> Self {
        let w = img_width as f64;
        let h = img_height as f64;
        YoloBox {
            class_id,
            x_center: (left + right) / 2.0 / w,
            y_center: (top + bottom) / 2.0 / h,
            width: (right - left) / w,
            height: (bottom - top) / h,
        }
    }

    /// One label-file line, floats fixed to 6 decimal places.
    pub fn to_line(self) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// An image and its sibling label file in the generated label tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLabelPair {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
}

// Counters reported per source after a conversion pass
#[derive(Debug, Default, Clone)]
pub struct SourceStats {
    pub images_processed: usize,
    pub boxes_written: usize,
    pub skipped_missing_annotation: usize,
    pub fallback_labels: usize,
}

impl SourceStats {
    pub fn merge(mut self, other: SourceStats) -> SourceStats {
        self.images_processed += other.images_processed;
        self.boxes_written += other.boxes_written;
        self.skipped_missing_annotation += other.skipped_missing_annotation;
        self.fallback_labels += other.fallback_labels;
        self
    }

    pub fn log_summary(&self, source: &str) {
        log::info!(
            "[{}] {} images converted, {} boxes written",
            source,
            self.images_processed,
            self.boxes_written
        );
        if self.skipped_missing_annotation > 0 {
            log::info!(
                "[{}] {} images skipped (no annotation file)",
                source,
                self.skipped_missing_annotation
            );
        }
        if self.fallback_labels > 0 {
            log::warn!(
                "[{}] {} labels could not be parsed and were written as blank cells",
                source,
                self.fallback_labels
            );
        }
    }
}
