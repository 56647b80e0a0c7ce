use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use braille2yolo::{
    collect_pairs, process_angelina, process_dsbi, run, AngelinaLabelTransform, Args, ClassMap,
    DsbiAnnotationReader, LayoutAnnotationReader, LayoutRect, RawLabel, Result,
};

/// Write a minimal PNG header carrying the given dimensions; enough for the
/// dimension probe, which never decodes pixel data.
fn write_test_image(path: &Path, width: u32, height: u32) {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend(13u32.to_be_bytes());
    bytes.extend(*b"IHDR");
    bytes.extend(width.to_be_bytes());
    bytes.extend(height.to_be_bytes());
    bytes.extend([8u8, 0, 0, 0, 0]);
    bytes.extend([0u8, 0, 0, 0]);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn dsbi_full_page_cell_produces_expected_label_line() {
    let tmp = tempfile::tempdir().unwrap();
    let dsbi_root = tmp.path().join("dsbi");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&dsbi_root.join("book1/page1+recto.jpg"), 100, 100);
    fs::write(dsbi_root.join("book1/page1+recto.txt"), "0;0;100;100;123456").unwrap();

    let class_map = Mutex::new(ClassMap::new());
    let stats = process_dsbi(
        &dsbi_root,
        &labels_dir,
        &class_map,
        &DsbiAnnotationReader,
        0.0,
    )
    .unwrap();

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.boxes_written, 1);
    assert_eq!(stats.fallback_labels, 0);

    let label = fs::read_to_string(labels_dir.join("DSBI/book1/page1+recto.txt")).unwrap();
    assert_eq!(label, "0 0.500000 0.500000 1.000000 1.000000");
    assert!(labels_dir.join("DSBI/book1/page1+recto.jpg").exists());

    let class_map = class_map.into_inner().unwrap();
    assert_eq!(class_map.len(), 1);
    assert_eq!(class_map.id_to_label[0].as_str(), "111111");
}

#[test]
fn dsbi_page_without_annotation_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let dsbi_root = tmp.path().join("dsbi");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&dsbi_root.join("page1+recto.jpg"), 100, 100);
    write_test_image(&dsbi_root.join("page2+verso.jpg"), 100, 100);
    fs::write(dsbi_root.join("page2+verso.txt"), "").unwrap();

    let class_map = Mutex::new(ClassMap::new());
    let stats = process_dsbi(
        &dsbi_root,
        &labels_dir,
        &class_map,
        &DsbiAnnotationReader,
        0.0,
    )
    .unwrap();

    assert_eq!(stats.skipped_missing_annotation, 1);
    assert_eq!(stats.images_processed, 1);
    assert!(!labels_dir.join("DSBI/page1+recto.txt").exists());

    // Zero cells still produce an (empty) label file
    assert_eq!(
        fs::read_to_string(labels_dir.join("DSBI/page2+verso.txt")).unwrap(),
        ""
    );
}

#[test]
fn dsbi_rerun_is_idempotent_for_images() {
    let tmp = tempfile::tempdir().unwrap();
    let dsbi_root = tmp.path().join("dsbi");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&dsbi_root.join("page1+recto.jpg"), 100, 100);
    fs::write(dsbi_root.join("page1+recto.txt"), "10;10;20;20;1").unwrap();

    for _ in 0..2 {
        let class_map = Mutex::new(ClassMap::new());
        process_dsbi(
            &dsbi_root,
            &labels_dir,
            &class_map,
            &DsbiAnnotationReader,
            0.0,
        )
        .unwrap();
    }

    assert!(labels_dir.join("DSBI/page1+recto.jpg").exists());
    let label = fs::read_to_string(labels_dir.join("DSBI/page1+recto.txt")).unwrap();
    assert_eq!(label, "0 0.150000 0.150000 0.100000 0.100000");
}

// External readers plug in through the trait; page geometry comes from the
// probe, rectangles from the reader.
struct FixedRectReader;

impl LayoutAnnotationReader for FixedRectReader {
    fn read_rects(
        &self,
        _path: &Path,
        width: u32,
        height: u32,
        _tolerance: f64,
    ) -> Result<Vec<LayoutRect>> {
        Ok(vec![LayoutRect {
            left: 0.0,
            top: 0.0,
            right: width as f64 / 2.0,
            bottom: height as f64 / 2.0,
            label: RawLabel::Mask(0b000011),
        }])
    }
}

#[test]
fn dsbi_accepts_a_custom_layout_reader() {
    let tmp = tempfile::tempdir().unwrap();
    let dsbi_root = tmp.path().join("dsbi");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&dsbi_root.join("page1+recto.jpg"), 200, 100);
    fs::write(dsbi_root.join("page1+recto.txt"), "ignored by the reader").unwrap();

    let class_map = Mutex::new(ClassMap::new());
    process_dsbi(&dsbi_root, &labels_dir, &class_map, &FixedRectReader, 0.0).unwrap();

    let label = fs::read_to_string(labels_dir.join("DSBI/page1+recto.txt")).unwrap();
    assert_eq!(label, "0 0.250000 0.250000 0.500000 0.500000");
    assert_eq!(
        class_map.into_inner().unwrap().id_to_label[0].as_str(),
        "110000"
    );
}

#[test]
fn angelina_polygon_becomes_bounding_box() {
    let tmp = tempfile::tempdir().unwrap();
    let books_root = tmp.path().join("books");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&books_root.join("book1/0001.labeled.jpg"), 200, 100);
    fs::write(
        books_root.join("book1/0001.labeled.json"),
        r#"{
            "version": "4.5.6",
            "shapes": [
                {"label": "246", "points": [[10.0, 20.0], [30.0, 60.0], [20.0, 40.0]]}
            ],
            "imagePath": "0001.labeled.jpg"
        }"#,
    )
    .unwrap();

    let class_map = Mutex::new(ClassMap::new());
    let stats = process_angelina(
        &books_root,
        &labels_dir,
        &class_map,
        &AngelinaLabelTransform,
    )
    .unwrap();

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.boxes_written, 1);

    let label = fs::read_to_string(labels_dir.join("Angelina/book1/0001.labeled.txt")).unwrap();
    assert_eq!(label, "0 0.100000 0.400000 0.100000 0.400000");
    assert!(labels_dir.join("Angelina/book1/0001.labeled.jpg").exists());
    assert_eq!(
        class_map.into_inner().unwrap().id_to_label[0].as_str(),
        "010101"
    );
}

#[test]
fn angelina_empty_shape_list_writes_empty_label_file() {
    let tmp = tempfile::tempdir().unwrap();
    let books_root = tmp.path().join("books");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&books_root.join("book1/0001.labeled.jpg"), 100, 100);
    fs::write(
        books_root.join("book1/0001.labeled.json"),
        r#"{"shapes": []}"#,
    )
    .unwrap();

    let class_map = Mutex::new(ClassMap::new());
    let stats = process_angelina(
        &books_root,
        &labels_dir,
        &class_map,
        &AngelinaLabelTransform,
    )
    .unwrap();

    assert_eq!(stats.images_processed, 1);
    assert_eq!(stats.boxes_written, 0);
    assert_eq!(
        fs::read_to_string(labels_dir.join("Angelina/book1/0001.labeled.txt")).unwrap(),
        ""
    );
}

#[test]
fn angelina_missing_shapes_key_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let books_root = tmp.path().join("books");
    let labels_dir = tmp.path().join("yolo_labels");

    write_test_image(&books_root.join("book1/0001.labeled.jpg"), 100, 100);
    fs::write(books_root.join("book1/0001.labeled.json"), r#"{}"#).unwrap();

    let class_map = Mutex::new(ClassMap::new());
    let result = process_angelina(
        &books_root,
        &labels_dir,
        &class_map,
        &AngelinaLabelTransform,
    );
    assert!(result.is_err());
}

#[test]
fn collect_pairs_skips_images_without_labels() {
    let tmp = tempfile::tempdir().unwrap();
    let labels_root = tmp.path().join("yolo_labels");
    fs::create_dir_all(labels_root.join("DSBI")).unwrap();

    fs::write(labels_root.join("DSBI/a.jpg"), b"x").unwrap();
    fs::write(labels_root.join("DSBI/a.txt"), b"").unwrap();
    fs::write(labels_root.join("DSBI/b.jpg"), b"x").unwrap();

    let pairs = collect_pairs(&labels_root).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].image_path, labels_root.join("DSBI/a.jpg"));
}

#[test]
fn full_pipeline_produces_split_and_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let dsbi_root = tmp.path().join("dsbi");
    let books_root = tmp.path().join("books");

    write_test_image(&dsbi_root.join("vol1/page1+recto.jpg"), 100, 100);
    fs::write(dsbi_root.join("vol1/page1+recto.txt"), "0;0;100;100;123456").unwrap();

    write_test_image(&books_root.join("book1/0001.labeled.jpg"), 100, 100);
    fs::write(
        books_root.join("book1/0001.labeled.json"),
        r#"{"shapes": [{"label": "246", "points": [[0.0, 0.0], [50.0, 50.0]]}]}"#,
    )
    .unwrap();

    let args = Args {
        dsbi_root: Some(dsbi_root),
        angelina_root: Some(books_root),
        labels_dir: tmp.path().join("yolo_labels"),
        output_dir: tmp.path().join("yolo_dataset"),
        train_ratio: 0.5,
        seed: 7,
        tolerance: 0.0,
    };
    run(&args).unwrap();

    let count = |dir: PathBuf| fs::read_dir(dir).unwrap().count();
    assert_eq!(count(args.output_dir.join("images/train")), 1);
    assert_eq!(count(args.output_dir.join("images/val")), 1);
    assert_eq!(count(args.output_dir.join("labels/train")), 1);
    assert_eq!(count(args.output_dir.join("labels/val")), 1);

    // Flat names carry the source prefix, so cross-source collisions cannot
    // happen
    let train_image = fs::read_dir(args.output_dir.join("images/train"))
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .file_name()
        .into_string()
        .unwrap();
    assert!(train_image.starts_with("DSBI_") || train_image.starts_with("Angelina_"));

    let class_map = ClassMap::load(&args.labels_dir.join("class_map.json")).unwrap();
    assert_eq!(class_map.len(), 2);

    let yaml = fs::read_to_string(args.output_dir.join("data.yaml")).unwrap();
    assert!(yaml.contains("train: "));
    assert!(yaml.contains("val: "));
    assert!(yaml.contains("nc: 2"));
    assert!(yaml.contains("'111111'"));
    assert!(yaml.contains("'010101'"));
}
