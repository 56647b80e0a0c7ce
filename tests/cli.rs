use assert_cmd::Command;

#[test]
fn prints_version() {
    let mut cmd = Command::cargo_bin("braille2yolo").unwrap();
    cmd.arg("-V");
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("braille2yolo"));
}

#[test]
fn rejects_out_of_range_train_ratio() {
    let mut cmd = Command::cargo_bin("braille2yolo").unwrap();
    cmd.args(["--train_ratio", "1.5"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("RATIO"));
}

#[test]
fn runs_with_no_sources_and_writes_an_empty_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let labels_dir = tmp.path().join("yolo_labels");
    let output_dir = tmp.path().join("yolo_dataset");

    let mut cmd = Command::cargo_bin("braille2yolo").unwrap();
    cmd.args([
        "--labels_dir",
        labels_dir.to_str().unwrap(),
        "--output_dir",
        output_dir.to_str().unwrap(),
    ]);
    cmd.assert().success();

    assert!(labels_dir.join("class_map.json").exists());
    let yaml = std::fs::read_to_string(output_dir.join("data.yaml")).unwrap();
    assert!(yaml.contains("nc: 0"));
    assert!(yaml.contains("names: []"));
}
