use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .expect("invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}

/// Flatten a path inside `root` into a single file name that stays unique
/// across sources and books: `DSBI/book1/page+recto.jpg` becomes
/// `DSBI_book1_page+recto.jpg`. Without this, two books that both contain a
/// `0001.jpg` would overwrite each other in the flat split directories.
pub fn flat_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("_");
    sanitize_filename::sanitize(joined)
}
