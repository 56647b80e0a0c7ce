use std::path::PathBuf;
use thiserror::Error;

/// The main error type for braille2yolo operations.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to parse annotation JSON {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed annotation in {path}: {message}")]
    Annotation { path: PathBuf, message: String },

    #[error("failed to read image dimensions of {path}: {source}")]
    ImageProbe {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("failed to write class map {path}: {source}")]
    ClassMapWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse class map {path}: {source}")]
    ClassMapParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
