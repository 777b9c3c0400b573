use std::path::PathBuf;
use thiserror::Error;

use crate::convert::ConversionReport;

/// The main error type for labelprep operations.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Invalid category configuration: {message}")]
    InvalidCategories { message: String },

    #[error("Invalid category configuration in {path}: {message}")]
    CategoryConfig { path: PathBuf, message: String },

    #[error("Failed to parse category YAML from {path}: {source}")]
    CategoryYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse annotation {path}: {message}")]
    AnnotationParse { path: PathBuf, message: String },

    #[error("No image with stem '{stem}' in {dir}")]
    ImageNotFound { stem: String, dir: PathBuf },

    #[error("Image {path} has unusable dimensions {width}x{height}")]
    ImageDimensionsInvalid {
        path: PathBuf,
        width: u64,
        height: u64,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite source annotation {path}")]
    OutputOverwritesSource { path: PathBuf },

    #[error("Invalid split parameters: {message}")]
    InvalidSplitParams { message: String },

    #[error("Failed to transfer {from} to {to}: {source}")]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion finished with {failed} failed write(s)")]
    ConversionFailed {
        failed: usize,
        report: Box<ConversionReport>,
    },

    #[error("Invalid parser configuration: {0}")]
    ParserConfig(String),
}
