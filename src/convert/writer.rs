//! Writing per-image label files and the dataset `data.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PrepError;
use crate::ir::{AnnotationRecord, CategoryMap};
use crate::source::SourceFormat;

/// Extension of the label files this tool writes.
pub const LABEL_EXTENSION: &str = "txt";

/// Writes `<out_dir>/<stem>.txt` files.
#[derive(Clone, Debug)]
pub struct OutputWriter {
    out_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{stem}.{LABEL_EXTENSION}"))
    }

    /// Writes one record per line, replacing any existing file. An empty
    /// `records` slice still produces an (empty) file.
    pub fn write(&self, stem: &str, records: &[AnnotationRecord]) -> Result<PathBuf, PrepError> {
        let path = self.output_path(stem);
        let wrap = |source| PrepError::OutputWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.out_dir).map_err(wrap)?;
        fs::write(&path, render_records(records)).map_err(wrap)?;
        Ok(path)
    }
}

/// Joins records with `\n`. There is no trailing newline.
pub fn render_records(records: &[AnnotationRecord]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// True when writing output for `stem` would clobber the annotation it
/// came from. Only possible when the output directory is the input
/// directory and the source already has the label extension.
pub(crate) fn would_overwrite(source: &Path, output: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => source == output,
    }
}

/// Writes `<root>/data.yaml` pointing at the split image directories and
/// listing class names by id.
pub fn write_data_yaml(root: &Path, categories: &CategoryMap) -> Result<PathBuf, PrepError> {
    let dataset_path = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

    let mut yaml = format!(
        "path: {}\ntrain: images/train\nval: images/val\n\nnames:\n",
        yaml_single_quoted(&dataset_path.to_string_lossy())
    );
    for (idx, name) in categories.names().iter().enumerate() {
        yaml.push_str(&format!("  {}: {}\n", idx, yaml_single_quoted(name)));
    }

    let path = root.join("data.yaml");
    fs::write(&path, yaml).map_err(|source| PrepError::OutputWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// Source annotation files directly inside `dir` with the extension that
/// `format` reads, sorted by path.
pub fn collect_annotation_files(dir: &Path, format: SourceFormat) -> Result<Vec<PathBuf>, PrepError> {
    if !dir.is_dir() {
        return Err(PrepError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: "annotation directory does not exist".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| PrepError::LayoutInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(format.extension()));
        if matches {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}
