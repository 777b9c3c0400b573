//! The conversion pipeline: annotation files in, YOLO label files out.
//!
//! Files are independent of each other, so they are processed on a bounded
//! worker pool. Per-file problems become [`FileOutcome::Skipped`] entries in
//! the [`ConversionReport`]; they never abort the run. Outcomes are collected
//! in input order so reports and logs are stable across runs.

pub mod report;
pub mod writer;

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::dataset::index::file_stem;
use crate::dataset::{DatasetLayout, ImageIndex, Split};
use crate::error::PrepError;
use crate::ir::AnnotationRecord;
use crate::source::{AnnotationParser, ObjectDrop, SourceFormat};

pub use report::{ConversionCounts, ConversionReport, FileIssue, FileOutcome, SkipReason};
pub use writer::{
    collect_annotation_files, render_records, write_data_yaml, OutputWriter, LABEL_EXTENSION,
};

use writer::would_overwrite;

/// Converts annotation files of one source format.
pub struct ConversionPipeline {
    parser: Box<dyn AnnotationParser>,
    jobs: usize,
}

impl ConversionPipeline {
    pub fn new(parser: Box<dyn AnnotationParser>) -> Self {
        Self { parser, jobs: 0 }
    }

    /// Caps the worker pool. `0` lets rayon pick (one worker per core).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn format(&self) -> SourceFormat {
        self.parser.format()
    }

    /// Converts one annotation file. Never fails; every problem is folded
    /// into the returned outcome.
    pub fn convert_file(
        &self,
        source: &Path,
        images: &ImageIndex,
        writer: &OutputWriter,
    ) -> FileOutcome {
        let Some(stem) = file_stem(source) else {
            return skipped(
                source.display().to_string(),
                SkipReason::MalformedContent,
                "file name has no usable stem".to_string(),
            );
        };

        if !images.contains(&stem) {
            let message = format!("no image named '{stem}.*' in {}", images.dir().display());
            warn!("{}: {message}", source.display());
            return skipped(stem, SkipReason::MissingImage, message);
        }

        let mut boxes = Vec::new();
        let mut drops: Vec<ObjectDrop> = Vec::new();
        match self.parser.parse_file(source) {
            Ok(objects) => {
                for outcome in objects {
                    match outcome {
                        Ok(labeled) => boxes.push(labeled),
                        Err(drop) => {
                            debug!("{}: dropped object: {drop}", source.display());
                            drops.push(drop);
                        }
                    }
                }
            }
            Err(err) => {
                warn!("{}: {err}", source.display());
                return skipped(stem, SkipReason::MalformedContent, err.to_string());
            }
        }

        let image = match images.resolve(&stem) {
            Ok(image) => image,
            Err(err) => {
                warn!("{}: {err}", source.display());
                let reason = match err {
                    PrepError::ImageNotFound { .. } => SkipReason::MissingImage,
                    _ => SkipReason::ImageDecodeFailure,
                };
                return skipped(stem, reason, err.to_string());
            }
        };

        let records: Vec<AnnotationRecord> =
            boxes.iter().map(|labeled| labeled.normalize(&image)).collect();

        let output = writer.output_path(&stem);
        if would_overwrite(source, &output) {
            let err = PrepError::OutputOverwritesSource {
                path: source.to_path_buf(),
            };
            error!("{err}");
            return skipped(stem, SkipReason::WriteFailure, err.to_string());
        }

        match writer.write(&stem, &records) {
            Ok(path) => FileOutcome::Written {
                stem,
                path,
                records: records.len(),
                drops,
            },
            Err(err) => {
                error!("{err}");
                skipped(stem, SkipReason::WriteFailure, err.to_string())
            }
        }
    }

    /// Converts every file in `sources`, in parallel, and reports in input
    /// order.
    pub fn convert_files(
        &self,
        sources: &[PathBuf],
        images: &ImageIndex,
        writer: &OutputWriter,
    ) -> ConversionReport {
        let work = || -> Vec<FileOutcome> {
            sources
                .par_iter()
                .map(|source| self.convert_file(source, images, writer))
                .collect()
        };

        let outcomes = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(err) => {
                warn!("could not build worker pool ({err}); using the global pool");
                work()
            }
        };

        let mut report = ConversionReport::new(self.format().name());
        for outcome in &outcomes {
            report.record(outcome);
        }
        report
    }

    /// Converts `labels/<split>` of a dataset layout.
    ///
    /// Images come from `images/<split>`. Output goes to `out_dir` when
    /// given, else next to the sources in `labels/<split>`.
    pub fn convert_split(
        &self,
        layout: &DatasetLayout,
        split: Split,
        out_dir: Option<&Path>,
    ) -> Result<ConversionReport, PrepError> {
        let images = ImageIndex::scan(&layout.images_dir(split))?;
        let labels_dir = layout.labels_dir(split);
        let sources = collect_annotation_files(&labels_dir, self.format())?;
        let writer = OutputWriter::new(match out_dir {
            Some(dir) => dir.join(split.dir_name()),
            None => labels_dir,
        });

        info!(
            "{split}: {} annotation file(s), {} image(s)",
            sources.len(),
            images.len()
        );
        Ok(self.convert_files(&sources, &images, &writer))
    }
}

fn skipped(stem: String, reason: SkipReason, message: String) -> FileOutcome {
    FileOutcome::Skipped {
        stem,
        reason,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CategoryMap, CategoryPreset, ClassId};
    use crate::source::{JsonAnnotationParser, TextAnnotationParser};
    use crate::test_support::bmp_bytes;
    use std::fs;

    fn json_pipeline() -> ConversionPipeline {
        ConversionPipeline::new(Box::new(JsonAnnotationParser::new(CategoryMap::preset(
            CategoryPreset::Bdd100k,
        ))))
        .with_jobs(2)
    }

    const PEDESTRIAN: &str = r#"{"frames":[{"objects":[
        {"category":"pedestrian","box2d":{"x1":10,"y1":20,"x2":110,"y2":220}}
    ]}]}"#;

    #[test]
    fn converts_json_file_next_to_image() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images_dir = temp.path().join("images");
        let labels_dir = temp.path().join("labels");
        fs::create_dir_all(&images_dir).expect("mkdir images");
        fs::create_dir_all(&labels_dir).expect("mkdir labels");
        fs::write(images_dir.join("a.bmp"), bmp_bytes(200, 400)).expect("write image");
        fs::write(labels_dir.join("a.json"), PEDESTRIAN).expect("write annotation");

        let images = ImageIndex::scan(&images_dir).expect("scan");
        let writer = OutputWriter::new(&labels_dir);
        let outcome = json_pipeline().convert_file(&labels_dir.join("a.json"), &images, &writer);

        assert!(matches!(outcome, FileOutcome::Written { records: 1, .. }));
        assert_eq!(
            fs::read_to_string(labels_dir.join("a.txt")).expect("read output"),
            "0 0.300000 0.300000 0.500000 0.500000"
        );
    }

    #[test]
    fn missing_image_is_skipped_without_output() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("lonely.json"), PEDESTRIAN).expect("write annotation");

        let images = ImageIndex::scan(temp.path()).expect("scan");
        let writer = OutputWriter::new(temp.path());
        let outcome =
            json_pipeline().convert_file(&temp.path().join("lonely.json"), &images, &writer);

        assert!(matches!(
            outcome,
            FileOutcome::Skipped {
                reason: SkipReason::MissingImage,
                ..
            }
        ));
        assert!(!temp.path().join("lonely.txt").exists());
    }

    #[test]
    fn undecodable_image_is_skipped() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("a.jpg"), b"not really a jpeg").expect("write image");
        fs::write(temp.path().join("a.json"), PEDESTRIAN).expect("write annotation");

        let images = ImageIndex::scan(temp.path()).expect("scan");
        let writer = OutputWriter::new(temp.path());
        let outcome = json_pipeline().convert_file(&temp.path().join("a.json"), &images, &writer);

        assert!(matches!(
            outcome,
            FileOutcome::Skipped {
                reason: SkipReason::ImageDecodeFailure,
                ..
            }
        ));
    }

    #[test]
    fn text_source_in_place_is_refused() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("a.bmp"), bmp_bytes(10, 10)).expect("write image");
        fs::write(temp.path().join("a.txt"), "").expect("write annotation");

        let parser = TextAnnotationParser::new(ClassId::new(0)).expect("parser");
        let pipeline = ConversionPipeline::new(Box::new(parser));
        let images = ImageIndex::scan(temp.path()).expect("scan");
        let writer = OutputWriter::new(temp.path());
        let outcome = pipeline.convert_file(&temp.path().join("a.txt"), &images, &writer);

        assert!(matches!(
            outcome,
            FileOutcome::Skipped {
                reason: SkipReason::WriteFailure,
                ..
            }
        ));
    }

    #[test]
    fn convert_files_reports_in_input_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut sources = Vec::new();
        for i in 0..8 {
            let stem = format!("img_{i}");
            if i != 3 {
                fs::write(temp.path().join(format!("{stem}.bmp")), bmp_bytes(200, 400))
                    .expect("write image");
            }
            let source = temp.path().join(format!("{stem}.json"));
            fs::write(&source, PEDESTRIAN).expect("write annotation");
            sources.push(source);
        }

        let images = ImageIndex::scan(temp.path()).expect("scan");
        let writer = OutputWriter::new(temp.path().join("out"));
        let report = json_pipeline().convert_files(&sources, &images, &writer);

        assert_eq!(report.counts.files, 8);
        assert_eq!(report.counts.written, 7);
        assert_eq!(report.counts.records, 7);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].stem, "img_3");
        assert!(!report.has_failures());
    }
}
