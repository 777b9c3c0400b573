//! Building a fresh training dataset from a flat pair of raw directories.
//!
//! The raw image directory is split once, every image is copied into
//! `<out>/images/<split>/`, and the annotation file sharing its stem is
//! converted into `<out>/labels/<split>/`. Raw inputs are only read.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::convert::{
    collect_annotation_files, ConversionPipeline, ConversionReport, FileOutcome, OutputWriter,
    SkipReason,
};
use crate::dataset::index::file_stem;
use crate::dataset::{transfer_file, DatasetLayout, DatasetSplitter, ImageIndex, Split, TransferMode};
use crate::error::PrepError;

/// Inputs of a `prepare` run.
#[derive(Clone, Debug)]
pub struct PrepareOptions {
    pub images_dir: PathBuf,
    pub annotations_dir: PathBuf,
    pub output_root: PathBuf,
    pub splitter: DatasetSplitter,
    pub seed: u64,
}

/// What a `prepare` run produced.
#[derive(Clone, Debug, Serialize)]
pub struct PrepareSummary {
    pub train_images: usize,
    pub val_images: usize,
    /// Images copied without any annotation file to convert.
    pub images_without_annotations: usize,
    pub report: ConversionReport,
}

/// Splits, copies and converts a raw dataset into `options.output_root`.
pub fn prepare_dataset(
    options: &PrepareOptions,
    pipeline: &ConversionPipeline,
) -> Result<PrepareSummary, PrepError> {
    for raw in [&options.images_dir, &options.annotations_dir] {
        if same_path(raw, &options.output_root) {
            return Err(PrepError::OutputOverwritesSource { path: raw.clone() });
        }
    }

    let raw_images = ImageIndex::scan(&options.images_dir)?;
    let annotations = collect_annotation_files(&options.annotations_dir, pipeline.format())?;

    let stems = raw_images.stems();
    let assignment = options.splitter.split_seeded(&stems, options.seed);
    info!(
        "splitting {} image(s) with val ratio {} and seed {}: {} train, {} val",
        assignment.len(),
        options.splitter.val_ratio(),
        options.seed,
        assignment.members(Split::Train).len(),
        assignment.members(Split::Val).len()
    );

    let layout = DatasetLayout::create(&options.output_root)?;
    let mut report = ConversionReport::new(pipeline.format().name());
    let mut images_without_annotations = 0;

    let mut sources_by_split: [Vec<PathBuf>; 2] = [Vec::new(), Vec::new()];
    for source in annotations {
        let Some(stem) = file_stem(&source) else {
            continue;
        };
        match assignment.get(&stem) {
            Some(Split::Train) => sources_by_split[0].push(source),
            Some(Split::Val) => sources_by_split[1].push(source),
            None => {
                let message = format!(
                    "no image named '{stem}.*' in {}",
                    options.images_dir.display()
                );
                warn!("{}: {message}", source.display());
                report.record(&FileOutcome::Skipped {
                    stem,
                    reason: SkipReason::MissingImage,
                    message,
                });
            }
        }
    }

    for (split, sources) in Split::ALL.into_iter().zip(sources_by_split) {
        let images_dst = layout.images_dir(split);
        for stem in assignment.members(split) {
            if let Some(path) = raw_images.path_for(stem) {
                transfer_file(path, &images_dst, TransferMode::Copy)?;
            }
        }

        let annotated = sources
            .iter()
            .filter_map(|source| file_stem(source))
            .collect::<HashSet<_>>();
        images_without_annotations += assignment
            .members(split)
            .iter()
            .filter(|stem| !annotated.contains(stem.as_str()))
            .count();

        let images = ImageIndex::scan(&images_dst)?;
        let writer = OutputWriter::new(layout.labels_dir(split));
        let split_report = pipeline.convert_files(&sources, &images, &writer);
        info!(
            "{split}: {} image(s), {} label file(s) written",
            assignment.members(split).len(),
            split_report.counts.written
        );
        report.merge(split_report);
    }

    if images_without_annotations > 0 {
        warn!("{images_without_annotations} image(s) had no annotation file");
    }

    Ok(PrepareSummary {
        train_images: assignment.members(Split::Train).len(),
        val_images: assignment.members(Split::Val).len(),
        images_without_annotations,
        report,
    })
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CategoryMap, CategoryPreset, ClassId};
    use crate::source::{JsonAnnotationParser, TextAnnotationParser};
    use crate::test_support::bmp_bytes;

    fn raw_dataset(root: &Path, count: usize) -> (PathBuf, PathBuf) {
        let images = root.join("PNGImages");
        let annotations = root.join("Annotation");
        fs::create_dir_all(&images).expect("mkdir images");
        fs::create_dir_all(&annotations).expect("mkdir annotations");
        for i in 0..count {
            fs::write(images.join(format!("FudanPed{i:05}.bmp")), bmp_bytes(100, 50))
                .expect("write image");
            fs::write(
                annotations.join(format!("FudanPed{i:05}.txt")),
                "Bounding box for object 1 \"PASpersonWalking\" (Xmin, Ymin) - (Xmax, Ymax) : (10, 5) - (60, 45)\n",
            )
            .expect("write annotation");
        }
        (images, annotations)
    }

    fn text_pipeline() -> ConversionPipeline {
        ConversionPipeline::new(Box::new(
            TextAnnotationParser::new(ClassId::new(0)).expect("parser"),
        ))
    }

    #[test]
    fn prepares_split_layout_with_labels() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images_dir, annotations_dir) = raw_dataset(temp.path(), 10);
        let output_root = temp.path().join("out");

        let options = PrepareOptions {
            images_dir: images_dir.clone(),
            annotations_dir,
            output_root: output_root.clone(),
            splitter: DatasetSplitter::new(0.2).expect("ratio"),
            seed: 42,
        };
        let summary = prepare_dataset(&options, &text_pipeline()).expect("prepare");

        assert_eq!(summary.train_images, 8);
        assert_eq!(summary.val_images, 2);
        assert_eq!(summary.report.counts.written, 10);
        assert_eq!(summary.images_without_annotations, 0);

        let val_labels: Vec<_> = fs::read_dir(output_root.join("labels/val"))
            .expect("read val labels")
            .collect();
        assert_eq!(val_labels.len(), 2);

        let label = fs::read_to_string(output_root.join("labels/train").join(
            fs::read_dir(output_root.join("labels/train"))
                .expect("read train labels")
                .next()
                .expect("one label")
                .expect("entry")
                .file_name(),
        ))
        .expect("read label");
        assert_eq!(label, "0 0.350000 0.500000 0.500000 0.800000");

        // raw images are untouched
        assert_eq!(fs::read_dir(images_dir).expect("read raw").count(), 10);
    }

    #[test]
    fn annotation_without_image_is_reported() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images_dir, annotations_dir) = raw_dataset(temp.path(), 3);
        fs::write(annotations_dir.join("orphan.json"), "{}").expect("write orphan");

        let options = PrepareOptions {
            images_dir,
            annotations_dir,
            output_root: temp.path().join("out"),
            splitter: DatasetSplitter::new(0.5).expect("ratio"),
            seed: 1,
        };
        let pipeline = ConversionPipeline::new(Box::new(JsonAnnotationParser::new(
            CategoryMap::preset(CategoryPreset::PennFudan),
        )));
        let summary = prepare_dataset(&options, &pipeline).expect("prepare");

        assert_eq!(summary.report.skipped_count(SkipReason::MissingImage), 1);
        assert_eq!(summary.report.issues[0].stem, "orphan");
        assert_eq!(summary.images_without_annotations, 3);
    }

    #[test]
    fn output_may_not_be_a_raw_directory() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images_dir, annotations_dir) = raw_dataset(temp.path(), 1);

        let options = PrepareOptions {
            images_dir,
            annotations_dir: annotations_dir.clone(),
            output_root: annotations_dir,
            splitter: DatasetSplitter::new(0.5).expect("ratio"),
            seed: 1,
        };
        let err = prepare_dataset(&options, &text_pipeline()).unwrap_err();
        assert!(matches!(err, PrepError::OutputOverwritesSource { .. }));
    }
}
