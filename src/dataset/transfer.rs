//! Copying and moving files between dataset directories, and realizing a
//! split assignment on disk.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use walkdir::WalkDir;

use super::index::{file_stem, ImageIndex};
use super::layout::{DatasetLayout, Split};
use super::split::SplitAssignment;
use crate::error::PrepError;

/// Whether source files are copied or relocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    Copy,
    Move,
}

/// Copies or moves `src` into `dst_dir`, keeping its file name and
/// overwriting any file already there.
pub fn transfer_file(src: &Path, dst_dir: &Path, mode: TransferMode) -> Result<PathBuf, PrepError> {
    let file_name = src.file_name().ok_or_else(|| PrepError::LayoutInvalid {
        path: src.to_path_buf(),
        message: "path has no file name".to_string(),
    })?;
    let dst = dst_dir.join(file_name);

    let wrap = |source: io::Error| PrepError::Transfer {
        from: src.to_path_buf(),
        to: dst.clone(),
        source,
    };

    fs::create_dir_all(dst_dir).map_err(&wrap)?;
    match mode {
        TransferMode::Copy => {
            fs::copy(src, &dst).map_err(&wrap)?;
        }
        TransferMode::Move => {
            if fs::rename(src, &dst).is_err() {
                // rename fails across filesystems
                fs::copy(src, &dst).map_err(&wrap)?;
                fs::remove_file(src).map_err(&wrap)?;
            }
        }
    }

    Ok(dst)
}

/// Images and annotation files currently on disk, per split.
///
/// Scanning every split, not only the one the images came from, makes a
/// split re-runnable: the population is the same before and after a
/// (possibly interrupted) run, so the same seed yields the same assignment.
#[derive(Clone, Debug, Default)]
pub struct SplitInventory {
    images: BTreeMap<Split, ImageIndex>,
    labels: BTreeMap<Split, HashMap<String, Vec<PathBuf>>>,
}

impl SplitInventory {
    /// Scans `images/<split>` and `labels/<split>` for every split. Missing
    /// split directories are treated as empty.
    pub fn scan(layout: &DatasetLayout) -> Result<Self, PrepError> {
        let mut inventory = Self::default();
        for split in Split::ALL {
            let images_dir = layout.images_dir(split);
            if images_dir.is_dir() {
                inventory.images.insert(split, ImageIndex::scan(&images_dir)?);
            }
            inventory
                .labels
                .insert(split, collect_files_by_stem(&layout.labels_dir(split))?);
        }
        Ok(inventory)
    }

    /// Distinct image stems across all splits, sorted.
    pub fn stems(&self) -> Vec<&str> {
        self.images
            .values()
            .flat_map(|index| index.stems())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of image stems found in `split`.
    pub fn image_count(&self, split: Split) -> usize {
        self.images.get(&split).map_or(0, ImageIndex::len)
    }

    fn images_in(&self, split: Split, stem: &str) -> &[PathBuf] {
        self.images
            .get(&split)
            .map(|index| index.paths_for(stem))
            .unwrap_or_default()
    }

    fn labels_in(&self, split: Split, stem: &str) -> &[PathBuf] {
        self.labels
            .get(&split)
            .and_then(|labels| labels.get(stem))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// What an in-place split did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub population: usize,
    /// Stems whose files were already in their assigned split.
    pub kept: usize,
    pub images_transferred: usize,
    pub labels_transferred: usize,
    pub images_without_labels: usize,
}

/// Moves every image, and every annotation file sharing its stem, into the
/// split `assignment` gives it.
///
/// Files are moved, never copied, so a stem's files live in exactly one
/// split afterwards. Files already in place are left alone, which makes
/// re-running with the same assignment a no-op.
pub fn realize_split(
    layout: &DatasetLayout,
    inventory: &SplitInventory,
    assignment: &SplitAssignment,
) -> Result<TransferSummary, PrepError> {
    let mut summary = TransferSummary {
        population: assignment.len(),
        ..Default::default()
    };

    for target in Split::ALL {
        let images_dst = layout.images_dir(target);
        let labels_dst = layout.labels_dir(target);
        let mut moved_stems = 0;

        for stem in assignment.members(target) {
            let mut images_moved = 0;
            let mut labels_moved = 0;

            for source in Split::ALL.into_iter().filter(|split| *split != target) {
                for image in inventory.images_in(source, stem) {
                    transfer_file(image, &images_dst, TransferMode::Move)?;
                    images_moved += 1;
                }
                // Labels follow on their own, so a run interrupted between an
                // image and its labels still converges.
                for label in inventory.labels_in(source, stem) {
                    transfer_file(label, &labels_dst, TransferMode::Move)?;
                    labels_moved += 1;
                }
            }

            if images_moved + labels_moved == 0 {
                summary.kept += 1;
                continue;
            }
            moved_stems += 1;
            summary.images_transferred += images_moved;
            summary.labels_transferred += labels_moved;
            if labels_moved == 0 && inventory.labels_in(target, stem).is_empty() {
                debug!("{stem}: no annotation file in any split");
                summary.images_without_labels += 1;
            }
        }

        info!("{moved_stems} image(s) moved into {target}");
    }

    Ok(summary)
}

/// Files directly inside `dir`, grouped by stem. A missing directory is empty.
pub(crate) fn collect_files_by_stem(dir: &Path) -> Result<HashMap<String, Vec<PathBuf>>, PrepError> {
    let mut files: HashMap<String, Vec<PathBuf>> = HashMap::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    for entry in WalkDir::new(dir)
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
        if let Some(stem) = file_stem(entry.path()) {
            files.entry(stem).or_default().push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}
