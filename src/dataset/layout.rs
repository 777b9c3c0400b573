//! Typed view of a dataset root with `images/<split>` and `labels/<split>`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PrepError;

/// A dataset partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    /// Directory name under `images/` and `labels/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// A dataset root whose `images/` and `labels/` directories exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
    images_dir: PathBuf,
    labels_dir: PathBuf,
}

impl DatasetLayout {
    /// Validates an existing dataset root.
    pub fn discover(root: &Path) -> Result<Self, PrepError> {
        if !root.is_dir() {
            return Err(PrepError::LayoutInvalid {
                path: root.to_path_buf(),
                message: "dataset root must be a directory".to_string(),
            });
        }

        let images_dir = root.join("images");
        if !images_dir.is_dir() {
            return Err(PrepError::LayoutInvalid {
                path: images_dir,
                message: "missing images/ directory".to_string(),
            });
        }

        let labels_dir = root.join("labels");
        if !labels_dir.is_dir() {
            return Err(PrepError::LayoutInvalid {
                path: labels_dir,
                message: "missing labels/ directory".to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            images_dir,
            labels_dir,
        })
    }

    /// Creates (or reuses) a dataset root with every split directory.
    pub fn create(root: &Path) -> Result<Self, PrepError> {
        for split in Split::ALL {
            fs::create_dir_all(root.join("images").join(split.dir_name()))
                .map_err(PrepError::Io)?;
            fs::create_dir_all(root.join("labels").join(split.dir_name()))
                .map_err(PrepError::Io)?;
        }
        Self::discover(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.images_dir.join(split.dir_name())
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.labels_dir.join(split.dir_name())
    }

    /// Splits that have both an image and a label directory.
    pub fn present_splits(&self) -> Vec<Split> {
        Split::ALL
            .into_iter()
            .filter(|split| self.images_dir(*split).is_dir() && self.labels_dir(*split).is_dir())
            .collect()
    }
}
