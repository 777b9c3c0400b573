//! Stem-keyed index of the images in one directory.
//!
//! Scanning only records which stems exist; dimensions are read from the
//! image header on [`ImageIndex::resolve`], so annotation files that are
//! skipped for other reasons never pay for it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::error::PrepError;
use crate::ir::ImageMeta;

/// Recognized image extensions, in tie-break order when two files share a stem.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];

#[derive(Clone, Debug, Default)]
pub struct ImageIndex {
    dir: PathBuf,
    // Every image file per stem, preferred extension first.
    images: HashMap<String, Vec<PathBuf>>,
}

impl ImageIndex {
    /// Scans the files directly inside `dir`.
    pub fn scan(dir: &Path) -> Result<Self, PrepError> {
        if !dir.is_dir() {
            return Err(PrepError::LayoutInvalid {
                path: dir.to_path_buf(),
                message: "image directory does not exist".to_string(),
            });
        }

        let mut images: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| PrepError::LayoutInvalid {
                path: dir.to_path_buf(),
                message: format!("failed while traversing directory: {source}"),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let (Some(stem), Some(_)) = (file_stem(path), extension_rank(path)) else {
                continue;
            };
            images.entry(stem).or_default().push(path.to_path_buf());
        }

        for (stem, paths) in images.iter_mut() {
            paths.sort_by_key(|path| extension_rank(path));
            if paths.len() > 1 {
                warn!(
                    "{} image files share the stem '{stem}' in {}; using {}",
                    paths.len(),
                    dir.display(),
                    paths[0].display()
                );
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            images,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.images.contains_key(stem)
    }

    /// The preferred image for `stem`.
    pub fn path_for(&self, stem: &str) -> Option<&Path> {
        self.paths_for(stem).first().map(PathBuf::as_path)
    }

    /// Every image file with `stem`, preferred first.
    pub fn paths_for(&self, stem: &str) -> &[PathBuf] {
        self.images.get(stem).map(Vec::as_slice).unwrap_or_default()
    }

    /// Looks up the image for `stem` and reads its dimensions.
    ///
    /// Fails with [`PrepError::ImageNotFound`] when no image has that stem and
    /// with [`PrepError::ImageDimensionRead`] or
    /// [`PrepError::ImageDimensionsInvalid`] when the header cannot be used.
    pub fn resolve(&self, stem: &str) -> Result<ImageMeta, PrepError> {
        let path = self
            .path_for(stem)
            .ok_or_else(|| PrepError::ImageNotFound {
                stem: stem.to_string(),
                dir: self.dir.clone(),
            })?;
        read_image_meta(path)
    }

    /// All stems, sorted.
    pub fn stems(&self) -> Vec<&str> {
        let mut stems: Vec<&str> = self.images.keys().map(String::as_str).collect();
        stems.sort_unstable();
        stems
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Reads width/height from an image header.
pub fn read_image_meta(path: &Path) -> Result<ImageMeta, PrepError> {
    let size = imagesize::size(path).map_err(|source| PrepError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = || PrepError::ImageDimensionsInvalid {
        path: path.to_path_buf(),
        width: size.width as u64,
        height: size.height as u64,
    };
    let width: u32 = size.width.try_into().map_err(|_| invalid())?;
    let height: u32 = size.height.try_into().map_err(|_| invalid())?;

    ImageMeta::new(path, width, height).ok_or_else(invalid)
}

pub(crate) fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

fn extension_rank(path: &Path) -> Option<usize> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    IMAGE_EXTENSIONS
        .iter()
        .position(|allowed| ext.eq_ignore_ascii_case(allowed))
}
