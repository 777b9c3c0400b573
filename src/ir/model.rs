//! Records flowing through conversion: measured images, labeled pixel
//! boxes from a source, and the normalized rows written for training.

use std::fmt;
use std::path::{Path, PathBuf};

use super::bbox::{BBoxCxCyWh, BBoxXYXY};
use super::ids::ClassId;
use super::space::{Normalized, Pixel};

/// An image on disk together with its pixel dimensions.
///
/// Both dimensions are strictly positive; [`ImageMeta::new`] refuses
/// anything else, so normalization never divides by zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMeta {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl ImageMeta {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            path: path.into(),
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A well-formed pixel box whose category already resolved to a class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledBox {
    pub class_id: ClassId,
    pub bbox: BBoxXYXY<Pixel>,
}

impl LabeledBox {
    pub fn new(class_id: ClassId, bbox: BBoxXYXY<Pixel>) -> Self {
        Self { class_id, bbox }
    }

    /// Normalizes the box against the image it belongs to.
    pub fn normalize(&self, image: &ImageMeta) -> AnnotationRecord {
        AnnotationRecord {
            class_id: self.class_id,
            bbox: self
                .bbox
                .normalize(image.width() as f64, image.height() as f64),
        }
    }
}

/// One normalized training row: `<class> <cx> <cy> <w> <h>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotationRecord {
    pub class_id: ClassId,
    pub bbox: BBoxCxCyWh<Normalized>,
}

impl fmt::Display for AnnotationRecord {
    /// Floats are rounded to six decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.bbox.cx, self.bbox.cy, self.bbox.w, self.bbox.h
        )
    }
}
