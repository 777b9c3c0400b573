//! Annotation source formats.
//!
//! Each source format gets a parser implementing [`AnnotationParser`]. A
//! parser turns one annotation file into a sequence of per-object outcomes:
//! either a [`LabeledBox`] ready for normalization, or an [`ObjectDrop`]
//! saying why that object was left out. Dropping an object never fails the
//! file; only unreadable or structurally broken content does.

pub mod json;
pub mod text;

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::PrepError;
use crate::ir::{BBoxXYXY, LabeledBox, Pixel};

pub use json::JsonAnnotationParser;
pub use text::TextAnnotationParser;

/// Supported annotation source formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    /// Per-frame JSON documents (`frames[0].objects[]` with `box2d`).
    Json,
    /// Free-form text with `Bounding box for object ...` lines.
    Text,
}

impl SourceFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Text => "text",
        }
    }

    /// File extension of annotation files in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Text => "txt",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a single object was excluded from the output.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectDrop {
    /// The category is not in the vocabulary.
    UnknownCategory(String),
    /// The object carries no box.
    MissingBox,
    /// The box fails `xmax > xmin && ymax > ymin` (or is not finite).
    MalformedBox(BBoxXYXY<Pixel>),
}

impl ObjectDrop {
    pub fn code(&self) -> DropCode {
        match self {
            ObjectDrop::UnknownCategory(_) => DropCode::UnknownCategory,
            ObjectDrop::MissingBox => DropCode::MissingBox,
            ObjectDrop::MalformedBox(_) => DropCode::MalformedBox,
        }
    }
}

impl fmt::Display for ObjectDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectDrop::UnknownCategory(name) if name.is_empty() => {
                write!(f, "object has no category")
            }
            ObjectDrop::UnknownCategory(name) => write!(f, "unknown category '{name}'"),
            ObjectDrop::MissingBox => write!(f, "object has no box2d"),
            ObjectDrop::MalformedBox(bbox) => write!(
                f,
                "malformed box ({}, {}) - ({}, {})",
                bbox.xmin(),
                bbox.ymin(),
                bbox.xmax(),
                bbox.ymax()
            ),
        }
    }
}

/// Stable codes for dropped objects, used for report counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropCode {
    UnknownCategory,
    MissingBox,
    MalformedBox,
}

/// Outcome for one source object.
pub type ObjectOutcome = Result<LabeledBox, ObjectDrop>;

/// Single-pass sequence of outcomes for one annotation file.
pub type ObjectIter<'a> = Box<dyn Iterator<Item = ObjectOutcome> + Send + 'a>;

/// A parser for one annotation source format.
///
/// Parsers hold only read-only configuration, so one instance is shared by
/// every worker.
pub trait AnnotationParser: Send + Sync {
    fn format(&self) -> SourceFormat;

    /// Parses the raw bytes of one annotation file. `path` is used for
    /// error messages only.
    fn parse_bytes<'a>(&'a self, bytes: &[u8], path: &Path) -> Result<ObjectIter<'a>, PrepError>;

    /// Reads and parses one annotation file.
    fn parse_file<'a>(&'a self, path: &Path) -> Result<ObjectIter<'a>, PrepError> {
        let bytes = fs::read(path).map_err(PrepError::Io)?;
        self.parse_bytes(&bytes, path)
    }
}

/// Applies the well-formedness gate shared by every format.
pub(crate) fn checked_box(bbox: BBoxXYXY<Pixel>) -> Result<BBoxXYXY<Pixel>, ObjectDrop> {
    if bbox.is_well_formed() {
        Ok(bbox)
    } else {
        Err(ObjectDrop::MalformedBox(bbox))
    }
}
