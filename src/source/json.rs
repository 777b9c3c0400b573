//! Per-frame JSON source reader (BDD100K-style label files).
//!
//! A document holds a `frames` array; each frame holds `objects`, and an
//! object has a `category` string and an optional `box2d` with absolute
//! pixel corners:
//!
//! ```json
//! {
//!   "name": "b1c66a42-6f7d68ca",
//!   "frames": [
//!     {
//!       "timestamp": 10000,
//!       "objects": [
//!         { "category": "car", "id": 0, "box2d": { "x1": 45.2, "y1": 254.5, "x2": 357.8, "y2": 487.9 } },
//!         { "category": "lane", "id": 1, "poly2d": [] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Only `frames[0]` is read. Later frames are ignored until it is confirmed
//! whether they carry distinct annotations in real data.

use std::path::Path;

use serde::Deserialize;

use super::{checked_box, AnnotationParser, ObjectDrop, ObjectIter, ObjectOutcome, SourceFormat};
use crate::error::PrepError;
use crate::ir::{BBoxXYXY, CategoryMap, LabeledBox};

#[derive(Debug, Deserialize)]
struct FrameDocument {
    #[serde(default)]
    frames: Vec<Frame>,
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    objects: Vec<FrameObject>,
}

#[derive(Debug, Deserialize)]
struct FrameObject {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    box2d: Option<Box2d>,
}

#[derive(Debug, Deserialize)]
struct Box2d {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Reads per-frame JSON documents, resolving categories through a shared
/// [`CategoryMap`].
#[derive(Clone, Debug)]
pub struct JsonAnnotationParser {
    categories: CategoryMap,
}

impl JsonAnnotationParser {
    pub fn new(categories: CategoryMap) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &CategoryMap {
        &self.categories
    }

    // Category is resolved before the box is looked at. A missing or null
    // category is an unknown one.
    fn classify(&self, object: FrameObject) -> ObjectOutcome {
        let category = object.category.unwrap_or_default();
        let class_id = self
            .categories
            .id_for(&category)
            .ok_or(ObjectDrop::UnknownCategory(category))?;

        let raw = object.box2d.ok_or(ObjectDrop::MissingBox)?;
        let bbox = checked_box(BBoxXYXY::from_xyxy(raw.x1, raw.y1, raw.x2, raw.y2))?;

        Ok(LabeledBox::new(class_id, bbox))
    }
}

impl AnnotationParser for JsonAnnotationParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn parse_bytes<'a>(&'a self, bytes: &[u8], path: &Path) -> Result<ObjectIter<'a>, PrepError> {
        let document: FrameDocument =
            serde_json::from_slice(bytes).map_err(|source| PrepError::AnnotationParse {
                path: path.to_path_buf(),
                message: source.to_string(),
            })?;

        let objects = document
            .frames
            .into_iter()
            .next()
            .map(|frame| frame.objects)
            .unwrap_or_default();

        Ok(Box::new(
            objects.into_iter().map(move |object| self.classify(object)),
        ))
    }
}

/// Fuzz-only entrypoint for JSON document parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_json(bytes: &[u8]) -> Result<usize, PrepError> {
    use crate::ir::CategoryPreset;

    let parser = JsonAnnotationParser::new(CategoryMap::preset(CategoryPreset::Bdd100k));
    Ok(parser.parse_bytes(bytes, Path::new("<fuzz>"))?.count())
}
