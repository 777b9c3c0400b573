//! Typed data model shared by every stage of preparation.
//!
//! Boxes carry their coordinate space in the type, so a pixel box cannot be
//! written where a normalized one is expected:
//!
//! - sources produce [`LabeledBox`]es: a [`ClassId`] plus a
//!   [`BBoxXYXY<Pixel>`] that has already passed the well-formedness gate;
//! - [`LabeledBox::normalize`] turns one into an [`AnnotationRecord`] against
//!   the [`ImageMeta`] of its image;
//! - an [`AnnotationRecord`] displays as a training row.
//!
//! # Example
//!
//! ```
//! use labelprep::ir::{BBoxXYXY, CategoryMap, CategoryPreset, ImageMeta, LabeledBox};
//!
//! let categories = CategoryMap::preset(CategoryPreset::Bdd100k);
//! let class_id = categories.id_for("car").unwrap();
//! let image = ImageMeta::new("frame.jpg", 200, 100).unwrap();
//! let labeled = LabeledBox::new(class_id, BBoxXYXY::from_xyxy(0.0, 0.0, 100.0, 50.0));
//!
//! assert_eq!(
//!     labeled.normalize(&image).to_string(),
//!     "2 0.250000 0.250000 0.500000 0.500000"
//! );
//! ```

mod bbox;
mod category;
mod ids;
mod model;
mod space;

pub use bbox::{BBoxCxCyWh, BBoxXYXY};
pub use category::{CategoryMap, CategoryPreset};
pub use ids::ClassId;
pub use model::{AnnotationRecord, ImageMeta, LabeledBox};
pub use space::{Normalized, Pixel};
