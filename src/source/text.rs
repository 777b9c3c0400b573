//! Plain-text source reader (Penn-Fudan style annotation files).
//!
//! Files are free-form text; the only lines that matter look like
//!
//! ```text
//! Bounding box for object 1 "PASpersonWalking" (Xmin, Ymin) - (Xmax, Ymax) : (160, 182) - (302, 431)
//! ```
//!
//! The format has a single implicit category, so every accepted match gets
//! the same class id. Files are decoded as ISO-8859-1 since they are not
//! guaranteed to be valid UTF-8.

use std::path::Path;

use regex::Regex;

use super::{checked_box, AnnotationParser, ObjectDrop, ObjectIter, ObjectOutcome, SourceFormat};
use crate::error::PrepError;
use crate::ir::{BBoxXYXY, ClassId, LabeledBox};

const BOX_LINE_PATTERN: &str = r#"Bounding box for object \d+ "([^"]*)" \(Xmin, Ymin\) - \(Xmax, Ymax\) : \((\d+), (\d+)\) - \((\d+), (\d+)\)"#;

/// Extracts boxes from `Bounding box for object ...` lines.
#[derive(Clone, Debug)]
pub struct TextAnnotationParser {
    class_id: ClassId,
    label_filter: Option<String>,
    pattern: Regex,
}

impl TextAnnotationParser {
    /// Creates a parser assigning `class_id` to every matched box.
    pub fn new(class_id: ClassId) -> Result<Self, PrepError> {
        let pattern =
            Regex::new(BOX_LINE_PATTERN).map_err(|err| PrepError::ParserConfig(err.to_string()))?;
        Ok(Self {
            class_id,
            label_filter: None,
            pattern,
        })
    }

    /// Only accept lines whose quoted label equals `label`; other matches are
    /// dropped as unknown categories.
    pub fn with_label_filter(mut self, label: impl Into<String>) -> Self {
        self.label_filter = Some(label.into());
        self
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Runs the pattern over already-decoded text.
    pub fn parse_str(&self, content: &str) -> Vec<ObjectOutcome> {
        self.pattern
            .captures_iter(content)
            .map(|caps| {
                let label = &caps[1];
                if let Some(expected) = &self.label_filter {
                    if label != expected {
                        return Err(ObjectDrop::UnknownCategory(label.to_string()));
                    }
                }

                let coord = |index: usize| caps[index].parse::<f64>().unwrap_or(f64::NAN);
                let bbox = checked_box(BBoxXYXY::from_xyxy(
                    coord(2),
                    coord(3),
                    coord(4),
                    coord(5),
                ))?;

                Ok(LabeledBox::new(self.class_id, bbox))
            })
            .collect()
    }
}

impl AnnotationParser for TextAnnotationParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Text
    }

    fn parse_bytes<'a>(&'a self, bytes: &[u8], _path: &Path) -> Result<ObjectIter<'a>, PrepError> {
        let content = decode_latin1(bytes);
        Ok(Box::new(self.parse_str(&content).into_iter()))
    }
}

/// ISO-8859-1 maps every byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Fuzz-only entrypoint for text annotation parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_text(bytes: &[u8]) -> Result<usize, PrepError> {
    let parser = TextAnnotationParser::new(ClassId::new(0))?;
    Ok(parser.parse_bytes(bytes, Path::new("<fuzz>"))?.count())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Compatible with PASCAL Annotation Version 1.00
Image filename : "PennFudanPed/PNGImages/FudanPed00001.png"
Image size (X x Y x C) : 559 x 536 x 3
Database : "The Penn-Fudan-Pedestrian Database"
Objects with ground truth : 2 { "PASpersonWalking" "PASpersonWalking" }
# Details for pedestrian 1 ("PASpersonWalking")
Original label for object 1 "PASpersonWalking" : "PennFudanPed"
Bounding box for object 1 "PASpersonWalking" (Xmin, Ymin) - (Xmax, Ymax) : (160, 182) - (302, 431)
Pixel mask for object 1 "PASpersonWalking" : "PennFudanPed/PedMasks/FudanPed00001_mask.png"

# Details for pedestrian 2 ("PASpersonWalking")
Original label for object 2 "PASpersonWalking" : "PennFudanPed"
Bounding box for object 2 "PASpersonWalking" (Xmin, Ymin) - (Xmax, Ymax) : (420, 171) - (535, 486)
Pixel mask for object 2 "PASpersonWalking" : "PennFudanPed/PedMasks/FudanPed00001_mask.png"
"#;

    fn parser() -> TextAnnotationParser {
        TextAnnotationParser::new(ClassId::new(0)).expect("pattern compiles")
    }

    #[test]
    fn extracts_every_bounding_box_line() {
        let got = parser().parse_str(SAMPLE);
        assert_eq!(got.len(), 2);

        let first = got[0].as_ref().expect("kept");
        assert_eq!(first.class_id, ClassId::new(0));
        assert_eq!(
            (first.bbox.xmin(), first.bbox.ymin(), first.bbox.xmax(), first.bbox.ymax()),
            (160.0, 182.0, 302.0, 431.0)
        );
        let second = got[1].as_ref().expect("kept");
        assert_eq!(second.bbox.xmin(), 420.0);
    }

    #[test]
    fn any_label_is_accepted_without_filter() {
        let line = r#"Bounding box for object 0 "X" (Xmin, Ymin) - (Xmax, Ymax) : (10, 20) - (110, 220)"#;
        let got = parser().parse_str(line);
        assert_eq!(got.len(), 1);
        assert!(got[0].is_ok());
    }

    #[test]
    fn label_filter_drops_other_labels() {
        let text = "Bounding box for object 1 \"PASpersonWalking\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 1) - (5, 5)\n\
                    Bounding box for object 2 \"PASbicycle\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 1) - (5, 5)\n";
        let got = parser()
            .with_label_filter("PASpersonWalking")
            .parse_str(text);
        assert_eq!(got.len(), 2);
        assert!(got[0].is_ok());
        assert_eq!(
            got[1],
            Err(ObjectDrop::UnknownCategory("PASbicycle".into()))
        );
    }

    #[test]
    fn non_matching_lines_are_ignored() {
        let text = "Bounding box for object 1 \"P\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 1) - (5)\n\
                    bounding box for object 1 \"P\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 1) - (5, 5)\n\
                    nothing here\n";
        assert!(parser().parse_str(text).is_empty());
    }

    #[test]
    fn inverted_box_is_dropped() {
        let line = r#"Bounding box for object 1 "P" (Xmin, Ymin) - (Xmax, Ymax) : (50, 20) - (10, 220)"#;
        let got = parser().parse_str(line);
        assert!(matches!(got[0], Err(ObjectDrop::MalformedBox(_))));
    }

    #[test]
    fn non_utf8_bytes_are_decoded_as_latin1() {
        let mut bytes = b"Database : \"Caf\xe9\"\n".to_vec();
        bytes.extend_from_slice(
            b"Bounding box for object 1 \"P\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 2) - (3, 4)\n",
        );
        let parser = parser();
        let got: Vec<_> = parser
            .parse_bytes(&bytes, Path::new("a.txt"))
            .expect("parse")
            .collect();
        assert_eq!(got.len(), 1);
        assert_eq!(decode_latin1(b"Caf\xe9"), "Caf\u{e9}");
    }
}
