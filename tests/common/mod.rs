#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    write_file(path, bmp_bytes(width, height));
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// A dataset root with `images/<split>` and `labels/<split>` created.
pub struct DatasetFixture {
    pub root: PathBuf,
}

impl DatasetFixture {
    pub fn new(root: &Path) -> Self {
        for split in ["train", "val"] {
            fs::create_dir_all(root.join("images").join(split)).expect("create images dir");
            fs::create_dir_all(root.join("labels").join(split)).expect("create labels dir");
        }
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn image(&self, split: &str, file_name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.root.join("images").join(split).join(file_name);
        write_bmp(&path, width, height);
        path
    }

    pub fn annotation(&self, split: &str, file_name: &str, contents: &str) -> PathBuf {
        let path = self.labels_path(split, file_name);
        write_file(&path, contents);
        path
    }

    pub fn labels_path(&self, split: &str, file_name: &str) -> PathBuf {
        self.root.join("labels").join(split).join(file_name)
    }

    pub fn read_label(&self, split: &str, stem: &str) -> String {
        fs::read_to_string(self.labels_path(split, &format!("{stem}.txt"))).expect("read label")
    }

    pub fn file_names(&self, kind: &str, split: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.root.join(kind).join(split))
            .expect("read dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

/// One BDD-style JSON document with the given objects in `frames[0]`.
pub fn frame_json(objects: &[(&str, Option<(f64, f64, f64, f64)>)]) -> String {
    let objects: Vec<String> = objects
        .iter()
        .map(|(category, bbox)| match bbox {
            Some((x1, y1, x2, y2)) => format!(
                r#"{{"category":"{category}","box2d":{{"x1":{x1},"y1":{y1},"x2":{x2},"y2":{y2}}}}}"#
            ),
            None => format!(r#"{{"category":"{category}","poly2d":[]}}"#),
        })
        .collect();
    format!(
        r#"{{"name":"frame","frames":[{{"timestamp":10000,"objects":[{}]}}]}}"#,
        objects.join(",")
    )
}

/// One Penn-Fudan style text line.
pub fn box_line(index: u32, label: &str, xmin: u32, ymin: u32, xmax: u32, ymax: u32) -> String {
    format!(
        "Bounding box for object {index} \"{label}\" (Xmin, Ymin) - (Xmax, Ymax) : ({xmin}, {ymin}) - ({xmax}, {ymax})"
    )
}
