//! Closed category vocabulary.
//!
//! The ordered `names` list is what training configuration enumerates; the
//! position of a name is its class id. Source labels resolve through the
//! lookup table, which also carries aliases (several source spellings for
//! one class). Anything outside the table is unmapped.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::ids::ClassId;
use crate::error::PrepError;

/// Built-in vocabularies for the datasets this tool was first written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryPreset {
    /// BDD100K detection classes, including the dataset's short spellings.
    Bdd100k,
    /// Penn-Fudan pedestrians: a single class.
    PennFudan,
}

const BDD100K_NAMES: [&str; 10] = [
    "pedestrian",
    "rider",
    "car",
    "truck",
    "bus",
    "train",
    "motorcycle",
    "bicycle",
    "traffic light",
    "traffic sign",
];

const BDD100K_ALIASES: [(&str, &str); 3] = [
    ("person", "pedestrian"),
    ("motor", "motorcycle"),
    ("bike", "bicycle"),
];

const PENN_FUDAN_NAMES: [&str; 1] = ["pedestrian"];

/// A fixed `label -> class id` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryMap {
    names: Vec<String>,
    lookup: HashMap<String, ClassId>,
}

impl CategoryMap {
    /// Builds a map from ordered class names; id = position.
    pub fn from_names<I, S>(names: I) -> Result<Self, PrepError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_aliases(names, std::iter::empty::<(String, String)>())
    }

    /// Builds a map from ordered class names plus `(alias, canonical)` pairs.
    pub fn with_aliases<I, S, A, K, V>(names: I, aliases: A) -> Result<Self, PrepError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        A: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut lookup = HashMap::with_capacity(names.len());

        for (index, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(config_error(format!("class {index} has an empty name")));
            }
            let id = u32::try_from(index)
                .map_err(|_| config_error(format!("too many classes ({})", names.len())))?;
            if lookup.insert(name.clone(), ClassId::new(id)).is_some() {
                return Err(config_error(format!("duplicate class name '{name}'")));
            }
        }

        for (alias, canonical) in aliases {
            let alias = alias.into();
            let canonical = canonical.into();
            let id = *lookup.get(&canonical).ok_or_else(|| {
                config_error(format!(
                    "alias '{alias}' points at unknown class '{canonical}'"
                ))
            })?;
            if let Some(existing) = lookup.insert(alias.clone(), id) {
                if existing != id {
                    return Err(config_error(format!(
                        "alias '{alias}' conflicts with an existing class name"
                    )));
                }
            }
        }

        Ok(Self { names, lookup })
    }

    /// Builds one of the built-in vocabularies.
    pub fn preset(preset: CategoryPreset) -> Self {
        let (names, aliases): (&[&str], &[(&str, &str)]) = match preset {
            CategoryPreset::Bdd100k => (&BDD100K_NAMES, &BDD100K_ALIASES),
            CategoryPreset::PennFudan => (&PENN_FUDAN_NAMES, &[]),
        };

        Self::with_aliases(names.iter().copied(), aliases.iter().copied())
            .expect("built-in presets are valid vocabularies")
    }

    /// Reads a YAML vocabulary file.
    ///
    /// `names` may be a sequence or an `index: name` mapping (the shape of a
    /// training `data.yaml`); `aliases` is an optional `alias: canonical` map.
    pub fn from_yaml_file(path: &Path) -> Result<Self, PrepError> {
        let data = fs::read_to_string(path).map_err(PrepError::Io)?;
        let parsed: CategoryFile =
            serde_yaml::from_str(&data).map_err(|source| PrepError::CategoryYamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        let names = match parsed.names {
            CategoryNames::Sequence(names) => names,
            CategoryNames::Mapping(mapping) => {
                let mut names = Vec::with_capacity(mapping.len());
                for (expected, (index, name)) in mapping.into_iter().enumerate() {
                    if index != expected {
                        return Err(PrepError::CategoryConfig {
                            path: path.to_path_buf(),
                            message: format!("class ids must be dense; missing id {expected}"),
                        });
                    }
                    names.push(name);
                }
                names
            }
        };

        Self::with_aliases(names, parsed.aliases).map_err(|err| match err {
            PrepError::InvalidCategories { message } => PrepError::CategoryConfig {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Resolves a source label. Unknown labels yield `None`.
    pub fn id_for(&self, name: &str) -> Option<ClassId> {
        self.lookup.get(name).copied()
    }

    /// Canonical class name for an id.
    pub fn name_of(&self, id: ClassId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Ordered canonical names; index = class id.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    names: CategoryNames,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

fn config_error(message: String) -> PrepError {
    PrepError::InvalidCategories { message }
}
