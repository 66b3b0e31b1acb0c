//! Class index to human readable label mapping.
//!
//! Two file layouts are accepted and normalised into the same map:
//!
//! ```json
//! {"object_type_names": ["cat", "dog"]}
//! {"0": "cat", "1": ["canine", "dog"]}
//! ```
//!
//! In the second form a list value is reduced to its last element.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde_json::Value;

use crate::error::{Result, ServeError};

const OBJECT_TYPE_NAMES: &str = "object_type_names";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

impl LabelMap {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            ServeError::label_mapping(format!("could not open {}: {}", path.display(), e))
        })?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        let map = Self::from_json(value)?;

        info!("Loaded {} labels from {}", map.len(), path.display());

        Ok(map)
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let mapping = match value {
            Value::Object(mapping) => mapping,
            _ => {
                return Err(ServeError::label_mapping(
                    "mapping should be in \"class\": \"label\" format",
                ))
            }
        };

        if let Some(Value::Array(names)) = mapping.get(OBJECT_TYPE_NAMES) {
            let labels = names
                .iter()
                .enumerate()
                .map(|(index, name)| Ok((index, label_value(index, name)?)))
                .collect::<Result<_>>()?;

            return Ok(LabelMap { labels });
        }

        let mut labels = BTreeMap::new();
        for (key, value) in &mapping {
            // Lookups go through the decimal form of the index, so "01" or
            // "+1" could never match and would shadow "1".
            let index = key
                .parse::<usize>()
                .ok()
                .filter(|index| index.to_string() == *key)
                .ok_or_else(|| {
                    ServeError::label_mapping(format!(
                        "class '{}' is not a canonical non-negative integer index",
                        key
                    ))
                })?;

            let label = match value {
                Value::Array(candidates) => candidates.last().ok_or_else(|| {
                    ServeError::label_mapping(format!("class {} has an empty label list", index))
                })?,
                other => other,
            };

            labels.insert(index, label_value(index, label)?);
        }

        Ok(LabelMap { labels })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entries in ascending class index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(i, l)| (*i, l.as_str()))
    }
}

impl FromIterator<(usize, String)> for LabelMap {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        LabelMap {
            labels: iter.into_iter().collect(),
        }
    }
}

fn label_value(index: usize, value: &Value) -> Result<String> {
    match value {
        Value::String(label) if !label.is_empty() => Ok(label.clone()),
        Value::String(_) => Err(ServeError::label_mapping(format!(
            "class {} has an empty label",
            index
        ))),
        _ => Err(ServeError::label_mapping(format!(
            "label of class {} must be either str or List[str]",
            index
        ))),
    }
}
