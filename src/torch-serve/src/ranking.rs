//! Top-K selection over probability rows and translation of class indices
//! into labels.

use std::cmp::Ordering;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Result, ServeError};
use crate::labels::LabelMap;

/// Label → probability pairs of one image, in ranking order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    entries: Vec<(String, f32)>,
}

impl Prediction {
    /// Set the probability of `label`. A label seen before keeps its
    /// position and takes the new probability.
    pub fn insert(&mut self, label: String, probability: f32) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = probability,
            None => self.entries.push((label, probability)),
        }
    }

    pub fn entries(&self) -> &[(String, f32)] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, probability) in &self.entries {
            // Widened so the JSON carries the full value of the f32.
            map.serialize_entry(label, &f64::from(*probability))?;
        }
        map.end()
    }
}

/// The `k` most probable classes of every row, as parallel
/// `(probabilities, class indices)` rows.
///
/// Rows are ordered by descending probability and equal probabilities keep
/// the lower class index first. Rows shorter than `k` are returned whole.
pub fn top_k(probs: &[Vec<f32>], k: usize) -> (Vec<Vec<f32>>, Vec<Vec<usize>>) {
    probs
        .iter()
        .map(|row| {
            let mut order: Vec<usize> = (0..row.len()).collect();
            order.sort_by(|&a, &b| row[b].partial_cmp(&row[a]).unwrap_or(Ordering::Equal));
            order.truncate(k);

            (order.iter().map(|&i| row[i]).collect(), order)
        })
        .unzip()
}

/// Pair every probability row with its class index row and name each class.
///
/// Without `classes` every row is assumed to cover `0..len(probs[0])`;
/// without a `mapping` the class index itself becomes the label.
pub fn map_class_to_label(
    probs: &[Vec<f32>],
    mapping: Option<&LabelMap>,
    classes: Option<&[Vec<usize>]>,
) -> Result<Vec<Prediction>> {
    let default_classes;
    let classes = match classes {
        Some(classes) => classes,
        None => {
            let width = probs
                .first()
                .ok_or_else(|| ServeError::mapping("no probability rows to map"))?
                .len();
            default_classes = vec![(0..width).collect::<Vec<_>>(); probs.len()];
            &default_classes[..]
        }
    };

    classes
        .iter()
        .zip(probs)
        .map(|(row_classes, row_probs)| -> Result<Prediction> {
            let mut prediction = Prediction::default();
            for (&class, &probability) in row_classes.iter().zip(row_probs) {
                let label = match mapping {
                    Some(mapping) => mapping
                        .get(class)
                        .ok_or_else(|| {
                            ServeError::mapping(format!("no label for class index {}", class))
                        })?
                        .to_owned(),
                    None => class.to_string(),
                };
                prediction.insert(label, probability);
            }
            Ok(prediction)
        })
        .collect()
}
