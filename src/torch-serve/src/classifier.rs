use std::path::Path;

use image::RgbImage;
use log::debug;
use tch::{Kind, Tensor};

use crate::engine::{Engine, TorchScriptModel};
use crate::error::{Result, ServeError};
use crate::labels::LabelMap;
use crate::payload;
use crate::preprocess::{self, Interpolation};
use crate::ranking::{self, Prediction};
use crate::timer::Timer;

/// Everything a process needs to answer requests. Built once at cold start
/// and only read afterwards.
pub struct ImageClassifier {
    /// Model forward pass
    engine: Box<dyn Engine>,

    /// Class index translation
    labels: LabelMap,

    /// Labels returned per image
    top_k: usize,

    /// Resize filter of the preprocessing step
    interpolation: Interpolation,
}

impl ImageClassifier {
    pub fn new(engine: Box<dyn Engine>, labels: LabelMap, top_k: usize) -> Self {
        ImageClassifier {
            engine,
            labels,
            top_k,
            interpolation: Interpolation::default(),
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Load a TorchScript model and its label mapping from local files.
    pub fn load(model_path: &Path, labels_path: &Path, top_k: usize) -> Result<Self> {
        let engine = TorchScriptModel::load(model_path)?;
        let labels = LabelMap::load(labels_path)?;

        Ok(ImageClassifier::new(Box::new(engine), labels, top_k))
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Class probabilities, one row per image of the batch.
    pub fn run(&self, input: &Tensor) -> Result<Vec<Vec<f32>>> {
        let mut t = Timer::new_start("Running model");

        let logits = self.engine.forward(input)?;
        let probs = logits.softmax(-1, Kind::Float);

        t.stop();

        let (rows, classes) = probs.size2()?;
        if classes == 0 {
            return Err(ServeError::mapping("model produced no class scores"));
        }
        debug!("Model returned {} rows of {} classes", rows, classes);

        let flat = Vec::<f32>::try_from(&probs.contiguous().view(-1))?;

        Ok(flat
            .chunks(classes as usize)
            .map(<[f32]>::to_vec)
            .collect())
    }

    pub fn classify(&self, image: &RgbImage) -> Result<Vec<Prediction>> {
        let mut t = Timer::new_start("Preprocessing image");
        let input = preprocess::preprocess(image, self.interpolation);
        t.stop();

        let probs = self.run(&input)?;
        let (top_probs, top_classes) = ranking::top_k(&probs, self.top_k);

        ranking::map_class_to_label(&top_probs, Some(&self.labels), Some(&top_classes))
    }

    /// Classify encoded image bytes (PNG, JPEG, ...).
    pub fn classify_from_raw(&self, data: &[u8]) -> Result<Vec<Prediction>> {
        let mut t = Timer::new_start("Decoding image");
        let image = payload::decode_bytes_to_image(data)?;
        t.stop();

        self.classify(&image)
    }

    /// Classify the base64 image of an invocation body.
    pub fn classify_from_data_uri(&self, body: &str) -> Result<Vec<Prediction>> {
        let data = payload::decode_data_uri(body)?;
        self.classify_from_raw(&data)
    }
}
