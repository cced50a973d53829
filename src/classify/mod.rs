//! Adapters that turn a network output vector into class labels.

use crate::data::training_data::TrainingData;
use crate::error::{Error, Result};
use crate::network::network::Network;

/// Maps an output vector to zero or more labels.
pub trait Classifier {
    fn classify(&self, outputs: &[f64]) -> Vec<String>;
}

/// Picks the label of the single largest output.
#[derive(Debug, Clone)]
pub struct BestOf {
    labels: Vec<String>,
}

impl BestOf {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        BestOf {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl Classifier for BestOf {
    fn classify(&self, outputs: &[f64]) -> Vec<String> {
        argmax(outputs)
            .and_then(|i| self.labels.get(i))
            .cloned()
            .into_iter()
            .collect()
    }
}

/// Picks every label whose output is strictly above `threshold`.
#[derive(Debug, Clone)]
pub struct AboveThreshold {
    labels: Vec<String>,
    threshold: f64,
}

impl AboveThreshold {
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>, threshold: f64) -> Self {
        AboveThreshold {
            labels: labels.into_iter().map(Into::into).collect(),
            threshold,
        }
    }
}

impl Classifier for AboveThreshold {
    fn classify(&self, outputs: &[f64]) -> Vec<String> {
        outputs
            .iter()
            .zip(self.labels.iter())
            .filter(|(y, _)| **y > self.threshold)
            .map(|(_, label)| label.clone())
            .collect()
    }
}

/// Fraction of examples whose classified output differs from their
/// classified expected vector.
pub fn classification_error<C: Classifier + ?Sized>(
    network: &mut Network,
    data: &TrainingData,
    classifier: &C,
) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::Config("no examples to classify".into()));
    }
    let mut wrong = 0;
    for datum in data {
        let output = network.forward(&datum.inputs)?;
        if classifier.classify(&output) != classifier.classify(&datum.expected) {
            wrong += 1;
        }
    }
    Ok(wrong as f64 / data.len() as f64)
}

/// Index of the maximum element, `None` for an empty slice.
fn argmax(v: &[f64]) -> Option<usize> {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}
