use std::ops::Index;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// One example: a network input and the output it should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDatum {
    pub inputs: Vec<f64>,
    pub expected: Vec<f64>,
}

impl TrainingDatum {
    pub fn new(inputs: Vec<f64>, expected: Vec<f64>) -> TrainingDatum {
        TrainingDatum { inputs, expected }
    }
}

/// An ordered collection of examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingData(Vec<TrainingDatum>);

impl TrainingData {
    pub fn new() -> TrainingData {
        TrainingData(Vec::new())
    }

    /// Pairs up inputs and labels; both slices must have the same length.
    pub fn from_pairs(inputs: Vec<Vec<f64>>, expected: Vec<Vec<f64>>) -> Result<TrainingData> {
        if inputs.len() != expected.len() {
            return Err(Error::Config(format!(
                "{} input vectors but {} expected vectors",
                inputs.len(),
                expected.len()
            )));
        }
        Ok(TrainingData(
            inputs
                .into_iter()
                .zip(expected)
                .map(|(i, e)| TrainingDatum::new(i, e))
                .collect(),
        ))
    }

    pub fn push(&mut self, datum: TrainingDatum) {
        self.0.push(datum);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingDatum> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TrainingDatum] {
        &self.0
    }

    /// Disturbs the order with `rounds * len` random pair swaps.
    ///
    /// Not a uniform permutation; it only needs to break up the ordering.
    pub fn shuffle(&mut self, rounds: usize) {
        self.shuffle_with(rounds, &mut rand::thread_rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rounds: usize, rng: &mut R) {
        let n = self.0.len();
        if n < 2 {
            return;
        }
        for _ in 0..rounds * n {
            let a = rng.gen_range(0..n);
            let b = rng.gen_range(0..n);
            self.0.swap(a, b);
        }
    }

    /// Rescales a group of input columns to [0, 1] using the minimum and
    /// maximum found across all of them.
    ///
    /// A group whose values are all equal is mapped to 0.0.
    pub fn scale(&mut self, columns: &[usize]) -> Result<()> {
        if self.0.is_empty() || columns.is_empty() {
            return Ok(());
        }
        for (row, datum) in self.0.iter().enumerate() {
            if let Some(&col) = columns.iter().find(|&&c| c >= datum.inputs.len()) {
                return Err(Error::Config(format!(
                    "column {} is out of range for example {} with {} inputs",
                    col,
                    row,
                    datum.inputs.len()
                )));
            }
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for datum in &self.0 {
            for &col in columns {
                min = min.min(datum.inputs[col]);
                max = max.max(datum.inputs[col]);
            }
        }

        let range = max - min;
        if range == 0.0 {
            warn!(?columns, value = min, "scaling a constant column group, mapping to 0");
        }
        for datum in self.0.iter_mut() {
            for &col in columns {
                let v = &mut datum.inputs[col];
                *v = if range == 0.0 { 0.0 } else { (*v - min) / range };
            }
        }
        Ok(())
    }

    /// Splits in current order into `ceil(len * fraction)` and the remainder.
    pub fn split(&self, fraction: f64) -> Result<(TrainingData, TrainingData)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::Config(format!(
                "split fraction must be within [0, 1], got {}",
                fraction
            )));
        }
        let at = ((self.0.len() as f64 * fraction).ceil() as usize).min(self.0.len());
        let (left, right) = self.0.split_at(at);
        Ok((TrainingData(left.to_vec()), TrainingData(right.to_vec())))
    }
}

impl From<Vec<TrainingDatum>> for TrainingData {
    fn from(data: Vec<TrainingDatum>) -> Self {
        TrainingData(data)
    }
}

impl Index<usize> for TrainingData {
    type Output = TrainingDatum;

    fn index(&self, i: usize) -> &TrainingDatum {
        &self.0[i]
    }
}

impl<'a> IntoIterator for &'a TrainingData {
    type Item = &'a TrainingDatum;
    type IntoIter = std::slice::Iter<'a, TrainingDatum>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
