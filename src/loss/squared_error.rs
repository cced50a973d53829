use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Per-output-unit squared error, summed or averaged over examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SquaredError(Vec<f64>);

impl SquaredError {
    pub fn zeros(len: usize) -> SquaredError {
        SquaredError(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Elementwise `self += other`.
    pub fn accumulate(&mut self, other: &SquaredError) {
        for (s, o) in self.0.iter_mut().zip(other.0.iter()) {
            *s += o;
        }
    }

    /// Divides every component by `count`; a zero count leaves values untouched.
    pub fn average(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        for s in self.0.iter_mut() {
            *s /= count as f64;
        }
    }

    /// Sum over all output units.
    pub fn combine(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Sum of components weighted by `weights / sum(weights)`.
    pub fn weighted_combination(&self, weights: &[f64]) -> Result<f64> {
        if weights.len() != self.0.len() {
            return Err(Error::Config(format!(
                "{} weights given for {} error components",
                weights.len(),
                self.0.len()
            )));
        }
        let total: f64 = weights.iter().sum();
        Ok(self
            .0
            .iter()
            .zip(weights.iter())
            .map(|(e, w)| (w / total) * e)
            .sum())
    }
}

impl From<Vec<f64>> for SquaredError {
    fn from(values: Vec<f64>) -> Self {
        SquaredError(values)
    }
}

impl Index<usize> for SquaredError {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

/// Squared error of each output unit: `(expected - actual)^2`.
pub fn calc_error(expected: &[f64], actual: &[f64]) -> Result<SquaredError> {
    if expected.len() != actual.len() {
        return Err(Error::DataMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(SquaredError(
        expected
            .iter()
            .zip(actual.iter())
            .map(|(e, a)| (e - a).powi(2))
            .collect(),
    ))
}

/// The squared errors of a whole evaluation run, one entry per example.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllErrors(Vec<SquaredError>);

impl AllErrors {
    pub fn new() -> AllErrors {
        AllErrors(Vec::new())
    }

    pub fn push(&mut self, error: SquaredError) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SquaredError> {
        self.0.iter()
    }

    /// Elementwise sum across all examples.
    pub fn total(&self) -> SquaredError {
        let width = self.0.first().map_or(0, SquaredError::len);
        let mut sum = SquaredError::zeros(width);
        for e in &self.0 {
            sum.accumulate(e);
        }
        sum
    }

    /// Elementwise mean across all examples.
    pub fn average(&self) -> SquaredError {
        let mut avg = self.total();
        avg.average(self.0.len());
        avg
    }
}

impl From<Vec<SquaredError>> for AllErrors {
    fn from(errors: Vec<SquaredError>) -> Self {
        AllErrors(errors)
    }
}

impl Index<usize> for AllErrors {
    type Output = SquaredError;

    fn index(&self, i: usize) -> &SquaredError {
        &self.0[i]
    }
}
