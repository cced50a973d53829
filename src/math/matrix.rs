use rand::prelude::*;

use crate::error::{Error, Result};
use crate::math::ops::dot_product;

/// Magnitude bound of freshly randomized weights: values land in [-0.5, 0.5).
const RANDOM_HALF_WIDTH: f64 = 0.5;

/// A rectangular grid of trainable weights.
///
/// Rows are output units, columns are input units. Layers request one extra
/// column for the bias input themselves; the matrix knows nothing about it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<f64>>,
}

impl WeightMatrix {
    /// Zero-filled matrix of shape `outputs x inputs`.
    pub fn zeros(inputs: usize, outputs: usize) -> WeightMatrix {
        WeightMatrix {
            rows: outputs,
            cols: inputs,
            data: vec![vec![0.0; inputs]; outputs],
        }
    }

    /// Builds a matrix from row vectors, rejecting ragged input.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<WeightMatrix> {
        let cols = data.first().map_or(0, |row| row.len());
        if let Some((i, row)) = data.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(Error::Shape(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                cols
            )));
        }
        Ok(WeightMatrix {
            rows: data.len(),
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row][col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.iter().map(|row| row.as_slice())
    }

    /// Overwrites every weight with a uniform sample centred on zero.
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for row in self.data.iter_mut() {
            for w in row.iter_mut() {
                *w = rng.gen::<f64>() * 2.0 * RANDOM_HALF_WIDTH - RANDOM_HALF_WIDTH;
            }
        }
    }

    /// Matrix-vector product: one dot product per row, no nonlinearity.
    pub fn process(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.cols {
            return Err(Error::Shape(format!(
                "expected {} inputs but got {}",
                self.cols,
                input.len()
            )));
        }
        self.data.iter().map(|row| dot_product(row, input)).collect()
    }

    /// Elementwise `self += other`. Both matrices must have the same shape.
    pub fn add(&mut self, other: &WeightMatrix) -> Result<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(Error::Shape(format!(
                "cannot add a {}x{} matrix to a {}x{} matrix",
                other.rows, other.cols, self.rows, self.cols
            )));
        }
        for (row, other_row) in self.data.iter_mut().zip(other.data.iter()) {
            for (w, o) in row.iter_mut().zip(other_row.iter()) {
                *w += o;
            }
        }
        Ok(())
    }
}
