use crate::error::{Error, Result};

/// Logistic transfer function `1 / (1 + e^-x)`, bounded to (0, 1).
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative expressed through the activation `y = sigmoid(x)`.
pub fn sigmoid_derivative(y: f64) -> f64 {
    y * (1.0 - y)
}

/// Sum of the elementwise products of two equal-length vectors.
pub fn dot_product(left: &[f64], right: &[f64]) -> Result<f64> {
    if left.len() != right.len() {
        return Err(Error::Shape(format!(
            "dot product arguments have different lengths: {} vs {}",
            left.len(),
            right.len()
        )));
    }
    Ok(left.iter().zip(right.iter()).map(|(l, r)| l * r).sum())
}
