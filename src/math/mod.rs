pub mod matrix;
pub mod ops;

pub use matrix::WeightMatrix;
pub use ops::{dot_product, sigmoid};
