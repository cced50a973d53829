pub mod dense;

pub use dense::{Activation, Layer};
