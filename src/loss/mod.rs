pub mod squared_error;

pub use squared_error::{calc_error, AllErrors, SquaredError};
