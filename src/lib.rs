//! A small fully-connected feed-forward neural network with sigmoid units,
//! trained by backpropagation.
//!
//! ```no_run
//! use feedforward::{datasets, Network, TrainConfig, Trainer, UpdateMode};
//!
//! let mut data = datasets::xor();
//! let mut network = Network::new(&[2, 4, 1]).unwrap();
//! network.randomize();
//!
//! let mut trainer = Trainer::new(TrainConfig::new(0.5, UpdateMode::Online));
//! trainer.add_simple_stopping_criteria(50000, 0.001);
//! trainer.train(&mut network, &mut data).unwrap();
//! ```

pub mod classify;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod train;

// Convenience re-exports
pub use classify::{classification_error, AboveThreshold, BestOf, Classifier};
pub use data::{datasets, TrainingData, TrainingDatum};
pub use error::{Error, Result};
pub use layers::dense::{Activation, Layer};
pub use loss::squared_error::{AllErrors, SquaredError};
pub use math::matrix::WeightMatrix;
pub use network::network::Network;
pub use train::{evaluate, StoppingCriteria, TrainConfig, Trainer, UpdateMode};
