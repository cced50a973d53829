pub mod train_config;
pub mod trainer;

pub use train_config::{StoppingCriteria, TrainConfig, UpdateMode};
pub use trainer::{evaluate, Trainer};
