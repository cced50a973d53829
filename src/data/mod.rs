pub mod csv;
pub mod datasets;
pub mod training_data;

pub use csv::{load_csv, parse_csv, LabelMode};
pub use training_data::{TrainingData, TrainingDatum};
