use crate::data::training_data::{TrainingData, TrainingDatum};

/// The XOR truth table: 2 inputs, 1 output.
pub fn xor() -> TrainingData {
    vec![
        TrainingDatum::new(vec![1.0, 0.0], vec![1.0]),
        TrainingDatum::new(vec![0.0, 1.0], vec![1.0]),
        TrainingDatum::new(vec![0.0, 0.0], vec![0.0]),
        TrainingDatum::new(vec![1.0, 1.0], vec![0.0]),
    ]
    .into()
}
