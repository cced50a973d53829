use std::cell::Cell;
use std::rc::Rc;

use feedforward::{datasets, AboveThreshold, Classifier, Network, TrainConfig, Trainer, UpdateMode};

fn main() -> feedforward::Result<()> {
    tracing_subscriber::fmt::init();

    let mut data = datasets::xor();
    let mut network = Network::new(&[2, 3, 1])?;
    network.randomize();

    let config = TrainConfig::new(0.5, UpdateMode::Batch)
        .with_shuffle(3)
        .with_stopping(50000, 0.001);
    let mut trainer = Trainer::from_config(config)?;

    let iterations = Rc::new(Cell::new(0));
    let counter = iterations.clone();
    trainer.add_iteration_end_handler(move |_, outcome, iteration| {
        counter.set(iteration);
        if let Ok(mse) = outcome {
            if iteration % 1000 == 0 {
                println!("Iteration {iteration}: MSE = {:.6}", mse.combine());
            }
        }
    });
    trainer.train(&mut network, &mut data)?;
    println!("Stopped after {} iterations", iterations.get());

    let classifier = AboveThreshold::new(["true"], 0.5);
    for datum in &data {
        let output = network.forward(&datum.inputs)?;
        let labels = classifier.classify(&output);
        println!("Input: {:?} -> Output: {:.4} {:?}", datum.inputs, output[0], labels);
    }
    Ok(())
}
