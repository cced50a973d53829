// Trains the built-in XOR network and prints what it learned.
//
//   feedforward [path/to/train_config.json]
use std::process::ExitCode;

use feedforward::{datasets, evaluate, Network, Result, TrainConfig, Trainer, UpdateMode};

fn default_config() -> TrainConfig {
    TrainConfig::new(0.5, UpdateMode::Online)
        .with_stopping(20000, 0.001)
        .with_logging(1000)
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => TrainConfig::load_json(path)?,
        None => default_config(),
    };

    let mut data = datasets::xor();
    let mut network = Network::new(&[2, 4, 1])?;
    network.randomize();

    let mut trainer = Trainer::from_config(config)?;
    trainer.train(&mut network, &mut data)?;

    let errors = evaluate(&mut network, &data)?;
    for datum in &data {
        let output = network.forward(&datum.inputs)?;
        println!("Input: {:?} -> Output: {:.4}", datum.inputs, output[0]);
    }
    println!("Mean squared error: {:.6}", errors.average().combine());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
