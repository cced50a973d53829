use std::fmt;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::data::training_data::TrainingData;
use crate::error::{Error, Result};
use crate::layers::dense::{Activation, Layer};
use crate::loss::squared_error::{calc_error, AllErrors, SquaredError};
use crate::math::{matrix::WeightMatrix, ops::sigmoid_derivative};
use crate::network::network::Network;
use crate::train::train_config::{TrainConfig, UpdateMode, DEFAULT_LEARNING_RATE};

/// Called after every training iteration with the trainer, the iteration's
/// mean squared error (or the error that ended it) and the 1-based iteration.
pub type IterationCallback =
    Box<dyn FnMut(&mut Trainer, std::result::Result<&SquaredError, &Error>, usize)>;

/// Called once when training starts or ends.
pub type TrainingCallback = Box<dyn FnMut(&mut Trainer)>;

/// Backpropagation trainer.
///
/// Training runs until a callback calls [`Trainer::request_termination`], so
/// register stopping criteria before calling [`Trainer::train`].
pub struct Trainer {
    config: TrainConfig,
    iteration_end: Vec<IterationCallback>,
    training_start: Vec<TrainingCallback>,
    training_end: Vec<TrainingCallback>,
    terminate: bool,
}

impl Default for Trainer {
    fn default() -> Self {
        Trainer::new(TrainConfig::default())
    }
}

impl fmt::Debug for Trainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trainer")
            .field("config", &self.config)
            .field("iteration_end", &self.iteration_end.len())
            .field("training_start", &self.training_start.len())
            .field("training_end", &self.training_end.len())
            .field("terminate", &self.terminate)
            .finish()
    }
}

impl Trainer {
    /// A trainer with no callbacks registered.
    pub fn new(config: TrainConfig) -> Self {
        Trainer {
            config,
            iteration_end: Vec::new(),
            training_start: Vec::new(),
            training_end: Vec::new(),
            terminate: false,
        }
    }

    /// Validates `config` and registers the stopping criteria and progress
    /// logging it asks for.
    pub fn from_config(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let stopping = config.stopping;
        let log_every = config.log_every;
        let mut trainer = Trainer::new(config);
        if let Some(stop) = stopping {
            trainer.add_simple_stopping_criteria(stop.max_iterations, stop.min_error);
        }
        if let Some(every) = log_every {
            trainer.add_progress_logging(every);
        }
        Ok(trainer)
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TrainConfig {
        &mut self.config
    }

    pub fn add_iteration_end_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Trainer, std::result::Result<&SquaredError, &Error>, usize) + 'static,
    {
        self.iteration_end.push(Box::new(handler));
    }

    pub fn add_training_start_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Trainer) + 'static,
    {
        self.training_start.push(Box::new(handler));
    }

    pub fn add_training_end_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Trainer) + 'static,
    {
        self.training_end.push(Box::new(handler));
    }

    /// Ends training after the current iteration's callbacks have run.
    pub fn request_termination(&mut self) {
        self.terminate = true;
    }

    pub fn termination_requested(&self) -> bool {
        self.terminate
    }

    /// Stops once the iteration count exceeds `max_iterations` or the combined
    /// mean squared error falls below `min_error`.
    pub fn add_simple_stopping_criteria(&mut self, max_iterations: usize, min_error: f64) {
        self.add_iteration_end_handler(move |trainer, outcome, iteration| {
            if iteration > max_iterations {
                trainer.request_termination();
            }
            if let Ok(mse) = outcome {
                if mse.combine() < min_error {
                    trainer.request_termination();
                }
            }
        });
    }

    /// Logs the combined error every `every` iterations.
    pub fn add_progress_logging(&mut self, every: usize) {
        self.add_iteration_end_handler(move |_, outcome, iteration| {
            if let Ok(mse) = outcome {
                if every > 0 && iteration % every == 0 {
                    info!("Iteration {}: MSE={}", iteration, mse.combine());
                }
            }
        });
    }

    /// Runs training iterations until a callback requests termination or an
    /// iteration fails. Iteration-end callbacks still see a failed iteration.
    pub fn train(&mut self, network: &mut Network, data: &mut TrainingData) -> Result<()> {
        if self.config.learning_rate == 0.0 {
            self.config.learning_rate = DEFAULT_LEARNING_RATE;
        }
        self.config.validate()?;
        self.terminate = false;

        info!(
            examples = data.len(),
            learning_rate = self.config.learning_rate,
            mode = ?self.config.update_mode,
            "training started"
        );
        self.run_training_handlers(|t| &mut t.training_start);

        let start = Instant::now();
        let mut iteration = 0;
        let mut last_error;
        loop {
            iteration += 1;
            let outcome = self.one_iteration(network, data);
            self.run_iteration_handlers(outcome.as_ref(), iteration);

            match outcome {
                Ok(mse) => {
                    last_error = mse.combine();
                    debug!(iteration, mse = last_error, "iteration complete");
                }
                Err(e) => {
                    warn!(iteration, error = %e, "training aborted");
                    return Err(e);
                }
            }
            if self.terminate {
                break;
            }
        }

        self.run_training_handlers(|t| &mut t.training_end);
        info!(
            iterations = iteration,
            mse = last_error,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "training finished"
        );
        Ok(())
    }

    /// One full pass over `data`: forward, backpropagate and update, online or
    /// batched. Returns the per-output mean squared error of the pass.
    pub fn one_iteration(
        &self,
        network: &mut Network,
        data: &mut TrainingData,
    ) -> Result<SquaredError> {
        if data.is_empty() {
            return Err(Error::Config("no training examples".into()));
        }
        if self.config.shuffle_rounds > 0 {
            data.shuffle(self.config.shuffle_rounds);
        }

        let rate = self.config.learning_rate;
        let batch = self.config.update_mode == UpdateMode::Batch;
        let mut total = SquaredError::zeros(network.output_size());
        let mut pending: Vec<WeightMatrix> = if batch {
            network.layers().iter().map(Layer::empty_update).collect()
        } else {
            Vec::new()
        };

        for datum in data.iter() {
            let trace = network.trace(&datum.inputs)?;
            let output = trace.last().map_or(&[][..], Activation::output);
            if datum.expected.len() != output.len() {
                return Err(Error::DataMismatch {
                    expected: datum.expected.len(),
                    actual: output.len(),
                });
            }
            total.accumulate(&calc_error(&datum.expected, output)?);

            let deltas = backpropagate(network.layers(), &trace, &datum.expected)?;
            for (i, (activation, layer_deltas)) in trace.iter().zip(&deltas).enumerate() {
                let update = network.layers()[i].compute_update(activation, layer_deltas, rate)?;
                if batch {
                    pending[i].add(&update)?;
                } else {
                    network.layers_mut()[i].apply_update(&update)?;
                }
            }
        }

        for (layer, update) in network.layers_mut().iter_mut().zip(&pending) {
            layer.apply_update(update)?;
        }

        total.average(data.len());
        Ok(total)
    }

    fn run_iteration_handlers(
        &mut self,
        outcome: std::result::Result<&SquaredError, &Error>,
        iteration: usize,
    ) {
        let mut handlers = std::mem::take(&mut self.iteration_end);
        for handler in handlers.iter_mut() {
            handler(self, outcome, iteration);
        }
        // keep handlers registered from inside a callback
        handlers.append(&mut self.iteration_end);
        self.iteration_end = handlers;
    }

    fn run_training_handlers<S>(&mut self, select: S)
    where
        S: Fn(&mut Trainer) -> &mut Vec<TrainingCallback>,
    {
        let mut handlers = std::mem::take(select(self));
        for handler in handlers.iter_mut() {
            handler(self);
        }
        handlers.append(select(self));
        *select(self) = handlers;
    }
}

/// Squared error of every example in `data`, without touching the weights.
pub fn evaluate(network: &mut Network, data: &TrainingData) -> Result<AllErrors> {
    let mut errors = AllErrors::new();
    for datum in data {
        let output = network.forward(&datum.inputs)?;
        errors.push(calc_error(&datum.expected, &output)?);
    }
    Ok(errors)
}

/// Output-layer deltas: `(actual - expected) * actual * (1 - actual)`.
pub(crate) fn output_deltas(actual: &[f64], expected: &[f64]) -> Vec<f64> {
    actual
        .iter()
        .zip(expected.iter())
        .map(|(a, e)| (a - e) * sigmoid_derivative(*a))
        .collect()
}

/// Deltas for every layer, last layer first computed, returned in layer order.
fn backpropagate(layers: &[Layer], trace: &[Activation], expected: &[f64]) -> Result<Vec<Vec<f64>>> {
    let Some(last) = trace.last() else {
        return Ok(Vec::new());
    };
    let n = trace.len();
    let mut deltas = vec![Vec::new(); n];
    deltas[n - 1] = output_deltas(last.output(), expected);
    for i in (0..n - 1).rev() {
        deltas[i] = layers[i + 1].propagate_deltas(&trace[i + 1], &deltas[i + 1])?;
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datasets;
    use crate::data::training_data::TrainingDatum;
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded_network(sizes: &[usize], seed: u64) -> Network {
        let mut net = Network::new(sizes).unwrap();
        net.randomize_with(&mut StdRng::seed_from_u64(seed));
        net
    }

    fn half_squared_error(net: &mut Network, datum: &TrainingDatum) -> f64 {
        let out = net.forward(&datum.inputs).unwrap();
        0.5 * calc_error(&datum.expected, &out).unwrap().combine()
    }

    #[test]
    fn output_deltas_use_sigmoid_derivative() {
        let d = output_deltas(&[0.75, 0.5], &[1.0, 0.0]);
        assert!((d[0] - (-0.25 * 0.1875)).abs() < 1e-12);
        assert!((d[1] - 0.125).abs() < 1e-12);
    }

    #[test]
    fn updates_follow_the_numerical_gradient() {
        let mut net = seeded_network(&[2, 3, 2], 42);
        let datum = TrainingDatum::new(vec![0.3, 0.8], vec![1.0, 0.0]);
        assert_updates_match_numerical_gradient(&mut net, &datum);
    }

    #[test]
    fn updates_follow_the_numerical_gradient_through_two_hidden_layers() {
        let mut net = seeded_network(&[3, 4, 3, 2], 7);
        let datum = TrainingDatum::new(vec![0.9, -0.4, 0.2], vec![0.0, 1.0]);
        assert_updates_match_numerical_gradient(&mut net, &datum);
    }

    fn assert_updates_match_numerical_gradient(net: &mut Network, datum: &TrainingDatum) {
        let trace = net.trace(&datum.inputs).unwrap();
        let deltas = backpropagate(net.layers(), &trace, &datum.expected).unwrap();
        let h = 1e-6;
        for i in 0..net.layers().len() {
            let update = net.layers()[i].compute_update(&trace[i], &deltas[i], 1.0).unwrap();
            for row in 0..update.rows() {
                for col in 0..update.cols() {
                    let w = net.layers()[i].weights().get(row, col);
                    net.layers_mut()[i].weights_mut().set(row, col, w + h);
                    let plus = half_squared_error(net, datum);
                    net.layers_mut()[i].weights_mut().set(row, col, w - h);
                    let minus = half_squared_error(net, datum);
                    net.layers_mut()[i].weights_mut().set(row, col, w);

                    let numeric = -(plus - minus) / (2.0 * h);
                    assert!(
                        (update.get(row, col) - numeric).abs() < 1e-7,
                        "layer {} weight ({}, {}): {} vs {}",
                        i,
                        row,
                        col,
                        update.get(row, col),
                        numeric
                    );
                }
            }
        }
    }

    #[test]
    fn one_iteration_reports_nonzero_error() {
        let mut net = seeded_network(&[2, 3, 1], 1);
        let mut data = datasets::xor();
        let mse = Trainer::default().one_iteration(&mut net, &mut data).unwrap();
        assert_eq!(mse.len(), 1);
        assert!(mse.combine() > 0.001);
    }

    #[test]
    fn online_updates_change_weights_between_examples() {
        let mut online = seeded_network(&[2, 2, 1], 5);
        let mut batch = online.clone();
        let mut data = datasets::xor();

        Trainer::new(TrainConfig::new(0.5, UpdateMode::Online))
            .one_iteration(&mut online, &mut data)
            .unwrap();
        Trainer::new(TrainConfig::new(0.5, UpdateMode::Batch))
            .one_iteration(&mut batch, &mut data)
            .unwrap();
        assert_ne!(online.layers()[0].weights(), batch.layers()[0].weights());
    }

    #[test]
    fn batch_mode_applies_the_summed_update_once() {
        let mut net = seeded_network(&[2, 3, 1], 9);
        let mut expected = net.clone();
        let mut data = datasets::xor();

        let mut sums: Vec<WeightMatrix> = expected.layers().iter().map(Layer::empty_update).collect();
        for datum in data.iter() {
            let trace = expected.trace(&datum.inputs).unwrap();
            let deltas = backpropagate(expected.layers(), &trace, &datum.expected).unwrap();
            for (i, sum) in sums.iter_mut().enumerate() {
                let u = expected.layers()[i].compute_update(&trace[i], &deltas[i], 0.3).unwrap();
                sum.add(&u).unwrap();
            }
        }
        for (layer, sum) in expected.layers_mut().iter_mut().zip(&sums) {
            layer.apply_update(sum).unwrap();
        }

        Trainer::new(TrainConfig::new(0.3, UpdateMode::Batch))
            .one_iteration(&mut net, &mut data)
            .unwrap();
        for (got, want) in net.layers().iter().zip(expected.layers()) {
            for (g, w) in got.weights().iter_rows().zip(want.weights().iter_rows()) {
                for (a, b) in g.iter().zip(w) {
                    assert!((a - b).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn mismatched_expected_length_is_reported() {
        let mut net = Network::new(&[2, 1]).unwrap();
        let mut data = TrainingData::from_pairs(vec![vec![1.0, 0.0]], vec![vec![1.0, 0.0]]).unwrap();
        let err = Trainer::default().one_iteration(&mut net, &mut data).unwrap_err();
        assert!(matches!(err, Error::DataMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn wrong_input_size_is_a_shape_error() {
        let mut net = Network::new(&[3, 1]).unwrap();
        let mut data = datasets::xor();
        let err = Trainer::default().one_iteration(&mut net, &mut data).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn empty_data_is_rejected() {
        let mut net = Network::new(&[2, 1]).unwrap();
        let err = Trainer::default()
            .one_iteration(&mut net, &mut TrainingData::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    fn counting_inputs(data: &TrainingData) -> Vec<f64> {
        data.iter().map(|d| d.inputs[0]).collect()
    }

    #[test]
    fn one_iteration_shuffles_only_when_asked() {
        let ordered: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut data: TrainingData = ordered
            .iter()
            .map(|&i| TrainingDatum::new(vec![i], vec![0.5]))
            .collect::<Vec<_>>()
            .into();
        let mut net = seeded_network(&[1, 1], 5);

        let still = Trainer::new(TrainConfig::default());
        still.one_iteration(&mut net, &mut data).unwrap();
        assert_eq!(counting_inputs(&data), ordered);

        let shuffling = Trainer::new(TrainConfig::default().with_shuffle(10));
        shuffling.one_iteration(&mut net, &mut data).unwrap();
        let mut seen = counting_inputs(&data);
        assert_ne!(seen, ordered);
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, ordered);
    }

    #[test]
    fn callbacks_run_in_order_and_max_iterations_stops() {
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let mut trainer = Trainer::new(TrainConfig::default());
        trainer.add_simple_stopping_criteria(3, 0.0);

        let l = log.clone();
        trainer.add_training_start_handler(move |_| l.borrow_mut().push("start".into()));
        let l = log.clone();
        trainer.add_iteration_end_handler(move |_, outcome, i| {
            assert!(outcome.is_ok());
            l.borrow_mut().push(format!("iter {}", i));
        });
        let l = log.clone();
        trainer.add_training_end_handler(move |_| l.borrow_mut().push("end".into()));

        let mut net = seeded_network(&[2, 2, 1], 3);
        trainer.train(&mut net, &mut datasets::xor()).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["start", "iter 1", "iter 2", "iter 3", "iter 4", "end"]
        );
    }

    #[test]
    fn failing_iteration_is_seen_by_callbacks_and_aborts() {
        let seen = Rc::new(RefCell::new(Vec::<bool>::new()));
        let ended = Rc::new(RefCell::new(false));
        let mut trainer = Trainer::default();
        let s = seen.clone();
        trainer.add_iteration_end_handler(move |_, outcome, _| s.borrow_mut().push(outcome.is_err()));
        let e = ended.clone();
        trainer.add_training_end_handler(move |_| *e.borrow_mut() = true);

        let mut net = Network::new(&[2, 2]).unwrap();
        let mut data = datasets::xor();
        let err = trainer.train(&mut net, &mut data).unwrap_err();
        assert!(matches!(err, Error::DataMismatch { .. }));
        assert_eq!(*seen.borrow(), vec![true]);
        assert!(!*ended.borrow());
    }

    #[test]
    fn unset_learning_rate_defaults_when_training() {
        let mut trainer = Trainer::new(TrainConfig::new(0.0, UpdateMode::Online));
        trainer.add_iteration_end_handler(|t, _, _| t.request_termination());
        let mut net = Network::new(&[2, 1]).unwrap();
        trainer.train(&mut net, &mut datasets::xor()).unwrap();
        assert_eq!(trainer.config().learning_rate, DEFAULT_LEARNING_RATE);
    }

    #[test]
    fn callbacks_can_reconfigure_the_trainer() {
        let rates = Rc::new(RefCell::new(Vec::new()));
        let mut trainer = Trainer::new(TrainConfig::new(0.2, UpdateMode::Online));
        let r = rates.clone();
        trainer.add_iteration_end_handler(move |t, _, i| {
            r.borrow_mut().push(t.config().learning_rate);
            t.config_mut().learning_rate *= 0.5;
            if i == 3 {
                t.request_termination();
            }
        });
        let mut net = Network::new(&[2, 1]).unwrap();
        trainer.train(&mut net, &mut datasets::xor()).unwrap();
        assert_eq!(*rates.borrow(), vec![0.2, 0.1, 0.05]);
    }

    #[test]
    fn trainer_can_be_reused_after_termination() {
        let mut trainer = Trainer::default();
        trainer.add_simple_stopping_criteria(usize::MAX, f64::INFINITY);
        let mut net = Network::new(&[2, 1]).unwrap();
        trainer.train(&mut net, &mut datasets::xor()).unwrap();
        assert!(trainer.termination_requested());
        trainer.train(&mut net, &mut datasets::xor()).unwrap();
    }

    #[test]
    fn from_config_registers_stopping_criteria() {
        let config = TrainConfig::new(0.1, UpdateMode::Batch).with_stopping(2, 0.0);
        let mut trainer = Trainer::from_config(config).unwrap();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        trainer.add_iteration_end_handler(move |_, _, _| *c.borrow_mut() += 1);
        let mut net = Network::new(&[2, 1]).unwrap();
        trainer.train(&mut net, &mut datasets::xor()).unwrap();
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn evaluate_collects_one_error_per_example() {
        let data = TrainingData::from_pairs(
            vec![vec![1.0, 0.0], vec![2.0, 0.0]],
            vec![vec![0.5, 0.5], vec![0.4, 0.4]],
        )
        .unwrap();
        let mut net = Network::new(&[2, 2]).unwrap();
        let errors = evaluate(&mut net, &data).unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[0][0].abs() < 1e-12 && errors[0][1].abs() < 1e-12);
        assert!((errors[1][0] - 0.01).abs() < 1e-9 && (errors[1][1] - 0.01).abs() < 1e-9);
    }
}
