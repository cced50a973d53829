use rand::Rng;

use crate::error::{Error, Result};
use crate::math::{matrix::WeightMatrix, ops::{sigmoid, sigmoid_derivative}};

/// Constant fed to the extra weight column of every layer.
const BIAS_INPUT: f64 = 1.0;

/// What one forward pass through a layer saw and produced.
///
/// The backward pass of the same training step consumes it; it has no
/// meaning once the weights it was computed with have changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    input: Vec<f64>,
    output: Vec<f64>,
}

impl Activation {
    /// The layer input without the bias value.
    pub fn input(&self) -> &[f64] {
        &self.input
    }

    /// The sigmoid-activated layer output.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn into_output(self) -> Vec<f64> {
        self.output
    }

    fn biased_input(&self) -> Vec<f64> {
        biased(&self.input)
    }
}

/// A fully connected sigmoid layer with an implicit bias unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: WeightMatrix,
}

impl Layer {
    /// Zero-initialized layer: `outputs x (inputs + 1)` weights.
    pub fn new(inputs: usize, outputs: usize) -> Layer {
        Layer {
            weights: WeightMatrix::zeros(inputs + 1, outputs),
        }
    }

    /// Wraps an existing weight matrix whose last column holds the biases.
    pub fn with_weights(weights: WeightMatrix) -> Result<Layer> {
        if weights.cols() == 0 {
            return Err(Error::Shape("a layer needs at least the bias column".into()));
        }
        Ok(Layer { weights })
    }

    pub fn input_size(&self) -> usize {
        self.weights.cols() - 1
    }

    pub fn output_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightMatrix {
        &mut self.weights
    }

    pub fn randomize(&mut self) {
        self.weights.randomize();
    }

    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.weights.randomize_with(rng);
    }

    /// Forward pass: append the bias, multiply, squash with the sigmoid.
    pub fn feed_from(&self, input: &[f64]) -> Result<Activation> {
        let z = self.weights.process(&biased(input))?;
        Ok(Activation {
            input: input.to_vec(),
            output: z.into_iter().map(sigmoid).collect(),
        })
    }

    /// Deltas for the layer feeding this one.
    ///
    /// For each input unit `j`: the downstream `deltas` summed through the
    /// outgoing weights of `j`, times the sigmoid derivative at the value `j`
    /// presented to this layer in `activation`.
    pub fn propagate_deltas(&self, activation: &Activation, deltas: &[f64]) -> Result<Vec<f64>> {
        self.check_deltas(deltas)?;
        if activation.input.len() != self.input_size() {
            return Err(Error::Shape(format!(
                "activation holds {} inputs, layer expects {}",
                activation.input.len(),
                self.input_size()
            )));
        }
        Ok(activation
            .input
            .iter()
            .enumerate()
            .map(|(j, &x)| {
                let downstream: f64 = self
                    .weights
                    .iter_rows()
                    .zip(deltas.iter())
                    .map(|(row, d)| row[j] * d)
                    .sum();
                downstream * sigmoid_derivative(x)
            })
            .collect())
    }

    /// Gradient-descent step for this layer:
    /// `update[row][col] = biased_input[col] * deltas[row] * -learning_rate`.
    pub fn compute_update(
        &self,
        activation: &Activation,
        deltas: &[f64],
        learning_rate: f64,
    ) -> Result<WeightMatrix> {
        self.check_deltas(deltas)?;
        let inputs = activation.biased_input();
        if inputs.len() != self.weights.cols() {
            return Err(Error::Shape(format!(
                "activation holds {} biased inputs, layer expects {}",
                inputs.len(),
                self.weights.cols()
            )));
        }
        let data = deltas
            .iter()
            .map(|d| inputs.iter().map(|x| x * d * -learning_rate).collect())
            .collect();
        WeightMatrix::from_data(data)
    }

    /// `weights += update`; the shapes must agree.
    pub fn apply_update(&mut self, update: &WeightMatrix) -> Result<()> {
        self.weights.add(update)
    }

    pub fn empty_update(&self) -> WeightMatrix {
        WeightMatrix::zeros(self.weights.cols(), self.weights.rows())
    }

    fn check_deltas(&self, deltas: &[f64]) -> Result<()> {
        if deltas.len() != self.output_size() {
            return Err(Error::Shape(format!(
                "got {} deltas for a layer with {} outputs",
                deltas.len(),
                self.output_size()
            )));
        }
        Ok(())
    }
}

fn biased(input: &[f64]) -> Vec<f64> {
    let mut v = Vec::with_capacity(input.len() + 1);
    v.extend_from_slice(input);
    v.push(BIAS_INPUT);
    v
}
