use rand::Rng;

use crate::error::{Error, Result};
use crate::layers::dense::{Activation, Layer};

/// An ordered stack of sigmoid layers.
///
/// Layer `i`'s output width equals layer `i + 1`'s input width when built via
/// [`Network::new`]. A network assembled from hand-made layers is not checked;
/// a mismatch surfaces as a shape error on the first forward pass.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    last_output: Vec<f64>,
}

impl Network {
    /// Builds `sizes.len() - 1` zero-initialized layers, e.g. `[2, 4, 1]` has
    /// `(2 + 1) * 4 + (4 + 1) * 1 = 17` trainable weights.
    pub fn new(sizes: &[usize]) -> Result<Network> {
        if sizes.len() < 2 {
            return Err(Error::Config(format!(
                "a network needs at least 2 layer sizes, got {}",
                sizes.len()
            )));
        }
        if sizes.contains(&0) {
            return Err(Error::Config(format!("layer sizes must be non-zero: {:?}", sizes)));
        }
        let layers = sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1]))
            .collect();
        Ok(Network {
            layers,
            last_output: Vec::new(),
        })
    }

    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(Error::Config("a network needs at least one layer".into()));
        }
        Ok(Network {
            layers,
            last_output: Vec::new(),
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Width of the vector the first layer accepts (bias excluded).
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_size)
    }

    /// Output of the most recent successful forward pass; empty before any.
    pub fn last_output(&self) -> &[f64] {
        &self.last_output
    }

    /// Fills every weight with a uniform value in [-0.5, 0.5).
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.randomize_with(rng);
        }
    }

    /// Forward pass, caching the result as the last output.
    pub fn forward(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.feed_from(&current)?.into_output();
        }
        self.last_output = current.clone();
        Ok(current)
    }

    /// Forward pass keeping one [`Activation`] per layer for backpropagation.
    pub fn trace(&mut self, input: &[f64]) -> Result<Vec<Activation>> {
        let mut activations: Vec<Activation> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let activation = match activations.last() {
                Some(prev) => layer.feed_from(prev.output())?,
                None => layer.feed_from(input)?,
            };
            activations.push(activation);
        }
        if let Some(last) = activations.last() {
            self.last_output = last.output().to_vec();
        }
        Ok(activations)
    }
}
