use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Learning rate used when none (or 0.0) is configured.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// When weight updates are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// After every example; later examples in the pass see the new weights.
    #[default]
    Online,
    /// Summed over the pass and applied once at its end.
    Batch,
}

/// Stop once the iteration count exceeds `max_iterations` or the combined
/// mean squared error drops below `min_error`, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoppingCriteria {
    pub max_iterations: usize,
    pub min_error: f64,
}

/// Configuration for a [`Trainer`](crate::train::trainer::Trainer).
///
/// # Fields
/// - `learning_rate`  - gradient descent step size; `0.0` means "unset"
/// - `update_mode`    - online or batch weight updates
/// - `shuffle_rounds` - when non-zero, the data is shuffled before each pass
/// - `stopping`       - optional simple stopping criteria
/// - `log_every`      - optional progress log frequency, in iterations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub update_mode: UpdateMode,
    pub shuffle_rounds: usize,
    pub stopping: Option<StoppingCriteria>,
    pub log_every: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: DEFAULT_LEARNING_RATE,
            update_mode: UpdateMode::Online,
            shuffle_rounds: 0,
            stopping: None,
            log_every: None,
        }
    }
}

impl TrainConfig {
    pub fn new(learning_rate: f64, update_mode: UpdateMode) -> Self {
        TrainConfig {
            learning_rate,
            update_mode,
            ..TrainConfig::default()
        }
    }

    pub fn with_stopping(mut self, max_iterations: usize, min_error: f64) -> Self {
        self.stopping = Some(StoppingCriteria {
            max_iterations,
            min_error,
        });
        self
    }

    pub fn with_shuffle(mut self, rounds: usize) -> Self {
        self.shuffle_rounds = rounds;
        self
    }

    pub fn with_logging(mut self, every: usize) -> Self {
        self.log_every = Some(every);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(Error::Config(format!(
                "learning rate must be a non-negative number, got {}",
                self.learning_rate
            )));
        }
        if let Some(stop) = &self.stopping {
            if !stop.min_error.is_finite() || stop.min_error < 0.0 {
                return Err(Error::Config(format!(
                    "minimum error must be a non-negative number, got {}",
                    stop.min_error
                )));
            }
        }
        Ok(())
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads and validates a config written by `save_json` (or by hand).
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}
