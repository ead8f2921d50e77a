// Training loop
//
// fit runs epochs 0..=epochs (inclusive, so `epochs + 1` passes). Each pass:
//
//   a. Draw mini-batches with a fresh BatchIterator
//   b. train_on_batch on each (forward, loss/accuracy, backward + update)
//   c. Record the mean loss and accuracy over the pass's batches
//
// There is no early stopping and no learning-rate schedule. Progress is
// reported through `tracing` every `display_epochs` epochs and on the last.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::info;
use wren_core::{Result, Tensor};
use wren_data::BatchIterator;

use crate::network::Network;

/// Configuration for [`Network::fit`].
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Last epoch index; the loop runs `0..=epochs`.
    pub epochs: usize,
    /// Samples per mini-batch, clamped to the sample count.
    pub batch_size: usize,
    /// Whether to shuffle the samples every epoch.
    pub shuffle: bool,
    /// Log every this many epochs (0 logs only the last).
    pub display_epochs: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 50,
            shuffle: true,
            display_epochs: 10,
        }
    }
}

impl FitConfig {
    pub fn epochs(mut self, e: usize) -> Self {
        self.epochs = e;
        self
    }

    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn shuffle(mut self, s: bool) -> Self {
        self.shuffle = s;
        self
    }

    pub fn display_epochs(mut self, d: usize) -> Self {
        self.display_epochs = d;
        self
    }

    fn should_display(&self, epoch: usize) -> bool {
        epoch == self.epochs || (self.display_epochs > 0 && epoch % self.display_epochs == 0)
    }
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Per-epoch logs, one per pass including epoch 0.
    pub epochs: Vec<EpochLog>,
    /// Wall time spent in `fit`.
    pub elapsed: Duration,
}

impl TrainResult {
    /// The log of the last epoch.
    pub fn last(&self) -> Option<&EpochLog> {
        self.epochs.last()
    }
}

/// Log for a single training epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLog {
    /// Epoch number (0-indexed).
    pub epoch: usize,
    /// Mean loss over the epoch's batches.
    pub loss: f64,
    /// Mean accuracy over the epoch's batches.
    pub accuracy: f64,
}

impl fmt::Display for EpochLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch {:>4}: loss {:.6} acc {:.3}",
            self.epoch, self.loss, self.accuracy
        )
    }
}

impl fmt::Display for TrainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training complete: {} epochs", self.epochs.len())?;
        for log in &self.epochs {
            writeln!(f, "  {}", log)?;
        }
        write!(f, "  time: {} ms", self.elapsed.as_millis())
    }
}

impl Network {
    /// Train on `(x, y)` and return the per-epoch history.
    pub fn fit(&mut self, x: &Tensor, y: &Tensor, config: &FitConfig) -> Result<TrainResult> {
        self.ensure_layers()?;
        let start = Instant::now();
        self.train();

        let mut logs = Vec::with_capacity(config.epochs + 1);
        for epoch in 0..=config.epochs {
            let batches =
                BatchIterator::new(x, y, config.batch_size, config.shuffle, self.rng_mut())?;
            let count = batches.len() as f64;
            let (mut loss_sum, mut acc_sum) = (0.0, 0.0);
            for batch in batches {
                let (bx, by) = batch?;
                let (loss, acc) = self.train_on_batch(&bx, &by)?;
                loss_sum += loss;
                acc_sum += acc;
            }

            let log = EpochLog {
                epoch,
                loss: loss_sum / count,
                accuracy: acc_sum / count,
            };
            if config.should_display(epoch) {
                info!(
                    epoch,
                    epochs = config.epochs,
                    loss = log.loss,
                    accuracy = log.accuracy,
                    "epoch"
                );
            }
            logs.push(log);
        }

        let elapsed = start.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "training finished");
        Ok(TrainResult {
            epochs: logs,
            elapsed,
        })
    }
}
