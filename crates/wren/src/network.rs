// Network — an ordered stack of dense layers with one loss and one accuracy
//
// LIFECYCLE:
//
//   Built ──train()──▶ Training ──eval()──▶ Evaluating
//     │                   ▲                     │
//     │                   └───────train()───────┘
//     └─ add_dense / add_layers only here
//
// The mode is switched explicitly. `fit` switches to Training itself.
// Evaluation (`test_on_batch`, `predict`, `test`) never runs a backward pass,
// so it cannot change a parameter whatever the mode.
//
// The network owns its random source. The same StdRng initialises weights as
// layers are added and shuffles mini-batches during `fit`, so a network
// built with `with_seed` trains identically on every run.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use wren_core::{Error, Result, Tensor};
use wren_nn::{Accuracy, Activation, Dense, Loss};
use wren_optim::Optimizer;

use crate::summary::{LayerSummary, NetworkSummary};

/// Where a network is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Layers can still be added; nothing has been trained.
    Built,
    /// Backward passes update parameters.
    Training,
    /// Backward passes only propagate gradients.
    Evaluating,
}

/// A feed-forward network of [`Dense`] layers.
#[derive(Debug)]
pub struct Network {
    input_width: usize,
    layers: Vec<Dense>,
    optimizer: Optimizer,
    loss: Loss,
    accuracy: Accuracy,
    mode: Mode,
    rng: StdRng,
}

impl Network {
    /// A network seeded from OS entropy.
    pub fn new(
        input_width: usize,
        optimizer: impl Into<Optimizer>,
        loss: Loss,
        accuracy: Accuracy,
    ) -> Self {
        Self::with_rng(input_width, optimizer.into(), loss, accuracy, StdRng::from_entropy())
    }

    /// A reproducible network.
    pub fn with_seed(
        input_width: usize,
        optimizer: impl Into<Optimizer>,
        loss: Loss,
        accuracy: Accuracy,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            input_width,
            optimizer.into(),
            loss,
            accuracy,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        input_width: usize,
        optimizer: Optimizer,
        loss: Loss,
        accuracy: Accuracy,
        rng: StdRng,
    ) -> Self {
        Network {
            input_width,
            layers: Vec::new(),
            optimizer,
            loss,
            accuracy,
            mode: Mode::Built,
            rng,
        }
    }

    // Building

    /// Append a dense layer. Its input width is the previous layer's output
    /// width (or the network input width for the first layer).
    pub fn add_dense(&mut self, width: usize, activation: Activation) -> Result<&mut Self> {
        if self.mode != Mode::Built {
            return Err(Error::LayersFrozen);
        }
        let index = self.layers.len();
        let input_width = self.output_width();
        let layer = Dense::new(
            index,
            input_width,
            width,
            activation,
            &self.optimizer,
            &mut self.rng,
        )?;
        debug!(
            layer = index,
            input_width,
            output_width = width,
            activation = activation.name(),
            params = layer.param_count(),
            "added dense layer"
        );
        self.layers.push(layer);
        Ok(self)
    }

    /// Append several layers, given as `(width, activation)`.
    pub fn add_layers(&mut self, specs: &[(usize, Activation)]) -> Result<&mut Self> {
        for &(width, activation) in specs {
            self.add_dense(width, activation)?;
        }
        Ok(self)
    }

    // Accessors

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// Width of the last layer, or the input width if there are no layers.
    pub fn output_width(&self) -> usize {
        self.layers
            .last()
            .map_or(self.input_width, Dense::output_width)
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Mutable access to one layer, e.g. to inspect its gradients.
    pub fn layer_mut(&mut self, index: usize) -> Result<&mut Dense> {
        let size = self.layers.len();
        self.layers.get_mut(index).ok_or(Error::IndexOutOfBounds {
            axis: 0,
            index,
            size,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn loss(&self) -> Loss {
        self.loss
    }

    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    pub fn optimizer(&self) -> &Optimizer {
        &self.optimizer
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // Mode

    /// Switch every layer to training mode.
    pub fn train(&mut self) {
        self.set_mode(Mode::Training);
    }

    /// Switch every layer to evaluation mode.
    pub fn eval(&mut self) {
        self.set_mode(Mode::Evaluating);
    }

    fn set_mode(&mut self, mode: Mode) {
        let training = mode == Mode::Training;
        for layer in &mut self.layers {
            layer.set_training(training);
        }
        self.mode = mode;
    }

    // Passes

    /// Forward through every layer, caching state for `backward`.
    pub fn forward(&mut self, x: &Tensor) -> Result<Tensor> {
        self.ensure_layers()?;
        let mut out = x.clone();
        for layer in &mut self.layers {
            out = layer.forward(&out)?;
        }
        Ok(out)
    }

    /// Backward through every layer in reverse, starting from dL/d(output).
    pub fn backward(&mut self, grad: Tensor) -> Result<()> {
        self.ensure_layers()?;
        let mut grad = grad;
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(grad)?;
        }
        Ok(())
    }

    /// Forward without caching, for evaluation.
    pub fn predict(&self, x: &Tensor) -> Result<Tensor> {
        self.ensure_layers()?;
        let mut out = x.clone();
        for layer in &self.layers {
            out = layer.infer(&out)?;
        }
        Ok(out)
    }

    /// One optimisation step on a batch. Loss and accuracy are measured on
    /// the prediction made before the update.
    pub fn train_on_batch(&mut self, x: &Tensor, y: &Tensor) -> Result<(f64, f64)> {
        let pred = self.forward(x)?;
        let loss = self.loss.loss(y, &pred)?;
        let acc = self.accuracy.accuracy(y, &pred)?;
        let grad = self.loss.grad(y, &pred)?;
        self.backward(grad)?;
        Ok((loss, acc))
    }

    /// Loss and accuracy on a batch without touching any parameter.
    pub fn test_on_batch(&self, x: &Tensor, y: &Tensor) -> Result<(f64, f64)> {
        let pred = self.predict(x)?;
        let loss = self.loss.loss(y, &pred)?;
        let acc = self.accuracy.accuracy(y, &pred)?;
        Ok((loss, acc))
    }

    /// `test_on_batch` on a whole held-out set, logging the result.
    pub fn test(&self, x: &Tensor, y: &Tensor) -> Result<(f64, f64)> {
        let (loss, accuracy) = self.test_on_batch(x, y)?;
        info!(loss, accuracy, "test");
        Ok((loss, accuracy))
    }

    /// Architecture overview.
    pub fn summary(&self) -> NetworkSummary {
        let layers: Vec<LayerSummary> = self
            .layers
            .iter()
            .map(|l| LayerSummary {
                activation: l.activation().name(),
                params: l.param_count(),
                input_width: l.input_width(),
                output_width: l.output_width(),
            })
            .collect();
        NetworkSummary {
            optimizer: self.optimizer.name(),
            loss: self.loss.name(),
            accuracy: self.accuracy.name(),
            input_width: self.input_width,
            output_width: self.output_width(),
            total_params: layers.iter().map(|l| l.params).sum(),
            layers,
        }
    }

    pub(crate) fn ensure_layers(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::EmptyNetwork);
        }
        Ok(())
    }
}
