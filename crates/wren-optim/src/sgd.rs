use std::fmt;

use tracing::trace;
use wren_core::{Error, Result, Tensor};

/// Stochastic Gradient Descent with an exponentially averaged momentum buffer.
///
/// Updates a parameter using:
/// - `v = momentum * v + (1 - momentum) * grad`
/// - `θ = θ - lr * v`
///
/// The buffer is created on the first update with the gradient's shape and
/// filled with zeros. With `momentum == 0` the update is plain SGD.
#[derive(Debug)]
pub struct Sgd {
    /// Learning rate (step size)
    pub lr: f64,
    /// Momentum coefficient in `[0, 1)`
    pub momentum: f64,
    buffer: Option<Tensor>,
}

impl Sgd {
    pub fn new(lr: f64, momentum: f64) -> Self {
        Sgd {
            lr,
            momentum,
            buffer: None,
        }
    }

    /// Same hyperparameters, empty buffer.
    ///
    /// Every parameter tensor needs its own buffer, so a prototype handed to
    /// a network is copied this way once per weight and once per bias.
    pub fn clone_fresh(&self) -> Self {
        Sgd::new(self.lr, self.momentum)
    }

    /// The momentum buffer, if an update has happened yet.
    pub fn buffer(&self) -> Option<&Tensor> {
        self.buffer.as_ref()
    }

    /// Apply one step to `param` in place.
    pub fn update(&mut self, param: &mut Tensor, grad: &Tensor) -> Result<()> {
        param.ensure_same_shape(grad)?;
        if self.buffer.is_none() {
            trace!(shape = %grad.shape(), "allocating momentum buffer");
        }
        let buffer = self
            .buffer
            .get_or_insert_with(|| Tensor::zeros_like(grad));
        if buffer.shape() != grad.shape() {
            return Err(Error::ShapeMismatch {
                expected: buffer.shape().clone(),
                got: grad.shape().clone(),
            });
        }

        let m = self.momentum;
        let lr = self.lr;
        for ((v, &g), p) in buffer
            .data_mut()
            .iter_mut()
            .zip(grad.data())
            .zip(param.data_mut().iter_mut())
        {
            *v = m * *v + (1.0 - m) * g;
            *p -= lr * *v;
        }
        Ok(())
    }
}

impl Default for Sgd {
    fn default() -> Self {
        Sgd::new(0.01, 0.0)
    }
}

impl fmt::Display for Sgd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SGD[lr:{} momentum:{}]", self.lr, self.momentum)
    }
}
