// Activation — pointwise nonlinearities applied after a dense layer
//
// Each activation is a scalar pair (func, deriv). The derivative takes the
// PRE-activation value, because that is what a Dense layer caches during the
// forward pass:
//
//   forward:   y = func(z)
//   backward:  dL/dz = dL/dy * deriv(z)
//
// The set is closed: a layer picks one variant at construction.

use wren_core::Tensor;

/// Pointwise activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Hyperbolic tangent.
    #[default]
    Tanh,
    /// Logistic sigmoid: 1 / (1 + e^(-x))
    Sigmoid,
    /// max(0, x)
    Relu,
    /// Pass-through, for linear output layers.
    Identity,
}

impl Activation {
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Tanh => "Tanh",
            Activation::Sigmoid => "Sigmoid",
            Activation::Relu => "Relu",
            Activation::Identity => "Identity",
        }
    }

    /// The activation at `x`.
    pub fn func(&self, x: f64) -> f64 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::Relu => x.max(0.0),
            Activation::Identity => x,
        }
    }

    /// d func / dx at the pre-activation value `x`.
    pub fn deriv(&self, x: f64) -> f64 {
        match self {
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Identity => 1.0,
        }
    }

    /// `func` applied to every element.
    pub fn apply(&self, x: &Tensor) -> Tensor {
        x.apply(|v| self.func(v))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
