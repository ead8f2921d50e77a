// Loss Functions
//
// A loss compares a prediction with its target (both [N, K]) and yields:
//
//   loss(target, pred) -> f64     mean of the per-element loss
//   grad(target, pred) -> Tensor  per-element derivative w.r.t. pred
//
// The gradient is NOT divided by the element count. It is the derivative of
// the summed loss, which is what the dense layer backpropagates.
//
// KEY LOSSES:
//
// 1. MeanSquared: (y - p)² / 2, gradient p - y
//
// 2. CrossEntropy (binary, elementwise):
//      -y ln p - (1 - y) ln(1 - p),  gradient -y/p + (1 - y)/(1 - p)
//    p is clamped to [1e-12, 1 - 1e-12] in both so the logs stay finite.

use wren_core::{Result, Tensor};

const EPS: f64 = 1e-12;

/// Loss strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Loss {
    #[default]
    MeanSquared,
    CrossEntropy,
}

impl Loss {
    pub fn name(&self) -> &'static str {
        match self {
            Loss::MeanSquared => "MeanSquaredLoss",
            Loss::CrossEntropy => "CrossEntropyLoss",
        }
    }

    /// Mean of the per-element loss.
    pub fn loss(&self, target: &Tensor, prediction: &Tensor) -> Result<f64> {
        let per_elem = target.zip_map(prediction, |y, p| self.elem_loss(y, p))?;
        Ok(per_elem.mean())
    }

    /// Elementwise gradient w.r.t. the prediction, shaped like it.
    pub fn grad(&self, target: &Tensor, prediction: &Tensor) -> Result<Tensor> {
        target.zip_map(prediction, |y, p| self.elem_grad(y, p))
    }

    fn elem_loss(&self, y: f64, p: f64) -> f64 {
        match self {
            Loss::MeanSquared => 0.5 * (y - p) * (y - p),
            Loss::CrossEntropy => {
                let p = p.clamp(EPS, 1.0 - EPS);
                -y * p.ln() - (1.0 - y) * (1.0 - p).ln()
            }
        }
    }

    fn elem_grad(&self, y: f64, p: f64) -> f64 {
        match self {
            Loss::MeanSquared => p - y,
            Loss::CrossEntropy => {
                let p = p.clamp(EPS, 1.0 - EPS);
                -y / p + (1.0 - y) / (1.0 - p)
            }
        }
    }
}
