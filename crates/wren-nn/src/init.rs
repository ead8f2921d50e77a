// nn::init — parameter initialisation for dense layers
//
//   weights ~ U(-3/sqrt(fan_in), 3/sqrt(fan_in))   shape [fan_in, fan_out]
//   bias    = 0                                     shape [1, fan_out]
//
// The RNG is always supplied by the caller so a seeded network is
// reproducible end to end.

use rand::Rng;
use wren_core::{Result, Tensor};

/// Half-width of the uniform weight range for a layer with `fan_in` inputs.
pub fn uniform_limit(fan_in: usize) -> f64 {
    3.0 / (fan_in as f64).sqrt()
}

/// `[fan_in, fan_out]` weights drawn from `U(-limit, limit)`.
pub fn dense_weights<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Result<Tensor> {
    let limit = uniform_limit(fan_in);
    Tensor::rand_uniform((fan_in, fan_out), -limit, limit, rng)
}

/// `[1, fan_out]` zero bias row.
pub fn dense_bias(fan_out: usize) -> Result<Tensor> {
    Tensor::zeros((1, fan_out))
}
