// Dense — fully-connected layer with a pointwise activation
//
//   z = x · W + b        (gemm_abc with fused bias)
//   y = act(z)
//
// PARAMETER SHAPES:
//
//   weights: [input_width, output_width]
//   bias:    [1, output_width]           seeded into every output row
//
// BACKWARD, given G = dL/dy shaped like y:
//
//   1. G ← G ⊙ act'(z)                   folded in place
//   2. dL/dx = G · Wᵀ                    gemm_atbc, with the weights as they
//                                        were during forward
//   3. dL/dW = xᵀ · G                    gemm_tabc
//      dL/db = column sums of G
//   4. in training mode, each parameter is stepped by its own optimizer
//
// The input gradient is computed before the optimizer touches W, so no copy
// of the weights is needed.
//
// The forward cache (x and z) lives in an Option and is taken by backward.
// A second backward without a new forward fails with MissingForwardCache.

use rand::Rng;
use tracing::trace;
use wren_core::{gemm_abc, gemm_atbc, gemm_tabc, Error, Result, Shape, Tensor};
use wren_optim::Optimizer;

use crate::activation::Activation;
use crate::init;

/// State captured by `forward` and consumed by `backward`.
#[derive(Debug, Clone)]
struct ForwardCache {
    input: Tensor,
    pre_activation: Tensor,
}

/// Gradients produced by one backward step.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    /// dL/dW, `[input_width, output_width]`
    pub weights: Tensor,
    /// dL/db, `[1, output_width]`
    pub bias: Tensor,
    /// dL/dx, `[batch, input_width]`
    pub input: Tensor,
}

/// A fully-connected layer followed by an activation.
#[derive(Debug)]
pub struct Dense {
    index: usize,
    input_width: usize,
    output_width: usize,
    weights: Tensor,
    bias: Tensor,
    activation: Activation,
    weight_optim: Optimizer,
    bias_optim: Optimizer,
    training: bool,
    cache: Option<ForwardCache>,
}

impl Dense {
    /// Create a layer with uniformly initialised weights and a zero bias.
    ///
    /// `index` is the layer's position in its network, used in errors and logs.
    /// The weights and the bias each get a fresh copy of `optimizer`.
    pub fn new<R: Rng + ?Sized>(
        index: usize,
        input_width: usize,
        output_width: usize,
        activation: Activation,
        optimizer: &Optimizer,
        rng: &mut R,
    ) -> Result<Self> {
        if input_width == 0 || output_width == 0 {
            return Err(Error::InvalidArgument(format!(
                "dense layer widths must be positive, got {} -> {}",
                input_width, output_width
            )));
        }
        let weights = init::dense_weights(input_width, output_width, rng)?;
        let bias = init::dense_bias(output_width)?;
        trace!(
            layer = index,
            limit = init::uniform_limit(input_width),
            "initialised dense weights"
        );
        Self::from_parameters(index, weights, bias, activation, optimizer)
    }

    /// Create a layer from existing parameters.
    pub fn from_parameters(
        index: usize,
        weights: Tensor,
        bias: Tensor,
        activation: Activation,
        optimizer: &Optimizer,
    ) -> Result<Self> {
        let (input_width, output_width) = match weights.dims() {
            &[i, o] => (i, o),
            _ => {
                return Err(Error::RankMismatch {
                    expected: 2,
                    got: weights.rank(),
                })
            }
        };
        let expected = Shape::from((1, output_width));
        if bias.shape() != &expected {
            return Err(Error::ShapeMismatch {
                expected,
                got: bias.shape().clone(),
            });
        }
        Ok(Dense {
            index,
            input_width,
            output_width,
            weights,
            bias,
            activation,
            weight_optim: optimizer.clone_fresh(),
            bias_optim: optimizer.clone_fresh(),
            training: false,
            cache: None,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut Tensor {
        &mut self.weights
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    pub fn bias_mut(&mut self) -> &mut Tensor {
        &mut self.bias
    }

    /// The optimizer stepping the weights.
    pub fn optimizer(&self) -> &Optimizer {
        &self.weight_optim
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// In training mode `backward` updates the parameters; otherwise it only
    /// propagates the gradient.
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    /// Number of trainable scalars: `(input_width + 1) * output_width`.
    pub fn param_count(&self) -> usize {
        (self.input_width + 1) * self.output_width
    }

    /// Forward pass on a `[batch, input_width]` input.
    ///
    /// Overwrites any cache left by an earlier forward.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        self.check_input(input)?;
        let pre_activation = gemm_abc(input, &self.weights, Some(&self.bias))?;
        let output = self.activation.apply(&pre_activation);
        self.cache = Some(ForwardCache {
            input: input.clone(),
            pre_activation,
        });
        Ok(output)
    }

    /// Forward pass that leaves the cache alone. Used for evaluation.
    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        self.check_input(input)?;
        let pre_activation = gemm_abc(input, &self.weights, Some(&self.bias))?;
        Ok(self.activation.apply(&pre_activation))
    }

    /// Backward pass: returns dL/dx and, in training mode, steps the
    /// parameters.
    pub fn backward(&mut self, accum_grad: Tensor) -> Result<Tensor> {
        let grads = self.gradients(accum_grad)?;
        if self.training {
            self.weight_optim.update(&mut self.weights, &grads.weights)?;
            self.bias_optim.update(&mut self.bias, &grads.bias)?;
        }
        Ok(grads.input)
    }

    /// Consume the forward cache and compute all gradients without touching
    /// the parameters.
    pub fn gradients(&mut self, mut accum_grad: Tensor) -> Result<DenseGradients> {
        let cache = self.cache.take().ok_or(Error::MissingForwardCache {
            layer: self.index,
        })?;
        let act = self.activation;
        accum_grad.mul_fb_inplace(&cache.pre_activation, |z| act.deriv(z))?;

        let input = gemm_atbc(&accum_grad, &self.weights, None)?;
        let weights = gemm_tabc(&cache.input, &accum_grad, None)?;
        let bias = accum_grad.sum_axis0();
        Ok(DenseGradients {
            weights,
            bias,
            input,
        })
    }

    fn check_input(&self, input: &Tensor) -> Result<()> {
        match input.dims() {
            &[_, w] if w == self.input_width => Ok(()),
            &[n, _] => Err(Error::ShapeMismatch {
                expected: Shape::from((n, self.input_width)),
                got: input.shape().clone(),
            }),
            _ => Err(Error::RankMismatch {
                expected: 2,
                got: input.rank(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::Loss;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use wren_optim::Sgd;

    const STEP: f64 = 1e-5;
    const TOL: f64 = 1e-4;

    fn setup(activation: Activation) -> (Dense, Tensor, Tensor) {
        let mut rng = StdRng::seed_from_u64(42);
        let layer = Dense::new(0, 4, 3, activation, &Optimizer::default(), &mut rng).unwrap();
        let x = Tensor::rand_uniform((5, 4), -1.0, 1.0, &mut rng).unwrap();
        let y = Tensor::rand_uniform((5, 3), 0.0, 1.0, &mut rng).unwrap();
        (layer, x, y)
    }

    /// Summed loss, the quantity whose derivative `Loss::grad` returns.
    fn total_loss(layer: &mut Dense, x: &Tensor, y: &Tensor) -> f64 {
        let out = layer.forward(x).unwrap();
        Loss::MeanSquared.loss(y, &out).unwrap() * out.elem_count() as f64
    }

    fn central_difference(
        layer: &mut Dense,
        x: &Tensor,
        y: &Tensor,
        param: fn(&mut Dense) -> &mut Tensor,
    ) -> Vec<f64> {
        let n = param(layer).elem_count();
        (0..n)
            .map(|i| {
                param(layer).data_mut()[i] += STEP;
                let up = total_loss(layer, x, y);
                param(layer).data_mut()[i] -= 2.0 * STEP;
                let down = total_loss(layer, x, y);
                param(layer).data_mut()[i] += STEP;
                (up - down) / (2.0 * STEP)
            })
            .collect()
    }

    fn assert_close(analytic: &[f64], numeric: &[f64]) {
        assert_eq!(analytic.len(), numeric.len());
        for (a, n) in analytic.iter().zip(numeric) {
            assert!((a - n).abs() < TOL, "analytic {} vs numeric {}", a, n);
        }
    }

    fn analytic(layer: &mut Dense, x: &Tensor, y: &Tensor) -> DenseGradients {
        let out = layer.forward(x).unwrap();
        let g = Loss::MeanSquared.grad(y, &out).unwrap();
        layer.gradients(g).unwrap()
    }

    #[test]
    fn test_gradient_check_weights_and_bias() {
        for act in [Activation::Tanh, Activation::Sigmoid, Activation::Identity] {
            let (mut layer, x, y) = setup(act);
            let grads = analytic(&mut layer, &x, &y);
            let dw = central_difference(&mut layer, &x, &y, Dense::weights_mut);
            let db = central_difference(&mut layer, &x, &y, Dense::bias_mut);
            assert_close(grads.weights.data(), &dw);
            assert_close(grads.bias.data(), &db);
        }
    }

    #[test]
    fn test_gradient_check_input() {
        let (mut layer, x, y) = setup(Activation::Tanh);
        let grads = analytic(&mut layer, &x, &y);
        let numeric: Vec<f64> = (0..x.elem_count())
            .map(|i| {
                let mut up = x.clone();
                up.data_mut()[i] += STEP;
                let mut down = x.clone();
                down.data_mut()[i] -= STEP;
                (total_loss(&mut layer, &up, &y) - total_loss(&mut layer, &down, &y)) / (2.0 * STEP)
            })
            .collect();
        assert_close(grads.input.data(), &numeric);
    }

    #[test]
    fn test_backward_updates_only_in_training() {
        let (mut layer, x, y) = setup(Activation::Sigmoid);
        let before = layer.weights().clone();

        let out = layer.forward(&x).unwrap();
        let g = Loss::MeanSquared.grad(&y, &out).unwrap();
        let dx_eval = layer.backward(g.clone()).unwrap();
        assert_eq!(layer.weights(), &before);

        layer.set_training(true);
        layer.forward(&x).unwrap();
        let dx_train = layer.backward(g).unwrap();
        assert_ne!(layer.weights(), &before);
        // input gradient uses the weights from before the update
        assert_eq!(dx_eval, dx_train);
    }

    #[test]
    fn test_sgd_step_applies_gradients() {
        let (layer, x, y) = setup(Activation::Tanh);
        let proto = Optimizer::from(Sgd::new(1.0, 0.0));
        let mut layer =
            Dense::from_parameters(0, layer.weights().clone(), layer.bias().clone(), Activation::Tanh, &proto)
                .unwrap();
        let grads = analytic(&mut layer, &x, &y);
        let before = layer.weights().clone();

        layer.set_training(true);
        let out = layer.forward(&x).unwrap();
        layer.backward(Loss::MeanSquared.grad(&y, &out).unwrap()).unwrap();
        for ((b, a), g) in before.data().iter().zip(layer.weights().data()).zip(grads.weights.data()) {
            assert!((b - a - g).abs() < 1e-12);
        }
    }

    #[test]
    fn test_backward_without_forward() {
        let (mut layer, x, _) = setup(Activation::Tanh);
        let g = Tensor::zeros((5, 3)).unwrap();
        assert!(matches!(
            layer.backward(g.clone()),
            Err(Error::MissingForwardCache { layer: 0 })
        ));
        layer.forward(&x).unwrap();
        layer.backward(g.clone()).unwrap();
        assert!(matches!(
            layer.backward(g),
            Err(Error::MissingForwardCache { .. })
        ));
    }

    #[test]
    fn test_cache_is_a_copy() {
        let (mut layer, mut x, y) = setup(Activation::Tanh);
        let reference = analytic(&mut layer, &x, &y);
        let out = layer.forward(&x).unwrap();
        x.apply_inplace(|v| v * 10.0);
        let grads = layer.gradients(Loss::MeanSquared.grad(&y, &out).unwrap()).unwrap();
        assert_eq!(grads.weights, reference.weights);
    }

    #[test]
    fn test_infer_matches_forward_without_caching() {
        let (mut layer, x, _) = setup(Activation::Sigmoid);
        let inferred = layer.infer(&x).unwrap();
        assert!(matches!(
            layer.gradients(Tensor::zeros((5, 3)).unwrap()),
            Err(Error::MissingForwardCache { .. })
        ));
        assert_eq!(layer.forward(&x).unwrap(), inferred);
    }

    #[test]
    fn test_input_width_checked() {
        let (mut layer, _, _) = setup(Activation::Tanh);
        let x = Tensor::zeros((2, 5)).unwrap();
        assert!(matches!(layer.forward(&x), Err(Error::ShapeMismatch { .. })));
        let v = Tensor::zeros(4).unwrap();
        assert!(layer.forward(&v).unwrap_err().is_shape_mismatch());
        let g = Tensor::zeros((2, 3)).unwrap();
        layer.forward(&Tensor::zeros((5, 4)).unwrap()).unwrap();
        assert!(layer.backward(g).unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn test_param_count_and_widths() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Dense::new(1, 64, 32, Activation::Sigmoid, &Optimizer::default(), &mut rng).unwrap();
        assert_eq!(layer.param_count(), 65 * 32);
        assert_eq!(layer.weights().dims(), &[64, 32]);
        assert_eq!(layer.bias().dims(), &[1, 32]);
        assert!(Dense::new(0, 0, 3, Activation::Tanh, &Optimizer::default(), &mut rng).is_err());
    }
}
