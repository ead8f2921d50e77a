// End-to-end tests for wren: training, evaluation, and error propagation

use wren::data::{one_hot, train_test_split, BatchIterator, CsvConfig, CsvTable};
use wren::prelude::*;
use wren::{gemm_abc, gemm_atbc, gemm_tabc, gemm_tatbc};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

fn assert_vec_approx(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert!(approx_eq(*x, *y, tol), "index {}: {} vs {}", i, x, y);
    }
}

fn xor_data() -> Result<(Tensor, Tensor)> {
    let x = Tensor::from_rows(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
    let y = Tensor::new(vec![0.0, 1.0, 1.0, 0.0], (4, 1))?;
    Ok((x, y))
}

fn xor_network(seed: u64) -> Result<Network> {
    let mut net = Network::with_seed(2, Sgd::new(0.2, 0.2), Loss::CrossEntropy, Accuracy::Round, seed);
    net.add_layers(&[(8, Activation::Tanh), (1, Activation::Sigmoid)])?;
    Ok(net)
}

// Training

#[test]
fn test_xor_learns() -> Result<()> {
    let (x, y) = xor_data()?;
    let mut net = xor_network(42)?;
    let config = FitConfig::default().epochs(50).batch_size(4).shuffle(false);
    let history = net.fit(&x, &y, &config)?;

    assert_eq!(history.epochs.len(), 51);
    let first = history.epochs[0];
    let last = history.epochs[50];
    assert!(last.loss < first.loss, "loss {} -> {}", first.loss, last.loss);
    assert_eq!(last.accuracy, 1.0);

    let (_, acc) = net.test_on_batch(&x, &y)?;
    assert_eq!(acc, 1.0);
    Ok(())
}

#[test]
fn test_fit_is_reproducible_with_seed() -> Result<()> {
    let (x, y) = xor_data()?;
    let config = FitConfig::default().epochs(10).batch_size(2);
    let a = xor_network(9)?.fit(&x, &y, &config)?;
    let b = xor_network(9)?.fit(&x, &y, &config)?;
    assert_eq!(a.epochs, b.epochs);
    Ok(())
}

#[test]
fn test_summary_counts_parameters() -> Result<()> {
    let net = xor_network(0)?;
    let s = net.summary();
    assert_eq!(s.layers.len(), 2);
    assert_eq!(s.layers[0].params, 3 * 8);
    assert_eq!(s.layers[1].params, 9);
    assert_eq!(s.total_params, 33);
    assert_eq!(s.optimizer, "SGD[lr:0.2 momentum:0.2]");
    assert_eq!(s.loss, "CrossEntropyLoss");
    Ok(())
}

// Evaluation

#[test]
fn test_evaluation_is_idempotent() -> Result<()> {
    let (x, y) = xor_data()?;
    let mut net = xor_network(3)?;
    net.fit(&x, &y, &FitConfig::default().epochs(5).batch_size(4))?;

    let weights: Vec<Tensor> = net.layers().iter().map(|l| l.weights().clone()).collect();
    let biases: Vec<Tensor> = net.layers().iter().map(|l| l.bias().clone()).collect();

    let first = net.test_on_batch(&x, &y)?;
    let second = net.test_on_batch(&x, &y)?;
    assert_eq!(first.0.to_bits(), second.0.to_bits());
    assert_eq!(first.1.to_bits(), second.1.to_bits());

    for (layer, (w, b)) in net.layers().iter().zip(weights.iter().zip(&biases)) {
        assert_eq!(layer.weights(), w);
        assert_eq!(layer.bias(), b);
    }
    Ok(())
}

#[test]
fn test_predict_matches_forward() -> Result<()> {
    let (x, _) = xor_data()?;
    let mut net = xor_network(5)?;
    let p = net.predict(&x)?;
    let f = net.forward(&x)?;
    assert_eq!(p, f);
    assert_eq!(p.dims(), &[4, 1]);
    Ok(())
}

// Backpropagation through a whole network

#[test]
fn test_network_gradient_check() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(17);
    let x = Tensor::rand_uniform((6, 3), -1.0, 1.0, &mut rng)?;
    let labels = Tensor::new(vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0], (6, 1))?;
    let y = one_hot(&labels, 2)?;

    let mut net = Network::with_seed(3, Sgd::default(), Loss::CrossEntropy, Accuracy::ArgMax, 17);
    net.add_layers(&[(4, Activation::Tanh), (2, Activation::Sigmoid)])?;

    let total = |net: &Network| -> Result<f64> {
        let p = net.predict(&x)?;
        Ok(Loss::CrossEntropy.loss(&y, &p)? * p.elem_count() as f64)
    };

    // walk the loss gradient back to the first layer by hand, then take that
    // layer's weight gradient
    let out = net.forward(&x)?;
    let mut upstream = Loss::CrossEntropy.grad(&y, &out)?;
    for i in (1..net.layers().len()).rev() {
        upstream = layer_gradients(&mut net, i, upstream)?.input;
    }
    let analytic = layer_gradients(&mut net, 0, upstream)?.weights;

    let h = 1e-5;
    let n = analytic.elem_count();
    let mut numeric = Vec::with_capacity(n);
    for i in 0..n {
        nudge_first_weight(&mut net, i, h);
        let up = total(&net)?;
        nudge_first_weight(&mut net, i, -2.0 * h);
        let down = total(&net)?;
        nudge_first_weight(&mut net, i, h);
        numeric.push((up - down) / (2.0 * h));
    }
    assert_vec_approx(analytic.data(), &numeric, 1e-4);
    Ok(())
}

fn layer_gradients(net: &mut Network, index: usize, grad: Tensor) -> Result<wren::nn::DenseGradients> {
    net.layer_mut(index)?.gradients(grad)
}

fn nudge_first_weight(net: &mut Network, i: usize, delta: f64) {
    net.layer_mut(0).unwrap().weights_mut().data_mut()[i] += delta;
}

// Data pipeline into training

#[test]
fn test_csv_to_training() -> Result<()> {
    let mut csv = String::new();
    for i in 0..20 {
        let a = (i % 4) as f64;
        let b = (i % 5) as f64;
        let label = if a + b > 3.0 { 1 } else { 0 };
        csv.push_str(&format!("{},{},{}\n", a, b, label));
    }
    let table = CsvTable::from_string(&csv, &CsvConfig::default())?;
    let y = one_hot(&table.targets, 2)?;
    let x = wren::data::scale_by_column_max(&table.features)?;
    let split = train_test_split(&x, &y, 0.75)?;
    assert_eq!(split.train_x.dims(), &[15, 2]);

    let mut net = Network::with_seed(2, Sgd::new(0.1, 0.5), Loss::MeanSquared, Accuracy::ArgMax, 1);
    net.add_layers(&[(6, Activation::Tanh), (2, Activation::Sigmoid)])?;
    let history = net.fit(&split.train_x, &split.train_y, &FitConfig::default().epochs(20).batch_size(5))?;
    assert!(history.epochs.iter().all(|e| e.loss.is_finite()));
    let (loss, acc) = net.test(&split.test_x, &split.test_y)?;
    assert!(loss.is_finite());
    assert!((0.0..=1.0).contains(&acc));
    Ok(())
}

// Errors

#[test]
fn test_wrong_input_width_propagates() -> Result<()> {
    let mut net = xor_network(0)?;
    let x = Tensor::zeros((4, 3))?;
    let y = Tensor::zeros((4, 1))?;
    let err = net.train_on_batch(&x, &y).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
    assert!(net.test_on_batch(&x, &y).unwrap_err().is_shape_mismatch());
    Ok(())
}

#[test]
fn test_wrong_target_shape_propagates() -> Result<()> {
    let (x, _) = xor_data()?;
    let mut net = xor_network(0)?;
    let y = Tensor::zeros((4, 2))?;
    assert!(net.train_on_batch(&x, &y).unwrap_err().is_shape_mismatch());
    Ok(())
}

#[test]
fn test_backward_without_forward() -> Result<()> {
    let mut net = xor_network(0)?;
    let g = Tensor::zeros((4, 1))?;
    assert!(matches!(
        net.backward(g),
        Err(Error::MissingForwardCache { layer: 1 })
    ));
    Ok(())
}

#[test]
fn test_layers_frozen_after_fit() -> Result<()> {
    let (x, y) = xor_data()?;
    let mut net = xor_network(0)?;
    net.fit(&x, &y, &FitConfig::default().epochs(0))?;
    assert!(matches!(
        net.add_dense(3, Activation::Relu),
        Err(Error::LayersFrozen)
    ));
    Ok(())
}

#[test]
fn test_index_errors() -> Result<()> {
    let t = Tensor::zeros((2, 3))?;
    assert!(t.split(1, 3).unwrap_err().is_index_out_of_range());
    assert!(t.reshape(&[-1, -1]).unwrap_err().is_index_out_of_range());
    assert!(t.transpose(&[0, 0]).unwrap_err().is_index_out_of_range());
    assert!(t.transpose(&[1]).unwrap_err().is_shape_mismatch());
    Ok(())
}

#[test]
fn test_gemm_family_via_facade() -> Result<()> {
    let a = Tensor::from_rows(&[[1.0, 2.0], [3.0, 4.0]])?;
    let b = Tensor::from_rows(&[[5.0, 6.0], [7.0, 8.0]])?;
    let ab = gemm_abc(&a, &b, None)?;
    assert_vec_approx(ab.data(), &[19.0, 22.0, 43.0, 50.0], 1e-12);
    assert_eq!(gemm_atbc(&a, &b.t(), None)?, ab);
    assert_eq!(gemm_tabc(&a.t(), &b, None)?, ab);
    assert_eq!(gemm_tatbc(&a.t(), &b.t(), None)?, ab);
    Ok(())
}

#[test]
fn test_batch_iterator_counts() -> Result<()> {
    let x = Tensor::zeros((8, 2))?;
    let y = Tensor::zeros((8, 1))?;
    let mut rng = StdRng::seed_from_u64(0);
    let it = BatchIterator::new(&x, &y, 3, true, &mut rng)?;
    assert_eq!(it.count(), 2);
    Ok(())
}
