// XOR — the smallest problem a single-layer perceptron cannot solve
//
//   2 inputs → 8 tanh → 1 sigmoid, SGD(0.2, 0.2), cross-entropy, rounded accuracy
//
// Run with RUST_LOG=debug to also see layer construction and batching.

use tracing_subscriber::EnvFilter;
use wren::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let x = Tensor::from_rows(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
    let y = Tensor::new(vec![0.0, 1.0, 1.0, 0.0], (4, 1))?;

    let mut net = Network::new(2, Sgd::new(0.2, 0.2), Loss::CrossEntropy, Accuracy::Round);
    net.add_layers(&[(8, Activation::Tanh), (1, Activation::Sigmoid)])?;
    println!("{}", net.summary());

    let config = FitConfig::default().epochs(50).batch_size(4).display_epochs(5);
    let history = net.fit(&x, &y, &config)?;
    if let Some(last) = history.last() {
        println!("final {}", last);
    }

    let pred = net.predict(&x)?;
    for k in 0..4 {
        let input = x.row(k)?;
        println!(
            "[{}, {}] = [{}] -> {:.6}",
            input[0],
            input[1],
            y.row(k)?[0],
            pred.row(k)?[0]
        );
    }
    Ok(())
}
