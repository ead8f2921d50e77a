// Tabular classification from a numeric CSV file
//
//   tabular iris   path/to/iris.csv     f0..f3 then a one-hot of 3 classes
//   tabular digits path/to/digits.csv   64 pixels (0..16) then the label 0..9
//
// iris:   features scaled by column max, 80% train, 4 → 5 tanh → 3 sigmoid,
//         SGD(0.025, 0.2), mean squared loss, batch 10
// digits: features scaled by 1/16, label one-hot encoded, 90% train,
//         64 → 32 sigmoid → 10 sigmoid, SGD(0.025, 0.2), cross-entropy, batch 100
//
// Rows are split in file order, so shuffle the file if it is sorted by class.

use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;
use wren::data::{one_hot, scale, scale_by_column_max, train_test_split, DataSplit};
use wren::prelude::*;

/// Everything that differs between the two datasets.
struct Recipe {
    ratio: f64,
    layers: Vec<(usize, Activation)>,
    optimizer: Sgd,
    loss: Loss,
    batch_size: usize,
}

fn load_iris(path: &str) -> Result<(DataSplit, Recipe)> {
    let table = CsvTable::load(path, &CsvConfig::default().target_cols(vec![4, 5, 6]))?;
    let x = scale_by_column_max(&table.features)?;
    let recipe = Recipe {
        ratio: 0.8,
        layers: vec![(5, Activation::Tanh), (3, Activation::Sigmoid)],
        optimizer: Sgd::new(0.025, 0.2),
        loss: Loss::MeanSquared,
        batch_size: 10,
    };
    Ok((train_test_split(&x, &table.targets, recipe.ratio)?, recipe))
}

fn load_digits(path: &str) -> Result<(DataSplit, Recipe)> {
    let table = CsvTable::load(path, &CsvConfig::default().target_cols(vec![64]))?;
    let x = scale(&table.features, 1.0 / 16.0);
    let y = one_hot(&table.targets, 10)?;
    let recipe = Recipe {
        ratio: 0.9,
        layers: vec![(32, Activation::Sigmoid), (10, Activation::Sigmoid)],
        optimizer: Sgd::new(0.025, 0.2),
        loss: Loss::CrossEntropy,
        batch_size: 100,
    };
    Ok((train_test_split(&x, &y, recipe.ratio)?, recipe))
}

fn run(dataset: &str, path: &str) -> Result<()> {
    let (data, recipe) = match dataset {
        "iris" => load_iris(path)?,
        "digits" => load_digits(path)?,
        other => {
            return Err(Error::InvalidArgument(format!(
                "unknown dataset {:?}, expected iris or digits",
                other
            )))
        }
    };
    println!(
        "Train on {} / Test on {}",
        data.train_x.dims()[0],
        data.test_x.dims()[0]
    );

    let input_width = data.train_x.dims()[1];
    let mut net = Network::new(input_width, recipe.optimizer, recipe.loss, Accuracy::ArgMax);
    net.add_layers(&recipe.layers)?;
    println!("{}", net.summary());

    let config = FitConfig::default()
        .epochs(50)
        .batch_size(recipe.batch_size)
        .display_epochs(5);
    let history = net.fit(&data.train_x, &data.train_y, &config)?;
    println!("Time: {} ms", history.elapsed.as_millis());

    let (loss, acc) = net.test(&data.test_x, &data.test_y)?;
    println!("Test loss:{:.4} acc:{:.4}", loss, acc);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <iris|digits> <file.csv>", args[0]);
        return ExitCode::from(2);
    }
    match run(&args[1], &args[2]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
