//! # Wren
//!
//! A feed-forward neural network trainer built from scratch in Rust.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use wren::prelude::*;
//!
//! let mut net = Network::with_seed(2, Sgd::new(0.2, 0.2), Loss::CrossEntropy, Accuracy::Round, 7);
//! net.add_layers(&[(8, Activation::Tanh), (1, Activation::Sigmoid)])?;
//! let x = Tensor::from_rows(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
//! let y = Tensor::new(vec![0.0, 1.0, 1.0, 0.0], (4, 1))?;
//! let history = net.fit(&x, &y, &FitConfig::default().epochs(5).batch_size(4))?;
//! assert_eq!(history.epochs.len(), 6);
//! # Ok::<(), wren::Error>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `wren-core` | Tensor, Shape, Layout, GEMM kernels, Error |
//! | `wren-optim` | SGD with momentum, the `Optimizer` strategy |
//! | `wren-nn` | Dense layer, activations, losses, accuracy metrics |
//! | `wren-data` | BatchIterator, CSV loading, transforms, train/test split |
//!
//! ## Modules
//!
//! - [`network`] — `Network`: layer stack, lifecycle, forward/backward
//! - [`train`] — `fit` and its configuration / history types
//! - [`summary`] — printable architecture overview

/// Re-export core types.
pub use wren_core::{
    gemm_abc, gemm_atbc, gemm_tabc, gemm_tatbc, Error, Layout, Result, Shape, Tensor,
};

/// Re-export neural network building blocks.
pub mod nn {
    pub use wren_nn::*;
}

/// Re-export optimizers.
pub mod optim {
    pub use wren_optim::*;
}

/// Re-export data loading.
pub mod data {
    pub use wren_data::*;
}

pub mod network;
pub mod summary;
pub mod train;

pub use network::{Mode, Network};
pub use summary::{LayerSummary, NetworkSummary};
pub use train::{EpochLog, FitConfig, TrainResult};

/// Convenient imports for the common case.
pub mod prelude {
    pub use crate::data::{BatchIterator, CsvConfig, CsvTable, DataSplit};
    pub use crate::network::{Mode, Network};
    pub use crate::nn::{Accuracy, Activation, Dense, Loss};
    pub use crate::optim::{Optimizer, Sgd};
    pub use crate::train::{EpochLog, FitConfig, TrainResult};
    pub use crate::{Error, Result, Shape, Tensor};
}
