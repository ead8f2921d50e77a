//! # wren-nn
//!
//! Layer-level building blocks for wren.
//!
//! - [`Dense`] — fully-connected layer with hand-derived forward/backward
//! - [`Activation`] — Tanh, Sigmoid, Relu, Identity
//! - [`Loss`] — MeanSquared, CrossEntropy
//! - [`Accuracy`] — Round, ArgMax
//! - [`init`] — weight initialisation

pub mod activation;
pub mod dense;
pub mod init;
pub mod loss;
pub mod metrics;

pub use activation::Activation;
pub use dense::{Dense, DenseGradients};
pub use loss::Loss;
pub use metrics::{argmax_rows, Accuracy};
