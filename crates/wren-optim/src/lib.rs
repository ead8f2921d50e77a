//! # wren-optim
//!
//! Update rules applied to a layer's parameters after each backward pass.
//!
//! - [`Sgd`] — stochastic gradient descent with an averaged momentum buffer
//! - [`Optimizer`] — the closed set of rules a layer can hold

pub mod optimizer;
pub mod sgd;

pub use optimizer::Optimizer;
pub use sgd::Sgd;
