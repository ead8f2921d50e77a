//! # wren-core
//!
//! Tensor primitives for wren.
//!
//! This crate provides:
//! - [`Tensor`] — n-dimensional `f64` array over a flat row-major buffer
//! - [`Shape`] / [`Layout`] — shape, strides, and offset views used by
//!   transpose and split
//! - [`gemm`] — the four GEMM variants with an optional fused bias row
//! - [`Error`] — the error taxonomy shared by every wren crate

pub mod error;
pub mod gemm;
pub mod layout;
pub mod shape;
pub mod tensor;

pub use error::{Error, Result};
pub use gemm::{gemm_abc, gemm_atbc, gemm_tabc, gemm_tatbc};
pub use layout::Layout;
pub use shape::Shape;
pub use tensor::Tensor;
