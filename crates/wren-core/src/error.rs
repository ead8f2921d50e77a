use crate::shape::Shape;

/// All errors that can occur within wren.
///
/// Every variant is a caller contract violation: a shape that does not fit,
/// an index outside its range, or a call made out of order. None of them are
/// retried internally; they propagate to whoever drove the forward/backward
/// pass or the training loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two shapes that must be identical are not (elementwise ops, layer input,
    /// optimizer parameter vs. gradient).
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// GEMM operands whose contracted dimensions disagree.
    #[error("{op}: incompatible operands {lhs} and {rhs}")]
    MatmulShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// Fused bias must be shaped [1, output_width].
    #[error("{op}: bias must have shape {expected}, got {got}")]
    BiasShapeMismatch {
        op: &'static str,
        expected: Shape,
        got: Shape,
    },

    /// Cannot reshape because element counts differ (or the wildcard has no
    /// integer solution).
    #[error("cannot reshape array of size {src} into shape {dst_shape:?}")]
    ReshapeElementMismatch { src: usize, dst_shape: Vec<isize> },

    /// Element count mismatch when creating a tensor from a buffer.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Inputs and targets handed to the batch sampler disagree on sample count.
    #[error("batch length mismatch: inputs have {inputs} samples, targets have {targets}")]
    BatchLengthMismatch { inputs: usize, targets: usize },

    /// Dimension index out of range for the tensor's rank.
    #[error("dimension out of range: dim {dim} for tensor with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Coordinate past the end of an axis.
    #[error("index {index} out of bounds for axis {axis} of size {size}")]
    IndexOutOfBounds {
        axis: usize,
        index: usize,
        size: usize,
    },

    /// Split point outside the open interval (0, dim_size).
    #[error("split out of range: index {index} along axis {axis} of size {dim_size}")]
    SplitOutOfRange {
        axis: usize,
        index: usize,
        dim_size: usize,
    },

    /// More than one `-1` in a reshape target.
    #[error("can only specify one unknown dimension, got {count} in {dst_shape:?}")]
    MultipleWildcards { count: usize, dst_shape: Vec<isize> },

    /// A transpose table that is not a permutation of `0..rank`.
    #[error("invalid permutation {perm:?} for tensor with {rank} dimensions")]
    InvalidPermutation { perm: Vec<usize>, rank: usize },

    /// `backward` called without a matching `forward`.
    #[error("backward called on layer {layer} without a preceding forward pass")]
    MissingForwardCache { layer: usize },

    /// Layers can only be appended while the network is still being built.
    #[error("cannot add layers once the network has left the built state")]
    LayersFrozen,

    /// Operation requires at least one layer.
    #[error("network has no layers")]
    EmptyNetwork,

    /// Out-of-domain scalar argument (zero batch size, zero width, bad ratio).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A cell in a data file that is not a number.
    #[error("parse error at line {line}, column {column}: {value:?}")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    /// Failure reading a data file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error belongs to the shape-mismatch family.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. }
                | Error::RankMismatch { .. }
                | Error::MatmulShapeMismatch { .. }
                | Error::BiasShapeMismatch { .. }
                | Error::ReshapeElementMismatch { .. }
                | Error::ElementCountMismatch { .. }
                | Error::BatchLengthMismatch { .. }
        )
    }

    /// Whether this error belongs to the index-out-of-range family.
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(
            self,
            Error::DimOutOfRange { .. }
                | Error::IndexOutOfBounds { .. }
                | Error::SplitOutOfRange { .. }
                | Error::MultipleWildcards { .. }
                | Error::InvalidPermutation { .. }
        )
    }
}

/// Convenience Result type used throughout wren.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        let e = Error::ShapeMismatch {
            expected: Shape::from((2, 3)),
            got: Shape::from((3, 2)),
        };
        assert!(e.is_shape_mismatch());
        assert!(!e.is_index_out_of_range());
        assert_eq!(e.to_string(), "shape mismatch: expected [2, 3], got [3, 2]");

        let e = Error::SplitOutOfRange {
            axis: 0,
            index: 4,
            dim_size: 4,
        };
        assert!(e.is_index_out_of_range());
        assert!(!e.is_shape_mismatch());
    }
}
