use std::fmt;

use crate::error::{Error, Result};

// Shape — N-dimensional shape representation
//
// A Shape describes the size of each dimension of a tensor:
//   - Vector: Shape([5])         — 1 dimension, 5 elements
//   - Matrix: Shape([3, 4])      — 2 dimensions, 12 elements
//   - Batch:  Shape([2, 3, 4])   — 3 dimensions, 24 elements
//
// Strides are never stored next to the shape. They are derived on demand from
// row-major order, which keeps reshape a pure relabelling of the flat buffer.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    pub fn elem_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Compute the contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1]:
    ///   - Moving 1 step in dim 0 jumps 12 elements (3*4)
    ///   - Moving 1 step in dim 1 jumps 4 elements
    ///   - Moving 1 step in dim 2 jumps 1 element
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.rank()];
        if self.rank() > 0 {
            strides[self.rank() - 1] = 1;
            for i in (0..self.rank() - 1).rev() {
                strides[i] = strides[i + 1] * self.0[i + 1];
            }
        }
        strides
    }

    /// Size of a specific dimension.
    pub fn dim(&self, d: usize) -> Result<usize> {
        self.0.get(d).copied().ok_or(Error::DimOutOfRange {
            dim: d,
            rank: self.rank(),
        })
    }

    /// Number of elements in one slice along the leading axis
    /// (product of every dimension but the first).
    pub fn inner_count(&self) -> usize {
        self.0.iter().skip(1).product()
    }

    /// The same shape with the leading dimension replaced.
    pub fn with_leading(&self, leading: usize) -> Shape {
        let mut dims = self.0.clone();
        if let Some(d0) = dims.first_mut() {
            *d0 = leading;
        }
        Shape(dims)
    }

    /// Resolve a reshape target against `total` elements.
    ///
    /// At most one entry may be `-1`; it becomes `total / product(others)`.
    /// Any other negative entry, a wildcard with no integer solution, or a
    /// product that differs from `total` is rejected.
    pub fn resolve_reshape(total: usize, target: &[isize]) -> Result<Shape> {
        let wildcards = target.iter().filter(|&&d| d == -1).count();
        if wildcards > 1 {
            return Err(Error::MultipleWildcards {
                count: wildcards,
                dst_shape: target.to_vec(),
            });
        }
        let mismatch = || Error::ReshapeElementMismatch {
            src: total,
            dst_shape: target.to_vec(),
        };
        if target.is_empty() || target.iter().any(|&d| d < -1) {
            return Err(mismatch());
        }

        let known: usize = target
            .iter()
            .filter(|&&d| d != -1)
            .map(|&d| d as usize)
            .product();

        let dims: Vec<usize> = if wildcards == 1 {
            if known == 0 || total % known != 0 {
                return Err(mismatch());
            }
            let fill = total / known;
            target
                .iter()
                .map(|&d| if d == -1 { fill } else { d as usize })
                .collect()
        } else {
            target.iter().map(|&d| d as usize).collect()
        };

        let shape = Shape(dims);
        if shape.elem_count() != total {
            return Err(mismatch());
        }
        Ok(shape)
    }

    /// The default transpose table: all axes reversed.
    pub fn reversed_axes(rank: usize) -> Vec<usize> {
        (0..rank).rev().collect()
    }

    /// Check that `perm` is a permutation of `0..rank`.
    pub fn check_permutation(perm: &[usize], rank: usize) -> Result<()> {
        if perm.len() != rank {
            return Err(Error::RankMismatch {
                expected: rank,
                got: perm.len(),
            });
        }
        let mut seen = vec![false; rank];
        for &axis in perm {
            if axis >= rank || seen[axis] {
                return Err(Error::InvalidPermutation {
                    perm: perm.to_vec(),
                    rank,
                });
            }
            seen[axis] = true;
        }
        Ok(())
    }

    /// Reorder this shape by a permutation table: `out[i] = self[perm[i]]`.
    pub fn permuted(&self, perm: &[usize]) -> Result<Shape> {
        Shape::check_permutation(perm, self.rank())?;
        Ok(Shape(permute(&self.0, perm)))
    }
}

/// Apply a permutation table to any per-axis sequence: `out[i] = values[perm[i]]`.
///
/// The caller is responsible for `perm` being valid for `values`.
pub fn permute(values: &[usize], perm: &[usize]) -> Vec<usize> {
    perm.iter().map(|&axis| values[axis]).collect()
}

/// Inverse of a permutation table, so that `permute(permute(v, p), inverse(p)) == v`.
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &axis) in perm.iter().enumerate() {
        inv[axis] = i;
    }
    inv
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// Convenient From implementations
// These let you write: Shape::from((3, 4)) instead of Shape::new(vec![3, 4])

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<(usize, usize, usize, usize)> for Shape {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2, d3])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_shape() {
        let s = Shape::from(5);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.elem_count(), 5);
        assert_eq!(s.stride_contiguous(), vec![1]);
    }

    #[test]
    fn test_matrix_shape() {
        let s = Shape::from((3, 4));
        assert_eq!(s.rank(), 2);
        assert_eq!(s.elem_count(), 12);
        assert_eq!(s.stride_contiguous(), vec![4, 1]);
        assert_eq!(s.inner_count(), 4);
    }

    #[test]
    fn test_3d_strides() {
        let s = Shape::from((2, 3, 4));
        assert_eq!(s.stride_contiguous(), vec![12, 4, 1]);
        assert_eq!(s.elem_count(), 24);
    }

    #[test]
    fn test_resolve_wildcard() {
        let s = Shape::resolve_reshape(24, &[2, -1, 4]).unwrap();
        assert_eq!(s.dims(), &[2, 3, 4]);
        let s = Shape::resolve_reshape(24, &[-1]).unwrap();
        assert_eq!(s.dims(), &[24]);
    }

    #[test]
    fn test_resolve_rejects_bad_targets() {
        // no integer solution
        assert!(matches!(
            Shape::resolve_reshape(10, &[3, -1]),
            Err(Error::ReshapeElementMismatch { .. })
        ));
        // product differs
        assert!(matches!(
            Shape::resolve_reshape(12, &[5, 2]),
            Err(Error::ReshapeElementMismatch { .. })
        ));
        // two wildcards
        assert!(matches!(
            Shape::resolve_reshape(12, &[-1, -1]),
            Err(Error::MultipleWildcards { count: 2, .. })
        ));
        assert!(Shape::resolve_reshape(12, &[-2, -6]).is_err());
        // rank 0 is not a tensor shape, even for a single element
        assert!(matches!(
            Shape::resolve_reshape(1, &[]),
            Err(Error::ReshapeElementMismatch { src: 1, .. })
        ));
    }

    #[test]
    fn test_permutation_helpers() {
        let s = Shape::from((2, 3, 4));
        assert_eq!(s.permuted(&[2, 0, 1]).unwrap().dims(), &[4, 2, 3]);
        assert_eq!(inverse_permutation(&[2, 0, 1]), vec![1, 2, 0]);
        assert_eq!(Shape::reversed_axes(3), vec![2, 1, 0]);
        assert!(matches!(
            s.permuted(&[0, 0, 1]),
            Err(Error::InvalidPermutation { .. })
        ));
        assert!(matches!(
            s.permuted(&[0, 1]),
            Err(Error::RankMismatch { .. })
        ));
    }

    #[test]
    fn test_display() {
        let s = Shape::from((3, 4));
        assert_eq!(format!("{}", s), "[3, 4]");
    }
}
