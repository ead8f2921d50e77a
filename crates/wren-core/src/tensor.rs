use std::fmt;

use rand::Rng;

use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::{inverse_permutation, Shape};

// Tensor — The fundamental data structure
//
// A Tensor is an n-dimensional array of f64 values: a Shape plus a flat,
// row-major buffer with `data.len() == shape.elem_count()` at all times.
//
// MEMORY MODEL:
//
//   Tensors are plain values. Cloning copies the buffer, and nothing is ever
//   shared between two tensors, so a layer can cache its input by cloning it
//   and be sure no later in-place update of the caller's tensor leaks into
//   the cache.
//
//   Methods taking `&mut self` (`apply_inplace`, `mul_fb_inplace`, ...)
//   rewrite the owning buffer. Every other operation allocates a new tensor.
//
// LAYOUT:
//
//   Strides are derived from the shape when needed (see `Layout`). Reshape is
//   therefore a relabelling of the same buffer, while transpose and split read
//   the buffer through a permuted or narrowed Layout and materialise the
//   result contiguously.

/// An n-dimensional array of `f64` over a flat row-major buffer.
///
/// # Example
/// ```
/// use wren_core::Tensor;
///
/// let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3))?;
/// let t = a.t();
/// assert_eq!(t.dims(), &[3, 2]);
/// assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
/// # Ok::<(), wren_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    // Constructors

    /// Create a tensor from a buffer and a shape.
    ///
    /// Fails if the buffer length differs from the shape's element count, or
    /// if the shape has a zero-sized or missing dimension.
    pub fn new(data: Vec<f64>, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        check_dims(&shape)?;
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        Ok(Tensor { shape, data })
    }

    /// A tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Result<Self> {
        Self::full(shape, 0.0)
    }

    /// A tensor filled with `value`.
    pub fn full(shape: impl Into<Shape>, value: f64) -> Result<Self> {
        let shape = shape.into();
        check_dims(&shape)?;
        let data = vec![value; shape.elem_count()];
        Ok(Tensor { shape, data })
    }

    /// A zero tensor with the same shape as `other`.
    pub fn zeros_like(other: &Tensor) -> Self {
        Tensor {
            shape: other.shape.clone(),
            data: vec![0.0; other.data.len()],
        }
    }

    /// Build a `[rows, cols]` matrix from equally long rows.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n = rows.len();
        let k = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n * k);
        for row in rows {
            let row = row.as_ref();
            if row.len() != k {
                return Err(Error::ShapeMismatch {
                    expected: Shape::from(k),
                    got: Shape::from(row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Tensor::new(data, (n, k))
    }

    /// Values drawn uniformly from `[low, high)` using the supplied RNG.
    pub fn rand_uniform<R: Rng + ?Sized>(
        shape: impl Into<Shape>,
        low: f64,
        high: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let shape = shape.into();
        check_dims(&shape)?;
        let data = (0..shape.elem_count())
            .map(|_| low + (high - low) * rng.gen::<f64>())
            .collect();
        Ok(Tensor { shape, data })
    }

    // Accessors

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimensions as a slice (shortcut for shape().dims()).
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    /// Row-major strides, derived from the shape.
    pub fn strides(&self) -> Vec<usize> {
        self.shape.stride_contiguous()
    }

    /// The contiguous layout of this tensor's buffer.
    pub fn layout(&self) -> Layout {
        Layout::contiguous(self.shape.clone())
    }

    /// The flat buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the flat buffer. The length cannot change.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Value at a multi-dimensional coordinate.
    pub fn get(&self, index: &[usize]) -> Result<f64> {
        if index.len() != self.rank() {
            return Err(Error::RankMismatch {
                expected: self.rank(),
                got: index.len(),
            });
        }
        for (axis, (&i, &size)) in index.iter().zip(self.dims()).enumerate() {
            if i >= size {
                return Err(Error::IndexOutOfBounds {
                    axis,
                    index: i,
                    size,
                });
            }
        }
        Ok(self.data[self.layout().flat_index(index)])
    }

    /// The flat slice holding sample `index` along the leading axis (one row of a matrix).
    pub fn row(&self, index: usize) -> Result<&[f64]> {
        let n = self.shape.dim(0)?;
        if index >= n {
            return Err(Error::IndexOutOfBounds {
                axis: 0,
                index,
                size: n,
            });
        }
        let s = self.shape.inner_count();
        Ok(&self.data[index * s..(index + 1) * s])
    }

    /// Mean of all elements.
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    // Shape manipulation

    /// Reinterpret the buffer under a new shape. One entry may be `-1`, which
    /// is inferred from the others.
    pub fn reshape(&self, shape: &[isize]) -> Result<Self> {
        self.clone().into_reshape(shape)
    }

    /// Like [`reshape`](Self::reshape), but reuses this tensor's buffer.
    pub fn into_reshape(self, shape: &[isize]) -> Result<Self> {
        let shape = Shape::resolve_reshape(self.data.len(), shape)?;
        Ok(Tensor {
            shape,
            data: self.data,
        })
    }

    /// Permute the axes. An empty table reverses all axes.
    ///
    /// Always materialises a new contiguous buffer: element `i` of the result
    /// is read from the source position given by the permuted layout.
    pub fn transpose(&self, perm: &[usize]) -> Result<Self> {
        let table;
        let perm = if perm.is_empty() {
            table = Shape::reversed_axes(self.rank());
            &table
        } else {
            perm
        };
        let view = self.layout().permute(perm)?;
        let data = (0..self.data.len())
            .map(|i| self.data[view.storage_index(i)])
            .collect();
        Ok(Tensor {
            shape: view.shape().clone(),
            data,
        })
    }

    /// Transpose with all axes reversed (the matrix transpose for rank 2).
    pub fn t(&self) -> Self {
        let dims: Vec<usize> = self.dims().iter().rev().copied().collect();
        let strides: Vec<usize> = self.strides().into_iter().rev().collect();
        let view = Layout::new(Shape::new(dims), strides, 0);
        let data = view.strided_indices().map(|i| self.data[i]).collect();
        Tensor {
            shape: view.shape().clone(),
            data,
        }
    }

    /// Undo a previous `transpose(perm)`.
    pub fn untranspose(&self, perm: &[usize]) -> Result<Self> {
        if perm.is_empty() {
            return self.transpose(&[]);
        }
        Shape::check_permutation(perm, self.rank())?;
        self.transpose(&inverse_permutation(perm))
    }

    /// Reshape, then transpose the reshaped tensor, in one copy.
    pub fn reshape_transpose(&self, shape: &[isize], perm: &[usize]) -> Result<Self> {
        let reshaped = Layout::contiguous(Shape::resolve_reshape(self.data.len(), shape)?);
        let table;
        let perm = if perm.is_empty() {
            table = Shape::reversed_axes(reshaped.rank());
            &table
        } else {
            perm
        };
        let view = reshaped.permute(perm)?;
        let data = view.strided_indices().map(|i| self.data[i]).collect();
        Ok(Tensor {
            shape: view.shape().clone(),
            data,
        })
    }

    /// Transpose, then reshape the transposed tensor.
    pub fn transpose_reshape(&self, perm: &[usize], shape: &[isize]) -> Result<Self> {
        self.transpose(perm)?.into_reshape(shape)
    }

    /// Split along `axis` into `[.., index, ..]` and `[.., dim - index, ..]`.
    ///
    /// Each half is gathered element by element through a narrowed layout, so
    /// the split axis does not need to be the leading one.
    pub fn split(&self, axis: usize, index: usize) -> Result<(Self, Self)> {
        let rank = self.rank();
        if axis >= rank {
            return Err(Error::DimOutOfRange { dim: axis, rank });
        }
        let dim_size = self.dims()[axis];
        if index == 0 || index >= dim_size {
            return Err(Error::SplitOutOfRange {
                axis,
                index,
                dim_size,
            });
        }
        let layout = self.layout();
        let gather = |view: Layout| Tensor {
            data: view.strided_indices().map(|i| self.data[i]).collect(),
            shape: view.shape().clone(),
        };
        let head = gather(layout.narrow(axis, 0, index)?);
        let tail = gather(layout.narrow(axis, index, dim_size - index)?);
        Ok((head, tail))
    }

    /// Column sums over the leading axis: `[n, ..] → [1, ..]`.
    pub fn sum_axis0(&self) -> Self {
        let inner = self.shape.inner_count();
        let mut data = vec![0.0; inner];
        for row in self.data.chunks(inner) {
            for (acc, v) in data.iter_mut().zip(row) {
                *acc += v;
            }
        }
        Tensor {
            shape: self.shape.with_leading(1),
            data,
        }
    }

    // Elementwise application

    /// Apply `f` to every element, returning a new tensor.
    pub fn apply<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Apply `f` to every element in place.
    pub fn apply_inplace<F: Fn(f64) -> f64>(&mut self, f: F) {
        for x in self.data.iter_mut() {
            *x = f(*x);
        }
    }

    /// Apply `f(flat_index, value)` to every element in place.
    pub fn apply_indexed_inplace<F: Fn(usize, f64) -> f64>(&mut self, f: F) {
        for (i, x) in self.data.iter_mut().enumerate() {
            *x = f(i, *x);
        }
    }

    /// Combine two equally shaped tensors element by element.
    pub fn zip_map<F: Fn(f64, f64) -> f64>(&self, other: &Tensor, f: F) -> Result<Self> {
        self.ensure_same_shape(other)?;
        Ok(Tensor {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// `self[i] * f(other[i])`, allocating.
    pub fn mul_fb<F: Fn(f64) -> f64>(&self, other: &Tensor, f: F) -> Result<Self> {
        self.zip_map(other, |a, b| a * f(b))
    }

    /// `self[i] *= f(other[i])` in place. Used to fold an activation
    /// derivative into an upstream gradient.
    pub fn mul_fb_inplace<F: Fn(f64) -> f64>(&mut self, other: &Tensor, f: F) -> Result<()> {
        self.ensure_same_shape(other)?;
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a *= f(b);
        }
        Ok(())
    }

    /// Fail with `ShapeMismatch` unless both tensors have identical shapes.
    pub fn ensure_same_shape(&self, other: &Tensor) -> Result<()> {
        if self.shape != other.shape {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                got: other.shape.clone(),
            });
        }
        Ok(())
    }
}

fn check_dims(shape: &Shape) -> Result<()> {
    if shape.rank() == 0 || shape.dims().contains(&0) {
        return Err(Error::InvalidArgument(format!(
            "tensor dimensions must be positive, got {}",
            shape
        )));
    }
    Ok(())
}

impl fmt::Display for Tensor {
    /// NumPy-compatible literal, handy for pasting into a Python session.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "np.array([")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "], dtype=np.float64).reshape(")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, ")")
    }
}
