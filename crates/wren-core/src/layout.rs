use crate::error::{Error, Result};
use crate::shape::{permute, Shape};

// Layout — how a logical shape maps onto a flat row-major buffer
//
// A Layout pairs a shape with per-axis strides and a starting offset. Tensors
// themselves always own a contiguous buffer; a Layout is a transient
// description used to *read* an existing buffer in a different logical order
// before the values are copied into a fresh, contiguous tensor.
//
// KEY IDEAS:
//
// 1. **Strides**: the storage distance between neighbours along each axis.
//    A contiguous [2,3] matrix has strides [3,1].
//
// 2. **Permute**: Reorder shape and strides with the same table. Reading the
//    permuted layout in row-major order walks the source buffer transposed.
//    [2,3] strides [3,1] → permute([1,0]) → [3,2] strides [1,3]
//
// 3. **Narrow**: Shrink one axis and move the offset. Reading the narrowed
//    layout visits exactly the elements of one side of a split.
//
// 4. **Index mapping**: a destination flat index is decomposed into per-axis
//    coordinates with the layout's *shape* (last axis fastest), then
//    re-accumulated with the layout's *strides* into a source flat index.

/// Shape, strides and offset of a read-only view over a flat buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    /// Offset into the storage buffer where this view's data starts.
    offset: usize,
}

impl Layout {
    /// Row-major layout over a fresh buffer.
    pub fn contiguous(shape: Shape) -> Self {
        let strides = shape.stride_contiguous();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    pub fn new(shape: Shape, strides: Vec<usize>, offset: usize) -> Self {
        Layout {
            shape,
            strides,
            offset,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// True when reading in logical order walks the buffer 0, 1, 2, ...
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == self.shape.stride_contiguous()
    }

    /// Reorder axes by a permutation table. Shape and strides are permuted by
    /// the same table, so `dims()[i] == old_dims[perm[i]]` and likewise for
    /// strides.
    ///
    /// Example: [2, 3, 4] permute([2, 0, 1]) → [4, 2, 3]
    ///          strides [12, 4, 1]           → [1, 12, 4]
    pub fn permute(&self, perm: &[usize]) -> Result<Layout> {
        let shape = self.shape.permuted(perm)?;
        let strides = permute(&self.strides, perm);
        Ok(Layout::new(shape, strides, self.offset))
    }

    /// Keep `len` entries of axis `axis` starting at `start`. Only the shape
    /// and the offset change; strides are shared with `self`.
    ///
    /// [4, 6] narrow(1, 2, 3) → [4, 3], offset + 2 * strides[1]
    pub fn narrow(&self, axis: usize, start: usize, len: usize) -> Result<Layout> {
        let dim_size = *self.dims().get(axis).ok_or(Error::DimOutOfRange {
            dim: axis,
            rank: self.rank(),
        })?;
        if start + len > dim_size {
            return Err(Error::SplitOutOfRange {
                axis,
                index: start + len,
                dim_size,
            });
        }
        let mut dims = self.dims().to_vec();
        dims[axis] = len;
        let offset = self.offset + start * self.strides[axis];
        Ok(Layout::new(Shape::new(dims), self.strides.clone(), offset))
    }

    /// Storage position of a coordinate: `offset + Σ index[i] * stride[i]`.
    pub fn flat_index(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(&self.strides)
            .fold(self.offset, |acc, (&i, &s)| acc + i * s)
    }

    /// Map the `linear`-th element of this layout (counted in row-major order
    /// over `dims()`) to its position in storage.
    ///
    /// Coordinates are peeled off from the last axis, each one multiplied by
    /// the stride of its axis.
    pub fn storage_index(&self, linear: usize) -> usize {
        let dims = self.shape.dims();
        let mut rest = linear;
        let mut flat = self.offset;
        for k in (0..dims.len()).rev() {
            flat += self.strides[k] * (rest % dims[k]);
            rest /= dims[k];
        }
        flat
    }

    /// Iterator over all flat storage indices of this layout, in logical order.
    pub fn strided_indices(&self) -> StridedIter {
        StridedIter::new(self)
    }
}

// StridedIter — storage positions of a layout in row-major logical order
//
// Walks the logical elements of a layout in row-major order and yields the
// storage index of each one. For a contiguous layout this just counts
// 0, 1, 2, ...; for a permuted or narrowed one it jumps around the buffer.
// Yields the same sequence as `storage_index` over 0..elem_count without a
// division per element.

/// Storage positions of a [`Layout`]'s elements in logical order.
pub struct StridedIter {
    coord: Vec<usize>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    pos: usize,
    remaining: usize,
}

impl StridedIter {
    fn new(layout: &Layout) -> Self {
        StridedIter {
            coord: vec![0; layout.rank()],
            dims: layout.dims().to_vec(),
            strides: layout.strides().to_vec(),
            pos: layout.offset(),
            remaining: layout.elem_count(),
        }
    }

    // Odometer step: bump the last axis, and on overflow rewind it and carry
    // into the one before. `pos` moves by the same stride arithmetic.
    fn step(&mut self) {
        for axis in (0..self.dims.len()).rev() {
            self.coord[axis] += 1;
            self.pos += self.strides[axis];
            if self.coord[axis] < self.dims[axis] {
                return;
            }
            self.pos -= self.dims[axis] * self.strides[axis];
            self.coord[axis] = 0;
        }
    }
}

impl Iterator for StridedIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let here = self.pos;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.step();
        }
        Some(here)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        assert!(layout.is_contiguous());
        assert_eq!(layout.strides(), &[3, 1]);
        let indices: Vec<usize> = layout.strided_indices().collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_permute_indices() {
        // [[0, 1, 2],
        //  [3, 4, 5]] read transposed: 0, 3, 1, 4, 2, 5
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let transposed = layout.permute(&[1, 0]).unwrap();
        assert_eq!(transposed.dims(), &[3, 2]);
        assert_eq!(transposed.strides(), &[1, 3]);
        assert!(!transposed.is_contiguous());
        let indices: Vec<usize> = transposed.strided_indices().collect();
        assert_eq!(indices, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_storage_index_agrees_with_iterator() {
        let layout = Layout::contiguous(Shape::from((2, 3, 4)))
            .permute(&[2, 0, 1])
            .unwrap();
        let iterated: Vec<usize> = layout.strided_indices().collect();
        let direct: Vec<usize> = (0..layout.elem_count())
            .map(|i| layout.storage_index(i))
            .collect();
        assert_eq!(iterated, direct);
    }

    #[test]
    fn test_narrow() {
        let layout = Layout::contiguous(Shape::from((4, 6)));
        let narrowed = layout.narrow(1, 2, 3).unwrap();
        assert_eq!(narrowed.dims(), &[4, 3]);
        assert_eq!(narrowed.offset(), 2);
        assert_eq!(narrowed.strides(), &[6, 1]);
        let first_row: Vec<usize> = narrowed.strided_indices().take(3).collect();
        assert_eq!(first_row, vec![2, 3, 4]);
    }

    #[test]
    fn test_narrow_out_of_bounds() {
        let layout = Layout::contiguous(Shape::from((4, 6)));
        assert!(layout.narrow(1, 5, 3).is_err());
        assert!(matches!(
            layout.narrow(2, 0, 1),
            Err(Error::DimOutOfRange { dim: 2, rank: 2 })
        ));
    }

    #[test]
    fn test_flat_index() {
        let layout = Layout::contiguous(Shape::from((2, 3, 4)));
        assert_eq!(layout.flat_index(&[1, 2, 3]), 23);
        assert_eq!(layout.storage_index(23), 23);
        let narrowed = layout.narrow(2, 1, 2).unwrap();
        assert_eq!(narrowed.flat_index(&[1, 2, 1]), 12 + 8 + 1 + 1);
    }
}
