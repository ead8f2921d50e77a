// BatchIterator — fixed-size mini-batches over aligned (inputs, targets)
//
// Given X: [n, ...] and y: [n, ...] the iterator yields floor(n / batch_size)
// pairs of [batch_size, ...] tensors. The trailing n % batch_size samples are
// dropped, never padded. A batch size larger than n is clamped to n, so there
// is always at least one batch.
//
// With shuffle the sample order is a single random permutation drawn when the
// iterator is created, consumed without replacement: no sample appears twice
// in one pass. Without shuffle the batches are [0..bs), [bs..2bs), ...
//
// The iterator is finite and cannot be restarted. Build a new one per epoch.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};
use wren_core::{Error, Result, Tensor};

/// Iterator over `(input_batch, target_batch)` pairs.
#[derive(Debug)]
pub struct BatchIterator<'a> {
    inputs: &'a Tensor,
    targets: &'a Tensor,
    indices: Vec<usize>,
    batch_size: usize,
    num_batches: usize,
    next_batch: usize,
}

impl<'a> BatchIterator<'a> {
    /// Create the iterator. `rng` is only consumed when `shuffle` is true.
    pub fn new<R: Rng + ?Sized>(
        inputs: &'a Tensor,
        targets: &'a Tensor,
        batch_size: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let n = inputs.shape().dim(0)?;
        let m = targets.shape().dim(0)?;
        if n != m {
            return Err(Error::BatchLengthMismatch {
                inputs: n,
                targets: m,
            });
        }
        if batch_size == 0 {
            return Err(Error::InvalidArgument("batch size must be positive".into()));
        }

        let batch_size = batch_size.min(n);
        let num_batches = n / batch_size;
        let mut indices: Vec<usize> = (0..n).collect();
        if shuffle {
            indices.shuffle(rng);
        }
        debug!(
            samples = n,
            batch_size,
            batches = num_batches,
            dropped = n - num_batches * batch_size,
            shuffle,
            "batch iterator"
        );

        Ok(BatchIterator {
            inputs,
            targets,
            indices,
            batch_size,
            num_batches,
            next_batch: 0,
        })
    }

    /// Effective batch size after clamping.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Total number of batches this iterator yields.
    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    /// The sample indices of batch `b`.
    fn batch_indices(&self, b: usize) -> &[usize] {
        &self.indices[b * self.batch_size..(b + 1) * self.batch_size]
    }
}

/// Stack the rows `indices` of `t` (along the leading axis) into a new tensor.
pub fn gather_rows(t: &Tensor, indices: &[usize]) -> Result<Tensor> {
    let inner = t.shape().inner_count();
    let mut data = Vec::with_capacity(indices.len() * inner);
    for &i in indices {
        data.extend_from_slice(t.row(i)?);
    }
    Tensor::new(data, t.shape().with_leading(indices.len()))
}

impl Iterator for BatchIterator<'_> {
    type Item = Result<(Tensor, Tensor)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_batch >= self.num_batches {
            return None;
        }
        let b = self.next_batch;
        self.next_batch += 1;
        trace!(batch = b, of = self.num_batches, "next batch");

        let idx = self.batch_indices(b);
        let batch = gather_rows(self.inputs, idx)
            .and_then(|x| Ok((x, gather_rows(self.targets, idx)?)));
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.num_batches - self.next_batch;
        (left, Some(left))
    }
}

impl ExactSizeIterator for BatchIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// X[i] = [i, 10 i], y[i] = [i]
    fn toy(n: usize) -> (Tensor, Tensor) {
        let x: Vec<f64> = (0..n).flat_map(|i| [i as f64, 10.0 * i as f64]).collect();
        let y: Vec<f64> = (0..n).map(|i| i as f64).collect();
        (
            Tensor::new(x, (n, 2)).unwrap(),
            Tensor::new(y, (n, 1)).unwrap(),
        )
    }

    fn sample_ids(batch: &Tensor) -> Vec<usize> {
        batch.data().iter().map(|&v| v as usize).collect()
    }

    #[test]
    fn test_sequential_batches_drop_remainder() {
        let (x, y) = toy(8);
        let mut rng = StdRng::seed_from_u64(0);
        let it = BatchIterator::new(&x, &y, 3, false, &mut rng).unwrap();
        assert_eq!(it.len(), 2);
        let batches: Vec<(Tensor, Tensor)> = it.collect::<Result<_>>().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(sample_ids(&batches[0].1), vec![0, 1, 2]);
        assert_eq!(sample_ids(&batches[1].1), vec![3, 4, 5]);
        assert_eq!(batches[0].0.dims(), &[3, 2]);
        assert_eq!(batches[1].0.data(), &[3.0, 30.0, 4.0, 40.0, 5.0, 50.0]);
    }

    #[test]
    fn test_shuffled_batches_never_repeat() {
        let (x, y) = toy(8);
        let mut rng = StdRng::seed_from_u64(1234);
        let mut seen = Vec::new();
        for batch in BatchIterator::new(&x, &y, 3, true, &mut rng).unwrap() {
            let (bx, by) = batch.unwrap();
            assert_eq!(by.dims(), &[3, 1]);
            // inputs and targets stay aligned
            for (row, &id) in bx.data().chunks(2).zip(by.data()) {
                assert_eq!(row, &[id, 10.0 * id]);
            }
            seen.extend(sample_ids(&by));
        }
        assert_eq!(seen.len(), 6);
        let mut dedup = seen.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), 6);
    }

    #[test]
    fn test_batch_size_clamped() {
        let (x, y) = toy(4);
        let mut rng = StdRng::seed_from_u64(0);
        let it = BatchIterator::new(&x, &y, 50, false, &mut rng).unwrap();
        assert_eq!(it.batch_size(), 4);
        assert_eq!(it.num_batches(), 1);
    }

    #[test]
    fn test_length_mismatch() {
        let (x, _) = toy(4);
        let (_, y) = toy(5);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            BatchIterator::new(&x, &y, 2, false, &mut rng),
            Err(Error::BatchLengthMismatch { inputs: 4, targets: 5 })
        ));
        assert!(BatchIterator::new(&x, &x, 0, false, &mut rng).is_err());
    }
}
