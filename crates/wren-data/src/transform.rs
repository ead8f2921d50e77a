// Transforms — whole-table preprocessing applied before training
//
// These operate on an entire [N, K] tensor at once, since the scaling
// statistics (column maxima) are taken over all rows.

use wren_core::{Error, Result, Tensor};

/// One-hot encode integer class labels.
///
/// `labels` holds one label per sample (`[N]` or `[N, 1]`); the result is
/// `[N, num_classes]`. A label that is negative, fractional, or
/// `>= num_classes` is rejected.
pub fn one_hot(labels: &Tensor, num_classes: usize) -> Result<Tensor> {
    let n = labels.shape().dim(0)?;
    if labels.elem_count() != n {
        return Err(Error::InvalidArgument(format!(
            "one_hot expects one label per sample, got shape {}",
            labels.shape()
        )));
    }
    let mut data = vec![0.0; n * num_classes];
    for (i, &label) in labels.data().iter().enumerate() {
        if label < 0.0 || label.fract() != 0.0 || label as usize >= num_classes {
            return Err(Error::InvalidArgument(format!(
                "label {} at row {} is not a class in 0..{}",
                label, i, num_classes
            )));
        }
        data[i * num_classes + label as usize] = 1.0;
    }
    Tensor::new(data, (n, num_classes))
}

/// Divide every column of a `[N, K]` matrix by that column's maximum.
///
/// Columns whose maximum is zero are left untouched.
pub fn scale_by_column_max(x: &Tensor) -> Result<Tensor> {
    let maxima = column_max(x)?;
    let k = maxima.len();
    let mut out = x.clone();
    out.apply_indexed_inplace(|i, v| {
        let m = maxima[i % k];
        if m == 0.0 {
            v
        } else {
            v / m
        }
    });
    Ok(out)
}

/// Per-column maximum of a `[N, K]` matrix.
pub fn column_max(x: &Tensor) -> Result<Vec<f64>> {
    if x.rank() != 2 {
        return Err(Error::RankMismatch {
            expected: 2,
            got: x.rank(),
        });
    }
    let k = x.dims()[1];
    let mut maxima = vec![f64::NEG_INFINITY; k];
    for row in x.data().chunks(k) {
        for (m, &v) in maxima.iter_mut().zip(row) {
            *m = m.max(v);
        }
    }
    Ok(maxima)
}

/// Multiply every element by `factor`.
pub fn scale(x: &Tensor, factor: f64) -> Tensor {
    x.apply(|v| v * factor)
}
