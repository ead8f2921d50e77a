// Ordered train/test split
//
// The first floor(n * ratio) samples go to the training set, the rest to the
// test set. No shuffling happens here; shuffle the file beforehand if the
// rows are sorted by class.

use tracing::debug;
use wren_core::{Error, Result, Tensor};

/// The four tensors a network is trained and evaluated on.
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train_x: Tensor,
    pub train_y: Tensor,
    pub test_x: Tensor,
    pub test_y: Tensor,
}

/// Split along the leading axis at `floor(n * ratio)`.
///
/// Both halves must be non-empty.
pub fn split_rows(t: &Tensor, ratio: f64) -> Result<(Tensor, Tensor)> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(Error::InvalidArgument(format!(
            "split ratio must be in (0, 1), got {}",
            ratio
        )));
    }
    let n = t.shape().dim(0)?;
    let idx = (n as f64 * ratio) as usize;
    t.split(0, idx)
}

/// Split aligned inputs and targets with the same ratio.
pub fn train_test_split(x: &Tensor, y: &Tensor, ratio: f64) -> Result<DataSplit> {
    let (n, m) = (x.shape().dim(0)?, y.shape().dim(0)?);
    if n != m {
        return Err(Error::BatchLengthMismatch {
            inputs: n,
            targets: m,
        });
    }
    let (train_x, test_x) = split_rows(x, ratio)?;
    let (train_y, test_y) = split_rows(y, ratio)?;
    debug!(
        train = train_x.dims()[0],
        test = test_x.dims()[0],
        "train/test split"
    );
    Ok(DataSplit {
        train_x,
        train_y,
        test_x,
        test_y,
    })
}
