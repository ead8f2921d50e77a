// Accuracy metrics
//
// Round:   fraction of ELEMENTS where round(target) == round(prediction).
//          Suited to binary outputs such as a single sigmoid unit.
// ArgMax:  fraction of ROWS whose argmax over the class axis agrees between
//          target and prediction. Targets are one-hot, predictions are scores.
//
// Both return a value in [0, 1].

use wren_core::{Error, Result, Tensor};

/// Accuracy strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    #[default]
    Round,
    ArgMax,
}

impl Accuracy {
    pub fn name(&self) -> &'static str {
        match self {
            Accuracy::Round => "RoundAccuracy",
            Accuracy::ArgMax => "ArgMaxAccuracy",
        }
    }

    pub fn accuracy(&self, target: &Tensor, prediction: &Tensor) -> Result<f64> {
        target.ensure_same_shape(prediction)?;
        match self {
            Accuracy::Round => {
                let hits = target
                    .data()
                    .iter()
                    .zip(prediction.data())
                    .filter(|(y, p)| y.round() == p.round())
                    .count();
                Ok(hits as f64 / target.elem_count() as f64)
            }
            Accuracy::ArgMax => {
                let want = argmax_rows(target)?;
                let got = argmax_rows(prediction)?;
                let hits = want.iter().zip(&got).filter(|(a, b)| a == b).count();
                Ok(hits as f64 / want.len() as f64)
            }
        }
    }
}

/// Index of the largest value in each row of a `[N, K]` matrix.
/// Ties resolve to the first index.
pub fn argmax_rows(t: &Tensor) -> Result<Vec<usize>> {
    if t.rank() != 2 {
        return Err(Error::RankMismatch {
            expected: 2,
            got: t.rank(),
        });
    }
    let k = t.dims()[1];
    Ok(t.data()
        .chunks(k)
        .map(|row| {
            let mut best = 0;
            for (j, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect())
}
