use std::fmt;

use wren_core::{Result, Tensor};

use crate::sgd::Sgd;

/// The set of update rules a layer can be configured with.
///
/// Each parameter tensor owns one `Optimizer`; the state it keeps (momentum
/// buffers) belongs to that tensor alone.
#[derive(Debug)]
pub enum Optimizer {
    Sgd(Sgd),
}

impl Optimizer {
    /// Human-readable name including hyperparameters, e.g. `SGD[lr:0.2 momentum:0.2]`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// A copy with the same hyperparameters and no accumulated state.
    pub fn clone_fresh(&self) -> Self {
        match self {
            Optimizer::Sgd(sgd) => Optimizer::Sgd(sgd.clone_fresh()),
        }
    }

    /// Apply one update step to `param` using `grad`.
    pub fn update(&mut self, param: &mut Tensor, grad: &Tensor) -> Result<()> {
        match self {
            Optimizer::Sgd(sgd) => sgd.update(param, grad),
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::Sgd(Sgd::default())
    }
}

impl From<Sgd> for Optimizer {
    fn from(sgd: Sgd) -> Self {
        Optimizer::Sgd(sgd)
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Optimizer::Sgd(sgd) => write!(f, "{}", sgd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_copies_do_not_share_state() {
        let proto = Optimizer::from(Sgd::new(0.5, 0.5));
        let mut a = proto.clone_fresh();
        let mut b = proto.clone_fresh();
        let mut pa = Tensor::zeros((1, 2)).unwrap();
        let mut pb = Tensor::zeros((3, 1)).unwrap();
        a.update(&mut pa, &Tensor::full((1, 2), 1.0).unwrap()).unwrap();
        b.update(&mut pb, &Tensor::full((3, 1), 1.0).unwrap()).unwrap();
        assert_eq!(pa.data(), &[-0.25, -0.25]);
        assert_eq!(pb.data(), &[-0.25, -0.25, -0.25]);
        assert_eq!(proto.name(), "SGD[lr:0.5 momentum:0.5]");
    }
}
