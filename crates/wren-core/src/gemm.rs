use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::tensor::Tensor;

// GEMM — the four transpose variants of C = op(A) · op(B) + bias
//
// A dense layer needs three matrix products per step:
//
//   forward          X · W        + b     gemm_abc
//   input gradient   G · Wᵀ               gemm_atbc
//   weight gradient  Xᵀ · G               gemm_tabc
//
// Rather than materialising a transpose and calling one kernel, each variant
// reads its operands with the index pattern of the transposed matrix. The
// fourth variant (Aᵀ · Bᵀ) completes the family.
//
// The optional bias is a [1, n] row. It seeds every output row before the
// products are accumulated, so `gemm_abc(x, w, Some(b))` is the full affine
// map of a dense layer in one pass.
//
// Every variant accepts rank-2 operands only.

/// `A · B (+ bias)`: `[m, k] · [k, n] → [m, n]`.
pub fn gemm_abc(a: &Tensor, b: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
    const OP: &str = "gemm_abc";
    let (ar, ac) = matrix_dims(a)?;
    let (br, bc) = matrix_dims(b)?;
    if ac != br {
        return Err(mismatch(OP, a, b));
    }
    let (m, k, n) = (ar, ac, bc);
    kernel(OP, (m, k, n), a, b, bias, |i, p| i * ac + p, |p, j| p * bc + j)
}

/// `A · Bᵀ (+ bias)`: `[m, k] · [n, k]ᵀ → [m, n]`.
pub fn gemm_atbc(a: &Tensor, b: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
    const OP: &str = "gemm_atbc";
    let (ar, ac) = matrix_dims(a)?;
    let (br, bc) = matrix_dims(b)?;
    if ac != bc {
        return Err(mismatch(OP, a, b));
    }
    let (m, k, n) = (ar, ac, br);
    kernel(OP, (m, k, n), a, b, bias, |i, p| i * ac + p, |p, j| j * bc + p)
}

/// `Aᵀ · B (+ bias)`: `[k, m]ᵀ · [k, n] → [m, n]`.
pub fn gemm_tabc(a: &Tensor, b: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
    const OP: &str = "gemm_tabc";
    let (ar, ac) = matrix_dims(a)?;
    let (br, bc) = matrix_dims(b)?;
    if ar != br {
        return Err(mismatch(OP, a, b));
    }
    let (m, k, n) = (ac, ar, bc);
    kernel(OP, (m, k, n), a, b, bias, |i, p| p * ac + i, |p, j| p * bc + j)
}

/// `Aᵀ · Bᵀ (+ bias)`: `[k, m]ᵀ · [n, k]ᵀ → [m, n]`.
pub fn gemm_tatbc(a: &Tensor, b: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
    const OP: &str = "gemm_tatbc";
    let (ar, ac) = matrix_dims(a)?;
    let (br, bc) = matrix_dims(b)?;
    if ar != bc {
        return Err(mismatch(OP, a, b));
    }
    let (m, k, n) = (ac, ar, br);
    kernel(OP, (m, k, n), a, b, bias, |i, p| p * ac + i, |p, j| j * bc + p)
}

/// Shared triple loop. `a_at(i, p)` and `b_at(p, j)` give the flat position
/// of the logical operands `op(A)[i, p]` and `op(B)[p, j]`.
#[allow(clippy::too_many_arguments)]
fn kernel(
    op: &'static str,
    (m, k, n): (usize, usize, usize),
    a: &Tensor,
    b: &Tensor,
    bias: Option<&Tensor>,
    a_at: impl Fn(usize, usize) -> usize,
    b_at: impl Fn(usize, usize) -> usize,
) -> Result<Tensor> {
    let mut out = vec![0.0; m * n];
    if let Some(bias) = bias {
        let expected = Shape::from((1, n));
        if bias.shape() != &expected {
            return Err(Error::BiasShapeMismatch {
                op,
                expected,
                got: bias.shape().clone(),
            });
        }
        for row in out.chunks_mut(n) {
            row.copy_from_slice(bias.data());
        }
    }

    let (ad, bd) = (a.data(), b.data());
    for i in 0..m {
        let row = &mut out[i * n..(i + 1) * n];
        for p in 0..k {
            let aip = ad[a_at(i, p)];
            for (j, acc) in row.iter_mut().enumerate() {
                *acc += aip * bd[b_at(p, j)];
            }
        }
    }
    Tensor::new(out, (m, n))
}

fn matrix_dims(t: &Tensor) -> Result<(usize, usize)> {
    match t.dims() {
        &[r, c] => Ok((r, c)),
        _ => Err(Error::RankMismatch {
            expected: 2,
            got: t.rank(),
        }),
    }
}

fn mismatch(op: &'static str, a: &Tensor, b: &Tensor) -> Error {
    Error::MatmulShapeMismatch {
        op,
        lhs: a.shape().clone(),
        rhs: b.shape().clone(),
    }
}
