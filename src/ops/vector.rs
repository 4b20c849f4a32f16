//! Vector primitives.

use std::rc::Rc;

use super::derivative_fn;
use crate::backend;
use crate::dispatch::{op_binary, op_unary, try_op_collect};
use crate::dual::{D, DV};
use crate::error::fatal;
use crate::opcode::{MapFn, ScalarOp, VectorOp};

// ── Arithmetic ──

pub(crate) fn add_dv_dv(a: &DV, b: &DV) -> DV {
    op_binary(
        "add",
        a,
        b,
        |a, b| backend::map2(|x, y| x + y, a, b),
        add_dv_dv,
        |_, _, at| at.clone(),
        |_, _, bt| bt.clone(),
        |_, _, at, _, bt| at + bt,
        |a, b| VectorOp::AddDVDV(a.clone(), b.clone()),
        |a, _| VectorOp::AddDVDVCons(a.clone()),
        |_, b| VectorOp::AddDVDVCons(b.clone()),
    )
}

pub(crate) fn sub_dv_dv(a: &DV, b: &DV) -> DV {
    op_binary(
        "sub",
        a,
        b,
        |a, b| backend::map2(|x, y| x - y, a, b),
        sub_dv_dv,
        |_, _, at| at.clone(),
        |_, _, bt| -bt,
        |_, _, at, _, bt| at - bt,
        |a, b| VectorOp::SubDVDV(a.clone(), b.clone()),
        |a, _| VectorOp::SubDVDVCons(a.clone()),
        |_, b| VectorOp::SubDVConsDV(b.clone()),
    )
}

/// `a + b` with the scalar broadcast over every element.
pub(crate) fn add_dv_d(a: &DV, b: &D) -> DV {
    op_binary(
        "add",
        a,
        b,
        |a, b| backend::map(|x| x + *b, a),
        add_dv_d,
        |_, _, at| at.clone(),
        |cp, _, bt| add_dv_d(&cp.zero_like(), bt),
        |_, _, at, _, bt| add_dv_d(at, bt),
        |a, b| VectorOp::AddDVD(a.clone(), b.clone()),
        |a, _| VectorOp::AddDVDCons(a.clone()),
        |_, b| VectorOp::AddDVConsD(b.clone()),
    )
}

pub(crate) fn sub_dv_d(a: &DV, b: &D) -> DV {
    add_dv_d(a, &-b)
}

pub(crate) fn mul_dv_d(a: &DV, b: &D) -> DV {
    op_binary(
        "mul",
        a,
        b,
        |a, b| backend::map(|x| x * *b, a),
        mul_dv_d,
        |_, _, at| at * b,
        |_, _, bt| a * bt,
        |_, ap, at, bp, bt| at * bp + ap * bt,
        |a, b| VectorOp::MulDVD(a.clone(), b.clone()),
        |a, b| VectorOp::MulDVDCons(a.clone(), b.clone()),
        |a, b| VectorOp::MulDVConsD(a.clone(), b.clone()),
    )
}

pub(crate) fn div_dv_d(a: &DV, b: &D) -> DV {
    mul_dv_d(a, &b.recip())
}

pub(crate) fn neg_dv(a: &DV) -> DV {
    op_unary(
        a,
        |a| backend::map(|x: f64| -x, a),
        neg_dv,
        |_, _, at| -at,
        |a| VectorOp::NegDV(a.clone()),
    )
}

impl DV {
    /// Inner product.
    pub fn dot(&self, other: &DV) -> D {
        op_binary(
            "dot",
            self,
            other,
            |a, b| backend::dot(a, b),
            DV::dot,
            |_, _, at| at.dot(other),
            |_, _, bt| self.dot(bt),
            |_, ap, at, bp, bt| at.dot(bp) + ap.dot(bt),
            |a, b| ScalarOp::DotDVDV(a.clone(), b.clone()),
            |a, b| ScalarOp::DotDVDVCons(a.clone(), b.clone()),
            |a, b| ScalarOp::DotDVDVCons(b.clone(), a.clone()),
        )
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &DV) -> DV {
        op_binary(
            "hadamard",
            self,
            other,
            |a, b| backend::map2(|x, y| x * y, a, b),
            DV::hadamard,
            |_, _, at| at.hadamard(other),
            |_, _, bt| self.hadamard(bt),
            |_, ap, at, bp, bt| at.hadamard(bp) + ap.hadamard(bt),
            |a, b| VectorOp::HadamardDVDV(a.clone(), b.clone()),
            |a, b| VectorOp::HadamardDVDVCons(a.clone(), b.clone()),
            |a, b| VectorOp::HadamardDVDVCons(b.clone(), a.clone()),
        )
    }

    /// Elementwise quotient.
    pub fn div_elem(&self, other: &DV) -> DV {
        op_binary(
            "div_elem",
            self,
            other,
            |a, b| backend::map2(|x, y| x / y, a, b),
            DV::div_elem,
            |_, _, at| at.div_elem(other),
            |cp, bp, bt| -bt.hadamard(cp).div_elem(bp),
            |cp, _, at, bp, bt| (at - bt.hadamard(cp)).div_elem(bp),
            |a, b| VectorOp::DivElemDVDV(a.clone(), b.clone()),
            |a, b| VectorOp::DivElemDVDVCons(a.clone(), b.clone()),
            |a, b| VectorOp::DivElemDVConsDV(a.clone(), b.clone()),
        )
    }

    /// Concatenation `[self, other]`.
    pub fn append(&self, other: &DV) -> DV {
        op_binary(
            "append",
            self,
            other,
            |a, b| a.iter().chain(b.iter()).copied().collect(),
            DV::append,
            |_, _, at| at.append(&other.zero_like()),
            |_, _, bt| self.zero_like().append(bt),
            |_, _, at, _, bt| at.append(bt),
            |a, b| VectorOp::AppendDVDV(a.clone(), b.clone()),
            |a, _| VectorOp::AppendDVDVCons(a.clone()),
            |a, b| VectorOp::AppendDVConsDV(a.clone(), b.clone()),
        )
    }

    // ── Reductions ──

    pub fn sum(&self) -> D {
        op_unary(
            self,
            |a| backend::sum(a),
            DV::sum,
            |_, _, at| at.sum(),
            |a| ScalarOp::SumDV(a.clone()),
        )
    }

    pub fn l1_norm(&self) -> D {
        op_unary(
            self,
            |a| backend::l1_norm(a),
            DV::l1_norm,
            |_, ap, at| at.dot(&ap.signum()),
            |a| ScalarOp::L1NormDV(a.clone()),
        )
    }

    pub fn l2_norm(&self) -> D {
        op_unary(
            self,
            |a| backend::l2_norm(a),
            DV::l2_norm,
            |cp, ap, at| at.dot(ap) / cp,
            |a| ScalarOp::L2NormDV(a.clone()),
        )
    }

    pub fn l2_norm_sq(&self) -> D {
        op_unary(
            self,
            |a| backend::l2_norm_sq(a),
            DV::l2_norm_sq,
            |_, ap, at| at.dot(ap) * 2.0,
            |a| ScalarOp::L2NormSqDV(a.clone()),
        )
    }

    /// Element `i`. Panics if `i` is out of bounds.
    pub fn item(&self, i: usize) -> D {
        op_unary(
            self,
            |a| a[i],
            |ap| ap.item(i),
            |_, _, at| at.item(i),
            |a| ScalarOp::ItemDV(a.clone(), i),
        )
    }

    /// `len` elements starting at `start`. Panics if the range is out of bounds.
    pub fn slice(&self, start: usize, len: usize) -> DV {
        op_unary(
            self,
            |a| a[start..start + len].to_vec(),
            |ap| ap.slice(start, len),
            |_, _, at| at.slice(start, len),
            |a| VectorOp::SliceDV(a.clone(), start),
        )
    }

    /// Split into consecutive pieces of the given lengths.
    pub fn split(&self, lengths: &[usize]) -> Vec<DV> {
        let mut start = 0;
        lengths
            .iter()
            .map(|&len| {
                let piece = self.slice(start, len);
                start += len;
                piece
            })
            .collect()
    }

    pub fn to_scalars(&self) -> Vec<D> {
        (0..self.len()).map(|i| self.item(i)).collect()
    }

    /// Assemble a vector from scalars. The result is active at the highest
    /// tag among `items`.
    pub fn of_scalars(items: &[D]) -> DV {
        let result = try_op_collect(
            "of_scalars",
            items,
            &|xs: &[&f64]| -> Vec<f64> { xs.iter().map(|&&x| x).collect() },
            &VectorOp::OfScalars,
        );
        result.unwrap_or_else(|e| fatal(e))
    }

    // ── Elementwise ──

    pub fn exp(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::exp, a),
            DV::exp,
            |cp, _, at| at.hadamard(cp),
            |a| VectorOp::ExpDV(a.clone()),
        )
    }

    pub fn ln(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::ln, a),
            DV::ln,
            |_, ap, at| at.div_elem(ap),
            |a| VectorOp::LogDV(a.clone()),
        )
    }

    pub fn sqrt(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::sqrt, a),
            DV::sqrt,
            |cp, _, at| at.div_elem(&(cp * 2.0)),
            |a| VectorOp::SqrtDV(a.clone()),
        )
    }

    pub fn sin(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::sin, a),
            DV::sin,
            |_, ap, at| at.hadamard(&ap.cos()),
            |a| VectorOp::SinDV(a.clone()),
        )
    }

    pub fn cos(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::cos, a),
            DV::cos,
            |_, ap, at| -at.hadamard(&ap.sin()),
            |a| VectorOp::CosDV(a.clone()),
        )
    }

    pub fn tanh(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::tanh, a),
            DV::tanh,
            |cp, _, at| at.hadamard(&(1.0 - cp.hadamard(cp))),
            |a| VectorOp::TanhDV(a.clone()),
        )
    }

    pub fn abs(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::abs, a),
            DV::abs,
            |_, ap, at| at.hadamard(&ap.signum()),
            |a| VectorOp::AbsDV(a.clone()),
        )
    }

    pub fn signum(&self) -> DV {
        op_unary(
            self,
            |a| backend::map(f64::signum, a),
            DV::signum,
            |cp, _, _| cp.zero_like(),
            |a| VectorOp::SignDV(a.clone()),
        )
    }

    /// `exp(x) / sum(exp(x))`.
    pub fn softmax(&self) -> DV {
        let e = self.exp();
        &e / e.sum()
    }

    /// Apply a scalar function to every element.
    ///
    /// `f` must be built from differentiable operations; its derivative is
    /// taken with a nested forward pass. It must not capture values that
    /// are being differentiated.
    pub fn map(&self, f: impl Fn(&D) -> D + 'static) -> DV {
        self.map_rc(Rc::new(f))
    }

    pub(crate) fn map_rc(&self, f: MapFn) -> DV {
        op_unary(
            self,
            |a| a.iter().map(|&x| f(&D::from(x)).value()).collect(),
            |ap| ap.map_rc(Rc::clone(&f)),
            |_, ap, at| at.hadamard(&ap.map_rc(derivative_fn(&f))),
            |a| VectorOp::MapDV(Rc::clone(&f), a.clone()),
        )
    }
}
