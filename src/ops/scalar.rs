//! Scalar primitives.

use std::f64::consts::LN_10;

use crate::dispatch::{op_binary, op_unary, try_op_binary};
use crate::dual::D;
use crate::error::{fatal, Result};
use crate::opcode::ScalarOp;

// ── Arithmetic ──

pub(crate) fn try_add(a: &D, b: &D) -> Result<D> {
    try_op_binary(
        "add",
        a,
        b,
        |a, b| Ok(a + b),
        try_add,
        |_, _, at| Ok(at.clone()),
        |_, _, bt| Ok(bt.clone()),
        |_, _, at, _, bt| Ok(at + bt),
        |a, b| ScalarOp::AddDD(a.clone(), b.clone()),
        |a, _| ScalarOp::AddDDCons(a.clone()),
        |_, b| ScalarOp::AddDDCons(b.clone()),
    )
}

pub(crate) fn try_sub(a: &D, b: &D) -> Result<D> {
    try_op_binary(
        "sub",
        a,
        b,
        |a, b| Ok(a - b),
        try_sub,
        |_, _, at| Ok(at.clone()),
        |_, _, bt| Ok(-bt),
        |_, _, at, _, bt| Ok(at - bt),
        |a, b| ScalarOp::SubDD(a.clone(), b.clone()),
        |a, _| ScalarOp::SubDDCons(a.clone()),
        |_, b| ScalarOp::SubDConsD(b.clone()),
    )
}

pub(crate) fn try_mul(a: &D, b: &D) -> Result<D> {
    try_op_binary(
        "mul",
        a,
        b,
        |a, b| Ok(a * b),
        try_mul,
        |_, _, at| Ok(at * b),
        |_, _, bt| Ok(a * bt),
        |_, ap, at, bp, bt| Ok(at * bp + ap * bt),
        |a, b| ScalarOp::MulDD(a.clone(), b.clone()),
        |a, b| ScalarOp::MulDDCons(a.clone(), b.clone()),
        |a, b| ScalarOp::MulDDCons(b.clone(), a.clone()),
    )
}

pub(crate) fn try_div(a: &D, b: &D) -> Result<D> {
    try_op_binary(
        "div",
        a,
        b,
        |a, b| Ok(a / b),
        try_div,
        |_, _, at| Ok(at / b),
        |cp, bp, bt| Ok(-bt * cp / bp),
        |cp, _, at, bp, bt| Ok((at - bt * cp) / bp),
        |a, b| ScalarOp::DivDD(a.clone(), b.clone()),
        |a, b| ScalarOp::DivDDCons(a.clone(), b.clone()),
        |a, b| ScalarOp::DivDConsD(a.clone(), b.clone()),
    )
}

pub(crate) fn add(a: &D, b: &D) -> D {
    try_add(a, b).unwrap_or_else(|e| fatal(e))
}

pub(crate) fn sub(a: &D, b: &D) -> D {
    try_sub(a, b).unwrap_or_else(|e| fatal(e))
}

pub(crate) fn mul(a: &D, b: &D) -> D {
    try_mul(a, b).unwrap_or_else(|e| fatal(e))
}

pub(crate) fn div(a: &D, b: &D) -> D {
    try_div(a, b).unwrap_or_else(|e| fatal(e))
}

pub(crate) fn neg(a: &D) -> D {
    op_unary(a, |a| -a, neg, |_, _, at| -at, |a| ScalarOp::Neg(a.clone()))
}

impl D {
    /// `self + other`, reporting a nesting conflict instead of panicking.
    pub fn try_add(&self, other: &D) -> Result<D> {
        try_add(self, other)
    }

    pub fn try_sub(&self, other: &D) -> Result<D> {
        try_sub(self, other)
    }

    pub fn try_mul(&self, other: &D) -> Result<D> {
        try_mul(self, other)
    }

    pub fn try_div(&self, other: &D) -> Result<D> {
        try_div(self, other)
    }

    /// `self` raised to a differentiable power.
    pub fn powf(&self, exponent: &D) -> D {
        op_binary(
            "pow",
            self,
            exponent,
            |a, b| a.powf(*b),
            D::powf,
            |_, ap, at| at * ap.powf(&(exponent - 1.0)) * exponent,
            |cp, _, bt| bt * cp * self.ln(),
            |_, ap, at, bp, bt| ap.powf(&(bp - 1.0)) * (at * bp + ap * bt * ap.ln()),
            |a, b| ScalarOp::PowDD(a.clone(), b.clone()),
            |a, b| ScalarOp::PowDDCons(a.clone(), b.clone()),
            |a, b| ScalarOp::PowDConsD(a.clone(), b.clone()),
        )
    }

    pub fn powi(&self, n: i32) -> D {
        self.powf(&D::from(f64::from(n)))
    }

    /// Four-quadrant arctangent of `self / other`.
    pub fn atan2(&self, other: &D) -> D {
        op_binary(
            "atan2",
            self,
            other,
            |a, b| a.atan2(*b),
            D::atan2,
            |_, ap, at| at * other / (ap * ap + other * other),
            |_, bp, bt| -bt * self / (self * self + bp * bp),
            |_, ap, at, bp, bt| (at * bp - bt * ap) / (ap * ap + bp * bp),
            |a, b| ScalarOp::Atan2DD(a.clone(), b.clone()),
            |a, b| ScalarOp::Atan2DDCons(a.clone(), b.clone()),
            |a, b| ScalarOp::Atan2DConsD(a.clone(), b.clone()),
        )
    }

    pub fn recip(&self) -> D {
        1.0 / self
    }

    pub fn exp(&self) -> D {
        op_unary(self, |a| a.exp(), D::exp, |cp, _, at| at * cp, |a| ScalarOp::Exp(a.clone()))
    }

    /// Natural logarithm.
    pub fn ln(&self) -> D {
        op_unary(self, |a| a.ln(), D::ln, |_, ap, at| at / ap, |a| ScalarOp::Log(a.clone()))
    }

    pub fn log10(&self) -> D {
        op_unary(
            self,
            |a| a.log10(),
            D::log10,
            |_, ap, at| at / (ap * LN_10),
            |a| ScalarOp::Log10(a.clone()),
        )
    }

    pub fn sqrt(&self) -> D {
        op_unary(
            self,
            |a| a.sqrt(),
            D::sqrt,
            |cp, _, at| at / (cp * 2.0),
            |a| ScalarOp::Sqrt(a.clone()),
        )
    }

    pub fn sin(&self) -> D {
        op_unary(self, |a| a.sin(), D::sin, |_, ap, at| at * ap.cos(), |a| ScalarOp::Sin(a.clone()))
    }

    pub fn cos(&self) -> D {
        op_unary(self, |a| a.cos(), D::cos, |_, ap, at| -at * ap.sin(), |a| ScalarOp::Cos(a.clone()))
    }

    pub fn tan(&self) -> D {
        op_unary(
            self,
            |a| a.tan(),
            D::tan,
            |_, ap, at| {
                let c = ap.cos();
                at / (&c * &c)
            },
            |a| ScalarOp::Tan(a.clone()),
        )
    }

    pub fn sinh(&self) -> D {
        op_unary(self, |a| a.sinh(), D::sinh, |_, ap, at| at * ap.cosh(), |a| ScalarOp::Sinh(a.clone()))
    }

    pub fn cosh(&self) -> D {
        op_unary(self, |a| a.cosh(), D::cosh, |_, ap, at| at * ap.sinh(), |a| ScalarOp::Cosh(a.clone()))
    }

    pub fn tanh(&self) -> D {
        op_unary(
            self,
            |a| a.tanh(),
            D::tanh,
            |_, ap, at| {
                let c = ap.cosh();
                at / (&c * &c)
            },
            |a| ScalarOp::Tanh(a.clone()),
        )
    }

    pub fn asin(&self) -> D {
        op_unary(
            self,
            |a| a.asin(),
            D::asin,
            |_, ap, at| at / (1.0 - ap * ap).sqrt(),
            |a| ScalarOp::Asin(a.clone()),
        )
    }

    pub fn acos(&self) -> D {
        op_unary(
            self,
            |a| a.acos(),
            D::acos,
            |_, ap, at| -at / (1.0 - ap * ap).sqrt(),
            |a| ScalarOp::Acos(a.clone()),
        )
    }

    pub fn atan(&self) -> D {
        op_unary(
            self,
            |a| a.atan(),
            D::atan,
            |_, ap, at| at / (1.0 + ap * ap),
            |a| ScalarOp::Atan(a.clone()),
        )
    }

    pub fn abs(&self) -> D {
        op_unary(
            self,
            |a| a.abs(),
            D::abs,
            |_, ap, at| at * ap.signum(),
            |a| ScalarOp::Abs(a.clone()),
        )
    }

    /// Sign of the value; derivative zero.
    pub fn signum(&self) -> D {
        op_unary(
            self,
            |a| a.signum(),
            D::signum,
            |cp, _, _| cp.zero_like(),
            |a| ScalarOp::Sign(a.clone()),
        )
    }

    pub fn floor(&self) -> D {
        op_unary(
            self,
            |a| a.floor(),
            D::floor,
            |cp, _, _| cp.zero_like(),
            |a| ScalarOp::Floor(a.clone()),
        )
    }

    pub fn ceil(&self) -> D {
        op_unary(
            self,
            |a| a.ceil(),
            D::ceil,
            |cp, _, _| cp.zero_like(),
            |a| ScalarOp::Ceil(a.clone()),
        )
    }

    pub fn round(&self) -> D {
        op_unary(
            self,
            |a| a.round(),
            D::round,
            |cp, _, _| cp.zero_like(),
            |a| ScalarOp::Round(a.clone()),
        )
    }

    /// Smooth `log(1 + exp(x))`.
    pub fn softplus(&self) -> D {
        (self.exp() + 1.0).ln()
    }

    pub fn sigmoid(&self) -> D {
        1.0 / ((-self).exp() + 1.0)
    }

    pub fn max(&self, other: &D) -> D {
        if self.value() >= other.value() {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn min(&self, other: &D) -> D {
        if self.value() <= other.value() {
            self.clone()
        } else {
            other.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::dual::D;

    fn tangent(f: impl Fn(&D) -> D, x: f64) -> f64 {
        let x = D::from(x).make_forward(D::from(1.0), 1);
        f(&x).tangent().unwrap().value()
    }

    #[test]
    fn plain_values() {
        let x = D::from(0.5);
        assert_relative_eq!(x.sin().value(), 0.5_f64.sin());
        assert_relative_eq!(x.powf(&D::from(3.0)).value(), 0.125);
        assert_relative_eq!(x.atan2(&D::from(1.0)).value(), 0.5_f64.atan2(1.0));
        assert_eq!(D::from(-2.5).signum(), -1.0);
    }

    #[test]
    fn unary_tangents() {
        let x = 0.3;
        assert_relative_eq!(tangent(D::exp, x), x.exp(), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::ln, x), 1.0 / x, epsilon = 1e-12);
        assert_relative_eq!(tangent(D::log10, x), 1.0 / (x * std::f64::consts::LN_10), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::sqrt, x), 0.5 / x.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::tan, x), 1.0 / (x.cos() * x.cos()), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::tanh, x), 1.0 - x.tanh() * x.tanh(), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::asin, x), 1.0 / (1.0 - x * x).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::acos, x), -1.0 / (1.0 - x * x).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::atan, x), 1.0 / (1.0 + x * x), epsilon = 1e-12);
        assert_relative_eq!(tangent(D::abs, -x), -1.0);
        assert_eq!(tangent(D::floor, x), 0.0);
    }

    #[test]
    fn binary_tangents() {
        let c = D::from(1.7);
        assert_relative_eq!(tangent(|x| x.powf(&c), 2.0), 1.7 * 2.0_f64.powf(0.7), epsilon = 1e-12);
        assert_relative_eq!(tangent(|x| c.powf(x), 2.0), 1.7_f64.powf(2.0) * 1.7_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(tangent(|x| x.powf(x), 2.0), 4.0 * (1.0 + 2.0_f64.ln()), epsilon = 1e-12);
        assert_relative_eq!(tangent(|x| x.atan2(&c), 2.0), 1.7 / (4.0 + 1.7 * 1.7), epsilon = 1e-12);
        assert_relative_eq!(tangent(|x| &c / x, 2.0), -1.7 / 4.0, epsilon = 1e-12);
        assert_relative_eq!(tangent(|x| x / x, 2.0), 0.0, epsilon = 1e-12);
    }
}
