use std::f64::consts::LN_10;

use super::{Contribution, Node, Operation};
use crate::config::Config;
use crate::dual::{D, DM, DV};
use crate::error::Result;
use crate::ops::fixed_point::fixed_point_adjoint;

/// Tape entries with a scalar result.
#[derive(Clone, Default)]
pub enum ScalarOp {
    /// Leaf: nothing to propagate into.
    #[default]
    Noop,

    // ── Binary arithmetic ──
    AddDD(D, D),
    AddDDCons(D),
    SubDD(D, D),
    SubDDCons(D),
    SubDConsD(D),
    MulDD(D, D),
    MulDDCons(D, D),
    DivDD(D, D),
    DivDDCons(D, D),
    DivDConsD(D, D),
    PowDD(D, D),
    PowDDCons(D, D),
    PowDConsD(D, D),
    Atan2DD(D, D),
    Atan2DDCons(D, D),
    Atan2DConsD(D, D),

    // ── Unary ──
    Neg(D),
    Exp(D),
    Log(D),
    Log10(D),
    Sqrt(D),
    Sin(D),
    Cos(D),
    Tan(D),
    Sinh(D),
    Cosh(D),
    Tanh(D),
    Asin(D),
    Acos(D),
    Atan(D),
    Abs(D),
    /// Zero derivative almost everywhere.
    Sign(D),
    Floor(D),
    Ceil(D),
    Round(D),

    // ── Reductions of vectors ──
    DotDVDV(DV, DV),
    DotDVDVCons(DV, DV),
    SumDV(DV),
    L1NormDV(DV),
    L2NormDV(DV),
    L2NormSqDV(DV),
    ItemDV(DV, usize),

    // ── Reductions of matrices ──
    SumDM(DM),
    TraceDM(DM),
    DetDM(DM),
    ItemDM(DM, usize, usize),

    /// Converged fixed point `a* = g(a*, b)`.
    ///
    /// `b_first` and `a_prev` are fresh leaves used to re-run one step of
    /// `g` as `a_last = g(a_prev, b_first)`; the adjoint rule iterates
    /// reverse passes through that step.
    FixedPoint {
        b: D,
        b_first: D,
        a_prev: D,
        a_last: D,
        config: Config,
    },
}

impl Operation<f64> for ScalarOp {
    fn operands(&self, out: &mut Vec<Node>) {
        use ScalarOp::*;
        match self {
            Noop => {}
            AddDD(a, b) | SubDD(a, b) | MulDD(a, b) | DivDD(a, b) | PowDD(a, b) | Atan2DD(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            AddDDCons(a)
            | SubDDCons(a)
            | SubDConsD(a)
            | MulDDCons(a, _)
            | DivDDCons(a, _)
            | PowDDCons(a, _)
            | Atan2DDCons(a, _)
            | DivDConsD(_, a)
            | PowDConsD(_, a)
            | Atan2DConsD(_, a) => out.push(a.into()),
            Neg(a) | Exp(a) | Log(a) | Log10(a) | Sqrt(a) | Sin(a) | Cos(a) | Tan(a) | Sinh(a)
            | Cosh(a) | Tanh(a) | Asin(a) | Acos(a) | Atan(a) | Abs(a) | Sign(a) | Floor(a)
            | Ceil(a) | Round(a) => out.push(a.into()),
            DotDVDV(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            DotDVDVCons(a, _) | SumDV(a) | L1NormDV(a) | L2NormDV(a) | L2NormSqDV(a) | ItemDV(a, _) => {
                out.push(a.into())
            }
            SumDM(a) | TraceDM(a) | DetDM(a) | ItemDM(a, _, _) => out.push(a.into()),
            FixedPoint { b, .. } => out.push(b.into()),
        }
    }

    fn backprop(&self, p: &D, d: &D, out: &mut Vec<Contribution>) -> Result<()> {
        use ScalarOp::*;
        let push = |out: &mut Vec<Contribution>, v: D, target: &D| out.push(Contribution::scalar(v, target));
        let push_v = |out: &mut Vec<Contribution>, v: DV, target: &DV| out.push(Contribution::vector(v, target));
        let push_m = |out: &mut Vec<Contribution>, v: DM, target: &DM| out.push(Contribution::matrix(v, target));

        match self {
            Noop => {}

            AddDD(a, b) => {
                push(out, d.clone(), a);
                push(out, d.clone(), b);
            }
            AddDDCons(a) | SubDDCons(a) => push(out, d.clone(), a),
            SubDD(a, b) => {
                push(out, d.clone(), a);
                push(out, -d, b);
            }
            SubDConsD(b) => push(out, -d, b),
            MulDD(a, b) => {
                push(out, d * b.primal(), a);
                push(out, d * a.primal(), b);
            }
            MulDDCons(a, cons) => push(out, d * cons, a),
            DivDD(a, b) => {
                let bp = b.primal();
                push(out, d / &bp, a);
                push(out, d * (-a.primal() / (&bp * &bp)), b);
            }
            DivDDCons(a, cons) => push(out, d / cons, a),
            DivDConsD(cons, b) => {
                let bp = b.primal();
                push(out, d * (-cons / (&bp * &bp)), b);
            }
            PowDD(a, b) => {
                let (ap, bp) = (a.primal(), b.primal());
                push(out, d * ap.powf(&(&bp - 1.0)) * &bp, a);
                push(out, d * p * ap.ln(), b);
            }
            PowDDCons(a, cons) => push(out, d * a.primal().powf(&(cons - 1.0)) * cons, a),
            PowDConsD(cons, b) => push(out, d * p * cons.ln(), b),
            Atan2DD(a, b) => {
                let (ap, bp) = (a.primal(), b.primal());
                let denom = &ap * &ap + &bp * &bp;
                push(out, d * &bp / &denom, a);
                push(out, d * (-ap) / &denom, b);
            }
            Atan2DDCons(a, cons) => {
                let ap = a.primal();
                push(out, d * cons / (&ap * &ap + cons * cons), a);
            }
            Atan2DConsD(cons, b) => {
                let bp = b.primal();
                push(out, d * (-cons) / (cons * cons + &bp * &bp), b);
            }

            Neg(a) => push(out, -d, a),
            Exp(a) => push(out, d * p, a),
            Log(a) => push(out, d / a.primal(), a),
            Log10(a) => push(out, d / (a.primal() * LN_10), a),
            Sqrt(a) => push(out, d / (p * 2.0), a),
            Sin(a) => push(out, d * a.primal().cos(), a),
            Cos(a) => push(out, d * (-a.primal().sin()), a),
            Tan(a) => {
                let c = a.primal().cos();
                push(out, d / (&c * &c), a);
            }
            Sinh(a) => push(out, d * a.primal().cosh(), a),
            Cosh(a) => push(out, d * a.primal().sinh(), a),
            Tanh(a) => {
                let c = a.primal().cosh();
                push(out, d / (&c * &c), a);
            }
            Asin(a) => {
                let ap = a.primal();
                push(out, d / (1.0 - &ap * &ap).sqrt(), a);
            }
            Acos(a) => {
                let ap = a.primal();
                push(out, -d / (1.0 - &ap * &ap).sqrt(), a);
            }
            Atan(a) => {
                let ap = a.primal();
                push(out, d / (1.0 + &ap * &ap), a);
            }
            Abs(a) => push(out, d * a.primal().signum(), a),
            Sign(a) | Floor(a) | Ceil(a) | Round(a) => push(out, D::from(0.0), a),

            DotDVDV(a, b) => {
                push_v(out, b.primal() * d, a);
                push_v(out, a.primal() * d, b);
            }
            DotDVDVCons(a, cons) => push_v(out, cons * d, a),
            SumDV(a) => push_v(out, DV::ones(a.len()) * d, a),
            L1NormDV(a) => push_v(out, a.primal().signum() * d, a),
            L2NormDV(a) => push_v(out, a.primal() * (d / p), a),
            L2NormSqDV(a) => push_v(out, a.primal() * (d * 2.0), a),
            ItemDV(a, i) => push_v(out, DV::unit(a.len(), *i) * d, a),

            SumDM(a) => push_m(out, DM::ones(a.rows(), a.cols()) * d, a),
            TraceDM(a) => push_m(out, DM::identity(a.rows()) * d, a),
            DetDM(a) => {
                let inv_t = a.primal().inverse()?.transpose();
                push_m(out, inv_t * (d * p), a);
            }
            ItemDM(a, i, j) => push_m(out, DM::unit(a.rows(), a.cols(), *i, *j) * d, a),

            FixedPoint {
                b,
                b_first,
                a_prev,
                a_last,
                config,
            } => {
                let bbar = fixed_point_adjoint(d, b_first, a_prev, a_last, config)?;
                push(out, bbar, b);
            }
        }
        Ok(())
    }
}
