use super::{Contribution, MapFn, Node, Operation};
use crate::backend::Matrix;
use crate::dual::{D, DM, DV};
use crate::error::Result;
use crate::ops::derivative_fn;

/// Tape entries with a matrix result.
#[derive(Clone, Default)]
pub enum MatrixOp {
    #[default]
    Noop,

    // ── Matrix ⊕ matrix ──
    AddDMDM(DM, DM),
    AddDMDMCons(DM),
    SubDMDM(DM, DM),
    SubDMDMCons(DM),
    SubDMConsDM(DM),
    MulDMDM(DM, DM),
    MulDMDMCons(DM, DM),
    MulDMConsDM(DM, DM),
    HadamardDMDM(DM, DM),
    HadamardDMDMCons(DM, DM),

    // ── Matrix ⊕ scalar ──
    MulDMD(DM, D),
    MulDMDCons(DM, D),
    MulDMConsD(DM, D),

    /// `a bᵀ`.
    OuterDVDV(DV, DV),
    OuterDVDVCons(DV, DV),
    OuterDVConsDV(DV, DV),

    // ── Elementwise unary ──
    NegDM(DM),
    ExpDM(DM),
    TanhDM(DM),
    MapDM(MapFn, DM),

    // ── Structure / linear algebra ──
    TransposeDM(DM),
    InverseDM(DM),
    /// Row-major reshape of a vector into `rows` rows.
    ReshapeDV(DV, usize),
    /// Matrix with the vector on its main diagonal, zero elsewhere.
    DiagDV(DV),
    /// Matrix assembled from row vectors; only active rows are kept, with
    /// their positions.
    OfRows(Vec<(usize, DV)>),
}

impl Operation<Matrix<f64>> for MatrixOp {
    fn operands(&self, out: &mut Vec<Node>) {
        use MatrixOp::*;
        match self {
            Noop => {}
            AddDMDM(a, b) | SubDMDM(a, b) | MulDMDM(a, b) | HadamardDMDM(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            AddDMDMCons(a)
            | SubDMDMCons(a)
            | SubDMConsDM(a)
            | MulDMDMCons(a, _)
            | MulDMConsDM(_, a)
            | HadamardDMDMCons(a, _)
            | MulDMDCons(a, _)
            | NegDM(a)
            | ExpDM(a)
            | TanhDM(a)
            | MapDM(_, a)
            | TransposeDM(a)
            | InverseDM(a) => out.push(a.into()),
            MulDMD(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            MulDMConsD(_, b) => out.push(b.into()),
            OuterDVDV(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            OuterDVDVCons(a, _) | OuterDVConsDV(_, a) | ReshapeDV(a, _) | DiagDV(a) => out.push(a.into()),
            OfRows(rows) => out.extend(rows.iter().map(|(_, r)| Node::from(r))),
        }
    }

    fn backprop(&self, p: &DM, d: &DM, out: &mut Vec<Contribution>) -> Result<()> {
        use MatrixOp::*;
        let push = |out: &mut Vec<Contribution>, v: DM, target: &DM| out.push(Contribution::matrix(v, target));
        let push_s = |out: &mut Vec<Contribution>, v: D, target: &D| out.push(Contribution::scalar(v, target));
        let push_v = |out: &mut Vec<Contribution>, v: DV, target: &DV| out.push(Contribution::vector(v, target));

        match self {
            Noop => {}

            AddDMDM(a, b) => {
                push(out, d.clone(), a);
                push(out, d.clone(), b);
            }
            AddDMDMCons(a) | SubDMDMCons(a) => push(out, d.clone(), a),
            SubDMDM(a, b) => {
                push(out, d.clone(), a);
                push(out, -d, b);
            }
            SubDMConsDM(b) => push(out, -d, b),
            MulDMDM(a, b) => {
                push(out, d * b.primal().transpose(), a);
                push(out, a.primal().transpose() * d, b);
            }
            MulDMDMCons(a, cons) => push(out, d * cons.transpose(), a),
            MulDMConsDM(cons, b) => push(out, cons.transpose() * d, b),
            HadamardDMDM(a, b) => {
                push(out, d.hadamard(&b.primal()), a);
                push(out, d.hadamard(&a.primal()), b);
            }
            HadamardDMDMCons(a, cons) => push(out, d.hadamard(cons), a),

            MulDMD(a, b) => {
                push(out, d * b.primal(), a);
                push_s(out, d.hadamard(&a.primal()).sum(), b);
            }
            MulDMDCons(a, cons) => push(out, d * cons, a),
            MulDMConsD(cons, b) => push_s(out, d.hadamard(cons).sum(), b),

            OuterDVDV(a, b) => {
                push_v(out, d * b.primal(), a);
                push_v(out, a.primal() * d, b);
            }
            OuterDVDVCons(a, cons) => push_v(out, d * cons, a),
            OuterDVConsDV(cons, b) => push_v(out, cons * d, b),

            NegDM(a) => push(out, -d, a),
            ExpDM(a) => push(out, d.hadamard(p), a),
            TanhDM(a) => {
                let ones = DM::ones(p.rows(), p.cols());
                push(out, d.hadamard(&(ones - p.hadamard(p))), a);
            }
            MapDM(f, a) => push(out, d.hadamard(&a.primal().map_rc(derivative_fn(f))), a),

            TransposeDM(a) => push(out, d.transpose(), a),
            InverseDM(a) => {
                let pt = p.transpose();
                push(out, -(&pt * d * &pt), a);
            }
            ReshapeDV(a, _) => push_v(out, d.flatten(), a),
            DiagDV(a) => push_v(out, d.diagonal(), a),
            OfRows(rows) => {
                for (i, row) in rows {
                    push_v(out, d.row(*i), row);
                }
            }
        }
        Ok(())
    }
}
