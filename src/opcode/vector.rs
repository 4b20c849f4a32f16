use super::{Contribution, MapFn, Node, Operation};
use crate::dual::{D, DM, DV};
use crate::error::Result;
use crate::ops::derivative_fn;

/// Tape entries with a vector result.
#[derive(Clone, Default)]
pub enum VectorOp {
    #[default]
    Noop,

    // ── Vector ⊕ vector ──
    AddDVDV(DV, DV),
    AddDVDVCons(DV),
    SubDVDV(DV, DV),
    SubDVDVCons(DV),
    SubDVConsDV(DV),
    HadamardDVDV(DV, DV),
    HadamardDVDVCons(DV, DV),
    DivElemDVDV(DV, DV),
    DivElemDVDVCons(DV, DV),
    DivElemDVConsDV(DV, DV),

    // ── Vector ⊕ scalar ──
    /// `a + b` with `b` broadcast to every element.
    AddDVD(DV, D),
    AddDVDCons(DV),
    AddDVConsD(D),
    MulDVD(DV, D),
    MulDVDCons(DV, D),
    MulDVConsD(DV, D),

    // ── Elementwise unary ──
    NegDV(DV),
    ExpDV(DV),
    LogDV(DV),
    SqrtDV(DV),
    SinDV(DV),
    CosDV(DV),
    TanhDV(DV),
    AbsDV(DV),
    SignDV(DV),
    MapDV(MapFn, DV),

    // ── Products with matrices ──
    /// `a * b`, matrix times column vector.
    MulDMDV(DM, DV),
    MulDMDVCons(DM, DV),
    MulDMConsDV(DM, DV),
    /// `a * b`, row vector times matrix.
    MulDVDM(DV, DM),
    MulDVDMCons(DV, DM),
    MulDVConsDM(DV, DM),
    /// `a⁻¹ b`.
    SolveDMDV(DM, DV),
    SolveDMDVCons(DM, DV),
    SolveDMConsDV(DM, DV),

    // ── Structure ──
    DiagonalDM(DM),
    RowDM(DM, usize),
    FlattenDM(DM),
    /// `a[start..start + len]`.
    SliceDV(DV, usize),
    AppendDVDV(DV, DV),
    AppendDVDVCons(DV),
    AppendDVConsDV(DV, DV),
    /// Vector assembled from scalars; only active entries are kept, with
    /// their positions.
    OfScalars(Vec<(usize, D)>),
}

impl Operation<Vec<f64>> for VectorOp {
    fn operands(&self, out: &mut Vec<Node>) {
        use VectorOp::*;
        match self {
            Noop => {}
            AddDVDV(a, b) | SubDVDV(a, b) | HadamardDVDV(a, b) | DivElemDVDV(a, b) | AppendDVDV(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            AddDVDVCons(a)
            | SubDVDVCons(a)
            | SubDVConsDV(a)
            | HadamardDVDVCons(a, _)
            | DivElemDVDVCons(a, _)
            | DivElemDVConsDV(_, a)
            | AddDVDCons(a)
            | MulDVDCons(a, _)
            | MulDMConsDV(_, a)
            | MulDVDMCons(a, _)
            | SolveDMConsDV(_, a)
            | AppendDVDVCons(a)
            | AppendDVConsDV(_, a)
            | SliceDV(a, _) => out.push(a.into()),
            AddDVD(a, b) | MulDVD(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            AddDVConsD(b) | MulDVConsD(_, b) => out.push(b.into()),
            NegDV(a) | ExpDV(a) | LogDV(a) | SqrtDV(a) | SinDV(a) | CosDV(a) | TanhDV(a) | AbsDV(a)
            | SignDV(a) | MapDV(_, a) => out.push(a.into()),
            MulDMDV(a, b) | SolveDMDV(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            MulDVDM(a, b) => {
                out.push(a.into());
                out.push(b.into());
            }
            MulDMDVCons(a, _) | SolveDMDVCons(a, _) | MulDVConsDM(_, a) => out.push(a.into()),
            DiagonalDM(a) | RowDM(a, _) | FlattenDM(a) => out.push(a.into()),
            OfScalars(items) => out.extend(items.iter().map(|(_, d)| Node::from(d))),
        }
    }

    fn backprop(&self, p: &DV, d: &DV, out: &mut Vec<Contribution>) -> Result<()> {
        use VectorOp::*;
        let push = |out: &mut Vec<Contribution>, v: DV, target: &DV| out.push(Contribution::vector(v, target));
        let push_s = |out: &mut Vec<Contribution>, v: D, target: &D| out.push(Contribution::scalar(v, target));
        let push_m = |out: &mut Vec<Contribution>, v: DM, target: &DM| out.push(Contribution::matrix(v, target));

        match self {
            Noop => {}

            AddDVDV(a, b) => {
                push(out, d.clone(), a);
                push(out, d.clone(), b);
            }
            AddDVDVCons(a) | SubDVDVCons(a) | AddDVDCons(a) => push(out, d.clone(), a),
            SubDVDV(a, b) => {
                push(out, d.clone(), a);
                push(out, -d, b);
            }
            SubDVConsDV(b) => push(out, -d, b),
            HadamardDVDV(a, b) => {
                push(out, d.hadamard(&b.primal()), a);
                push(out, d.hadamard(&a.primal()), b);
            }
            HadamardDVDVCons(a, cons) => push(out, d.hadamard(cons), a),
            DivElemDVDV(a, b) => {
                let bp = b.primal();
                push(out, d.div_elem(&bp), a);
                push(out, -d.hadamard(p).div_elem(&bp), b);
            }
            DivElemDVDVCons(a, cons) => push(out, d.div_elem(cons), a),
            DivElemDVConsDV(_, b) => push(out, -d.hadamard(p).div_elem(&b.primal()), b),

            AddDVD(a, b) => {
                push(out, d.clone(), a);
                push_s(out, d.sum(), b);
            }
            AddDVConsD(b) => push_s(out, d.sum(), b),
            MulDVD(a, b) => {
                push(out, d * b.primal(), a);
                push_s(out, d.dot(&a.primal()), b);
            }
            MulDVDCons(a, cons) => push(out, d * cons, a),
            MulDVConsD(cons, b) => push_s(out, d.dot(cons), b),

            NegDV(a) => push(out, -d, a),
            ExpDV(a) => push(out, d.hadamard(p), a),
            LogDV(a) => push(out, d.div_elem(&a.primal()), a),
            SqrtDV(a) => push(out, d.div_elem(&(p * 2.0)), a),
            SinDV(a) => push(out, d.hadamard(&a.primal().cos()), a),
            CosDV(a) => push(out, -d.hadamard(&a.primal().sin()), a),
            TanhDV(a) => push(out, d.hadamard(&(1.0 - p.hadamard(p))), a),
            AbsDV(a) => push(out, d.hadamard(&a.primal().signum()), a),
            SignDV(a) => push(out, DV::zeros(a.len()), a),
            MapDV(f, a) => push(out, d.hadamard(&a.primal().map_rc(derivative_fn(f))), a),

            MulDMDV(a, b) => {
                push_m(out, d.outer(&b.primal()), a);
                push(out, d * a.primal(), b);
            }
            MulDMDVCons(a, cons) => push_m(out, d.outer(cons), a),
            MulDMConsDV(cons, b) => push(out, d * cons, b),
            MulDVDM(a, b) => {
                push(out, b.primal() * d, a);
                push_m(out, a.primal().outer(d), b);
            }
            MulDVDMCons(a, cons) => push(out, cons * d, a),
            MulDVConsDM(cons, b) => push_m(out, cons.outer(d), b),
            SolveDMDV(a, b) => {
                let ba = a.primal().transpose().solve(d)?;
                push_m(out, -ba.outer(p), a);
                push(out, ba, b);
            }
            SolveDMDVCons(a, _) => {
                let ba = a.primal().transpose().solve(d)?;
                push_m(out, -ba.outer(p), a);
            }
            SolveDMConsDV(cons, b) => push(out, cons.transpose().solve(d)?, b),

            DiagonalDM(a) => push_m(out, d.embed_diagonal(a.rows(), a.cols()), a),
            RowDM(a, i) => push_m(out, DV::unit(a.rows(), *i).outer(d), a),
            FlattenDM(a) => push_m(out, d.reshape(a.rows())?, a),
            SliceDV(a, start) => {
                let tail = a.len() - start - d.len();
                push(out, DV::zeros(*start).append(d).append(&DV::zeros(tail)), a);
            }
            AppendDVDV(a, b) => {
                push(out, d.slice(0, a.len()), a);
                push(out, d.slice(a.len(), b.len()), b);
            }
            AppendDVDVCons(a) => push(out, d.slice(0, a.len()), a),
            AppendDVConsDV(cons, b) => push(out, d.slice(cons.len(), b.len()), b),
            OfScalars(items) => {
                for (i, item) in items {
                    push_s(out, d.item(*i), item);
                }
            }
        }
        Ok(())
    }
}
