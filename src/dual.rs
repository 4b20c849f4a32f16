//! Tagged dual values.
//!
//! A [`Dual<P>`] is a scalar, vector or matrix (selected by the primal buffer
//! type `P`) in one of three representations:
//!
//! - `Plain`: just the numbers.
//! - `Forward`: a primal, a tangent and the level tag they belong to.
//! - `Reverse`: a primal, a shared adjoint cell, the tape entry that produced
//!   it, a fan-out counter and a level tag.
//!
//! Primals and tangents are themselves dual values, so derivative
//! computations nest to any depth. Forward and reverse values are
//! reference-counted handles: cloning one aliases the same cell, which is
//! what lets the reverse pass write adjoints that every consumer sees.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::backend::Matrix;
use crate::error::{Error, Mode, Result};
use crate::opcode::{Contribution, MatrixOp, Node, Operation, ScalarOp, VectorOp};
use crate::tag::Tag;

/// Differentiable scalar.
pub type D = Dual<f64>;
/// Differentiable vector.
pub type DV = Dual<Vec<f64>>;
/// Differentiable row-major matrix.
pub type DM = Dual<Matrix<f64>>;

/// Numeric buffer type underlying one shape of dual value.
///
/// Each shape owns its own closed set of tape entries ([`Primal::Op`]),
/// namely the operations whose result has that shape.
pub trait Primal: Clone + Debug + Default + 'static {
    /// Tape entries producing a value of this shape. The default is a leaf.
    type Op: Operation<Self> + Default;

    /// Additive identity of the same shape.
    fn zeros_like(&self) -> Self;

    /// Type-erased handle used by the reset traversal.
    fn node(d: &Dual<Self>) -> Node;

    /// Pair an adjoint contribution with the value it is destined for.
    fn contribution(adjoint: Dual<Self>, target: &Dual<Self>) -> Contribution;

    /// Adjoint accumulation `a + b`.
    fn accumulate(a: &Dual<Self>, b: &Dual<Self>) -> Dual<Self>;
}

impl Primal for f64 {
    type Op = ScalarOp;

    #[inline]
    fn zeros_like(&self) -> Self {
        0.0
    }

    fn node(d: &D) -> Node {
        Node::Scalar(d.clone())
    }

    fn contribution(adjoint: D, target: &D) -> Contribution {
        Contribution::Scalar(adjoint, target.clone())
    }

    fn accumulate(a: &D, b: &D) -> D {
        a + b
    }
}

impl Primal for Vec<f64> {
    type Op = VectorOp;

    fn zeros_like(&self) -> Self {
        vec![0.0; self.len()]
    }

    fn node(d: &DV) -> Node {
        Node::Vector(d.clone())
    }

    fn contribution(adjoint: DV, target: &DV) -> Contribution {
        Contribution::Vector(adjoint, target.clone())
    }

    fn accumulate(a: &DV, b: &DV) -> DV {
        a + b
    }
}

impl Primal for Matrix<f64> {
    type Op = MatrixOp;

    fn zeros_like(&self) -> Self {
        Matrix::zeros(self.rows(), self.cols())
    }

    fn node(d: &DM) -> Node {
        Node::Matrix(d.clone())
    }

    fn contribution(adjoint: DM, target: &DM) -> Contribution {
        Contribution::Matrix(adjoint, target.clone())
    }

    fn accumulate(a: &DM, b: &DM) -> DM {
        a + b
    }
}

/// A differentiable value at some nesting depth.
#[derive(Clone)]
pub enum Dual<P: Primal> {
    /// Constant with no derivative information.
    Plain(P),
    /// Forward-mode value.
    Forward(Rc<ForwardCell<P>>),
    /// Reverse-mode value.
    Reverse(Rc<ReverseCell<P>>),
}

/// Payload of a forward-mode value.
pub struct ForwardCell<P: Primal> {
    pub(crate) primal: Dual<P>,
    pub(crate) tangent: Dual<P>,
    pub(crate) tag: Tag,
}

/// Payload of a reverse-mode value.
///
/// The adjoint and fan-out are mutated in place by the reverse engine and are
/// visible through every clone of the owning [`Dual`].
pub struct ReverseCell<P: Primal> {
    pub(crate) primal: Dual<P>,
    pub(crate) adjoint: RefCell<Dual<P>>,
    pub(crate) op: P::Op,
    pub(crate) fan_out: Cell<u32>,
    pub(crate) tag: Tag,
}

impl<P: Primal> ReverseCell<P> {
    /// The tape entry that produced this value.
    pub fn op(&self) -> &P::Op {
        &self.op
    }
}

// ── Release ──
//
// Dropping a recorded graph walks it with a worklist. The derived drop would
// recurse once per tape entry along a chain, or once per level of nesting.

impl<P: Primal> ForwardCell<P> {
    fn release(&mut self, work: &mut Vec<Node>) {
        detach_field(&mut self.primal, work);
        detach_field(&mut self.tangent, work);
    }
}

impl<P: Primal> ReverseCell<P> {
    fn release(&mut self, work: &mut Vec<Node>) {
        std::mem::take(&mut self.op).operands(work);
        detach_field(&mut self.primal, work);
        detach_field(self.adjoint.get_mut(), work);
    }
}

impl<P: Primal> Drop for ForwardCell<P> {
    fn drop(&mut self) {
        let mut work = Vec::new();
        self.release(&mut work);
        drain(work);
    }
}

impl<P: Primal> Drop for ReverseCell<P> {
    fn drop(&mut self) {
        let mut work = Vec::new();
        self.release(&mut work);
        drain(work);
    }
}

/// Queue a cell-owned value and leave an empty constant in its place.
fn detach_field<P: Primal>(d: &mut Dual<P>, work: &mut Vec<Node>) {
    if !matches!(d, Dual::Plain(_)) {
        work.push(P::node(d));
        *d = Dual::Plain(P::default());
    }
}

fn drain(mut work: Vec<Node>) {
    while let Some(node) = work.pop() {
        match node {
            Node::Scalar(d) => release_last(d, &mut work),
            Node::Vector(d) => release_last(d, &mut work),
            Node::Matrix(d) => release_last(d, &mut work),
        }
    }
}

/// Empty the last handle to a cell before it drops, so that drop has nothing
/// left to recurse into.
fn release_last<P: Primal>(d: Dual<P>, work: &mut Vec<Node>) {
    match d {
        Dual::Plain(_) => {}
        Dual::Forward(mut cell) => {
            if let Some(cell) = Rc::get_mut(&mut cell) {
                cell.release(work);
            }
        }
        Dual::Reverse(mut cell) => {
            if let Some(cell) = Rc::get_mut(&mut cell) {
                cell.release(work);
            }
        }
    }
}

impl<P: Primal> Dual<P> {
    /// Lift a raw buffer into a plain (constant) value.
    #[inline]
    pub fn constant(p: P) -> Self {
        Dual::Plain(p)
    }

    pub(crate) fn new_forward(primal: Dual<P>, tangent: Dual<P>, tag: Tag) -> Self {
        Dual::Forward(Rc::new(ForwardCell {
            primal,
            tangent,
            tag,
        }))
    }

    pub(crate) fn new_reverse(primal: Dual<P>, op: P::Op, tag: Tag) -> Self {
        let adjoint = primal.zero_like();
        Dual::Reverse(Rc::new(ReverseCell {
            primal,
            adjoint: RefCell::new(adjoint),
            op,
            fan_out: Cell::new(0),
            tag,
        }))
    }

    /// Promote to a forward value at level `tag` with the given tangent seed.
    pub fn make_forward(&self, tangent: Dual<P>, tag: Tag) -> Self {
        Self::new_forward(self.clone(), tangent, tag)
    }

    /// Promote to a reverse leaf at level `tag`.
    pub fn make_reverse(&self, tag: Tag) -> Self {
        Self::new_reverse(self.clone(), P::Op::default(), tag)
    }

    pub fn mode(&self) -> Mode {
        match self {
            Dual::Plain(_) => Mode::Plain,
            Dual::Forward(_) => Mode::Forward,
            Dual::Reverse(_) => Mode::Reverse,
        }
    }

    /// Level tag, `None` for plain values.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Dual::Plain(_) => None,
            Dual::Forward(f) => Some(f.tag),
            Dual::Reverse(r) => Some(r.tag),
        }
    }

    /// Primal one level down. A plain value is its own primal.
    pub fn primal(&self) -> Dual<P> {
        match self {
            Dual::Plain(_) => self.clone(),
            Dual::Forward(f) => f.primal.clone(),
            Dual::Reverse(r) => r.primal.clone(),
        }
    }

    /// Primal with every level of nesting removed.
    pub fn primal_deep(&self) -> Dual<P> {
        Dual::Plain(self.deep().clone())
    }

    /// The raw buffer at the bottom of the nesting.
    pub fn deep(&self) -> &P {
        match self {
            Dual::Plain(p) => p,
            Dual::Forward(f) => f.primal.deep(),
            Dual::Reverse(r) => r.primal.deep(),
        }
    }

    /// Plain zero of the same shape.
    pub fn zero_like(&self) -> Dual<P> {
        Dual::Plain(self.deep().zeros_like())
    }

    /// Tangent of a forward value; zero for a plain value.
    pub fn tangent(&self) -> Result<Dual<P>> {
        match self {
            Dual::Plain(_) => Ok(self.zero_like()),
            Dual::Forward(f) => Ok(f.tangent.clone()),
            Dual::Reverse(_) => Err(Error::InvalidAccessor {
                accessor: "tangent",
                mode: Mode::Reverse,
            }),
        }
    }

    /// Accumulated adjoint of a reverse value; zero for a plain value.
    pub fn adjoint(&self) -> Result<Dual<P>> {
        match self {
            Dual::Plain(_) => Ok(self.zero_like()),
            Dual::Forward(_) => Err(Error::InvalidAccessor {
                accessor: "adjoint",
                mode: Mode::Forward,
            }),
            Dual::Reverse(r) => Ok(r.adjoint.borrow().clone()),
        }
    }

    /// Overwrite the adjoint. A no-op on plain values.
    pub fn set_adjoint(&self, value: Dual<P>) -> Result<()> {
        match self {
            Dual::Plain(_) => Ok(()),
            Dual::Forward(_) => Err(Error::InvalidAccessor {
                accessor: "adjoint",
                mode: Mode::Forward,
            }),
            Dual::Reverse(r) => {
                r.adjoint.replace(value);
                Ok(())
            }
        }
    }

    /// Number of consumers still expected to deliver an adjoint.
    pub fn fan_out(&self) -> Result<u32> {
        match self {
            Dual::Reverse(r) => Ok(r.fan_out.get()),
            other => Err(Error::InvalidAccessor {
                accessor: "fan-out",
                mode: other.mode(),
            }),
        }
    }

    pub fn set_fan_out(&self, n: u32) -> Result<()> {
        match self {
            Dual::Reverse(r) => {
                r.fan_out.set(n);
                Ok(())
            }
            other => Err(Error::InvalidAccessor {
                accessor: "fan-out",
                mode: other.mode(),
            }),
        }
    }

    /// Copy with fresh adjoint and fan-out cells.
    ///
    /// The copy shares tape entries (and therefore operands) with the
    /// original; only this value's own mutable state is detached.
    pub fn deep_copy(&self) -> Self {
        match self {
            Dual::Plain(p) => Dual::Plain(p.clone()),
            Dual::Forward(f) => Self::new_forward(f.primal.deep_copy(), f.tangent.deep_copy(), f.tag),
            Dual::Reverse(r) => Dual::Reverse(Rc::new(ReverseCell {
                primal: r.primal.deep_copy(),
                adjoint: RefCell::new(r.adjoint.borrow().deep_copy()),
                op: r.op.clone(),
                fan_out: Cell::new(r.fan_out.get()),
                tag: r.tag,
            })),
        }
    }

    /// True if both handles point at the same forward/reverse cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dual::Forward(a), Dual::Forward(b)) => Rc::ptr_eq(a, b),
            (Dual::Reverse(a), Dual::Reverse(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ── Scalar ──

impl D {
    /// Deepest primal as an `f64`.
    #[inline]
    pub fn value(&self) -> f64 {
        *self.deep()
    }
}

impl From<f64> for D {
    fn from(x: f64) -> Self {
        Dual::Plain(x)
    }
}

impl From<D> for f64 {
    fn from(d: D) -> f64 {
        d.value()
    }
}

impl From<&D> for f64 {
    fn from(d: &D) -> f64 {
        d.value()
    }
}

impl PartialEq<f64> for D {
    fn eq(&self, other: &f64) -> bool {
        self.value() == *other
    }
}

impl PartialOrd<f64> for D {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value().partial_cmp(other)
    }
}

impl Hash for D {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().to_bits().hash(state);
    }
}

impl Display for D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// ── Vector ──

impl DV {
    pub fn to_vec(&self) -> Vec<f64> {
        self.deep().clone()
    }

    pub fn len(&self) -> usize {
        self.deep().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deep().is_empty()
    }

    pub fn zeros(n: usize) -> Self {
        Dual::Plain(vec![0.0; n])
    }

    pub fn ones(n: usize) -> Self {
        Dual::Plain(vec![1.0; n])
    }

    /// Plain standard basis vector `e_i` of length `n`.
    pub fn unit(n: usize, i: usize) -> Self {
        let mut v = vec![0.0; n];
        v[i] = 1.0;
        Dual::Plain(v)
    }
}

impl From<Vec<f64>> for DV {
    fn from(v: Vec<f64>) -> Self {
        Dual::Plain(v)
    }
}

impl From<&[f64]> for DV {
    fn from(v: &[f64]) -> Self {
        Dual::Plain(v.to_vec())
    }
}

impl From<DV> for Vec<f64> {
    fn from(d: DV) -> Vec<f64> {
        d.to_vec()
    }
}

impl Hash for DV {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let v = self.deep();
        v.len().hash(state);
        for x in v {
            x.to_bits().hash(state);
        }
    }
}

impl Display for DV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.deep())
    }
}

// ── Matrix ──

impl DM {
    pub fn to_matrix(&self) -> Matrix<f64> {
        self.deep().clone()
    }

    pub fn rows(&self) -> usize {
        self.deep().rows()
    }

    pub fn cols(&self) -> usize {
        self.deep().cols()
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Dual::Plain(Matrix::zeros(rows, cols))
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Dual::Plain(Matrix::filled(rows, cols, 1.0))
    }

    pub fn identity(n: usize) -> Self {
        Dual::Plain(Matrix::identity(n))
    }

    /// Plain matrix with a single one at `(i, j)`.
    pub fn unit(rows: usize, cols: usize, i: usize, j: usize) -> Self {
        let mut m = Matrix::zeros(rows, cols);
        m.set(i, j, 1.0);
        Dual::Plain(m)
    }

    /// Plain matrix from nested rows. `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        Matrix::from_rows(rows).map(Dual::Plain)
    }
}

impl From<Matrix<f64>> for DM {
    fn from(m: Matrix<f64>) -> Self {
        Dual::Plain(m)
    }
}

impl From<DM> for Matrix<f64> {
    fn from(d: DM) -> Matrix<f64> {
        d.to_matrix()
    }
}

impl Hash for DM {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let m = self.deep();
        m.rows().hash(state);
        m.cols().hash(state);
        for x in m.as_slice() {
            x.to_bits().hash(state);
        }
    }
}

impl Display for DM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.deep().to_rows())
    }
}

// ── Comparisons collapse AD structure ──

impl<P: Primal + PartialEq> PartialEq for Dual<P> {
    fn eq(&self, other: &Self) -> bool {
        self.deep() == other.deep()
    }
}

impl<P: Primal + PartialOrd> PartialOrd for Dual<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.deep().partial_cmp(other.deep())
    }
}

impl<P: Primal> Debug for Dual<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dual::Plain(p) => f.debug_tuple("Plain").field(p).finish(),
            Dual::Forward(c) => f
                .debug_struct("Forward")
                .field("primal", &c.primal)
                .field("tangent", &c.tangent)
                .field("tag", &c.tag)
                .finish(),
            Dual::Reverse(c) => f
                .debug_struct("Reverse")
                .field("primal", &c.primal)
                .field("fan_out", &c.fan_out.get())
                .field("tag", &c.tag)
                .finish_non_exhaustive(),
        }
    }
}
