//! Tape entries.
//!
//! Every reverse value records the operation that produced it. Entries are
//! grouped by the shape of their result: [`ScalarOp`] for scalars,
//! [`VectorOp`] for vectors and [`MatrixOp`] for matrices. Each variant holds
//! its operands (as dual values) and any constant it needs for the adjoint
//! rule. Variant names follow one scheme:
//!
//! - `AddDD`: both operands active at this level.
//! - `AddDDCons`: first operand active, second one a constant.
//! - `SubDConsD`: first operand a constant, second one active.
//!
//! The two traversals in [`crate::tape`] only see the [`Operation`] trait.

mod matrix;
mod scalar;
mod vector;

pub use matrix::MatrixOp;
pub use scalar::ScalarOp;
pub use vector::VectorOp;

use std::rc::Rc;

use crate::dual::{Dual, Primal, D, DM, DV};
use crate::error::Result;

/// Elementwise scalar function stored by the `map` entries.
pub type MapFn = Rc<dyn Fn(&D) -> D>;

/// Reverse rule of one tape entry.
pub trait Operation<P: Primal>: Clone {
    /// Append every operand that lives on the tape. An operand used twice is
    /// appended twice.
    fn operands(&self, out: &mut Vec<Node>);

    /// Append one adjoint contribution per operand reported by
    /// [`operands`](Operation::operands), in any order.
    ///
    /// `primal` is the result value one level down, `adjoint` its
    /// accumulated adjoint.
    fn backprop(&self, primal: &Dual<P>, adjoint: &Dual<P>, out: &mut Vec<Contribution>)
        -> Result<()>;
}

/// Operand handle visited by the reset traversal.
#[derive(Clone, Debug)]
pub enum Node {
    Scalar(D),
    Vector(DV),
    Matrix(DM),
}

/// Adjoint contribution `(value, target)` queued by the push traversal.
#[derive(Clone, Debug)]
pub enum Contribution {
    Scalar(D, D),
    Vector(DV, DV),
    Matrix(DM, DM),
}

impl From<&D> for Node {
    fn from(d: &D) -> Self {
        Node::Scalar(d.clone())
    }
}

impl From<&DV> for Node {
    fn from(d: &DV) -> Self {
        Node::Vector(d.clone())
    }
}

impl From<&DM> for Node {
    fn from(d: &DM) -> Self {
        Node::Matrix(d.clone())
    }
}

impl Contribution {
    #[inline]
    pub(crate) fn scalar(value: D, target: &D) -> Self {
        Contribution::Scalar(value, target.clone())
    }

    #[inline]
    pub(crate) fn vector(value: DV, target: &DV) -> Self {
        Contribution::Vector(value, target.clone())
    }

    #[inline]
    pub(crate) fn matrix(value: DM, target: &DM) -> Self {
        Contribution::Matrix(value, target.clone())
    }
}
