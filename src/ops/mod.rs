//! Differentiable primitives, one module per result shape.
//!
//! Every primitive is a thin call into [`crate::dispatch`] carrying its plain
//! kernel, its forward derivative and the tape entry it records.

pub mod fixed_point;
pub(crate) mod matrix;
pub(crate) mod scalar;
pub(crate) mod vector;

use std::rc::Rc;

use crate::dual::{Dual, Primal, D};
use crate::opcode::MapFn;
use crate::tag::{Tag, Tagger};

/// Tangent of `y` at level `tag`, zero if `y` does not depend on that level.
pub(crate) fn tangent_at<P: Primal>(y: &Dual<P>, tag: Tag) -> Dual<P> {
    match y {
        Dual::Forward(f) if f.tag == tag => f.tangent.clone(),
        _ => y.zero_like(),
    }
}

/// `y` with level `tag` peeled off, or `y` itself if it has no such level.
pub(crate) fn primal_at<P: Primal>(y: &Dual<P>, tag: Tag) -> Dual<P> {
    if y.tag() == Some(tag) {
        y.primal()
    } else {
        y.clone()
    }
}

/// Derivative of a scalar map, evaluated with a nested forward pass on a
/// fresh level.
pub(crate) fn derivative_fn(f: &MapFn) -> MapFn {
    let f = Rc::clone(f);
    Rc::new(move |x: &D| {
        let tag = Tagger::global().next_tag();
        tangent_at(&f(&x.make_forward(D::from(1.0), tag)), tag)
    })
}
