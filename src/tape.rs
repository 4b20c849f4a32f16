//! Reverse sweep over the recorded computation graph.
//!
//! A reverse value's tape entry points at its operands, so the graph is the
//! set of values reachable from an output. A sweep is two traversals:
//!
//! 1. [`reverse_reset`] zeroes every reachable adjoint and counts, in each
//!    node's fan-out, how many recorded uses it has under the output.
//! 2. [`reverse_push`] feeds an adjoint into the output and propagates it.
//!    Each arriving contribution is accumulated and decrements the target's
//!    fan-out; the node's own reverse rule runs only once the counter hits
//!    zero, that is when its adjoint is complete.
//!
//! Both traversals use explicit worklists, so graph depth is bounded by heap
//! memory rather than the call stack. After a full push every fan-out is
//! back at zero and the same graph can be swept again with another seed.
//!
//! Calling [`reverse_reset`] twice without a push in between double-counts
//! fan-outs; [`reverse_prop`] pairs the two.

use tracing::{trace, warn};

use crate::dual::{Dual, Primal};
use crate::error::Result;
use crate::opcode::{Contribution, Node, Operation};

/// Zero adjoints and recount fan-outs for everything reachable from `root`.
pub fn reverse_reset<P: Primal>(root: &Dual<P>) {
    let mut work = vec![P::node(root)];
    let mut visited = 0usize;
    while let Some(node) = work.pop() {
        visited += 1;
        match node {
            Node::Scalar(d) => reset_node(&d, &mut work),
            Node::Vector(d) => reset_node(&d, &mut work),
            Node::Matrix(d) => reset_node(&d, &mut work),
        }
    }
    trace!(visited, "reverse reset finished");
}

fn reset_node<P: Primal>(d: &Dual<P>, work: &mut Vec<Node>) {
    let Dual::Reverse(cell) = d else { return };
    cell.adjoint.replace(cell.primal.zero_like());
    let fan_out = cell.fan_out.get() + 1;
    cell.fan_out.set(fan_out);
    if fan_out == 1 {
        cell.op.operands(work);
    }
}

/// Propagate the adjoint `seed` from `root` through the graph.
///
/// Requires a preceding [`reverse_reset`] on `root`.
pub fn reverse_push<P: Primal>(seed: Dual<P>, root: &Dual<P>) -> Result<()> {
    let mut work = vec![P::contribution(seed, root)];
    let mut delivered = 0usize;
    while let Some(c) = work.pop() {
        delivered += 1;
        match c {
            Contribution::Scalar(v, d) => push_node(v, &d, &mut work)?,
            Contribution::Vector(v, d) => push_node(v, &d, &mut work)?,
            Contribution::Matrix(v, d) => push_node(v, &d, &mut work)?,
        }
    }
    trace!(delivered, "reverse push finished");
    Ok(())
}

fn push_node<P: Primal>(v: Dual<P>, d: &Dual<P>, work: &mut Vec<Contribution>) -> Result<()> {
    let Dual::Reverse(cell) = d else {
        return Ok(());
    };
    let sum = P::accumulate(&cell.adjoint.borrow(), &v);
    cell.adjoint.replace(sum);

    match cell.fan_out.get() {
        0 => {
            warn!(
                tag = cell.tag,
                "adjoint delivered to a node with no pending uses; was the graph reset?"
            );
            Ok(())
        }
        1 => {
            cell.fan_out.set(0);
            let adjoint = cell.adjoint.borrow().clone();
            cell.op.backprop(&cell.primal, &adjoint, work)
        }
        n => {
            cell.fan_out.set(n - 1);
            Ok(())
        }
    }
}

/// [`reverse_reset`] followed by [`reverse_push`].
pub fn reverse_prop<P: Primal>(seed: Dual<P>, root: &Dual<P>) -> Result<()> {
    reverse_reset(root);
    reverse_push(seed, root)
}
