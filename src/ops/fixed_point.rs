//! Differentiable fixed points `a* = g(a*, b)`.
//!
//! The forward solution iterates `g` until successive iterates agree. For a
//! reverse-mode `b` the result records a single step of `g` between two
//! fresh leaves; its adjoint rule repeats reverse passes through that step
//! until the adjoint itself converges (two-phase adjoint iteration), so no
//! unrolled iteration history is kept on the tape.

use tracing::debug;

use super::{primal_at, tangent_at};
use crate::config::Config;
use crate::dual::{Dual, D};
use crate::error::Result;
use crate::opcode::ScalarOp;
use crate::tape::reverse_prop;

/// Solve `a = g(a, b)` by iteration from `a0`.
///
/// Iteration stops once successive iterates differ by at most
/// `config.fixed_point_epsilon` (primal and, for a forward `b`, tangent), or
/// after `config.fixed_point_max_iterations` steps, in which case the last
/// iterate is returned.
///
/// `g` must depend on differentiated values only through its arguments.
///
/// ```
/// use nestad::{fixed_point, Config, D};
///
/// // a = (a + b / a) / 2 converges to sqrt(b)
/// let a = fixed_point(|a, b| (a + b / a) * 0.5, &D::from(1.0), &D::from(2.0), &Config::default());
/// assert!((a.value() - 2.0_f64.sqrt()).abs() < 1e-8);
/// ```
pub fn fixed_point(g: impl Fn(&D, &D) -> D, a0: &D, b: &D, config: &Config) -> D {
    let eps = config.fixed_point_epsilon;
    match b {
        Dual::Plain(_) => iterate(&g, a0.clone(), b, config, |a, next| {
            (next.value() - a.value()).abs() <= eps
        }),
        Dual::Forward(fb) => {
            let tag = fb.tag;
            let a = iterate(&g, a0.clone(), b, config, |a, next| {
                let dp = (next.value() - a.value()).abs();
                let dt = (tangent_at(next, tag).value() - tangent_at(a, tag).value()).abs();
                dp <= eps && dt <= eps
            });
            Dual::new_forward(primal_at(&a, tag), tangent_at(&a, tag), tag)
        }
        Dual::Reverse(rb) => {
            let tag = rb.tag;
            let b_first = Dual::new_reverse(rb.primal.clone(), ScalarOp::Noop, tag);
            let a = iterate(&g, a0.clone(), &b_first, config, |a, next| {
                (next.value() - a.value()).abs() <= eps
            });
            let a_prev = Dual::new_reverse(primal_at(&a, tag), ScalarOp::Noop, tag);
            let a_last = g(&a_prev, &b_first);
            Dual::new_reverse(
                primal_at(&a, tag),
                ScalarOp::FixedPoint {
                    b: b.clone(),
                    b_first,
                    a_prev,
                    a_last,
                    config: *config,
                },
                tag,
            )
        }
    }
}

fn iterate(
    g: &impl Fn(&D, &D) -> D,
    mut a: D,
    b: &D,
    config: &Config,
    converged: impl Fn(&D, &D) -> bool,
) -> D {
    for i in 1..=config.fixed_point_max_iterations {
        let next = g(&a, b);
        if converged(&a, &next) {
            debug!(iterations = i, "fixed point converged");
            return next;
        }
        a = next;
    }
    debug!(
        iterations = config.fixed_point_max_iterations,
        "fixed point stopped at iteration cap"
    );
    a
}

/// Adjoint of `b` for a fixed point whose result received adjoint `adj`.
///
/// Repeats `ā ← adj + ā·∂g/∂a` through the recorded step until `ā` settles,
/// then returns the adjoint collected at `b_first`.
pub(crate) fn fixed_point_adjoint(
    adj: &D,
    b_first: &D,
    a_prev: &D,
    a_last: &D,
    config: &Config,
) -> Result<D> {
    reverse_prop(adj.clone(), a_last)?;
    for i in 1..=config.fixed_point_max_iterations {
        let prev = a_prev.adjoint()?;
        reverse_prop(adj + &prev, a_last)?;
        let next = a_prev.adjoint()?;
        if (next.value() - prev.value()).abs() <= config.fixed_point_epsilon {
            debug!(iterations = i, "fixed point adjoint converged");
            return b_first.adjoint();
        }
    }
    debug!(
        iterations = config.fixed_point_max_iterations,
        "fixed point adjoint stopped at iteration cap"
    );
    b_first.adjoint()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn babylonian(a: &D, b: &D) -> D {
        (a + b / a) * 0.5
    }

    #[test]
    fn plain_iteration_converges() {
        let a = fixed_point(babylonian, &D::from(1.0), &D::from(9.0), &Config::default());
        assert_relative_eq!(a.value(), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn forward_tangent_matches_implicit_derivative() {
        let b = D::from(4.0).make_forward(D::from(1.0), 1);
        let a = fixed_point(babylonian, &D::from(1.0), &b, &Config::default());
        // d sqrt(b) / db = 1 / (2 sqrt(b))
        assert_relative_eq!(a.tangent().unwrap().value(), 0.25, epsilon = 1e-8);
    }

    #[test]
    fn iteration_cap_returns_last_iterate() {
        let config = Config::default().with_fixed_point_max_iterations(2);
        let a = fixed_point(babylonian, &D::from(1.0), &D::from(9.0), &config);
        // 1 -> 5 -> 3.4
        assert_relative_eq!(a.value(), 3.4, epsilon = 1e-12);
    }
}
