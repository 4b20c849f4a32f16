//! Differential operators built on the dual value model.
//!
//! Every operator takes and returns dual values, so operators compose: the
//! function handed to [`diff`] may itself call [`grad`], and so on. Each call
//! draws a fresh level tag on entry; values from enclosing calls carry lower
//! tags and are treated as constants by the inner one.
//!
//! The free functions use [`Session::global`]. A [`Session`] only needs to be
//! created explicitly to change the [`Config`] used by fixed points.

use crate::config::Config;
use crate::dual::{Dual, Primal, D, DM, DV};
use crate::error::{Error, Result};
use crate::ops::fixed_point;
use crate::ops::{primal_at, tangent_at};
use crate::tag::{Tag, Tagger};
use crate::tape::reverse_prop;

/// Tag source and numeric options for a family of differentiation calls.
///
/// Values produced by two sessions may only be mixed if the sessions share a
/// tagger; otherwise their levels are not ordered. [`Session::new`] and
/// [`Session::global`] both draw from the process-wide tagger, which is also
/// the one elementwise `map` uses for its local derivatives.
#[derive(Clone, Debug)]
pub struct Session {
    tagger: Tagger,
    config: Config,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session on the process-wide tagger with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Session on the process-wide tagger with a custom [`Config`].
    pub fn with_config(config: Config) -> Self {
        Session {
            tagger: Tagger::global().clone(),
            config,
        }
    }

    /// Session on its own tagger.
    ///
    /// Only safe for computations that never meet values from another tagger
    /// and do not use elementwise `map`.
    pub fn with_tagger(tagger: Tagger, config: Config) -> Self {
        Session { tagger, config }
    }

    /// The session the free functions in this module use.
    pub fn global() -> Self {
        Self::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    #[inline]
    pub fn next_tag(&self) -> Tag {
        self.tagger.next_tag()
    }

    // ── Forward mode ──

    /// `(f(x), f'(x))` for `f : R → shape`.
    pub fn diff_with_value<P: Primal>(&self, f: impl Fn(&D) -> Dual<P>, x: &D) -> (Dual<P>, Dual<P>) {
        let tag = self.next_tag();
        let y = f(&x.make_forward(D::from(1.0), tag));
        (primal_at(&y, tag), tangent_at(&y, tag))
    }

    /// `f'(x)`.
    pub fn diff<P: Primal>(&self, f: impl Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
        self.diff_with_value(f, x).1
    }

    /// `f''(x)`, by nesting [`Session::diff`].
    pub fn diff2<P: Primal>(&self, f: impl Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
        self.diff(|y| self.diff(&f, y), x)
    }

    /// `n`-th derivative; `n = 0` evaluates `f`.
    pub fn diffn<P: Primal>(&self, n: usize, f: impl Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
        self.diffn_dyn(n, &f, x)
    }

    fn diffn_dyn<P: Primal>(&self, n: usize, f: &dyn Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
        if n == 0 {
            f(x)
        } else {
            self.diff(|y| self.diffn_dyn(n - 1, f, y), x)
        }
    }

    /// Directional derivative `∇f(x) · v`.
    pub fn grad_v(&self, f: impl Fn(&DV) -> D, x: &DV, v: &DV) -> D {
        let tag = self.next_tag();
        tangent_at(&f(&x.make_forward(v.clone(), tag)), tag)
    }

    /// Jacobian-vector product `J(x) · v`.
    pub fn jacobian_v(&self, f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> DV {
        self.jacobian_v_with_value(f, x, v).1
    }

    /// `(f(x), J(x) · v)`.
    pub fn jacobian_v_with_value(&self, f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> (DV, DV) {
        let tag = self.next_tag();
        let y = f(&x.make_forward(v.clone(), tag));
        (primal_at(&y, tag), tangent_at(&y, tag))
    }

    // ── Reverse mode ──

    /// `(f(x), ∇f(x))`.
    pub fn grad_with_value(&self, f: impl Fn(&DV) -> D, x: &DV) -> Result<(D, DV)> {
        let tag = self.next_tag();
        let xr = x.make_reverse(tag);
        let y = f(&xr);
        if y.tag() == Some(tag) {
            reverse_prop(D::from(1.0), &y)?;
        }
        Ok((primal_at(&y, tag), xr.adjoint()?))
    }

    /// `∇f(x)`.
    pub fn grad(&self, f: impl Fn(&DV) -> D, x: &DV) -> Result<DV> {
        Ok(self.grad_with_value(f, x)?.1)
    }

    /// Vector-Jacobian product `vᵀ · J(x)`.
    pub fn jacobian_t_v(&self, f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> Result<DV> {
        Ok(self.jacobian_t_v_with_value(f, x, v)?.1)
    }

    /// `(f(x), vᵀ · J(x))`.
    pub fn jacobian_t_v_with_value(&self, f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> Result<(DV, DV)> {
        let tag = self.next_tag();
        let xr = x.make_reverse(tag);
        let y = f(&xr);
        if y.tag() == Some(tag) {
            reverse_prop(v.clone(), &y)?;
        }
        Ok((primal_at(&y, tag), xr.adjoint()?))
    }

    /// Full Jacobian `J[i][j] = ∂f_i/∂x_j`.
    ///
    /// Uses one forward pass per input when there are no more inputs than
    /// outputs. Otherwise records `f` once and sweeps it backwards once per
    /// output.
    pub fn jacobian(&self, f: impl Fn(&DV) -> DV, x: &DV) -> Result<DM> {
        let n = x.len();
        let m = f(&x.primal_deep()).len();
        if n == 0 || m == 0 {
            return Ok(DM::zeros(m, n));
        }
        if n <= m {
            let columns: Vec<DV> = (0..n)
                .map(|j| self.jacobian_v(&f, x, &DV::unit(n, j)))
                .collect();
            return Ok(DM::of_rows(&columns)?.transpose());
        }

        let tag = self.next_tag();
        let xr = x.make_reverse(tag);
        let y = f(&xr);
        if y.tag() != Some(tag) {
            return Ok(DM::zeros(m, n));
        }
        let mut rows = Vec::with_capacity(m);
        for i in 0..m {
            reverse_prop(DV::unit(m, i), &y)?;
            rows.push(xr.adjoint()?);
        }
        DM::of_rows(&rows)
    }

    // ── Second order ──

    /// Hessian-vector product `H(x) · v`, forward-over-reverse.
    pub fn hessian_v(&self, f: impl Fn(&DV) -> D, x: &DV, v: &DV) -> Result<DV> {
        let tag = self.next_tag();
        let g = self.grad(f, &x.make_forward(v.clone(), tag))?;
        Ok(tangent_at(&g, tag))
    }

    /// Hessian, one [`Session::hessian_v`] per input direction.
    pub fn hessian(&self, f: impl Fn(&DV) -> D, x: &DV) -> Result<DM> {
        let n = x.len();
        let rows = (0..n)
            .map(|i| self.hessian_v(&f, x, &DV::unit(n, i)))
            .collect::<Result<Vec<_>>>()?;
        DM::of_rows(&rows)
    }

    /// Trace of the Hessian.
    pub fn laplacian(&self, f: impl Fn(&DV) -> D, x: &DV) -> Result<D> {
        Ok(self.hessian(f, x)?.trace())
    }

    // ── Vector calculus ──

    /// Curl of `f : R³ → R³`.
    pub fn curl(&self, f: impl Fn(&DV) -> DV, x: &DV) -> Result<DV> {
        let j = self.jacobian(f, x)?;
        if j.rows() != 3 || j.cols() != 3 {
            return Err(Error::domain(
                "curl",
                format!("expected a 3x3 Jacobian, got {}x{}", j.rows(), j.cols()),
            ));
        }
        Ok(DV::of_scalars(&[
            j.item(2, 1) - j.item(1, 2),
            j.item(0, 2) - j.item(2, 0),
            j.item(1, 0) - j.item(0, 1),
        ]))
    }

    /// Divergence of `f : Rⁿ → Rⁿ`.
    pub fn div(&self, f: impl Fn(&DV) -> DV, x: &DV) -> Result<D> {
        let j = self.jacobian(f, x)?;
        if j.rows() != j.cols() {
            return Err(Error::domain(
                "div",
                format!("expected a square Jacobian, got {}x{}", j.rows(), j.cols()),
            ));
        }
        Ok(j.trace())
    }

    /// [`fixed_point::fixed_point`] with this session's [`Config`].
    pub fn fixed_point(&self, g: impl Fn(&D, &D) -> D, a0: &D, b: &D) -> D {
        fixed_point::fixed_point(g, a0, b, &self.config)
    }
}

// ── Free functions on the global session ──

/// `(f(x), f'(x))`.
///
/// ```
/// use nestad::{diff_with_value, D};
///
/// let (y, dy) = diff_with_value(|x: &D| x * x, &D::from(3.0));
/// assert_eq!(y, 9.0);
/// assert_eq!(dy, 6.0);
/// ```
pub fn diff_with_value<P: Primal>(f: impl Fn(&D) -> Dual<P>, x: &D) -> (Dual<P>, Dual<P>) {
    Session::global().diff_with_value(f, x)
}

/// `f'(x)`.
///
/// Calls nest; the inner derivative treats the outer variable as a constant:
///
/// ```
/// use nestad::{diff, D};
///
/// // d/dx (x * d/dy (x + y)) = d/dx x = 1
/// let d = diff(|x: &D| x * diff(|y: &D| x + y, &D::from(1.0)), &D::from(1.0));
/// assert_eq!(d, 1.0);
/// ```
pub fn diff<P: Primal>(f: impl Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
    Session::global().diff(f, x)
}

pub fn diff2<P: Primal>(f: impl Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
    Session::global().diff2(f, x)
}

pub fn diffn<P: Primal>(n: usize, f: impl Fn(&D) -> Dual<P>, x: &D) -> Dual<P> {
    Session::global().diffn(n, f, x)
}

pub fn grad_v(f: impl Fn(&DV) -> D, x: &DV, v: &DV) -> D {
    Session::global().grad_v(f, x, v)
}

pub fn jacobian_v(f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> DV {
    Session::global().jacobian_v(f, x, v)
}

pub fn jacobian_v_with_value(f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> (DV, DV) {
    Session::global().jacobian_v_with_value(f, x, v)
}

/// `(f(x), ∇f(x))`.
pub fn grad_with_value(f: impl Fn(&DV) -> D, x: &DV) -> Result<(D, DV)> {
    Session::global().grad_with_value(f, x)
}

/// `∇f(x)` by one reverse sweep.
///
/// ```
/// use nestad::{grad, DV};
///
/// let g = grad(|x: &DV| x.dot(x), &DV::from(vec![1.0, 2.0, 3.0])).unwrap();
/// assert_eq!(g.to_vec(), vec![2.0, 4.0, 6.0]);
/// ```
pub fn grad(f: impl Fn(&DV) -> D, x: &DV) -> Result<DV> {
    Session::global().grad(f, x)
}

pub fn jacobian_t_v(f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> Result<DV> {
    Session::global().jacobian_t_v(f, x, v)
}

pub fn jacobian_t_v_with_value(f: impl Fn(&DV) -> DV, x: &DV, v: &DV) -> Result<(DV, DV)> {
    Session::global().jacobian_t_v_with_value(f, x, v)
}

pub fn jacobian(f: impl Fn(&DV) -> DV, x: &DV) -> Result<DM> {
    Session::global().jacobian(f, x)
}

pub fn hessian_v(f: impl Fn(&DV) -> D, x: &DV, v: &DV) -> Result<DV> {
    Session::global().hessian_v(f, x, v)
}

pub fn hessian(f: impl Fn(&DV) -> D, x: &DV) -> Result<DM> {
    Session::global().hessian(f, x)
}

pub fn laplacian(f: impl Fn(&DV) -> D, x: &DV) -> Result<D> {
    Session::global().laplacian(f, x)
}

pub fn curl(f: impl Fn(&DV) -> DV, x: &DV) -> Result<DV> {
    Session::global().curl(f, x)
}

pub fn div(f: impl Fn(&DV) -> DV, x: &DV) -> Result<D> {
    Session::global().div(f, x)
}
