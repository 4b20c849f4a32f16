//! Mode/tag dispatch shared by every primitive.
//!
//! Each primitive supplies the pieces that differ (plain kernel, primal
//! evaluation, derivative rules, tape entries) and these combinators decide,
//! from the representations and level tags of the operands, which ones to
//! use. Operands at the highest tag are unwrapped one level; lower-tagged
//! operands are treated as constants at that level and passed through
//! unchanged, so inner differentiation levels stay intact.
//!
//! A forward operand and a reverse operand carrying the same tag cannot be
//! combined: that is a [`Error::NestingConflict`].

use std::cmp::Ordering;

use crate::dual::{Dual, Primal};
use crate::error::{fatal, Error, Result};
use crate::tag::Tag;

/// Dispatch a unary primitive `c = f(a)`.
///
/// - `ff`: kernel on plain buffers.
/// - `fd`: the primitive itself, applied one level down.
/// - `df`: tangent of the result given `(cp, ap, at)`.
/// - `r`: tape entry for a reverse operand.
pub(crate) fn try_op_unary<A, C>(
    a: &Dual<A>,
    ff: impl Fn(&A) -> Result<C>,
    fd: impl Fn(&Dual<A>) -> Result<Dual<C>>,
    df: impl Fn(&Dual<C>, &Dual<A>, &Dual<A>) -> Result<Dual<C>>,
    r: impl Fn(&Dual<A>) -> C::Op,
) -> Result<Dual<C>>
where
    A: Primal,
    C: Primal,
{
    match a {
        Dual::Plain(ap) => Ok(Dual::Plain(ff(ap)?)),
        Dual::Forward(f) => {
            let cp = fd(&f.primal)?;
            let ct = df(&cp, &f.primal, &f.tangent)?;
            Ok(Dual::new_forward(cp, ct, f.tag))
        }
        Dual::Reverse(rc) => Ok(Dual::new_reverse(fd(&rc.primal)?, r(a), rc.tag)),
    }
}

/// Infallible [`try_op_unary`].
pub(crate) fn op_unary<A, C>(
    a: &Dual<A>,
    ff: impl Fn(&A) -> C,
    fd: impl Fn(&Dual<A>) -> Dual<C>,
    df: impl Fn(&Dual<C>, &Dual<A>, &Dual<A>) -> Dual<C>,
    r: impl Fn(&Dual<A>) -> C::Op,
) -> Dual<C>
where
    A: Primal,
    C: Primal,
{
    let result = try_op_unary(
        a,
        |ap| Ok(ff(ap)),
        |ap| Ok(fd(ap)),
        |cp, ap, at| Ok(df(cp, ap, at)),
        r,
    );
    result.unwrap_or_else(|e| fatal(e))
}

/// Dispatch a binary primitive `c = f(a, b)`.
///
/// - `df_da`, `df_db`: tangent when only `a` (resp. `b`) is forward at the
///   top level, given `(cp, xp, xt)`.
/// - `df_dab`: tangent when both are forward at the same tag, given
///   `(cp, ap, at, bp, bt)`.
/// - `r_d_d`, `r_d_c`, `r_c_d`: tape entries when both, only `a`, or only
///   `b` are reverse at the top level.
#[allow(clippy::too_many_arguments)]
pub(crate) fn try_op_binary<A, B, C>(
    name: &'static str,
    a: &Dual<A>,
    b: &Dual<B>,
    ff: impl Fn(&A, &B) -> Result<C>,
    fd: impl Fn(&Dual<A>, &Dual<B>) -> Result<Dual<C>>,
    df_da: impl Fn(&Dual<C>, &Dual<A>, &Dual<A>) -> Result<Dual<C>>,
    df_db: impl Fn(&Dual<C>, &Dual<B>, &Dual<B>) -> Result<Dual<C>>,
    df_dab: impl Fn(&Dual<C>, &Dual<A>, &Dual<A>, &Dual<B>, &Dual<B>) -> Result<Dual<C>>,
    r_d_d: impl Fn(&Dual<A>, &Dual<B>) -> C::Op,
    r_d_c: impl Fn(&Dual<A>, &Dual<B>) -> C::Op,
    r_c_d: impl Fn(&Dual<A>, &Dual<B>) -> C::Op,
) -> Result<Dual<C>>
where
    A: Primal,
    B: Primal,
    C: Primal,
{
    // Only `a` is active at `tag`.
    let forward_a = |ap: &Dual<A>, at: &Dual<A>, tag: Tag| -> Result<Dual<C>> {
        let cp = fd(ap, b)?;
        let ct = df_da(&cp, ap, at)?;
        Ok(Dual::new_forward(cp, ct, tag))
    };
    let reverse_a = |ap: &Dual<A>, tag: Tag| -> Result<Dual<C>> {
        Ok(Dual::new_reverse(fd(ap, b)?, r_d_c(a, b), tag))
    };
    // Only `b` is active at `tag`.
    let forward_b = |bp: &Dual<B>, bt: &Dual<B>, tag: Tag| -> Result<Dual<C>> {
        let cp = fd(a, bp)?;
        let ct = df_db(&cp, bp, bt)?;
        Ok(Dual::new_forward(cp, ct, tag))
    };
    let reverse_b = |bp: &Dual<B>, tag: Tag| -> Result<Dual<C>> {
        Ok(Dual::new_reverse(fd(a, bp)?, r_c_d(a, b), tag))
    };
    let conflict = |tag: Tag| -> Result<Dual<C>> { Err(Error::NestingConflict { op: name, tag }) };

    match (a, b) {
        (Dual::Plain(ap), Dual::Plain(bp)) => Ok(Dual::Plain(ff(ap, bp)?)),
        (Dual::Plain(_), Dual::Forward(fb)) => forward_b(&fb.primal, &fb.tangent, fb.tag),
        (Dual::Plain(_), Dual::Reverse(rb)) => reverse_b(&rb.primal, rb.tag),
        (Dual::Forward(fa), Dual::Plain(_)) => forward_a(&fa.primal, &fa.tangent, fa.tag),
        (Dual::Reverse(ra), Dual::Plain(_)) => reverse_a(&ra.primal, ra.tag),

        (Dual::Forward(fa), Dual::Forward(fb)) => match fa.tag.cmp(&fb.tag) {
            Ordering::Equal => {
                let cp = fd(&fa.primal, &fb.primal)?;
                let ct = df_dab(&cp, &fa.primal, &fa.tangent, &fb.primal, &fb.tangent)?;
                Ok(Dual::new_forward(cp, ct, fa.tag))
            }
            Ordering::Greater => forward_a(&fa.primal, &fa.tangent, fa.tag),
            Ordering::Less => forward_b(&fb.primal, &fb.tangent, fb.tag),
        },
        (Dual::Forward(fa), Dual::Reverse(rb)) => match fa.tag.cmp(&rb.tag) {
            Ordering::Equal => conflict(fa.tag),
            Ordering::Greater => forward_a(&fa.primal, &fa.tangent, fa.tag),
            Ordering::Less => reverse_b(&rb.primal, rb.tag),
        },
        (Dual::Reverse(ra), Dual::Forward(fb)) => match ra.tag.cmp(&fb.tag) {
            Ordering::Equal => conflict(ra.tag),
            Ordering::Greater => reverse_a(&ra.primal, ra.tag),
            Ordering::Less => forward_b(&fb.primal, &fb.tangent, fb.tag),
        },
        (Dual::Reverse(ra), Dual::Reverse(rb)) => match ra.tag.cmp(&rb.tag) {
            Ordering::Equal => Ok(Dual::new_reverse(
                fd(&ra.primal, &rb.primal)?,
                r_d_d(a, b),
                ra.tag,
            )),
            Ordering::Greater => reverse_a(&ra.primal, ra.tag),
            Ordering::Less => reverse_b(&rb.primal, rb.tag),
        },
    }
}

/// Infallible [`try_op_binary`]. A nesting conflict aborts the call.
#[allow(clippy::too_many_arguments)]
pub(crate) fn op_binary<A, B, C>(
    name: &'static str,
    a: &Dual<A>,
    b: &Dual<B>,
    ff: impl Fn(&A, &B) -> C,
    fd: impl Fn(&Dual<A>, &Dual<B>) -> Dual<C>,
    df_da: impl Fn(&Dual<C>, &Dual<A>, &Dual<A>) -> Dual<C>,
    df_db: impl Fn(&Dual<C>, &Dual<B>, &Dual<B>) -> Dual<C>,
    df_dab: impl Fn(&Dual<C>, &Dual<A>, &Dual<A>, &Dual<B>, &Dual<B>) -> Dual<C>,
    r_d_d: impl Fn(&Dual<A>, &Dual<B>) -> C::Op,
    r_d_c: impl Fn(&Dual<A>, &Dual<B>) -> C::Op,
    r_c_d: impl Fn(&Dual<A>, &Dual<B>) -> C::Op,
) -> Dual<C>
where
    A: Primal,
    B: Primal,
    C: Primal,
{
    let result = try_op_binary(
        name,
        a,
        b,
        |ap, bp| Ok(ff(ap, bp)),
        |ap, bp| Ok(fd(ap, bp)),
        |cp, ap, at| Ok(df_da(cp, ap, at)),
        |cp, bp, bt| Ok(df_db(cp, bp, bt)),
        |cp, ap, at, bp, bt| Ok(df_dab(cp, ap, at, bp, bt)),
        r_d_d,
        r_d_c,
        r_c_d,
    );
    result.unwrap_or_else(|e| fatal(e))
}

/// Dispatch a primitive over a sequence of operands, such as assembling a
/// vector from scalars.
///
/// The highest tag among the operands wins. A forward result applies `ff`
/// separately to primals and tangents (the primitive must be linear in its
/// operands); a reverse result records `r` over the active operands and
/// their positions.
pub(crate) fn try_op_collect<A, C>(
    name: &'static str,
    items: &[Dual<A>],
    ff: &dyn Fn(&[&A]) -> C,
    r: &dyn Fn(Vec<(usize, Dual<A>)>) -> C::Op,
) -> Result<Dual<C>>
where
    A: Primal,
    C: Primal,
{
    let Some(tag) = items.iter().filter_map(Dual::tag).max() else {
        let plain: Vec<&A> = items.iter().map(Dual::deep).collect();
        return Ok(Dual::Plain(ff(&plain)));
    };

    let forward = items
        .iter()
        .any(|d| matches!(d, Dual::Forward(f) if f.tag == tag));
    let reverse = items
        .iter()
        .any(|d| matches!(d, Dual::Reverse(rc) if rc.tag == tag));
    if forward && reverse {
        return Err(Error::NestingConflict { op: name, tag });
    }

    let primals: Vec<Dual<A>> = items
        .iter()
        .map(|d| if d.tag() == Some(tag) { d.primal() } else { d.clone() })
        .collect();
    let cp = try_op_collect(name, &primals, ff, r)?;

    if forward {
        let tangents: Vec<Dual<A>> = items
            .iter()
            .map(|d| match d {
                Dual::Forward(f) if f.tag == tag => f.tangent.clone(),
                _ => d.zero_like(),
            })
            .collect();
        let ct = try_op_collect(name, &tangents, ff, r)?;
        Ok(Dual::new_forward(cp, ct, tag))
    } else {
        let active = items
            .iter()
            .enumerate()
            .filter(|(_, d)| d.tag() == Some(tag))
            .map(|(i, d)| (i, d.clone()))
            .collect();
        Ok(Dual::new_reverse(cp, r(active), tag))
    }
}
