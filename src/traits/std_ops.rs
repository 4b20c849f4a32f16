use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::dual::{D, DM, DV};
use crate::ops::matrix::{add_dm_d, add_dm_dm, div_dm_d, mul_dm_d, mul_dm_dm, mul_dm_dv, mul_dv_dm, neg_dm, sub_dm_dm};
use crate::ops::scalar::{add, div, mul, neg, sub};
use crate::ops::vector::{add_dv_d, add_dv_dv, div_dv_d, mul_dv_d, neg_dv, sub_dv_d, sub_dv_dv};

// Operand-order adapters for the mixed-shape operators.

fn add_d_dv(a: &D, b: &DV) -> DV {
    add_dv_d(b, a)
}

fn sub_d_dv(a: &D, b: &DV) -> DV {
    add_dv_d(&neg_dv(b), a)
}

fn mul_d_dv(a: &D, b: &DV) -> DV {
    mul_dv_d(b, a)
}

fn add_d_dm(a: &D, b: &DM) -> DM {
    add_dm_d(b, a)
}

fn sub_dm_d(a: &DM, b: &D) -> DM {
    add_dm_d(a, &-b)
}

fn mul_d_dm(a: &D, b: &DM) -> DM {
    mul_dm_d(b, a)
}

// ──────────────────────────────────────────────
//  Dual ⊕ dual, all four ownership combinations
// ──────────────────────────────────────────────

macro_rules! impl_binop {
    ($Trait:ident, $method:ident, $L:ty, $R:ty, $Out:ty, $f:path) => {
        impl $Trait<$R> for $L {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: $R) -> $Out {
                $f(&self, &rhs)
            }
        }

        impl<'b> $Trait<&'b $R> for $L {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: &'b $R) -> $Out {
                $f(&self, rhs)
            }
        }

        impl<'a> $Trait<$R> for &'a $L {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: $R) -> $Out {
                $f(self, &rhs)
            }
        }

        impl<'a, 'b> $Trait<&'b $R> for &'a $L {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: &'b $R) -> $Out {
                $f(self, rhs)
            }
        }
    };
}

impl_binop!(Add, add, D, D, D, add);
impl_binop!(Sub, sub, D, D, D, sub);
impl_binop!(Mul, mul, D, D, D, mul);
impl_binop!(Div, div, D, D, D, div);

impl_binop!(Add, add, DV, DV, DV, add_dv_dv);
impl_binop!(Sub, sub, DV, DV, DV, sub_dv_dv);
impl_binop!(Add, add, DV, D, DV, add_dv_d);
impl_binop!(Add, add, D, DV, DV, add_d_dv);
impl_binop!(Sub, sub, DV, D, DV, sub_dv_d);
impl_binop!(Sub, sub, D, DV, DV, sub_d_dv);
impl_binop!(Mul, mul, DV, D, DV, mul_dv_d);
impl_binop!(Mul, mul, D, DV, DV, mul_d_dv);
impl_binop!(Div, div, DV, D, DV, div_dv_d);

impl_binop!(Add, add, DM, DM, DM, add_dm_dm);
impl_binop!(Sub, sub, DM, DM, DM, sub_dm_dm);
impl_binop!(Mul, mul, DM, DM, DM, mul_dm_dm);
impl_binop!(Mul, mul, DM, DV, DV, mul_dm_dv);
impl_binop!(Mul, mul, DV, DM, DV, mul_dv_dm);
impl_binop!(Add, add, DM, D, DM, add_dm_d);
impl_binop!(Add, add, D, DM, DM, add_d_dm);
impl_binop!(Sub, sub, DM, D, DM, sub_dm_d);
impl_binop!(Mul, mul, DM, D, DM, mul_dm_d);
impl_binop!(Mul, mul, D, DM, DM, mul_d_dm);
impl_binop!(Div, div, DM, D, DM, div_dm_d);

// ──────────────────────────────────────────────
//  Dual ⊕ f64 and f64 ⊕ dual
// ──────────────────────────────────────────────

macro_rules! impl_f64_rhs {
    ($Trait:ident, $method:ident, $L:ty, $Out:ty, $f:path) => {
        impl $Trait<f64> for $L {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: f64) -> $Out {
                $f(&self, &D::from(rhs))
            }
        }

        impl<'a> $Trait<f64> for &'a $L {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: f64) -> $Out {
                $f(self, &D::from(rhs))
            }
        }
    };
}

macro_rules! impl_f64_lhs {
    ($Trait:ident, $method:ident, $R:ty, $Out:ty, $f:path) => {
        impl $Trait<$R> for f64 {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: $R) -> $Out {
                $f(&D::from(self), &rhs)
            }
        }

        impl<'b> $Trait<&'b $R> for f64 {
            type Output = $Out;
            #[inline]
            fn $method(self, rhs: &'b $R) -> $Out {
                $f(&D::from(self), rhs)
            }
        }
    };
}

impl_f64_rhs!(Add, add, D, D, add);
impl_f64_rhs!(Sub, sub, D, D, sub);
impl_f64_rhs!(Mul, mul, D, D, mul);
impl_f64_rhs!(Div, div, D, D, div);
impl_f64_lhs!(Add, add, D, D, add);
impl_f64_lhs!(Sub, sub, D, D, sub);
impl_f64_lhs!(Mul, mul, D, D, mul);
impl_f64_lhs!(Div, div, D, D, div);

impl_f64_rhs!(Add, add, DV, DV, add_dv_d);
impl_f64_rhs!(Sub, sub, DV, DV, sub_dv_d);
impl_f64_rhs!(Mul, mul, DV, DV, mul_dv_d);
impl_f64_rhs!(Div, div, DV, DV, div_dv_d);
impl_f64_lhs!(Add, add, DV, DV, add_d_dv);
impl_f64_lhs!(Sub, sub, DV, DV, sub_d_dv);
impl_f64_lhs!(Mul, mul, DV, DV, mul_d_dv);

impl_f64_rhs!(Add, add, DM, DM, add_dm_d);
impl_f64_rhs!(Sub, sub, DM, DM, sub_dm_d);
impl_f64_rhs!(Mul, mul, DM, DM, mul_dm_d);
impl_f64_rhs!(Div, div, DM, DM, div_dm_d);
impl_f64_lhs!(Add, add, DM, DM, add_d_dm);
impl_f64_lhs!(Mul, mul, DM, DM, mul_d_dm);

// ──────────────────────────────────────────────
//  Negation
// ──────────────────────────────────────────────

macro_rules! impl_neg {
    ($T:ty, $f:path) => {
        impl Neg for $T {
            type Output = $T;
            #[inline]
            fn neg(self) -> $T {
                $f(&self)
            }
        }

        impl<'a> Neg for &'a $T {
            type Output = $T;
            #[inline]
            fn neg(self) -> $T {
                $f(self)
            }
        }
    };
}

impl_neg!(D, neg);
impl_neg!(DV, neg_dv);
impl_neg!(DM, neg_dm);

// ──────────────────────────────────────────────
//  Compound assignment
// ──────────────────────────────────────────────

macro_rules! impl_assign {
    ($Trait:ident, $method:ident, $T:ty, $R:ty, $f:path) => {
        impl $Trait<$R> for $T {
            #[inline]
            fn $method(&mut self, rhs: $R) {
                *self = $f(self, &rhs);
            }
        }

        impl<'b> $Trait<&'b $R> for $T {
            #[inline]
            fn $method(&mut self, rhs: &'b $R) {
                *self = $f(self, rhs);
            }
        }
    };
}

impl_assign!(AddAssign, add_assign, D, D, add);
impl_assign!(SubAssign, sub_assign, D, D, sub);
impl_assign!(MulAssign, mul_assign, D, D, mul);
impl_assign!(DivAssign, div_assign, D, D, div);
impl_assign!(AddAssign, add_assign, DV, DV, add_dv_dv);
impl_assign!(SubAssign, sub_assign, DV, DV, sub_dv_dv);
impl_assign!(MulAssign, mul_assign, DV, D, mul_dv_d);
impl_assign!(AddAssign, add_assign, DM, DM, add_dm_dm);
impl_assign!(SubAssign, sub_assign, DM, DM, sub_dm_dm);

impl AddAssign<f64> for D {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        *self = add(self, &D::from(rhs));
    }
}

impl MulAssign<f64> for D {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        *self = mul(self, &D::from(rhs));
    }
}

// ──────────────────────────────────────────────
//  Iterator folds
// ──────────────────────────────────────────────

impl Sum for D {
    fn sum<I: Iterator<Item = D>>(iter: I) -> D {
        iter.fold(D::from(0.0), |acc, x| add(&acc, &x))
    }
}

impl<'a> Sum<&'a D> for D {
    fn sum<I: Iterator<Item = &'a D>>(iter: I) -> D {
        iter.fold(D::from(0.0), |acc, x| add(&acc, x))
    }
}

impl Product for D {
    fn product<I: Iterator<Item = D>>(iter: I) -> D {
        iter.fold(D::from(1.0), |acc, x| mul(&acc, &x))
    }
}

impl<'a> Product<&'a D> for D {
    fn product<I: Iterator<Item = &'a D>>(iter: I) -> D {
        iter.fold(D::from(1.0), |acc, x| mul(&acc, x))
    }
}
