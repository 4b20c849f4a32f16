use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

use crate::dual::D;

// Constants lift to plain values; conversions read the deepest primal.

impl Zero for D {
    #[inline]
    fn zero() -> Self {
        D::from(0.0)
    }
    #[inline]
    fn is_zero(&self) -> bool {
        self.value().is_zero()
    }
}

impl One for D {
    #[inline]
    fn one() -> Self {
        D::from(1.0)
    }
}

impl FromPrimitive for D {
    #[inline]
    fn from_i64(n: i64) -> Option<Self> {
        f64::from_i64(n).map(D::from)
    }
    #[inline]
    fn from_u64(n: u64) -> Option<Self> {
        f64::from_u64(n).map(D::from)
    }
    #[inline]
    fn from_f32(n: f32) -> Option<Self> {
        f64::from_f32(n).map(D::from)
    }
    #[inline]
    fn from_f64(n: f64) -> Option<Self> {
        Some(D::from(n))
    }
}

impl ToPrimitive for D {
    #[inline]
    fn to_i64(&self) -> Option<i64> {
        self.value().to_i64()
    }
    #[inline]
    fn to_u64(&self) -> Option<u64> {
        self.value().to_u64()
    }
    #[inline]
    fn to_f64(&self) -> Option<f64> {
        Some(self.value())
    }
}

#[cfg(test)]
mod tests {
    use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

    use crate::dual::D;

    #[test]
    fn constants_are_plain() {
        assert!(D::zero().is_zero());
        assert_eq!(D::one(), 1.0);
        assert_eq!(D::zero().tag(), None);
        assert_eq!(D::from_i64(-3).unwrap(), -3.0);
    }

    #[test]
    fn conversion_reads_deep_primal() {
        let x = D::from(2.5).make_forward(D::from(1.0), 1);
        assert_eq!(x.to_f64(), Some(2.5));
        assert_eq!(x.to_i64(), Some(2));
    }
}
