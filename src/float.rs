use std::fmt::{Debug, Display};

use num_traits::{Float as NumFloat, FloatConst, FromPrimitive};

/// Element type of the numeric backend's buffers (`f32`, `f64`).
///
/// The kernels in [`crate::backend`] are generic over this trait; the dual
/// value model itself runs on `f64` buffers.
pub trait Float:
    NumFloat + FloatConst + FromPrimitive + Copy + Send + Sync + Default + Debug + Display + 'static
{
}

impl Float for f32 {}
impl Float for f64 {}
