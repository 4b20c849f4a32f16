pub mod api;
pub mod backend;
pub mod config;
mod dispatch;
pub mod dual;
pub mod error;
pub mod float;
pub mod opcode;
pub mod ops;
pub mod tag;
pub mod tape;
mod traits;

#[cfg(feature = "nalgebra")]
pub mod nalgebra_support;
#[cfg(feature = "ndarray")]
pub mod ndarray_support;

pub use api::{
    curl, diff, diff2, diff_with_value, diffn, div, grad, grad_v, grad_with_value, hessian,
    hessian_v, jacobian, jacobian_t_v, jacobian_t_v_with_value, jacobian_v,
    jacobian_v_with_value, laplacian, Session,
};
pub use backend::Matrix;
pub use config::Config;
pub use dual::{Dual, Primal, D, DM, DV};
pub use error::{Error, Mode, Result};
pub use float::Float;
pub use opcode::{MatrixOp, ScalarOp, VectorOp};
pub use ops::fixed_point::fixed_point;
pub use tag::{Tag, Tagger};
pub use tape::{reverse_prop, reverse_push, reverse_reset};
