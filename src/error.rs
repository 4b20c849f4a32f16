//! Error taxonomy for differentiation calls.

use std::fmt;

use thiserror::Error;

use crate::tag::Tag;

/// Result type alias using nestad's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Which representation a dual value currently has.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No derivative information.
    Plain,
    /// Forward-mode value carrying a tangent.
    Forward,
    /// Reverse-mode value carrying an adjoint cell and a tape entry.
    Reverse,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Plain => write!(f, "plain"),
            Mode::Forward => write!(f, "forward"),
            Mode::Reverse => write!(f, "reverse"),
        }
    }
}

/// Fatal conditions raised by the differentiation core.
///
/// None of these are recoverable inside a differentiation call: a tape built
/// on top of a failed operation cannot be trusted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A forward and a reverse value met at the same level tag.
    #[error("{op}: forward and reverse AD cannot run on the same level (tag {tag})")]
    NestingConflict {
        /// Primitive that was being dispatched.
        op: &'static str,
        /// The shared level tag.
        tag: Tag,
    },

    /// An accessor was called on a value of the wrong mode.
    #[error("cannot read the {accessor} of a {mode} value")]
    InvalidAccessor {
        /// Accessor name (`tangent`, `adjoint`, `fan-out`).
        accessor: &'static str,
        /// Mode of the value it was called on.
        mode: Mode,
    },

    /// A numeric kernel rejected its input (singular or mis-shaped).
    #[error("{op}: {reason}")]
    NumericDomain {
        /// Primitive that failed.
        op: &'static str,
        /// Human-readable cause.
        reason: String,
    },
}

impl Error {
    pub(crate) fn domain(op: &'static str, reason: impl Into<String>) -> Self {
        Error::NumericDomain {
            op,
            reason: reason.into(),
        }
    }
}

/// Abort the current differentiation call.
///
/// Used where an operator trait cannot return a `Result`.
#[cold]
pub(crate) fn fatal(err: Error) -> ! {
    tracing::error!(error = %err, "aborting differentiation");
    panic!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_operation() {
        let err = Error::NestingConflict { op: "mul", tag: 3 };
        assert_eq!(
            err.to_string(),
            "mul: forward and reverse AD cannot run on the same level (tag 3)"
        );

        let err = Error::domain("inverse", "matrix is singular");
        assert_eq!(err.to_string(), "inverse: matrix is singular");
    }

    #[test]
    fn accessor_message_names_mode() {
        let err = Error::InvalidAccessor {
            accessor: "tangent",
            mode: Mode::Reverse,
        };
        assert_eq!(err.to_string(), "cannot read the tangent of a reverse value");
    }
}
