//! Error types for controller construction and the control loop.

use thiserror::Error;

/// Errors raised by controllers and sensing topologies.
///
/// Shape mismatches are always fatal to the call that produced them; vectors
/// are never silently truncated or padded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// A parameter or I/O vector does not match the declared architecture.
    #[error("Shape mismatch in {what}: {expected} expected, {actual} found")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A weight matrix handed to a constructor has inconsistent dimensions.
    #[error("Invalid architecture: {0}")]
    InvalidArchitecture(String),
}

pub type Result<T> = std::result::Result<T, ControlError>;

impl ControlError {
    pub fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = ControlError::shape("parameter vector", 10, 7);
        assert_eq!(
            err.to_string(),
            "Shape mismatch in parameter vector: 10 expected, 7 found"
        );
    }
}
