//! Error types for the CPDI2 update method.
//!
//! Every variant is fatal for the call that produced it: the failure points
//! at a modeling or configuration defect upstream, never at a transient
//! condition, so nothing here is retried.

use thiserror::Error;

use crate::math::Real;

/// Errors that can occur while updating particle domains.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Cpdi2Error {
    /// More grid nodes overlap a point than its support buffer can hold.
    ///
    /// This means the weight function support is wider than the capacity the
    /// buffers were sized for.
    #[error(
        "support capacity exceeded: object {object}, particle {particle}{}, capacity {capacity}",
        corner_suffix(.corner)
    )]
    CapacityExceeded {
        /// Object index.
        object: usize,
        /// Particle index within the object.
        particle: usize,
        /// Corner index, `None` for the particle-level support.
        corner: Option<usize>,
        /// Capacity of the buffer that overflowed.
        capacity: usize,
    },

    /// The domain Jacobian is singular or the domain is inverted.
    #[error(
        "degenerate particle domain: object {object}, particle {particle}, jacobian quality {quality:e}, corners {corners}"
    )]
    DegenerateDomain {
        /// Object index.
        object: usize,
        /// Particle index within the object.
        particle: usize,
        /// `det J` over the product of the Jacobian row lengths.
        quality: Real,
        /// Corner positions of the offending domain, formatted.
        corners: String,
    },

    /// Two inputs of the same call disagree on their sizes.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which input was rejected.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Timestep is negative or not finite.
    #[error("invalid timestep: {0}")]
    InvalidTimestep(Real),

    /// Mesh connectivity references a vertex or element that does not exist.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

impl Cpdi2Error {
    pub(crate) fn mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}

fn corner_suffix(corner: &Option<usize>) -> String {
    corner.map(|c| format!(", corner {c}")).unwrap_or_default()
}

pub type Cpdi2Result<T> = Result<T, Cpdi2Error>;
