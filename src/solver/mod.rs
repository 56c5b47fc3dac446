// src/solver/mod.rs
pub mod cpdi2;
pub mod domain_update;
pub mod enrichment;
pub mod particle_update;
pub mod weights;

pub use cpdi2::*;
pub use domain_update::*;
pub use enrichment::*;
pub use particle_update::*;
pub use weights::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::{DegenerateJacobian, SupportOverflow};
use crate::error::{Cpdi2Error, Cpdi2Result};
use crate::math::Dimension;

/// Run `f` for every particle index and collect the results in order,
/// stopping at the first error. Parallel with the `parallel` feature.
pub(crate) fn try_map_particles<T, F>(count: usize, f: F) -> Cpdi2Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Cpdi2Result<T> + Send + Sync,
{
    #[cfg(feature = "parallel")]
    let results = (0..count).into_par_iter().map(f).collect();
    #[cfg(not(feature = "parallel"))]
    let results = (0..count).map(f).collect();
    results
}

pub(crate) fn capacity_exceeded(
    object: usize,
    particle: usize,
    corner: Option<usize>,
    overflow: SupportOverflow,
) -> Cpdi2Error {
    Cpdi2Error::CapacityExceeded {
        object,
        particle,
        corner,
        capacity: overflow.capacity,
    }
}

pub(crate) fn degenerate_domain<D: Dimension>(
    object: usize,
    particle: usize,
    corners: &D::Corners,
    err: DegenerateJacobian,
) -> Cpdi2Error {
    Cpdi2Error::DegenerateDomain {
        object,
        particle,
        quality: err.quality,
        corners: format!("{:?}", corners.as_ref()),
    }
}
