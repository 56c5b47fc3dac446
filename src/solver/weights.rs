//! Interpolation weights without enrichment
//!
//! Every particle gets one support set evaluated directly at its domain
//! center plus one per current domain corner.

use crate::core::{
    Grid, GridWeightFunction, ParticleDomain, ParticleInterpolation, ParticleSet, SupportCapacity,
};
use crate::error::Cpdi2Result;
use crate::math::Dimension;

use super::{capacity_exceeded, try_map_particles};

/// Grid supports of a single particle.
pub fn particle_grid_supports<D, W>(
    grid: &Grid<D>,
    weight_function: &W,
    domain: &ParticleDomain<D>,
    capacity: SupportCapacity,
    object: usize,
    particle: usize,
) -> Cpdi2Result<ParticleInterpolation<D>>
where
    D: Dimension,
    W: GridWeightFunction<D> + ?Sized,
{
    let mut interpolation = ParticleInterpolation::new(capacity);
    interpolation
        .particle
        .evaluate(grid, weight_function, domain.center())
        .map_err(|overflow| capacity_exceeded(object, particle, None, overflow))?;

    for (corner, support) in interpolation.corners.iter_mut().enumerate() {
        support
            .evaluate(grid, weight_function, domain.current_corner(corner))
            .map_err(|overflow| capacity_exceeded(object, particle, Some(corner), overflow))?;
    }
    Ok(interpolation)
}

/// Grid supports of every particle of an object, in particle order.
pub fn compute_interpolation_weights<D, W>(
    grid: &Grid<D>,
    weight_function: &W,
    particles: &ParticleSet<D>,
    capacity: SupportCapacity,
    object: usize,
) -> Cpdi2Result<Vec<ParticleInterpolation<D>>>
where
    D: Dimension,
    W: GridWeightFunction<D> + ?Sized,
{
    let domains = particles.domains();
    try_map_particles(domains.len(), |particle| {
        particle_grid_supports(grid, weight_function, &domains[particle], capacity, object, particle)
    })
}
