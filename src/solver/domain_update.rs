//! Particle domain advection
//!
//! Each current corner moves with the grid velocity interpolated at that
//! corner, forward Euler: `x_c += dt Σ_i w_i(x_c) v_i`.

use crate::core::{GridVelocityField, InterpolationBuffers, ParticleSet};
use crate::error::{Cpdi2Error, Cpdi2Result};
use crate::math::{Dimension, Real};

use super::try_map_particles;

/// Check that a timestep is finite and not negative.
pub fn validate_timestep(dt: Real) -> Cpdi2Result<()> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(())
    } else {
        Err(Cpdi2Error::InvalidTimestep(dt))
    }
}

/// Check that `buffers` were produced for `particles` and only reference
/// nodes the velocity field has.
pub fn validate_advection_inputs<D, V>(
    particles: &ParticleSet<D>,
    buffers: &InterpolationBuffers<D>,
    velocities: &V,
) -> Cpdi2Result<()>
where
    D: Dimension,
    V: GridVelocityField<D> + ?Sized,
{
    if buffers.len() != particles.len() {
        return Err(Cpdi2Error::mismatch(
            "interpolation buffers",
            particles.len(),
            buffers.len(),
        ));
    }
    if let Some(interpolation) = buffers
        .particles()
        .iter()
        .find(|interpolation| interpolation.corners.len() != D::CORNER_COUNT)
    {
        return Err(Cpdi2Error::mismatch(
            "corner supports",
            D::CORNER_COUNT,
            interpolation.corners.len(),
        ));
    }
    if let Some(max_node) = buffers.max_corner_node() {
        if max_node >= velocities.node_count() {
            return Err(Cpdi2Error::mismatch(
                "grid velocity nodes",
                max_node + 1,
                velocities.node_count(),
            ));
        }
    }
    Ok(())
}

/// Advected current corners of every particle, without committing them.
pub fn stage_particle_domains<D, V>(
    particles: &ParticleSet<D>,
    buffers: &InterpolationBuffers<D>,
    velocities: &V,
    dt: Real,
) -> Cpdi2Result<Vec<D::Corners>>
where
    D: Dimension,
    V: GridVelocityField<D> + ?Sized,
{
    validate_timestep(dt)?;
    validate_advection_inputs(particles, buffers, velocities)?;

    let domains = particles.domains();
    let interpolation = buffers.particles();
    try_map_particles(domains.len(), |particle| {
        let domain = &domains[particle];
        let supports = &interpolation[particle].corners;
        Ok(D::corners_from_fn(|corner| {
            let velocity: D::Vector = supports[corner]
                .iter()
                .map(|entry| velocities.velocity(entry.node) * entry.weight)
                .sum();
            domain.current_corner(corner) + velocity * dt
        }))
    })
}

pub(crate) fn commit_particle_domains<D: Dimension>(particles: &mut ParticleSet<D>, staged: Vec<D::Corners>) {
    for (domain, current) in particles.domains_mut().iter_mut().zip(staged) {
        domain.set_current(current);
    }
}

/// Advect the current corners of every particle by one step of `dt`.
pub fn advect_particle_domains<D, V>(
    particles: &mut ParticleSet<D>,
    buffers: &InterpolationBuffers<D>,
    velocities: &V,
    dt: Real,
) -> Cpdi2Result<()>
where
    D: Dimension,
    V: GridVelocityField<D> + ?Sized,
{
    let staged = stage_particle_domains(particles, buffers, velocities, dt)?;
    commit_particle_domains(particles, staged);
    Ok(())
}
