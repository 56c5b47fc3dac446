//! CPDI2 update method
//!
//! Stateless apart from its parameters: every stage reads and writes the
//! particle data it is handed. Each stage computes into staging storage and
//! commits only when every particle succeeded.

use std::marker::PhantomData;

use crate::config::Cpdi2Params;
use crate::core::{
    Grid, GridVelocityField, GridWeightFunction, InterpolationBuffers, ParticleSet, SupportCapacity,
    VolumetricMesh,
};
use crate::error::Cpdi2Result;
use crate::math::{Dimension, Real};

use super::domain_update::{advect_particle_domains, commit_particle_domains, stage_particle_domains};
use super::enrichment::compute_enriched_interpolation_weights;
use super::particle_update::{domain_volumes, update_deformation_gradients, update_positions, update_volumes};
use super::weights::compute_interpolation_weights;

#[derive(Clone, Debug)]
pub struct Cpdi2UpdateMethod<D: Dimension> {
    params: Cpdi2Params,
    _dimension: PhantomData<D>,
}

impl<D: Dimension> Default for Cpdi2UpdateMethod<D> {
    fn default() -> Self {
        Self::new(Cpdi2Params::default())
    }
}

impl<D: Dimension> Cpdi2UpdateMethod<D> {
    pub fn new(params: Cpdi2Params) -> Self {
        Self {
            params,
            _dimension: PhantomData,
        }
    }

    pub fn params(&self) -> &Cpdi2Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Cpdi2Params {
        &mut self.params
    }

    /// Configured capacities, or the ones derived from the weight function.
    pub fn support_capacity<W>(&self, grid: &Grid<D>, weight_function: &W) -> SupportCapacity
    where
        W: GridWeightFunction<D> + ?Sized,
    {
        self.params
            .support_capacity
            .unwrap_or_else(|| SupportCapacity::derive(grid, weight_function, self.params.max_domain_extent))
    }

    /// Weights and gradients of every particle and corner, without enrichment.
    pub fn update_particle_interpolation_weight<W>(
        &self,
        object: usize,
        grid: &Grid<D>,
        weight_function: &W,
        particles: &ParticleSet<D>,
        buffers: &mut InterpolationBuffers<D>,
    ) -> Cpdi2Result<()>
    where
        W: GridWeightFunction<D> + ?Sized,
    {
        let capacity = self.support_capacity(grid, weight_function);
        let staged = compute_interpolation_weights(grid, weight_function, particles, capacity, object)?;
        buffers.replace(staged);
        Ok(())
    }

    /// Weights and gradients with interface enrichment. `enriched_vertices`
    /// has one flag per vertex of `mesh`, whose elements are the particles.
    #[allow(clippy::too_many_arguments)]
    pub fn update_particle_interpolation_weight_with_enrichment<W, M>(
        &self,
        object: usize,
        grid: &Grid<D>,
        weight_function: &W,
        particles: &ParticleSet<D>,
        mesh: &M,
        enriched_vertices: &[bool],
        buffers: &mut InterpolationBuffers<D>,
    ) -> Cpdi2Result<()>
    where
        W: GridWeightFunction<D> + ?Sized,
        M: VolumetricMesh + ?Sized,
    {
        let capacity = self.support_capacity(grid, weight_function);
        let staged = compute_enriched_interpolation_weights(
            grid,
            weight_function,
            particles,
            mesh,
            enriched_vertices,
            capacity,
            self.params.jacobian_tolerance,
            object,
        )?;
        buffers.replace(staged);
        Ok(())
    }

    /// Advect every current corner with the interpolated grid velocity.
    pub fn update_particle_domain<V>(
        &self,
        particles: &mut ParticleSet<D>,
        buffers: &InterpolationBuffers<D>,
        velocities: &V,
        dt: Real,
    ) -> Cpdi2Result<()>
    where
        V: GridVelocityField<D> + ?Sized,
    {
        advect_particle_domains(particles, buffers, velocities, dt)
    }

    /// Advect the corners and recompute the volumes together. A domain that
    /// degenerates during advection fails the call before any corner moves.
    pub fn update_particle_domain_and_volume<V>(
        &self,
        object: usize,
        particles: &mut ParticleSet<D>,
        buffers: &InterpolationBuffers<D>,
        velocities: &V,
        dt: Real,
    ) -> Cpdi2Result<()>
    where
        V: GridVelocityField<D> + ?Sized,
    {
        let staged = stage_particle_domains(particles, buffers, velocities, dt)?;
        let volumes = domain_volumes::<D>(&staged, self.params.jacobian_tolerance, object)?;
        commit_particle_domains(particles, staged);
        particles.volumes_mut().copy_from_slice(&volumes);
        Ok(())
    }

    pub fn update_particle_position(&self, particles: &mut ParticleSet<D>) {
        update_positions(particles);
    }

    pub fn update_particle_deformation_gradient(
        &self,
        object: usize,
        particles: &mut ParticleSet<D>,
    ) -> Cpdi2Result<()> {
        update_deformation_gradients(particles, self.params.jacobian_tolerance, object)
    }

    pub fn update_particle_volume(&self, object: usize, particles: &mut ParticleSet<D>) -> Cpdi2Result<()> {
        update_volumes(particles, self.params.jacobian_tolerance, object)
    }
}
