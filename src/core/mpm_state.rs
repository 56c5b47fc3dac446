use std::time::Instant;

use bevy::ecs::error::BevyError;
use bevy::prelude::*;

use crate::config::Cpdi2Params;
use crate::error::Cpdi2Result;
use crate::math::{Dimension, Real};
use crate::solver::{Cpdi2UpdateMethod, validate_enrichment_inputs};

use super::grid::{Grid, GridVelocities};
use super::kernel::GridWeightFunction;
use super::mesh::DomainMesh;
use super::particle_set::ParticleSet;
use super::support::InterpolationBuffers;

/// How an object's interpolation weights are computed. Chosen per object.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum UpdateMode {
    #[default]
    Standard,
    /// Interface enrichment over the object's domain mesh, one flag per mesh
    /// vertex.
    Enriched {
        mesh: DomainMesh,
        enriched_vertices: Vec<bool>,
    },
}

/// One deformable body: its particles, update mode and interpolation data.
#[derive(Clone, Debug)]
pub struct ParticleObject<D: Dimension> {
    particles: ParticleSet<D>,
    mode: UpdateMode,
    interpolation: InterpolationBuffers<D>,
}

impl<D: Dimension> ParticleObject<D> {
    pub fn particles(&self) -> &ParticleSet<D> {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSet<D> {
        &mut self.particles
    }

    pub fn mode(&self) -> &UpdateMode {
        &self.mode
    }

    pub fn interpolation(&self) -> &InterpolationBuffers<D> {
        &self.interpolation
    }
}

/// Aggregate state for the CPDI2 update: grid, nodal velocities, weight
/// function and particle objects.
#[derive(Resource)]
pub struct Cpdi2State<D: Dimension> {
    grid: Grid<D>,
    velocities: GridVelocities<D>,
    weight_function: Box<dyn GridWeightFunction<D>>,
    objects: Vec<ParticleObject<D>>,
    method: Cpdi2UpdateMethod<D>,
}

impl<D: Dimension> Cpdi2State<D> {
    pub fn new(
        grid: Grid<D>,
        weight_function: impl GridWeightFunction<D> + 'static,
        params: Cpdi2Params,
    ) -> Self {
        let velocities = GridVelocities::zeros(grid.node_count());
        Self {
            grid,
            velocities,
            weight_function: Box::new(weight_function),
            objects: Vec::new(),
            method: Cpdi2UpdateMethod::new(params),
        }
    }

    /// Add an object. Enriched objects are checked against their mesh here.
    pub fn add_object(&mut self, particles: ParticleSet<D>, mode: UpdateMode) -> Cpdi2Result<usize> {
        if let UpdateMode::Enriched {
            mesh,
            enriched_vertices,
        } = &mode
        {
            validate_enrichment_inputs(&particles, mesh, enriched_vertices)?;
        }
        let index = self.objects.len();
        self.objects.push(ParticleObject {
            particles,
            mode,
            interpolation: InterpolationBuffers::new(),
        });
        Ok(index)
    }

    pub fn objects(&self) -> &[ParticleObject<D>] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&ParticleObject<D>> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut ParticleObject<D>> {
        self.objects.get_mut(index)
    }

    pub fn particle_count(&self) -> usize {
        self.objects.iter().map(|object| object.particles.len()).sum()
    }

    pub fn grid(&self) -> &Grid<D> {
        &self.grid
    }

    pub fn velocities(&self) -> &GridVelocities<D> {
        &self.velocities
    }

    pub fn velocities_mut(&mut self) -> &mut GridVelocities<D> {
        &mut self.velocities
    }

    pub fn method(&self) -> &Cpdi2UpdateMethod<D> {
        &self.method
    }

    pub fn params_mut(&mut self) -> &mut Cpdi2Params {
        self.method.params_mut()
    }

    pub fn update_interpolation_weights(&mut self) -> Cpdi2Result<()> {
        let start = Instant::now();
        for (index, object) in self.objects.iter_mut().enumerate() {
            match &object.mode {
                UpdateMode::Standard => self.method.update_particle_interpolation_weight(
                    index,
                    &self.grid,
                    self.weight_function.as_ref(),
                    &object.particles,
                    &mut object.interpolation,
                )?,
                UpdateMode::Enriched {
                    mesh,
                    enriched_vertices,
                } => self.method.update_particle_interpolation_weight_with_enrichment(
                    index,
                    &self.grid,
                    self.weight_function.as_ref(),
                    &object.particles,
                    mesh,
                    enriched_vertices,
                    &mut object.interpolation,
                )?,
            }
        }
        let elapsed = start.elapsed().as_secs_f32() * 1000.0;
        debug!("cpdi2_weights ({}): {:.3}ms", D::NAME, elapsed);
        Ok(())
    }

    pub fn update_domains(&mut self, dt: Real) -> Cpdi2Result<()> {
        let start = Instant::now();
        let update_volume = self.method.params().update_volume;
        for (index, object) in self.objects.iter_mut().enumerate() {
            if update_volume {
                self.method.update_particle_domain_and_volume(
                    index,
                    &mut object.particles,
                    &object.interpolation,
                    &self.velocities,
                    dt,
                )?;
            } else {
                self.method.update_particle_domain(
                    &mut object.particles,
                    &object.interpolation,
                    &self.velocities,
                    dt,
                )?;
            }
        }
        let elapsed = start.elapsed().as_secs_f32() * 1000.0;
        debug!("cpdi2_domains ({}): {:.3}ms", D::NAME, elapsed);
        Ok(())
    }

    pub fn update_positions(&mut self) {
        for object in &mut self.objects {
            self.method.update_particle_position(&mut object.particles);
        }
    }

    pub fn update_deformation_gradients(&mut self) -> Cpdi2Result<()> {
        let start = Instant::now();
        for (index, object) in self.objects.iter_mut().enumerate() {
            self.method
                .update_particle_deformation_gradient(index, &mut object.particles)?;
        }
        let elapsed = start.elapsed().as_secs_f32() * 1000.0;
        debug!("cpdi2_deformation ({}): {:.3}ms", D::NAME, elapsed);
        Ok(())
    }

    /// Run every stage once, in order.
    pub fn step(&mut self, dt: Real) -> Cpdi2Result<()> {
        self.update_interpolation_weights()?;
        self.update_domains(dt)?;
        self.update_positions();
        self.update_deformation_gradients()
    }
}

pub fn update_interpolation_weights<D: Dimension>(
    mut state: ResMut<Cpdi2State<D>>,
) -> Result<(), BevyError> {
    state.update_interpolation_weights()?;
    Ok(())
}

pub fn update_particle_domains<D: Dimension>(
    time: Res<Time>,
    mut state: ResMut<Cpdi2State<D>>,
) -> Result<(), BevyError> {
    state.update_domains(time.delta_secs())?;
    Ok(())
}

pub fn update_particle_positions<D: Dimension>(mut state: ResMut<Cpdi2State<D>>) {
    state.update_positions();
}

pub fn update_particle_deformation_gradients<D: Dimension>(
    mut state: ResMut<Cpdi2State<D>>,
) -> Result<(), BevyError> {
    state.update_deformation_gradients()?;
    Ok(())
}
