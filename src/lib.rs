use std::marker::PhantomData;

use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod math;
pub mod solver;

// Public re-exports for clean API
pub use crate::config::{Cpdi2Params, DEFAULT_WELD_TOLERANCE};
pub use crate::core::{
    CornerWeight, Cpdi2State, CubicBSpline, DomainMesh, Grid, GridVelocities, GridVelocityField,
    GridWeightFunction, InterpolationBuffers, LinearHat, NodeWeightGradient, ParticleDomain,
    ParticleInterpolation, ParticleObject, ParticleSet, QuadraticBSpline, SupportCapacity,
    SupportSet, UpdateMode, VolumetricMesh,
};
pub use crate::error::{Cpdi2Error, Cpdi2Result};
pub use crate::math::{Dim2, Dim3, Dimension, Real};
pub use crate::solver::Cpdi2UpdateMethod;

use crate::core::mpm_state::{
    update_interpolation_weights, update_particle_deformation_gradients, update_particle_domains,
    update_particle_positions,
};

/// The CPDI2 stages, in their fixed order. Schedule the grid velocity solve
/// before this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpdi2Systems;

/// Runs the CPDI2 update on the [`Cpdi2State<D>`] resource every fixed step.
///
/// The resource is not inserted by the plugin: it needs a grid and a weight
/// function. The stages are skipped while it is absent.
pub struct Cpdi2Plugin<D: Dimension> {
    _dimension: PhantomData<D>,
}

impl<D: Dimension> Default for Cpdi2Plugin<D> {
    fn default() -> Self {
        Self {
            _dimension: PhantomData,
        }
    }
}

impl<D: Dimension> Plugin for Cpdi2Plugin<D> {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                update_interpolation_weights::<D>,
                update_particle_domains::<D>,
                update_particle_positions::<D>,
                update_particle_deformation_gradients::<D>,
            )
                .chain()
                .in_set(Cpdi2Systems)
                .run_if(resource_exists::<Cpdi2State<D>>),
        );
    }
}
