pub mod grid;
pub mod kernel;
pub mod mesh;
pub mod mpm_state;
pub mod particle;
pub mod particle_set;
pub mod quadrature;
pub mod support;

pub use grid::{Grid, GridVelocities, GridVelocityField, NodeIndex};
pub use kernel::{CubicBSpline, GridWeightFunction, KernelProfile, LinearHat, QuadraticBSpline};
pub use mesh::{DomainMesh, ElementCorner, VolumetricMesh};
pub use mpm_state::{Cpdi2State, ParticleObject, UpdateMode};
pub use particle::{ParticleDomain, corner_multi_index, corner_sign, natural_corner};
pub use particle_set::ParticleSet;
pub use quadrature::{
    DegenerateJacobian, DomainQuadrature, gauss_integrate_shape_function_gradient_to_current,
    gauss_integrate_shape_function_gradient_to_reference, gauss_integrate_shape_function_value,
    jacobian_quality, particle_domain_jacobian,
};
pub use support::{
    CornerWeight, InterpolationBuffers, NodeWeightGradient, ParticleInterpolation, SupportCapacity,
    SupportOverflow, SupportSet,
};
