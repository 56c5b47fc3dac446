use bevy::prelude::*;

use crate::config::constants::{DEFAULT_JACOBIAN_QUALITY_TOLERANCE, DEFAULT_MAX_DOMAIN_EXTENT};
use crate::core::SupportCapacity;
use crate::math::Real;

/// Parameters controlling the CPDI2 update method
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct Cpdi2Params {
    /// Minimum accepted Jacobian quality (`det J / Π |row(J)|`, in (0, 1]).
    /// Domains at or below this are reported as degenerate.
    pub jacobian_tolerance: Real,

    /// Largest particle domain extent, in grid cells, used when deriving
    /// support capacities from the weight function.
    pub max_domain_extent: Real,

    /// Explicit support capacities. When `None` they are derived from the
    /// grid, the weight function radius and `max_domain_extent`.
    pub support_capacity: Option<SupportCapacity>,

    /// Recompute particle volumes from the advected domains every step.
    pub update_volume: bool,
}

impl Default for Cpdi2Params {
    fn default() -> Self {
        Self {
            jacobian_tolerance: DEFAULT_JACOBIAN_QUALITY_TOLERANCE,
            max_domain_extent: DEFAULT_MAX_DOMAIN_EXTENT,
            support_capacity: None,
            update_volume: true,
        }
    }
}

impl Cpdi2Params {
    /// Pin the support buffers to a fixed capacity
    pub fn with_support_capacity(mut self, capacity: SupportCapacity) -> Self {
        self.support_capacity = Some(capacity);
        self
    }

    /// Set the degeneracy threshold (clamped to [0, 1])
    pub fn with_jacobian_tolerance(mut self, tolerance: Real) -> Self {
        self.jacobian_tolerance = tolerance.clamp(0.0, 1.0);
        self
    }

    /// Enable or disable the per-step volume update
    pub fn with_volume_update(mut self, enabled: bool) -> Self {
        self.update_volume = enabled;
        self
    }

    /// Set the largest expected domain extent in grid cells
    pub fn with_max_domain_extent(mut self, extent: Real) -> Self {
        self.max_domain_extent = extent.max(0.0);
        self
    }
}
