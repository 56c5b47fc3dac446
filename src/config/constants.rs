// Numerical constants for the CPDI2 update method
use crate::math::Real;

/// Abscissa of the 2-point Gauss-Legendre rule on [-1, 1], i.e. 1/√3.
pub const GAUSS_ABSCISSA: Real = 0.577_350_26;
/// Weight of each point of the 2-point Gauss-Legendre rule.
pub const GAUSS_WEIGHT: Real = 1.0;

/// Smallest accepted `det J / Π |row(J)|` before a domain counts as degenerate.
pub const DEFAULT_JACOBIAN_QUALITY_TOLERANCE: Real = 1.0e-6;

/// Largest particle domain extent, in grid cells, that default buffers are sized for.
pub const DEFAULT_MAX_DOMAIN_EXTENT: Real = 2.0;

/// Corner positions closer than this (in world units) weld into one mesh vertex.
pub const DEFAULT_WELD_TOLERANCE: Real = 1.0e-5;
