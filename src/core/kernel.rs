//! Grid weight functions.
//!
//! The update method only consumes [`GridWeightFunction`]; the tensor-product
//! B-splines below are the usual MPM choices and serve as reference
//! implementations.

use crate::math::{Dimension, Real};

/// Interpolation kernel between a grid node and a query point.
///
/// Implementations must be stateless per query: the update method evaluates
/// them concurrently for many particles and corners.
pub trait GridWeightFunction<D: Dimension>: Send + Sync {
    /// Support half-width in grid cells along each axis. May be infinite.
    fn support_radius(&self) -> Real;

    /// Weight of the node at `node_position` for a point at `query`.
    fn weight(&self, node_position: D::Vector, query: D::Vector, cell_width: Real) -> Real;

    /// Gradient of [`Self::weight`] with respect to `query`.
    fn gradient(&self, node_position: D::Vector, query: D::Vector, cell_width: Real) -> D::Vector;
}

/// One-dimensional kernel profile, evaluated in cell units.
///
/// Every profile is a [`GridWeightFunction`] in any dimension through its
/// tensor product `w(x) = Π_a N((x_a - x_i,a) / h)`.
pub trait KernelProfile: Send + Sync {
    fn radius(&self) -> Real;
    fn value(&self, r: Real) -> Real;
    fn derivative(&self, r: Real) -> Real;
}

impl<D: Dimension, K: KernelProfile> GridWeightFunction<D> for K {
    #[inline]
    fn support_radius(&self) -> Real {
        self.radius()
    }

    #[inline]
    fn weight(&self, node_position: D::Vector, query: D::Vector, cell_width: Real) -> Real {
        let r = (query - node_position) / cell_width;
        (0..D::DIM).map(|axis| self.value(D::component(r, axis))).product()
    }

    #[inline]
    fn gradient(&self, node_position: D::Vector, query: D::Vector, cell_width: Real) -> D::Vector {
        let r = (query - node_position) / cell_width;
        D::vector_from_fn(|axis| {
            let mut g = self.derivative(D::component(r, axis)) / cell_width;
            for other in (0..D::DIM).filter(|&other| other != axis) {
                g *= self.value(D::component(r, other));
            }
            g
        })
    }
}

/// Linear hat (tent) function, one cell of support.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearHat;

impl KernelProfile for LinearHat {
    #[inline(always)]
    fn radius(&self) -> Real {
        1.0
    }

    #[inline(always)]
    fn value(&self, r: Real) -> Real {
        (1.0 - r.abs()).max(0.0)
    }

    #[inline(always)]
    fn derivative(&self, r: Real) -> Real {
        if r.abs() < 1.0 { -r.signum() } else { 0.0 }
    }
}

/// Quadratic B-spline, 1.5 cells of support (the 3x3 MLS-MPM kernel).
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadraticBSpline;

impl KernelProfile for QuadraticBSpline {
    #[inline(always)]
    fn radius(&self) -> Real {
        1.5
    }

    #[inline(always)]
    fn value(&self, r: Real) -> Real {
        let a = r.abs();
        if a < 0.5 {
            0.75 - a * a
        } else if a < 1.5 {
            0.5 * (1.5 - a) * (1.5 - a)
        } else {
            0.0
        }
    }

    #[inline(always)]
    fn derivative(&self, r: Real) -> Real {
        let a = r.abs();
        if a < 0.5 {
            -2.0 * r
        } else if a < 1.5 {
            -(1.5 - a) * r.signum()
        } else {
            0.0
        }
    }
}

/// Cubic B-spline, two cells of support.
#[derive(Clone, Copy, Debug, Default)]
pub struct CubicBSpline;

impl KernelProfile for CubicBSpline {
    #[inline(always)]
    fn radius(&self) -> Real {
        2.0
    }

    #[inline(always)]
    fn value(&self, r: Real) -> Real {
        let a = r.abs();
        if a < 1.0 {
            0.5 * a * a * a - a * a + 2.0 / 3.0
        } else if a < 2.0 {
            let b = 2.0 - a;
            b * b * b / 6.0
        } else {
            0.0
        }
    }

    #[inline(always)]
    fn derivative(&self, r: Real) -> Real {
        let a = r.abs();
        if a < 1.0 {
            1.5 * r * a - 2.0 * r
        } else if a < 2.0 {
            let b = 2.0 - a;
            -0.5 * b * b * r.signum()
        } else {
            0.0
        }
    }
}
