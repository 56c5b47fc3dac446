//! Particle domains for CPDI2
//!
//! Each particle's support is a quadrilateral (2D) or hexahedron (3D) tracked
//! by its corners, in reference and current configuration.
//!
//! Corner `k` sits at natural coordinate `ξ_a = -1` when bit `a` of `k` is
//! clear and `+1` when it is set (x-fastest). In 2D the order is
//! `(-,-), (+,-), (-,+), (+,+)`.

use crate::math::{Dimension, Real, corner_average};

/// Bit of `corner` along `axis`: 0 for the `ξ = -1` face, 1 for `ξ = +1`.
#[inline(always)]
pub fn corner_multi_index(corner: usize, axis: usize) -> usize {
    (corner >> axis) & 1
}

/// Natural coordinate sign of `corner` along `axis`.
#[inline(always)]
pub fn corner_sign(corner: usize, axis: usize) -> Real {
    if corner_multi_index(corner, axis) == 0 { -1.0 } else { 1.0 }
}

/// Natural coordinates of `corner`.
#[inline]
pub fn natural_corner<D: Dimension>(corner: usize) -> D::Vector {
    D::vector_from_fn(|axis| corner_sign(corner, axis))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleDomain<D: Dimension> {
    reference: D::Corners,
    current: D::Corners,
}

impl<D: Dimension> ParticleDomain<D> {
    /// Undeformed domain: the current corners start at the reference corners.
    pub fn new(reference: D::Corners) -> Self {
        Self {
            reference,
            current: reference,
        }
    }

    /// Box domain with the given center and half extent per axis.
    pub fn axis_aligned(center: D::Vector, half_extent: D::Vector) -> Self {
        let corners = D::corners_from_fn(|corner| {
            center
                + D::vector_from_fn(|axis| corner_sign(corner, axis) * D::component(half_extent, axis))
        });
        Self::new(corners)
    }

    /// Cube/square domain holding `volume`, centered at `center`.
    pub fn from_volume(center: D::Vector, volume: Real) -> Self {
        let half = 0.5 * volume.powf(1.0 / D::DIM as Real);
        Self::axis_aligned(center, D::repeat_vector(half))
    }

    pub fn with_current(mut self, current: D::Corners) -> Self {
        self.current = current;
        self
    }

    /// Reference corners. They are fixed for the lifetime of the particle.
    #[inline]
    pub fn reference(&self) -> &D::Corners {
        &self.reference
    }

    #[inline]
    pub fn current(&self) -> &D::Corners {
        &self.current
    }

    #[inline]
    pub fn set_current(&mut self, current: D::Corners) {
        self.current = current;
    }

    #[inline]
    pub fn current_corner(&self, corner: usize) -> D::Vector {
        self.current.as_ref()[corner]
    }

    /// Corner average of the current domain.
    #[inline]
    pub fn center(&self) -> D::Vector {
        corner_average::<D>(&self.current)
    }

    /// Current corners minus reference corners.
    pub fn displacement(&self) -> D::Corners {
        let reference = self.reference.as_ref();
        let current = self.current.as_ref();
        D::corners_from_fn(|corner| current[corner] - reference[corner])
    }

    pub fn is_finite(&self) -> bool {
        self.current.as_ref().iter().all(|&x| D::vector_is_finite(x))
    }
}
