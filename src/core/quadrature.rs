//! Gauss integration over distorted particle domains.
//!
//! A domain is the image of the natural cube `[-1, 1]^D` under the
//! bilinear/trilinear map `x(ξ) = Σ_c N_c(ξ) x_c`, with
//! `N_c(ξ) = Π_a (1 + s_a ξ_a) / 2` and `s_a` the sign of corner `c` along
//! axis `a`. Integrals use the 2-point Gauss-Legendre rule per axis.
//!
//! The Jacobian is stored in row convention: row `a` is `∂x/∂ξ_a`, so the
//! physical gradient of a shape function is `J⁻¹ ∇_ξ N`.

use crate::config::constants::{GAUSS_ABSCISSA, GAUSS_WEIGHT};
use crate::core::particle::corner_sign;
use crate::math::{Dimension, Real};

const MAX_POINTS: usize = 8;

/// Raised when a Jacobian is singular, inverted or not finite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DegenerateJacobian {
    /// `det J / Π |row(J)|` at the worst quadrature point.
    pub quality: Real,
}

/// Quadrature point `q`, which shares the sign pattern of corner `q`.
#[inline]
pub fn gauss_point<D: Dimension>(point: usize) -> D::Vector {
    D::vector_from_fn(|axis| corner_sign(point, axis) * GAUSS_ABSCISSA)
}

/// Product of the per-axis Gauss weights.
#[inline]
pub fn gauss_weight<D: Dimension>() -> Real {
    GAUSS_WEIGHT.powi(D::DIM as i32)
}

#[inline]
pub fn shape_function<D: Dimension>(corner: usize, xi: D::Vector) -> Real {
    (0..D::DIM)
        .map(|axis| 0.5 * (1.0 + corner_sign(corner, axis) * D::component(xi, axis)))
        .product()
}

/// Gradient of `N_corner` with respect to natural coordinates.
#[inline]
pub fn shape_function_natural_gradient<D: Dimension>(corner: usize, xi: D::Vector) -> D::Vector {
    D::vector_from_fn(|axis| {
        let mut g = 0.5 * corner_sign(corner, axis);
        for other in (0..D::DIM).filter(|&other| other != axis) {
            g *= 0.5 * (1.0 + corner_sign(corner, other) * D::component(xi, other));
        }
        g
    })
}

/// Jacobian of the domain map at natural point `xi`; row `a` is `∂x/∂ξ_a`.
pub fn particle_domain_jacobian<D: Dimension>(xi: D::Vector, corners: &D::Corners) -> D::Matrix {
    let corners = corners.as_ref();
    let mut rows = [D::zero_vector(); 3];
    for (corner, &x) in corners.iter().enumerate() {
        let dn = shape_function_natural_gradient::<D>(corner, xi);
        for (axis, row) in rows.iter_mut().enumerate().take(D::DIM) {
            *row += x * D::component(dn, axis);
        }
    }
    D::matrix_from_rows(|axis| rows[axis])
}

/// `det J` over the product of the row lengths: 1 for an undistorted box,
/// 0 for a collapsed domain, negative for an inverted one.
pub fn jacobian_quality<D: Dimension>(jacobian: &D::Matrix) -> Real {
    let scale: Real = (0..D::DIM)
        .map(|row| D::length(D::matrix_row(jacobian, row)))
        .product();
    if scale > 0.0 {
        D::determinant(jacobian) / scale
    } else {
        0.0
    }
}

/// Jacobian data of one domain at every quadrature point.
#[derive(Clone, Copy, Debug)]
pub struct DomainQuadrature<D: Dimension> {
    determinants: [Real; MAX_POINTS],
    inverses: [D::Matrix; MAX_POINTS],
}

impl<D: Dimension> DomainQuadrature<D> {
    /// Fails if the Jacobian quality at any point is not above `tolerance`.
    pub fn new(corners: &D::Corners, tolerance: Real) -> Result<Self, DegenerateJacobian> {
        let mut determinants = [0.0; MAX_POINTS];
        let mut inverses = [D::zero_matrix(); MAX_POINTS];
        for point in 0..D::CORNER_COUNT {
            let jacobian = particle_domain_jacobian::<D>(gauss_point::<D>(point), corners);
            let quality = jacobian_quality::<D>(&jacobian);
            if !(quality > tolerance) || !D::matrix_is_finite(&jacobian) {
                return Err(DegenerateJacobian { quality });
            }
            determinants[point] = D::determinant(&jacobian);
            inverses[point] = D::inverse(&jacobian);
        }
        Ok(Self {
            determinants,
            inverses,
        })
    }

    /// `det J` at quadrature point `point`.
    #[inline]
    pub fn determinant(&self, point: usize) -> Real {
        self.determinants[point]
    }

    /// Domain volume (area in 2D).
    pub fn volume(&self) -> Real {
        let w = gauss_weight::<D>();
        self.determinants[..D::CORNER_COUNT].iter().map(|det| w * det).sum()
    }

    /// `∫ N_corner dΩ`.
    pub fn integrate_shape_function(&self, corner: usize) -> Real {
        let w = gauss_weight::<D>();
        (0..D::CORNER_COUNT)
            .map(|point| w * shape_function::<D>(corner, gauss_point::<D>(point)) * self.determinants[point])
            .sum()
    }

    /// `∫ ∇_x N_corner dΩ`, gradient with respect to the physical
    /// coordinates of the integrated domain.
    pub fn integrate_shape_function_gradient(&self, corner: usize) -> D::Vector {
        let w = gauss_weight::<D>();
        (0..D::CORNER_COUNT)
            .map(|point| {
                let dn = shape_function_natural_gradient::<D>(corner, gauss_point::<D>(point));
                self.inverses[point] * dn * (w * self.determinants[point])
            })
            .sum()
    }
}

/// `∫ N_corner dΩ` over the domain spanned by `corners`.
pub fn gauss_integrate_shape_function_value<D: Dimension>(
    corner: usize,
    corners: &D::Corners,
    tolerance: Real,
) -> Result<Real, DegenerateJacobian> {
    Ok(DomainQuadrature::<D>::new(corners, tolerance)?.integrate_shape_function(corner))
}

/// `∫ ∇_x N_corner dΩ` over the current domain.
pub fn gauss_integrate_shape_function_gradient_to_current<D: Dimension>(
    corner: usize,
    current: &D::Corners,
    tolerance: Real,
) -> Result<D::Vector, DegenerateJacobian> {
    Ok(DomainQuadrature::<D>::new(current, tolerance)?.integrate_shape_function_gradient(corner))
}

/// `∫ ∇_X N_corner dΩ₀` over the reference domain.
pub fn gauss_integrate_shape_function_gradient_to_reference<D: Dimension>(
    corner: usize,
    reference: &D::Corners,
    tolerance: Real,
) -> Result<D::Vector, DegenerateJacobian> {
    Ok(DomainQuadrature::<D>::new(reference, tolerance)?.integrate_shape_function_gradient(corner))
}

/// Volume-averaged shape function gradients, one per corner:
/// `(1/V) ∫ ∇N_c dΩ`.
pub fn average_shape_function_gradients<D: Dimension>(
    corners: &D::Corners,
    tolerance: Real,
) -> Result<D::Corners, DegenerateJacobian> {
    let quadrature = DomainQuadrature::<D>::new(corners, tolerance)?;
    let inv_volume = 1.0 / quadrature.volume();
    Ok(D::corners_from_fn(|corner| {
        quadrature.integrate_shape_function_gradient(corner) * inv_volume
    }))
}

/// Signed volume of the domain without degeneracy checks.
pub fn signed_volume<D: Dimension>(corners: &D::Corners) -> Real {
    let w = gauss_weight::<D>();
    (0..D::CORNER_COUNT)
        .map(|point| {
            let jacobian = particle_domain_jacobian::<D>(gauss_point::<D>(point), corners);
            w * D::determinant(&jacobian)
        })
        .sum()
}
