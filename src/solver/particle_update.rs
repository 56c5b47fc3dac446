//! Particle state derived from the advected domains
//!
//! Position, deformation gradient and volume. The deformation gradient is
//! reconstructed from corner positions and the volume-averaged reference shape
//! gradients (modified CPDI2):
//!
//! ```text
//! F = Σ_c x_c ⊗ ḡ⁰_c,   ḡ⁰_c = (1/V₀) ∫ ∇_X N_c dΩ₀
//! ```

use bevy::prelude::*;

use crate::core::quadrature::average_shape_function_gradients;
use crate::core::{DomainQuadrature, ParticleSet};
use crate::error::Cpdi2Result;
use crate::math::{Dimension, Real};

use super::{degenerate_domain, try_map_particles};

/// Move every non-Dirichlet particle to the mean of its current corners.
pub fn update_positions<D: Dimension>(particles: &mut ParticleSet<D>) {
    let (domains, dirichlet, positions) = particles.domains_and_positions_mut();
    for ((domain, &fixed), position) in domains.iter().zip(dirichlet).zip(positions.iter_mut()) {
        if !fixed {
            *position = domain.center();
        }
    }
}

/// `F = Σ_c x_c ⊗ ḡ⁰_c` for one domain.
pub fn reconstruct_deformation_gradient<D: Dimension>(
    current: &D::Corners,
    reference_gradients: &D::Corners,
) -> D::Matrix {
    let mut f = D::zero_matrix();
    for (&x, &g) in current.as_ref().iter().zip(reference_gradients.as_ref()) {
        f += D::outer_product(x, g);
    }
    f
}

/// Recompute the deformation gradient of every particle.
///
/// Fails without writing anything if any reference domain is degenerate.
/// Inverted results are written but reported.
pub fn update_deformation_gradients<D: Dimension>(
    particles: &mut ParticleSet<D>,
    tolerance: Real,
    object: usize,
) -> Cpdi2Result<()> {
    let domains = particles.domains();
    let gradients = try_map_particles(domains.len(), |particle| {
        let domain = &domains[particle];
        let reference_gradients = average_shape_function_gradients::<D>(domain.reference(), tolerance)
            .map_err(|err| degenerate_domain::<D>(object, particle, domain.reference(), err))?;
        Ok(reconstruct_deformation_gradient::<D>(domain.current(), &reference_gradients))
    })?;

    let inverted = gradients
        .iter()
        .filter(|f| D::determinant(*f) <= 0.0)
        .count();
    if inverted > 0 {
        warn!(
            "object {}: {} of {} particles have det F <= 0",
            object,
            inverted,
            gradients.len()
        );
    }

    particles.deformation_gradients_mut().copy_from_slice(&gradients);
    Ok(())
}

/// Gauss-rule volume of each domain in `corners`, in order.
pub fn domain_volumes<D: Dimension>(
    corners: &[D::Corners],
    tolerance: Real,
    object: usize,
) -> Cpdi2Result<Vec<Real>> {
    try_map_particles(corners.len(), |particle| {
        let current = &corners[particle];
        DomainQuadrature::<D>::new(current, tolerance)
            .map(|quadrature| quadrature.volume())
            .map_err(|err| degenerate_domain::<D>(object, particle, current, err))
    })
}

/// Recompute the volume of every particle from its current domain.
pub fn update_volumes<D: Dimension>(
    particles: &mut ParticleSet<D>,
    tolerance: Real,
    object: usize,
) -> Cpdi2Result<()> {
    let current: Vec<D::Corners> = particles.domains().iter().map(|domain| *domain.current()).collect();
    let volumes = domain_volumes::<D>(&current, tolerance, object)?;
    particles.volumes_mut().copy_from_slice(&volumes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParticleDomain;
    use crate::error::Cpdi2Error;
    use crate::math::{Dim2, Dim3};
    use approx::assert_relative_eq;
    use bevy::math::{Mat2, Mat3, Vec2, Vec3};

    const TOL: Real = 1e-6;

    fn deform(particles: &mut ParticleSet<Dim2>, particle: usize, f: Mat2, t: Vec2) {
        let domain = &mut particles.domains_mut()[particle];
        let moved = domain.reference().map(|x| f * x + t);
        domain.set_current(moved);
    }

    #[test]
    fn position_is_corner_mean_except_for_dirichlet() {
        let mut particles = ParticleSet::<Dim2>::new();
        particles.push(ParticleDomain::axis_aligned(Vec2::ZERO, Vec2::splat(0.5)));
        particles.push(ParticleDomain::axis_aligned(Vec2::ZERO, Vec2::splat(0.5)));
        particles.set_dirichlet(1, true);
        deform(&mut particles, 0, Mat2::IDENTITY, Vec2::new(2.0, 1.0));
        deform(&mut particles, 1, Mat2::IDENTITY, Vec2::new(2.0, 1.0));

        update_positions(&mut particles);
        assert_eq!(particles.positions()[0], Vec2::new(2.0, 1.0));
        assert_eq!(particles.positions()[1], Vec2::ZERO);
    }

    #[test]
    fn undeformed_domains_have_identity_gradient() {
        let mut particles = ParticleSet::<Dim3>::new();
        particles.push(ParticleDomain::axis_aligned(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 0.25, 1.0)));
        update_deformation_gradients(&mut particles, TOL, 0).unwrap();
        assert!(particles.deformation_gradients()[0].abs_diff_eq(Mat3::IDENTITY, 1e-5));
    }

    #[test]
    fn affine_maps_are_reproduced() {
        let mut particles = ParticleSet::<Dim2>::new();
        particles.push(ParticleDomain::axis_aligned(Vec2::new(0.3, 0.7), Vec2::splat(0.2)));
        let f = Mat2::from_cols(Vec2::new(1.2, 0.1), Vec2::new(-0.3, 0.9));
        deform(&mut particles, 0, f, Vec2::new(4.0, -1.0));

        update_deformation_gradients(&mut particles, TOL, 0).unwrap();
        update_volumes(&mut particles, TOL, 0).unwrap();
        assert!(particles.deformation_gradients()[0].abs_diff_eq(f, 1e-5));
        assert_relative_eq!(particles.volumes()[0], 0.16 * f.determinant(), epsilon = 1e-5);
    }

    #[test]
    fn inverted_current_domain_is_written_not_rejected() {
        let mut particles = ParticleSet::<Dim2>::new();
        particles.push(ParticleDomain::axis_aligned(Vec2::ZERO, Vec2::ONE));
        let mirror = Mat2::from_diagonal(Vec2::new(-1.0, 1.0));
        deform(&mut particles, 0, mirror, Vec2::ZERO);
        update_deformation_gradients(&mut particles, TOL, 0).unwrap();
        assert!(particles.deformation_gradients()[0].abs_diff_eq(mirror, 1e-5));
    }

    #[test]
    fn degenerate_domain_aborts_the_volume_update() {
        let mut particles = ParticleSet::<Dim2>::new();
        particles.push(ParticleDomain::axis_aligned(Vec2::ZERO, Vec2::ONE));
        particles.push(ParticleDomain::axis_aligned(Vec2::splat(3.0), Vec2::ONE));
        deform(&mut particles, 1, Mat2::from_cols(Vec2::X, Vec2::ZERO), Vec2::ZERO);
        let before = particles.volumes().to_vec();

        let err = update_volumes(&mut particles, TOL, 4).unwrap_err();
        assert!(matches!(
            err,
            Cpdi2Error::DegenerateDomain { object: 4, particle: 1, .. }
        ));
        assert_eq!(particles.volumes(), &before[..]);
    }
}
