use std::time::Duration;

use approx::assert_relative_eq;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use cpdi2::{
    Cpdi2Error, Cpdi2Params, Cpdi2Plugin, Cpdi2State, Cpdi2UpdateMethod, Dim2, Dim3, DomainMesh, Grid,
    GridVelocities, GridWeightFunction, InterpolationBuffers, LinearHat, ParticleDomain, ParticleSet,
    QuadraticBSpline, Real, SupportCapacity, UpdateMode, VolumetricMesh,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Touches every grid node with the same small weight.
struct Everywhere;

impl GridWeightFunction<Dim2> for Everywhere {
    fn support_radius(&self) -> Real {
        Real::INFINITY
    }

    fn weight(&self, _node: Vec2, _query: Vec2, _cell_width: Real) -> Real {
        0.01
    }

    fn gradient(&self, _node: Vec2, _query: Vec2, _cell_width: Real) -> Vec2 {
        Vec2::ZERO
    }
}

fn unit_square() -> ParticleDomain<Dim2> {
    ParticleDomain::new([
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ])
}

#[test]
fn unit_square_moves_with_uniform_grid_velocity() {
    let grid = Grid::<Dim2>::with_resolution(1.0, IVec2::new(4, 4));
    let mut state = Cpdi2State::new(grid, LinearHat, Cpdi2Params::default());
    let mut particles = ParticleSet::new();
    particles.push(unit_square());
    state.add_object(particles, UpdateMode::Standard).unwrap();
    let node_count = state.grid().node_count();
    *state.velocities_mut() = GridVelocities::uniform(node_count, Vec2::new(1.0, 0.0));

    state.step(0.5).unwrap();

    let particles = state.objects()[0].particles();
    let corners = particles.domains()[0].current();
    for (moved, start) in corners.iter().zip(unit_square().reference()) {
        assert_eq!(*moved, *start + Vec2::new(0.5, 0.0));
    }
    assert_eq!(particles.positions()[0], Vec2::new(1.0, 0.5));
    assert!(particles.deformation_gradients()[0].abs_diff_eq(Mat2::IDENTITY, 1e-6));
    assert_relative_eq!(particles.volumes()[0], 1.0, epsilon = 1e-6);
}

#[test]
fn unit_cube_moves_with_uniform_grid_velocity() {
    let grid = Grid::<Dim3>::with_resolution(1.0, IVec3::splat(4));
    let mut state = Cpdi2State::new(grid, LinearHat, Cpdi2Params::default());
    let mut particles = ParticleSet::new();
    particles.push(ParticleDomain::axis_aligned(Vec3::splat(0.5), Vec3::splat(0.5)));
    state.add_object(particles, UpdateMode::Standard).unwrap();
    let node_count = state.grid().node_count();
    *state.velocities_mut() = GridVelocities::uniform(node_count, Vec3::new(0.0, 0.0, 1.0));

    state.step(0.5).unwrap();

    let particles = state.objects()[0].particles();
    assert!(particles.positions()[0].abs_diff_eq(Vec3::new(0.5, 0.5, 1.0), 1e-6));
    assert!(particles.deformation_gradients()[0].abs_diff_eq(Mat3::IDENTITY, 1e-6));
}

#[test]
fn unbounded_support_overflows_fixed_capacity() {
    let grid = Grid::<Dim2>::with_resolution(1.0, IVec2::new(8, 8));
    let params = Cpdi2Params::default().with_support_capacity(SupportCapacity::new(9, 4));
    let mut state = Cpdi2State::new(grid, Everywhere, params);
    let mut particles = ParticleSet::new();
    particles.push(ParticleDomain::axis_aligned(Vec2::splat(4.0), Vec2::splat(0.5)));
    state.add_object(particles, UpdateMode::Standard).unwrap();

    let err = state.step(0.1).unwrap_err();
    assert_eq!(
        err,
        Cpdi2Error::CapacityExceeded {
            object: 0,
            particle: 0,
            corner: None,
            capacity: 9,
        }
    );
    assert!(state.objects()[0].interpolation().is_empty());
    assert_eq!(state.objects()[0].particles().positions()[0], Vec2::splat(4.0));
}

#[test]
fn dirichlet_particles_keep_their_position() {
    let grid = Grid::<Dim2>::with_resolution(0.25, IVec2::new(32, 32));
    let mut state = Cpdi2State::new(grid, QuadraticBSpline, Cpdi2Params::default());
    let mut particles = ParticleSet::lattice(Vec2::splat(3.0), 0.25, IVec2::new(3, 1));
    particles.set_dirichlet(1, true);
    let pinned = particles.positions()[1];
    state.add_object(particles, UpdateMode::Standard).unwrap();
    let field = GridVelocities::from_fn(state.grid(), |x| Vec2::new(-x.y, x.x) * 0.2);
    *state.velocities_mut() = field;

    for _ in 0..5 {
        state.step(0.05).unwrap();
    }

    let particles = state.objects()[0].particles();
    assert_eq!(particles.positions()[1], pinned);
    for particle in [0, 2] {
        let center = particles.domains()[particle].center();
        assert_eq!(particles.positions()[particle], center);
    }
}

#[test]
fn affine_corner_maps_give_their_matrix() {
    let mut rng = StdRng::seed_from_u64(42);
    let method = Cpdi2UpdateMethod::<Dim3>::default();
    for _ in 0..20 {
        let f = Mat3::IDENTITY
            + Mat3::from_cols_array(&std::array::from_fn(|_| rng.random_range(-0.2..0.2)));
        let t = Vec3::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), 0.0);
        let domain = ParticleDomain::<Dim3>::axis_aligned(
            Vec3::new(rng.random_range(0.0..5.0), 1.0, 2.0),
            Vec3::new(0.3, 0.2, 0.4),
        );
        let deformed = domain.with_current(domain.reference().map(|x| f * x + t));
        let mut particles = ParticleSet::new();
        particles.push(deformed);

        method.update_particle_deformation_gradient(0, &mut particles).unwrap();
        method.update_particle_volume(0, &mut particles).unwrap();
        method.update_particle_position(&mut particles);

        assert!(particles.deformation_gradients()[0].abs_diff_eq(f, 1e-4));
        assert_relative_eq!(particles.volumes()[0], 0.192 * f.determinant(), max_relative = 1e-4);
        assert!(particles.positions()[0].abs_diff_eq(deformed.center(), 1e-6));
    }
}

#[test]
fn enrichment_only_changes_enriched_corners() {
    let grid = Grid::<Dim2>::with_resolution(0.25, IVec2::new(32, 32));
    let counts = IVec2::new(3, 3);
    let particles = ParticleSet::lattice(Vec2::splat(3.0), 0.25, counts);
    let mesh = DomainMesh::lattice::<Dim2>(counts);
    let columns = counts.x as usize + 1;
    let flags: Vec<bool> = (0..mesh.vertex_count()).map(|v| v % columns == 1).collect();
    let method = Cpdi2UpdateMethod::<Dim2>::default();

    let mut standard = InterpolationBuffers::new();
    let mut enriched = InterpolationBuffers::new();
    method
        .update_particle_interpolation_weight(0, &grid, &QuadraticBSpline, &particles, &mut standard)
        .unwrap();
    method
        .update_particle_interpolation_weight_with_enrichment(
            0,
            &grid,
            &QuadraticBSpline,
            &particles,
            &mesh,
            &flags,
            &mut enriched,
        )
        .unwrap();

    let mut enriched_corners = 0;
    for particle in 0..particles.len() {
        let ours = enriched.get(particle).unwrap();
        let theirs = standard.get(particle).unwrap();
        assert_eq!(ours.corner_weights.len(), 4);
        for corner in 0..4 {
            if flags[mesh.element_vertex(particle, corner)] {
                enriched_corners += 1;
                assert_ne!(ours.corners[corner], theirs.corners[corner]);
            } else {
                assert_eq!(ours.corners[corner], theirs.corners[corner]);
            }
        }
    }
    assert_eq!(enriched_corners, 2 * 6);

    // corner supports stay partitions of unity, so a uniform field still
    // translates every domain rigidly
    let velocities = GridVelocities::<Dim2>::uniform(grid.node_count(), Vec2::new(0.4, -0.2));
    let mut moved = particles.clone();
    method.update_particle_domain(&mut moved, &enriched, &velocities, 0.5).unwrap();
    method.update_particle_position(&mut moved);
    for (after, before) in moved.positions().iter().zip(particles.positions()) {
        assert!(after.abs_diff_eq(*before + Vec2::new(0.2, -0.1), 1e-5));
    }
}

#[test]
fn enriched_hexahedra_translate_rigidly() {
    let grid = Grid::<Dim3>::with_resolution(0.25, IVec3::splat(24));
    let counts = IVec3::new(2, 2, 2);
    let particles = ParticleSet::<Dim3>::lattice(Vec3::splat(2.5), 0.25, counts);
    let mesh = DomainMesh::from_particles(&particles);
    assert_eq!(mesh.vertex_count(), 27);
    let enriched_vertices = vec![true; mesh.vertex_count()];

    let mut state = Cpdi2State::new(grid, QuadraticBSpline, Cpdi2Params::default());
    state
        .add_object(
            particles.clone(),
            UpdateMode::Enriched {
                mesh,
                enriched_vertices,
            },
        )
        .unwrap();
    let velocity = Vec3::new(0.3, -0.1, 0.2);
    let node_count = state.grid().node_count();
    *state.velocities_mut() = GridVelocities::uniform(node_count, velocity);
    state.step(0.5).unwrap();

    let object = &state.objects()[0];
    for interpolation in object.interpolation().particles() {
        assert_relative_eq!(interpolation.particle.weight_sum(), 1.0, epsilon = 1e-5);
    }
    let moved = object.particles();
    let shift = velocity * 0.5;
    for (after, before) in moved.domains().iter().zip(particles.domains()) {
        for (a, b) in after.current().iter().zip(before.current()) {
            assert!(a.abs_diff_eq(*b + shift, 1e-5));
        }
    }
    for (after, before) in moved.positions().iter().zip(particles.positions()) {
        assert!(after.abs_diff_eq(*before + shift, 1e-5));
    }
    for (f, volume) in moved.deformation_gradients().iter().zip(moved.volumes()) {
        assert!(f.abs_diff_eq(Mat3::IDENTITY, 1e-4));
        assert_relative_eq!(*volume, 0.25 * 0.25 * 0.25, epsilon = 1e-6);
    }
}

#[test]
fn mismatched_enrichment_flags_leave_buffers_alone() {
    let grid = Grid::<Dim2>::with_resolution(0.25, IVec2::new(32, 32));
    let counts = IVec2::new(2, 2);
    let particles = ParticleSet::lattice(Vec2::splat(3.0), 0.25, counts);
    let mesh = DomainMesh::lattice::<Dim2>(counts);
    let method = Cpdi2UpdateMethod::<Dim2>::default();
    let mut buffers = InterpolationBuffers::new();
    method
        .update_particle_interpolation_weight(0, &grid, &QuadraticBSpline, &particles, &mut buffers)
        .unwrap();
    let before = buffers.clone();

    let err = method
        .update_particle_interpolation_weight_with_enrichment(
            3,
            &grid,
            &QuadraticBSpline,
            &particles,
            &mesh,
            &[true; 4],
            &mut buffers,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Cpdi2Error::DimensionMismatch { what: "enrichment flags", expected: 9, actual: 4 }
    ));
    assert_eq!(buffers, before);
}

#[test]
fn collapsed_domain_is_degenerate() {
    let method = Cpdi2UpdateMethod::<Dim2>::default();
    let mut particles = ParticleSet::new();
    particles.push(unit_square());
    particles.push(ParticleDomain::new([Vec2::ZERO, Vec2::X, Vec2::ZERO, Vec2::X]));
    let before = particles.deformation_gradients().to_vec();

    let err = method.update_particle_deformation_gradient(2, &mut particles).unwrap_err();
    match err {
        Cpdi2Error::DegenerateDomain {
            object,
            particle,
            quality,
            corners,
        } => {
            assert_eq!((object, particle), (2, 1));
            assert_eq!(quality, 0.0);
            assert!(corners.contains("Vec2"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(particles.deformation_gradients(), &before[..]);
}

#[test]
fn plugin_runs_the_stages_every_fixed_step() {
    let grid = Grid::<Dim2>::with_resolution(0.25, IVec2::new(32, 32));
    let mut state = Cpdi2State::new(grid, QuadraticBSpline, Cpdi2Params::default());
    state
        .add_object(ParticleSet::lattice(Vec2::splat(2.0), 0.25, IVec2::new(2, 2)), UpdateMode::Standard)
        .unwrap();
    let node_count = state.grid().node_count();
    *state.velocities_mut() = GridVelocities::uniform(node_count, Vec2::new(1.0, 0.0));

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, Cpdi2Plugin::<Dim2>::default()))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(20)))
        .insert_resource(state);
    for _ in 0..10 {
        app.update();
    }

    let state = app.world().resource::<Cpdi2State<Dim2>>();
    let particles = state.objects()[0].particles();
    assert!(particles.positions()[0].x > 2.125);
    assert_relative_eq!(particles.positions()[0].y, 2.125, epsilon = 1e-5);
    for (particle, domain) in particles.domains().iter().enumerate() {
        assert!(particles.positions()[particle].abs_diff_eq(domain.center(), 1e-6));
        assert!(particles.deformation_gradients()[particle].abs_diff_eq(Mat2::IDENTITY, 1e-5));
    }
}
