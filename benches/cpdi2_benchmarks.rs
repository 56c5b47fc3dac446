/// Simple custom benchmarking without criterion
use std::time::Instant;

use bevy::prelude::*;
use cpdi2::{
    Cpdi2Params, Cpdi2State, Dim2, Dim3, DomainMesh, Grid, GridVelocities, ParticleSet, QuadraticBSpline,
    UpdateMode, VolumetricMesh,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn time_it<F: FnMut()>(name: &str, iterations: usize, mut f: F) {
    // Warmup
    for _ in 0..5 {
        f();
    }

    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    let elapsed = start.elapsed();

    let avg_ms = elapsed.as_secs_f64() * 1000.0 / iterations as f64;
    println!("{}: {:.3}ms avg ({} iterations)", name, avg_ms, iterations);
}

fn noisy_field_2d(grid: &Grid<Dim2>, rng: &mut StdRng) -> GridVelocities<Dim2> {
    GridVelocities::from_fn(grid, |_| Vec2::new(rng.random_range(-0.1..0.1), rng.random_range(-0.1..0.1)))
}

fn state_2d(side: i32, mode: impl Fn(IVec2) -> UpdateMode) -> Cpdi2State<Dim2> {
    let cell = 1.0 / 128.0;
    let grid = Grid::<Dim2>::with_resolution(cell, IVec2::splat(256));
    let mut state = Cpdi2State::new(grid, QuadraticBSpline, Cpdi2Params::default().with_volume_update(false));
    let counts = IVec2::splat(side);
    state
        .add_object(ParticleSet::lattice(Vec2::splat(0.5), cell * 0.5, counts), mode(counts))
        .unwrap();
    state
}

fn main() {
    println!("\n=== CPDI2 Benchmarks ===\n");
    let mut rng = StdRng::seed_from_u64(7);

    println!("--- 2D step, standard ---");
    for &side in &[32, 64, 128] {
        let mut state = state_2d(side, |_| UpdateMode::Standard);
        let field = noisy_field_2d(state.grid(), &mut rng);
        *state.velocities_mut() = field;
        time_it(&format!("step (n={})", side * side), 20, || {
            state.step(1.0e-4).unwrap();
        });
    }

    println!("\n--- 2D step, enriched ---");
    for &side in &[32, 64, 128] {
        let mut state = state_2d(side, |counts| {
            let mesh = DomainMesh::lattice::<Dim2>(counts);
            let columns = counts.x as usize + 1;
            let enriched_vertices = (0..mesh.vertex_count())
                .map(|vertex| vertex % columns == columns / 2)
                .collect();
            UpdateMode::Enriched {
                mesh,
                enriched_vertices,
            }
        });
        let field = noisy_field_2d(state.grid(), &mut rng);
        *state.velocities_mut() = field;
        time_it(&format!("step (n={})", side * side), 20, || {
            state.step(1.0e-4).unwrap();
        });
    }

    println!("\n--- 3D stages ---");
    let grid = Grid::<Dim3>::with_resolution(1.0 / 64.0, IVec3::splat(96));
    let mut state = Cpdi2State::new(grid, QuadraticBSpline, Cpdi2Params::default());
    state
        .add_object(
            ParticleSet::lattice(Vec3::splat(0.5), 1.0 / 128.0, IVec3::splat(24)),
            UpdateMode::Standard,
        )
        .unwrap();
    time_it("update_interpolation_weights (n=13824)", 10, || {
        state.update_interpolation_weights().unwrap();
    });
    time_it("update_deformation_gradients (n=13824)", 10, || {
        state.update_deformation_gradients().unwrap();
    });
    time_it("step (n=13824)", 10, || {
        state.step(1.0e-4).unwrap();
    });
}
