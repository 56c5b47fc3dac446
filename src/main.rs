use std::time::Duration;

use bevy::ecs::error::BevyError;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::Rng;

use cpdi2::{
    Cpdi2Params, Cpdi2Plugin, Cpdi2State, Cpdi2Systems, Dim2, DomainMesh, Grid, GridVelocities,
    ParticleSet, QuadraticBSpline, UpdateMode, VolumetricMesh,
};

const GRID_RESOLUTION: i32 = 64;
const CELL_WIDTH: f32 = 1.0 / 32.0;
const BLOCK: IVec2 = IVec2::new(12, 12);
const STEPS: usize = 120;
const ANGULAR_VELOCITY: f32 = 0.5;
const JITTER: f32 = 0.01;

fn setup_blocks(mut commands: Commands) -> Result<(), BevyError> {
    let grid = Grid::<Dim2>::new(Vec2::ZERO, CELL_WIDTH, IVec2::splat(GRID_RESOLUTION));
    let mut state = Cpdi2State::new(grid, QuadraticBSpline, Cpdi2Params::default());

    // Left block: plain CPDI2, bottom row pinned
    let mut left = ParticleSet::lattice(Vec2::new(0.4, 0.8), CELL_WIDTH, BLOCK);
    for particle in 0..BLOCK.x as usize {
        left.set_dirichlet(particle, true);
    }
    state.add_object(left, UpdateMode::Standard)?;

    // Right block: enriched along its vertical midline
    let right = ParticleSet::lattice(Vec2::new(1.2, 0.8), CELL_WIDTH, BLOCK);
    let mesh = DomainMesh::lattice::<Dim2>(BLOCK);
    let columns = BLOCK.x as usize + 1;
    let enriched_vertices = (0..mesh.vertex_count())
        .map(|vertex| vertex % columns == columns / 2)
        .collect();
    state.add_object(
        right,
        UpdateMode::Enriched {
            mesh,
            enriched_vertices,
        },
    )?;

    info!(
        "CPDI2 demo: {} particles on a {}x{} grid",
        state.particle_count(),
        GRID_RESOLUTION,
        GRID_RESOLUTION
    );
    commands.insert_resource(state);
    Ok(())
}

/// Stand-in for a grid solve: slow rotation about the domain center plus noise.
fn drive_grid_velocities(mut state: ResMut<Cpdi2State<Dim2>>) {
    let center = Vec2::splat(0.5 * GRID_RESOLUTION as f32 * CELL_WIDTH);
    let mut rng = rand::rng();
    let field = GridVelocities::from_fn(state.grid(), |x| {
        let r = x - center;
        let jitter = Vec2::new(rng.random_range(-JITTER..JITTER), rng.random_range(-JITTER..JITTER));
        Vec2::new(-r.y, r.x) * ANGULAR_VELOCITY + jitter
    });
    *state.velocities_mut() = field;
}

fn main() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default(), Cpdi2Plugin::<Dim2>::default()))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)))
        .add_systems(Startup, setup_blocks)
        .add_systems(
            FixedUpdate,
            drive_grid_velocities
                .before(Cpdi2Systems)
                .run_if(resource_exists::<Cpdi2State<Dim2>>),
        );

    app.finish();
    app.cleanup();
    for _ in 0..STEPS {
        app.update();
    }

    let state = app.world().resource::<Cpdi2State<Dim2>>();
    for (index, object) in state.objects().iter().enumerate() {
        let particles = object.particles();
        let min_det = particles
            .deformation_gradients()
            .iter()
            .map(|f| f.determinant())
            .fold(f32::INFINITY, f32::min);
        let volume: f32 = particles.volumes().iter().sum();
        info!(
            "object {}: {} particles, total volume {:.5}, min det F {:.4}",
            index,
            particles.len(),
            volume,
            min_det
        );
    }
}
