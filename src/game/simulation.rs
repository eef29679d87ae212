use bevy::prelude::*;
use steering_macros::profile;

use crate::game::config::Params;
use crate::game::world::GameWorld;
use crate::profile_log;

pub struct SimulationPlugin;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Input, // Keyboard and mouse edits to the world
    Step,  // Advancing vehicles
}

/// Frames stepped so far. Mirrors [`GameWorld::frame`] for systems that
/// only need the count.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct SimFrame(pub u64);

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimFrame>();

        app.configure_sets(Update, (SimSet::Input, SimSet::Step).chain());

        app.add_systems(Startup, setup_world);
        app.add_systems(Update, (step_world, log_sim_status).chain().in_set(SimSet::Step));
    }
}

/// Builds the demo shoal from the startup parameters.
fn setup_world(mut commands: Commands, params: Res<Params>) {
    let mut world = GameWorld::new(params.clone());
    world.populate_shoal();
    info!(
        "World ready: {}x{}, {} vehicles, {}x{} cells",
        params.world_width,
        params.world_height,
        world.vehicles().len(),
        params.num_cells_x,
        params.num_cells_y
    );
    commands.insert_resource(world);
}

/// Advances the world by the frame's wall-clock delta. A steering error
/// pauses the simulation instead of skipping the rest of the frame.
#[profile(16)]
pub fn step_world(time: Res<Time>, mut world: ResMut<GameWorld>, mut frame: ResMut<SimFrame>) {
    if let Err(err) = world.update(time.delta_secs_f64()) {
        error!("Simulation halted at frame {}: {}", world.frame(), err);
        world.set_paused(true);
    }
    frame.0 = world.frame();
}

/// Log simulation status periodically
pub fn log_sim_status(
    #[allow(unused_variables)] tick: Res<SimFrame>,
    #[allow(unused_variables)] world: Res<GameWorld>,
) {
    profile_log!(
        tick,
        "[SIM STATUS] Frame: {} | Vehicles: {} | Avg frame: {:.2}ms | Partitioning: {}",
        tick.0,
        world.vehicles().len(),
        world.avg_frame_time() * 1000.0,
        world.is_space_partitioning_on()
    );
}
