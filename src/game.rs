use bevy::prelude::*;

pub mod config;
pub mod entity;
pub mod error;
pub mod math;
pub mod obstacle;
pub mod path;
pub mod smoother;
pub mod spatial_grid;
pub mod steering;
pub mod vehicle;
pub mod wall;
pub mod world;

pub mod control;
pub mod render;
pub mod simulation;

use config::ViewConfigPlugin;
use control::ControlPlugin;
use render::RenderPlugin;
use simulation::SimulationPlugin;

/// Everything the windowed demo needs on top of `DefaultPlugins`. Expects a
/// [`config::Params`] resource to be inserted before the app runs.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((ViewConfigPlugin, SimulationPlugin, RenderPlugin, ControlPlugin));
    }
}
