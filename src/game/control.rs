use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::game::config::{ViewConfig, ViewConfigHandle};
use crate::game::render::{from_screen, Overlays};
use crate::game::simulation::SimSet;
use crate::game::steering::SummingMethod;
use crate::game::world::GameWorld;

/// Max force change per second while a tuning key is held.
const MAX_FORCE_RATE: f64 = 1000.0;
/// Max speed change per second while a tuning key is held.
const MAX_SPEED_RATE: f64 = 50.0;

pub struct ControlPlugin;

impl Plugin for ControlPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (handle_world_keys, handle_tuning_keys, handle_overlay_keys, handle_crosshair_click).in_set(SimSet::Input),
        );
    }
}

/// One-shot world toggles.
fn handle_world_keys(
    keys: Res<ButtonInput<KeyCode>>,
    config_handle: Res<ViewConfigHandle>,
    view_configs: Res<Assets<ViewConfig>>,
    mut world: ResMut<GameWorld>,
) {
    let Some(config) = view_configs.get(&config_handle.0) else { return };

    if keys.just_pressed(config.key_pause) {
        world.toggle_pause();
    }
    if keys.just_pressed(config.key_toggle_obstacles) {
        world.toggle_obstacles();
    }
    if keys.just_pressed(config.key_toggle_walls) {
        world.toggle_walls();
    }
    if keys.just_pressed(config.key_new_path) {
        world.new_random_path();
    }
    if keys.just_pressed(config.key_toggle_smoothing) {
        world.toggle_smoothing();
    }
    if keys.just_pressed(config.key_toggle_partitioning) {
        world.toggle_space_partitioning();
    }
    if keys.just_pressed(config.key_toggle_non_penetration) {
        world.toggle_non_penetration();
    }

    let method = [
        (config.key_weighted_sum, SummingMethod::WeightedAverage),
        (config.key_prioritized, SummingMethod::Prioritized),
        (config.key_dithered, SummingMethod::Dithered),
    ]
    .into_iter()
    .find_map(|(key, method)| keys.just_pressed(key).then_some(method));

    if let Some(method) = method {
        world.set_summing_method(method);
    }
}

/// Held keys nudge max force and max speed for every vehicle.
fn handle_tuning_keys(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    config_handle: Res<ViewConfigHandle>,
    view_configs: Res<Assets<ViewConfig>>,
    mut world: ResMut<GameWorld>,
) {
    let Some(config) = view_configs.get(&config_handle.0) else { return };
    let dt = time.delta_secs_f64();

    if keys.pressed(config.key_max_force_up) {
        world.adjust_max_force(MAX_FORCE_RATE * dt);
    }
    if keys.pressed(config.key_max_force_down) {
        world.adjust_max_force(-MAX_FORCE_RATE * dt);
    }
    if keys.pressed(config.key_max_speed_up) {
        world.adjust_max_speed(MAX_SPEED_RATE * dt);
    }
    if keys.pressed(config.key_max_speed_down) {
        world.adjust_max_speed(-MAX_SPEED_RATE * dt);
    }
}

fn handle_overlay_keys(
    keys: Res<ButtonInput<KeyCode>>,
    config_handle: Res<ViewConfigHandle>,
    view_configs: Res<Assets<ViewConfig>>,
    mut overlays: ResMut<Overlays>,
) {
    let Some(config) = view_configs.get(&config_handle.0) else { return };
    let overlays = &mut *overlays;

    let toggles = [
        (config.key_toggle_neighbors, &mut overlays.neighbors),
        (config.key_toggle_cell_info, &mut overlays.cell_info),
        (config.key_toggle_feelers, &mut overlays.feelers),
        (config.key_toggle_detection_box, &mut overlays.detection_box),
        (config.key_toggle_wander_circle, &mut overlays.wander_circle),
        (config.key_toggle_steering_force, &mut overlays.steering_force),
        (config.key_toggle_path, &mut overlays.path),
    ];

    for (key, flag) in toggles {
        if keys.just_pressed(key) {
            *flag = !*flag;
            debug!("Overlay bound to {:?} is now {}", key, *flag);
        }
    }
}

/// Right click moves the crosshair, unless the click lands in an obstacle.
fn handle_crosshair_click(
    mouse_button: Res<ButtonInput<MouseButton>>,
    q_window: Query<&Window, With<PrimaryWindow>>,
    q_camera: Query<(&Camera, &GlobalTransform)>,
    mut world: ResMut<GameWorld>,
) {
    if !mouse_button.just_pressed(MouseButton::Right) {
        return;
    }
    let Ok(window) = q_window.single() else { return };
    let Some(cursor_position) = window.cursor_position() else { return };
    let Some((camera, camera_transform)) = q_camera.iter().next() else { return };
    let Ok(point) = camera.viewport_to_world_2d(camera_transform, cursor_position) else { return };

    let target = from_screen(world.size(), point);
    if !world.set_crosshair(target) {
        debug!("Crosshair refused inside an obstacle at ({:.1}, {:.1})", target.x, target.y);
    }
}
