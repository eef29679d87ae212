//! Gizmo drawing of the world.
//!
//! The simulation lives on a y-down plane with its origin in the top-left
//! corner; the 2D camera sits at the plane's centre with y up. Everything
//! drawn goes through [`to_screen`].

use bevy::prelude::*;

use crate::game::config::{ViewConfig, ViewConfigHandle};
use crate::game::entity::Entity;
use crate::game::math::{point_to_world_space, world_transform, Aabb, Vector2D};
use crate::game::simulation::SimSet;
use crate::game::vehicle::VEHICLE_SHAPE;
use crate::game::world::GameWorld;

const WALL_COLOR: Color = Color::srgb(0.85, 0.85, 0.85);
const OBSTACLE_COLOR: Color = Color::srgb(0.6, 0.6, 0.6);
const VEHICLE_COLOR: Color = Color::srgb(0.3, 0.55, 1.0);
const SHARK_COLOR: Color = Color::srgb(1.0, 0.35, 0.25);
const NEIGHBOR_COLOR: Color = Color::srgb(0.2, 0.9, 0.3);
const CROSSHAIR_COLOR: Color = Color::srgb(1.0, 0.1, 0.1);
const FORCE_COLOR: Color = Color::srgb(1.0, 0.2, 0.2);
const FEELER_COLOR: Color = Color::srgb(1.0, 0.8, 0.2);
const DETECTION_COLOR: Color = Color::srgb(0.5, 0.5, 0.5);
const WANDER_COLOR: Color = Color::srgb(0.2, 0.9, 0.3);
const PATH_COLOR: Color = Color::srgb(0.9, 0.6, 0.1);
const CELL_COLOR: Color = Color::srgba(0.5, 0.5, 0.5, 0.35);

/// Length of a drawn wall normal.
const NORMAL_LENGTH: f64 = 5.0;
/// Drawn steering force length per unit of force.
const FORCE_SCALE: f64 = 0.1;
const CROSSHAIR_RADIUS: f32 = 4.0;
const CROSSHAIR_ARM: f64 = 8.0;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Overlays>()
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, apply_view_defaults.before(SimSet::Input))
            .add_systems(
                Update,
                (draw_walls_and_obstacles, draw_vehicles, draw_vehicle_debug, draw_world_markers, draw_cell_info)
                    .after(SimSet::Step),
            );
    }
}

/// Debug overlays currently switched on.
#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct Overlays {
    pub neighbors: bool,
    pub cell_info: bool,
    pub feelers: bool,
    pub detection_box: bool,
    pub wander_circle: bool,
    pub steering_force: bool,
    pub path: bool,
}

impl Overlays {
    fn from_config(config: &ViewConfig) -> Self {
        Self {
            neighbors: config.show_neighbors,
            cell_info: config.show_cell_info,
            feelers: config.show_feelers,
            detection_box: config.show_detection_box,
            wander_circle: config.show_wander_circle,
            steering_force: config.show_steering_force,
            path: config.show_path,
        }
    }
}

/// Simulation point to camera space.
pub fn to_screen(world_size: Vector2D, p: Vector2D) -> Vec2 {
    let v = (p - world_size * 0.5).to_vec2();
    Vec2::new(v.x, -v.y)
}

/// Camera space point to the simulation plane.
pub fn from_screen(world_size: Vector2D, p: Vec2) -> Vector2D {
    Vector2D::new(p.x as f64 + world_size.x / 2.0, world_size.y / 2.0 - p.y as f64)
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Resets the overlays whenever the view config is (re)loaded.
fn apply_view_defaults(
    config_handle: Option<Res<ViewConfigHandle>>,
    view_configs: Res<Assets<ViewConfig>>,
    mut events: MessageReader<AssetEvent<ViewConfig>>,
    mut overlays: ResMut<Overlays>,
) {
    let Some(config_handle) = config_handle else { return };
    for event in events.read() {
        if event.is_modified(config_handle.0.id()) || event.is_loaded_with_dependencies(config_handle.0.id()) {
            if let Some(config) = view_configs.get(&config_handle.0) {
                *overlays = Overlays::from_config(config);
                info!("Applied view config overlays: {:?}", *overlays);
            }
        }
    }
}

fn draw_walls_and_obstacles(world: Res<GameWorld>, mut gizmos: Gizmos) {
    let size = world.size();

    for wall in world.walls() {
        gizmos.line_2d(to_screen(size, wall.from()), to_screen(size, wall.to()), WALL_COLOR);
        let mid = wall.center();
        gizmos.line_2d(
            to_screen(size, mid),
            to_screen(size, mid + wall.normal() * NORMAL_LENGTH),
            WALL_COLOR,
        );
    }

    for obstacle in world.obstacles() {
        gizmos.circle_2d(to_screen(size, obstacle.pos()), obstacle.radius() as f32, OBSTACLE_COLOR);
    }
}

fn draw_vehicles(world: Res<GameWorld>, overlays: Res<Overlays>, mut gizmos: Gizmos) {
    let size = world.size();
    let default_scale = world.params().vehicle_scale;

    for vehicle in world.vehicles() {
        let heading = vehicle.render_heading();
        let hull = world_transform(&VEHICLE_SHAPE, vehicle.pos(), heading, heading.perp(), Some(vehicle.scale()));

        let color = if vehicle.scale().x > default_scale {
            SHARK_COLOR
        } else if overlays.neighbors && vehicle.is_tagged() {
            NEIGHBOR_COLOR
        } else {
            VEHICLE_COLOR
        };

        let first = hull.first().copied();
        gizmos.linestrip_2d(hull.into_iter().chain(first).map(|p| to_screen(size, p)), color);
    }

    if overlays.neighbors {
        if let Some(first) = world.vehicles().first() {
            let view = first.steering().view_distance() as f32;
            gizmos.circle_2d(to_screen(size, first.pos()), view, NEIGHBOR_COLOR);
        }
    }
}

/// Per-vehicle steering internals: force, feelers, detection box, wander
/// circle.
fn draw_vehicle_debug(world: Res<GameWorld>, overlays: Res<Overlays>, mut gizmos: Gizmos) {
    let size = world.size();

    for vehicle in world.vehicles() {
        let entity = vehicle.entity();
        let steering = vehicle.steering();
        let pos = entity.pos();

        if overlays.steering_force {
            let tip = pos + steering.force() * FORCE_SCALE;
            gizmos.line_2d(to_screen(size, pos), to_screen(size, tip), FORCE_COLOR);
        }

        if overlays.feelers && steering.is_wall_avoidance_on() {
            for &feeler in steering.feelers() {
                gizmos.line_2d(to_screen(size, pos), to_screen(size, feeler), FEELER_COLOR);
            }
        }

        if overlays.detection_box && steering.is_obstacle_avoidance_on() {
            let length = steering.detection_box_length();
            let half_width = entity.bounding_radius();
            let corners = [
                Vector2D::new(0.0, half_width),
                Vector2D::new(length, half_width),
                Vector2D::new(length, -half_width),
                Vector2D::new(0.0, -half_width),
                Vector2D::new(0.0, half_width),
            ];
            let outline = world_transform(&corners, pos, entity.heading(), entity.side(), None);
            gizmos.linestrip_2d(outline.into_iter().map(|p| to_screen(size, p)), DETECTION_COLOR);
        }

        if overlays.wander_circle && steering.is_wander_on() {
            let (heading, side) = (entity.heading(), entity.side());
            let ahead = Vector2D::new(steering.wander_distance(), 0.0);
            let center = point_to_world_space(ahead, heading, side, pos);
            let target = point_to_world_space(steering.wander_target() + ahead, heading, side, pos);

            gizmos.circle_2d(to_screen(size, center), steering.wander_radius() as f32, WANDER_COLOR);
            gizmos.circle_2d(to_screen(size, target), 0.5, FORCE_COLOR);
        }
    }
}

/// Crosshair and demo path.
fn draw_world_markers(world: Res<GameWorld>, overlays: Res<Overlays>, mut gizmos: Gizmos) {
    let size = world.size();

    let c = world.crosshair();
    gizmos.circle_2d(to_screen(size, c), CROSSHAIR_RADIUS, CROSSHAIR_COLOR);
    gizmos.line_2d(
        to_screen(size, c - Vector2D::new(CROSSHAIR_ARM, 0.0)),
        to_screen(size, c + Vector2D::new(CROSSHAIR_ARM, 0.0)),
        CROSSHAIR_COLOR,
    );
    gizmos.line_2d(
        to_screen(size, c - Vector2D::new(0.0, CROSSHAIR_ARM)),
        to_screen(size, c + Vector2D::new(0.0, CROSSHAIR_ARM)),
        CROSSHAIR_COLOR,
    );

    if world.show_path() || overlays.path {
        let path = world.path();
        let closing = path.is_looped().then(|| path.waypoints().first().copied()).flatten();
        let points = path.waypoints().iter().copied().chain(closing).map(|p| to_screen(size, p));
        gizmos.linestrip_2d(points, PATH_COLOR);
    }
}

/// Grid cells, plus the neighbourhood query of the first vehicle.
fn draw_cell_info(mut world: ResMut<GameWorld>, overlays: Res<Overlays>, mut gizmos: Gizmos) {
    if !overlays.cell_info {
        return;
    }
    let size = world.size();

    for cell in world.grid().cells() {
        draw_box(&mut gizmos, size, &cell.bbox, CELL_COLOR);
    }

    let Some((pos, view)) = world
        .vehicles()
        .first()
        .map(|v| (v.pos(), v.steering().view_distance()))
    else {
        return;
    };

    draw_box(&mut gizmos, size, &Aabb::around(pos, view), WALL_COLOR);
    gizmos.circle_2d(to_screen(size, pos), view as f32, NEIGHBOR_COLOR);

    let neighbors = world.grid_mut().calculate_neighbors(pos, view).to_vec();
    for id in neighbors {
        if let Some(v) = world.vehicle(id) {
            gizmos.circle_2d(to_screen(size, v.pos()), v.bounding_radius() as f32, CROSSHAIR_COLOR);
        }
    }
}

fn draw_box(gizmos: &mut Gizmos, size: Vector2D, bbox: &Aabb, color: Color) {
    let corners = [
        Vector2D::new(bbox.left(), bbox.top()),
        Vector2D::new(bbox.right(), bbox.top()),
        Vector2D::new(bbox.right(), bbox.bottom()),
        Vector2D::new(bbox.left(), bbox.bottom()),
        Vector2D::new(bbox.left(), bbox.top()),
    ];
    gizmos.linestrip_2d(corners.into_iter().map(|p| to_screen(size, p)), color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_corners_map_to_camera_space() {
        let size = Vector2D::new(1280.0, 720.0);
        assert_eq!(to_screen(size, Vector2D::ZERO), Vec2::new(-640.0, 360.0));
        assert_eq!(to_screen(size, size), Vec2::new(640.0, -360.0));
        assert_eq!(to_screen(size, size * 0.5), Vec2::ZERO);
    }

    #[test]
    fn test_screen_mapping_inverts() {
        let size = Vector2D::new(400.0, 200.0);
        let p = Vector2D::new(37.0, 151.0);
        assert_eq!(from_screen(size, to_screen(size, p)), p);
    }
}
