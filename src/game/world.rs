use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::config::Params;
use crate::game::entity::{enforce_non_penetration_constraint, overlapped, Entity, MovingEntity};
use crate::game::error::SteeringResult;
use crate::game::math::{point_in_circle, Vector2D, TWO_PI};
use crate::game::obstacle::Obstacle;
use crate::game::path::Path;
use crate::game::smoother::Smoother;
use crate::game::spatial_grid::SpatialGrid;
use crate::game::steering::{SteeringBehavior, SteeringContext, SummingMethod};
use crate::game::vehicle::{Vehicle, VehicleId};
use crate::game::wall::Wall2D;

// ============================================================================
// Layout constants
// ============================================================================

/// Samples in the frame-time moving average.
pub const FRAME_TIME_SAMPLES: usize = 10;

const INITIAL_PATH_WAYPOINTS: usize = 5;
const INITIAL_PATH_BORDER: f64 = 30.0;
const RANDOM_PATH_BORDER: f64 = 60.0;
const RANDOM_PATH_WAYPOINTS: std::ops::RangeInclusive<usize> = 3..=7;

const WALL_BORDER: f64 = 20.0;
/// Fraction of each side cut off to bevel the enclosure's corners.
const WALL_CORNER: f64 = 0.2;

const OBSTACLE_BORDER: f64 = 10.0;
const OBSTACLE_MIN_GAP: f64 = 20.0;
/// Keeps obstacles clear of the strip at the bottom of the window.
const OBSTACLE_BOTTOM_MARGIN: f64 = 30.0;
const OBSTACLE_MAX_TRIES: usize = 2000;

const SHARK_SCALE: f64 = 10.0;
const SHARK_MAX_SPEED: f64 = 70.0;

/// Runtime tuning never takes max force or max speed below this.
const MIN_TUNABLE: f64 = 0.2;

/// Owns everything in the simulation and steps it one frame at a time.
///
/// Vehicles are addressed by [`VehicleId`], which is their index in
/// [`GameWorld::vehicles`]. During [`GameWorld::update`] every vehicle reads
/// a snapshot of the others taken at the start of the frame, and the spatial
/// grid still holds start-of-frame positions until every vehicle has moved,
/// so the order they are updated in does not change what they see.
#[derive(Resource)]
pub struct GameWorld {
    params: Params,
    vehicles: Vec<Vehicle>,
    obstacles: Vec<Obstacle>,
    walls: Vec<Wall2D>,
    grid: SpatialGrid<VehicleId>,
    path: Path,
    crosshair: Vector2D,

    paused: bool,
    obstacles_on: bool,
    walls_on: bool,
    show_path: bool,
    space_partitioning: bool,
    smoothing: bool,
    non_penetration: bool,
    summing_method: SummingMethod,

    frame_smoother: Smoother<f64>,
    avg_frame_time: f64,
    frame: u64,
    rng: StdRng,
}

impl GameWorld {
    /// An empty world sized by `params`, with the crosshair in the middle and
    /// a five-waypoint looped demo path.
    pub fn new(params: Params) -> Self {
        let mut rng = params.rng();
        let width = params.world_width;
        let height = params.world_height;

        let path = Path::random(
            &mut rng,
            INITIAL_PATH_WAYPOINTS,
            Vector2D::new(INITIAL_PATH_BORDER, INITIAL_PATH_BORDER),
            Vector2D::new(width - INITIAL_PATH_BORDER, height - INITIAL_PATH_BORDER),
            true,
        );

        Self {
            grid: SpatialGrid::new(width, height, params.num_cells_x, params.num_cells_y, params.num_agents),
            vehicles: Vec::with_capacity(params.num_agents),
            obstacles: Vec::new(),
            walls: Vec::new(),
            path,
            crosshair: Vector2D::new(width / 2.0, height / 2.0),
            paused: false,
            obstacles_on: false,
            walls_on: false,
            show_path: false,
            space_partitioning: false,
            smoothing: false,
            non_penetration: false,
            summing_method: SummingMethod::default(),
            frame_smoother: Smoother::new(FRAME_TIME_SAMPLES, 0.0),
            avg_frame_time: 0.0,
            frame: 0,
            rng,
            params,
        }
    }

    /// Adds a vehicle at rest at `pos`, facing `rotation` radians clockwise
    /// from up, with every behaviour off. It inherits the world's current
    /// summing method, partitioning and smoothing settings.
    pub fn spawn_vehicle(&mut self, pos: Vector2D, rotation: f64) -> VehicleId {
        let id = VehicleId(self.vehicles.len());
        let p = &self.params;

        let mut entity = MovingEntity::new(
            pos,
            p.vehicle_scale,
            Vector2D::ZERO,
            Vector2D::new(rotation.sin(), -rotation.cos()),
            p.vehicle_mass,
            p.max_speed,
            p.max_force(),
            p.max_turn_rate_per_second,
        );
        entity.base.scale = Vector2D::new(p.vehicle_scale, p.vehicle_scale);

        let mut steering = SteeringBehavior::from_params(p, StdRng::seed_from_u64(self.rng.random()));
        steering.set_summing_method(self.summing_method);
        steering.set_space_partitioning(self.space_partitioning);

        let mut vehicle = Vehicle::new(id, entity, steering, p.num_samples_for_smoothing);
        if self.smoothing {
            vehicle.toggle_smoothing();
        }

        self.grid.insert(id, pos);
        self.vehicles.push(vehicle);
        debug!("Spawned vehicle {} at ({:.1}, {:.1})", id.0, pos.x, pos.y);
        id
    }

    /// The classic demo: `num_agents - 1` flocking vehicles scattered over
    /// the plane, all evading one large, slow, wandering shark (the last
    /// vehicle). Returns the shark's id, or `None` when no agents are
    /// configured.
    pub fn populate_shoal(&mut self) -> Option<VehicleId> {
        let half = Vector2D::new(self.params.world_width / 2.0, self.params.world_height / 2.0);

        for _ in 0..self.params.num_agents {
            let jitter = Vector2D::new(self.random_clamped(), self.random_clamped());
            let pos = half + Vector2D::new(jitter.x * half.x, jitter.y * half.y);
            let rotation = self.rng.random::<f64>() * TWO_PI;
            let id = self.spawn_vehicle(pos, rotation);
            self.vehicles[id.0].steering_mut().flocking_on();
        }

        let shark = VehicleId(self.vehicles.len().checked_sub(1)?);
        {
            let vehicle = &mut self.vehicles[shark.0];
            vehicle.steering_mut().flocking_off();
            vehicle.steering_mut().wander_on();
            vehicle.set_scale(Vector2D::new(SHARK_SCALE, SHARK_SCALE));
            vehicle.entity_mut().max_speed = SHARK_MAX_SPEED;
        }

        for vehicle in self.vehicles.iter_mut().filter(|v| v.id() != shark) {
            vehicle.steering_mut().evade_on(shark);
        }

        info!("Populated shoal: {} vehicles, shark is {}", self.vehicles.len(), shark.0);
        Some(shark)
    }

    /// Replaces the walls with a bevelled eight-sided enclosure just inside
    /// the world bounds. Normals face inwards.
    pub fn create_walls(&mut self) {
        let w = self.params.world_width;
        let h = self.params.world_height;
        let b = WALL_BORDER;
        let v_dist = h - 2.0 * b;
        let h_dist = w - 2.0 * b;

        let corners = [
            Vector2D::new(h_dist * WALL_CORNER + b, b),
            Vector2D::new(w - b - h_dist * WALL_CORNER, b),
            Vector2D::new(w - b, b + v_dist * WALL_CORNER),
            Vector2D::new(w - b, h - b - v_dist * WALL_CORNER),
            Vector2D::new(w - b - h_dist * WALL_CORNER, h - b),
            Vector2D::new(h_dist * WALL_CORNER + b, h - b),
            Vector2D::new(b, h - b - v_dist * WALL_CORNER),
            Vector2D::new(b, b + v_dist * WALL_CORNER),
        ];

        self.walls = corners
            .iter()
            .zip(corners.iter().cycle().skip(1))
            .map(|(&from, &to)| Wall2D::new(from, to))
            .collect();
    }

    /// Scatters up to `num_obstacles` discs that keep a minimum gap from
    /// each other and from the window edges. Gives up on the remaining
    /// obstacles once one of them fails to fit after a bounded number of
    /// tries.
    pub fn create_obstacles(&mut self) {
        let p = &self.params;
        let (min_r, max_r) = (p.min_obstacle_radius.floor() as i64, p.max_obstacle_radius.floor() as i64);
        let (w, h) = (p.world_width as i64, p.world_height as i64);
        let border = OBSTACLE_BORDER as i64;
        let bottom = OBSTACLE_BOTTOM_MARGIN as i64;

        for _ in 0..p.num_obstacles {
            let placed = (0..OBSTACLE_MAX_TRIES).find_map(|_| {
                let radius = self.rng.random_range(min_r..=max_r);
                let (lo_x, hi_x) = (radius + border, w - radius - border);
                let (lo_y, hi_y) = (radius + border, h - radius - bottom - border);
                if lo_x > hi_x || lo_y > hi_y {
                    return None;
                }

                let pos = Vector2D::new(
                    self.rng.random_range(lo_x..=hi_x) as f64,
                    self.rng.random_range(lo_y..=hi_y) as f64,
                );
                let candidate = Obstacle::new(pos, radius as f64);
                (!overlapped(&candidate, &self.obstacles, OBSTACLE_MIN_GAP)).then_some(candidate)
            });

            match placed {
                Some(obstacle) => self.obstacles.push(obstacle),
                None => {
                    warn!(
                        "Placed only {} of {} obstacles: no room left",
                        self.obstacles.len(),
                        self.params.num_obstacles
                    );
                    return;
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------------

    /// Steps every vehicle by `time_elapsed` seconds. Does nothing while
    /// paused.
    ///
    /// # Errors
    /// Propagates the first [`SteeringError`](crate::game::error::SteeringError)
    /// a vehicle's steering reports. Vehicles before it in the frame have
    /// already moved and are re-indexed in the grid; the frame counter does not
    /// advance.
    pub fn update(&mut self, time_elapsed: f64) -> SteeringResult<()> {
        if self.paused {
            return Ok(());
        }

        self.avg_frame_time = self.frame_smoother.update(time_elapsed);

        let mut snapshot: Vec<MovingEntity> = self.vehicles.iter().map(|v| v.entity().clone()).collect();
        let world_size = Vector2D::new(self.params.world_width, self.params.world_height);
        let mut outcome = Ok(());

        for vehicle in self.vehicles.iter_mut() {
            let mut ctx = SteeringContext {
                agents: &mut snapshot,
                obstacles: &mut self.obstacles,
                walls: &self.walls,
                grid: &mut self.grid,
                crosshair: self.crosshair,
                world_size,
            };
            if let Err(err) = vehicle.update(time_elapsed, &mut ctx) {
                outcome = Err(err);
                break;
            }

            if self.non_penetration {
                enforce_non_penetration_constraint(vehicle.entity_mut(), &snapshot);
            }
        }

        for (vehicle, seen) in self.vehicles.iter_mut().zip(&snapshot) {
            vehicle.set_tagged(seen.is_tagged());
            if vehicle.steering().is_space_partitioning_on() {
                self.grid.relocate(vehicle.id(), seen.pos(), vehicle.pos());
            }
        }

        outcome?;
        self.frame += 1;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Toggles
    // ------------------------------------------------------------------------

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Adds obstacles and switches obstacle avoidance on for everyone, or
    /// removes them and switches it off.
    pub fn toggle_obstacles(&mut self) {
        self.obstacles_on = !self.obstacles_on;
        self.obstacles.clear();
        if self.obstacles_on {
            self.create_obstacles();
        }
        for vehicle in &mut self.vehicles {
            if self.obstacles_on {
                vehicle.steering_mut().obstacle_avoidance_on();
            } else {
                vehicle.steering_mut().obstacle_avoidance_off();
            }
        }
        info!("Obstacles {} ({} placed)", on_off(self.obstacles_on), self.obstacles.len());
    }

    /// Builds the enclosure and switches wall avoidance on for everyone, or
    /// tears it down and switches it off.
    pub fn toggle_walls(&mut self) {
        self.walls_on = !self.walls_on;
        if self.walls_on {
            self.create_walls();
        } else {
            self.walls.clear();
        }
        for vehicle in &mut self.vehicles {
            if self.walls_on {
                vehicle.steering_mut().wall_avoidance_on();
            } else {
                vehicle.steering_mut().wall_avoidance_off();
            }
        }
        info!("Walls {}", on_off(self.walls_on));
    }

    /// Flips partitioning for every vehicle. Switching it on rebuilds the
    /// grid from current positions, since it is not maintained while off.
    pub fn toggle_space_partitioning(&mut self) {
        self.space_partitioning = !self.space_partitioning;
        for vehicle in &mut self.vehicles {
            vehicle.steering_mut().set_space_partitioning(self.space_partitioning);
        }

        if self.space_partitioning {
            self.grid.clear();
            for vehicle in &self.vehicles {
                self.grid.insert(vehicle.id(), vehicle.pos());
            }
        }
        info!("Space partitioning {}", on_off(self.space_partitioning));
    }

    pub fn set_summing_method(&mut self, method: SummingMethod) {
        self.summing_method = method;
        for vehicle in &mut self.vehicles {
            vehicle.steering_mut().set_summing_method(method);
        }
        info!("Summing method: {:?}", method);
    }

    pub fn toggle_smoothing(&mut self) {
        self.smoothing = !self.smoothing;
        for vehicle in &mut self.vehicles {
            if vehicle.is_smoothing_on() != self.smoothing {
                vehicle.toggle_smoothing();
            }
        }
        info!("Heading smoothing {}", on_off(self.smoothing));
    }

    pub fn toggle_non_penetration(&mut self) {
        self.non_penetration = !self.non_penetration;
        info!("Non-penetration constraint {}", on_off(self.non_penetration));
    }

    /// Generates a fresh looped path of three to seven waypoints, hands it to
    /// every vehicle and makes it visible.
    pub fn new_random_path(&mut self) {
        let num_waypoints = self.rng.random_range(RANDOM_PATH_WAYPOINTS);
        let w = self.params.world_width;
        let h = self.params.world_height;
        self.path.create_random_path(
            &mut self.rng,
            num_waypoints,
            Vector2D::new(RANDOM_PATH_BORDER, RANDOM_PATH_BORDER),
            Vector2D::new(w - RANDOM_PATH_BORDER, h - RANDOM_PATH_BORDER),
        );
        self.show_path = true;

        for vehicle in &mut self.vehicles {
            vehicle.steering_mut().set_path(self.path.waypoints());
        }
        debug!("New path with {} waypoints", num_waypoints);
    }

    /// Moves the crosshair unless `pos` lies inside an obstacle. Returns
    /// whether it moved.
    pub fn set_crosshair(&mut self, pos: Vector2D) -> bool {
        if self.obstacles.iter().any(|ob| point_in_circle(ob.pos(), ob.bounding_radius(), pos)) {
            return false;
        }
        self.crosshair = pos;
        true
    }

    /// Changes every vehicle's max force by `delta`, never below zero. A
    /// decrease is ignored for vehicles already at the floor.
    pub fn adjust_max_force(&mut self, delta: f64) {
        for vehicle in &mut self.vehicles {
            let entity = vehicle.entity_mut();
            entity.max_force = tuned(entity.max_force, delta);
        }
    }

    /// Changes every vehicle's max speed by `delta`, never below zero. A
    /// decrease is ignored for vehicles already at the floor.
    pub fn adjust_max_speed(&mut self, delta: f64) {
        for vehicle in &mut self.vehicles {
            let entity = vehicle.entity_mut();
            entity.max_speed = tuned(entity.max_speed, delta);
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id.0)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Replaces the obstacle set. Used by scenarios that need exact layouts.
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
    }

    pub fn walls(&self) -> &[Wall2D] {
        &self.walls
    }

    pub fn grid(&self) -> &SpatialGrid<VehicleId> {
        &self.grid
    }

    /// Mutable grid access for neighbour queries outside the frame step.
    pub fn grid_mut(&mut self) -> &mut SpatialGrid<VehicleId> {
        &mut self.grid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn crosshair(&self) -> Vector2D {
        self.crosshair
    }

    pub fn size(&self) -> Vector2D {
        Vector2D::new(self.params.world_width, self.params.world_height)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn obstacles_on(&self) -> bool {
        self.obstacles_on
    }

    pub fn walls_on(&self) -> bool {
        self.walls_on
    }

    pub fn show_path(&self) -> bool {
        self.show_path
    }

    pub fn is_space_partitioning_on(&self) -> bool {
        self.space_partitioning
    }

    pub fn is_smoothing_on(&self) -> bool {
        self.smoothing
    }

    pub fn is_non_penetration_on(&self) -> bool {
        self.non_penetration
    }

    pub fn summing_method(&self) -> SummingMethod {
        self.summing_method
    }

    /// Smoothed seconds per frame, for display only.
    pub fn avg_frame_time(&self) -> f64 {
        self.avg_frame_time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn random_clamped(&mut self) -> f64 {
        self.rng.random::<f64>() - self.rng.random::<f64>()
    }
}

fn tuned(current: f64, delta: f64) -> f64 {
    if delta < 0.0 && current <= MIN_TUNABLE {
        return current;
    }
    (current + delta).max(0.0)
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
