use rand::Rng;

use crate::game::entity::{tag_neighbors, Entity, MovingEntity};
use crate::game::math::{
    line_intersection_2d, point_to_local_space, point_to_world_space, rotate_around_origin,
    vector_to_world_space, Vector2D, HALF_PI,
};
use crate::game::obstacle::Obstacle;
use crate::game::wall::Wall2D;

use super::{Deceleration, SteeringBehavior};

/// Scales how early Arrive starts braking.
pub const DECELERATION_TWEAKER: f64 = 0.3;

/// Share of the obstacle-avoidance force spent slowing down.
pub const BRAKING_WEIGHT: f64 = 0.2;

/// How far past an obstacle's rim a hiding spot is placed.
pub const HIDING_DISTANCE_FROM_BOUNDARY: f64 = 30.0;

/// Heading dot product below which an evader counts as coming straight at
/// the pursuer (about 18 degrees off head-on).
pub const HEAD_ON_DOT: f64 = -0.95;

/// Rotations of the two side feelers relative to the heading.
pub const SIDE_FEELER_ANGLES: [f64; 2] = [HALF_PI * 3.5, HALF_PI * 0.5];

/// Time needed to close `distance` at `closing_speed`, zero when neither
/// party can move.
fn look_ahead_time(distance: f64, closing_speed: f64) -> f64 {
    if closing_speed > f64::EPSILON {
        distance / closing_speed
    } else {
        0.0
    }
}

/// Uniform-ish sample in [-1, 1], peaked at 0.
fn random_clamped<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random::<f64>() - rng.random::<f64>()
}

pub fn seek(agent: &MovingEntity, target: Vector2D) -> Vector2D {
    let desired = (target - agent.pos()).normalized() * agent.max_speed;
    desired - agent.velocity
}

pub fn flee(agent: &MovingEntity, target: Vector2D) -> Vector2D {
    let desired = (agent.pos() - target).normalized() * agent.max_speed;
    desired - agent.velocity
}

/// Seek that slows down proportionally to the remaining distance. Zero once
/// the agent sits exactly on the target.
pub fn arrive(agent: &MovingEntity, target: Vector2D, deceleration: Deceleration) -> Vector2D {
    let to_target = target - agent.pos();
    let dist = to_target.length();
    if dist <= 0.0 {
        return Vector2D::ZERO;
    }

    let speed = (dist / (deceleration.factor() * DECELERATION_TWEAKER)).min(agent.max_speed);
    let desired = to_target * (speed / dist);
    desired - agent.velocity
}

pub fn pursuit(agent: &MovingEntity, evader: &MovingEntity) -> Vector2D {
    let to_evader = evader.pos() - agent.pos();
    let relative_heading = agent.heading().dot(evader.heading());

    if to_evader.dot(agent.heading()) > 0.0 && relative_heading < HEAD_ON_DOT {
        return seek(agent, evader.pos());
    }

    let look_ahead = look_ahead_time(to_evader.length(), agent.max_speed + evader.speed());
    seek(agent, evader.pos() + evader.velocity * look_ahead)
}

/// Flee from where the pursuer is heading. Pursuers farther away than
/// `threat_range` are ignored.
pub fn evade(agent: &MovingEntity, pursuer: &MovingEntity, threat_range: Option<f64>) -> Vector2D {
    let to_pursuer = pursuer.pos() - agent.pos();
    if let Some(range) = threat_range {
        if to_pursuer.length_squared() > range * range {
            return Vector2D::ZERO;
        }
    }

    let look_ahead = look_ahead_time(to_pursuer.length(), agent.max_speed + pursuer.speed());
    flee(agent, pursuer.pos() + pursuer.velocity * look_ahead)
}

/// Keeps station at `offset` in the leader's local frame.
pub fn offset_pursuit(agent: &MovingEntity, leader: &MovingEntity, offset: Vector2D) -> Vector2D {
    let world_offset = point_to_world_space(offset, leader.heading(), leader.side(), leader.pos());
    let to_offset = world_offset - agent.pos();

    let look_ahead = look_ahead_time(to_offset.length(), agent.max_speed + leader.speed());
    arrive(agent, world_offset + leader.velocity * look_ahead, Deceleration::Fast)
}

/// Heads for the midpoint of `a` and `b` as it will be by the time the agent
/// gets there.
pub fn interpose(agent: &MovingEntity, a: &MovingEntity, b: &MovingEntity) -> Vector2D {
    let mid = (a.pos() + b.pos()) * 0.5;
    let time_to_mid = look_ahead_time(agent.pos().distance(mid), agent.max_speed);

    let a_pos = a.pos() + a.velocity * time_to_mid;
    let b_pos = b.pos() + b.velocity * time_to_mid;
    arrive(agent, (a_pos + b_pos) * 0.5, Deceleration::Fast)
}

/// Spot just behind an obstacle as seen from the hunter.
pub fn hiding_position(obstacle_pos: Vector2D, obstacle_radius: f64, hunter_pos: Vector2D) -> Vector2D {
    let dist_away = obstacle_radius + HIDING_DISTANCE_FROM_BOUNDARY;
    let to_obstacle = (obstacle_pos - hunter_pos).normalized();
    to_obstacle * dist_away + obstacle_pos
}

/// Arrives at the nearest hiding spot, or evades the hunter when there is
/// nothing to hide behind.
pub fn hide(
    agent: &MovingEntity,
    hunter: &MovingEntity,
    obstacles: &[Obstacle],
    threat_range: Option<f64>,
) -> Vector2D {
    let best = obstacles
        .iter()
        .map(|ob| hiding_position(ob.pos(), ob.bounding_radius(), hunter.pos()))
        .min_by(|a, b| {
            a.distance_squared(agent.pos())
                .total_cmp(&b.distance_squared(agent.pos()))
        });

    match best {
        Some(spot) => arrive(agent, spot, Deceleration::Fast),
        None => evade(agent, hunter, threat_range),
    }
}

impl SteeringBehavior {
    /// Jitters the wander target around its circle and steers toward the
    /// circle's projection in front of the agent.
    pub(crate) fn wander(&mut self, agent: &MovingEntity) -> Vector2D {
        let jitter = self.wander_jitter * self.time_elapsed;
        let dx = random_clamped(&mut self.rng) * jitter;
        let dy = random_clamped(&mut self.rng) * jitter;

        self.wander_target += Vector2D::new(dx, dy);
        self.wander_target.normalize();
        self.wander_target *= self.wander_radius;

        let local = self.wander_target + Vector2D::new(self.wander_distance, 0.0);
        let world = point_to_world_space(local, agent.heading(), agent.side(), agent.pos());
        world - agent.pos()
    }

    /// Steers away from the closest obstacle intersecting the detection box
    /// ahead of the agent. The box grows with speed.
    pub(crate) fn obstacle_avoidance(&mut self, agent: &MovingEntity, obstacles: &mut [Obstacle]) -> Vector2D {
        let speed_ratio = if agent.max_speed > 0.0 { agent.speed() / agent.max_speed } else { 0.0 };
        self.detection_box_length = self.min_detection_box_length * (1.0 + speed_ratio);
        let box_length = self.detection_box_length;

        tag_neighbors(agent.id(), agent.pos(), obstacles, box_length);

        let mut closest: Option<(f64, f64, Vector2D)> = None;
        for ob in obstacles.iter().filter(|ob| ob.is_tagged()) {
            let local = point_to_local_space(ob.pos(), agent.heading(), agent.side(), agent.pos());
            if local.x < 0.0 {
                continue;
            }

            let expanded = ob.bounding_radius() + agent.bounding_radius();
            if local.y.abs() >= expanded {
                continue;
            }

            // Line/circle intersection along the local x axis.
            let sqrt_part = (expanded * expanded - local.y * local.y).sqrt();
            let mut ip = local.x - sqrt_part;
            if ip <= 0.0 {
                ip = local.x + sqrt_part;
            }

            if closest.is_none_or(|(best, _, _)| ip < best) {
                closest = Some((ip, ob.bounding_radius(), local));
            }
        }

        let Some((_, radius, local)) = closest else {
            return Vector2D::ZERO;
        };

        let multiplier = 1.0 + (box_length - local.x) / box_length;
        let force = Vector2D::new(
            (radius - local.x) * BRAKING_WEIGHT,
            (radius - local.y) * multiplier,
        );
        vector_to_world_space(force, agent.heading(), agent.side())
    }

    fn create_feelers(&mut self, agent: &MovingEntity) {
        let len = self.wall_detection_feeler_length;
        let pos = agent.pos();
        let heading = agent.heading();

        self.feelers[0] = pos + heading * len;
        for (slot, angle) in SIDE_FEELER_ANGLES.into_iter().enumerate() {
            self.feelers[slot + 1] = pos + rotate_around_origin(heading, angle) * (len / 2.0);
        }
    }

    /// Pushes the agent out along the normal of the nearest wall any feeler
    /// crosses, scaled by how far that feeler overshoots it.
    pub(crate) fn wall_avoidance(&mut self, agent: &MovingEntity, walls: &[Wall2D]) -> Vector2D {
        self.create_feelers(agent);

        let mut closest: Option<(f64, &Wall2D, Vector2D, Vector2D)> = None;
        for &feeler in &self.feelers {
            for wall in walls {
                let Some(hit) = line_intersection_2d(agent.pos(), feeler, wall.from(), wall.to()) else {
                    continue;
                };
                if closest.is_none_or(|(best, ..)| hit.dist < best) {
                    closest = Some((hit.dist, wall, hit.point, feeler));
                }
            }
        }

        match closest {
            Some((_, wall, point, feeler)) => wall.normal() * (feeler - point).length(),
            None => Vector2D::ZERO,
        }
    }

    /// Seeks the current waypoint, moving on once it is close enough, and
    /// arrives at the last waypoint of an open path.
    pub(crate) fn follow_path(&mut self, agent: &MovingEntity) -> Vector2D {
        let Some(current) = self.path.current_waypoint() else {
            return Vector2D::ZERO;
        };

        if current.distance_squared(agent.pos()) < self.waypoint_seek_dist_sq {
            self.path.set_next_waypoint();
        }

        let current = self.path.current_waypoint().unwrap_or(current);
        if self.path.is_finished() {
            arrive(agent, current, Deceleration::Normal)
        } else {
            seek(agent, current)
        }
    }
}
