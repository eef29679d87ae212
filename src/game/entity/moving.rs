use crate::game::error::{SteeringError, SteeringResult};
use crate::game::math::{Matrix2D, Vector2D};

use super::{BaseEntity, Entity};

/// Tolerance on `|heading|² - 1` accepted by [`MovingEntity::set_heading`].
pub const HEADING_TOLERANCE: f64 = 1e-5;

/// Point-mass kinematic state.
///
/// `heading` is always unit length and `side` is always `heading.perp()`;
/// every mutation goes through a method that keeps both in step.
#[derive(Clone, Debug, PartialEq)]
pub struct MovingEntity {
    pub base: BaseEntity,
    pub velocity: Vector2D,
    heading: Vector2D,
    side: Vector2D,
    pub mass: f64,
    pub max_speed: f64,
    pub max_force: f64,
    /// Radians per second.
    pub max_turn_rate: f64,
}

impl Entity for MovingEntity {
    fn base(&self) -> &BaseEntity {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        &mut self.base
    }
}

impl MovingEntity {
    /// A heading that is not unit length is normalised; a zero heading falls
    /// back to facing along +x.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: Vector2D,
        bounding_radius: f64,
        velocity: Vector2D,
        heading: Vector2D,
        mass: f64,
        max_speed: f64,
        max_force: f64,
        max_turn_rate: f64,
    ) -> Self {
        let heading = if heading.is_zero() { Vector2D::new(1.0, 0.0) } else { heading.normalized() };
        Self {
            base: BaseEntity::new(pos, bounding_radius),
            velocity,
            heading,
            side: heading.perp(),
            mass,
            max_speed,
            max_force,
            max_turn_rate,
        }
    }

    pub fn heading(&self) -> Vector2D {
        self.heading
    }

    pub fn side(&self) -> Vector2D {
        self.side
    }

    /// Replaces the heading and recomputes `side`.
    pub fn set_heading(&mut self, heading: Vector2D) -> SteeringResult<()> {
        if (heading.length_squared() - 1.0).abs() > HEADING_TOLERANCE {
            return Err(SteeringError::NonUnitHeading { length: heading.length() });
        }
        self.heading = heading;
        self.side = heading.perp();
        Ok(())
    }

    /// Points the heading along `velocity` when it is large enough to have a
    /// direction. Returns whether the heading changed.
    pub(crate) fn align_heading_with_velocity(&mut self, min_speed_sq: f64) -> bool {
        if self.velocity.length_squared() > min_speed_sq {
            self.heading = self.velocity.normalized();
            self.side = self.heading.perp();
            true
        } else {
            false
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn speed_squared(&self) -> f64 {
        self.velocity.length_squared()
    }

    pub fn is_speed_maxed_out(&self) -> bool {
        self.velocity.length_squared() >= self.max_speed * self.max_speed
    }

    /// Turns the heading (and velocity) toward `target` by at most
    /// `max_turn_rate` radians. Returns `true` once already facing it.
    pub fn rotate_heading_to_face_position(&mut self, target: Vector2D) -> bool {
        let to_target = (target - self.base.pos).normalized();
        let angle = self.heading.dot(to_target).clamp(-1.0, 1.0).acos();

        if angle < 1e-5 {
            return true;
        }

        let angle = angle.min(self.max_turn_rate);
        let mut rotation = Matrix2D::identity();
        rotation.rotate(angle * self.heading.sign(to_target));

        self.heading = rotation.transform_point(self.heading);
        self.velocity = rotation.transform_point(self.velocity);
        self.side = self.heading.perp();
        false
    }
}
