use serde::{Deserialize, Serialize};

use crate::game::entity::{BaseEntity, Entity, MovingEntity};
use crate::game::error::SteeringResult;
use crate::game::math::{wrap_around, Vector2D};
use crate::game::smoother::Smoother;
use crate::game::steering::{SteeringBehavior, SteeringContext};

/// Index of a vehicle in its world. Also the handle the spatial grid stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

/// Below this squared speed the heading is left as it was.
pub const MIN_SPEED_SQ_FOR_HEADING: f64 = 1e-8;

/// Vehicle outline in local space, nose along +x.
pub const VEHICLE_SHAPE: [Vector2D; 3] = [
    Vector2D::new(-1.0, 0.6),
    Vector2D::new(1.0, 0.0),
    Vector2D::new(-1.0, -0.6),
];

/// An autonomous agent: kinematic state plus the steering that drives it.
#[derive(Clone, Debug)]
pub struct Vehicle {
    id: VehicleId,
    entity: MovingEntity,
    steering: SteeringBehavior,
    heading_smoother: Smoother<Vector2D>,
    smoothed_heading: Vector2D,
    smoothing_on: bool,
    time_elapsed: f64,
}

impl Vehicle {
    pub fn new(id: VehicleId, entity: MovingEntity, steering: SteeringBehavior, smoothing_samples: usize) -> Self {
        Self {
            id,
            smoothed_heading: entity.heading(),
            entity,
            steering,
            heading_smoother: Smoother::new(smoothing_samples, Vector2D::ZERO),
            smoothing_on: false,
            time_elapsed: 0.0,
        }
    }

    /// Advances the vehicle by `time_elapsed` seconds.
    ///
    /// Integrates the steering force (explicit Euler, speed clamped), turns
    /// the heading along the new velocity and wraps the position around the
    /// plane. The spatial grid is left untouched; the world re-indexes every
    /// vehicle once the whole frame has been stepped.
    pub fn update(&mut self, time_elapsed: f64, ctx: &mut SteeringContext) -> SteeringResult<()> {
        self.time_elapsed = time_elapsed;
        let old_pos = self.entity.pos();

        let force = self.steering.calculate(self.id, &self.entity, time_elapsed, ctx)?;
        let acceleration = if self.entity.mass > 0.0 { force / self.entity.mass } else { Vector2D::ZERO };

        self.entity.velocity += acceleration * time_elapsed;
        self.entity.velocity.truncate(self.entity.max_speed);

        let mut pos = old_pos + self.entity.velocity * time_elapsed;
        self.entity.align_heading_with_velocity(MIN_SPEED_SQ_FOR_HEADING);

        wrap_around(&mut pos, ctx.world_size.x, ctx.world_size.y);
        self.entity.set_pos(pos);

        if self.smoothing_on {
            self.smoothed_heading = self.heading_smoother.update(self.entity.heading());
        }
        Ok(())
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn entity(&self) -> &MovingEntity {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut MovingEntity {
        &mut self.entity
    }

    pub fn steering(&self) -> &SteeringBehavior {
        &self.steering
    }

    pub fn steering_mut(&mut self) -> &mut SteeringBehavior {
        &mut self.steering
    }

    pub fn is_smoothing_on(&self) -> bool {
        self.smoothing_on
    }

    pub fn toggle_smoothing(&mut self) {
        self.smoothing_on = !self.smoothing_on;
    }

    pub fn smoothed_heading(&self) -> Vector2D {
        self.smoothed_heading
    }

    /// Heading to draw with: the smoothed one when smoothing is on and has
    /// settled on a direction.
    pub fn render_heading(&self) -> Vector2D {
        if self.smoothing_on && !self.smoothed_heading.is_zero() {
            self.smoothed_heading.normalized()
        } else {
            self.entity.heading()
        }
    }

    pub fn time_elapsed(&self) -> f64 {
        self.time_elapsed
    }
}

impl Entity for Vehicle {
    fn base(&self) -> &BaseEntity {
        &self.entity.base
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        &mut self.entity.base
    }
}
