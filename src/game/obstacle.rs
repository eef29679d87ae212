use crate::game::entity::{BaseEntity, Entity};
use crate::game::math::Vector2D;

/// Static disc the agents steer around and hide behind.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    base: BaseEntity,
}

impl Obstacle {
    pub fn new(pos: Vector2D, radius: f64) -> Self {
        Self { base: BaseEntity::new(pos, radius) }
    }

    pub fn radius(&self) -> f64 {
        self.base.bounding_radius
    }
}

impl Entity for Obstacle {
    fn base(&self) -> &BaseEntity {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        &mut self.base
    }
}
