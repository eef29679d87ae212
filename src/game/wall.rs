use serde::{Deserialize, Serialize};

use crate::game::math::Vector2D;

/// Line segment with a unit normal on its left-hand side (`(-dir.y, dir.x)`).
/// The normal is recomputed whenever an endpoint moves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wall2D {
    from: Vector2D,
    to: Vector2D,
    normal: Vector2D,
}

impl Wall2D {
    pub fn new(from: Vector2D, to: Vector2D) -> Self {
        let mut wall = Self { from, to, normal: Vector2D::ZERO };
        wall.calculate_normal();
        wall
    }

    fn calculate_normal(&mut self) {
        let dir = (self.to - self.from).normalized();
        self.normal = Vector2D::new(-dir.y, dir.x);
    }

    pub fn from(&self) -> Vector2D {
        self.from
    }

    pub fn to(&self) -> Vector2D {
        self.to
    }

    pub fn normal(&self) -> Vector2D {
        self.normal
    }

    pub fn center(&self) -> Vector2D {
        (self.from + self.to) * 0.5
    }

    pub fn set_from(&mut self, from: Vector2D) {
        self.from = from;
        self.calculate_normal();
    }

    pub fn set_to(&mut self, to: Vector2D) {
        self.to = to;
        self.calculate_normal();
    }
}
