use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::game::math::Vector2D;

mod helpers;
mod moving;

pub use helpers::*;
pub use moving::MovingEntity;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

/// Process-wide unique entity identifier. Ids increase monotonically and are
/// never handed out twice, even across worlds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// State shared by every entity in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseEntity {
    id: EntityId,
    pub pos: Vector2D,
    pub scale: Vector2D,
    pub bounding_radius: f64,
    tagged: bool,
}

impl BaseEntity {
    pub fn new(pos: Vector2D, bounding_radius: f64) -> Self {
        Self {
            id: EntityId::next(),
            pos,
            scale: Vector2D::new(1.0, 1.0),
            bounding_radius,
            tagged: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
}

/// Common accessors over anything that lives in the world.
///
/// Implementors only provide [`Entity::base`] and [`Entity::base_mut`].
pub trait Entity {
    fn base(&self) -> &BaseEntity;
    fn base_mut(&mut self) -> &mut BaseEntity;

    fn id(&self) -> EntityId {
        self.base().id
    }

    fn pos(&self) -> Vector2D {
        self.base().pos
    }

    fn set_pos(&mut self, pos: Vector2D) {
        self.base_mut().pos = pos;
    }

    fn bounding_radius(&self) -> f64 {
        self.base().bounding_radius
    }

    fn scale(&self) -> Vector2D {
        self.base().scale
    }

    /// Rescales the entity, growing or shrinking the bounding radius by the
    /// ratio of the largest scale components.
    fn set_scale(&mut self, scale: Vector2D) {
        let base = self.base_mut();
        let old = base.scale.x.max(base.scale.y);
        if old > 0.0 {
            base.bounding_radius *= scale.x.max(scale.y) / old;
        }
        base.scale = scale;
    }

    fn is_tagged(&self) -> bool {
        self.base().tagged
    }

    fn tag(&mut self) {
        self.base_mut().tagged = true;
    }

    fn untag(&mut self) {
        self.base_mut().tagged = false;
    }

    fn set_tagged(&mut self, tagged: bool) {
        self.base_mut().tagged = tagged;
    }
}

impl Entity for BaseEntity {
    fn base(&self) -> &BaseEntity {
        self
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = BaseEntity::new(Vector2D::ZERO, 1.0);
        let b = BaseEntity::new(Vector2D::ZERO, 1.0);
        assert!(b.id() > a.id());
    }

    #[test]
    fn test_set_scale_adjusts_bounding_radius() {
        let mut e = BaseEntity::new(Vector2D::ZERO, 2.0);
        e.set_scale(Vector2D::new(3.0, 3.0));
        assert_eq!(e.bounding_radius(), 6.0);
        assert_eq!(e.scale(), Vector2D::new(3.0, 3.0));
    }

    #[test]
    fn test_tagging() {
        let mut e = BaseEntity::new(Vector2D::ZERO, 1.0);
        assert!(!e.is_tagged());
        e.tag();
        assert!(e.is_tagged());
        e.untag();
        assert!(!e.is_tagged());
    }
}
