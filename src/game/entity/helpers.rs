use crate::game::math::{dist_to_line_segment, two_circles_overlapped, Vector2D};

use super::{Entity, EntityId};

/// Tags every entity in `others` whose bounding circle intersects the circle
/// of `radius` around `center`, and untags the rest. The entity `center_id`
/// itself is never tagged.
pub fn tag_neighbors<T: Entity>(center_id: EntityId, center: Vector2D, others: &mut [T], radius: f64) {
    for other in others.iter_mut() {
        other.untag();
        let to = other.pos() - center;
        let range = radius + other.bounding_radius();
        if other.id() != center_id && to.length_squared() < range * range {
            other.tag();
        }
    }
}

/// Pushes `entity` out of any bounding circle in `others` it overlaps.
pub fn enforce_non_penetration_constraint<E: Entity, T: Entity>(entity: &mut E, others: &[T]) {
    for other in others {
        if other.id() == entity.id() {
            continue;
        }
        let to_entity = entity.pos() - other.pos();
        let dist = to_entity.length();
        let overlap = other.bounding_radius() + entity.bounding_radius() - dist;
        if overlap >= 0.0 && dist > f64::EPSILON {
            let pos = entity.pos() + (to_entity / dist) * overlap;
            entity.set_pos(pos);
        }
    }
}

/// Whether `candidate`, padded by `min_gap`, overlaps any of `others`. Used
/// when scattering obstacles.
pub fn overlapped<E: Entity, T: Entity>(candidate: &E, others: &[T], min_gap: f64) -> bool {
    others.iter().any(|other| {
        two_circles_overlapped(
            candidate.pos(),
            candidate.bounding_radius() + min_gap,
            other.pos(),
            other.bounding_radius(),
        )
    })
}

/// Ids of the entities whose bounding circle the segment AB passes through,
/// limited to those within `range` of `a`.
pub fn entity_line_segment_intersections<T: Entity>(
    entities: &[T],
    ignore: Option<EntityId>,
    a: Vector2D,
    b: Vector2D,
    range: f64,
) -> Vec<EntityId> {
    entities
        .iter()
        .filter(|e| Some(e.id()) != ignore)
        .filter(|e| e.pos().distance_squared(a) <= range * range)
        .filter(|e| dist_to_line_segment(a, b, e.pos()) < e.bounding_radius())
        .map(|e| e.id())
        .collect()
}
