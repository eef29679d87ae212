//! Separation, alignment and cohesion.
//!
//! The plain variants read neighbours from tags on the agent snapshot and
//! skip the agent's evade/pursuit target. The `_plus` variants read the
//! result of the last spatial grid query instead.

use crate::game::entity::{Entity, MovingEntity};
use crate::game::math::Vector2D;
use crate::game::vehicle::VehicleId;

use super::seek;

fn tagged_neighbors<'a>(
    agent: &'a MovingEntity,
    agents: &'a [MovingEntity],
    exclude: Option<VehicleId>,
) -> impl Iterator<Item = &'a MovingEntity> + 'a {
    agents.iter().enumerate().filter_map(move |(idx, other)| {
        let skip = other.id() == agent.id() || !other.is_tagged() || exclude == Some(VehicleId(idx));
        (!skip).then_some(other)
    })
}

fn grid_neighbors<'a>(
    me: VehicleId,
    agents: &'a [MovingEntity],
    neighbors: &'a [VehicleId],
) -> impl Iterator<Item = &'a MovingEntity> + 'a {
    neighbors
        .iter()
        .filter(move |&&id| id != me)
        .filter_map(move |id| agents.get(id.0))
}

/// Sum of unit vectors away from each neighbour, divided by distance.
fn separation_from<'a>(agent: &MovingEntity, neighbors: impl Iterator<Item = &'a MovingEntity>) -> Vector2D {
    let mut force = Vector2D::ZERO;
    for other in neighbors {
        let to_agent = agent.pos() - other.pos();
        let dist = to_agent.length();
        // Coincident agents have no direction to push along.
        if dist > f64::EPSILON {
            force += to_agent.normalized() / dist;
        }
    }
    force
}

fn alignment_from<'a>(agent: &MovingEntity, neighbors: impl Iterator<Item = &'a MovingEntity>) -> Vector2D {
    let mut average = Vector2D::ZERO;
    let mut count = 0usize;
    for other in neighbors {
        average += other.heading();
        count += 1;
    }
    if count == 0 {
        return Vector2D::ZERO;
    }
    average / count as f64 - agent.heading()
}

/// Normalised seek toward the neighbours' centre of mass.
fn cohesion_from<'a>(agent: &MovingEntity, neighbors: impl Iterator<Item = &'a MovingEntity>) -> Vector2D {
    let mut center = Vector2D::ZERO;
    let mut count = 0usize;
    for other in neighbors {
        center += other.pos();
        count += 1;
    }
    if count == 0 {
        return Vector2D::ZERO;
    }
    seek(agent, center / count as f64).normalized()
}

pub fn separation(agent: &MovingEntity, agents: &[MovingEntity], exclude: Option<VehicleId>) -> Vector2D {
    separation_from(agent, tagged_neighbors(agent, agents, exclude))
}

pub fn alignment(agent: &MovingEntity, agents: &[MovingEntity], exclude: Option<VehicleId>) -> Vector2D {
    alignment_from(agent, tagged_neighbors(agent, agents, exclude))
}

pub fn cohesion(agent: &MovingEntity, agents: &[MovingEntity], exclude: Option<VehicleId>) -> Vector2D {
    cohesion_from(agent, tagged_neighbors(agent, agents, exclude))
}

pub fn separation_plus(
    me: VehicleId,
    agent: &MovingEntity,
    agents: &[MovingEntity],
    neighbors: &[VehicleId],
) -> Vector2D {
    separation_from(agent, grid_neighbors(me, agents, neighbors))
}

pub fn alignment_plus(
    me: VehicleId,
    agent: &MovingEntity,
    agents: &[MovingEntity],
    neighbors: &[VehicleId],
) -> Vector2D {
    alignment_from(agent, grid_neighbors(me, agents, neighbors))
}

pub fn cohesion_plus(
    me: VehicleId,
    agent: &MovingEntity,
    agents: &[MovingEntity],
    neighbors: &[VehicleId],
) -> Vector2D {
    cohesion_from(agent, grid_neighbors(me, agents, neighbors))
}
