use rand::Rng;

use crate::game::entity::MovingEntity;
use crate::game::error::SteeringResult;
use crate::game::math::Vector2D;
use crate::game::vehicle::VehicleId;

use super::{SteeringBehavior, SteeringContext, PRIORITY_ORDER};

/// Headroom at or below this counts as exhausted, so rounding after a
/// rescale cannot leave a sliver of force for the next behaviour.
pub const HEADROOM_EPSILON: f64 = 1e-9;

/// Adds as much of `force` to `running` as fits under `max_force`,
/// preserving its direction. Returns `false` when there was no headroom
/// left, in which case `running` is untouched.
pub fn accumulate_force(running: &mut Vector2D, force: Vector2D, max_force: f64) -> bool {
    let remaining = max_force - running.length();
    if remaining <= HEADROOM_EPSILON {
        return false;
    }

    if force.length() < remaining {
        *running += force;
    } else {
        *running += force.normalized() * remaining;
    }
    true
}

impl SteeringBehavior {
    /// Every active behaviour, weighted and summed, then truncated.
    pub(super) fn calculate_weighted_sum(
        &mut self,
        me: VehicleId,
        agent: &MovingEntity,
        ctx: &mut SteeringContext,
    ) -> SteeringResult<Vector2D> {
        let mut total = Vector2D::ZERO;
        for behavior in PRIORITY_ORDER {
            if self.is_on(behavior) {
                total += self.evaluate(behavior, me, agent, ctx)? * self.weights.get(behavior);
            }
        }
        total.truncate(agent.max_force);
        Ok(total)
    }

    /// Active behaviours in priority order until the force budget is spent.
    /// Behaviours after that point are not evaluated at all.
    pub(super) fn calculate_prioritized(
        &mut self,
        me: VehicleId,
        agent: &MovingEntity,
        ctx: &mut SteeringContext,
    ) -> SteeringResult<Vector2D> {
        let mut total = Vector2D::ZERO;
        for behavior in PRIORITY_ORDER {
            if !self.is_on(behavior) {
                continue;
            }
            if agent.max_force - total.length() <= HEADROOM_EPSILON {
                break;
            }
            let force = self.evaluate(behavior, me, agent, ctx)? * self.weights.get(behavior);
            if !accumulate_force(&mut total, force, agent.max_force) {
                break;
            }
        }
        Ok(total)
    }

    /// Each active behaviour gets a weighted coin flip in priority order; the
    /// first one that wins and produces a non-zero force is returned alone,
    /// rescaled by `weight / probability` and truncated.
    pub(super) fn calculate_dithered(
        &mut self,
        me: VehicleId,
        agent: &MovingEntity,
        ctx: &mut SteeringContext,
    ) -> SteeringResult<Vector2D> {
        for behavior in PRIORITY_ORDER {
            if !self.is_on(behavior) {
                continue;
            }
            let Some(probability) = self.probabilities.get(behavior).filter(|p| *p > 0.0) else {
                continue;
            };
            if self.rng.random::<f64>() >= probability {
                continue;
            }

            let mut force = self.evaluate(behavior, me, agent, ctx)? * (self.weights.get(behavior) / probability);
            if !force.is_zero() {
                force.truncate(agent.max_force);
                return Ok(force);
            }
        }
        Ok(Vector2D::ZERO)
    }
}
