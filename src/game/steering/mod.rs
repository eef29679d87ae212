use bitflags::bitflags;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};

use crate::game::config::Params;
use crate::game::entity::{tag_neighbors, Entity, MovingEntity};
use crate::game::error::{SteeringError, SteeringResult};
use crate::game::math::{Vector2D, TWO_PI};
use crate::game::obstacle::Obstacle;
use crate::game::path::Path;
use crate::game::spatial_grid::SpatialGrid;
use crate::game::vehicle::VehicleId;
use crate::game::wall::Wall2D;

mod behaviors;
mod flocking;
mod summing;
#[cfg(test)]
mod tests;

pub use behaviors::*;
pub use flocking::*;
pub use summing::{accumulate_force, HEADROOM_EPSILON};

// ============================================================================
// Behaviours
// ============================================================================

/// Every steering behaviour a vehicle can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, Serialize, Deserialize)]
pub enum Behavior {
    Seek,
    Flee,
    Arrive,
    Wander,
    Cohesion,
    Separation,
    Alignment,
    ObstacleAvoidance,
    WallAvoidance,
    FollowPath,
    Pursuit,
    Evade,
    Interpose,
    Hide,
    OffsetPursuit,
}

bitflags! {
    /// Set of behaviours, one bit per [`Behavior`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BehaviorFlags: u32 {
        const SEEK = 1 << 1;
        const FLEE = 1 << 2;
        const ARRIVE = 1 << 3;
        const WANDER = 1 << 4;
        const COHESION = 1 << 5;
        const SEPARATION = 1 << 6;
        const ALIGNMENT = 1 << 7;
        const OBSTACLE_AVOIDANCE = 1 << 8;
        const WALL_AVOIDANCE = 1 << 9;
        const FOLLOW_PATH = 1 << 10;
        const PURSUIT = 1 << 11;
        const EVADE = 1 << 12;
        const INTERPOSE = 1 << 13;
        const HIDE = 1 << 14;
        const OFFSET_PURSUIT = 1 << 16;

        const FLOCKING = Self::SEPARATION.bits() | Self::ALIGNMENT.bits() | Self::COHESION.bits();
    }
}

impl Behavior {
    pub fn flag(self) -> BehaviorFlags {
        match self {
            Behavior::Seek => BehaviorFlags::SEEK,
            Behavior::Flee => BehaviorFlags::FLEE,
            Behavior::Arrive => BehaviorFlags::ARRIVE,
            Behavior::Wander => BehaviorFlags::WANDER,
            Behavior::Cohesion => BehaviorFlags::COHESION,
            Behavior::Separation => BehaviorFlags::SEPARATION,
            Behavior::Alignment => BehaviorFlags::ALIGNMENT,
            Behavior::ObstacleAvoidance => BehaviorFlags::OBSTACLE_AVOIDANCE,
            Behavior::WallAvoidance => BehaviorFlags::WALL_AVOIDANCE,
            Behavior::FollowPath => BehaviorFlags::FOLLOW_PATH,
            Behavior::Pursuit => BehaviorFlags::PURSUIT,
            Behavior::Evade => BehaviorFlags::EVADE,
            Behavior::Interpose => BehaviorFlags::INTERPOSE,
            Behavior::Hide => BehaviorFlags::HIDE,
            Behavior::OffsetPursuit => BehaviorFlags::OFFSET_PURSUIT,
        }
    }
}

/// Evaluation order used by the prioritized and dithered summing methods.
/// Collision avoidance comes first so it is never starved of force.
pub const PRIORITY_ORDER: [Behavior; Behavior::COUNT] = [
    Behavior::WallAvoidance,
    Behavior::ObstacleAvoidance,
    Behavior::Evade,
    Behavior::Flee,
    Behavior::Separation,
    Behavior::Alignment,
    Behavior::Cohesion,
    Behavior::Seek,
    Behavior::Arrive,
    Behavior::Wander,
    Behavior::Pursuit,
    Behavior::OffsetPursuit,
    Behavior::Interpose,
    Behavior::Hide,
    Behavior::FollowPath,
];

/// How the forces of the active behaviours are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumIter, Serialize, Deserialize)]
pub enum SummingMethod {
    WeightedAverage,
    #[default]
    Prioritized,
    Dithered,
}

/// Arrive deceleration profile; larger values stop more gently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Deceleration {
    Slow = 3,
    #[default]
    Normal = 2,
    Fast = 1,
}

impl Deceleration {
    pub fn factor(self) -> f64 {
        self as i32 as f64
    }
}

// ============================================================================
// Tuning
// ============================================================================

/// One multiplier per behaviour. A parameter file must list all of them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorWeights {
    pub separation: f64,
    pub alignment: f64,
    pub cohesion: f64,
    pub obstacle_avoidance: f64,
    pub wall_avoidance: f64,
    pub wander: f64,
    pub seek: f64,
    pub flee: f64,
    pub arrive: f64,
    pub pursuit: f64,
    pub offset_pursuit: f64,
    pub interpose: f64,
    pub hide: f64,
    pub evade: f64,
    pub follow_path: f64,
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        Self {
            separation: 1.0,
            alignment: 1.0,
            cohesion: 2.0,
            obstacle_avoidance: 10.0,
            wall_avoidance: 10.0,
            wander: 1.0,
            seek: 1.0,
            flee: 1.0,
            arrive: 1.0,
            pursuit: 1.0,
            offset_pursuit: 1.0,
            interpose: 1.0,
            hide: 1.0,
            evade: 0.01,
            follow_path: 0.05,
        }
    }
}

impl BehaviorWeights {
    fn slot(&mut self, behavior: Behavior) -> &mut f64 {
        match behavior {
            Behavior::Seek => &mut self.seek,
            Behavior::Flee => &mut self.flee,
            Behavior::Arrive => &mut self.arrive,
            Behavior::Wander => &mut self.wander,
            Behavior::Cohesion => &mut self.cohesion,
            Behavior::Separation => &mut self.separation,
            Behavior::Alignment => &mut self.alignment,
            Behavior::ObstacleAvoidance => &mut self.obstacle_avoidance,
            Behavior::WallAvoidance => &mut self.wall_avoidance,
            Behavior::FollowPath => &mut self.follow_path,
            Behavior::Pursuit => &mut self.pursuit,
            Behavior::Evade => &mut self.evade,
            Behavior::Interpose => &mut self.interpose,
            Behavior::Hide => &mut self.hide,
            Behavior::OffsetPursuit => &mut self.offset_pursuit,
        }
    }

    pub fn get(&self, behavior: Behavior) -> f64 {
        let mut weights = *self;
        *weights.slot(behavior)
    }

    pub fn set(&mut self, behavior: Behavior, weight: f64) {
        *self.slot(behavior) = weight;
    }

    /// Every weight multiplied by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for behavior in PRIORITY_ORDER {
            *self.slot(behavior) *= factor;
        }
        self
    }
}

/// Per-behaviour probability of being evaluated by the dithered summing
/// method. Behaviours without a probability are never dithered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DitherProbabilities {
    pub wall_avoidance: Option<f64>,
    pub obstacle_avoidance: Option<f64>,
    pub separation: Option<f64>,
    pub alignment: Option<f64>,
    pub cohesion: Option<f64>,
    pub wander: Option<f64>,
    pub seek: Option<f64>,
    pub flee: Option<f64>,
    pub evade: Option<f64>,
    pub hide: Option<f64>,
    pub arrive: Option<f64>,
    pub pursuit: Option<f64>,
    pub offset_pursuit: Option<f64>,
    pub interpose: Option<f64>,
    pub follow_path: Option<f64>,
}

impl DitherProbabilities {
    pub fn classic() -> Self {
        Self {
            wall_avoidance: Some(0.5),
            obstacle_avoidance: Some(0.5),
            separation: Some(0.2),
            alignment: Some(0.3),
            cohesion: Some(0.6),
            wander: Some(0.8),
            seek: Some(0.8),
            flee: Some(0.6),
            evade: Some(1.0),
            hide: Some(0.8),
            arrive: Some(0.5),
            ..Self::default()
        }
    }

    pub fn get(&self, behavior: Behavior) -> Option<f64> {
        match behavior {
            Behavior::Seek => self.seek,
            Behavior::Flee => self.flee,
            Behavior::Arrive => self.arrive,
            Behavior::Wander => self.wander,
            Behavior::Cohesion => self.cohesion,
            Behavior::Separation => self.separation,
            Behavior::Alignment => self.alignment,
            Behavior::ObstacleAvoidance => self.obstacle_avoidance,
            Behavior::WallAvoidance => self.wall_avoidance,
            Behavior::FollowPath => self.follow_path,
            Behavior::Pursuit => self.pursuit,
            Behavior::Evade => self.evade,
            Behavior::Interpose => self.interpose,
            Behavior::Hide => self.hide,
            Behavior::OffsetPursuit => self.offset_pursuit,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Behavior, f64)> + '_ {
        PRIORITY_ORDER.into_iter().filter_map(|b| self.get(b).map(|p| (b, p)))
    }
}

// ============================================================================
// World view
// ============================================================================

/// What a vehicle's steering can see of the world while it is updated.
///
/// `agents` is the start-of-frame snapshot of every vehicle, indexed by
/// [`VehicleId`]. Only tags are written to it.
pub struct SteeringContext<'a> {
    pub agents: &'a mut [MovingEntity],
    pub obstacles: &'a mut [Obstacle],
    pub walls: &'a [Wall2D],
    pub grid: &'a mut SpatialGrid<VehicleId>,
    pub crosshair: Vector2D,
    /// Width and height of the toroidal plane.
    pub world_size: Vector2D,
}

impl SteeringContext<'_> {
    pub fn agent(&self, id: VehicleId) -> SteeringResult<&MovingEntity> {
        self.agents.get(id.0).ok_or(SteeringError::UnknownAgent(id))
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Per-vehicle steering state: which behaviours are on, their tuning, their
/// targets and the memory some of them carry between frames.
#[derive(Clone, Debug)]
pub struct SteeringBehavior {
    flags: BehaviorFlags,
    summing_method: SummingMethod,
    pub weights: BehaviorWeights,
    pub probabilities: DitherProbabilities,

    target_agent1: Option<VehicleId>,
    target_agent2: Option<VehicleId>,
    offset: Option<Vector2D>,
    deceleration: Deceleration,
    evade_threat_range: Option<f64>,
    space_partitioning: bool,

    view_distance: f64,
    min_detection_box_length: f64,
    detection_box_length: f64,
    wall_detection_feeler_length: f64,
    feelers: [Vector2D; 3],

    wander_target: Vector2D,
    wander_radius: f64,
    wander_distance: f64,
    wander_jitter: f64,

    path: Path,
    waypoint_seek_dist_sq: f64,

    force: Vector2D,
    evaluated: BehaviorFlags,
    time_elapsed: f64,
    rng: StdRng,
}

macro_rules! toggles {
    ($($on:ident, $off:ident, $is_on:ident => $behavior:ident;)*) => {
        $(
            pub fn $on(&mut self) {
                self.on(Behavior::$behavior);
            }

            pub fn $off(&mut self) {
                self.off(Behavior::$behavior);
            }

            pub fn $is_on(&self) -> bool {
                self.is_on(Behavior::$behavior)
            }
        )*
    };
}

macro_rules! targeted_toggles {
    ($($off:ident, $is_on:ident => $behavior:ident;)*) => {
        $(
            pub fn $off(&mut self) {
                self.off(Behavior::$behavior);
            }

            pub fn $is_on(&self) -> bool {
                self.is_on(Behavior::$behavior)
            }
        )*
    };
}

impl SteeringBehavior {
    /// Builds a steering engine with every behaviour off, tuned from
    /// `params` (weights and max force already multiplied by the tweaker).
    pub fn from_params(params: &Params, mut rng: StdRng) -> Self {
        let theta = rng.random::<f64>() * TWO_PI;
        let path = Path::new(true);

        Self {
            flags: BehaviorFlags::empty(),
            summing_method: SummingMethod::default(),
            weights: params.effective_weights(),
            probabilities: params.probabilities,
            target_agent1: None,
            target_agent2: None,
            offset: None,
            deceleration: Deceleration::Normal,
            evade_threat_range: params.evade_threat_range,
            space_partitioning: false,
            view_distance: params.view_distance,
            min_detection_box_length: params.min_detection_box_length,
            detection_box_length: params.min_detection_box_length,
            wall_detection_feeler_length: params.wall_detection_feeler_length,
            feelers: [Vector2D::ZERO; 3],
            wander_target: Vector2D::new(theta.cos(), theta.sin()) * params.wander_radius,
            wander_radius: params.wander_radius,
            wander_distance: params.wander_distance,
            wander_jitter: params.wander_jitter_per_sec,
            path,
            waypoint_seek_dist_sq: params.waypoint_seek_distance * params.waypoint_seek_distance,
            force: Vector2D::ZERO,
            evaluated: BehaviorFlags::empty(),
            time_elapsed: 0.0,
            rng,
        }
    }

    /// Computes this frame's steering force for `agent` (the vehicle `me`).
    ///
    /// Flocking neighbours are gathered first, through the spatial grid when
    /// partitioning is on and by tagging the agent snapshot otherwise, then
    /// the active behaviours are combined by the current summing method.
    pub fn calculate(
        &mut self,
        me: VehicleId,
        agent: &MovingEntity,
        time_elapsed: f64,
        ctx: &mut SteeringContext,
    ) -> SteeringResult<Vector2D> {
        self.force = Vector2D::ZERO;
        self.evaluated = BehaviorFlags::empty();
        self.time_elapsed = time_elapsed;

        if self.flags.intersects(BehaviorFlags::FLOCKING) {
            if self.space_partitioning {
                ctx.grid.calculate_neighbors(agent.pos(), self.view_distance);
            } else {
                tag_neighbors(agent.id(), agent.pos(), ctx.agents, self.view_distance);
            }
        }

        self.force = match self.summing_method {
            SummingMethod::WeightedAverage => self.calculate_weighted_sum(me, agent, ctx)?,
            SummingMethod::Prioritized => self.calculate_prioritized(me, agent, ctx)?,
            SummingMethod::Dithered => self.calculate_dithered(me, agent, ctx)?,
        };
        Ok(self.force)
    }

    /// Unweighted force of a single behaviour. Records the evaluation.
    pub(crate) fn evaluate(
        &mut self,
        behavior: Behavior,
        me: VehicleId,
        agent: &MovingEntity,
        ctx: &mut SteeringContext,
    ) -> SteeringResult<Vector2D> {
        self.evaluated |= behavior.flag();
        let target1 = self.target_agent1.ok_or(SteeringError::MissingTarget { behavior });

        let force = match behavior {
            Behavior::Seek => seek(agent, ctx.crosshair),
            Behavior::Flee => flee(agent, ctx.crosshair),
            Behavior::Arrive => arrive(agent, ctx.crosshair, self.deceleration),
            Behavior::Wander => self.wander(agent),
            Behavior::ObstacleAvoidance => self.obstacle_avoidance(agent, ctx.obstacles),
            Behavior::WallAvoidance => self.wall_avoidance(agent, ctx.walls),
            Behavior::FollowPath => self.follow_path(agent),
            Behavior::Pursuit => {
                let evader = ctx.agent(target1?)?;
                pursuit(agent, evader)
            }
            Behavior::Evade => {
                let pursuer = ctx.agent(target1?)?;
                evade(agent, pursuer, self.evade_threat_range)
            }
            Behavior::Hide => {
                let hunter = ctx.agent(target1?)?;
                hide(agent, hunter, ctx.obstacles, self.evade_threat_range)
            }
            Behavior::OffsetPursuit => {
                let leader = ctx.agent(target1?)?;
                let offset = self.offset.ok_or(SteeringError::MissingOffset)?;
                offset_pursuit(agent, leader, offset)
            }
            Behavior::Interpose => {
                let a = ctx.agent(target1?)?;
                let b = ctx.agent(self.target_agent2.ok_or(SteeringError::MissingTarget { behavior })?)?;
                interpose(agent, a, b)
            }
            Behavior::Separation if self.space_partitioning => {
                separation_plus(me, agent, ctx.agents, ctx.grid.neighbors())
            }
            Behavior::Alignment if self.space_partitioning => {
                alignment_plus(me, agent, ctx.agents, ctx.grid.neighbors())
            }
            Behavior::Cohesion if self.space_partitioning => {
                cohesion_plus(me, agent, ctx.agents, ctx.grid.neighbors())
            }
            Behavior::Separation => separation(agent, ctx.agents, self.target_agent1),
            Behavior::Alignment => alignment(agent, ctx.agents, self.target_agent1),
            Behavior::Cohesion => cohesion(agent, ctx.agents, self.target_agent1),
        };
        Ok(force)
    }

    // ------------------------------------------------------------------------
    // Switches
    // ------------------------------------------------------------------------

    pub fn on(&mut self, behavior: Behavior) {
        self.flags |= behavior.flag();
    }

    pub fn off(&mut self, behavior: Behavior) {
        self.flags -= behavior.flag();
    }

    pub fn is_on(&self, behavior: Behavior) -> bool {
        self.flags.contains(behavior.flag())
    }

    pub fn flags(&self) -> BehaviorFlags {
        self.flags
    }

    toggles! {
        seek_on, seek_off, is_seek_on => Seek;
        flee_on, flee_off, is_flee_on => Flee;
        arrive_on, arrive_off, is_arrive_on => Arrive;
        wander_on, wander_off, is_wander_on => Wander;
        cohesion_on, cohesion_off, is_cohesion_on => Cohesion;
        separation_on, separation_off, is_separation_on => Separation;
        alignment_on, alignment_off, is_alignment_on => Alignment;
        obstacle_avoidance_on, obstacle_avoidance_off, is_obstacle_avoidance_on => ObstacleAvoidance;
        wall_avoidance_on, wall_avoidance_off, is_wall_avoidance_on => WallAvoidance;
        follow_path_on, follow_path_off, is_follow_path_on => FollowPath;
    }

    targeted_toggles! {
        pursuit_off, is_pursuit_on => Pursuit;
        evade_off, is_evade_on => Evade;
        interpose_off, is_interpose_on => Interpose;
        hide_off, is_hide_on => Hide;
        offset_pursuit_off, is_offset_pursuit_on => OffsetPursuit;
    }

    pub fn pursuit_on(&mut self, evader: VehicleId) {
        self.target_agent1 = Some(evader);
        self.on(Behavior::Pursuit);
    }

    pub fn evade_on(&mut self, pursuer: VehicleId) {
        self.target_agent1 = Some(pursuer);
        self.on(Behavior::Evade);
    }

    pub fn hide_on(&mut self, hunter: VehicleId) {
        self.target_agent1 = Some(hunter);
        self.on(Behavior::Hide);
    }

    pub fn interpose_on(&mut self, a: VehicleId, b: VehicleId) {
        self.target_agent1 = Some(a);
        self.target_agent2 = Some(b);
        self.on(Behavior::Interpose);
    }

    pub fn offset_pursuit_on(&mut self, leader: VehicleId, offset: Vector2D) {
        self.target_agent1 = Some(leader);
        self.offset = Some(offset);
        self.on(Behavior::OffsetPursuit);
    }

    pub fn flocking_on(&mut self) {
        self.flags |= BehaviorFlags::FLOCKING;
        self.wander_on();
    }

    pub fn flocking_off(&mut self) {
        self.flags -= BehaviorFlags::FLOCKING;
        self.wander_off();
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    pub fn summing_method(&self) -> SummingMethod {
        self.summing_method
    }

    pub fn set_summing_method(&mut self, method: SummingMethod) {
        self.summing_method = method;
    }

    pub fn set_target_agent1(&mut self, target: Option<VehicleId>) {
        self.target_agent1 = target;
    }

    pub fn set_target_agent2(&mut self, target: Option<VehicleId>) {
        self.target_agent2 = target;
    }

    pub fn target_agent1(&self) -> Option<VehicleId> {
        self.target_agent1
    }

    pub fn target_agent2(&self) -> Option<VehicleId> {
        self.target_agent2
    }

    pub fn set_offset(&mut self, offset: Vector2D) {
        self.offset = Some(offset);
    }

    pub fn offset(&self) -> Option<Vector2D> {
        self.offset
    }

    pub fn set_path(&mut self, waypoints: &[Vector2D]) {
        self.path.set(waypoints.iter().copied());
    }

    pub fn path_mut(&mut self) -> &mut Path {
        &mut self.path
    }

    pub fn set_deceleration(&mut self, deceleration: Deceleration) {
        self.deceleration = deceleration;
    }

    pub fn set_evade_threat_range(&mut self, range: Option<f64>) {
        self.evade_threat_range = range;
    }

    pub fn is_space_partitioning_on(&self) -> bool {
        self.space_partitioning
    }

    pub fn set_space_partitioning(&mut self, on: bool) {
        self.space_partitioning = on;
    }

    pub fn toggle_space_partitioning(&mut self) {
        self.space_partitioning = !self.space_partitioning;
    }

    pub fn view_distance(&self) -> f64 {
        self.view_distance
    }

    pub fn wander_radius(&self) -> f64 {
        self.wander_radius
    }

    pub fn wander_distance(&self) -> f64 {
        self.wander_distance
    }

    pub fn wander_jitter(&self) -> f64 {
        self.wander_jitter
    }

    pub fn set_wander_radius(&mut self, radius: f64) {
        self.wander_radius = radius.clamp(0.0, 100.0);
    }

    pub fn set_wander_distance(&mut self, distance: f64) {
        self.wander_distance = distance.clamp(0.0, 50.0);
    }

    pub fn set_wander_jitter(&mut self, jitter: f64) {
        self.wander_jitter = jitter.clamp(0.0, 100.0);
    }

    // ------------------------------------------------------------------------
    // Read-only state for rendering
    // ------------------------------------------------------------------------

    /// Force produced by the last [`SteeringBehavior::calculate`].
    pub fn force(&self) -> Vector2D {
        self.force
    }

    /// Component of the last force along the agent's heading.
    pub fn forward_component(&self, agent: &MovingEntity) -> f64 {
        agent.heading().dot(self.force)
    }

    pub fn side_component(&self, agent: &MovingEntity) -> f64 {
        agent.side().dot(self.force)
    }

    /// Feeler endpoints from the last wall avoidance pass.
    pub fn feelers(&self) -> &[Vector2D; 3] {
        &self.feelers
    }

    pub fn detection_box_length(&self) -> f64 {
        self.detection_box_length
    }

    /// Wander target in the agent's local space, on the wander circle.
    pub fn wander_target(&self) -> Vector2D {
        self.wander_target
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Behaviours whose force function ran during the last calculation.
    pub fn evaluated_behaviors(&self) -> BehaviorFlags {
        self.evaluated
    }
}
