use std::f64::consts::{FRAC_1_SQRT_2, PI};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;
use crate::game::config::Params;

const DT: f64 = 1.0 / 60.0;

fn agent_at(x: f64, y: f64) -> MovingEntity {
    MovingEntity::new(
        Vector2D::new(x, y),
        1.0,
        Vector2D::ZERO,
        Vector2D::new(1.0, 0.0),
        1.0,
        10.0,
        100.0,
        PI,
    )
}

/// Owns everything a `SteeringContext` borrows.
struct Scene {
    agents: Vec<MovingEntity>,
    obstacles: Vec<Obstacle>,
    walls: Vec<Wall2D>,
    grid: SpatialGrid<VehicleId>,
    crosshair: Vector2D,
}

impl Scene {
    fn new(agents: Vec<MovingEntity>) -> Self {
        let mut grid = SpatialGrid::new(200.0, 200.0, 5, 5, 16);
        for (i, a) in agents.iter().enumerate() {
            grid.insert(VehicleId(i), a.pos());
        }
        Self {
            agents,
            obstacles: Vec::new(),
            walls: Vec::new(),
            grid,
            crosshair: Vector2D::new(100.0, 0.0),
        }
    }

    fn ctx(&mut self) -> SteeringContext<'_> {
        SteeringContext {
            agents: &mut self.agents,
            obstacles: &mut self.obstacles,
            walls: &self.walls,
            grid: &mut self.grid,
            crosshair: self.crosshair,
            world_size: Vector2D::new(200.0, 200.0),
        }
    }

    /// Steering force for agent 0.
    fn calculate(&mut self, steering: &mut SteeringBehavior) -> SteeringResult<Vector2D> {
        let me = self.agents[0].clone();
        steering.calculate(VehicleId(0), &me, DT, &mut self.ctx())
    }
}

/// Every behaviour off, unit weights.
fn steering() -> SteeringBehavior {
    let mut steering = SteeringBehavior::from_params(&Params::default(), StdRng::seed_from_u64(1));
    steering.weights = BehaviorWeights {
        separation: 1.0,
        alignment: 1.0,
        cohesion: 1.0,
        obstacle_avoidance: 1.0,
        wall_avoidance: 1.0,
        wander: 1.0,
        seek: 1.0,
        flee: 1.0,
        arrive: 1.0,
        pursuit: 1.0,
        offset_pursuit: 1.0,
        interpose: 1.0,
        hide: 1.0,
        evade: 1.0,
        follow_path: 1.0,
    };
    steering
}

fn approx(a: Vector2D, b: Vector2D) -> bool {
    (a - b).length() < 1e-9
}

// ============================================================================
// Force accumulation
// ============================================================================

#[test]
fn test_accumulate_exact_headroom_then_nothing() {
    let mut running = Vector2D::new(3.0, 0.0);
    assert!(accumulate_force(&mut running, Vector2D::new(7.0, 0.0), 10.0));
    assert!((running.length() - 10.0).abs() < 1e-12, "budget should be exactly spent");

    for _ in 0..5 {
        assert!(!accumulate_force(&mut running, Vector2D::new(0.0, 1.0), 10.0));
    }
    assert_eq!(running, Vector2D::new(10.0, 0.0), "no-headroom calls must not touch the total");
}

#[test]
fn test_accumulate_truncates_to_remaining() {
    let mut running = Vector2D::new(0.0, 6.0);
    assert!(accumulate_force(&mut running, Vector2D::new(0.0, 100.0), 10.0));
    assert!(approx(running, Vector2D::new(0.0, 10.0)));
}

// ============================================================================
// Summing methods
// ============================================================================

#[test]
fn test_prioritized_stops_at_the_budget() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    scene.agents[0].max_force = 1.0;

    let mut steering = steering();
    steering.weights.flee = 10.0;
    steering.flee_on();
    steering.seek_on();

    let force = scene.calculate(&mut steering).unwrap();

    assert!(approx(force, Vector2D::new(-1.0, 0.0)), "got {:?}", force);
    assert!(steering.evaluated_behaviors().contains(BehaviorFlags::FLEE));
    assert!(
        !steering.evaluated_behaviors().contains(BehaviorFlags::SEEK),
        "seek ran after the budget was spent"
    );
}

#[test]
fn test_weighted_sum_evaluates_everything() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    let mut steering = steering();
    steering.set_summing_method(SummingMethod::WeightedAverage);
    steering.flee_on();
    steering.seek_on();

    let force = scene.calculate(&mut steering).unwrap();

    assert!(force.is_zero(), "seek and flee at equal weight cancel, got {:?}", force);
    assert!(steering.evaluated_behaviors().contains(BehaviorFlags::FLEE | BehaviorFlags::SEEK));
}

#[test]
fn test_weighted_sum_truncates_total() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    scene.agents[0].max_force = 4.0;
    let mut steering = steering();
    steering.set_summing_method(SummingMethod::WeightedAverage);
    steering.seek_on();

    let force = scene.calculate(&mut steering).unwrap();
    assert!(approx(force, Vector2D::new(4.0, 0.0)));
}

#[test]
fn test_dithered_scales_by_weight_over_probability() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    let mut steering = steering();
    steering.set_summing_method(SummingMethod::Dithered);
    steering.probabilities.seek = Some(1.0);
    steering.weights.seek = 2.0;
    steering.seek_on();

    let force = scene.calculate(&mut steering).unwrap();
    assert!(approx(force, Vector2D::new(20.0, 0.0)), "got {:?}", force);
}

#[test]
fn test_dithered_skips_behaviours_without_probability() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0), agent_at(50.0, 0.0)]);
    let mut steering = steering();
    steering.set_summing_method(SummingMethod::Dithered);
    assert_eq!(steering.probabilities.pursuit, None);
    steering.pursuit_on(VehicleId(1));

    let force = scene.calculate(&mut steering).unwrap();
    assert!(force.is_zero());
    assert!(steering.evaluated_behaviors().is_empty());
}

#[test]
fn test_dithered_picks_at_most_one_behaviour() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    let mut steering = steering();
    steering.set_summing_method(SummingMethod::Dithered);
    steering.probabilities.flee = Some(0.5);
    steering.probabilities.seek = Some(1.0);
    steering.flee_on();
    steering.seek_on();

    for _ in 0..200 {
        let force = scene.calculate(&mut steering).unwrap();
        let flee = approx(force, Vector2D::new(-20.0, 0.0));
        let seek = approx(force, Vector2D::new(10.0, 0.0));
        assert!(flee || seek, "unexpected mix {:?}", force);
    }
}

#[test]
fn test_priority_order_lists_every_behaviour_once() {
    let mut seen = BehaviorFlags::empty();
    for behavior in PRIORITY_ORDER {
        assert!(!seen.contains(behavior.flag()), "{} listed twice", behavior);
        seen |= behavior.flag();
    }
    assert_eq!(seen.bits().count_ones() as usize, Behavior::COUNT);
    assert_eq!(PRIORITY_ORDER[0], Behavior::WallAvoidance);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_pursuit_without_target_is_an_error() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    let mut steering = steering();
    steering.on(Behavior::Pursuit);

    let err = scene.calculate(&mut steering).unwrap_err();
    assert_eq!(err, SteeringError::MissingTarget { behavior: Behavior::Pursuit });
}

#[test]
fn test_interpose_needs_both_targets() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0), agent_at(10.0, 0.0)]);
    let mut steering = steering();
    steering.set_target_agent1(Some(VehicleId(1)));
    steering.on(Behavior::Interpose);

    let err = scene.calculate(&mut steering).unwrap_err();
    assert_eq!(err, SteeringError::MissingTarget { behavior: Behavior::Interpose });
}

#[test]
fn test_offset_pursuit_without_offset_is_an_error() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0), agent_at(10.0, 0.0)]);
    let mut steering = steering();
    steering.set_target_agent1(Some(VehicleId(1)));
    steering.on(Behavior::OffsetPursuit);

    assert_eq!(scene.calculate(&mut steering).unwrap_err(), SteeringError::MissingOffset);
}

#[test]
fn test_unknown_target_is_an_error() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    let mut steering = steering();
    steering.evade_on(VehicleId(42));

    assert_eq!(
        scene.calculate(&mut steering).unwrap_err(),
        SteeringError::UnknownAgent(VehicleId(42))
    );
}

// ============================================================================
// Individual behaviours
// ============================================================================

#[test]
fn test_arrive_at_rest_far_away_goes_full_speed() {
    let agent = agent_at(0.0, 0.0);
    let force = arrive(&agent, Vector2D::new(100.0, 0.0), Deceleration::Normal);
    assert!(approx(force, Vector2D::new(10.0, 0.0)));
}

#[test]
fn test_arrive_on_target_is_zero() {
    let mut agent = agent_at(5.0, 5.0);
    agent.velocity = Vector2D::new(1.0, 1.0);
    assert!(arrive(&agent, Vector2D::new(5.0, 5.0), Deceleration::Slow).is_zero());
}

#[test]
fn test_arrive_slows_inside_the_braking_zone() {
    let agent = agent_at(0.0, 0.0);
    // 1.8 / (3 * 0.3) = 2 units per second.
    let force = arrive(&agent, Vector2D::new(1.8, 0.0), Deceleration::Slow);
    assert!(approx(force, Vector2D::new(2.0, 0.0)), "got {:?}", force);
}

#[test]
fn test_pursuit_ahead_and_head_on_seeks_directly() {
    let pursuer = agent_at(0.0, 0.0);
    let mut evader = MovingEntity::new(
        Vector2D::new(50.0, 0.0),
        1.0,
        Vector2D::new(-5.0, 3.0),
        Vector2D::new(-1.0, 0.0),
        1.0,
        10.0,
        100.0,
        PI,
    );
    assert!(approx(pursuit(&pursuer, &evader), seek(&pursuer, evader.pos())));

    evader.set_heading(Vector2D::new(0.0, 1.0)).unwrap();
    assert!(
        !approx(pursuit(&pursuer, &evader), seek(&pursuer, evader.pos())),
        "a crossing evader should be intercepted, not chased"
    );
}

#[test]
fn test_evade_ignores_distant_pursuer() {
    let agent = agent_at(0.0, 0.0);
    let pursuer = agent_at(150.0, 0.0);
    assert!(evade(&agent, &pursuer, Some(100.0)).is_zero());
    assert!(evade(&agent, &pursuer, None).x < 0.0);
}

#[test]
fn test_hide_falls_back_to_evade() {
    let agent = agent_at(0.0, 0.0);
    let hunter = agent_at(20.0, 0.0);
    assert!(approx(hide(&agent, &hunter, &[], None), evade(&agent, &hunter, None)));
}

#[test]
fn test_hiding_spot_is_behind_the_obstacle() {
    let spot = hiding_position(Vector2D::new(50.0, 0.0), 10.0, Vector2D::new(0.0, 0.0));
    assert!(approx(spot, Vector2D::new(50.0 + 10.0 + HIDING_DISTANCE_FROM_BOUNDARY, 0.0)));
}

#[test]
fn test_offset_pursuit_of_stationary_leader_heads_for_the_slot() {
    let agent = agent_at(0.0, 0.0);
    let leader = agent_at(50.0, 50.0);
    // Leader faces +x, so a local offset of (-10, 0) sits behind it.
    let force = offset_pursuit(&agent, &leader, Vector2D::new(-10.0, 0.0));
    let expected = Vector2D::new(40.0, 50.0).normalized() * agent.max_speed;
    assert!(approx(force, expected), "got {:?}", force);
}

#[test]
fn test_interpose_heads_for_the_midpoint() {
    let agent = agent_at(0.0, 100.0);
    let a = agent_at(-50.0, 0.0);
    let b = agent_at(50.0, 0.0);
    let force = interpose(&agent, &a, &b);
    assert!(force.x.abs() < 1e-9 && force.y < 0.0, "got {:?}", force);
}

#[test]
fn test_obstacle_ahead_pushes_sideways_and_brakes() {
    let mut scene = Scene::new(vec![agent_at(100.0, 100.0)]);
    scene.obstacles.push(Obstacle::new(Vector2D::new(120.0, 100.0), 5.0));
    let mut steering = steering();
    steering.obstacle_avoidance_on();

    let force = scene.calculate(&mut steering).unwrap();

    // Box is 40 long at rest; obstacle 20 ahead gives a 1.5 lateral multiplier.
    assert!(approx(force, Vector2D::new(-3.0, 7.5)), "got {:?}", force);
    assert!(scene.obstacles[0].is_tagged());
    assert_eq!(steering.detection_box_length(), 40.0);
}

#[test]
fn test_obstacle_behind_is_ignored() {
    let mut scene = Scene::new(vec![agent_at(100.0, 100.0)]);
    scene.obstacles.push(Obstacle::new(Vector2D::new(85.0, 100.0), 5.0));
    let mut steering = steering();
    steering.obstacle_avoidance_on();

    assert!(scene.calculate(&mut steering).unwrap().is_zero());
}

#[test]
fn test_side_feelers_use_fixed_angles() {
    let mut scene = Scene::new(vec![agent_at(100.0, 100.0)]);
    let mut steering = steering();
    steering.wall_avoidance_on();
    scene.calculate(&mut steering).unwrap();

    let [front, first, second] = *steering.feelers();
    assert!(approx(front, Vector2D::new(140.0, 100.0)));

    // 3.5 and 0.5 half-turns of a quarter circle land at -45 and +45 degrees.
    let reach = 20.0 * FRAC_1_SQRT_2;
    assert!(approx(first, Vector2D::new(100.0 + reach, 100.0 - reach)), "got {:?}", first);
    assert!(approx(second, Vector2D::new(100.0 + reach, 100.0 + reach)), "got {:?}", second);
}

#[test]
fn test_wall_ahead_pushes_along_its_normal() {
    let mut scene = Scene::new(vec![agent_at(100.0, 100.0)]);
    scene.walls.push(Wall2D::new(Vector2D::new(120.0, 50.0), Vector2D::new(120.0, 150.0)));
    let mut steering = steering();
    steering.wall_avoidance_on();

    let force = scene.calculate(&mut steering).unwrap();
    assert!(approx(force, Vector2D::new(-20.0, 0.0)), "got {:?}", force);
}

#[test]
fn test_wander_target_stays_on_its_circle() {
    let mut scene = Scene::new(vec![agent_at(100.0, 100.0)]);
    let mut steering = steering();
    steering.wander_on();
    let radius = steering.wander_radius();

    for frame in 0..1000 {
        scene.calculate(&mut steering).unwrap();
        let len = steering.wander_target().length();
        assert!(len <= radius + 1e-9, "frame {}: target {} off a circle of {}", frame, len, radius);
    }
}

#[test]
fn test_follow_path_advances_and_parks() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0)]);
    let mut steering = steering();
    steering.set_path(&[Vector2D::new(1.0, 0.0), Vector2D::new(100.0, 0.0)]);
    steering.path_mut().loop_off();
    steering.follow_path_on();

    scene.calculate(&mut steering).unwrap();
    assert_eq!(steering.path().current_waypoint(), Some(Vector2D::new(100.0, 0.0)));
    assert!(steering.path().is_finished());
}

// ============================================================================
// Flocking
// ============================================================================

#[test]
fn test_separation_at_unit_distance() {
    let mut agents = vec![agent_at(0.0, 0.0), agent_at(1.0, 0.0)];
    agents.iter_mut().for_each(|a| a.tag());

    let on_first = separation(&agents[0], &agents, None);
    let on_second = separation(&agents[1], &agents, None);

    assert!(approx(on_first, Vector2D::new(-1.0, 0.0)), "got {:?}", on_first);
    assert!(approx(on_second, Vector2D::new(1.0, 0.0)), "got {:?}", on_second);
}

#[test]
fn test_cohesion_without_neighbours_is_zero() {
    let agents = vec![agent_at(0.0, 0.0), agent_at(30.0, 0.0)];
    assert!(cohesion(&agents[0], &agents, None).is_zero());
    assert!(alignment(&agents[0], &agents, None).is_zero());
}

#[test]
fn test_flocking_skips_the_excluded_target() {
    let mut agents = vec![agent_at(0.0, 0.0), agent_at(1.0, 0.0)];
    agents.iter_mut().for_each(|a| a.tag());
    assert!(separation(&agents[0], &agents, Some(VehicleId(1))).is_zero());
}

#[test]
fn test_flocking_tags_neighbours_in_view() {
    let mut scene = Scene::new(vec![agent_at(0.0, 0.0), agent_at(10.0, 0.0), agent_at(150.0, 0.0)]);
    let mut steering = steering();
    steering.separation_on();

    scene.calculate(&mut steering).unwrap();

    assert!(!scene.agents[0].is_tagged(), "an agent is not its own neighbour");
    assert!(scene.agents[1].is_tagged());
    assert!(!scene.agents[2].is_tagged());
}

#[test]
fn test_partitioned_flocking_matches_tagging() {
    let positions = [(20.0, 20.0), (23.0, 20.0), (20.0, 24.0), (60.0, 30.0), (190.0, 190.0)];
    let agents: Vec<_> = positions.iter().map(|&(x, y)| agent_at(x, y)).collect();

    let mut by_tag = Scene::new(agents.clone());
    let mut by_grid = Scene::new(agents);

    let mut tagging = steering();
    tagging.set_summing_method(SummingMethod::WeightedAverage);
    tagging.flocking_on();
    tagging.wander_off();
    let mut partitioned = tagging.clone();
    partitioned.set_space_partitioning(true);

    let a = by_tag.calculate(&mut tagging).unwrap();
    let b = by_grid.calculate(&mut partitioned).unwrap();
    assert!(approx(a, b), "tagging {:?} vs grid {:?}", a, b);
    assert!(!a.is_zero());
}

#[test]
fn test_flocking_on_also_wanders() {
    let mut steering = steering();
    steering.flocking_on();
    assert!(steering.flags().contains(BehaviorFlags::FLOCKING | BehaviorFlags::WANDER));
    steering.flocking_off();
    assert!(steering.flags().is_empty());
}

#[test]
fn test_wander_setters_clamp() {
    let mut steering = steering();
    steering.set_wander_radius(500.0);
    steering.set_wander_distance(-3.0);
    steering.set_wander_jitter(42.0);
    assert_eq!(steering.wander_radius(), 100.0);
    assert_eq!(steering.wander_distance(), 0.0);
    assert_eq!(steering.wander_jitter(), 42.0);
}
