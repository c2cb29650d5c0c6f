//! End-to-end locomotion scenarios driven through `Simulation`.
//! Each test scripts a short input sequence and checks the resulting state
//! changes, velocities and events.
//!
//! Run with: cargo test --test locomotion_scenarios_test -- --nocapture

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use std::sync::Arc;

use kickturn::config::{PhysicsParameterTable, SkaterStats};
use kickturn::game::constants::physics::TIMESTEP;
use kickturn::game::events::{GrindEndReason, SkaterEvent};
use kickturn::game::geometry::{CollisionMask, Layer, Rgba};
use kickturn::game::intent::Intent;
use kickturn::game::physics::PhysicsWorld;
use kickturn::game::rails::{RailId, RailNetwork, RailPath, TaggedMesh};
use kickturn::game::skater::{GrindRequest, SkaterId};
use kickturn::game::states::{SkaterState, StateKind};
use kickturn::game::Simulation;

// ---------------------------------------------------------------------------
// Shared fixtures
// ---------------------------------------------------------------------------

const GREY: Rgba = Rgba::new(0.5, 0.5, 0.5, 0.0);

fn push() -> Intent {
    Intent {
        move_axis: Vector2::new(0.0, 1.0),
        ..Intent::default()
    }
}

/// Large flat floor at y = 0 with one skater resting on it, facing +Z.
fn floor_sim(stats: SkaterStats) -> (Simulation<PhysicsWorld>, SkaterId) {
    tagged_floor_sim(GREY, stats)
}

fn tagged_floor_sim(color: Rgba, stats: SkaterStats) -> (Simulation<PhysicsWorld>, SkaterId) {
    floor_sim_with(color, PhysicsParameterTable::default(), stats)
}

fn floor_sim_with(
    color: Rgba,
    params: PhysicsParameterTable,
    stats: SkaterStats,
) -> (Simulation<PhysicsWorld>, SkaterId) {
    let mut world = PhysicsWorld::new();
    world
        .add_surface(&TaggedMesh::floor(Vector3::zeros(), 200.0, 200.0, color), Layer::Ground)
        .unwrap();
    let mut sim = Simulation::new(world, RailNetwork::new(), Arc::new(params)).with_seed(3);
    let id = sim.spawn_skater(Vector3::new(0.0, 0.05, 0.0), UnitQuaternion::identity(), stats);
    (sim, id)
}

/// A 10 × 10 platform one metre up, over a large floor. The skater starts
/// on the platform centre facing +Z, five metres from the edge.
fn platform_sim(platform_color: Rgba) -> (Simulation<PhysicsWorld>, SkaterId) {
    let mut world = PhysicsWorld::new();
    world
        .add_surface(&TaggedMesh::floor(Vector3::zeros(), 200.0, 200.0, GREY), Layer::Ground)
        .unwrap();
    world
        .add_surface(
            &TaggedMesh::floor(Vector3::new(0.0, 1.0, 0.0), 5.0, 5.0, platform_color),
            Layer::Ground,
        )
        .unwrap();
    let mut sim = Simulation::new(world, RailNetwork::new(), Arc::new(PhysicsParameterTable::default()))
        .with_seed(3);
    let id = sim.spawn_skater(
        Vector3::new(0.0, 1.05, 0.0),
        UnitQuaternion::identity(),
        SkaterStats::default(),
    );
    (sim, id)
}

/// Settles the skater, then lifts it to `height` moving at `velocity` so the
/// next physics tick rolls it off into Airborne.
fn drop_from(sim: &mut Simulation<PhysicsWorld>, id: SkaterId, height: f32, velocity: Vector3<f32>) {
    sim.step(TIMESTEP);
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::StandingStill);
    let body = sim.skater_mut(id).unwrap().body_mut();
    body.position.y = height;
    body.velocity = velocity;
    sim.step(TIMESTEP);
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Airborne);
}

/// Puts a skater onto `path` at `distance`, moving along the path at `entry_speed`.
/// Returns once the skater is in Grinding.
fn grinding_sim(path: RailPath, distance: f32, entry_speed: f32) -> (Simulation<PhysicsWorld>, SkaterId, RailId) {
    grinding_sim_with(PhysicsParameterTable::default(), path, distance, entry_speed, false)
}

/// As `grinding_sim`, with custom tuning and optionally travelling toward
/// decreasing distance.
fn grinding_sim_with(
    params: PhysicsParameterTable,
    path: RailPath,
    distance: f32,
    entry_speed: f32,
    backward: bool,
) -> (Simulation<PhysicsWorld>, SkaterId, RailId) {
    let mut rails = RailNetwork::new();
    let rail = rails.insert(path.clone());
    let mut sim = Simulation::new(PhysicsWorld::new(), rails, Arc::new(params)).with_seed(11);
    let sample = path.point_at_distance(distance);
    let direction = if backward { -sample.tangent } else { sample.tangent };
    let id = sim.spawn_skater(
        sample.point + Vector3::y() * 0.1,
        UnitQuaternion::identity(),
        SkaterStats::default(),
    );

    // First logic tick enters StandingStill, which zeroes velocity.
    sim.update(TIMESTEP);
    let skater = sim.skater_mut(id).unwrap();
    skater.body_mut().velocity = direction * entry_speed;
    skater.request_grind(GrindRequest {
        rail,
        point: sample.point,
        direction,
        distance,
        normal: Vector3::y(),
    });
    sim.fixed_update(TIMESTEP);
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Grinding);
    (sim, id, rail)
}

/// Pushes for `ticks` physics ticks and returns the horizontal speed reached.
fn push_for(sim: &mut Simulation<PhysicsWorld>, id: SkaterId, ticks: usize) -> f32 {
    for _ in 0..ticks {
        sim.set_intent(id, &push()).unwrap();
        sim.step(TIMESTEP);
    }
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    sim.skater(id).unwrap().body().horizontal_speed()
}

fn changed(events: &[SkaterEvent], from: StateKind, to: StateKind) -> Option<usize> {
    events
        .iter()
        .position(|e| *e == SkaterEvent::StateChanged { from, to })
}

fn straight_rail(length: f32) -> RailPath {
    RailPath::from_points(
        vec![Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 1.0, length)],
        false,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Pushing and ollies
// ---------------------------------------------------------------------------

#[test]
fn test_push_from_standing() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    sim.step(TIMESTEP);
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::StandingStill);

    sim.set_intent(id, &push()).unwrap();
    sim.update(TIMESTEP);
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Skating);
    assert_relative_eq!(skater.body().velocity, Vector3::new(0.0, 0.0, 6.0), epsilon = 1.0e-4);

    // One physics tick of acceleration only nudges it.
    sim.fixed_update(TIMESTEP);
    let velocity = sim.skater(id).unwrap().body().velocity;
    assert_relative_eq!(velocity.norm(), 6.0, epsilon = 0.3);
    assert!(velocity.z > 0.0);

    let events = sim.drain_events(id).unwrap();
    assert!(events.contains(&SkaterEvent::StateChanged {
        from: StateKind::StandingStill,
        to: StateKind::Skating,
    }));
}

#[test]
fn test_full_charge_ollie_uses_base_force() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    sim.set_intent(id, &push()).unwrap();
    sim.step(TIMESTEP);
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    sim.skater_mut(id).unwrap().body_mut().velocity = Vector3::new(0.0, 0.0, 10.0);

    sim.set_intent(
        id,
        &Intent {
            jump_down: true,
            jump_held: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.step(TIMESTEP);
    let held = Intent {
        jump_held: true,
        ..Intent::default()
    };
    for _ in 0..70 {
        sim.set_intent(id, &held).unwrap();
        sim.step(TIMESTEP);
        assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    }

    sim.set_intent(
        id,
        &Intent {
            jump_up: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.update(TIMESTEP);
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Airborne);
    // ollie stat 5 samples the 7..12 range at 9.5, full charge keeps all of it
    assert_relative_eq!(skater.body().velocity.y, 9.5, epsilon = 1.0e-4);
    assert!(skater.body().ignore_ground);
}

#[test]
fn test_push_speed_never_exceeds_stat_maximum() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    let max_speed = PhysicsParameterTable::default()
        .max_push_speed
        .at(SkaterStats::default().speed);

    let mut top = 0.0f32;
    for _ in 0..240 {
        sim.set_intent(id, &push()).unwrap();
        sim.step(TIMESTEP);
        let speed = sim.skater(id).unwrap().body().horizontal_speed();
        assert!(speed <= max_speed + 1.0e-3, "speed {speed} over {max_speed}");
        top = top.max(speed);
    }
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    assert!(top > max_speed - 0.5, "never got near top speed: {top}");
}

#[test]
fn test_kickflip_completes_before_clean_landing() {
    let stats = SkaterStats {
        flip_speed: 10.0,
        ..SkaterStats::default()
    };
    let (mut sim, id) = floor_sim(stats);
    for _ in 0..30 {
        sim.set_intent(id, &push()).unwrap();
        sim.step(TIMESTEP);
    }

    sim.set_intent(
        id,
        &Intent {
            jump_down: true,
            jump_held: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.step(TIMESTEP);
    for _ in 0..65 {
        sim.set_intent(
            id,
            &Intent {
                jump_held: true,
                ..Intent::default()
            },
        )
        .unwrap();
        sim.step(TIMESTEP);
    }
    sim.set_intent(
        id,
        &Intent {
            jump_up: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.step(TIMESTEP);
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Airborne);

    let mut events = sim.drain_events(id).unwrap();
    for tick in 0..180 {
        let intent = Intent {
            trick_primary: tick == 15,
            ..Intent::default()
        };
        sim.set_intent(id, &intent).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        if sim.skater(id).unwrap().state_kind() == StateKind::Skating {
            break;
        }
    }
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);

    let completed = events
        .iter()
        .position(|e| matches!(e, SkaterEvent::TrickCompleted { name: "Kickflip", .. }))
        .expect("kickflip should complete in the air");
    let landed = events
        .iter()
        .position(|e| matches!(e, SkaterEvent::Landed { .. }))
        .expect("landing event");
    assert!(completed < landed);
    assert!(matches!(
        events[landed],
        SkaterEvent::Landed {
            clean: true,
            trick: None,
            switch_stance: false,
        }
    ));
    assert!(events.contains(&SkaterEvent::StateChanged {
        from: StateKind::Airborne,
        to: StateKind::Skating,
    }));
}

#[test]
fn test_ollie_off_vert_surface_goes_straight_up() {
    let vert = Rgba::rgb(PhysicsParameterTable::default().vert_color);
    let (mut sim, id) = tagged_floor_sim(vert, SkaterStats::default());
    for _ in 0..20 {
        sim.set_intent(id, &push()).unwrap();
        sim.step(TIMESTEP);
    }
    assert!(sim.skater(id).unwrap().body().last_contact.unwrap().is_vert);

    sim.set_intent(
        id,
        &Intent {
            jump_down: true,
            jump_up: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.update(TIMESTEP);
    let (launch_x, launch_z) = {
        let skater = sim.skater(id).unwrap();
        assert_eq!(skater.state_kind(), StateKind::VertAir);
        let body = skater.body();
        // tap at vert_jump_force stat 5 (13.0), half force, no forward boost
        assert_relative_eq!(body.velocity, Vector3::new(0.0, 6.5, 0.0), epsilon = 1.0e-4);
        (body.position.x, body.position.z)
    };

    let mut events = sim.drain_events(id).unwrap();
    for _ in 0..120 {
        sim.set_intent(id, &Intent::default()).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        let skater = sim.skater(id).unwrap();
        if skater.state_kind() == StateKind::Skating {
            break;
        }
        assert_relative_eq!(skater.body().position.x, launch_x);
        assert_relative_eq!(skater.body().position.z, launch_z);
    }
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    assert!(events.iter().any(|e| matches!(e, SkaterEvent::Landed { clean: true, .. })));
}

#[test]
fn test_partial_back_input_brakes_to_a_stop() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    let mut speed = push_for(&mut sim, id, 40);
    assert!(speed > 5.0, "push only reached {speed}");

    let brake = Intent {
        move_axis: Vector2::new(0.0, -0.3),
        ..Intent::default()
    };
    let mut zeroed = false;
    for _ in 0..300 {
        sim.set_intent(id, &brake).unwrap();
        sim.step(TIMESTEP);
        let skater = sim.skater(id).unwrap();
        if skater.state_kind() == StateKind::StandingStill {
            break;
        }
        let now = skater.body().horizontal_speed();
        assert!(now <= speed, "speed rose from {speed} to {now} under brake");
        if now == 0.0 {
            zeroed = true;
        }
        speed = now;
    }
    assert!(zeroed, "braking never snapped to a full stop");
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::StandingStill);
    assert_eq!(sim.skater(id).unwrap().previous_state_kind(), Some(StateKind::Skating));
}

// ---------------------------------------------------------------------------
// Landings and takeoffs
// ---------------------------------------------------------------------------

#[test]
fn test_fast_landing_is_capped_at_push_speed() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    let max_speed = PhysicsParameterTable::default()
        .max_push_speed
        .at(SkaterStats::default().speed);
    drop_from(&mut sim, id, 1.5, Vector3::new(0.0, 0.0, 25.0));

    for _ in 0..120 {
        sim.step(TIMESTEP);
        if sim.skater(id).unwrap().state_kind() != StateKind::Airborne {
            break;
        }
    }
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    assert!(sim.skater(id).unwrap().state().as_skating().unwrap().is_landing());

    // Through the landing blend and beyond
    for _ in 0..15 {
        let skater = sim.skater(id).unwrap();
        let skating = skater.state().as_skating().expect("still rolling");
        assert!(skating.speed() <= max_speed + 1.0e-3, "tracked {}", skating.speed());
        assert!(skater.body().horizontal_speed() <= max_speed + 1.0e-3);
        sim.set_intent(id, &Intent::default()).unwrap();
        sim.step(TIMESTEP);
    }
}

#[test]
fn test_half_turn_in_the_air_lands_switch() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    drop_from(&mut sim, id, 10.0, Vector3::new(0.0, 0.0, 6.0));

    let spin = Intent {
        move_axis: Vector2::new(1.0, 0.0),
        ..Intent::default()
    };
    let mut yaw = 0.0_f32;
    let mut events = sim.drain_events(id).unwrap();
    for tick in 0..120 {
        let intent = if tick < 30 { spin } else { Intent::default() };
        sim.set_intent(id, &intent).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        match sim.skater(id).unwrap().state().as_airborne() {
            Some(air) => yaw = air.total_yaw(),
            None => break,
        }
    }

    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Skating);
    assert!((135.0..=225.0).contains(&yaw.abs()), "air yaw {yaw}");
    assert!(skater.body().switch_stance);
    // The switch bias lets the board follow the travel direction instead of the pre-landing facing.
    assert!(skater.body().facing().z > 0.9, "facing {:?}", skater.body().facing());
    assert!(events.iter().any(|e| matches!(
        e,
        SkaterEvent::Landed {
            switch_stance: true,
            clean: true,
            ..
        }
    )));
}

#[test]
fn test_rolling_off_a_ledge_goes_airborne() {
    let (mut sim, id) = platform_sim(GREY);
    let mut events = Vec::new();
    for _ in 0..240 {
        sim.set_intent(id, &push()).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        let skater = sim.skater(id).unwrap();
        if skater.state_kind() == StateKind::Skating && skater.body().position.y < 0.5 {
            break;
        }
    }

    let took_off = changed(&events, StateKind::Skating, StateKind::Airborne).expect("never left the ledge");
    let landed = changed(&events, StateKind::Airborne, StateKind::Skating).expect("never landed below");
    assert!(took_off < landed);
    assert!(changed(&events, StateKind::Skating, StateKind::VertAir).is_none());
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Skating);
    assert!(skater.body().position.z > 5.0);
}

#[test]
fn test_rolling_off_a_vert_ledge_goes_vert_air() {
    let vert = Rgba::rgb(PhysicsParameterTable::default().vert_color);
    let (mut sim, id) = platform_sim(vert);
    let mut events = Vec::new();
    let mut launch = None;
    for _ in 0..240 {
        sim.set_intent(id, &push()).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        let skater = sim.skater(id).unwrap();
        match skater.state() {
            SkaterState::VertAir(air) => {
                let at = air.launch().position;
                assert_eq!(skater.body().position.x, at.x);
                assert_eq!(skater.body().position.z, at.z);
                launch = Some(at);
            }
            _ if launch.is_some() => break,
            _ => {}
        }
    }

    let launch = launch.expect("never entered vert air");
    assert!(launch.z > 5.0, "launched at {launch:?}");
    assert!(changed(&events, StateKind::Skating, StateKind::VertAir).is_some());
    assert!(changed(&events, StateKind::VertAir, StateKind::Skating).is_some());
    assert!(events.iter().any(|e| matches!(e, SkaterEvent::Landed { clean: true, .. })));
    assert!(sim.skater(id).unwrap().body().position.y < 0.5);
}

// ---------------------------------------------------------------------------
// Manuals and bails
// ---------------------------------------------------------------------------

fn enter_manual(sim: &mut Simulation<PhysicsWorld>, id: SkaterId) {
    push_for(sim, id, 30);
    sim.set_intent(
        id,
        &Intent {
            trick_alt: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.update(TIMESTEP);
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Manual);
    assert!(skater.balance().is_active());
}

#[test]
fn test_manual_decays_back_to_skating() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    enter_manual(&mut sim, id);

    let mut previous = sim.skater(id).unwrap().body().horizontal_speed();
    let mut events = sim.drain_events(id).unwrap();
    for _ in 0..120 {
        sim.set_intent(id, &Intent::default()).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        let skater = sim.skater(id).unwrap();
        if skater.state_kind() != StateKind::Manual {
            break;
        }
        let speed = skater.body().horizontal_speed();
        assert!(speed < previous, "manual speed {speed} did not decay");
        previous = speed;
    }

    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Skating);
    assert!(!skater.balance().is_active());
    assert!(changed(&events, StateKind::Skating, StateKind::Manual).is_some());
    assert!(changed(&events, StateKind::Manual, StateKind::Skating).is_some());
}

#[test]
fn test_manual_jump_is_a_half_ollie() {
    let (mut sim, id) = floor_sim(SkaterStats::default());
    enter_manual(&mut sim, id);

    sim.set_intent(
        id,
        &Intent {
            jump_down: true,
            jump_held: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.update(TIMESTEP);
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Airborne);
    // half of ollie_vertical_force at stat 5
    assert_relative_eq!(skater.body().velocity.y, 4.75, epsilon = 1.0e-4);
    assert!(skater.body().ignore_ground);
    assert!(!skater.balance().is_active());
}

#[test]
fn test_manual_balance_bail_then_recovery() {
    let mut params = PhysicsParameterTable::default();
    params.balance.manual.bail_threshold = 0.3;
    let (mut sim, id) = floor_sim_with(GREY, params, SkaterStats::default());
    enter_manual(&mut sim, id);

    let lean = Intent {
        move_axis: Vector2::new(1.0, 0.0),
        ..Intent::default()
    };
    let mut events = sim.drain_events(id).unwrap();
    for _ in 0..25 {
        sim.set_intent(id, &lean).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        if sim.skater(id).unwrap().state_kind() != StateKind::Manual {
            break;
        }
    }
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Bailed);
    assert!(changed(&events, StateKind::Manual, StateKind::Bailed).is_some());
    assert!(events.contains(&SkaterEvent::Bailed));
    assert!(!sim.skater(id).unwrap().balance().is_active());

    // Bailed holds for one second of physics time, then rolls on.
    let mut ticks = 0;
    while sim.skater(id).unwrap().state_kind() == StateKind::Bailed {
        assert!(ticks < 70, "never recovered from the bail");
        sim.set_intent(id, &Intent::default()).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        ticks += 1;
    }
    assert!(ticks >= 59, "recovered after {ticks} ticks");
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Skating);
    assert!(changed(&events, StateKind::Bailed, StateKind::Skating).is_some());
}

// ---------------------------------------------------------------------------
// Grinding
// ---------------------------------------------------------------------------

#[test]
fn test_rail_end_launches_airborne() {
    let (mut sim, id, rail) = grinding_sim(straight_rail(10.0), 9.5, 4.0);
    {
        let grind = sim.skater(id).unwrap().state().as_grinding().unwrap();
        // 4 × 1.2 clamps up to the minimum grind speed
        assert_relative_eq!(grind.speed(), 5.0);
        assert_eq!(grind.direction(), 1.0);
    }

    // The entry tick already advanced once; five more reach the end zone.
    let mut ticks = 1;
    while sim.skater(id).unwrap().state_kind() == StateKind::Grinding {
        assert!(ticks < 6, "grind did not end within 0.1s");
        sim.step(TIMESTEP);
        ticks += 1;
    }

    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Airborne);
    assert!(!skater.body().grinding);
    assert_relative_eq!(skater.body().velocity, Vector3::new(0.0, 0.0, 6.0), epsilon = 1.0e-3);

    let events = sim.drain_events(id).unwrap();
    assert!(events.contains(&SkaterEvent::GrindStarted { rail }));
    assert!(events.contains(&SkaterEvent::GrindEnded {
        rail,
        reason: GrindEndReason::RailEnd,
    }));
}

#[test]
fn test_leaning_off_the_rail_bails() {
    let (mut sim, id, rail) = grinding_sim(straight_rail(100.0), 1.0, 4.0);
    let lean = Intent {
        move_axis: Vector2::new(1.0, 0.0),
        ..Intent::default()
    };

    let mut tipped = false;
    for _ in 0..300 {
        sim.set_intent(id, &lean).unwrap();
        sim.update(TIMESTEP);
        assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Grinding);
        sim.fixed_update(TIMESTEP);
        if sim.skater(id).unwrap().balance().has_bailed() {
            tipped = true;
            break;
        }
    }
    assert!(tipped, "balance never crossed the bail line");
    assert!(sim.skater(id).unwrap().balance().value() > 1.0);

    sim.update(TIMESTEP);
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Bailed);
    assert!(!skater.balance().is_active());

    let events = sim.drain_events(id).unwrap();
    assert!(events.contains(&SkaterEvent::GrindEnded {
        rail,
        reason: GrindEndReason::Bail,
    }));
    assert!(events.contains(&SkaterEvent::Bailed));
}

#[test]
fn test_jump_off_restores_collision_after_delay() {
    let (mut sim, id, rail) = grinding_sim(straight_rail(100.0), 1.0, 4.0);
    for _ in 0..10 {
        sim.step(TIMESTEP);
    }
    assert_eq!(
        sim.skater(id).unwrap().body().collision_mask,
        CollisionMask::NONE
    );

    sim.set_intent(
        id,
        &Intent {
            jump_down: true,
            jump_held: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.step(TIMESTEP);
    sim.set_intent(
        id,
        &Intent {
            jump_up: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.update(TIMESTEP);

    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Airborne);
    assert!(!skater.body().grinding);
    // grind_exit_jump_force at ollie stat 5, riding regular
    assert_relative_eq!(skater.body().velocity.y, 8.0, epsilon = 1.0e-4);
    assert!(skater.body().velocity.z > 5.0);
    assert_eq!(skater.body().collision_mask, CollisionMask::NONE);

    sim.fixed_update(TIMESTEP);
    assert_eq!(
        sim.skater(id).unwrap().body().collision_mask,
        CollisionMask::NONE
    );
    for _ in 0..3 {
        sim.fixed_update(TIMESTEP);
    }
    assert_eq!(
        sim.skater(id).unwrap().body().collision_mask,
        CollisionMask::ALL
    );

    let events = sim.drain_events(id).unwrap();
    assert!(events.contains(&SkaterEvent::GrindEnded {
        rail,
        reason: GrindEndReason::JumpOff,
    }));
}

#[test]
fn test_neutral_grind_bleeds_speed() {
    let (mut sim, id, _) = grinding_sim(straight_rail(100.0), 1.0, 10.0);
    let entry = sim.skater(id).unwrap().state().as_grinding().unwrap().speed();
    assert_relative_eq!(entry, 12.0, epsilon = 0.1);

    let mut previous = entry;
    for _ in 0..30 {
        sim.set_intent(id, &Intent::default()).unwrap();
        sim.step(TIMESTEP);
        let speed = sim.skater(id).unwrap().state().as_grinding().unwrap().speed();
        assert!(speed < previous, "speed held at {speed}");
        previous = speed;
    }
    // 31 ticks at 5 m/s² from 12
    assert_relative_eq!(previous, 12.0 - 5.0 * 31.0 / 60.0, epsilon = 0.05);
}

#[test]
fn test_pulling_back_speeds_up_a_backward_grind() {
    let (mut sim, id, _) = grinding_sim_with(
        PhysicsParameterTable::default(),
        straight_rail(100.0),
        50.0,
        10.0,
        true,
    );
    let (entry_speed, entry_distance) = {
        let grind = sim.skater(id).unwrap().state().as_grinding().unwrap();
        assert_eq!(grind.direction(), -1.0);
        (grind.speed(), grind.distance())
    };

    let pull = Intent {
        move_axis: Vector2::new(0.0, -1.0),
        ..Intent::default()
    };
    for _ in 0..20 {
        sim.set_intent(id, &pull).unwrap();
        sim.step(TIMESTEP);
    }
    let grind = sim.skater(id).unwrap().state().as_grinding().unwrap();
    assert!(grind.speed() > entry_speed + 4.0);
    assert!(grind.distance() < entry_distance);
}

fn jump_off_with(move_axis: Vector2<f32>) -> Vector3<f32> {
    let (mut sim, id, _) = grinding_sim(straight_rail(100.0), 1.0, 4.0);
    sim.set_intent(
        id,
        &Intent {
            move_axis,
            jump_down: true,
            jump_held: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.step(TIMESTEP);
    sim.set_intent(
        id,
        &Intent {
            move_axis,
            jump_up: true,
            ..Intent::default()
        },
    )
    .unwrap();
    sim.update(TIMESTEP);
    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Airborne);
    skater.body().velocity
}

#[test]
fn test_stick_drift_does_not_push_off_the_rail() {
    let drift = jump_off_with(Vector2::new(0.02, 0.0));
    assert_relative_eq!(drift.x, 0.0, epsilon = 1.0e-4);

    let full = jump_off_with(Vector2::new(1.0, 0.0));
    assert_relative_eq!(full.x.abs(), 18.0, epsilon = 1.0e-2);
}

#[test]
fn test_stalled_grind_bails_after_stuck_limit() {
    // Without a speed floor or speed bail only the stuck check can end this grind.
    let mut params = PhysicsParameterTable::default();
    params.grind.min_speed = 0.0;
    params.grind.min_speed_to_bail = 0.0;
    let (mut sim, id, rail) = grinding_sim_with(params, straight_rail(20.0), 5.0, 0.0, false);
    assert_relative_eq!(sim.skater(id).unwrap().state().as_grinding().unwrap().speed(), 0.0);

    let mut ticks = 1;
    while sim.skater(id).unwrap().state_kind() == StateKind::Grinding {
        assert!(ticks < 60, "stalled grind never bailed");
        sim.step(TIMESTEP);
        ticks += 1;
    }
    // 0.75 s of no movement
    assert!(ticks >= 44, "bailed after only {ticks} ticks");
    assert_eq!(sim.skater(id).unwrap().state_kind(), StateKind::Bailed);

    let events = sim.drain_events(id).unwrap();
    assert!(events.contains(&SkaterEvent::GrindEnded {
        rail,
        reason: GrindEndReason::Bail,
    }));
    assert!(events.contains(&SkaterEvent::Bailed));
}

#[test]
fn test_air_rail_detection_starts_a_grind() {
    let mut world = PhysicsWorld::new();
    world
        .add_surface(&TaggedMesh::floor(Vector3::zeros(), 50.0, 50.0, GREY), Layer::Ground)
        .unwrap();
    let mut rails = RailNetwork::new();
    let path = RailPath::from_points(
        vec![Vector3::new(0.0, 0.5, 0.0), Vector3::new(0.0, 0.5, 30.0)],
        false,
    )
    .unwrap();
    let rail = rails.insert(path.clone());
    world.add_rail(rail, &path);

    let mut sim = Simulation::new(world, rails, Arc::new(PhysicsParameterTable::default())).with_seed(5);
    let id = sim.spawn_skater(
        Vector3::new(0.0, 0.05, 2.0),
        UnitQuaternion::identity(),
        SkaterStats::default(),
    );
    drop_from(&mut sim, id, 1.5, Vector3::new(0.0, 0.0, 6.0));

    let hold_grind = Intent {
        grind_held: true,
        ..Intent::default()
    };
    let mut events = sim.drain_events(id).unwrap();
    for _ in 0..30 {
        sim.set_intent(id, &hold_grind).unwrap();
        sim.step(TIMESTEP);
        events.extend(sim.drain_events(id).unwrap());
        if sim.skater(id).unwrap().state_kind() != StateKind::Airborne {
            break;
        }
    }

    let skater = sim.skater(id).unwrap();
    assert_eq!(skater.state_kind(), StateKind::Grinding);
    assert!(changed(&events, StateKind::Airborne, StateKind::Grinding).is_some());
    assert!(events.contains(&SkaterEvent::GrindStarted { rail }));
    assert!(skater.body().grinding);
    assert_relative_eq!(skater.body().position.x, 0.0, epsilon = 0.05);
    assert!((skater.body().position.y - 0.6).abs() < 0.1);
    let grind = skater.state().as_grinding().unwrap();
    assert_eq!(grind.direction(), 1.0);
    assert!(grind.speed() > 6.0);
}
