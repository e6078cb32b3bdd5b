//! Scenario tests for amb-director: full ticks through adapters, engine and sweep.

use std::cell::RefCell;
use std::rc::Rc;

use amb_adapters::{AdapterCtx, AdapterResult, Subsystem};
use amb_core::{EntityHandle, IncidentId, OwnerId, Vec3};
use amb_incident::{
    BreakdownPhase, IncidentError, IncidentKind, IncidentSpec, Interaction, Phase, RecordingObserver, Role,
    TeardownReason,
};
use amb_world::{SandboxWorld, Seat, WorldQuery};

use crate::{AmbientConfig, Director, DirectorBuilder, DirectorError, NoopObserver};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// East-west road from x = -400 to x = 400.
fn road() -> SandboxWorld {
    let mut w = SandboxWorld::new();
    w.add_road(Vec3::new(-400.0, 0.0, 0.0), Vec3::new(400.0, 0.0, 0.0), 10.0);
    w
}

fn parked(w: &mut SandboxWorld, x: f32) -> (EntityHandle, EntityHandle) {
    let car = w.add_vehicle(Vec3::new(x, 0.0, 0.0), 90.0);
    let driver = w.add_agent_in(car, Seat::Driver);
    (car, driver)
}

/// Road with the player parked at the origin, some traffic and a few
/// pedestrians on the verge.
fn street() -> SandboxWorld {
    let mut w = road();
    let (_, player) = parked(&mut w, 0.0);
    w.set_player(player);
    for x in [35.0, 70.0, -60.0, 220.0, -250.0] {
        parked(&mut w, x);
    }
    for x in [15.0, 95.0, 140.0, -120.0] {
        w.add_agent(Vec3::new(x, 6.0, 0.0));
    }
    w
}

fn bare(config: AmbientConfig, world: SandboxWorld) -> Director<SandboxWorld> {
    DirectorBuilder::new(config, world).without_default_adapters().build().unwrap()
}

/// Claim `car` and `driver` for `owner` and start a breakdown over them.
fn start_breakdown(
    d:      &mut Director<SandboxWorld>,
    obs:    &mut RecordingObserver,
    owner:  &str,
    car:    EntityHandle,
    driver: EntityHandle,
) -> IncidentId {
    let owner = OwnerId::from(owner);
    let now = d.clock.now();
    assert!(d.arbiter.try_acquire_all(&d.world, &[car, driver], &owner, 5, now));
    let at = d.world.position(car).unwrap();
    let spec = IncidentSpec::new(IncidentKind::Breakdown, at, owner, 5)
        .agent(Role::Driver, driver)
        .vehicle(Role::Car, car);
    d.engine.create(spec, now, &mut d.world, &d.arbiter, obs).unwrap()
}

/// Every member of every live incident is held by that incident's owner.
fn assert_members_owned(d: &Director<SandboxWorld>) {
    for inc in d.engine.iter() {
        for h in inc.handles() {
            assert!(
                d.arbiter.holds(h, &inc.owner),
                "{} references {h} without holding it at tick {}",
                inc.id,
                d.clock.now().0
            );
        }
    }
}

// ── Lifecycle without adapters ────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn unattended_breakdown_reaches_age_cap_and_frees_everything() {
        let mut config = AmbientConfig::default();
        config.incidents.max_age_secs = 600.0;
        config.incidents.interaction_window_secs = 1_000.0;
        let mut world = road();
        let (car, driver) = parked(&mut world, 50.0);
        let mut d = bare(config, world);
        let mut obs = RecordingObserver::new();
        let id = start_breakdown(&mut d, &mut obs, "adapter.a", car, driver);

        d.run_ticks(29, &mut obs);
        assert_eq!(d.engine.get(id).unwrap().phase, Phase::Breakdown(BreakdownPhase::Inspecting));
        d.run_ticks(76, &mut obs);
        assert_eq!(d.engine.get(id).unwrap().phase, Phase::Breakdown(BreakdownPhase::Diagnosing));

        let mut ended = false;
        for _ in 0..6_000 {
            d.tick(&mut obs);
            if d.engine.get(id).is_none() {
                assert!(!d.arbiter.is_locked(car));
                assert!(!d.arbiter.is_locked(driver));
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(obs.teardown_of(id), Some(&TeardownReason::AgeCap));
        assert!(d.clock.elapsed_secs() > 600.0);
    }

    #[test]
    fn sweep_evicts_records_of_vanished_entities() {
        let mut world = road();
        let ghost = world.add_agent(Vec3::new(10.0, 5.0, 0.0));
        let mut d = bare(AmbientConfig::default(), world);
        let owner = OwnerId::from("adapter.ghost");
        assert!(d.arbiter.try_acquire(&d.world, ghost, &owner, 1, d.clock.now()));
        d.world.destroy(ghost);

        d.run_ticks(50, &mut NoopObserver);
        assert!(d.arbiter.is_locked(ghost), "no sweep before the interval");
        let summary = d.tick(&mut NoopObserver);
        assert_eq!(summary.evicted, vec![ghost]);
        assert!(!d.arbiter.is_locked(ghost));
        assert_eq!(d.stats.evicted, 1);
    }

    #[test]
    fn interaction_is_forwarded() {
        let mut world = road();
        let (car, driver) = parked(&mut world, 50.0);
        let mut d = bare(AmbientConfig::default(), world);
        let mut obs = RecordingObserver::new();
        let id = start_breakdown(&mut d, &mut obs, "adapter.a", car, driver);

        assert!(matches!(
            d.interact(id, Interaction::Repair),
            Err(DirectorError::Incident(IncidentError::InteractionRejected { .. }))
        ));
        d.run_ticks(120, &mut obs);
        d.interact(id, Interaction::Repair).unwrap();
        d.tick(&mut obs);
        assert_eq!(d.engine.get(id).unwrap().phase, Phase::Breakdown(BreakdownPhase::Repairing));
        assert!(matches!(
            d.interact(IncidentId(99), Interaction::Repair),
            Err(DirectorError::Incident(IncidentError::NotFound(_)))
        ));
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod contention {
    use super::*;

    type Outcomes = Rc<RefCell<Vec<(&'static str, bool)>>>;

    /// Tries to grab one entity every tick.
    struct Claimer {
        name:     &'static str,
        owner:    OwnerId,
        target:   EntityHandle,
        outcomes: Outcomes,
    }

    impl Subsystem<SandboxWorld> for Claimer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn owner(&self) -> &OwnerId {
            &self.owner
        }

        fn interval_ticks(&self) -> u64 {
            1
        }

        fn update(&mut self, ctx: &mut AdapterCtx<'_, SandboxWorld>) -> AdapterResult<Vec<IncidentId>> {
            let now = ctx.now();
            let won = ctx.arbiter.try_acquire(&*ctx.world, self.target, &self.owner, 5, now);
            self.outcomes.borrow_mut().push((self.name, won));
            Ok(Vec::new())
        }
    }

    #[test]
    fn same_tick_race_has_one_lasting_winner() {
        let mut world = road();
        let (car, _) = parked(&mut world, 50.0);
        let outcomes: Outcomes = Rc::default();
        let claimer = |name: &'static str| Claimer { name, owner: OwnerId::from(name), target: car, outcomes: Rc::clone(&outcomes) };
        let mut d = DirectorBuilder::new(AmbientConfig::default(), world)
            .without_default_adapters()
            .subsystem(claimer("A"))
            .subsystem(claimer("B"))
            .build()
            .unwrap();

        d.tick(&mut NoopObserver);
        {
            let o = outcomes.borrow();
            assert_eq!(o.len(), 2, "both ran on the first tick");
            assert!(o[0].1 ^ o[1].1, "exactly one acquisition succeeds");
        }

        d.run_ticks(5, &mut NoopObserver);
        let o = outcomes.borrow();
        let a_wins = o.iter().filter(|e| e.0 == "A" && e.1).count();
        let b_wins = o.iter().filter(|e| e.0 == "B" && e.1).count();
        assert!(
            (a_wins, b_wins) == (6, 0) || (a_wins, b_wins) == (0, 6),
            "the winner keeps it and the loser never gets in at equal priority"
        );
    }

    #[test]
    fn crash_takes_entities_from_a_breakdown() {
        let mut config = AmbientConfig::default();
        config.adapters.blockage.enabled = false;
        config.adapters.encounters.enabled = false;
        let mut world = road();
        let (car, driver) = parked(&mut world, 100.0);
        let (other, _) = parked(&mut world, 105.0);
        let mut d = DirectorBuilder::new(config, world).build().unwrap();
        let mut obs = RecordingObserver::new();
        let bd = start_breakdown(&mut d, &mut obs, "adapter.low", car, driver);

        d.world.push_collision(car, other);
        let first = d.tick(&mut obs);
        assert!(first.created.is_empty(), "the breakdown still crowds the spot");
        assert!(matches!(obs.teardown_of(bd), Some(TeardownReason::OwnershipLost(_))));

        let second = d.tick(&mut obs);
        assert_eq!(second.created.len(), 1);
        let accident = d.engine.get(second.created[0]).unwrap();
        assert_eq!(accident.kind, IncidentKind::Accident);
        assert!(accident.involves(car) && accident.involves(driver));
        assert_members_owned(&d);
    }
}

// ── Ambient sessions ──────────────────────────────────────────────────────────

#[cfg(test)]
mod session {
    use super::*;

    fn session(seed: u64) -> Director<SandboxWorld> {
        let config = AmbientConfig { seed, ..AmbientConfig::default() };
        DirectorBuilder::new(config, street()).build().unwrap()
    }

    #[test]
    fn stock_adapters_are_registered_when_enabled() {
        assert_eq!(session(1).scheduler.len(), 3);

        let mut config = AmbientConfig::default();
        config.adapters.blockage.enabled = false;
        let d = DirectorBuilder::new(config, street()).build().unwrap();
        assert_eq!(d.scheduler.len(), 2);
    }

    #[test]
    fn long_session_keeps_ownership_consistent_and_cleans_up() {
        let mut d = session(42);
        let mut obs = RecordingObserver::new();
        for _ in 0..3_000 {
            d.tick(&mut obs);
            assert_members_owned(&d);
        }
        assert!(d.stats.created >= 1, "encounters started");

        d.shutdown(&mut obs);
        assert!(d.engine.is_empty());
        assert!(d.arbiter.is_empty(), "nothing left held: {:?}", d.arbiter.records().collect::<Vec<_>>());
        assert!(obs.live_markers.is_empty());
        assert_eq!(obs.torn_down() as u64, d.stats.created, "every incident was torn down exactly once");
    }

    #[test]
    fn same_seed_replays_the_same_run() {
        let mut a = session(7);
        let mut b = session(7);
        let mut oa = RecordingObserver::new();
        let mut ob = RecordingObserver::new();
        a.run_ticks(1_500, &mut oa);
        b.run_ticks(1_500, &mut ob);
        assert_eq!(oa.events, ob.events);
        assert_eq!(a.stats, b.stats);
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use super::*;

    fn rejects(config: AmbientConfig) -> DirectorError {
        match DirectorBuilder::new(config, road()).build() {
            Ok(_) => panic!("config accepted"),
            Err(e) => e,
        }
    }

    #[test]
    fn nonsense_is_rejected_by_the_owning_section() {
        let mut c = AmbientConfig::default();
        c.clock.tick_duration_ms = 0;
        assert!(matches!(rejects(c), DirectorError::Config(_)));

        let mut c = AmbientConfig::default();
        c.arbiter.sweep_batch = 0;
        assert!(matches!(rejects(c), DirectorError::Arbiter(_)));

        let mut c = AmbientConfig::default();
        c.placement.distance_steps = 0;
        assert!(matches!(rejects(c), DirectorError::Placement(_)));

        let mut c = AmbientConfig::default();
        c.incidents.max_age_secs = 0.0;
        assert!(matches!(rejects(c), DirectorError::Incident(_)));

        let mut c = AmbientConfig::default();
        c.adapters.encounters.spawn_chance = 2.0;
        assert!(matches!(rejects(c), DirectorError::Adapter(_)));
    }

    #[test]
    fn incident_exclusion_radius_governs_placement_and_overlap() {
        let mut c = AmbientConfig::default();
        c.incidents.exclusion_radius = 150.0;
        let mut w = road();
        let (car, driver) = parked(&mut w, 0.0);
        let mut d = bare(c, w);
        let mut obs = RecordingObserver::new();
        start_breakdown(&mut d, &mut obs, "test.a", car, driver);

        assert!(d.engine.would_overlap(Vec3::new(120.0, 0.0, 0.0)));
        let keep_out = d.engine.exclusion_set();
        let spot = d.placement.find_position(&d.world, Vec3::ZERO, 90.0, 80.0, 180.0, &keep_out).unwrap();
        assert!(spot.distance_2d(Vec3::ZERO) > 150.0, "placed at {spot}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{ "seed": 9, "incidents": { "max_age_secs": 120 }, "adapters": { "blockage": { "enabled": false } } }"#;
        let c: AmbientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.seed, 9);
        assert_eq!(c.incidents.max_age_secs, 120.0);
        assert_eq!(c.incidents.exclusion_radius, AmbientConfig::default().incidents.exclusion_radius);
        assert!(!c.adapters.blockage.enabled);
        assert!(c.adapters.collisions.enabled);
        assert_eq!(c.clock.tick_duration_ms, 100);
        c.validate().unwrap();
    }
}
