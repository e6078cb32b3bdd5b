//! Unit tests for amb-incident.

use amb_arbiter::OwnershipArbiter;
use amb_core::{EntityHandle, IncidentId, OwnerId, SimClock, Vec3};
use amb_placement::PlacementValidator;
use amb_world::{SandboxWorld, Seat};

use crate::{
    IncidentConfig, IncidentEngine, IncidentKind, IncidentResult, IncidentSpec, Phase,
    RecordingObserver, Role, TickReport,
};

// ── Rig ───────────────────────────────────────────────────────────────────────

const ADAPTER: &str = "test.adapter";

/// Engine, world, arbiter and clock wired the way the director wires them:
/// engine tick, then world step, then clock advance.
struct Rig {
    world:     SandboxWorld,
    arbiter:   OwnershipArbiter,
    placement: PlacementValidator,
    engine:    IncidentEngine,
    clock:     SimClock,
    obs:       RecordingObserver,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(IncidentConfig::default())
    }

    /// A straight east-west road from x = -400 to x = 400.
    fn with_config(config: IncidentConfig) -> Self {
        let mut world = SandboxWorld::new();
        world.add_road(Vec3::new(-400.0, 0.0, 0.0), Vec3::new(400.0, 0.0, 0.0), 10.0);
        Self {
            world,
            arbiter: OwnershipArbiter::default(),
            placement: PlacementValidator::default(),
            engine: IncidentEngine::new(config, 7),
            clock: SimClock::default(),
            obs: RecordingObserver::new(),
        }
    }

    fn owner() -> OwnerId {
        OwnerId::from(ADAPTER)
    }

    fn tick(&mut self) -> TickReport {
        let report = self.engine.tick(
            &self.clock,
            &mut self.world,
            &mut self.arbiter,
            &self.placement,
            &mut self.obs,
        );
        self.world.step(self.clock.tick_secs());
        self.clock.advance();
        report
    }

    fn run_secs(&mut self, secs: f32) {
        for _ in 0..self.clock.ticks_for_secs(secs) {
            self.tick();
        }
    }

    /// Tick until `done` holds or `secs` run out.  Returns whether `done` held.
    fn run_until(&mut self, secs: f32, done: impl Fn(&Rig) -> bool) -> bool {
        for _ in 0..self.clock.ticks_for_secs(secs) {
            if done(self) {
                return true;
            }
            self.tick();
        }
        done(self)
    }

    fn phase(&self, id: IncidentId) -> Option<Phase> {
        self.engine.get(id).map(|i| i.phase)
    }

    fn start(&mut self, spec: IncidentSpec) -> IncidentResult<IncidentId> {
        let handles: Vec<EntityHandle> = spec.members.iter().map(|m| m.handle).collect();
        assert!(self.arbiter.try_acquire_all(&self.world, &handles, &spec.owner, spec.priority, self.clock.now()));
        self.engine.create(spec, self.clock.now(), &mut self.world, &self.arbiter, &mut self.obs)
    }

    fn breakdown_at(&mut self, at: Vec3) -> (IncidentId, EntityHandle, EntityHandle) {
        let car = self.world.add_vehicle(at, 90.0);
        let driver = self.world.add_agent_in(car, Seat::Driver);
        let spec = IncidentSpec::new(IncidentKind::Breakdown, at, Self::owner(), 10)
            .agent(Role::Driver, driver)
            .vehicle(Role::Car, car);
        (self.start(spec).unwrap(), driver, car)
    }

    fn police_stop_at(&mut self, at: Vec3) -> IncidentId {
        let car = self.world.add_vehicle(at, 90.0);
        let suspect = self.world.add_agent_in(car, Seat::Driver);
        let cruiser = self.world.add_vehicle(at + Vec3::new(-40.0, 0.0, 0.0), 90.0);
        let officer = self.world.add_agent_in(cruiser, Seat::Driver);
        let spec = IncidentSpec::new(IncidentKind::PoliceStop, at, Self::owner(), 10)
            .agent(Role::Officer, officer)
            .vehicle(Role::Cruiser, cruiser)
            .agent(Role::Suspect, suspect)
            .vehicle(Role::SuspectVehicle, car);
        self.start(spec).unwrap()
    }

    fn accident_at(&mut self, at: Vec3) -> IncidentId {
        let a = self.world.add_vehicle(at, 90.0);
        let b = self.world.add_vehicle(at + Vec3::new(5.0, 0.0, 0.0), 270.0);
        let da = self.world.add_agent_in(a, Seat::Driver);
        let db = self.world.add_agent_in(b, Seat::Driver);
        let spec = IncidentSpec::new(IncidentKind::Accident, at, Self::owner(), 10)
            .agent(Role::Driver, da)
            .vehicle(Role::Car, a)
            .agent(Role::OtherDriver, db)
            .vehicle(Role::OtherVehicle, b);
        self.start(spec).unwrap()
    }

    fn paramedics_at(&mut self, at: Vec3) -> (IncidentId, EntityHandle) {
        let victim = self.world.add_agent(at);
        let spec = IncidentSpec::new(IncidentKind::Paramedics, at, Self::owner(), 10).agent(Role::Victim, victim);
        (self.start(spec).unwrap(), victim)
    }

    fn altercation_at(&mut self, at: Vec3) -> (IncidentId, EntityHandle, EntityHandle) {
        let aggressor = self.world.add_agent(at);
        let victim = self.world.add_agent(at + Vec3::new(6.0, 0.0, 0.0));
        let spec = IncidentSpec::new(IncidentKind::Altercation, at, Self::owner(), 10)
            .agent(Role::Aggressor, aggressor)
            .agent(Role::Victim, victim);
        (self.start(spec).unwrap(), aggressor, victim)
    }

    /// Put the player in a car parked on the road at `at`.
    fn player_car_at(&mut self, at: Vec3) -> (EntityHandle, EntityHandle) {
        let car = self.world.add_vehicle(at, 90.0);
        let player = self.world.add_agent_in(car, Seat::Driver);
        self.world.set_player(player);
        (player, car)
    }
}

/// Every recorded phase change was listed in its transition table.
fn assert_transitions_legal(obs: &RecordingObserver) {
    use crate::IncidentEvent;
    for e in &obs.events {
        if let IncidentEvent::PhaseChanged { from, to, .. } = e {
            assert!(from.can_transition_to(*to), "illegal {from} -> {to}");
        }
    }
}

// ── Transition tables ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tables {
    use super::*;
    use crate::{AccidentPhase, AltercationPhase, BreakdownPhase, ParamedicsPhase, PhaseSet, PoliceStopPhase};

    /// Phases reachable from `INITIAL` by following successor lists.
    fn reachable<P: PhaseSet>() -> Vec<P> {
        let mut seen = vec![P::INITIAL];
        let mut i = 0;
        while i < seen.len() {
            for &next in seen[i].successors() {
                if !seen.contains(&next) {
                    seen.push(next);
                }
            }
            i += 1;
        }
        seen
    }

    /// Every phase reached from `INITIAL` can still reach `TERMINAL`.
    fn every_branch_terminates<P: PhaseSet>() {
        for p in reachable::<P>() {
            assert!(p.can_transition_to(P::TERMINAL), "{p:?} cannot end");
            assert!(P::TERMINAL.successors().is_empty());
            if !p.is_terminal() {
                assert!(p.max_dwell_secs(&IncidentConfig::default()).is_finite(), "{p:?} has no timeout");
            }
        }
    }

    #[test]
    fn breakdown_has_three_branches_from_diagnosing() {
        use BreakdownPhase::*;
        assert_eq!(Inspecting.successors(), &[Diagnosing]);
        assert!(Diagnosing.can_transition_to(Repairing));
        assert!(Diagnosing.can_transition_to(TowCalled));
        assert!(Diagnosing.can_transition_to(RideOffered));
        assert!(!Inspecting.can_transition_to(Repairing));
        assert!(!TowEnRoute.can_transition_to(Dropoff));
        // Every phase but Terminal, which is reached by the implicit edge.
        assert_eq!(reachable::<BreakdownPhase>().len(), 14);
    }

    #[test]
    fn all_kinds_terminate_on_every_branch() {
        every_branch_terminates::<BreakdownPhase>();
        every_branch_terminates::<PoliceStopPhase>();
        every_branch_terminates::<AccidentPhase>();
        every_branch_terminates::<ParamedicsPhase>();
        every_branch_terminates::<AltercationPhase>();
    }

    #[test]
    fn cross_kind_transition_is_refused() {
        let a = Phase::Breakdown(BreakdownPhase::Inspecting);
        let b = Phase::Accident(AccidentPhase::Arguing);
        assert!(!a.can_transition_to(b));
        assert!(a.can_transition_to(Phase::terminal(IncidentKind::Breakdown)));
        assert!(!a.can_transition_to(Phase::terminal(IncidentKind::Accident)));
    }

    #[test]
    fn only_altercation_and_pursuit_move() {
        assert_eq!(Phase::Altercation(AltercationPhase::Chasing).tracked_role(), Some(Role::Aggressor));
        assert_eq!(Phase::PoliceStop(PoliceStopPhase::Pursuit).tracked_role(), Some(Role::SuspectVehicle));
        assert_eq!(Phase::Breakdown(BreakdownPhase::TransportingToDestination).tracked_role(), None);
        assert_eq!(Phase::Paramedics(ParamedicsPhase::Treating).tracked_role(), None);
    }

    #[test]
    fn initial_phases_match_kind() {
        for kind in IncidentKind::ALL {
            let p = Phase::initial(kind);
            assert_eq!(p.kind(), kind);
            assert!(!p.is_terminal());
            assert!(Phase::terminal(kind).is_terminal());
        }
    }
}

// ── Creation ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod creation {
    use super::*;
    use crate::IncidentError;
    use amb_world::{Protection, WorldQuery};

    #[test]
    fn created_incident_protects_members_and_gets_a_marker() {
        let mut rig = Rig::new();
        let (id, driver, car) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let inc = rig.engine.get(id).unwrap();
        assert_eq!(inc.kind, IncidentKind::Breakdown);
        assert_eq!(inc.participants(), vec![driver]);
        assert_eq!(inc.vehicles(), vec![car]);
        assert!(inc.marker.is_some());
        assert_eq!(rig.world.protection(driver), Some(Protection::SCRIPTED));
        assert_eq!(rig.world.protection(car), Some(Protection::SCRIPTED));
    }

    #[test]
    fn missing_role_is_rejected() {
        let mut rig = Rig::new();
        let car = rig.world.add_vehicle(Vec3::ZERO, 0.0);
        let spec = IncidentSpec::new(IncidentKind::Breakdown, Vec3::ZERO, Rig::owner(), 1).vehicle(Role::Car, car);
        let err = rig.start(spec).unwrap_err();
        assert!(matches!(err, IncidentError::MissingRole { role: Role::Driver, .. }));
        assert!(rig.engine.is_empty());
    }

    #[test]
    fn members_must_be_held_by_the_creator() {
        let mut rig = Rig::new();
        let car = rig.world.add_vehicle(Vec3::ZERO, 0.0);
        let driver = rig.world.add_agent_in(car, Seat::Driver);
        let spec = IncidentSpec::new(IncidentKind::Breakdown, Vec3::ZERO, Rig::owner(), 1)
            .agent(Role::Driver, driver)
            .vehicle(Role::Car, car);
        let mut obs = RecordingObserver::new();
        let err = rig
            .engine
            .create(spec, rig.clock.now(), &mut rig.world, &rig.arbiter, &mut obs)
            .unwrap_err();
        assert!(matches!(err, IncidentError::NotOwned(_)));
        assert!(obs.events.is_empty());
    }

    #[test]
    fn dead_member_is_rejected() {
        let mut rig = Rig::new();
        let victim = rig.world.add_agent(Vec3::ZERO);
        assert!(rig.arbiter.try_acquire(&rig.world, victim, &Rig::owner(), 1, rig.clock.now()));
        rig.world.kill(victim);
        let spec = IncidentSpec::new(IncidentKind::Paramedics, Vec3::ZERO, Rig::owner(), 1).agent(Role::Victim, victim);
        let err = rig
            .engine
            .create(spec, rig.clock.now(), &mut rig.world, &rig.arbiter, &mut rig.obs)
            .unwrap_err();
        assert!(matches!(err, IncidentError::Unavailable(h) if h == victim));
    }

    #[test]
    fn incidents_keep_their_distance() {
        let mut rig = Rig::new();
        rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let car = rig.world.add_vehicle(Vec3::new(30.0, 0.0, 0.0), 90.0);
        let driver = rig.world.add_agent_in(car, Seat::Driver);
        let spec = IncidentSpec::new(IncidentKind::Breakdown, Vec3::new(30.0, 0.0, 0.0), Rig::owner(), 10)
            .agent(Role::Driver, driver)
            .vehicle(Role::Car, car);
        assert!(matches!(rig.start(spec), Err(IncidentError::Overlap(_))));

        let zones = rig.engine.exclusion_set();
        assert!(zones.is_excluded(Vec3::new(30.0, 0.0, 0.0)));
        assert!(!zones.is_excluded(Vec3::new(90.0, 0.0, 0.0)));
        assert!(rig.engine.would_overlap(Vec3::new(0.0, 59.0, 0.0)));
    }

    #[test]
    fn placement_avoids_active_incidents() {
        let mut rig = Rig::new();
        rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let zones = rig.engine.exclusion_set();
        let spot = rig
            .placement
            .find_position(&rig.world, Vec3::new(-30.0, 0.0, 0.0), 90.0, 10.0, 200.0, &zones)
            .expect("road has room further out");
        assert!(spot.distance_2d(Vec3::ZERO) > rig.engine.config().exclusion_radius);
    }

    #[test]
    fn one_owner_cannot_reuse_a_member_in_two_incidents() {
        let mut rig = Rig::new();
        let (_, driver, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let car = rig.world.add_vehicle(Vec3::new(200.0, 0.0, 0.0), 90.0);
        let spec = IncidentSpec::new(IncidentKind::Breakdown, Vec3::new(200.0, 0.0, 0.0), Rig::owner(), 10)
            .agent(Role::Driver, driver)
            .vehicle(Role::Car, car);
        assert!(matches!(rig.start(spec), Err(IncidentError::EntityInUse(h)) if h == driver));
    }

    #[test]
    fn preempted_member_may_join_a_new_incident() {
        let mut rig = Rig::new();
        let (old, driver, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let other = OwnerId::from("collisions");
        assert!(rig.arbiter.try_acquire(&rig.world, driver, &other, 50, rig.clock.now()));
        let spec = IncidentSpec::new(IncidentKind::Paramedics, Vec3::new(200.0, 0.0, 0.0), other.clone(), 50)
            .agent(Role::Victim, driver);
        let new = rig.engine.create(spec, rig.clock.now(), &mut rig.world, &rig.arbiter, &mut rig.obs).unwrap();

        rig.tick();
        assert!(rig.engine.get(old).is_none(), "stale incident torn down");
        assert!(rig.engine.get(new).is_some());
        assert!(rig.arbiter.holds(driver, &other));
        assert!(rig.world.exists(driver));
    }
}

// ── Breakdown ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod breakdown {
    use super::*;
    use crate::{BreakdownPhase, IncidentError, IncidentEvent, Interaction, TeardownReason};
    use amb_world::{Directive, DirectiveSink, WorldQuery};

    fn diagnosing(id: IncidentId) -> impl Fn(&Rig) -> bool {
        move |r: &Rig| r.phase(id) == Some(Phase::Breakdown(BreakdownPhase::Diagnosing))
    }

    #[test]
    fn inspecting_ends_within_its_dwell() {
        let mut rig = Rig::new();
        let (id, driver, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let max = rig.engine.config().inspect_secs[1];
        assert!(rig.run_until(max + 1.0, diagnosing(id)));

        let at = rig
            .obs
            .events
            .iter()
            .find_map(|e| match e {
                IncidentEvent::PhaseChanged { to: Phase::Breakdown(BreakdownPhase::Diagnosing), at, .. } => Some(*at),
                _ => None,
            })
            .unwrap();
        let secs = rig.clock.secs_between(amb_core::Tick::ZERO, at);
        assert!(secs >= rig.engine.config().inspect_secs[0] - 0.01, "left early at {secs}");
        assert!(secs <= max + 0.2, "left late at {secs}");

        rig.run_secs(2.0);
        assert_eq!(rig.world.vehicle_of(driver), None, "driver stands by the car");
        assert!(rig.engine.get(id).unwrap().flags.can_interact);
    }

    #[test]
    fn interaction_only_while_diagnosing() {
        let mut rig = Rig::new();
        let (id, _, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        assert!(matches!(
            rig.engine.interact(id, Interaction::Repair),
            Err(IncidentError::InteractionRejected { .. })
        ));
        assert!(matches!(
            rig.engine.interact(IncidentId(99), Interaction::Repair),
            Err(IncidentError::NotFound(_))
        ));
        assert!(rig.run_until(11.0, diagnosing(id)));
        assert!(rig.engine.interact(id, Interaction::Repair).is_ok());
    }

    #[test]
    fn repair_branch_drives_off_and_releases_everything() {
        let mut rig = Rig::new();
        let (id, driver, car) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        assert!(rig.run_until(11.0, diagnosing(id)));
        rig.engine.interact(id, Interaction::Repair).unwrap();

        assert!(rig.run_until(90.0, |r| r.engine.is_empty()));
        let phases = rig.obs.phases_of(id);
        assert!(phases.contains(&Phase::Breakdown(BreakdownPhase::Repairing)));
        assert!(phases.contains(&Phase::Breakdown(BreakdownPhase::Departing)));
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::Completed));
        assert_eq!(rig.world.vehicle_of(driver), Some(car));
        assert!(!rig.arbiter.is_locked(driver));
        assert!(!rig.arbiter.is_locked(car));
        assert!(rig.obs.live_markers.is_empty());
        assert_transitions_legal(&rig.obs);
    }

    #[test]
    fn tow_branch_dispatches_and_owns_the_truck() {
        let mut rig = Rig::new();
        let (id, _, car) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        assert!(rig.run_until(11.0, diagnosing(id)));
        rig.engine.interact(id, Interaction::CallServices).unwrap();

        assert!(rig.run_until(5.0, |r| r.engine.get(id).is_some_and(|i| i.member(Role::TowTruck).is_some())));
        let inc = rig.engine.get(id).unwrap();
        assert!(inc.flags.services_called);
        let truck = inc.member(Role::TowTruck).unwrap();
        let mechanic = inc.member(Role::TowDriver).unwrap();
        assert!(rig.arbiter.holds(truck, &Rig::owner()));
        assert!(rig.arbiter.holds(mechanic, &Rig::owner()));
        assert!(rig.world.vehicle_of(mechanic) == Some(truck));
        let spawn_gap = rig.world.position(truck).unwrap().distance_2d(rig.world.position(car).unwrap());
        assert!(spawn_gap >= 79.0, "spawned {spawn_gap} m away");

        assert!(rig.run_until(300.0, |r| r.engine.is_empty()));
        let phases = rig.obs.phases_of(id);
        assert!(phases.contains(&Phase::Breakdown(BreakdownPhase::TowEnRoute)));
        assert!(phases.contains(&Phase::Breakdown(BreakdownPhase::TowArrived)));
        assert!(rig.arbiter.is_empty(), "no dangling ownership");
        assert_transitions_legal(&rig.obs);
    }

    #[test]
    fn failed_dispatch_times_out_without_leaking() {
        let mut rig = Rig::new();
        let (id, _, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        assert!(rig.run_until(11.0, diagnosing(id)));
        rig.world.fail_spawns = true;
        rig.engine.interact(id, Interaction::CallServices).unwrap();

        let window = rig.engine.config().spawn_timeout_secs;
        assert!(rig.run_until(window + 2.0, |r| r.engine.is_empty()));
        assert_eq!(
            rig.obs.teardown_of(id),
            Some(&TeardownReason::PhaseTimeout(Phase::Breakdown(BreakdownPhase::TowCalled)))
        );
        assert!(rig.arbiter.is_empty());
    }

    #[test]
    fn ride_branch_reboards_a_passenger_who_gets_out() {
        let mut rig = Rig::new();
        let (id, driver, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let (_, ride) = rig.player_car_at(Vec3::new(25.0, 0.0, 0.0));
        assert!(rig.run_until(11.0, diagnosing(id)));
        rig.engine.interact(id, Interaction::OfferRide).unwrap();

        let transporting = Phase::Breakdown(BreakdownPhase::TransportingToDestination);
        assert!(rig.run_until(60.0, |r| r.phase(id) == Some(transporting)));
        rig.tick();
        assert_eq!(rig.world.vehicle_of(driver), Some(ride));
        let inc = rig.engine.get(id).unwrap();
        assert!(inc.flags.ride_accepted);
        assert!(!rig.arbiter.is_locked(ride), "the player's car is never owned");
        let destination = inc.destination.expect("destination chosen");

        // The host pulls the passenger out; the incident puts them back.
        rig.world.issue(driver, Directive::LeaveVehicle).unwrap();
        assert!(rig.run_until(3.0, |r| r.world.vehicle_of(driver).is_none()));
        assert!(rig.run_until(10.0, |r| r.world.vehicle_of(driver) == Some(ride)));
        assert_eq!(rig.phase(id), Some(transporting));

        rig.world.teleport(ride, destination);
        assert!(rig.run_until(30.0, |r| r.engine.is_empty()));
        assert!(rig.obs.phases_of(id).contains(&Phase::Breakdown(BreakdownPhase::Dropoff)));
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::Completed));
        assert_eq!(rig.world.vehicle_of(driver), None);
        assert!(rig.arbiter.is_empty());
    }

    #[test]
    fn ride_without_a_vehicle_is_refused_politely() {
        let mut rig = Rig::new();
        let (id, _, _) = rig.breakdown_at(Vec3::new(0.0, 0.0, 0.0));
        let player = rig.world.add_agent(Vec3::new(5.0, 3.0, 0.0));
        rig.world.set_player(player);
        assert!(rig.run_until(11.0, diagnosing(id)));
        rig.engine.interact(id, Interaction::OfferRide).unwrap();
        rig.tick();
        assert_eq!(rig.phase(id), Some(Phase::Breakdown(BreakdownPhase::Diagnosing)));
        assert!(rig.obs.advisories_of(id).iter().any(|m| m.contains("vehicle")));
    }
}

// ── Lifecycle guarantees ──────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;
    use crate::TeardownReason;
    use amb_world::{Protection, WorldQuery};

    #[test]
    fn age_cap_tears_down_and_unlocks() {
        let config = IncidentConfig { max_age_secs: 5.0, inspect_secs: [3.0, 4.0], ..Default::default() };
        let mut rig = Rig::with_config(config);
        let (id, driver, car) = rig.breakdown_at(Vec3::ZERO);

        assert!(rig.run_until(6.0, |r| r.engine.is_empty()));
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::AgeCap));
        assert!(!rig.arbiter.is_locked(driver));
        assert!(!rig.arbiter.is_locked(car));
        assert_eq!(rig.world.protection(driver), Some(Protection::NONE));
    }

    #[test]
    fn destroyed_member_ends_the_incident_next_tick() {
        let mut rig = Rig::new();
        let (id, driver, car) = rig.breakdown_at(Vec3::ZERO);
        rig.run_secs(1.0);
        rig.world.destroy(car);

        let report = rig.tick();
        assert_eq!(report.torn_down, vec![(id, TeardownReason::ParticipantInvalid(car))]);
        assert!(rig.arbiter.is_empty(), "the gone car's record goes too");
        assert_eq!(rig.world.protection(driver), Some(Protection::NONE));
    }

    #[test]
    fn dead_member_ends_the_incident() {
        let mut rig = Rig::new();
        let (id, victim) = rig.paramedics_at(Vec3::new(0.0, 3.0, 0.0));
        rig.tick();
        rig.world.kill(victim);
        rig.tick();
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::ParticipantInvalid(victim)));
        assert!(rig.arbiter.is_empty());
    }

    #[test]
    fn preemption_is_noticed_and_the_new_holder_kept() {
        let mut rig = Rig::new();
        let (id, driver, car) = rig.breakdown_at(Vec3::ZERO);
        rig.run_secs(1.0);
        let other = OwnerId::from("collisions");
        assert!(rig.arbiter.try_acquire(&rig.world, driver, &other, 50, rig.clock.now()));

        let report = rig.tick();
        assert_eq!(report.torn_down, vec![(id, TeardownReason::OwnershipLost(driver))]);
        assert!(rig.arbiter.holds(driver, &other), "teardown leaves the new holder alone");
        assert!(!rig.arbiter.is_locked(car));
        assert_eq!(rig.world.protection(driver), Some(Protection::SCRIPTED));
    }

    #[test]
    fn transient_directive_failure_is_retried() {
        let mut rig = Rig::new();
        let (id, driver, _) = rig.breakdown_at(Vec3::ZERO);
        rig.world.reject_directives_for(driver);
        rig.run_secs(2.0);
        assert!(rig.engine.get(id).unwrap().faults > 0);
        assert!(rig.world.vehicle_of(driver).is_some(), "still seated");

        rig.world.accept_directives_for(driver);
        rig.run_secs(12.0);
        let inc = rig.engine.get(id).expect("still running");
        assert_eq!(inc.phase, Phase::Breakdown(crate::BreakdownPhase::Diagnosing));
        assert_eq!(rig.world.vehicle_of(driver), None);
    }

    #[test]
    fn persistent_directive_failure_times_out() {
        let config = IncidentConfig { interaction_window_secs: 20.0, ..Default::default() };
        let mut rig = Rig::with_config(config);
        let (id, driver, car) = rig.breakdown_at(Vec3::ZERO);
        rig.world.reject_directives_for(driver);

        let mut errors = 0;
        for _ in 0..rig.clock.ticks_for_secs(40.0) {
            errors += rig.tick().errors;
        }
        assert!(errors > 0);
        assert_eq!(
            rig.obs.teardown_of(id),
            Some(&TeardownReason::PhaseTimeout(Phase::Breakdown(crate::BreakdownPhase::Diagnosing)))
        );
        assert!(!rig.arbiter.is_locked(driver));
        assert!(!rig.arbiter.is_locked(car));
    }

    #[test]
    fn failing_incident_does_not_stall_its_neighbour() {
        let mut rig = Rig::new();
        let (bad, bad_driver, _) = rig.breakdown_at(Vec3::ZERO);
        let (good, _, _) = rig.breakdown_at(Vec3::new(150.0, 0.0, 0.0));
        rig.world.reject_directives_for(bad_driver);

        rig.run_secs(11.0);
        assert_eq!(rig.phase(good), Some(Phase::Breakdown(crate::BreakdownPhase::Diagnosing)));
        assert!(rig.engine.get(bad).unwrap().faults > 0);
        assert_eq!(rig.engine.get(good).unwrap().faults, 0);
    }

    #[test]
    fn every_kind_terminates_and_leaves_nothing_owned() {
        let config = IncidentConfig { max_age_secs: 120.0, ..Default::default() };
        let mut rig = Rig::with_config(config);
        rig.breakdown_at(Vec3::new(-300.0, 0.0, 0.0));
        rig.police_stop_at(Vec3::new(-150.0, 0.0, 0.0));
        rig.accident_at(Vec3::new(0.0, 0.0, 0.0));
        rig.paramedics_at(Vec3::new(150.0, 3.0, 0.0));
        rig.altercation_at(Vec3::new(300.0, 3.0, 0.0));
        assert_eq!(rig.engine.len(), 5);

        assert!(rig.run_until(122.0, |r| r.engine.is_empty()));
        assert_eq!(rig.obs.torn_down(), 5);
        assert!(rig.arbiter.is_empty(), "no dangling ownership");
        assert!(rig.obs.live_markers.is_empty());
        assert_transitions_legal(&rig.obs);
    }

    #[test]
    fn cancel_releases_and_returns_the_marker() {
        let mut rig = Rig::new();
        let (a, _, _) = rig.breakdown_at(Vec3::ZERO);
        rig.altercation_at(Vec3::new(200.0, 3.0, 0.0));
        rig.run_secs(1.0);

        rig.engine.cancel(a, &mut rig.world, &mut rig.arbiter, &mut rig.obs).unwrap();
        assert_eq!(rig.obs.teardown_of(a), Some(&TeardownReason::Cancelled));
        assert_eq!(rig.engine.len(), 1);

        let n = rig.engine.cancel_all(&mut rig.world, &mut rig.arbiter, &mut rig.obs);
        assert_eq!(n, 1);
        assert!(rig.arbiter.is_empty());
        assert!(rig.obs.live_markers.is_empty());
        assert!(rig.engine.cancel(a, &mut rig.world, &mut rig.arbiter, &mut rig.obs).is_err());
    }

    #[test]
    fn cancelling_one_owner_leaves_the_others() {
        let mut rig = Rig::new();
        let (mine, driver, _) = rig.breakdown_at(Vec3::ZERO);
        let victim = rig.world.add_agent(Vec3::new(200.0, 3.0, 0.0));
        let other = OwnerId::from("test.other");
        let spec = IncidentSpec::new(IncidentKind::Paramedics, Vec3::new(200.0, 3.0, 0.0), other.clone(), 10)
            .agent(Role::Victim, victim);
        let theirs = rig.start(spec).unwrap();
        assert_eq!(rig.engine.get(mine).unwrap().role_of(driver), Some(Role::Driver));

        let n = rig.engine.cancel_owned_by(&Rig::owner(), &mut rig.world, &mut rig.arbiter, &mut rig.obs);
        assert_eq!(n, 1);
        assert_eq!(rig.obs.teardown_of(mine), Some(&TeardownReason::Cancelled));
        assert!(rig.engine.get(theirs).is_some());
        assert!(!rig.arbiter.is_locked(driver));
        assert!(rig.arbiter.holds(victim, &other));
    }
}

// ── Other kinds ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod kinds {
    use super::*;
    use crate::{AltercationPhase, IncidentError, Interaction, ParamedicsPhase, TeardownReason};
    use amb_world::WorldQuery;

    #[test]
    fn altercation_position_follows_the_aggressor() {
        let mut rig = Rig::new();
        let start = Vec3::new(0.0, 3.0, 0.0);
        let (id, aggressor, _) = rig.altercation_at(start);
        rig.run_secs(3.0);

        let inc = rig.engine.get(id).unwrap();
        let here = rig.world.position(aggressor).unwrap();
        assert!(inc.position.distance_2d(here) <= 0.5, "anchor {} vs aggressor {}", inc.position, here);
        assert!(inc.position.distance_2d(start) > 1.0, "anchor moved");
    }

    #[test]
    fn fixed_incident_position_stays_put() {
        let mut rig = Rig::new();
        let (id, _, _) = rig.breakdown_at(Vec3::ZERO);
        rig.run_secs(5.0);
        assert_eq!(rig.engine.get(id).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn victim_who_gets_away_ends_the_chase() {
        let mut rig = Rig::new();
        let (id, _, victim) = rig.altercation_at(Vec3::new(0.0, 3.0, 0.0));
        let chasing = Phase::Altercation(AltercationPhase::Chasing);
        assert!(rig.run_until(60.0, |r| r.phase(id) == Some(chasing)));

        rig.world.teleport(victim, Vec3::new(150.0, 3.0, 0.0));
        assert!(rig.run_until(10.0, |r| r.engine.is_empty()));
        assert!(rig.obs.phases_of(id).contains(&Phase::Altercation(AltercationPhase::Escaped)));
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::Completed));
    }

    #[test]
    fn police_stop_refuses_player_interaction() {
        let mut rig = Rig::new();
        let id = rig.police_stop_at(Vec3::ZERO);
        assert!(matches!(
            rig.engine.interact(id, Interaction::CallServices),
            Err(IncidentError::InteractionRejected { .. })
        ));
    }

    #[test]
    fn unattended_collapse_recovers() {
        let config = IncidentConfig { unattended_recovery_secs: 10.0, ..Default::default() };
        let mut rig = Rig::with_config(config);
        let (id, _) = rig.paramedics_at(Vec3::new(0.0, 3.0, 0.0));
        assert!(rig.run_until(40.0, |r| r.engine.is_empty()));
        assert!(rig.obs.phases_of(id).contains(&Phase::Paramedics(ParamedicsPhase::Recovering)));
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::Completed));
    }

    #[test]
    fn ambulance_collects_the_patient() {
        let mut rig = Rig::new();
        let (id, victim) = rig.paramedics_at(Vec3::new(0.0, 3.0, 0.0));
        let awaiting = Phase::Paramedics(ParamedicsPhase::AwaitingHelp);
        assert!(rig.run_until(10.0, |r| r.phase(id) == Some(awaiting)));
        rig.engine.interact(id, Interaction::CallServices).unwrap();

        assert!(rig.run_until(5.0, |r| r.engine.get(id).is_some_and(|i| i.member(Role::Ambulance).is_some())));
        let inc = rig.engine.get(id).unwrap();
        let ambulance = inc.member(Role::Ambulance).unwrap();
        assert_eq!(inc.members_with(Role::Medic).count(), 2);

        assert!(rig.run_until(240.0, |r| r.engine.is_empty()));
        let phases = rig.obs.phases_of(id);
        assert!(phases.contains(&Phase::Paramedics(ParamedicsPhase::Treating)));
        assert!(phases.contains(&Phase::Paramedics(ParamedicsPhase::LoadingPatient)));
        assert_eq!(rig.obs.teardown_of(id), Some(&TeardownReason::Completed));
        assert_eq!(rig.world.vehicle_of(victim), Some(ambulance));
        assert!(rig.arbiter.is_empty());
    }

    #[test]
    fn accident_call_sets_the_flag_once() {
        let mut rig = Rig::new();
        let id = rig.accident_at(Vec3::ZERO);
        rig.engine.interact(id, Interaction::CallServices).unwrap();
        rig.tick();
        rig.engine.interact(id, Interaction::CallServices).unwrap();
        rig.tick();
        assert!(rig.engine.get(id).unwrap().flags.services_called);
        let notices = rig.obs.advisories_of(id).iter().filter(|m| m.contains("notified")).count();
        assert_eq!(notices, 1);
    }
}
