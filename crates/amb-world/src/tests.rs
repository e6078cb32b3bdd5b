//! Unit tests for amb-world, all against `SandboxWorld`.

#[cfg(test)]
mod helpers {
    use amb_core::Vec3;

    use crate::SandboxWorld;

    /// A straight east-west road from x = -200 to x = 200 along y = 0, with
    /// a pond north of it and a hole in the map to the south.
    pub fn street() -> SandboxWorld {
        let mut w = SandboxWorld::new();
        w.add_road(Vec3::new(-200.0, 0.0, 0.0), Vec3::new(200.0, 0.0, 0.0), 10.0);
        w.add_water(crate::sandbox::Rect::new(-50.0, 40.0, 50.0, 90.0), 1.0);
        w.add_void(crate::sandbox::Rect::new(-50.0, -90.0, 50.0, -40.0));
        w
    }
}

#[cfg(test)]
mod queries {
    use amb_core::{EntityKind, Vec3};

    use crate::WorldQuery;

    #[test]
    fn route_probe_is_blind_near_junctions() {
        let w = super::helpers::street();
        assert!(w.is_on_route(Vec3::new(0.0, 1.0, 0.0)));
        assert!(!w.is_on_route(Vec3::new(0.0, 30.0, 0.0)), "off the road");
        // Road endpoints are junctions.
        assert!(!w.is_on_route(Vec3::new(-198.0, 0.0, 0.0)));
        assert!(w.nearest_route_node(Vec3::new(-198.0, 0.0, 0.0), 5.0).is_some());
    }

    #[test]
    fn nearest_route_node_respects_radius() {
        let w = super::helpers::street();
        assert!(w.nearest_route_node(Vec3::new(3.0, 20.0, 0.0), 5.0).is_none());
        let n = w.nearest_route_node(Vec3::new(3.0, 4.0, 0.0), 10.0).unwrap();
        assert_eq!(n.y, 0.0);
    }

    #[test]
    fn water_and_voids() {
        let w = super::helpers::street();
        let pond = Vec3::new(0.0, 60.0, 0.0);
        assert_eq!(w.water_height(pond), Some(1.0));
        assert!(w.is_submerged(pond));
        assert!(w.ground_height(pond).unwrap() < 1.0);
        assert_eq!(w.ground_height(Vec3::new(0.0, -60.0, 0.0)), None);
        assert_eq!(w.ground_height(Vec3::new(0.0, 10.0, 0.0)), Some(0.0));
    }

    #[test]
    fn nearby_is_sorted_and_kind_filtered() {
        let mut w = super::helpers::street();
        let far = w.add_agent(Vec3::new(20.0, 0.0, 0.0));
        let near = w.add_agent(Vec3::new(5.0, 0.0, 0.0));
        let car = w.add_vehicle(Vec3::new(2.0, 0.0, 0.0), 90.0);
        assert_eq!(w.nearby_agents(Vec3::ZERO, 30.0), vec![near, far]);
        assert_eq!(w.nearby_vehicles(Vec3::ZERO, 30.0), vec![car]);
        assert_eq!(w.kind(car), Some(EntityKind::Vehicle));
    }

    #[test]
    fn destroyed_entities_stop_resolving() {
        let mut w = super::helpers::street();
        let car = w.add_vehicle(Vec3::ZERO, 0.0);
        let driver = w.add_agent_in(car, crate::Seat::Driver);
        assert_eq!(w.driver_of(car), Some(driver));
        w.destroy(car);
        assert!(!w.exists(car));
        assert_eq!(w.vehicle_of(driver), None, "occupant left standing");
    }
}

#[cfg(test)]
mod directives {
    use amb_core::Vec3;

    use crate::{DirectiveError, DirectiveSink, Directives, InteractionKind, Protection, Seat, WorldQuery};

    #[test]
    fn walking_reaches_target() {
        let mut w = super::helpers::street();
        let a = w.add_agent(Vec3::ZERO);
        w.move_to(a, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        for _ in 0..50 {
            w.step(0.1);
        }
        assert!(w.position(a).unwrap().within_2d(Vec3::new(5.0, 0.0, 0.0), 0.6));
    }

    #[test]
    fn boarding_takes_time_and_reports_busy() {
        let mut w = super::helpers::street();
        let car = w.add_vehicle(Vec3::new(1.0, 0.0, 0.0), 90.0);
        let a = w.add_agent(Vec3::ZERO);
        w.enter_vehicle(a, car, Seat::Passenger).unwrap();
        w.step(0.1);
        assert!(w.is_busy(a));
        assert_eq!(
            w.play_interaction(a, InteractionKind::Wave),
            Err(DirectiveError::Busy(a)),
        );
        for _ in 0..20 {
            w.step(0.1);
        }
        assert_eq!(w.vehicle_of(a), Some(car));
        assert!(!w.is_busy(a));
    }

    #[test]
    fn occupants_follow_their_vehicle() {
        let mut w = super::helpers::street();
        let car = w.add_vehicle(Vec3::ZERO, 90.0);
        let driver = w.add_agent_in(car, Seat::Driver);
        w.drive_to(driver, Vec3::new(100.0, 0.0, 0.0), 10.0).unwrap();
        for _ in 0..20 {
            w.step(0.1);
        }
        let cp = w.position(car).unwrap();
        assert!(cp.x > 15.0);
        assert_eq!(w.position(driver), Some(cp));
    }

    #[test]
    fn leaving_places_agent_beside_vehicle() {
        let mut w = super::helpers::street();
        let car = w.add_vehicle(Vec3::ZERO, 90.0);
        let driver = w.add_agent_in(car, Seat::Driver);
        w.leave_vehicle(driver).unwrap();
        for _ in 0..20 {
            w.step(0.1);
        }
        assert_eq!(w.vehicle_of(driver), None);
        assert!(w.position(driver).unwrap().within_2d(Vec3::ZERO, 2.5));
    }

    #[test]
    fn towed_vehicle_trails_truck() {
        let mut w = super::helpers::street();
        let truck = w.add_vehicle(Vec3::ZERO, 90.0);
        let driver = w.add_agent_in(truck, Seat::Driver);
        let wreck = w.add_vehicle(Vec3::new(-7.0, 0.0, 0.0), 90.0);
        w.issue(driver, crate::Directive::Tow { vehicle: wreck }).unwrap();
        w.drive_to(driver, Vec3::new(100.0, 0.0, 0.0), 10.0).unwrap();
        for _ in 0..10 {
            w.step(0.1);
        }
        let tp = w.position(truck).unwrap();
        assert!((tp.distance_2d(w.position(wreck).unwrap()) - 7.0).abs() < 0.5);
    }

    #[test]
    fn rejected_and_missing_entities_error() {
        let mut w = super::helpers::street();
        let a = w.add_agent(Vec3::ZERO);
        w.reject_directives_for(a);
        assert!(matches!(w.wander(a), Err(DirectiveError::Rejected { .. })));
        w.accept_directives_for(a);
        assert!(w.wander(a).is_ok());
        w.destroy(a);
        assert_eq!(w.wander(a), Err(DirectiveError::Missing(a)));
    }

    #[test]
    fn only_accepted_directives_are_recorded() {
        let mut w = super::helpers::street();
        let a = w.add_agent(Vec3::ZERO);
        let b = w.add_agent(Vec3::new(3.0, 0.0, 0.0));
        w.wander(a).unwrap();
        w.reject_directives_for(b);
        assert!(w.wander(b).is_err());
        w.accept_directives_for(b);
        w.issue(b, crate::Directive::Follow { target: a, distance: 2.0 }).unwrap();
        assert_eq!(w.directives_for(a), vec![&crate::Directive::Wander]);
        assert_eq!(w.directives_for(b).len(), 1, "the refused request left no trace");
    }

    #[test]
    fn dead_entities_only_accept_protection_changes() {
        let mut w = super::helpers::street();
        let a = w.add_agent(Vec3::ZERO);
        w.kill(a);
        assert_eq!(w.wander(a), Err(DirectiveError::Dead(a)));
        assert!(w.set_protection_flags(a, Protection::NONE).is_ok());
    }
}

#[cfg(test)]
mod spawning {
    use amb_core::Vec3;

    use crate::{AgentRole, EntitySpawner, Protection, Seat, VehicleModel, WorldQuery, Directives};

    #[test]
    fn spawn_and_release() {
        let mut w = super::helpers::street();
        let truck = w.spawn_vehicle(VehicleModel::TowTruck, Vec3::ZERO, 0.0).unwrap();
        let driver = w.spawn_agent_in_vehicle(AgentRole::Mechanic, truck, Seat::Driver).unwrap();
        assert_eq!(w.driver_of(truck), Some(driver));
        w.set_protection_flags(driver, Protection::SCRIPTED).unwrap();
        assert!(w.protection(driver).unwrap().essential);
        w.mark_non_essential(driver);
        assert_eq!(w.protection(driver), Some(Protection::NONE));
    }

    #[test]
    fn failed_spawns_surface_as_errors() {
        let mut w = super::helpers::street();
        w.fail_spawns = true;
        assert!(w.spawn_agent(AgentRole::Medic, Vec3::ZERO).is_err());
    }

    #[test]
    fn culling_spares_essential_entities() {
        let mut w = super::helpers::street();
        let keep = w.add_agent(Vec3::new(500.0, 0.0, 0.0));
        let drop = w.add_agent(Vec3::new(600.0, 0.0, 0.0));
        w.set_protection_flags(keep, Protection::SCRIPTED).unwrap();
        assert_eq!(w.cull_non_essential_beyond(Vec3::ZERO, 100.0), 1);
        assert!(w.exists(keep));
        assert!(!w.exists(drop));
    }
}
