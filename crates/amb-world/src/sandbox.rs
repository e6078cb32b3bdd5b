//! A small in-memory host: `SandboxWorld`.
//!
//! Implements every world trait with just enough behavior to exercise the
//! engine end-to-end: agents walk, vehicles drive in straight lines, seat
//! changes take time (and report busy meanwhile), occupants ride along with
//! their vehicle and towed vehicles trail their truck.  Road geometry is a
//! cloud of route nodes in an R-tree; `is_on_route` is deliberately blind
//! near junction nodes so placement has to corroborate it.
//!
//! Tests build a world, inject faults (`destroy`, `kill`,
//! `reject_directives_for`, `push_collision`) and call [`SandboxWorld::step`]
//! once per tick.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::{FxHashMap, FxHashSet};

use amb_core::{EntityHandle, EntityKind, Vec3};

use crate::{
    AgentRole, Directive, DirectiveError, DirectiveResult, DirectiveSink, EntitySpawner,
    InteractionKind, MoveSpeed, Protection, Seat, VehicleModel, WorldError, WorldQuery,
    WorldResult,
};

const WALK_SPEED:   f32 = 1.4;
const RUN_SPEED:    f32 = 4.5;
const CRUISE_SPEED: f32 = 8.0;
/// Distance at which a boarding agent stops walking and starts the seat animation.
const BOARD_REACH:  f32 = 3.0;
const TOW_OFFSET:   f32 = 7.0;

// ── Route index entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct RouteNode {
    point:    [f32; 2],
    pos:      Vec3,
    junction: bool,
}

impl RTreeObject for RouteNode {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for RouteNode {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── Terrain ───────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle on the ground plane.
#[derive(Copy, Clone, Debug)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

#[derive(Copy, Clone, Debug)]
struct WaterZone {
    area:    Rect,
    surface: f32,
}

// ── Entities ──────────────────────────────────────────────────────────────────

/// What a sandbox entity is currently doing.
#[derive(Clone, Debug, PartialEq)]
pub enum Task {
    Idle,
    Walk { target: Vec3, speed: f32 },
    Drive { target: Vec3, speed: f32 },
    Wander,
    Follow { target: EntityHandle, distance: f32 },
    Flee { threat: EntityHandle },
    Engage { target: EntityHandle },
    Boarding { vehicle: EntityHandle, seat: Seat, remaining: f32 },
    Exiting { remaining: f32 },
    Interacting(InteractionKind),
}

#[derive(Clone, Debug)]
pub struct SandboxEntity {
    pub kind:       EntityKind,
    pub position:   Vec3,
    pub heading:    f32,
    pub speed:      f32,
    pub alive:      bool,
    pub protection: Protection,
    pub model:      Option<VehicleModel>,
    pub role:       Option<AgentRole>,
    /// For agents: the vehicle and seat they occupy.
    pub seat:       Option<(EntityHandle, Seat)>,
    pub task:       Task,
    /// For tow trucks: the vehicle hooked behind.
    pub towing:     Option<EntityHandle>,
}

impl SandboxEntity {
    fn new(kind: EntityKind, position: Vec3, heading: f32) -> Self {
        Self {
            kind,
            position,
            heading,
            speed: 0.0,
            alive: true,
            protection: Protection::NONE,
            model: None,
            role: None,
            seat: None,
            task: Task::Idle,
            towing: None,
        }
    }
}

// ── SandboxWorld ──────────────────────────────────────────────────────────────

pub struct SandboxWorld {
    entities:    FxHashMap<EntityHandle, SandboxEntity>,
    next_handle: u32,
    routes:      RTree<RouteNode>,
    water:       Vec<WaterZone>,
    voids:       Vec<Rect>,
    collisions:  Vec<(EntityHandle, EntityHandle)>,
    rejecting:   FxHashSet<EntityHandle>,
    player:      Option<EntityHandle>,

    /// Flat ground height outside voids and water.
    pub ground_z: f32,
    /// Half-width of a lane: `is_on_route` radius around route nodes.
    pub lane_half_width: f32,
    /// `is_on_route` answers `false` within this radius of a junction node.
    pub junction_blind_radius: f32,
    /// Seconds a seat change takes once the agent is at the door.
    pub seat_transition_secs: f32,
    /// When set, every spawn request fails.
    pub fail_spawns: bool,
    /// Every accepted directive, in order.
    pub issued: Vec<(EntityHandle, Directive)>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self {
            entities:              FxHashMap::default(),
            next_handle:           1,
            routes:                RTree::new(),
            water:                 Vec::new(),
            voids:                 Vec::new(),
            collisions:            Vec::new(),
            rejecting:             FxHashSet::default(),
            player:                None,
            ground_z:              0.0,
            lane_half_width:       5.0,
            junction_blind_radius: 10.0,
            seat_transition_secs:  1.5,
            fail_spawns:           false,
            issued:                Vec::new(),
        }
    }

    // ── Geometry setup ────────────────────────────────────────────────────

    pub fn add_route_node(&mut self, pos: Vec3, junction: bool) {
        self.routes.insert(RouteNode { point: [pos.x, pos.y], pos, junction });
    }

    /// Lay route nodes every `spacing` metres from `a` to `b` (inclusive).
    /// Both endpoints are marked as junctions.
    pub fn add_road(&mut self, a: Vec3, b: Vec3, spacing: f32) {
        let len = a.distance_2d(b);
        let steps = (len / spacing.max(0.5)).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let junction = i == 0 || i == steps;
            self.add_route_node(a.lerp(b, t).with_z(self.ground_z), junction);
        }
    }

    pub fn add_water(&mut self, area: Rect, surface: f32) {
        self.water.push(WaterZone { area, surface });
    }

    /// Area with no ground at all (cliff edge, map hole).
    pub fn add_void(&mut self, area: Rect) {
        self.voids.push(area);
    }

    // ── Population ────────────────────────────────────────────────────────

    fn alloc(&mut self, entity: SandboxEntity) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        self.entities.insert(handle, entity);
        handle
    }

    pub fn add_agent(&mut self, position: Vec3) -> EntityHandle {
        let mut e = SandboxEntity::new(EntityKind::Agent, position, 0.0);
        e.role = Some(AgentRole::Civilian);
        self.alloc(e)
    }

    pub fn add_vehicle(&mut self, position: Vec3, heading: f32) -> EntityHandle {
        let mut e = SandboxEntity::new(EntityKind::Vehicle, position, heading);
        e.model = Some(VehicleModel::Civilian);
        self.alloc(e)
    }

    /// Add a civilian seated in `vehicle`.
    pub fn add_agent_in(&mut self, vehicle: EntityHandle, seat: Seat) -> EntityHandle {
        let pos = self.entities.get(&vehicle).map(|v| v.position).unwrap_or_default();
        let mut e = SandboxEntity::new(EntityKind::Agent, pos, 0.0);
        e.role = Some(AgentRole::Civilian);
        e.seat = Some((vehicle, seat));
        self.alloc(e)
    }

    pub fn set_player(&mut self, agent: EntityHandle) {
        self.player = Some(agent);
    }

    // ── Fault injection ───────────────────────────────────────────────────

    /// Remove an entity outright; occupants are left standing.
    pub fn destroy(&mut self, entity: EntityHandle) {
        self.entities.remove(&entity);
        for e in self.entities.values_mut() {
            if e.seat.is_some_and(|(v, _)| v == entity) {
                e.seat = None;
            }
            if e.towing == Some(entity) {
                e.towing = None;
            }
        }
    }

    pub fn kill(&mut self, entity: EntityHandle) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.alive = false;
            e.task = Task::Idle;
        }
    }

    pub fn push_collision(&mut self, a: EntityHandle, b: EntityHandle) {
        self.collisions.push((a, b));
    }

    /// Every directive for `entity` fails with `Rejected` until cleared.
    pub fn reject_directives_for(&mut self, entity: EntityHandle) {
        self.rejecting.insert(entity);
    }

    pub fn accept_directives_for(&mut self, entity: EntityHandle) {
        self.rejecting.remove(&entity);
    }

    /// Despawn every non-essential entity (other than the player and their
    /// vehicle) farther than `radius` from `center`, like host population
    /// culling.  Returns how many were removed.
    pub fn cull_non_essential_beyond(&mut self, center: Vec3, radius: f32) -> usize {
        let player = self.player;
        let player_vehicle = self.player_vehicle();
        let mut doomed: Vec<EntityHandle> = self
            .entities
            .iter()
            .filter(|(h, e)| {
                Some(**h) != player
                    && Some(**h) != player_vehicle
                    && !e.protection.essential
                    && !e.position.within_2d(center, radius)
            })
            .map(|(h, _)| *h)
            .collect();
        doomed.sort();
        for h in &doomed {
            self.destroy(*h);
        }
        doomed.len()
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn entity(&self, handle: EntityHandle) -> Option<&SandboxEntity> {
        self.entities.get(&handle)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn teleport(&mut self, handle: EntityHandle, pos: Vec3) {
        if let Some(e) = self.entities.get_mut(&handle) {
            e.position = pos;
        }
    }

    pub fn directives_for(&self, handle: EntityHandle) -> Vec<&Directive> {
        self.issued.iter().filter(|(h, _)| *h == handle).map(|(_, d)| d).collect()
    }

    pub fn protection(&self, handle: EntityHandle) -> Option<Protection> {
        self.entities.get(&handle).map(|e| e.protection)
    }

    fn seat_taken(&self, vehicle: EntityHandle, seat: Seat) -> bool {
        self.entities.values().any(|e| e.seat == Some((vehicle, seat)))
    }

    fn sorted_handles(&self) -> Vec<EntityHandle> {
        let mut v: Vec<EntityHandle> = self.entities.keys().copied().collect();
        v.sort();
        v
    }

    fn nearby(&self, kind: EntityKind, position: Vec3, radius: f32) -> Vec<EntityHandle> {
        let mut found: Vec<(f32, EntityHandle)> = self
            .entities
            .iter()
            .filter(|(_, e)| e.kind == kind && e.position.within_2d(position, radius))
            .map(|(h, e)| (e.position.distance_2d_sq(position), *h))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, h)| h).collect()
    }

    // ── Simulation step ───────────────────────────────────────────────────

    /// Advance every entity by `dt` seconds and forget last step's collisions.
    pub fn step(&mut self, dt: f32) {
        self.collisions.clear();
        let handles = self.sorted_handles();

        // Vehicles first so occupants and towed vehicles can follow them.
        for &h in &handles {
            if self.entities.get(&h).is_some_and(|e| e.kind == EntityKind::Vehicle) {
                self.step_entity(h, dt);
            }
        }
        for &h in &handles {
            if self.entities.get(&h).is_some_and(|e| e.kind == EntityKind::Vehicle) {
                self.step_towed(h);
            }
        }
        for &h in &handles {
            if self.entities.get(&h).is_some_and(|e| e.kind == EntityKind::Agent) {
                self.step_entity(h, dt);
            }
        }
    }

    fn step_towed(&mut self, truck: EntityHandle) {
        let Some(t) = self.entities.get(&truck) else { return };
        let Some(towed) = t.towing else { return };
        let behind = t.position.offset_polar(t.heading + 180.0, TOW_OFFSET);
        let (heading, speed) = (t.heading, t.speed);
        if let Some(v) = self.entities.get_mut(&towed) {
            v.position = behind;
            v.heading = heading;
            v.speed = speed;
        }
    }

    fn step_entity(&mut self, h: EntityHandle, dt: f32) {
        let Some(e) = self.entities.get(&h).cloned() else { return };
        if !e.alive {
            return;
        }

        // Seated agents ride along; only an exit can change that.
        if let Some((vehicle, _)) = e.seat {
            let vpos = self.entities.get(&vehicle).map(|v| v.position);
            let mut next = e.clone();
            if let Some(p) = vpos {
                next.position = p;
            }
            if let Task::Exiting { remaining } = e.task {
                let left = remaining - dt;
                if left <= 0.0 {
                    next.seat = None;
                    next.task = Task::Idle;
                    let vh = self.entities.get(&vehicle).map(|v| v.heading).unwrap_or(0.0);
                    next.position = next.position.offset_polar(vh - 90.0, 2.0);
                } else {
                    next.task = Task::Exiting { remaining: left };
                }
            }
            self.entities.insert(h, next);
            return;
        }

        let target_of = |other: EntityHandle| self.entities.get(&other).map(|o| o.position);

        let mut next = e.clone();
        match e.task.clone() {
            Task::Idle | Task::Interacting(_) => next.speed = 0.0,
            Task::Exiting { .. } => {
                next.speed = 0.0;
                next.task = Task::Idle;
            }
            Task::Walk { target, speed } | Task::Drive { target, speed } => {
                let arrive = if e.kind == EntityKind::Vehicle { 3.0 } else { 0.5 };
                if advance(&mut next, target, speed, dt, arrive) {
                    next.task = Task::Idle;
                    next.speed = 0.0;
                }
            }
            Task::Wander => {
                let speed = if e.kind == EntityKind::Vehicle { CRUISE_SPEED } else { WALK_SPEED };
                let target = e.position.offset_polar(e.heading, speed * dt * 2.0);
                advance(&mut next, target, speed, dt, 0.0);
            }
            Task::Follow { target, distance } => match target_of(target) {
                Some(tp) if !e.position.within_2d(tp, distance) => {
                    advance(&mut next, tp, RUN_SPEED, dt, distance);
                }
                _ => next.speed = 0.0,
            },
            Task::Flee { threat } => {
                if let Some(tp) = target_of(threat) {
                    let away = tp.heading_to(e.position);
                    let target = e.position.offset_polar(away, RUN_SPEED * dt * 2.0);
                    advance(&mut next, target, RUN_SPEED, dt, 0.0);
                }
            }
            Task::Engage { target } => {
                if let Some(tp) = target_of(target) {
                    advance(&mut next, tp, RUN_SPEED, dt, 1.5);
                }
            }
            Task::Boarding { vehicle, seat, remaining } => match target_of(vehicle) {
                None => next.task = Task::Idle,
                Some(vp) if !e.position.within_2d(vp, BOARD_REACH) => {
                    advance(&mut next, vp, WALK_SPEED, dt, BOARD_REACH * 0.5);
                }
                Some(vp) => {
                    next.speed = 0.0;
                    let left = remaining - dt;
                    if left > 0.0 {
                        next.task = Task::Boarding { vehicle, seat, remaining: left };
                    } else if self.seat_taken(vehicle, seat) {
                        next.task = Task::Idle;
                    } else {
                        next.seat = Some((vehicle, seat));
                        next.position = vp;
                        next.task = Task::Idle;
                    }
                }
            },
        }
        self.entities.insert(h, next);
    }

    fn driven_vehicle(&self, agent: &SandboxEntity) -> Option<EntityHandle> {
        match agent.seat {
            Some((v, Seat::Driver)) => Some(v),
            _ => None,
        }
    }
}

/// Move `e` towards `target`.  Returns `true` once within `arrive` metres.
fn advance(e: &mut SandboxEntity, target: Vec3, speed: f32, dt: f32, arrive: f32) -> bool {
    let dist = e.position.distance_2d(target);
    if dist <= arrive.max(1e-3) {
        return true;
    }
    e.heading = e.position.heading_to(target);
    let stride = (speed * dt).min(dist);
    e.position = e.position.offset_polar(e.heading, stride);
    e.speed = speed;
    dist - stride <= arrive.max(1e-3)
}

// ── WorldQuery ────────────────────────────────────────────────────────────────

impl WorldQuery for SandboxWorld {
    fn exists(&self, entity: EntityHandle) -> bool {
        self.entities.contains_key(&entity)
    }

    fn is_alive(&self, entity: EntityHandle) -> bool {
        self.entities.get(&entity).is_some_and(|e| e.alive)
    }

    fn kind(&self, entity: EntityHandle) -> Option<EntityKind> {
        self.entities.get(&entity).map(|e| e.kind)
    }

    fn position(&self, entity: EntityHandle) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.position)
    }

    fn heading(&self, entity: EntityHandle) -> Option<f32> {
        self.entities.get(&entity).map(|e| e.heading)
    }

    fn speed(&self, entity: EntityHandle) -> Option<f32> {
        self.entities.get(&entity).map(|e| e.speed)
    }

    fn vehicle_of(&self, agent: EntityHandle) -> Option<EntityHandle> {
        self.entities.get(&agent).and_then(|e| e.seat).map(|(v, _)| v)
    }

    fn driver_of(&self, vehicle: EntityHandle) -> Option<EntityHandle> {
        let mut drivers: Vec<EntityHandle> = self
            .entities
            .iter()
            .filter(|(_, e)| e.seat == Some((vehicle, Seat::Driver)))
            .map(|(h, _)| *h)
            .collect();
        drivers.sort();
        drivers.first().copied()
    }

    fn is_busy(&self, entity: EntityHandle) -> bool {
        self.entities.get(&entity).is_some_and(|e| {
            matches!(e.task, Task::Exiting { .. })
                || matches!(e.task, Task::Boarding { vehicle, .. }
                    if self.entities.get(&vehicle)
                        .is_some_and(|v| v.position.within_2d(e.position, BOARD_REACH)))
        })
    }

    fn player(&self) -> Option<EntityHandle> {
        self.player.filter(|p| self.entities.contains_key(p))
    }

    fn nearby_agents(&self, position: Vec3, radius: f32) -> Vec<EntityHandle> {
        self.nearby(EntityKind::Agent, position, radius)
    }

    fn nearby_vehicles(&self, position: Vec3, radius: f32) -> Vec<EntityHandle> {
        self.nearby(EntityKind::Vehicle, position, radius)
    }

    fn ground_height(&self, position: Vec3) -> Option<f32> {
        if self.voids.iter().any(|r| r.contains(position)) {
            return None;
        }
        match self.water.iter().find(|w| w.area.contains(position)) {
            Some(w) => Some(w.surface - 4.0),
            None    => Some(self.ground_z),
        }
    }

    fn water_height(&self, position: Vec3) -> Option<f32> {
        self.water.iter().find(|w| w.area.contains(position)).map(|w| w.surface)
    }

    fn is_on_route(&self, position: Vec3) -> bool {
        let p = [position.x, position.y];
        let near_junction = self
            .routes
            .locate_within_distance(p, self.junction_blind_radius * self.junction_blind_radius)
            .any(|n| n.junction);
        if near_junction {
            return false;
        }
        self.routes
            .nearest_neighbor(&p)
            .is_some_and(|n| n.distance_2(&p) <= self.lane_half_width * self.lane_half_width)
    }

    fn nearest_route_node(&self, position: Vec3, radius: f32) -> Option<Vec3> {
        let p = [position.x, position.y];
        self.routes
            .nearest_neighbor(&p)
            .filter(|n| n.distance_2(&p) <= radius * radius)
            .map(|n| n.pos)
    }

    fn recent_collisions(&self) -> Vec<(EntityHandle, EntityHandle)> {
        self.collisions.clone()
    }
}

// ── DirectiveSink ─────────────────────────────────────────────────────────────

impl DirectiveSink for SandboxWorld {
    fn issue(&mut self, entity: EntityHandle, directive: Directive) -> DirectiveResult {
        let Some(e) = self.entities.get(&entity).cloned() else {
            return Err(DirectiveError::Missing(entity));
        };
        if self.rejecting.contains(&entity) {
            return Err(DirectiveError::Rejected { entity, reason: "host refused".into() });
        }
        if !e.alive && !matches!(directive, Directive::SetProtection(_)) {
            return Err(DirectiveError::Dead(entity));
        }
        let transitioning = matches!(e.task, Task::Exiting { .. } | Task::Boarding { .. });
        if transitioning
            && self.is_busy(entity)
            && !matches!(directive, Directive::SetProtection(_))
        {
            return Err(DirectiveError::Busy(entity));
        }

        let reject = |reason: &str| DirectiveError::Rejected { entity, reason: reason.to_string() };

        match &directive {
            Directive::MoveTo { target, speed } => {
                if e.seat.is_some() {
                    return Err(reject("seated"));
                }
                let speed = match speed {
                    MoveSpeed::Walk => WALK_SPEED,
                    MoveSpeed::Run  => RUN_SPEED,
                };
                self.set_task(entity, Task::Walk { target: *target, speed });
            }
            Directive::DriveTo { target, speed_mps } => {
                let vehicle = if e.kind == EntityKind::Vehicle {
                    entity
                } else {
                    self.driven_vehicle(&e).ok_or_else(|| reject("not driving"))?
                };
                self.set_task(vehicle, Task::Drive { target: *target, speed: *speed_mps });
            }
            Directive::Wander => match self.driven_vehicle(&e) {
                Some(v) => self.set_task(v, Task::Wander),
                None if e.seat.is_some() => {}
                None => self.set_task(entity, Task::Wander),
            },
            Directive::Follow { target, distance } => {
                if e.seat.is_some() {
                    return Err(reject("seated"));
                }
                self.set_task(entity, Task::Follow { target: *target, distance: *distance });
            }
            Directive::EnterVehicle { vehicle, seat } => {
                if !self.exists(*vehicle) {
                    return Err(reject("vehicle missing"));
                }
                if e.seat == Some((*vehicle, *seat)) {
                    // Already there: accepted, nothing to do.
                } else if self.seat_taken(*vehicle, *seat) {
                    return Err(reject("seat taken"));
                } else {
                    let remaining = self.seat_transition_secs;
                    self.set_task(entity, Task::Boarding { vehicle: *vehicle, seat: *seat, remaining });
                }
            }
            Directive::LeaveVehicle => {
                if e.seat.is_some() {
                    let remaining = self.seat_transition_secs;
                    self.set_task(entity, Task::Exiting { remaining });
                }
            }
            Directive::PlayInteraction(kind) => {
                if e.seat.is_some() {
                    return Err(reject("seated"));
                }
                self.set_task(entity, Task::Interacting(*kind));
            }
            Directive::FleeFrom { threat } => {
                if e.seat.is_none() {
                    self.set_task(entity, Task::Flee { threat: *threat });
                } else if let Some(v) = self.driven_vehicle(&e) {
                    self.set_task(v, Task::Wander);
                }
            }
            Directive::Engage { target } => {
                if e.seat.is_some() {
                    return Err(reject("seated"));
                }
                self.set_task(entity, Task::Engage { target: *target });
            }
            Directive::Tow { vehicle } => {
                let truck = if e.kind == EntityKind::Vehicle {
                    entity
                } else {
                    self.driven_vehicle(&e).ok_or_else(|| reject("not driving"))?
                };
                if !self.exists(*vehicle) {
                    return Err(reject("towed vehicle missing"));
                }
                if let Some(t) = self.entities.get_mut(&truck) {
                    t.towing = Some(*vehicle);
                }
            }
            Directive::SetProtection(flags) => {
                if let Some(x) = self.entities.get_mut(&entity) {
                    x.protection = *flags;
                }
            }
            Directive::ClearTasks => self.set_task(entity, Task::Idle),
        }

        self.issued.push((entity, directive));
        Ok(())
    }
}

impl SandboxWorld {
    fn set_task(&mut self, entity: EntityHandle, task: Task) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.task = task;
        }
    }
}

// ── EntitySpawner ─────────────────────────────────────────────────────────────

impl EntitySpawner for SandboxWorld {
    fn spawn_vehicle(&mut self, model: VehicleModel, position: Vec3, heading: f32)
        -> WorldResult<EntityHandle>
    {
        if self.fail_spawns {
            return Err(WorldError::SpawnFailed(format!("{model:?} refused by host")));
        }
        let mut e = SandboxEntity::new(EntityKind::Vehicle, position, heading);
        e.model = Some(model);
        Ok(self.alloc(e))
    }

    fn spawn_agent(&mut self, role: AgentRole, position: Vec3) -> WorldResult<EntityHandle> {
        if self.fail_spawns {
            return Err(WorldError::SpawnFailed(format!("{role:?} refused by host")));
        }
        let mut e = SandboxEntity::new(EntityKind::Agent, position, 0.0);
        e.role = Some(role);
        Ok(self.alloc(e))
    }

    fn spawn_agent_in_vehicle(&mut self, role: AgentRole, vehicle: EntityHandle, seat: Seat)
        -> WorldResult<EntityHandle>
    {
        if self.fail_spawns {
            return Err(WorldError::SpawnFailed(format!("{role:?} refused by host")));
        }
        let pos = self.position(vehicle).ok_or(WorldError::Missing(vehicle))?;
        if self.seat_taken(vehicle, seat) {
            return Err(WorldError::SpawnFailed(format!("seat {seat:?} of {vehicle} taken")));
        }
        let mut e = SandboxEntity::new(EntityKind::Agent, pos, 0.0);
        e.role = Some(role);
        e.seat = Some((vehicle, seat));
        Ok(self.alloc(e))
    }

    fn mark_non_essential(&mut self, entity: EntityHandle) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.protection = Protection::NONE;
        }
    }
}
