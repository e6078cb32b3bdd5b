//! Spontaneous street encounters around the player.
//!
//! Each run rolls once against `spawn_chance`, picks a kind by weight,
//! finds a spot with the placement validator and casts the incident from
//! free pedestrians nearby, spawning whoever is missing.

use amb_core::{EntityHandle, IncidentId, OwnerId, SimRng, Vec3};
use amb_incident::{IncidentKind, IncidentSpec, Role};
use amb_world::{AgentRole, Seat, VehicleModel, World, WorldResult};
use tracing::{debug, info};

use crate::{AdapterCtx, AdapterError, AdapterResult, EncounterConfig, Subsystem};

/// Members gathered so far for one encounter.
#[derive(Default)]
struct Cast {
    held:    Vec<EntityHandle>,
    spawned: Vec<EntityHandle>,
}

impl Cast {
    fn spawned(&mut self, h: EntityHandle) -> EntityHandle {
        self.held.push(h);
        self.spawned.push(h);
        h
    }
}

pub struct EncounterGenerator {
    owner:  OwnerId,
    config: EncounterConfig,
    rng:    SimRng,
}

impl EncounterGenerator {
    pub fn new(config: EncounterConfig, rng: SimRng) -> Self {
        Self::with_owner(OwnerId::from("street.encounters"), config, rng)
    }

    pub fn with_owner(owner: OwnerId, config: EncounterConfig, rng: SimRng) -> Self {
        Self { owner, config, rng }
    }

    fn pick_kind(&mut self) -> Option<IncidentKind> {
        let w = &self.config.weights;
        let total = w.total();
        if total == 0 {
            return None;
        }
        let mut roll = self.rng.gen_range(0..total);
        for (kind, weight) in [
            (IncidentKind::Breakdown, w.breakdown),
            (IncidentKind::PoliceStop, w.police_stop),
            (IncidentKind::Paramedics, w.paramedics),
            (IncidentKind::Altercation, w.altercation),
        ] {
            if roll < weight {
                return Some(kind);
            }
            roll -= weight;
        }
        None
    }

    /// Start one encounter of `kind` near the player.  `Ok(None)` means the
    /// attempt was skipped (no spot, contested entities) and may be retried
    /// on a later run.
    pub fn spawn_kind<W: World + ?Sized>(
        &mut self,
        ctx:  &mut AdapterCtx<'_, W>,
        kind: IncidentKind,
    ) -> AdapterResult<Option<IncidentId>> {
        let Some((center, heading)) = ctx.player_anchor() else {
            return Ok(None);
        };
        let exclusion = ctx.engine.exclusion_set();
        let found = ctx.placement.find_position(
            &*ctx.world,
            center,
            heading,
            self.config.min_distance,
            self.config.max_distance,
            &exclusion,
        );
        let Some(position) = found else {
            debug!(%kind, %center, "no room for an encounter");
            return Ok(None);
        };

        let mut cast = Cast::default();
        let spec = match self.assemble(ctx, kind, position, heading, &mut cast) {
            Ok(spec) => spec,
            Err(e) => {
                ctx.abandon(&self.owner, &cast.held, &cast.spawned);
                return Err(e);
            }
        };

        let now = ctx.now();
        if !ctx.arbiter.try_acquire_all(&*ctx.world, &cast.held, &self.owner, self.config.priority, now) {
            debug!(%kind, %position, "encounter cast is contested");
            ctx.abandon(&self.owner, &[], &cast.spawned);
            return Ok(None);
        }
        match ctx.engine.create(spec, now, &mut *ctx.world, &*ctx.arbiter, &mut *ctx.observer) {
            Ok(id) => {
                info!(incident = %id, %kind, %position, spawned = cast.spawned.len(), "encounter started");
                Ok(Some(id))
            }
            Err(e) => {
                ctx.abandon(&self.owner, &cast.held, &cast.spawned);
                Err(e.into())
            }
        }
    }

    fn assemble<W: World + ?Sized>(
        &mut self,
        ctx:      &mut AdapterCtx<'_, W>,
        kind:     IncidentKind,
        position: Vec3,
        heading:  f32,
        cast:     &mut Cast,
    ) -> AdapterResult<IncidentSpec> {
        let spec = IncidentSpec::new(kind, position, self.owner.clone(), self.config.priority);
        Ok(match kind {
            IncidentKind::Breakdown => {
                let car = cast.spawned(ctx.world.spawn_vehicle(VehicleModel::Civilian, position, heading)?);
                let driver = cast.spawned(ctx.world.spawn_agent_in_vehicle(AgentRole::Civilian, car, Seat::Driver)?);
                spec.agent(Role::Driver, driver).vehicle(Role::Car, car)
            }
            IncidentKind::PoliceStop => {
                let car = cast.spawned(ctx.world.spawn_vehicle(VehicleModel::Civilian, position, heading)?);
                let suspect = cast.spawned(ctx.world.spawn_agent_in_vehicle(AgentRole::Civilian, car, Seat::Driver)?);
                let behind = position.offset_polar(heading + 180.0, self.config.cruiser_gap);
                let cruiser = cast.spawned(ctx.world.spawn_vehicle(VehicleModel::Police, behind, heading)?);
                let officer = cast.spawned(ctx.world.spawn_agent_in_vehicle(AgentRole::Officer, cruiser, Seat::Driver)?);
                spec.agent(Role::Suspect, suspect)
                    .vehicle(Role::SuspectVehicle, car)
                    .agent(Role::Officer, officer)
                    .vehicle(Role::Cruiser, cruiser)
            }
            IncidentKind::Paramedics => {
                let victim = self.recruit_or_spawn(ctx, position, cast)?;
                spec.agent(Role::Victim, victim)
            }
            IncidentKind::Altercation => {
                let aggressor = self.recruit_or_spawn(ctx, position, cast)?;
                let victim = self.recruit_or_spawn(ctx, position.offset_polar(heading + 90.0, 3.0), cast)?;
                spec.agent(Role::Aggressor, aggressor).agent(Role::Victim, victim)
            }
            IncidentKind::Accident => return Err(AdapterError::Unstaged(kind)),
        })
    }

    /// A free pedestrian on foot near `at`, or a freshly spawned one.
    fn recruit_or_spawn<W: World + ?Sized>(
        &mut self,
        ctx:  &mut AdapterCtx<'_, W>,
        at:   Vec3,
        cast: &mut Cast,
    ) -> WorldResult<EntityHandle> {
        let recruit = ctx
            .world
            .nearby_agents(at, self.config.recruit_radius)
            .into_iter()
            .find(|&h| ctx.world.vehicle_of(h).is_none() && ctx.is_free(h) && !cast.held.contains(&h));
        match recruit {
            Some(h) => {
                cast.held.push(h);
                Ok(h)
            }
            None => Ok(cast.spawned(ctx.world.spawn_agent(AgentRole::Civilian, at)?)),
        }
    }
}

impl<W: World + ?Sized> Subsystem<W> for EncounterGenerator {
    fn name(&self) -> &'static str {
        "encounters"
    }

    fn owner(&self) -> &OwnerId {
        &self.owner
    }

    fn interval_ticks(&self) -> u64 {
        self.config.interval_ticks
    }

    fn update(&mut self, ctx: &mut AdapterCtx<'_, W>) -> AdapterResult<Vec<IncidentId>> {
        if ctx.active_for(&self.owner) >= self.config.max_active {
            return Ok(Vec::new());
        }
        if !self.rng.gen_bool(self.config.spawn_chance) {
            return Ok(Vec::new());
        }
        let Some(kind) = self.pick_kind() else {
            return Ok(Vec::new());
        };
        Ok(self.spawn_kind(ctx, kind)?.into_iter().collect())
    }
}
