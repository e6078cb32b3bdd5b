//! Fluent builder for constructing a [`Director`].

use amb_adapters::{CollisionHandler, EncounterGenerator, Subsystem, SubsystemScheduler, TrafficBlockageHandler};
use amb_arbiter::OwnershipArbiter;
use amb_core::SimRng;
use amb_incident::IncidentEngine;
use amb_placement::PlacementValidator;
use amb_world::World;
use tracing::info;

use crate::{AmbientConfig, Director, DirectorResult, DirectorStats, Steppable};

/// RNG stream offset of the encounter generator.
const ENCOUNTER_STREAM: u64 = 3;

/// Fluent builder for [`Director<W>`].
///
/// By default the three stock adapters (traffic blockage, collisions,
/// encounters) are registered for every section of
/// [`AmbientConfig::adapters`] that is enabled.  Extra subsystems run after
/// them, in the order they were added.
///
/// ```rust,ignore
/// let mut director = DirectorBuilder::new(config, world)
///     .subsystem(MyAdapter::new())
///     .build()?;
/// director.run_ticks(600, &mut NoopObserver);
/// ```
pub struct DirectorBuilder<W: World + Steppable + 'static> {
    config:   AmbientConfig,
    world:    W,
    extra:    Vec<Box<dyn Subsystem<W>>>,
    defaults: bool,
}

impl<W: World + Steppable + 'static> DirectorBuilder<W> {
    pub fn new(config: AmbientConfig, world: W) -> Self {
        Self { config, world, extra: Vec::new(), defaults: true }
    }

    /// Register an additional subsystem.
    pub fn subsystem(mut self, subsystem: impl Subsystem<W> + 'static) -> Self {
        self.extra.push(Box::new(subsystem));
        self
    }

    /// Skip the stock adapters; only subsystems added with
    /// [`subsystem`](Self::subsystem) will run.
    pub fn without_default_adapters(mut self) -> Self {
        self.defaults = false;
        self
    }

    /// Validate the configuration and wire everything together.
    pub fn build(self) -> DirectorResult<Director<W>> {
        let config = self.config;
        config.validate()?;

        let mut rng = SimRng::new(config.seed);
        let mut scheduler = SubsystemScheduler::new();
        if self.defaults {
            let a = &config.adapters;
            if a.blockage.enabled {
                scheduler.add(Box::new(TrafficBlockageHandler::new(a.blockage.clone())));
            }
            if a.collisions.enabled {
                scheduler.add(Box::new(CollisionHandler::new(a.collisions.clone())));
            }
            if a.encounters.enabled {
                let stream = rng.child(ENCOUNTER_STREAM);
                scheduler.add(Box::new(EncounterGenerator::new(a.encounters.clone(), stream)));
            }
        }
        for s in self.extra {
            scheduler.add(s);
        }

        info!(seed = config.seed, subsystems = scheduler.len(), "director ready");
        Ok(Director {
            clock:     config.clock.make_clock(),
            arbiter:   OwnershipArbiter::new(config.arbiter.clone()),
            engine:    IncidentEngine::new(config.incidents.clone(), config.seed),
            placement: PlacementValidator::new(config.placement.clone()),
            world:     self.world,
            scheduler,
            stats:     DirectorStats::default(),
            config,
        })
    }
}
