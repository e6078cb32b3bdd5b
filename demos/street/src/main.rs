//! Street demo: a sandbox town with the player cruising down the main road
//! while the director stages breakdowns, police stops and the like around
//! them.
//!
//! ```text
//! cargo run -p amb-street-demo -- --ticks 6000
//! RUST_LOG=amb_adapters=debug cargo run -p amb-street-demo -- --config ambient.json
//! ```
//!
//! Without `--config` every section uses its defaults; a JSON file only
//! needs the fields it overrides.

use std::path::PathBuf;

use amb_core::{EntityHandle, IncidentId, MarkerRef, Tick, Vec3};
use amb_director::{AmbientConfig, DirectorBuilder, DirectorObserver, TickSummary};
use amb_incident::{Incident, IncidentKind, IncidentObserver, Interaction, Phase, TeardownReason};
use amb_world::{SandboxWorld, Seat, WorldQuery};
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// Main road half-length in metres.
const ROAD_HALF: f32 = 400.0;
/// Player cruising speed in m/s.
const PLAYER_SPEED: f32 = 6.0;
/// A crash is staged between two nearby cars this often.
const CRASH_EVERY: u64 = 900;

#[derive(Parser)]
#[command(name = "street", about = "Ambient incident director on a sandbox street", version)]
struct Cli {
    /// JSON file with `AmbientConfig` overrides.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(short, long, default_value_t = 3000)]
    ticks: u64,

    /// Override the configured seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log a progress line every this many ticks (0 disables).
    #[arg(long, default_value_t = 500)]
    progress: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<AmbientConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => AmbientConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let (world, player_car) = build_street();
    let mut director = DirectorBuilder::new(config, world).build()?;
    let mut obs = StreetLog::new(cli.progress);

    let dt = director.clock.tick_secs();
    for _ in 0..cli.ticks {
        let now = director.clock.now();
        cruise(&mut director.world, player_car, dt);
        if now.0 > 0 && now.0 % CRASH_EVERY == 0 {
            stage_crash(&mut director.world, player_car);
        }
        director.tick(&mut obs);
        help_out(&mut director, &mut obs);
    }

    let cancelled = director.shutdown(&mut obs);
    let s = director.stats;
    info!(
        ticks = s.ticks,
        created = s.created,
        torn_down = s.torn_down,
        clean = s.clean,
        transitions = s.transitions,
        errors = s.errors,
        evicted = s.evicted,
        cancelled,
        helped = obs.helped,
        "session finished"
    );
    Ok(())
}

// ── Scene ─────────────────────────────────────────────────────────────────────

/// An east-west main road crossed by three side streets, parked traffic on
/// both and pedestrians along the verges.  Returns the world and the
/// player's car.
fn build_street() -> (SandboxWorld, EntityHandle) {
    let mut w = SandboxWorld::new();
    w.add_road(Vec3::new(-ROAD_HALF, 0.0, 0.0), Vec3::new(ROAD_HALF, 0.0, 0.0), 10.0);
    for x in [-200.0, 0.0, 200.0] {
        w.add_road(Vec3::new(x, -200.0, 0.0), Vec3::new(x, 200.0, 0.0), 10.0);
    }

    let player_car = w.add_vehicle(Vec3::new(-ROAD_HALF + 20.0, 0.0, 0.0), 90.0);
    let player = w.add_agent_in(player_car, Seat::Driver);
    w.set_player(player);

    for x in [-300.0, -240.0, -130.0, -40.0, 60.0, 150.0, 260.0, 330.0] {
        let car = w.add_vehicle(Vec3::new(x, 0.0, 0.0), 90.0);
        w.add_agent_in(car, Seat::Driver);
    }
    for (x, y) in [(-200.0, 90.0), (0.0, -120.0), (200.0, 60.0)] {
        let car = w.add_vehicle(Vec3::new(x, y, 0.0), 0.0);
        w.add_agent_in(car, Seat::Driver);
    }
    for i in 0..16 {
        let x = -ROAD_HALF + 25.0 + i as f32 * 50.0;
        let y = if i % 2 == 0 { 7.0 } else { -7.0 };
        w.add_agent(Vec3::new(x, y, 0.0));
    }
    (w, player_car)
}

/// Move the player's car east along the main road, wrapping at the end.
fn cruise(world: &mut SandboxWorld, car: EntityHandle, dt: f32) {
    let Some(pos) = world.position(car) else { return };
    let mut x = pos.x + PLAYER_SPEED * dt;
    if x > ROAD_HALF - 20.0 {
        x = -ROAD_HALF + 20.0;
    }
    world.teleport(car, Vec3::new(x, 0.0, 0.0));
}

/// Report a collision between the two cars closest to the player.
fn stage_crash(world: &mut SandboxWorld, player_car: EntityHandle) {
    let Some(anchor) = world.position(player_car) else { return };
    let cars: Vec<_> = world
        .nearby_vehicles(anchor, 200.0)
        .into_iter()
        .filter(|&v| v != player_car)
        .take(2)
        .collect();
    if let &[a, b] = cars.as_slice() {
        info!(a = %a, b = %b, "staging a crash");
        world.push_collision(a, b);
    }
}

/// The player stops for the first breakdown that asks for help and fixes it.
fn help_out(director: &mut amb_director::Director<SandboxWorld>, obs: &mut StreetLog) {
    let pending: Option<IncidentId> = director
        .engine
        .iter()
        .find(|i| i.kind == IncidentKind::Breakdown && i.flags.can_interact && !obs.offered.contains(&i.id))
        .map(|i| i.id);
    let Some(id) = pending else { return };
    obs.offered.push(id);
    match director.interact(id, Interaction::Repair) {
        Ok(()) => {
            obs.helped += 1;
            info!(incident = %id, "player repaired the car");
        }
        Err(e) => info!(incident = %id, error = %e, "player could not help"),
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs the incident lifecycle the way a HUD would surface it.
struct StreetLog {
    next_marker: u32,
    progress:    u64,
    offered:     Vec<IncidentId>,
    helped:      u64,
}

impl StreetLog {
    fn new(progress: u64) -> Self {
        Self { next_marker: 0, progress, offered: Vec::new(), helped: 0 }
    }
}

impl IncidentObserver for StreetLog {
    fn on_created(&mut self, incident: &Incident) -> Option<MarkerRef> {
        self.next_marker += 1;
        info!(
            incident = %incident.id,
            kind = %incident.kind,
            owner = %incident.owner,
            at = %incident.position,
            members = incident.members.len(),
            "incident started"
        );
        Some(MarkerRef(self.next_marker))
    }

    fn on_phase_changed(&mut self, id: IncidentId, from: Phase, to: Phase, at: Tick) {
        info!(incident = %id, %from, %to, tick = at.0, "phase");
    }

    fn on_advisory(&mut self, id: IncidentId, message: &str) {
        info!(incident = %id, "{message}");
    }

    fn on_torn_down(&mut self, id: IncidentId, kind: IncidentKind, marker: Option<MarkerRef>, reason: &TeardownReason) {
        info!(incident = %id, %kind, marker = ?marker, %reason, "incident over");
    }
}

impl DirectorObserver for StreetLog {
    fn on_tick_end(&mut self, tick: Tick, summary: &TickSummary) {
        if self.progress > 0 && tick.0 > 0 && tick.0 % self.progress == 0 {
            info!(
                tick = tick.0,
                created = summary.created.len(),
                transitions = summary.engine.transitions,
                "progress"
            );
        }
    }

    fn on_sweep(&mut self, tick: Tick, evicted: &[EntityHandle]) {
        info!(tick = tick.0, evicted = evicted.len(), "stale ownership swept");
    }

    fn on_shutdown(&mut self, tick: Tick, cancelled: usize) {
        info!(tick = tick.0, cancelled, "shutting down");
    }
}
