//! The ordered, budgeted candidate search.

use tracing::{debug, trace};

use amb_core::Vec3;
use amb_world::WorldQuery;

use crate::{ExclusionSet, PlacementConfig};

/// Why a candidate point was thrown away.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds,
    Submerged,
    NoGround,
    OffRoute,
    Excluded,
    /// Snapped onto a route node that lies outside the requested distances.
    OutOfRange,
}

/// Float slack on the min/max distance check.
const RANGE_SLACK: f32 = 0.01;

pub struct PlacementValidator {
    config: PlacementConfig,
}

impl PlacementValidator {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Candidate points in probe order, capped at `max_candidates`.
    ///
    /// Ahead fan first (every ring), then the full-circle fallback (every
    /// ring), skipping bearings the fan already covered.
    pub fn candidates(&self, origin: Vec3, forward_hint: f32, min_distance: f32, max_distance: f32) -> Vec<Vec3> {
        let (lo, hi) = if min_distance <= max_distance {
            (min_distance.max(0.0), max_distance.max(0.0))
        } else {
            (max_distance.max(0.0), min_distance.max(0.0))
        };
        let steps = self.config.distance_steps.max(1);
        let rings: Vec<f32> = (0..steps)
            .map(|i| {
                if steps == 1 { lo } else { lo + (hi - lo) * i as f32 / (steps - 1) as f32 }
            })
            .collect();

        let ahead: Vec<f32> = self.config.ahead_angles_deg.iter().map(|a| forward_hint + a).collect();
        let step = self.config.fallback_angle_step_deg.clamp(1.0, 360.0);
        let fallback: Vec<f32> = (0..(360.0 / step).floor() as u32)
            .map(|i| forward_hint + i as f32 * step)
            .filter(|b| !ahead.iter().any(|a| same_bearing(*a, *b)))
            .collect();

        let mut out = Vec::with_capacity(self.config.max_candidates);
        for bearings in [&ahead, &fallback] {
            for &d in &rings {
                for &b in bearings.iter() {
                    if out.len() == self.config.max_candidates {
                        return out;
                    }
                    out.push(origin.offset_polar(b, d));
                }
            }
        }
        out
    }

    /// Run every check on one candidate.  On success returns the point
    /// snapped to the ground (and onto a route node when that was the only
    /// road evidence).
    pub fn probe<Q: WorldQuery + ?Sized>(
        &self,
        world:     &Q,
        candidate: Vec3,
        exclusion: &ExclusionSet,
    ) -> Result<Vec3, Rejection> {
        let cfg = &self.config;

        // ① bounds
        if !self.in_bounds(candidate) {
            return Err(Rejection::OutOfBounds);
        }

        // ② water
        self.check_dry(world, candidate)?;

        // ③ ground snap
        let ground = world.ground_height(candidate).ok_or(Rejection::NoGround)?;
        let mut point = candidate.with_z(ground);
        if !self.in_bounds(point) {
            return Err(Rejection::OutOfBounds);
        }

        // ④ traversable route, corroborated
        let on_route = world.is_on_route(point);
        if on_route {
            let node = world.nearest_route_node(point, cfg.route_node_radius).is_some();
            let traffic = !world.nearby_vehicles(point, cfg.traffic_radius).is_empty();
            if !node && !traffic {
                return Err(Rejection::OffRoute);
            }
        } else {
            let node = world
                .nearest_route_node(point, cfg.fallback_node_radius)
                .ok_or(Rejection::OffRoute)?;
            let z = world.ground_height(node).ok_or(Rejection::NoGround)?;
            point = node.with_z(z);
            // The node is a different spot: ① and ② again.
            if !self.in_bounds(point) {
                return Err(Rejection::OutOfBounds);
            }
            self.check_dry(world, point)?;
        }

        // ⑤ keep out of other incidents
        if exclusion.is_excluded(point) {
            return Err(Rejection::Excluded);
        }
        Ok(point)
    }

    /// Find a position between `min_distance` and `max_distance` from
    /// `origin`, preferring bearings around `forward_hint` (compass degrees).
    ///
    /// Returns `None` once the candidate budget is exhausted.
    pub fn find_position<Q: WorldQuery + ?Sized>(
        &self,
        world:        &Q,
        origin:       Vec3,
        forward_hint: f32,
        min_distance: f32,
        max_distance: f32,
        exclusion:    &ExclusionSet,
    ) -> Option<Vec3> {
        let candidates = self.candidates(origin, forward_hint, min_distance, max_distance);
        let (lo, hi) = (min_distance.min(max_distance), min_distance.max(max_distance));
        for (i, c) in candidates.iter().enumerate() {
            let found = self.probe(world, *c, exclusion).and_then(|p| {
                let d = p.distance_2d(origin);
                if d < lo - RANGE_SLACK || d > hi + RANGE_SLACK { Err(Rejection::OutOfRange) } else { Ok(p) }
            });
            match found {
                Ok(p) => {
                    debug!(%origin, position = %p, probed = i + 1, "placement found");
                    return Some(p);
                }
                Err(reason) => trace!(candidate = %c, ?reason, "placement candidate rejected"),
            }
        }
        debug!(%origin, probed = candidates.len(), "placement exhausted");
        None
    }

    /// Either already under the surface, or the ground is within tolerance
    /// of it.
    fn check_dry<Q: WorldQuery + ?Sized>(&self, world: &Q, p: Vec3) -> Result<(), Rejection> {
        if let Some(surface) = world.water_height(p) {
            let ground = world.ground_height(p);
            if world.is_submerged(p) || ground.is_none_or(|g| g < surface + self.config.submersion_tolerance) {
                return Err(Rejection::Submerged);
            }
        }
        Ok(())
    }

    fn in_bounds(&self, p: Vec3) -> bool {
        let cfg = &self.config;
        p.is_finite()
            && p.x.abs() <= cfg.world_half_extent
            && p.y.abs() <= cfg.world_half_extent
            && p.z >= cfg.min_z
            && p.z <= cfg.max_z
    }
}

impl Default for PlacementValidator {
    fn default() -> Self {
        Self::new(PlacementConfig::default())
    }
}

fn same_bearing(a: f32, b: f32) -> bool {
    let d = (a - b).rem_euclid(360.0);
    d < 0.5 || d > 359.5
}
