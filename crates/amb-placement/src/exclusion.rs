//! Keep-out zones around active incidents.

use amb_core::Vec3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExclusionZone {
    pub center: Vec3,
    pub radius: f32,
}

/// The positions of active incidents, each with its exclusion radius.
#[derive(Clone, Debug, Default)]
pub struct ExclusionSet {
    zones: Vec<ExclusionZone>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One zone of `radius` around every point.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>, radius: f32) -> Self {
        Self {
            zones: points.into_iter().map(|center| ExclusionZone { center, radius }).collect(),
        }
    }

    pub fn push(&mut self, center: Vec3, radius: f32) {
        self.zones.push(ExclusionZone { center, radius });
    }

    /// `true` if `p` lies inside (or on the edge of) any zone.
    pub fn is_excluded(&self, p: Vec3) -> bool {
        self.zones.iter().any(|z| p.within_2d(z.center, z.radius))
    }

    pub fn zones(&self) -> &[ExclusionZone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
