//! World-space geometry.
//!
//! Positions are metres in a right-handed frame with `z` up.  Headings are
//! compass degrees: 0° points along +Y, 90° along +X.  Most gameplay checks
//! are planar (`distance_2d`) because ground height is snapped separately.

use std::ops::{Add, Sub};

/// A point or displacement in world space.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Full 3-D Euclidean distance.
    #[inline]
    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Distance ignoring height.
    #[inline]
    pub fn distance_2d(self, other: Vec3) -> f32 {
        self.distance_2d_sq(other).sqrt()
    }

    /// Squared planar distance; cheaper for radius comparisons.
    #[inline]
    pub fn distance_2d_sq(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// `true` if `other` lies within `radius` metres on the ground plane.
    #[inline]
    pub fn within_2d(self, other: Vec3, radius: f32) -> bool {
        self.distance_2d_sq(other) <= radius * radius
    }

    /// Compass heading (degrees in `[0, 360)`) from `self` towards `target`.
    pub fn heading_to(self, target: Vec3) -> f32 {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        normalize_heading(dx.atan2(dy).to_degrees())
    }

    /// The point `distance` metres away along compass `heading_deg`, same z.
    pub fn offset_polar(self, heading_deg: f32, distance: f32) -> Vec3 {
        let rad = heading_deg.to_radians();
        Vec3 {
            x: self.x + rad.sin() * distance,
            y: self.y + rad.cos() * distance,
            z: self.z,
        }
    }

    /// Linear interpolation; `t` is not clamped.
    #[inline]
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    #[inline]
    pub fn with_z(self, z: f32) -> Vec3 {
        Vec3 { z, ..self }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Wrap any angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_heading(deg: f32) -> f32 {
    let h = deg.rem_euclid(360.0);
    if h >= 360.0 { 0.0 } else { h }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}
