use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A simple 2D vector struct.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2.
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Creates a zero vector.
    pub fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    /// Calculates the squared length (magnitude) of the vector.
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Calculates the length (magnitude) of the vector.
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector pointing the same way.
    /// A zero vector is returned unchanged instead of dividing by zero.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self / len
        } else {
            *self
        }
    }

    /// Scales the vector by a scalar value.
    pub fn scale(&self, scalar: f32) -> Self {
        Vec2 { x: self.x * scalar, y: self.y * scalar }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self { x: self.x * scalar, y: self.y * scalar }
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, scalar: f32) -> Self {
        Self { x: self.x / scalar, y: self.y / scalar }
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

/// Converts an angle (in radians) to a unit vector.
pub fn angle_to_vec(angle_rad: f32) -> Vec2 {
    Vec2::new(angle_rad.cos(), angle_rad.sin())
}

/// Returns a unit vector with a uniformly distributed heading.
/// Used as the push direction for particles sitting exactly on top of each other.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    angle_to_vec(rng.random_range(0.0..std::f32::consts::TAU))
}

/// Wraps a single coordinate back into `[0, limit)`.
///
/// This is a single wrap, not a modulo: it assumes the value left the range by
/// less than one full `limit`. The second branch catches `v + limit` rounding up
/// to exactly `limit` for tiny negative inputs, which keeps the wrap idempotent.
#[inline(always)]
pub fn wrap_coord(v: f32, limit: f32) -> f32 {
    if v < 0.0 {
        let wrapped = v + limit;
        if wrapped >= limit { 0.0 } else { wrapped }
    } else if v >= limit {
        v - limit
    } else {
        v
    }
}

/// Wraps a position onto the torus `[0, limit_x) x [0, limit_y)`.
#[inline(always)]
pub fn wrap_toroidal(v: Vec2, limit_x: f32, limit_y: f32) -> Vec2 {
    Vec2::new(wrap_coord(v.x, limit_x), wrap_coord(v.y, limit_y))
}

/// Shortest signed displacement along one axis of a torus with the given extent.
#[inline(always)]
pub fn minimal_image_coord(d: f32, extent: f32) -> f32 {
    if d > 0.5 * extent {
        d - extent
    } else if d < -0.5 * extent {
        d + extent
    } else {
        d
    }
}

/// Applies the minimal-image correction to a raw displacement `to - from`.
#[inline(always)]
pub fn minimal_image(d: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(minimal_image_coord(d.x, width), minimal_image_coord(d.y, height))
}

/// Linearly maps `value` from `[lo, hi]` onto `[a, b]`, clamping outside the range.
#[inline(always)]
pub fn map_range(value: f32, lo: f32, hi: f32, a: f32, b: f32) -> f32 {
    if value <= lo {
        a
    } else if value >= hi {
        b
    } else {
        a + (value - lo) / (hi - lo) * (b - a)
    }
}
