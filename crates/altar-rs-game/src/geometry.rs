//! Block positions, vectors, and query bounds.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Center of the block.
    pub fn center(&self) -> Vec3 {
        self.offset(0.5, 0.5, 0.5)
    }

    /// A world point relative to the block's minimum corner.
    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Vec3 {
        Vec3::new(self.x as f64 + dx, self.y as f64 + dy, self.z as f64 + dz)
    }
}

/// A point or displacement in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(&self, other: Vec3) -> f64 {
        (*self - other).length_squared()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(&self) -> Option<Vec3> {
        let len = self.length();
        if len < 1.0e-9 {
            return None;
        }
        Some(*self * (1.0 / len))
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Axis-aligned bounding box (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Cube of half-width `half_extent` centered on `center`.
    pub fn cube(center: Vec3, half_extent: f64) -> Self {
        let h = Vec3::new(half_extent, half_extent, half_extent);
        Self {
            min: center - h,
            max: center + h,
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_center() {
        let c = BlockPos::new(1, 64, -3).center();
        assert_eq!(c, Vec3::new(1.5, 64.5, -2.5));
    }

    #[test]
    fn normalize_zero_is_none() {
        assert!(Vec3::ZERO.normalized().is_none());
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-9);
        assert!((n.x - 0.6).abs() < 1e-9);
    }

    #[test]
    fn cube_contains() {
        let bb = Aabb::cube(Vec3::new(0.5, 0.5, 0.5), 8.0);
        assert!(bb.contains(Vec3::new(8.5, 0.5, 0.5)));
        assert!(bb.contains(Vec3::new(-7.5, -7.5, -7.5)));
        assert!(!bb.contains(Vec3::new(8.6, 0.5, 0.5)));
    }
}
