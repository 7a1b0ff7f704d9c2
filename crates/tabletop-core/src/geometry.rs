//! Placement geometry: vectors, places and axis-aligned overlap.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub};

/// A 3D vector, used for positions, sizes and Euler rotations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1).
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

/// Where and how a thing is drawn: center position, Euler rotation and
/// bounding size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub position: Vec3,
    pub rotation: Vec3,
    pub size: Vec3,
}

impl Place {
    pub fn new(position: Vec3, rotation: Vec3, size: Vec3) -> Self {
        Self {
            position,
            rotation,
            size,
        }
    }

    /// Same place, moved by `offset`.
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.position += offset;
        self
    }

    /// Footprint of this place on the table plane.
    pub fn footprint(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }
}

/// Axis-aligned rectangle centered on `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Grow width and height by `margin`, keeping the center.
    pub fn dilate(self, margin: f32) -> Self {
        Self::new(self.x, self.y, self.w + margin, self.h + margin)
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

/// Area of the intersection of two centered rectangles (0 when disjoint).
pub fn rectangle_overlap(a: Rect, b: Rect) -> f32 {
    let overlap_x = axis_overlap(a.x, a.w, b.x, b.w);
    let overlap_y = axis_overlap(a.y, a.h, b.y, b.h);
    overlap_x * overlap_y
}

fn axis_overlap(center_a: f32, len_a: f32, center_b: f32, len_b: f32) -> f32 {
    let lo = (center_a - len_a / 2.0).max(center_b - len_b / 2.0);
    let hi = (center_a + len_a / 2.0).min(center_b + len_b / 2.0);
    (hi - lo).max(0.0)
}

/// Orders origins by z, then y, then x.
pub fn compare_zyx(a: &Vec3, b: &Vec3) -> Ordering {
    a.z.total_cmp(&b.z)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.x.total_cmp(&b.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_of_identical_rects_is_area() {
        let r = Rect::new(10.0, 10.0, 6.0, 9.0);
        assert_eq!(rectangle_overlap(r, r), 54.0);
    }

    #[test]
    fn test_overlap_partial_and_disjoint() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 0.0, 4.0, 4.0);
        assert_eq!(rectangle_overlap(a, b), 8.0);

        let far = Rect::new(100.0, 0.0, 4.0, 4.0);
        assert_eq!(rectangle_overlap(a, far), 0.0);
    }

    #[test]
    fn test_dilate_keeps_center() {
        let r = Rect::new(1.0, 2.0, 6.0, 9.0).dilate(3.0);
        assert_eq!(r, Rect::new(1.0, 2.0, 9.0, 12.0));
    }

    #[test]
    fn test_compare_zyx_major_axis_first() {
        let low = Vec3::new(50.0, 50.0, 0.0);
        let high = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(compare_zyx(&low, &high), Ordering::Less);

        let left = Vec3::new(0.0, 5.0, 0.0);
        let right = Vec3::new(1.0, 5.0, 0.0);
        assert_eq!(compare_zyx(&left, &right), Ordering::Less);
        assert_eq!(compare_zyx(&right, &right), Ordering::Equal);
    }
}
