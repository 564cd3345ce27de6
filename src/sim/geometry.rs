//! Axis-aligned bounding boxes
//!
//! Every collision test in the simulation is either a box overlap or a
//! center-to-center distance check. There is no rotated geometry.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size.abs() * 0.5,
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            center: min + half,
            half,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    /// Boxes overlap with positive area; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    /// Point inside or on the boundary
    pub fn contains_point(&self, p: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Whole box inside `outer` (boundary inclusive)
    pub fn is_inside(&self, outer: &Aabb) -> bool {
        outer.contains_point(self.min()) && outer.contains_point(self.max())
    }

    /// Overlap depth per axis; both components positive when overlapping
    pub fn penetration(&self, other: &Aabb) -> Vec2 {
        (self.half + other.half) - (self.center - other.center).abs()
    }

    /// Move the box the least distance needed to sit inside `bounds`.
    ///
    /// On an axis where the box is larger than the bounds it is centered.
    pub fn clamped_into(&self, bounds: &Aabb) -> Aabb {
        let clamp_axis = |c: f32, h: f32, bc: f32, bh: f32| {
            if h >= bh {
                bc
            } else {
                c.clamp(bc - bh + h, bc + bh - h)
            }
        };
        Aabb {
            center: Vec2::new(
                clamp_axis(self.center.x, self.half.x, bounds.center.x, bounds.half.x),
                clamp_axis(self.center.y, self.half.y, bounds.center.y, bounds.half.y),
            ),
            half: self.half,
        }
    }
}
