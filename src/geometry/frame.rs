// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local plane frames for polygonal cells

use super::mesh::newell_normal;
use nalgebra::{Point2, Point3, Vector3};

/// Orthonormal frame on the best-fit plane of a cell
///
/// `u × v = normal`, so a cell whose loop produced the Newell normal maps to a
/// counter-clockwise polygon in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFrame {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
}

impl CellFrame {
    /// Frame through the centroid of `points`, `None` for a zero-area loop
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let normal = newell_normal(points);
        let length = normal.norm();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        let normal = normal / length;

        let centroid = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / points.len() as f64;

        // Seed the in-plane axis with the world axis least aligned to the normal
        let abs = normal.abs();
        let seed = if abs.x <= abs.y && abs.x <= abs.z {
            Vector3::x()
        } else if abs.y <= abs.z {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = (seed - normal * seed.dot(&normal)).normalize();
        let v = normal.cross(&u);

        Some(Self {
            origin: Point3::from(centroid),
            normal,
            u,
            v,
        })
    }

    /// Signed distance from the plane along the normal
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Orthogonal projection onto the plane
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// In-plane coordinates of a point
    pub fn to_local(&self, point: &Point3<f64>) -> Point2<f64> {
        let d = point - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::predicates::orient2d;

    #[test]
    fn test_frame_preserves_winding() {
        let points = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let frame = CellFrame::from_points(&points).unwrap();
        assert!((frame.normal - Vector3::z()).norm() < 1e-12);

        let local: Vec<_> = points.iter().map(|p| frame.to_local(p)).collect();
        assert!(orient2d(&local[0], &local[1], &local[2]) > 0.0);
    }

    #[test]
    fn test_projection_lands_on_plane() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        let frame = CellFrame::from_points(&points).unwrap();
        let p = Point3::new(0.3, 0.5, 0.5);
        assert!((frame.signed_distance(&p).abs() - 0.3).abs() < 1e-12);
        assert!(frame.signed_distance(&frame.project(&p)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_loop_has_no_frame() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(CellFrame::from_points(&points).is_none());
    }
}
