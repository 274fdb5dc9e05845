// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared fixtures for integration tests
//!
//! Latitude/longitude sphere patches: `theta` is the azimuth around +z and
//! `phi` the polar angle from +z, both in degrees. A polar angle of 0 or 180
//! collapses the first or last ring into a pole point.

#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use polyframe_imprint::{Cell, Mesh};

#[derive(Debug, Clone, Copy)]
pub struct SpherePatch {
    pub radius: f64,
    pub center: Point3<f64>,
    pub theta_resolution: usize,
    pub phi_resolution: usize,
    pub start_theta: f64,
    pub end_theta: f64,
    pub start_phi: f64,
    pub end_phi: f64,
    /// Emit quads between rings instead of triangle pairs
    pub quads: bool,
}

impl Default for SpherePatch {
    fn default() -> Self {
        Self {
            radius: 10.0,
            center: Point3::origin(),
            theta_resolution: 16,
            phi_resolution: 16,
            start_theta: 0.0,
            end_theta: 360.0,
            start_phi: 0.0,
            end_phi: 180.0,
            quads: false,
        }
    }
}

impl SpherePatch {
    fn point(&self, theta: f64, phi: f64) -> Point3<f64> {
        let (theta, phi) = (theta.to_radians(), phi.to_radians());
        self.center
            + Vector3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()) * self.radius
    }

    pub fn to_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new();
        let full_turn = (self.end_theta - self.start_theta).abs() >= 360.0;
        let columns = if full_turn {
            self.theta_resolution
        } else {
            self.theta_resolution + 1
        };
        let d_theta = (self.end_theta - self.start_theta) / self.theta_resolution as f64;
        let d_phi = (self.end_phi - self.start_phi) / self.phi_resolution as f64;

        let north = (self.start_phi <= 0.0).then(|| mesh.add_point(self.point(0.0, 0.0)));
        let first_ring = usize::from(north.is_some());
        let last_ring = if self.end_phi >= 180.0 {
            self.phi_resolution - 1
        } else {
            self.phi_resolution
        };

        let mut rings: Vec<Vec<usize>> = Vec::new();
        for j in first_ring..=last_ring {
            let phi = self.start_phi + d_phi * j as f64;
            let ring = (0..columns)
                .map(|i| mesh.add_point(self.point(self.start_theta + d_theta * i as f64, phi)))
                .collect();
            rings.push(ring);
        }
        let south = (self.end_phi >= 180.0).then(|| mesh.add_point(self.point(0.0, 180.0)));

        let next = |i: usize| if full_turn { (i + 1) % columns } else { i + 1 };

        if let (Some(pole), Some(ring)) = (north, rings.first()) {
            for i in 0..self.theta_resolution {
                mesh.add_cell(Cell::triangle(pole, ring[i], ring[next(i)]));
            }
        }
        for band in rings.windows(2) {
            let (upper, lower) = (&band[0], &band[1]);
            for i in 0..self.theta_resolution {
                let (a, b, c, d) = (upper[i], lower[i], lower[next(i)], upper[next(i)]);
                if self.quads {
                    mesh.add_cell(Cell::new(vec![a, b, c, d]));
                } else {
                    mesh.add_cell(Cell::triangle(a, b, c));
                    mesh.add_cell(Cell::triangle(a, c, d));
                }
            }
        }
        if let (Some(pole), Some(ring)) = (south, rings.last()) {
            for i in 0..self.theta_resolution {
                mesh.add_cell(Cell::triangle(ring[i], pole, ring[next(i)]));
            }
        }
        mesh
    }
}

/// Quarter sphere target of the reference scenario
pub fn target_sphere() -> Mesh {
    SpherePatch {
        start_theta: 0.0,
        end_theta: 90.0,
        ..SpherePatch::default()
    }
    .to_mesh()
}

/// Band patch on the same sphere, inside the target's angular range
pub fn imprint_patch() -> Mesh {
    SpherePatch {
        theta_resolution: 32,
        start_theta: 12.0,
        end_theta: 57.0,
        start_phi: 60.0,
        end_phi: 120.0,
        ..SpherePatch::default()
    }
    .to_mesh()
}

/// Same patch rotated outside the target's azimuth range
pub fn distant_patch() -> Mesh {
    SpherePatch {
        theta_resolution: 32,
        start_theta: 192.0,
        end_theta: 237.0,
        start_phi: 60.0,
        end_phi: 120.0,
        ..SpherePatch::default()
    }
    .to_mesh()
}

pub const TOLERANCE: f64 = 0.075;

/// Distance from `point` to the plane of a target cell
pub fn distance_to_cell_plane(mesh: &Mesh, cell_id: usize, point: &Point3<f64>) -> f64 {
    let normal = mesh.cell_normal(cell_id);
    let origin = mesh.points[mesh.cells[cell_id].point_ids[0]];
    (point - origin).dot(&normal.normalize()).abs()
}

/// `n` x `n` grid of unit squares in the z = 0 plane, each split along its
/// rising diagonal
pub fn flat_grid(n: usize) -> Mesh {
    let mut mesh = Mesh::new();
    for j in 0..=n {
        for i in 0..=n {
            mesh.add_point(Point3::new(i as f64, j as f64, 0.0));
        }
    }
    let row = n + 1;
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            mesh.add_cell(Cell::triangle(a, a + 1, a + row + 1));
            mesh.add_cell(Cell::triangle(a, a + row + 1, a + row));
        }
    }
    mesh
}

/// Mesh with a single polygon through `points`
pub fn polygon(points: &[[f64; 3]]) -> Mesh {
    let mut mesh = Mesh::new();
    for p in points {
        mesh.add_point(Point3::new(p[0], p[1], p[2]));
    }
    mesh.add_cell(Cell::new((0..points.len()).collect()));
    mesh
}

/// Total area of all cells
pub fn surface_area(mesh: &Mesh) -> f64 {
    (0..mesh.cell_count()).map(|id| mesh.cell_normal(id).norm() * 0.5).sum()
}

/// Smallest distance between two distinct output points
pub fn min_point_separation(mesh: &Mesh) -> f64 {
    let mut min = f64::INFINITY;
    for (i, a) in mesh.points.iter().enumerate() {
        for b in &mesh.points[i + 1..] {
            min = min.min((a - b).norm());
        }
    }
    min
}
