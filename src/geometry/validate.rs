// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation
//! Structural and degeneracy checks that need no tolerance

use super::Mesh;
use super::mesh::newell_normal;
use nalgebra::{Point2, Point3};
use serde::Serialize;
use thiserror::Error;

/// Why a mesh was rejected
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum InvalidMeshReason {
    #[error("mesh has no cells")]
    NoCells,

    #[error("cell {cell_id} has {count} points, at least 3 are required")]
    TooFewPoints { cell_id: usize, count: usize },

    #[error("cell {cell_id} references point {point_id}, but the mesh has {point_count} points")]
    PointOutOfRange {
        cell_id: usize,
        point_id: usize,
        point_count: usize,
    },

    #[error("cell {cell_id} uses point {point_id} more than once")]
    RepeatedPoint { cell_id: usize, point_id: usize },

    #[error("point {point_id} has a non-finite coordinate")]
    NonFinitePoint { point_id: usize },

    #[error("cell {cell_id} has zero area")]
    ZeroArea { cell_id: usize },

    #[error("cell {cell_id} is self-intersecting")]
    SelfIntersecting { cell_id: usize },
}

/// Check a mesh for structural errors and degenerate cells
pub fn validate_mesh(mesh: &Mesh) -> Result<(), InvalidMeshReason> {
    if mesh.cells.is_empty() {
        return Err(InvalidMeshReason::NoCells);
    }

    if let Some(point_id) = mesh
        .points
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
        return Err(InvalidMeshReason::NonFinitePoint { point_id });
    }

    for (cell_id, cell) in mesh.cells.iter().enumerate() {
        if cell.len() < 3 {
            return Err(InvalidMeshReason::TooFewPoints {
                cell_id,
                count: cell.len(),
            });
        }

        for (i, &point_id) in cell.point_ids.iter().enumerate() {
            if point_id >= mesh.points.len() {
                return Err(InvalidMeshReason::PointOutOfRange {
                    cell_id,
                    point_id,
                    point_count: mesh.points.len(),
                });
            }
            if cell.point_ids[..i].contains(&point_id) {
                return Err(InvalidMeshReason::RepeatedPoint { cell_id, point_id });
            }
        }

        let points = mesh.cell_points(cell_id);
        let normal = newell_normal(&points);
        if normal.norm_squared() == 0.0 {
            return Err(InvalidMeshReason::ZeroArea { cell_id });
        }

        if points.len() > 3 && is_self_intersecting(&points, &normal) {
            return Err(InvalidMeshReason::SelfIntersecting { cell_id });
        }
    }

    Ok(())
}

/// Test non-adjacent edges for proper crossings in the dominant projection plane
fn is_self_intersecting(points: &[Point3<f64>], normal: &nalgebra::Vector3<f64>) -> bool {
    let abs_normal = normal.abs();
    let drop_axis = if abs_normal.x >= abs_normal.y && abs_normal.x >= abs_normal.z {
        0
    } else if abs_normal.y >= abs_normal.z {
        1
    } else {
        2
    };

    let flat: Vec<Point2<f64>> = points
        .iter()
        .map(|p| match drop_axis {
            0 => Point2::new(p.y, p.z),
            1 => Point2::new(p.z, p.x),
            _ => Point2::new(p.x, p.y),
        })
        .collect();

    let n = flat.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // Edges i and j share a vertex when they wrap around the loop
            if i == 0 && j == n - 1 {
                continue;
            }
            let crosses = super::predicates::segments_cross_2d(
                &flat[i],
                &flat[(i + 1) % n],
                &flat[j],
                &flat[(j + 1) % n],
                0.0,
            );
            if crosses {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Cell;

    fn unit_square() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_point(Point3::new(0.0, 0.0, 0.0));
        mesh.add_point(Point3::new(1.0, 0.0, 0.0));
        mesh.add_point(Point3::new(1.0, 1.0, 0.0));
        mesh.add_point(Point3::new(0.0, 1.0, 0.0));
        mesh.add_cell(Cell::new(vec![0, 1, 2, 3]));
        mesh
    }

    #[test]
    fn test_valid_quad() {
        assert_eq!(validate_mesh(&unit_square()), Ok(()));
    }

    #[test]
    fn test_bow_tie_is_self_intersecting() {
        let mut mesh = Mesh::new();
        mesh.add_point(Point3::new(0.0, 0.0, 0.0));
        mesh.add_point(Point3::new(2.0, 0.0, 0.0));
        mesh.add_point(Point3::new(0.0, 1.0, 0.0));
        mesh.add_point(Point3::new(1.0, 1.0, 0.0));
        mesh.add_cell(Cell::new(vec![0, 1, 2, 3]));
        assert_eq!(
            validate_mesh(&mesh),
            Err(InvalidMeshReason::SelfIntersecting { cell_id: 0 })
        );
    }

    #[test]
    fn test_non_finite_point() {
        let mut mesh = unit_square();
        mesh.points[2].y = f64::NAN;
        assert_eq!(validate_mesh(&mesh), Err(InvalidMeshReason::NonFinitePoint { point_id: 2 }));

        mesh.points[2].y = 1.0;
        mesh.points[1].z = f64::INFINITY;
        assert_eq!(validate_mesh(&mesh), Err(InvalidMeshReason::NonFinitePoint { point_id: 1 }));
    }

    #[test]
    fn test_empty_mesh() {
        assert_eq!(validate_mesh(&Mesh::new()), Err(InvalidMeshReason::NoCells));
    }

    #[test]
    fn test_structural_errors() {
        let mut mesh = unit_square();
        mesh.add_cell(Cell::new(vec![0, 1]));
        assert_eq!(
            validate_mesh(&mesh),
            Err(InvalidMeshReason::TooFewPoints { cell_id: 1, count: 2 })
        );

        let mut mesh = unit_square();
        mesh.add_cell(Cell::triangle(0, 1, 9));
        assert!(matches!(
            validate_mesh(&mesh),
            Err(InvalidMeshReason::PointOutOfRange { point_id: 9, .. })
        ));

        let mut mesh = unit_square();
        mesh.add_cell(Cell::triangle(0, 1, 0));
        assert_eq!(
            validate_mesh(&mesh),
            Err(InvalidMeshReason::RepeatedPoint { cell_id: 1, point_id: 0 })
        );
    }

    #[test]
    fn test_collinear_triangle_has_zero_area() {
        let mut mesh = Mesh::new();
        mesh.add_point(Point3::new(0.0, 0.0, 0.0));
        mesh.add_point(Point3::new(1.0, 1.0, 1.0));
        mesh.add_point(Point3::new(2.0, 2.0, 2.0));
        mesh.add_cell(Cell::triangle(0, 1, 2));
        assert_eq!(validate_mesh(&mesh), Err(InvalidMeshReason::ZeroArea { cell_id: 0 }));
    }
}
