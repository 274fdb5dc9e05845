// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygonal mesh representation and utilities

use super::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Undirected edge between two point indices
///
/// The smaller index is always stored first so that the two half-edges of a
/// shared edge hash and compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

/// Polygonal cell defined by an ordered loop of point indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub point_ids: Vec<usize>,
}

impl Cell {
    pub fn new(point_ids: Vec<usize>) -> Self {
        Self { point_ids }
    }

    pub fn triangle(a: usize, b: usize, c: usize) -> Self {
        Self {
            point_ids: vec![a, b, c],
        }
    }

    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }

    /// Directed boundary edges in loop order
    pub fn directed_edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.point_ids.len();
        (0..n).map(move |i| (self.point_ids[i], self.point_ids[(i + 1) % n]))
    }

    /// Undirected boundary edges in loop order
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.directed_edges().map(|(a, b)| Edge::new(a, b))
    }
}

/// Polygonal surface mesh
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub points: Vec<Point3<f64>>,
    pub cells: Vec<Cell>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(point_count: usize, cell_count: usize) -> Self {
        Self {
            points: Vec::with_capacity(point_count),
            cells: Vec::with_capacity(cell_count),
        }
    }

    /// Add a point and return its index
    pub fn add_point(&mut self, point: Point3<f64>) -> usize {
        let index = self.points.len();
        self.points.push(point);
        index
    }

    /// Add a cell and return its index
    pub fn add_cell(&mut self, cell: Cell) -> usize {
        let index = self.cells.len();
        self.cells.push(cell);
        index
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Compute bounding box of all points
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Bounding box of a single cell
    pub fn cell_bounding_box(&self, cell_id: usize) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for &id in &self.cells[cell_id].point_ids {
            bbox.expand_to_include(&self.points[id]);
        }
        bbox
    }

    /// Positions of a cell's points in loop order
    pub fn cell_points(&self, cell_id: usize) -> Vec<Point3<f64>> {
        self.cells[cell_id]
            .point_ids
            .iter()
            .map(|&id| self.points[id])
            .collect()
    }

    /// Unnormalized Newell normal of a cell; its length is twice the area
    pub fn cell_normal(&self, cell_id: usize) -> Vector3<f64> {
        newell_normal(&self.cell_points(cell_id))
    }

    /// Count how many cells use each undirected edge
    pub fn edge_use_counts(&self) -> AHashMap<Edge, u32> {
        let mut counts: AHashMap<Edge, u32> = AHashMap::new();
        for cell in &self.cells {
            for edge in cell.edges() {
                *counts.entry(edge).or_insert(0) += 1;
            }
        }
        counts
    }

    /// All distinct edges, sorted
    pub fn unique_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edge_use_counts().into_keys().collect();
        edges.sort_unstable();
        edges
    }

    /// Edges used by exactly one cell, sorted
    pub fn boundary_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edge_use_counts()
            .into_iter()
            .filter(|&(_, count)| count == 1)
            .map(|(edge, _)| edge)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Shortest non-zero edge length, if any edge has a length
    pub fn min_edge_length(&self) -> Option<f64> {
        self.cells
            .iter()
            .flat_map(|cell| cell.directed_edges())
            .map(|(a, b)| (self.points[b] - self.points[a]).norm())
            .filter(|length| *length > 0.0)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Remove orphaned points (points not referenced by any cell)
    /// Returns the number of points removed
    pub fn remove_orphaned_points(&mut self) -> usize {
        let mut used = vec![false; self.points.len()];
        for cell in &self.cells {
            for &id in &cell.point_ids {
                used[id] = true;
            }
        }

        // Build remapping: old_index -> new_index
        let mut new_indices = vec![0; self.points.len()];
        let mut new_points = Vec::with_capacity(self.points.len());
        for (old_idx, &is_used) in used.iter().enumerate() {
            if is_used {
                new_indices[old_idx] = new_points.len();
                new_points.push(self.points[old_idx]);
            }
        }

        for cell in &mut self.cells {
            for id in &mut cell.point_ids {
                *id = new_indices[*id];
            }
        }

        let removed = self.points.len() - new_points.len();
        self.points = new_points;
        removed
    }
}

/// Newell's method: robust polygon normal, length equal to twice the area
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}
