// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-call adjacency and spatial index over a mesh

use super::{BoundingBox, Bvh, CellFrame, Edge, InvalidMeshReason, Mesh};
use ahash::AHashMap;
use nalgebra::Point2;
use rayon::prelude::*;

/// Cell adjacency, plane frames and a BVH for one mesh
///
/// Built once per imprint call and dropped with it.
pub struct MeshTopology<'a> {
    pub mesh: &'a Mesh,
    pub frames: Vec<CellFrame>,
    pub cell_boxes: Vec<BoundingBox>,
    pub bvh: Bvh,
    edge_cells: AHashMap<Edge, Vec<usize>>,
    vertex_cells: Vec<Vec<usize>>,
}

impl<'a> MeshTopology<'a> {
    /// Build the topology; fails on the first cell without a plane
    pub fn build(mesh: &'a Mesh) -> Result<Self, InvalidMeshReason> {
        let frames = (0..mesh.cell_count())
            .into_par_iter()
            .map(|cell_id| {
                CellFrame::from_points(&mesh.cell_points(cell_id)).ok_or(InvalidMeshReason::ZeroArea { cell_id })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cell_boxes: Vec<BoundingBox> = (0..mesh.cell_count())
            .into_par_iter()
            .map(|cell_id| mesh.cell_bounding_box(cell_id))
            .collect();
        let bvh = Bvh::build(&cell_boxes);

        let mut edge_cells: AHashMap<Edge, Vec<usize>> = AHashMap::new();
        let mut vertex_cells: Vec<Vec<usize>> = vec![Vec::new(); mesh.point_count()];
        for (cell_id, cell) in mesh.cells.iter().enumerate() {
            for edge in cell.edges() {
                let cells = edge_cells.entry(edge).or_default();
                if cells.last() != Some(&cell_id) {
                    cells.push(cell_id);
                }
            }
            for &point_id in &cell.point_ids {
                let cells = &mut vertex_cells[point_id];
                if cells.last() != Some(&cell_id) {
                    cells.push(cell_id);
                }
            }
        }

        Ok(Self {
            mesh,
            frames,
            cell_boxes,
            bvh,
            edge_cells,
            vertex_cells,
        })
    }

    /// Cells using an edge, ascending
    pub fn cells_of_edge(&self, edge: &Edge) -> &[usize] {
        self.edge_cells.get(edge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cells using a point, ascending
    pub fn cells_of_vertex(&self, point_id: usize) -> &[usize] {
        &self.vertex_cells[point_id]
    }

    /// Cell loop in the cell's local plane coordinates
    pub fn local_polygon(&self, cell_id: usize) -> Vec<Point2<f64>> {
        let frame = &self.frames[cell_id];
        self.mesh.cells[cell_id]
            .point_ids
            .iter()
            .map(|&id| frame.to_local(&self.mesh.points[id]))
            .collect()
    }

    /// Whether `edge` is one of the boundary edges of `cell_id`
    pub fn cell_has_edge(&self, cell_id: usize, edge: &Edge) -> bool {
        self.cells_of_edge(edge).binary_search(&cell_id).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Cell;
    use nalgebra::Point3;

    #[test]
    fn test_adjacency() {
        let mut mesh = Mesh::new();
        mesh.add_point(Point3::new(0.0, 0.0, 0.0));
        mesh.add_point(Point3::new(1.0, 0.0, 0.0));
        mesh.add_point(Point3::new(1.0, 1.0, 0.0));
        mesh.add_point(Point3::new(0.0, 1.0, 0.0));
        mesh.add_cell(Cell::triangle(0, 1, 2));
        mesh.add_cell(Cell::triangle(0, 2, 3));

        let topology = MeshTopology::build(&mesh).unwrap();
        assert_eq!(topology.cells_of_edge(&Edge::new(2, 0)), &[0, 1]);
        assert_eq!(topology.cells_of_edge(&Edge::new(0, 1)), &[0]);
        assert!(topology.cells_of_edge(&Edge::new(1, 3)).is_empty());
        assert_eq!(topology.cells_of_vertex(2), &[0, 1]);
        assert!(topology.cell_has_edge(1, &Edge::new(2, 3)));
        assert_eq!(topology.bvh.len(), 2);
    }
}
