// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Output assembly and cell classification

use super::locate::Candidate;
use super::options::OutputMode;
use super::result::{CellClass, CellSource};
use super::triangulate::CellTriangulation;
use crate::geometry::{Cell, Mesh};
use nalgebra::Point3;

pub struct Assembly {
    pub mesh: Mesh,
    pub classification: Vec<CellClass>,
    pub sources: Vec<CellSource>,
}

impl Assembly {
    fn push(&mut self, cell: Cell, class: CellClass, source: CellSource) {
        self.mesh.add_cell(cell);
        self.classification.push(class);
        self.sources.push(source);
    }
}

/// Stitch re-triangulated cells back into the target
///
/// `triangulations` must be ascending by cell id. Target cells keep their
/// order; an affected cell is replaced in place by its triangles.
pub fn assemble(
    target: &Mesh,
    imprint: &Mesh,
    points: Vec<Point3<f64>>,
    triangulations: &[CellTriangulation],
    classified: &[Option<Candidate>],
    mode: OutputMode,
) -> Assembly {
    let mut assembly = Assembly {
        mesh: Mesh {
            points,
            cells: Vec::with_capacity(target.cell_count()),
        },
        classification: Vec::with_capacity(target.cell_count()),
        sources: Vec::with_capacity(target.cell_count()),
    };

    let mut pending = triangulations.iter().peekable();
    for (cell_id, cell) in target.cells.iter().enumerate() {
        match pending.next_if(|t| t.cell_id == cell_id) {
            Some(triangulation) => {
                for t in &triangulation.triangles {
                    assembly.push(
                        Cell::triangle(t[0], t[1], t[2]),
                        CellClass::Imprinted,
                        CellSource::Target(cell_id),
                    );
                }
            }
            None if mode != OutputMode::ImprintedCellsOnly => {
                assembly.push(cell.clone(), CellClass::Unmodified, CellSource::Target(cell_id));
            }
            None => {}
        }
    }

    match mode {
        OutputMode::ImprintedCellsOnly => {
            assembly.mesh.remove_orphaned_points();
        }
        OutputMode::MergedImprint => append_off_target(&mut assembly, imprint, classified),
        OutputMode::ProjectedImprint => {}
    }

    assembly
}

/// Imprint cells with every point off the target, appended as new geometry
fn append_off_target(assembly: &mut Assembly, imprint: &Mesh, classified: &[Option<Candidate>]) {
    let off_target: Vec<usize> = imprint
        .cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.point_ids.iter().all(|&id| classified[id].is_none()))
        .map(|(cell_id, _)| cell_id)
        .collect();

    let mut used = vec![false; imprint.point_count()];
    for &cell_id in &off_target {
        for &id in &imprint.cells[cell_id].point_ids {
            used[id] = true;
        }
    }
    let mut remap = vec![usize::MAX; imprint.point_count()];
    for id in (0..imprint.point_count()).filter(|&id| used[id]) {
        remap[id] = assembly.mesh.add_point(imprint.points[id]);
    }

    for cell_id in off_target {
        let point_ids = imprint.cells[cell_id].point_ids.iter().map(|&id| remap[id]).collect();
        assembly.push(Cell::new(point_ids), CellClass::New, CellSource::Imprint(cell_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(x0: f64) -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_point(Point3::new(x0, 0.0, 0.0));
        mesh.add_point(Point3::new(x0 + 1.0, 0.0, 0.0));
        mesh.add_point(Point3::new(x0 + 1.0, 1.0, 0.0));
        mesh.add_point(Point3::new(x0, 1.0, 0.0));
        mesh.add_cell(Cell::triangle(0, 1, 2));
        mesh.add_cell(Cell::triangle(0, 2, 3));
        mesh
    }

    fn split_first_cell() -> CellTriangulation {
        CellTriangulation {
            cell_id: 0,
            point_ids: vec![0, 1, 2, 4],
            triangles: vec![[0, 1, 4], [1, 2, 4], [2, 0, 4]],
            warnings: Vec::new(),
        }
    }

    fn points_with_centroid(target: &Mesh) -> Vec<Point3<f64>> {
        let mut points = target.points.clone();
        points.push(Point3::new(0.66, 0.33, 0.0));
        points
    }

    #[test]
    fn test_replace_in_place() {
        let target = strip(0.0);
        let imprint = strip(5.0);
        let classified = vec![None; 4];
        let assembly = assemble(
            &target,
            &imprint,
            points_with_centroid(&target),
            &[split_first_cell()],
            &classified,
            OutputMode::ProjectedImprint,
        );

        assert_eq!(assembly.mesh.cell_count(), 4);
        assert_eq!(
            assembly.classification,
            vec![CellClass::Imprinted, CellClass::Imprinted, CellClass::Imprinted, CellClass::Unmodified]
        );
        assert_eq!(assembly.sources[3], CellSource::Target(1));
        assert_eq!(assembly.mesh.cells[3], target.cells[1]);
    }

    #[test]
    fn test_imprinted_cells_only_compacts() {
        let target = strip(0.0);
        let imprint = strip(5.0);
        let assembly = assemble(
            &target,
            &imprint,
            points_with_centroid(&target),
            &[split_first_cell()],
            &[None; 4],
            OutputMode::ImprintedCellsOnly,
        );

        assert_eq!(assembly.mesh.cell_count(), 3);
        // Point 3 only belonged to the untouched cell
        assert_eq!(assembly.mesh.point_count(), 4);
        assert!(assembly.classification.iter().all(|c| *c == CellClass::Imprinted));
    }

    #[test]
    fn test_point_left_out_of_triangulation() {
        let target = strip(0.0);
        let imprint = strip(5.0);
        let mut points = target.points.clone();
        points.push(Point3::new(0.5, 0.0, 0.0));
        let unsplit = CellTriangulation {
            cell_id: 0,
            point_ids: vec![0, 1, 2, 4],
            triangles: vec![[0, 1, 2]],
            warnings: Vec::new(),
        };

        let projected = assemble(
            &target,
            &imprint,
            points.clone(),
            std::slice::from_ref(&unsplit),
            &[None; 4],
            OutputMode::ProjectedImprint,
        );
        assert_eq!(projected.mesh.point_count(), 5);
        assert!(projected.mesh.cells.iter().all(|cell| !cell.point_ids.contains(&4)));

        let compacted = assemble(
            &target,
            &imprint,
            points,
            std::slice::from_ref(&unsplit),
            &[None; 4],
            OutputMode::ImprintedCellsOnly,
        );
        assert_eq!(compacted.mesh.point_count(), 3);
        assert_eq!(compacted.mesh.cells, vec![Cell::triangle(0, 1, 2)]);
    }

    #[test]
    fn test_merged_imprint_appends_off_target_cells() {
        let target = strip(0.0);
        let imprint = strip(5.0);
        let assembly = assemble(
            &target,
            &imprint,
            target.points.clone(),
            &[],
            &[None; 4],
            OutputMode::MergedImprint,
        );

        assert_eq!(assembly.mesh.cell_count(), 4);
        assert_eq!(assembly.mesh.point_count(), 8);
        assert_eq!(assembly.classification[2], CellClass::New);
        assert_eq!(assembly.sources[3], CellSource::Imprint(1));
        assert_eq!(assembly.mesh.cells[2], Cell::triangle(4, 5, 6));
    }
}
