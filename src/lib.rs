// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Imprint
//!
//! Projects the boundary of one polygonal surface onto another and stitches it
//! into the target's triangulation. The result carries a per-cell
//! classification (unmodified / imprinted / new) and an optional debug record
//! for a single target cell.

pub mod geometry;
pub mod imprint;

pub use geometry::{BoundingBox, Cell, Edge, InvalidMeshReason, Mesh};
pub use imprint::{
    imprint, CellClass, CellSource, DebugMode, DebugOutput, EdgeInsertion, ImprintConfig, ImprintError,
    ImprintOptions, ImprintOutcome, ImprintResult, ImprintStats, ImprintWarning, MeshRole, OutputMode,
    ToleranceWarning,
};

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_basic_imprint() {
        let mut target = Mesh::new();
        target.add_point(Point3::new(0.0, 0.0, 0.0));
        target.add_point(Point3::new(2.0, 0.0, 0.0));
        target.add_point(Point3::new(0.0, 2.0, 0.0));
        target.add_cell(Cell::triangle(0, 1, 2));

        let mut patch = Mesh::new();
        patch.add_point(Point3::new(0.2, 0.2, 0.0));
        patch.add_point(Point3::new(0.8, 0.2, 0.0));
        patch.add_point(Point3::new(0.2, 0.8, 0.0));
        patch.add_cell(Cell::triangle(0, 1, 2));

        let result = imprint(&target, &patch, 0.01, &ImprintOptions::default()).unwrap();
        assert_eq!(result.outcome, ImprintOutcome::Imprinted);
        assert_eq!(result.mesh.point_count(), 6);
        // Three interior points inside one triangle give 2 * 3 + 1 triangles
        assert_eq!(result.count(CellClass::Imprinted), 7);
    }
}
