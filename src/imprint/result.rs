// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Imprint result types

use super::error::ImprintWarning;
use crate::geometry::Mesh;
use nalgebra::Point3;
use serde::Serialize;

/// Per-cell classification of the output mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CellClass {
    /// Target cell copied unchanged
    Unmodified = 0,
    /// Triangle replacing a target cell touched by the imprint
    Imprinted = 1,
    /// Geometry contributed by the imprint surface
    New = 2,
}

impl CellClass {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// Input cell an output cell was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellSource {
    Target(usize),
    Imprint(usize),
}

/// Whether the imprint reached the target at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImprintOutcome {
    Imprinted,
    /// Nothing within tolerance; the output is the target unchanged
    NoIntersection,
}

/// Diagnostic geometry for one target cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DebugOutput {
    InputPoints { cell_id: usize, points: Vec<Point3<f64>> },
    Triangulation { cell_id: usize, mesh: Mesh },
}

impl DebugOutput {
    pub fn cell_id(&self) -> usize {
        match self {
            DebugOutput::InputPoints { cell_id, .. } | DebugOutput::Triangulation { cell_id, .. } => *cell_id,
        }
    }
}

/// Stage counters, mostly for logging and benchmarks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImprintStats {
    pub imprint_edges: usize,
    pub candidate_cells: usize,
    pub raw_points: usize,
    pub inserted_points: usize,
    pub constraint_segments: usize,
    pub imprinted_cells: usize,
    pub new_cells: usize,
}

/// Output of an imprint call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprintResult {
    pub mesh: Mesh,
    #[serde(rename = "ImprintedCells")]
    pub classification: Vec<CellClass>,
    pub sources: Vec<CellSource>,
    pub outcome: ImprintOutcome,
    pub debug: Option<DebugOutput>,
    pub warnings: Vec<ImprintWarning>,
    pub stats: ImprintStats,
}

impl ImprintResult {
    /// Name under which the classification is exposed to mesh sinks
    pub const CLASSIFICATION_FIELD: &'static str = "ImprintedCells";

    /// The target returned unchanged with every cell unmodified
    pub(crate) fn unchanged(target: &Mesh) -> Self {
        Self {
            mesh: target.clone(),
            classification: vec![CellClass::Unmodified; target.cell_count()],
            sources: (0..target.cell_count()).map(CellSource::Target).collect(),
            outcome: ImprintOutcome::NoIntersection,
            debug: None,
            warnings: Vec::new(),
            stats: ImprintStats::default(),
        }
    }

    pub fn is_no_intersection(&self) -> bool {
        self.outcome == ImprintOutcome::NoIntersection
    }

    /// Classification codes (0, 1, 2), one per output cell
    pub fn cell_scalars(&self) -> Vec<u8> {
        self.classification.iter().map(CellClass::code).collect()
    }

    /// Number of output cells with the given class
    pub fn count(&self, class: CellClass) -> usize {
        self.classification.iter().filter(|&&c| c == class).count()
    }
}
