// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Imprint options

use serde::{Deserialize, Serialize};

/// Which cells end up in the primary output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Full target surface with the imprint stitched in
    #[default]
    ProjectedImprint,
    /// Only the re-triangulated target cells
    ImprintedCellsOnly,
    /// Projected imprint plus imprint cells lying off the target
    MergedImprint,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::ProjectedImprint => "projected_imprint",
            OutputMode::ImprintedCellsOnly => "imprinted_cells_only",
            OutputMode::MergedImprint => "merged_imprint",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "projected_imprint" => Some(OutputMode::ProjectedImprint),
            "imprinted_cells_only" => Some(OutputMode::ImprintedCellsOnly),
            "merged_imprint" => Some(OutputMode::MergedImprint),
            _ => None,
        }
    }
}

/// Secondary diagnostic output for a single target cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "cell_id")]
pub enum DebugMode {
    #[default]
    None,
    /// Points fed to the re-triangulation of the cell
    InputPointsForCell(usize),
    /// Re-triangulation of the cell before assembly
    TriangulationForCell(usize),
}

impl DebugMode {
    pub fn cell_id(&self) -> Option<usize> {
        match self {
            DebugMode::None => None,
            DebugMode::InputPointsForCell(id) | DebugMode::TriangulationForCell(id) => Some(*id),
        }
    }
}

/// Which imprint edges are projected onto the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeInsertion {
    /// Edges used by exactly one imprint cell
    #[default]
    Boundary,
    /// Every imprint edge
    All,
}

/// Options for a single imprint call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprintOptions {
    pub output_mode: OutputMode,
    pub debug_mode: DebugMode,
    pub edge_insertion: EdgeInsertion,
    /// Warn when the tolerance reaches this fraction of the shortest edge
    pub tolerance_warning_ratio: f64,
    /// Lawson flips on re-triangulated cells
    pub delaunay_refinement: bool,
}

impl Default for ImprintOptions {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::default(),
            debug_mode: DebugMode::default(),
            edge_insertion: EdgeInsertion::default(),
            tolerance_warning_ratio: 0.5,
            delaunay_refinement: true,
        }
    }
}

impl ImprintOptions {
    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: DebugMode) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_edge_insertion(mut self, edge_insertion: EdgeInsertion) -> Self {
        self.edge_insertion = edge_insertion;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_names() {
        for mode in [
            OutputMode::ProjectedImprint,
            OutputMode::ImprintedCellsOnly,
            OutputMode::MergedImprint,
        ] {
            assert_eq!(OutputMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(OutputMode::from_str("Imprinted_Cells_Only"), Some(OutputMode::ImprintedCellsOnly));
        assert_eq!(OutputMode::from_str("cells"), None);
    }

    #[test]
    fn test_debug_cell_id() {
        assert_eq!(DebugMode::None.cell_id(), None);
        assert_eq!(DebugMode::InputPointsForCell(6).cell_id(), Some(6));
        assert_eq!(DebugMode::TriangulationForCell(2).cell_id(), Some(2));
    }
}
