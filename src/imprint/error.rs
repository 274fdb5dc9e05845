// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Imprint failures and warnings

use crate::geometry::InvalidMeshReason;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which input a validation failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeshRole {
    Target,
    Imprint,
}

impl fmt::Display for MeshRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshRole::Target => write!(f, "target"),
            MeshRole::Imprint => write!(f, "imprint"),
        }
    }
}

/// Fatal imprint failures; no output mesh is produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImprintError {
    #[error("invalid {role} mesh: {reason}")]
    InvalidMesh {
        role: MeshRole,
        reason: InvalidMeshReason,
    },

    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("debug cell {cell_id} is out of range for a target with {cell_count} cells")]
    InvalidDebugCell { cell_id: usize, cell_count: usize },

    #[error("re-triangulation of target cell {cell_id} failed: {reason}")]
    Triangulation { cell_id: usize, reason: String },
}

impl ImprintError {
    pub fn invalid_mesh(role: MeshRole, reason: InvalidMeshReason) -> Self {
        ImprintError::InvalidMesh { role, reason }
    }
}

/// Tolerance comparable to the mesh resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToleranceWarning {
    pub tolerance: f64,
    pub min_edge_length: f64,
}

/// Non-fatal concerns attached to an imprint result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImprintWarning {
    /// Tolerance may merge distinct geometry
    Tolerance(ToleranceWarning),
    /// An imprint segment could not be forced into the cell triangulation
    ConstraintNotRecovered { cell_id: usize, from: usize, to: usize },
    /// A projected point could not be located inside its cell
    PointNotInserted { cell_id: usize, point_id: usize },
    /// A welded imprint segment crosses no target cell and was left out
    SegmentDropped { from: usize, to: usize },
}

impl fmt::Display for ImprintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImprintWarning::Tolerance(w) => write!(
                f,
                "tolerance {} is comparable to the shortest edge length {}",
                w.tolerance, w.min_edge_length
            ),
            ImprintWarning::ConstraintNotRecovered { cell_id, from, to } => write!(
                f,
                "segment {}-{} could not be inserted into target cell {}",
                from, to, cell_id
            ),
            ImprintWarning::PointNotInserted { cell_id, point_id } => {
                write!(f, "point {} could not be inserted into target cell {}", point_id, cell_id)
            }
            ImprintWarning::SegmentDropped { from, to } => {
                write!(f, "segment {}-{} shares no target cell and was dropped", from, to)
            }
        }
    }
}
