// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface imprint engine
//!
//! Projects the boundary (or every edge) of an imprint surface onto a target
//! surface and stitches it into the target's cells. Each call is independent:
//! the spatial index and adjacency tables are rebuilt from the inputs and
//! dropped on return.

mod assemble;
mod config;
mod error;
mod locate;
mod merge;
mod options;
mod plan;
mod result;
mod triangulate;

pub use config::ImprintConfig;
pub use error::{ImprintError, ImprintWarning, MeshRole, ToleranceWarning};
pub use locate::{Candidate, Site};
pub use options::{DebugMode, EdgeInsertion, ImprintOptions, OutputMode};
pub use result::{CellClass, CellSource, DebugOutput, ImprintOutcome, ImprintResult, ImprintStats};

use crate::geometry::{validate_mesh, Mesh, MeshTopology};
use assemble::assemble;
use locate::{EdgeTrace, Locator};
use plan::ImprintPlan;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};
use triangulate::{triangulate_cell, CellTriangulation};

/// Relative floor applied to the tolerance, as a fraction of the scene diagonal
const TOLERANCE_FLOOR: f64 = 1e-10;

/// Imprint `imprint` onto `target`
///
/// Fails before any geometric work when an input is invalid. A call whose
/// imprint never comes within `tolerance` of the target succeeds with
/// [`ImprintOutcome::NoIntersection`] and returns the target unchanged.
#[instrument(
    skip(target, imprint, options),
    fields(
        target_cells = target.cell_count(),
        imprint_cells = imprint.cell_count(),
        mode = options.output_mode.as_str()
    )
)]
pub fn imprint(
    target: &Mesh,
    imprint: &Mesh,
    tolerance: f64,
    options: &ImprintOptions,
) -> Result<ImprintResult, ImprintError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ImprintError::InvalidTolerance(tolerance));
    }
    validate_mesh(target).map_err(|reason| ImprintError::invalid_mesh(MeshRole::Target, reason))?;
    validate_mesh(imprint).map_err(|reason| ImprintError::invalid_mesh(MeshRole::Imprint, reason))?;
    if let Some(cell_id) = options.debug_mode.cell_id() {
        if cell_id >= target.cell_count() {
            return Err(ImprintError::InvalidDebugCell {
                cell_id,
                cell_count: target.cell_count(),
            });
        }
    }

    let mut warnings = Vec::new();
    if let Some(warning) = tolerance_warning(target, imprint, tolerance, options.tolerance_warning_ratio) {
        warn!(
            tolerance,
            min_edge_length = warning.min_edge_length,
            "tolerance is comparable to the mesh resolution"
        );
        warnings.push(ImprintWarning::Tolerance(warning));
    }

    let scene = target.bounding_box().union(&imprint.bounding_box());
    let effective = tolerance.max(TOLERANCE_FLOOR * scene.diagonal());

    let topology =
        MeshTopology::build(target).map_err(|reason| ImprintError::invalid_mesh(MeshRole::Target, reason))?;
    let locator = Locator::new(&topology, effective);

    let classified: Vec<Option<Candidate>> = imprint
        .points
        .par_iter()
        .map(|point| locator.classify_point(point))
        .collect();

    let edges = match options.edge_insertion {
        EdgeInsertion::Boundary => imprint.boundary_edges(),
        EdgeInsertion::All => imprint.unique_edges(),
    };
    let traces: Vec<EdgeTrace> = edges
        .par_iter()
        .map(|edge| {
            locator.trace_edge(
                *edge,
                &imprint.points[edge.v0],
                &imprint.points[edge.v1],
                classified[edge.v0],
                classified[edge.v1],
            )
        })
        .collect();

    let mut candidate_cells: Vec<usize> = traces
        .iter()
        .flat_map(|trace| trace.candidate_cells.iter().copied())
        .collect();
    candidate_cells.sort_unstable();
    candidate_cells.dedup();
    debug!(
        edges = edges.len(),
        candidate_cells = candidate_cells.len(),
        effective_tolerance = effective,
        "traced imprint edges"
    );

    let plan = ImprintPlan::build(&locator, &traces);
    debug!(
        raw_points = plan.raw.len(),
        new_points = plan.merged.new_points.len(),
        constraints = plan.constraint_segments,
        affected_cells = plan.cells.len(),
        "resolved coincident points"
    );
    for warning in &plan.warnings {
        warn!("{}", warning);
    }
    warnings.extend(plan.warnings.iter().cloned());

    let triangulations = plan
        .cells
        .par_iter()
        .map(|input| {
            triangulate_cell(
                input,
                &plan.points,
                &topology.frames[input.cell_id],
                options.delaunay_refinement,
            )
        })
        .collect::<Result<Vec<CellTriangulation>, ImprintError>>()?;

    for triangulation in &triangulations {
        for warning in &triangulation.warnings {
            warn!(cell_id = triangulation.cell_id, "{}", warning);
        }
        warnings.extend(triangulation.warnings.iter().cloned());
    }

    let debug = capture_debug(options.debug_mode, &topology, &plan, &triangulations);

    let stats = ImprintStats {
        imprint_edges: edges.len(),
        candidate_cells: candidate_cells.len(),
        raw_points: plan.raw.len(),
        inserted_points: plan.merged.new_points.len(),
        constraint_segments: plan.constraint_segments,
        ..ImprintStats::default()
    };

    if plan.raw.is_empty() {
        info!("imprint does not reach the target, returning it unchanged");
        let mut result = ImprintResult::unchanged(target);
        result.debug = debug;
        result.warnings = warnings;
        result.stats = stats;
        return Ok(result);
    }

    let assembly = assemble(
        target,
        imprint,
        plan.points,
        &triangulations,
        &classified,
        options.output_mode,
    );

    let mut result = ImprintResult {
        mesh: assembly.mesh,
        classification: assembly.classification,
        sources: assembly.sources,
        outcome: ImprintOutcome::Imprinted,
        debug,
        warnings,
        stats,
    };
    result.stats.imprinted_cells = result.count(CellClass::Imprinted);
    result.stats.new_cells = result.count(CellClass::New);
    info!(
        points = result.mesh.point_count(),
        cells = result.mesh.cell_count(),
        imprinted = result.stats.imprinted_cells,
        new = result.stats.new_cells,
        warnings = result.warnings.len(),
        "imprint complete"
    );

    Ok(result)
}

/// Warn when the tolerance reaches `ratio` times the shortest edge of either mesh
fn tolerance_warning(target: &Mesh, imprint: &Mesh, tolerance: f64, ratio: f64) -> Option<ToleranceWarning> {
    let min_edge_length = [target.min_edge_length(), imprint.min_edge_length()]
        .into_iter()
        .flatten()
        .min_by(|a, b| a.total_cmp(b))?;
    (tolerance >= ratio * min_edge_length).then_some(ToleranceWarning {
        tolerance,
        min_edge_length,
    })
}

fn capture_debug(
    mode: DebugMode,
    topology: &MeshTopology<'_>,
    plan: &ImprintPlan,
    triangulations: &[CellTriangulation],
) -> Option<DebugOutput> {
    match mode {
        DebugMode::None => None,
        DebugMode::InputPointsForCell(cell_id) => Some(DebugOutput::InputPoints {
            cell_id,
            points: plan.input_points(topology, cell_id),
        }),
        DebugMode::TriangulationForCell(cell_id) => {
            let mesh = triangulations
                .binary_search_by_key(&cell_id, |t| t.cell_id)
                .map(|index| triangulations[index].to_mesh(&plan.points))
                .unwrap_or_default();
            Some(DebugOutput::Triangulation { cell_id, mesh })
        }
    }
}
