// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-cell stitching plan
//!
//! Turns edge traces into welded output points and, for every target cell the
//! imprint touches, the boundary ring, interior points and constraint segments
//! to re-triangulate. Welded segments whose endpoints share no cell are traced
//! again between their welded positions and split where they cross the target.

use super::error::ImprintWarning;
use super::locate::{Candidate, EdgeTrace, Locator, Site};
use super::merge::{MergedPoints, PointMerger};
use super::triangulate::CellInput;
use crate::geometry::predicates::{distance_to_polygon_boundary, point_in_polygon};
use crate::geometry::{Edge, MeshTopology};
use ahash::AHashSet;
use nalgebra::{center, Point3};
use tracing::debug;

/// Upper bound on re-tracing passes over segments without a shared cell
const MAX_RETRACE_ROUNDS: usize = 8;

#[derive(Debug, Default)]
struct CellAccum {
    touched: bool,
    edge_points: Vec<(Edge, usize)>,
    interior: Vec<usize>,
    constraints: Vec<(usize, usize)>,
}

/// Everything the re-triangulation and assembly stages need
#[derive(Debug, Clone)]
pub struct ImprintPlan {
    /// Target points followed by canonical new points
    pub points: Vec<Point3<f64>>,
    /// Touched cells, ascending by cell id
    pub cells: Vec<CellInput>,
    /// Candidates before welding, in trace order
    pub raw: Vec<Candidate>,
    pub merged: MergedPoints,
    pub constraint_segments: usize,
    /// Segments that could not be placed in any target cell
    pub warnings: Vec<ImprintWarning>,
}

impl ImprintPlan {
    pub fn build(locator: &Locator<'_, '_>, traces: &[EdgeTrace]) -> Self {
        let topology = locator.topology();
        let mesh = topology.mesh;
        let merger = PointMerger::new(topology, locator.tolerance());

        let mut raw = Vec::new();
        let mut chains: Vec<Vec<Option<usize>>> = Vec::with_capacity(traces.len());
        for trace in traces {
            let chain = trace
                .events
                .iter()
                .map(|event| {
                    event.candidate.map(|candidate| {
                        raw.push(candidate);
                        raw.len() - 1
                    })
                })
                .collect();
            chains.push(chain);
        }

        let mut retraced: AHashSet<[u64; 6]> = AHashSet::new();
        let mut rounds = 0;
        let (merged, points) = loop {
            let merged = merger.merge(&raw);
            let mut points = mesh.points.clone();
            points.extend(merged.new_points.iter().map(|c| c.position));
            if rounds == MAX_RETRACE_ROUNDS {
                break (merged, points);
            }
            rounds += 1;

            let mut grew = false;
            for chain in &mut chains {
                let mut extended = Vec::with_capacity(chain.len());
                for (k, &entry) in chain.iter().enumerate() {
                    extended.push(entry);
                    let (Some(i), Some(Some(j))) = (entry, chain.get(k + 1).copied()) else {
                        continue;
                    };
                    let (a, b) = (merged.point_ids[i], merged.point_ids[j]);
                    if a == b
                        || !matches!(assign_segment(topology, &merged, &points, a, b), Assignment::Unassigned)
                        || !retraced.insert(segment_key(&points[a], &points[b]))
                    {
                        continue;
                    }
                    for candidate in locator.trace_segment(&points[a], &points[b]) {
                        raw.push(candidate);
                        extended.push(Some(raw.len() - 1));
                        grew = true;
                    }
                }
                *chain = extended;
            }
            if !grew {
                break (merged, points);
            }
        };
        if rounds > 1 {
            debug!(rounds, raw_points = raw.len(), "re-traced segments without a shared cell");
        }

        let mut accum: Vec<CellAccum> = (0..mesh.cell_count()).map(|_| CellAccum::default()).collect();
        for candidate in &raw {
            for cell_id in cells_of_site(topology, candidate.site) {
                accum[cell_id].touched = true;
            }
        }
        for (offset, candidate) in merged.new_points.iter().enumerate() {
            let point_id = merged.base + offset;
            match candidate.site {
                Site::Edge(edge) => {
                    for &cell_id in topology.cells_of_edge(&edge) {
                        accum[cell_id].edge_points.push((edge, point_id));
                    }
                }
                Site::Interior(cell_id) => accum[cell_id].interior.push(point_id),
                Site::Vertex(_) => {}
            }
        }

        let mut segments: Vec<(usize, usize)> = Vec::new();
        for chain in &chains {
            let ids: Vec<Option<usize>> = chain
                .iter()
                .map(|raw_index| raw_index.map(|i| merged.point_ids[i]))
                .collect();
            for pair in ids.windows(2) {
                if let (Some(a), Some(b)) = (pair[0], pair[1]) {
                    if a != b {
                        segments.push(if a < b { (a, b) } else { (b, a) });
                    }
                }
            }
        }
        segments.sort_unstable();
        segments.dedup();

        let mut constraint_segments = 0;
        let mut warnings = Vec::new();
        for &(a, b) in &segments {
            match assign_segment(topology, &merged, &points, a, b) {
                Assignment::Cell(cell_id) => {
                    accum[cell_id].constraints.push((a, b));
                    constraint_segments += 1;
                }
                Assignment::Boundary => {}
                Assignment::Unassigned => warnings.push(ImprintWarning::SegmentDropped { from: a, to: b }),
            }
        }

        let cells = accum
            .into_iter()
            .enumerate()
            .filter(|(_, acc)| acc.touched)
            .map(|(cell_id, acc)| cell_input(topology, &points, cell_id, acc))
            .collect();

        Self {
            points,
            cells,
            raw,
            merged,
            constraint_segments,
            warnings,
        }
    }

    /// Cell vertices plus every raw candidate incident to the cell
    pub fn input_points(&self, topology: &MeshTopology<'_>, cell_id: usize) -> Vec<Point3<f64>> {
        let cell = &topology.mesh.cells[cell_id];
        let mut points = topology.mesh.cell_points(cell_id);
        points.extend(
            self.raw
                .iter()
                .filter(|candidate| match candidate.site {
                    Site::Vertex(point_id) => cell.point_ids.contains(&point_id),
                    Site::Edge(edge) => topology.cell_has_edge(cell_id, &edge),
                    Site::Interior(id) => id == cell_id,
                })
                .map(|candidate| candidate.position),
        );
        points
    }

    #[cfg(test)]
    pub fn cell(&self, cell_id: usize) -> Option<&CellInput> {
        self.cells
            .binary_search_by_key(&cell_id, |input| input.cell_id)
            .ok()
            .map(|index| &self.cells[index])
    }
}

/// Direction-free identity of a segment by its endpoint coordinates
fn segment_key(a: &Point3<f64>, b: &Point3<f64>) -> [u64; 6] {
    let bits = |p: &Point3<f64>| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
    let (first, second) = if bits(a) <= bits(b) { (bits(a), bits(b)) } else { (bits(b), bits(a)) };
    [first[0], first[1], first[2], second[0], second[1], second[2]]
}

enum Assignment {
    Cell(usize),
    Boundary,
    Unassigned,
}

fn cells_of_site(topology: &MeshTopology<'_>, site: Site) -> Vec<usize> {
    match site {
        Site::Vertex(point_id) => topology.cells_of_vertex(point_id).to_vec(),
        Site::Edge(edge) => topology.cells_of_edge(&edge).to_vec(),
        Site::Interior(cell_id) => vec![cell_id],
    }
}

/// Pick the target cell whose interior holds the segment midpoint
fn assign_segment(
    topology: &MeshTopology<'_>,
    merged: &MergedPoints,
    points: &[Point3<f64>],
    a: usize,
    b: usize,
) -> Assignment {
    let cells_b = cells_of_site(topology, merged.site(b));
    let shared: Vec<usize> = cells_of_site(topology, merged.site(a))
        .into_iter()
        .filter(|cell_id| cells_b.binary_search(cell_id).is_ok())
        .collect();

    let midpoint = center(&points[a], &points[b]);
    for cell_id in shared {
        let frame = &topology.frames[cell_id];
        let local = frame.to_local(&midpoint);
        let polygon = topology.local_polygon(cell_id);
        let eps = 1e-9 * topology.cell_boxes[cell_id].diagonal();
        if distance_to_polygon_boundary(&local, &polygon) <= eps {
            return Assignment::Boundary;
        }
        if point_in_polygon(&local, &polygon) {
            return Assignment::Cell(cell_id);
        }
    }
    Assignment::Unassigned
}

fn cell_input(topology: &MeshTopology<'_>, points: &[Point3<f64>], cell_id: usize, acc: CellAccum) -> CellInput {
    let cell = &topology.mesh.cells[cell_id];
    let mut ring = Vec::with_capacity(cell.len() + acc.edge_points.len());
    for (v0, v1) in cell.directed_edges() {
        ring.push(v0);
        let edge = Edge::new(v0, v1);
        let start = points[v0];
        let direction = points[v1] - start;
        let mut on_edge: Vec<(f64, usize)> = acc
            .edge_points
            .iter()
            .filter(|(e, _)| *e == edge)
            .map(|&(_, id)| ((points[id] - start).dot(&direction), id))
            .collect();
        on_edge.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
        on_edge.dedup_by_key(|entry| entry.1);
        ring.extend(on_edge.into_iter().map(|(_, id)| id));
    }

    let mut interior = acc.interior;
    interior.sort_unstable();
    interior.dedup();

    let mut constraints = acc.constraints;
    constraints.sort_unstable();
    constraints.dedup();

    CellInput {
        cell_id,
        ring,
        interior,
        constraints,
    }
}
