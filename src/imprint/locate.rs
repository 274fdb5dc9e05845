// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Candidate localization and boundary projection
//!
//! Imprint points are snapped to the nearest target feature within tolerance
//! (vertex before edge before cell interior). Each imprint edge is traced across
//! the target, recording the target vertices and edges it passes within
//! tolerance, ordered by the parameter along the imprint edge.

use crate::geometry::predicates::{closest_point_on_segment, point_in_polygon, segment_segment_closest};
use crate::geometry::{BoundingBox, Edge, MeshTopology};
use nalgebra::Point3;
use std::cmp::Ordering;

/// Target feature a projected point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Site {
    Vertex(usize),
    Edge(Edge),
    Interior(usize),
}

impl Site {
    /// Merge priority; lower ranks become canonical first
    pub fn rank(&self) -> u8 {
        match self {
            Site::Vertex(_) => 0,
            Site::Edge(_) => 1,
            Site::Interior(_) => 2,
        }
    }
}

/// A point projected onto the target surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub position: Point3<f64>,
    pub site: Site,
}

/// One stop along an imprint edge; `None` where the edge is off the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceEvent {
    pub t: f64,
    pub candidate: Option<Candidate>,
}

/// Events along one imprint edge, ordered by edge parameter
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeTrace {
    pub edge: Edge,
    pub events: Vec<TraceEvent>,
    pub candidate_cells: Vec<usize>,
}

/// Projects imprint geometry onto the target mesh
pub struct Locator<'t, 'm> {
    topology: &'t MeshTopology<'m>,
    tolerance: f64,
}

impl<'t, 'm> Locator<'t, 'm> {
    pub fn new(topology: &'t MeshTopology<'m>, tolerance: f64) -> Self {
        Self { topology, tolerance }
    }

    fn candidate_cells(&self, bbox: &BoundingBox) -> Vec<usize> {
        self.topology.bvh.query(&bbox.expanded(self.tolerance))
    }

    /// Snap a point to the closest target feature within tolerance
    pub fn classify_point(&self, point: &Point3<f64>) -> Option<Candidate> {
        let cells = self.candidate_cells(&BoundingBox::new(*point, *point));
        if cells.is_empty() {
            return None;
        }
        let mesh = self.topology.mesh;

        let mut best_vertex: Option<(f64, usize)> = None;
        for &cell_id in &cells {
            for &point_id in &mesh.cells[cell_id].point_ids {
                let distance = (mesh.points[point_id] - point).norm();
                if distance <= self.tolerance && is_closer(distance, point_id, best_vertex) {
                    best_vertex = Some((distance, point_id));
                }
            }
        }
        if let Some((_, point_id)) = best_vertex {
            return Some(Candidate {
                position: mesh.points[point_id],
                site: Site::Vertex(point_id),
            });
        }

        let mut best_edge: Option<(f64, Edge)> = None;
        let mut edge_position = *point;
        for &cell_id in &cells {
            for edge in mesh.cells[cell_id].edges() {
                let (s, closest) = closest_point_on_segment(point, &mesh.points[edge.v0], &mesh.points[edge.v1]);
                if s <= 0.0 || s >= 1.0 {
                    continue;
                }
                let distance = (closest - point).norm();
                if distance <= self.tolerance && is_closer(distance, edge, best_edge) {
                    best_edge = Some((distance, edge));
                    edge_position = closest;
                }
            }
        }
        if let Some((_, edge)) = best_edge {
            return Some(Candidate {
                position: edge_position,
                site: Site::Edge(edge),
            });
        }

        let mut best_cell: Option<(f64, usize)> = None;
        for &cell_id in &cells {
            let frame = &self.topology.frames[cell_id];
            let distance = frame.signed_distance(point).abs();
            if distance > self.tolerance {
                continue;
            }
            let local = frame.to_local(point);
            if point_in_polygon(&local, &self.topology.local_polygon(cell_id))
                && is_closer(distance, cell_id, best_cell)
            {
                best_cell = Some((distance, cell_id));
            }
        }
        best_cell.map(|(_, cell_id)| Candidate {
            position: self.topology.frames[cell_id].project(point),
            site: Site::Interior(cell_id),
        })
    }

    /// Trace an imprint edge across the target
    ///
    /// `start` and `end` are the classifications of the edge endpoints.
    pub fn trace_edge(
        &self,
        edge: Edge,
        a: &Point3<f64>,
        b: &Point3<f64>,
        start: Option<Candidate>,
        end: Option<Candidate>,
    ) -> EdgeTrace {
        let candidate_cells = self.candidate_cells(&BoundingBox::from_points(&[*a, *b]));

        let mut events = vec![
            TraceEvent {
                t: 0.0,
                candidate: start,
            },
            TraceEvent { t: 1.0, candidate: end },
        ];
        events.extend(self.crossings(a, b, &candidate_cells));
        events.sort_by(compare_events);

        EdgeTrace {
            edge,
            events,
            candidate_cells,
        }
    }

    /// Target features strictly between `a` and `b`, ordered from `a`
    pub fn trace_segment(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vec<Candidate> {
        let cells = self.candidate_cells(&BoundingBox::from_points(&[*a, *b]));
        let mut events = self.crossings(a, b, &cells);
        events.sort_by(compare_events);
        events.into_iter().filter_map(|event| event.candidate).collect()
    }

    /// Vertices passed and edges crossed within tolerance, unordered
    ///
    /// Computed on the segment running from its lexicographically smaller
    /// endpoint, so positions do not depend on how the imprint is labelled.
    fn crossings(&self, a: &Point3<f64>, b: &Point3<f64>, cells: &[usize]) -> Vec<TraceEvent> {
        let mesh = self.topology.mesh;
        let flipped = lexicographic_cmp(b, a) == Ordering::Less;
        let (a, b) = if flipped { (b, a) } else { (a, b) };
        let along = |t: f64| if flipped { 1.0 - t } else { t };

        let mut vertices: Vec<usize> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        for &cell_id in cells {
            vertices.extend_from_slice(&mesh.cells[cell_id].point_ids);
            edges.extend(mesh.cells[cell_id].edges());
        }
        vertices.sort_unstable();
        vertices.dedup();
        edges.sort_unstable();
        edges.dedup();

        let mut events = Vec::new();
        for &point_id in &vertices {
            let vertex = &mesh.points[point_id];
            let (t, closest) = closest_point_on_segment(vertex, a, b);
            if t <= 0.0 || t >= 1.0 || (closest - vertex).norm() > self.tolerance {
                continue;
            }
            events.push(TraceEvent {
                t: along(t),
                candidate: Some(Candidate {
                    position: *vertex,
                    site: Site::Vertex(point_id),
                }),
            });
        }

        for target_edge in &edges {
            let p = &mesh.points[target_edge.v0];
            let q = &mesh.points[target_edge.v1];
            let Some(approach) = segment_segment_closest(a, b, p, q) else {
                continue;
            };
            if approach.distance > self.tolerance || approach.s <= 0.0 || approach.s >= 1.0 {
                continue;
            }

            let position = p + (q - p) * approach.t;
            let site = if (position - p).norm() <= self.tolerance {
                Site::Vertex(target_edge.v0)
            } else if (position - q).norm() <= self.tolerance {
                Site::Vertex(target_edge.v1)
            } else {
                Site::Edge(*target_edge)
            };
            let position = match site {
                Site::Vertex(point_id) => mesh.points[point_id],
                _ => position,
            };
            events.push(TraceEvent {
                t: along(approach.s),
                candidate: Some(Candidate { position, site }),
            });
        }
        events
    }

    pub fn topology(&self) -> &'t MeshTopology<'m> {
        self.topology
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

fn lexicographic_cmp(a: &Point3<f64>, b: &Point3<f64>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then_with(|| a.y.total_cmp(&b.y))
        .then_with(|| a.z.total_cmp(&b.z))
}

/// Smaller distance wins; exact ties go to the smaller key
fn is_closer<K: Ord + Copy>(distance: f64, key: K, best: Option<(f64, K)>) -> bool {
    match best {
        None => true,
        Some((best_distance, best_key)) => match distance.total_cmp(&best_distance) {
            Ordering::Less => true,
            Ordering::Equal => key < best_key,
            Ordering::Greater => false,
        },
    }
}

fn compare_events(a: &TraceEvent, b: &TraceEvent) -> Ordering {
    a.t.total_cmp(&b.t).then_with(|| {
        let site_a = a.candidate.map(|c| c.site);
        let site_b = b.candidate.map(|c| c.site);
        site_a.cmp(&site_b)
    })
}
