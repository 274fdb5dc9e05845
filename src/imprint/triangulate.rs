// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Constrained re-triangulation of a single target cell
//!
//! Works in the cell's local plane frame:
//! 1. Ear clipping of the boundary ring (cell loop plus edge points)
//! 2. Interior points by triangle or edge splitting
//! 3. Constraint recovery by edge flipping
//! 4. Optional Lawson refinement, never flipping constrained edges
//!
//! Boundary ring edges have no neighbour inside the cell and are never
//! flipped, so the cell outline is reproduced exactly.

use super::error::{ImprintError, ImprintWarning};
use crate::geometry::predicates::{incircle, orient2d, segments_cross_2d};
use crate::geometry::{Cell, CellFrame, Mesh};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point2, Point3};
use std::collections::VecDeque;

/// Points and segments to stitch into one target cell, as output point ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellInput {
    pub cell_id: usize,
    /// Cell loop with edge points inserted in edge order
    pub ring: Vec<usize>,
    /// Points strictly inside the cell, ascending
    pub interior: Vec<usize>,
    /// Imprint segments to recover as triangle edges
    pub constraints: Vec<(usize, usize)>,
}

/// Re-triangulated cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellTriangulation {
    pub cell_id: usize,
    /// Output point ids used by the triangulation, ring first
    pub point_ids: Vec<usize>,
    /// Counter-clockwise triangles in output point ids
    pub triangles: Vec<[usize; 3]>,
    pub warnings: Vec<ImprintWarning>,
}

impl CellTriangulation {
    /// Standalone mesh of this triangulation with compact point ids
    pub fn to_mesh(&self, points: &[Point3<f64>]) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.point_ids.len(), self.triangles.len());
        let mut local = AHashMap::with_capacity(self.point_ids.len());
        for &id in &self.point_ids {
            local.insert(id, mesh.add_point(points[id]));
        }
        for t in &self.triangles {
            mesh.add_cell(Cell::triangle(local[&t[0]], local[&t[1]], local[&t[2]]));
        }
        mesh
    }
}

/// Triangulate a cell in its plane frame
pub fn triangulate_cell(
    input: &CellInput,
    points: &[Point3<f64>],
    frame: &CellFrame,
    refine: bool,
) -> Result<CellTriangulation, ImprintError> {
    let fail = |reason: String| ImprintError::Triangulation {
        cell_id: input.cell_id,
        reason,
    };

    let mut point_ids: Vec<usize> = input.ring.clone();
    let mut local_of: AHashMap<usize, usize> = AHashMap::with_capacity(input.ring.len() + input.interior.len());
    for (local, &id) in input.ring.iter().enumerate() {
        if local_of.insert(id, local).is_some() {
            return Err(fail(format!("point {} appears twice on the cell boundary", id)));
        }
    }
    for &id in &input.interior {
        if !local_of.contains_key(&id) {
            local_of.insert(id, point_ids.len());
            point_ids.push(id);
        }
    }

    let vertices: Vec<Point2<f64>> = point_ids.iter().map(|&id| frame.to_local(&points[id])).collect();
    let mut tri = LocalTriangulation::new(vertices);
    let ring: Vec<usize> = (0..input.ring.len()).collect();

    let ring_area = tri.polygon_area(&ring);
    if ring_area <= tri.orient_eps {
        return Err(fail("boundary ring is not counter-clockwise in the cell plane".to_string()));
    }

    tri.ear_clip(&ring).map_err(fail)?;

    let mut warnings = Vec::new();
    for local in ring.len()..point_ids.len() {
        if !tri.insert_point(local) {
            warnings.push(ImprintWarning::PointNotInserted {
                cell_id: input.cell_id,
                point_id: point_ids[local],
            });
        }
    }

    if refine {
        tri.make_delaunay();
    }

    for &(from, to) in &input.constraints {
        let recovered = match (local_of.get(&from), local_of.get(&to)) {
            (Some(&u), Some(&v)) => tri.insert_constraint(u, v),
            _ => false,
        };
        if !recovered {
            warnings.push(ImprintWarning::ConstraintNotRecovered {
                cell_id: input.cell_id,
                from,
                to,
            });
        }
    }

    if refine && !input.constraints.is_empty() {
        tri.make_delaunay();
    }

    tri.verify(ring_area).map_err(fail)?;

    let triangles = tri
        .triangles
        .iter()
        .map(|t| [point_ids[t[0]], point_ids[t[1]], point_ids[t[2]]])
        .collect();

    Ok(CellTriangulation {
        cell_id: input.cell_id,
        point_ids,
        triangles,
        warnings,
    })
}

struct LocalTriangulation {
    vertices: Vec<Point2<f64>>,
    triangles: Vec<[usize; 3]>,
    inserted: Vec<bool>,
    constrained: AHashSet<(usize, usize)>,
    scale: f64,
    orient_eps: f64,
    incircle_eps: f64,
}

fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn opposite(t: &[usize; 3], a: usize, b: usize) -> usize {
    t.iter().copied().find(|&w| w != a && w != b).unwrap_or(a)
}

impl LocalTriangulation {
    fn new(vertices: Vec<Point2<f64>>) -> Self {
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &vertices {
            min = min.inf(v);
            max = max.sup(v);
        }
        let scale = (max - min).norm().max(f64::MIN_POSITIVE);
        let inserted = vec![false; vertices.len()];

        Self {
            vertices,
            triangles: Vec::new(),
            inserted,
            constrained: AHashSet::new(),
            scale,
            orient_eps: 1e-12 * scale * scale,
            incircle_eps: 1e-12 * scale.powi(4),
        }
    }

    fn orient(&self, a: usize, b: usize, c: usize) -> f64 {
        orient2d(&self.vertices[a], &self.vertices[b], &self.vertices[c])
    }

    fn polygon_area(&self, ring: &[usize]) -> f64 {
        let n = ring.len();
        (0..n)
            .map(|i| {
                let a = &self.vertices[ring[i]];
                let b = &self.vertices[ring[(i + 1) % n]];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            * 0.5
    }

    /// Index of the triangle holding the directed edge a -> b
    fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.triangles
            .iter()
            .position(|t| (0..3).any(|i| t[i] == a && t[(i + 1) % 3] == b))
    }

    fn has_edge(&self, a: usize, b: usize) -> bool {
        self.find_edge(a, b).is_some() || self.find_edge(b, a).is_some()
    }

    fn is_constrained(&self, a: usize, b: usize) -> bool {
        self.constrained.contains(&key(a, b))
    }

    /// Closed triangle test; `w` on an edge counts as inside
    fn in_triangle(&self, a: usize, b: usize, c: usize, w: usize) -> bool {
        let eps = self.orient_eps;
        self.orient(a, b, w) >= -eps && self.orient(b, c, w) >= -eps && self.orient(c, a, w) >= -eps
    }

    fn ear_clip(&mut self, ring: &[usize]) -> Result<(), String> {
        let mut ring = ring.to_vec();
        for &v in &ring {
            self.inserted[v] = true;
        }

        while ring.len() > 3 {
            let m = ring.len();
            let mut chosen = None;
            let mut fallback: Option<(f64, usize)> = None;

            for i in 0..m {
                let (prev, tip, next) = (ring[(i + m - 1) % m], ring[i], ring[(i + 1) % m]);
                let o = self.orient(prev, tip, next);
                if o <= self.orient_eps {
                    continue;
                }
                if fallback.map_or(true, |(best, _)| o > best) {
                    fallback = Some((o, i));
                }
                let blocked = ring
                    .iter()
                    .any(|&w| w != prev && w != tip && w != next && self.in_triangle(prev, tip, next, w));
                if !blocked {
                    chosen = Some(i);
                    break;
                }
            }

            let Some(i) = chosen.or(fallback.map(|(_, i)| i)) else {
                return Err(format!("no convex ear left among {} boundary points", m));
            };
            self.triangles.push([ring[(i + m - 1) % m], ring[i], ring[(i + 1) % m]]);
            ring.remove(i);
        }

        if ring.len() == 3 {
            self.triangles.push([ring[0], ring[1], ring[2]]);
        }
        Ok(())
    }

    /// Insert a point by splitting the triangle or interior edge it lies on
    fn insert_point(&mut self, p: usize) -> bool {
        let eps = self.orient_eps;
        for ti in 0..self.triangles.len() {
            let [a, b, c] = self.triangles[ti];
            let o = [self.orient(a, b, p), self.orient(b, c, p), self.orient(c, a, p)];

            if o.iter().all(|&x| x > eps) {
                self.triangles[ti] = [a, b, p];
                self.triangles.push([b, c, p]);
                self.triangles.push([c, a, p]);
                self.inserted[p] = true;
                return true;
            }

            let on_edge: Vec<usize> = (0..3).filter(|&i| o[i].abs() <= eps).collect();
            let inside_others = (0..3).all(|i| on_edge.contains(&i) || o[i] > eps);
            if on_edge.len() == 1 && inside_others {
                let t = self.triangles[ti];
                let i = on_edge[0];
                let (ea, eb, ec) = (t[i], t[(i + 1) % 3], t[(i + 2) % 3]);
                // Boundary edges cannot be split without breaking the neighbour
                let Some(tj) = self.find_edge(eb, ea) else {
                    return false;
                };
                let d = opposite(&self.triangles[tj], eb, ea);
                self.triangles[ti] = [ea, p, ec];
                self.triangles[tj] = [eb, p, d];
                self.triangles.push([p, eb, ec]);
                self.triangles.push([p, ea, d]);
                self.inserted[p] = true;
                return true;
            }
        }
        false
    }

    /// Flip the interior edge a-b if its quad is strictly convex
    fn flip(&mut self, a: usize, b: usize) -> bool {
        let (Some(t1), Some(t2)) = (self.find_edge(a, b), self.find_edge(b, a)) else {
            return false;
        };
        let c = opposite(&self.triangles[t1], a, b);
        let d = opposite(&self.triangles[t2], b, a);
        if self.orient(c, a, d) <= self.orient_eps || self.orient(d, b, c) <= self.orient_eps {
            return false;
        }
        self.triangles[t1] = [c, a, d];
        self.triangles[t2] = [d, b, c];
        true
    }

    /// Lawson flips until every unconstrained edge is locally Delaunay
    fn make_delaunay(&mut self) {
        let n = self.vertices.len();
        let cap = 8 * n * n + 64;
        let mut flips = 0;

        loop {
            let mut flipped = false;
            for ti in 0..self.triangles.len() {
                for i in 0..3 {
                    let t = self.triangles[ti];
                    let (a, b, c) = (t[i], t[(i + 1) % 3], t[(i + 2) % 3]);
                    if self.is_constrained(a, b) {
                        continue;
                    }
                    let Some(tj) = self.find_edge(b, a) else {
                        continue;
                    };
                    let d = opposite(&self.triangles[tj], b, a);
                    let v = &self.vertices;
                    if incircle(&v[a], &v[b], &v[c], &v[d]) > self.incircle_eps && self.flip(a, b) {
                        flipped = true;
                        flips += 1;
                        break;
                    }
                }
                if flips >= cap {
                    return;
                }
            }
            if !flipped {
                return;
            }
        }
    }

    /// Force segment u-v into the triangulation, splitting it at collinear vertices
    fn insert_constraint(&mut self, u: usize, v: usize) -> bool {
        if u == v || !self.inserted[u] || !self.inserted[v] {
            return false;
        }
        let uv = self.vertices[v] - self.vertices[u];
        let length = uv.norm();
        let tolerance = 1e-9 * self.scale * length;

        let mut between: Vec<(f64, usize)> = (0..self.vertices.len())
            .filter(|&w| w != u && w != v && self.inserted[w])
            .filter_map(|w| {
                if self.orient(u, v, w).abs() > tolerance {
                    return None;
                }
                let t = (self.vertices[w] - self.vertices[u]).dot(&uv) / (length * length);
                (t > 0.0 && t < 1.0).then_some((t, w))
            })
            .collect();
        between.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut chain = Vec::with_capacity(between.len() + 2);
        chain.push(u);
        chain.extend(between.iter().map(|&(_, w)| w));
        chain.push(v);

        let mut recovered = true;
        for pair in chain.windows(2) {
            recovered &= self.recover_segment(pair[0], pair[1]);
        }
        recovered
    }

    /// Interior edges properly crossing segment u-v
    fn crossing_edges(&self, u: usize, v: usize) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for t in &self.triangles {
            for i in 0..3 {
                let (a, b) = (t[i], t[(i + 1) % 3]);
                if a > b || [u, v].contains(&a) || [u, v].contains(&b) {
                    continue;
                }
                let vs = &self.vertices;
                if segments_cross_2d(&vs[u], &vs[v], &vs[a], &vs[b], self.orient_eps) {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    fn recover_segment(&mut self, u: usize, v: usize) -> bool {
        if self.has_edge(u, v) {
            self.constrained.insert(key(u, v));
            return true;
        }

        let crossing = self.crossing_edges(u, v);
        if crossing.is_empty() || crossing.iter().any(|&(a, b)| self.is_constrained(a, b)) {
            return false;
        }

        let cap = 16 * (crossing.len() + 1) * (self.vertices.len() + 1);
        let mut queue: VecDeque<(usize, usize)> = crossing.into_iter().collect();
        let mut iterations = 0;
        while let Some((a, b)) = queue.pop_front() {
            iterations += 1;
            if iterations > cap {
                return false;
            }
            let (Some(t1), Some(t2)) = (self.find_edge(a, b), self.find_edge(b, a)) else {
                continue;
            };
            let c = opposite(&self.triangles[t1], a, b);
            let d = opposite(&self.triangles[t2], b, a);
            if !self.flip(a, b) {
                queue.push_back((a, b));
                continue;
            }
            if [c, d].iter().any(|w| *w == u || *w == v) {
                continue;
            }
            let vs = &self.vertices;
            if segments_cross_2d(&vs[u], &vs[v], &vs[c], &vs[d], self.orient_eps) {
                queue.push_back((c, d));
            }
        }

        if self.has_edge(u, v) {
            self.constrained.insert(key(u, v));
            true
        } else {
            false
        }
    }

    fn verify(&self, ring_area: f64) -> Result<(), String> {
        let mut seen = AHashSet::with_capacity(self.triangles.len());
        let mut area = 0.0;
        for t in &self.triangles {
            let o = self.orient(t[0], t[1], t[2]);
            if o <= self.orient_eps {
                return Err(format!("triangle {:?} has no positive area", t));
            }
            let mut sorted = *t;
            sorted.sort_unstable();
            if !seen.insert(sorted) {
                return Err(format!("triangle {:?} appears twice", t));
            }
            area += 0.5 * o;
        }
        if (area - ring_area).abs() > 1e-6 * ring_area {
            return Err(format!(
                "triangles cover area {} but the cell has area {}",
                area, ring_area
            ));
        }
        Ok(())
    }
}
