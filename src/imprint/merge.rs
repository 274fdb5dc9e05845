// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point coincidence resolution
//!
//! Raw candidates are bucketed into a tolerance grid concurrently, then
//! reconciled in canonical order so that the outcome never depends on which
//! worker found a point first.

use super::locate::{Candidate, Site};
use crate::geometry::MeshTopology;
use dashmap::DashMap;
use nalgebra::Point3;
use rayon::prelude::*;
use std::cmp::Ordering;

type BucketKey = [i64; 3];

/// Output of the coincidence pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedPoints {
    /// Output point id of every raw candidate
    pub point_ids: Vec<usize>,
    /// Canonical new points; point `i` gets id `base + i`
    pub new_points: Vec<Candidate>,
    pub base: usize,
}

impl MergedPoints {
    /// Site of an output point id
    pub fn site(&self, point_id: usize) -> Site {
        if point_id < self.base {
            Site::Vertex(point_id)
        } else {
            self.new_points[point_id - self.base].site
        }
    }
}

/// Canonical order: site rank, then coordinates, then site
fn canonical_cmp(a: &Candidate, b: &Candidate) -> Ordering {
    a.site
        .rank()
        .cmp(&b.site.rank())
        .then_with(|| a.position.x.total_cmp(&b.position.x))
        .then_with(|| a.position.y.total_cmp(&b.position.y))
        .then_with(|| a.position.z.total_cmp(&b.position.z))
        .then_with(|| a.site.cmp(&b.site))
}

fn bucket_key(point: &Point3<f64>, size: f64) -> BucketKey {
    if size > 0.0 {
        [
            (point.x / size).floor() as i64,
            (point.y / size).floor() as i64,
            (point.z / size).floor() as i64,
        ]
    } else {
        // +0.0 folds negative zero onto zero
        [
            (point.x + 0.0).to_bits() as i64,
            (point.y + 0.0).to_bits() as i64,
            (point.z + 0.0).to_bits() as i64,
        ]
    }
}

fn neighbour_keys(key: BucketKey, size: f64) -> Vec<BucketKey> {
    if size <= 0.0 {
        return vec![key];
    }
    let mut keys = Vec::with_capacity(27);
    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                keys.push([key[0] + dx, key[1] + dy, key[2] + dz]);
            }
        }
    }
    keys
}

/// Welds raw candidates onto target vertices and onto each other
pub struct PointMerger<'t, 'm> {
    topology: &'t MeshTopology<'m>,
    tolerance: f64,
}

impl<'t, 'm> PointMerger<'t, 'm> {
    pub fn new(topology: &'t MeshTopology<'m>, tolerance: f64) -> Self {
        Self { topology, tolerance }
    }

    /// Whether a raw point on `raw` may be welded to a canonical point on `canonical`
    fn compatible(&self, canonical: &Site, raw: &Site) -> bool {
        match (canonical, raw) {
            (Site::Edge(a), Site::Edge(b)) => a == b,
            (Site::Edge(edge), Site::Interior(cell_id)) => self.topology.cell_has_edge(*cell_id, edge),
            (Site::Interior(a), Site::Interior(b)) => a == b,
            _ => false,
        }
    }

    pub fn merge(&self, raw: &[Candidate]) -> MergedPoints {
        let base = self.topology.mesh.point_count();
        let mut point_ids = vec![usize::MAX; raw.len()];

        let mut pending = Vec::new();
        for (index, candidate) in raw.iter().enumerate() {
            match candidate.site {
                Site::Vertex(point_id) => point_ids[index] = point_id,
                _ => pending.push(index),
            }
        }
        pending.sort_by(|&a, &b| canonical_cmp(&raw[a], &raw[b]).then(a.cmp(&b)));

        let mut order = vec![usize::MAX; raw.len()];
        for (position, &index) in pending.iter().enumerate() {
            order[index] = position;
        }

        let size = self.tolerance;
        let buckets: DashMap<BucketKey, Vec<usize>> = DashMap::new();
        pending.par_iter().for_each(|&index| {
            buckets
                .entry(bucket_key(&raw[index].position, size))
                .or_default()
                .push(index);
        });

        // Reconcile in canonical order; a point can only weld to an earlier one
        let mut canonical_of: Vec<Option<usize>> = vec![None; raw.len()];
        let mut new_points = Vec::new();
        for &index in &pending {
            let candidate = &raw[index];
            let mut best: Option<usize> = None;
            for key in neighbour_keys(bucket_key(&candidate.position, size), size) {
                let Some(bucket) = buckets.get(&key) else {
                    continue;
                };
                for &other in bucket.iter() {
                    if order[other] >= order[index] || canonical_of[other] != Some(other) {
                        continue;
                    }
                    let canonical = &raw[other];
                    if (canonical.position - candidate.position).norm() > self.tolerance
                        || !self.compatible(&canonical.site, &candidate.site)
                    {
                        continue;
                    }
                    if best.map_or(true, |b| order[other] < order[b]) {
                        best = Some(other);
                    }
                }
            }

            match best {
                Some(other) => {
                    canonical_of[index] = Some(other);
                    point_ids[index] = point_ids[other];
                }
                None => {
                    canonical_of[index] = Some(index);
                    point_ids[index] = base + new_points.len();
                    new_points.push(*candidate);
                }
            }
        }

        MergedPoints {
            point_ids,
            new_points,
            base,
        }
    }
}
