// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) for spatial acceleration
//!
//! Nodes live in a flat arena and refer to their children by index; leaves
//! reference a contiguous slice of the item list. Items are cell indices of the
//! mesh the hierarchy was built from.

use super::BoundingBox;

const MAX_DEPTH: usize = 32;
const MAX_LEAF_ITEMS: usize = 4;

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: usize, count: usize },
    Internal { left: usize, right: usize },
}

/// BVH node
#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: BoundingBox,
    kind: NodeKind,
}

/// Arena-backed bounding volume hierarchy over indexed boxes
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    items: Vec<usize>,
    boxes: Vec<BoundingBox>,
}

impl Bvh {
    /// Build a hierarchy over `boxes`; item `i` is keyed by its position in the slice
    pub fn build(boxes: &[BoundingBox]) -> Self {
        let mut bvh = Self {
            nodes: Vec::with_capacity(boxes.len().max(1) * 2),
            items: (0..boxes.len()).collect(),
            boxes: boxes.to_vec(),
        };

        if boxes.is_empty() {
            bvh.nodes.push(BvhNode {
                bbox: BoundingBox::empty(),
                kind: NodeKind::Leaf { start: 0, count: 0 },
            });
            return bvh;
        }

        let count = bvh.items.len();
        bvh.build_recursive(boxes, 0, count, 0);
        bvh
    }

    /// Build the subtree for `items[start..end]`, returning its node index
    fn build_recursive(&mut self, boxes: &[BoundingBox], start: usize, end: usize, depth: usize) -> usize {
        let bbox = self.items[start..end]
            .iter()
            .fold(BoundingBox::empty(), |acc, &item| acc.union(&boxes[item]));

        let node_index = self.nodes.len();
        self.nodes.push(BvhNode {
            bbox,
            kind: NodeKind::Leaf {
                start,
                count: end - start,
            },
        });

        if end - start <= MAX_LEAF_ITEMS || depth >= MAX_DEPTH {
            return node_index;
        }

        // Split at the median of box centers along the longest centroid axis
        let centroid_bounds = self.items[start..end].iter().fold(BoundingBox::empty(), |mut acc, &item| {
            acc.expand_to_include(&boxes[item].center());
            acc
        });
        let axis = centroid_bounds.longest_axis();

        self.items[start..end].sort_by(|&a, &b| {
            boxes[a].center()[axis]
                .total_cmp(&boxes[b].center()[axis])
                .then(a.cmp(&b))
        });

        let mid = start + (end - start) / 2;
        let left = self.build_recursive(boxes, start, mid, depth + 1);
        let right = self.build_recursive(boxes, mid, end, depth + 1);
        self.nodes[node_index].kind = NodeKind::Internal { left, right };

        node_index
    }

    /// Number of indexed items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose box overlaps `bbox`, sorted ascending
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        if self.items.is_empty() {
            return result;
        }

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bbox.intersects(bbox) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    result.extend(
                        self.items[start..start + count]
                            .iter()
                            .copied()
                            .filter(|&item| self.boxes[item].intersects(bbox)),
                    );
                }
                NodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        result.sort_unstable();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn unit_boxes_along_x(count: usize) -> Vec<BoundingBox> {
        (0..count)
            .map(|i| {
                let x = i as f64;
                BoundingBox::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
            })
            .collect()
    }

    #[test]
    fn test_bvh_build() {
        let bvh = Bvh::build(&unit_boxes_along_x(37));
        assert_eq!(bvh.len(), 37);
        assert!(bvh.nodes.len() > 1);
        assert!(matches!(bvh.nodes[0].kind, NodeKind::Internal { .. }));
    }

    #[test]
    fn test_bvh_query_matches_linear_scan() {
        let boxes = unit_boxes_along_x(50);
        let bvh = Bvh::build(&boxes);
        let query = BoundingBox::new(Point3::new(10.5, 0.2, 0.2), Point3::new(13.2, 0.4, 0.4));

        let expected: Vec<usize> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.intersects(&query))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(bvh.query(&query), expected);
        assert_eq!(expected, vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_leaf_items_are_filtered() {
        // Four boxes fit in one leaf; only the overlapped one is returned
        let boxes = unit_boxes_along_x(4);
        let bvh = Bvh::build(&boxes);
        assert_eq!(bvh.nodes.len(), 1);
        let query = BoundingBox::new(Point3::new(2.2, 0.5, 0.5), Point3::new(2.8, 0.6, 0.6));
        assert_eq!(bvh.query(&query), vec![2]);
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());
        let query = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(bvh.query(&query).is_empty());
    }
}
