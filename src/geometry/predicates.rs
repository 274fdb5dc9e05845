// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric predicates for projection and re-triangulation
//! Orientation tests fall back to a compensated evaluation for near-degenerate cases

use nalgebra::{Point2, Point3};

/// Relative threshold below which an orientation determinant is recomputed
const ADAPTIVE_EPS: f64 = 1e-9;

/// Squared sine of the angle below which two segments count as parallel
const PARALLEL_SIN2: f64 = 1e-12;

/// Twice the signed area of triangle (a, b, c)
/// Positive when (a, b, c) turn counter-clockwise
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let acx = a.x - c.x;
    let bcx = b.x - c.x;
    let acy = a.y - c.y;
    let bcy = b.y - c.y;

    let det = acx * bcy - acy * bcx;
    let magnitude = (acx * bcy).abs() + (acy * bcx).abs();

    if det.abs() <= ADAPTIVE_EPS * magnitude {
        two_product_difference(acx, bcy, acy, bcx)
    } else {
        det
    }
}

/// Computes (a * b) - (c * d) keeping the rounding error of the first product
fn two_product_difference(a: f64, b: f64, c: f64, d: f64) -> f64 {
    let cd = c * d;
    let err = c.mul_add(d, -cd);
    a.mul_add(b, -cd) - err
}

/// Positive when `d` lies strictly inside the circumcircle of counter-clockwise (a, b, c)
pub fn incircle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> f64 {
    let adx = a.x - d.x;
    let ady = a.y - d.y;
    let bdx = b.x - d.x;
    let bdy = b.y - d.y;
    let cdx = c.x - d.x;
    let cdy = c.y - d.y;

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    alift * (bdx * cdy - cdx * bdy) + blift * (cdx * ady - adx * cdy) + clift * (adx * bdy - bdx * ady)
}

/// Even-odd point in polygon test
pub fn point_in_polygon(point: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_cross = pj.x + (point.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from a point to a 2D segment
pub fn distance_to_segment_2d(point: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

/// Distance from a point to the closed boundary of a polygon
pub fn distance_to_polygon_boundary(point: &Point2<f64>, polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| distance_to_segment_2d(point, &polygon[i], &polygon[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// True when segments (a, b) and (c, d) cross at a single interior point
///
/// Endpoint contact and collinear overlap within `eps` do not count.
pub fn segments_cross_2d(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
    eps: f64,
) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);

    ((o1 > eps && o2 < -eps) || (o1 < -eps && o2 > eps))
        && ((o3 > eps && o4 < -eps) || (o3 < -eps && o4 > eps))
}

/// Parameter and position of the point on segment (a, b) closest to `point`
pub fn closest_point_on_segment(point: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> (f64, Point3<f64>) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (0.0, *a);
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (t, a + ab * t)
}

/// Closest approach between two non-parallel 3D segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentApproach {
    /// Parameter along the first segment
    pub s: f64,
    /// Parameter along the second segment
    pub t: f64,
    /// Distance between the two closest points
    pub distance: f64,
}

/// Closest points between segments (p0, p1) and (q0, q1)
///
/// Returns `None` for degenerate or (nearly) parallel segments, where the
/// closest pair is not unique.
pub fn segment_segment_closest(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    q0: &Point3<f64>,
    q1: &Point3<f64>,
) -> Option<SegmentApproach> {
    let d1 = p1 - p0;
    let d2 = q1 - q0;
    let r = p0 - q0;

    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    if a == 0.0 || e == 0.0 {
        return None;
    }

    let cross = d1.cross(&d2);
    if cross.norm_squared() <= PARALLEL_SIN2 * a * e {
        return None;
    }

    let b = d1.dot(&d2);
    let c = d1.dot(&r);
    let f = d2.dot(&r);
    let denom = a * e - b * b;

    let mut s = ((b * f - c * e) / denom).clamp(0.0, 1.0);
    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = (-c / a).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((b - c) / a).clamp(0.0, 1.0);
    }

    let closest_p = p0 + d1 * s;
    let closest_q = q0 + d2 * t;
    Some(SegmentApproach {
        s,
        t,
        distance: (closest_p - closest_q).norm(),
    })
}
