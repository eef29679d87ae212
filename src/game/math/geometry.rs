use super::Vector2D;
use serde::{Deserialize, Serialize};

/// Where segment AB crosses segment CD.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Distance from `a` along AB.
    pub dist: f64,
    pub point: Vector2D,
}

/// Strict segment/segment test. Parallel and collinear segments never
/// intersect, and touching at an endpoint does not count.
pub fn lines_intersect(a: Vector2D, b: Vector2D, c: Vector2D, d: Vector2D) -> bool {
    line_intersection_2d(a, b, c, d).is_some()
}

pub fn line_intersection_2d(
    a: Vector2D,
    b: Vector2D,
    c: Vector2D,
    d: Vector2D,
) -> Option<Intersection> {
    let r_top = (a.y - c.y) * (d.x - c.x) - (a.x - c.x) * (d.y - c.y);
    let s_top = (a.y - c.y) * (b.x - a.x) - (a.x - c.x) * (b.y - a.y);
    let bot = (b.x - a.x) * (d.y - c.y) - (b.y - a.y) * (d.x - c.x);

    if bot == 0.0 {
        return None;
    }

    let r = r_top / bot;
    let s = s_top / bot;

    if r > 0.0 && r < 1.0 && s > 0.0 && s < 1.0 {
        Some(Intersection {
            dist: a.distance(b) * r,
            point: a + (b - a) * r,
        })
    } else {
        None
    }
}

/// Shortest distance from `p` to segment AB.
pub fn dist_to_line_segment(a: Vector2D, b: Vector2D, p: Vector2D) -> f64 {
    dist_to_line_segment_sq(a, b, p).sqrt()
}

pub fn dist_to_line_segment_sq(a: Vector2D, b: Vector2D, p: Vector2D) -> f64 {
    let ab = b - a;
    if (p - a).dot(ab) <= 0.0 {
        return a.distance_squared(p);
    }
    if (p - b).dot(a - b) <= 0.0 {
        return b.distance_squared(p);
    }
    let t = (p - a).dot(ab) / ab.length_squared();
    (a + ab * t).distance_squared(p)
}

pub fn two_circles_overlapped(c1: Vector2D, r1: f64, c2: Vector2D, r2: f64) -> bool {
    let d = c1.distance(c2);
    d < r1 + r2 || d < (r1 - r2).abs()
}

pub fn point_in_circle(center: Vector2D, radius: f64, p: Vector2D) -> bool {
    center.distance_squared(p) < radius * radius
}

/// The two points on a circle touched by tangent lines drawn from `point`.
/// Returns `None` when `point` lies inside or on the circle.
pub fn get_tangent_points(
    center: Vector2D,
    radius: f64,
    point: Vector2D,
) -> Option<(Vector2D, Vector2D)> {
    let pc = point - center;
    let len_sq = pc.length_squared();
    let r_sq = radius * radius;
    if len_sq <= r_sq {
        return None;
    }

    let inv = 1.0 / len_sq;
    let root = (len_sq - r_sq).abs().sqrt();

    let t1 = Vector2D::new(
        center.x + radius * (radius * pc.x - pc.y * root) * inv,
        center.y + radius * (radius * pc.y + pc.x * root) * inv,
    );
    let t2 = Vector2D::new(
        center.x + radius * (radius * pc.x + pc.y * root) * inv,
        center.y + radius * (radius * pc.y - pc.x * root) * inv,
    );
    Some((t1, t2))
}

/// Axis-aligned box with `y` growing downward (`top < bottom`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub top_left: Vector2D,
    pub bottom_right: Vector2D,
}

impl Aabb {
    pub fn new(top_left: Vector2D, bottom_right: Vector2D) -> Self {
        Self { top_left, bottom_right }
    }

    pub fn around(center: Vector2D, half_extent: f64) -> Self {
        let h = Vector2D::new(half_extent, half_extent);
        Self::new(center - h, center + h)
    }

    pub fn top(&self) -> f64 {
        self.top_left.y
    }

    pub fn left(&self) -> f64 {
        self.top_left.x
    }

    pub fn bottom(&self) -> f64 {
        self.bottom_right.y
    }

    pub fn right(&self) -> f64 {
        self.bottom_right.x
    }

    pub fn center(&self) -> Vector2D {
        (self.top_left + self.bottom_right) * 0.5
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(other.top() > self.bottom()
            || other.bottom() < self.top()
            || other.left() > self.right()
            || other.right() < self.left())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_segments_report_distance_and_point() {
        let hit = line_intersection_2d(
            Vector2D::new(0.0, 0.0),
            Vector2D::new(10.0, 0.0),
            Vector2D::new(4.0, -5.0),
            Vector2D::new(4.0, 5.0),
        )
        .expect("segments cross");
        assert!((hit.dist - 4.0).abs() < 1e-12);
        assert!(hit.point.distance(Vector2D::new(4.0, 0.0)) < 1e-12);
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        assert!(!lines_intersect(
            Vector2D::new(0.0, 0.0),
            Vector2D::new(10.0, 0.0),
            Vector2D::new(0.0, 1.0),
            Vector2D::new(10.0, 1.0),
        ));
    }

    #[test]
    fn test_dist_to_segment_clamps_to_endpoints() {
        let a = Vector2D::new(0.0, 0.0);
        let b = Vector2D::new(10.0, 0.0);
        assert!((dist_to_line_segment(a, b, Vector2D::new(5.0, 3.0)) - 3.0).abs() < 1e-12);
        assert!((dist_to_line_segment(a, b, Vector2D::new(-3.0, 4.0)) - 5.0).abs() < 1e-12);
        assert!((dist_to_line_segment(a, b, Vector2D::new(13.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_tangent_points_are_distinct_and_tangent() {
        let center = Vector2D::new(2.0, -1.0);
        let radius = 3.0;
        let p = Vector2D::new(9.0, 4.0);
        let (t1, t2) = get_tangent_points(center, radius, p).expect("point is outside");

        assert!(t1.distance(t2) > 1e-6, "both tangent points must be computed");
        for t in [t1, t2] {
            assert!((t.distance(center) - radius).abs() < 1e-9, "on the circle");
            // Radius is perpendicular to the tangent line.
            assert!((t - center).dot(p - t).abs() < 1e-9, "tangent at {t:?}");
        }
    }

    #[test]
    fn test_tangent_points_none_inside_circle() {
        assert!(get_tangent_points(Vector2D::ZERO, 5.0, Vector2D::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_circle_overlap_includes_containment() {
        assert!(two_circles_overlapped(Vector2D::ZERO, 10.0, Vector2D::new(1.0, 0.0), 1.0));
        assert!(!two_circles_overlapped(Vector2D::ZERO, 1.0, Vector2D::new(5.0, 0.0), 1.0));
    }

    #[test]
    fn test_aabb_overlap_is_inclusive_at_edges() {
        let a = Aabb::new(Vector2D::new(0.0, 0.0), Vector2D::new(10.0, 10.0));
        let touching = Aabb::new(Vector2D::new(10.0, 0.0), Vector2D::new(20.0, 10.0));
        let apart = Aabb::new(Vector2D::new(10.5, 0.0), Vector2D::new(20.0, 10.0));
        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&apart));
    }
}
