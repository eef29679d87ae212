use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::math::{rotate_around_origin, Vector2D, TWO_PI};

/// Ordered waypoints with a cursor.
///
/// A looped path wraps its cursor back to the first waypoint. A non-looped
/// path parks the cursor on its last waypoint and reports
/// [`Path::is_finished`] from then on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    waypoints: SmallVec<[Vector2D; 8]>,
    cursor: usize,
    looped: bool,
}

impl Path {
    pub fn new(looped: bool) -> Self {
        Self { waypoints: SmallVec::new(), cursor: 0, looped }
    }

    /// A closed-ish tour of `num_waypoints` points around the middle of the
    /// given rectangle, evenly spaced in angle at random radial distances.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        num_waypoints: usize,
        min: Vector2D,
        max: Vector2D,
        looped: bool,
    ) -> Self {
        let mut path = Self::new(looped);
        path.create_random_path(rng, num_waypoints, min, max);
        path
    }

    pub fn create_random_path<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        num_waypoints: usize,
        min: Vector2D,
        max: Vector2D,
    ) {
        self.waypoints.clear();
        self.cursor = 0;
        if num_waypoints == 0 {
            return;
        }

        let mid = (min + max) * 0.5;
        let smaller = mid.x.min(mid.y);
        let spacing = TWO_PI / num_waypoints as f64;

        for i in 0..num_waypoints {
            let radial = rng.random_range(smaller * 0.2..=smaller);
            let offset = rotate_around_origin(Vector2D::new(radial, 0.0), i as f64 * spacing);
            self.waypoints.push(mid + offset);
        }
    }

    pub fn add_waypoint(&mut self, point: Vector2D) {
        self.waypoints.push(point);
    }

    /// Replaces the waypoints and rewinds the cursor.
    pub fn set(&mut self, points: impl IntoIterator<Item = Vector2D>) {
        self.waypoints = points.into_iter().collect();
        self.cursor = 0;
    }

    pub fn current_waypoint(&self) -> Option<Vector2D> {
        self.waypoints.get(self.cursor).copied()
    }

    pub fn set_next_waypoint(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }
        if self.cursor + 1 < self.waypoints.len() {
            self.cursor += 1;
        } else if self.looped {
            self.cursor = 0;
        }
    }

    pub fn is_finished(&self) -> bool {
        !self.looped && !self.waypoints.is_empty() && self.cursor + 1 == self.waypoints.len()
    }

    pub fn waypoints(&self) -> &[Vector2D] {
        &self.waypoints
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn loop_on(&mut self) {
        self.looped = true;
    }

    pub fn loop_off(&mut self) {
        self.looped = false;
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square(looped: bool) -> Path {
        let mut path = Path::new(looped);
        path.set([
            Vector2D::new(0.0, 0.0),
            Vector2D::new(10.0, 0.0),
            Vector2D::new(10.0, 10.0),
        ]);
        path
    }

    #[test]
    fn test_looped_path_wraps_cursor() {
        let mut path = square(true);
        path.set_next_waypoint();
        path.set_next_waypoint();
        assert_eq!(path.current_waypoint(), Some(Vector2D::new(10.0, 10.0)));
        assert!(!path.is_finished());

        path.set_next_waypoint();
        assert_eq!(path.current_waypoint(), Some(Vector2D::new(0.0, 0.0)));
    }

    #[test]
    fn test_open_path_parks_on_last_waypoint() {
        let mut path = square(false);
        path.set_next_waypoint();
        assert!(!path.is_finished());
        path.set_next_waypoint();
        assert!(path.is_finished());

        path.set_next_waypoint();
        assert_eq!(path.current_waypoint(), Some(Vector2D::new(10.0, 10.0)), "cursor never runs off the end");
    }

    #[test]
    fn test_empty_path_has_no_waypoint() {
        let mut path = Path::new(false);
        path.set_next_waypoint();
        assert_eq!(path.current_waypoint(), None);
        assert!(!path.is_finished());
    }

    #[test]
    fn test_random_path_stays_around_the_middle() {
        let mut rng = StdRng::seed_from_u64(3);
        let min = Vector2D::new(60.0, 60.0);
        let max = Vector2D::new(540.0, 420.0);
        let path = Path::random(&mut rng, 6, min, max, true);

        let mid = (min + max) * 0.5;
        let smaller = mid.x.min(mid.y);
        assert_eq!(path.waypoints().len(), 6);
        for wp in path.waypoints() {
            let d = wp.distance(mid);
            assert!(d >= smaller * 0.2 - 1e-9 && d <= smaller + 1e-9, "waypoint {wp:?} at {d}");
        }
    }
}
