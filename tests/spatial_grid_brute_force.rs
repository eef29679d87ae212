/// Spatial grid queries checked against a brute-force scan.
///
/// Random handles are scattered over the plane, some of them moved around
/// with `relocate`, and every query result must equal the set of handles
/// strictly inside the query radius.

use steering::game::math::Vector2D;
use steering::game::spatial_grid::SpatialGrid;

const WIDTH: f64 = 500.0;
const HEIGHT: f64 = 300.0;

fn random_point(rng: &mut fastrand::Rng) -> Vector2D {
    Vector2D::new(rng.f64() * WIDTH, rng.f64() * HEIGHT)
}

fn brute_force(points: &[Vector2D], target: Vector2D, radius: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.distance_squared(target) < radius * radius)
        .map(|(i, _)| i)
        .collect()
}

fn sorted(mut v: Vec<usize>) -> Vec<usize> {
    v.sort_unstable();
    v
}

#[test]
fn test_queries_match_brute_force() {
    let mut rng = fastrand::Rng::with_seed(42); // Deterministic
    let points: Vec<_> = (0..300).map(|_| random_point(&mut rng)).collect();

    let mut grid = SpatialGrid::new(WIDTH, HEIGHT, 8, 5, points.len());
    for (i, &p) in points.iter().enumerate() {
        grid.insert(i, p);
    }

    for q in 0..200 {
        let target = random_point(&mut rng);
        let radius = rng.f64() * 120.0;

        let got = sorted(grid.calculate_neighbors(target, radius).to_vec());
        let expected = brute_force(&points, target, radius);
        assert_eq!(got, expected, "query {} at {:?} r={}", q, target, radius);
    }
}

#[test]
fn test_queries_match_after_relocation() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut points: Vec<_> = (0..150).map(|_| random_point(&mut rng)).collect();

    let mut grid = SpatialGrid::new(WIDTH, HEIGHT, 6, 6, points.len());
    for (i, &p) in points.iter().enumerate() {
        grid.insert(i, p);
    }

    for round in 0..20 {
        for _ in 0..50 {
            let i = rng.usize(..points.len());
            let next = random_point(&mut rng);
            grid.relocate(i, points[i], next);
            points[i] = next;
        }

        for _ in 0..10 {
            let target = random_point(&mut rng);
            let radius = 10.0 + rng.f64() * 90.0;
            let got = sorted(grid.calculate_neighbors(target, radius).to_vec());
            assert_eq!(got, brute_force(&points, target, radius), "round {}", round);
        }
    }
    assert_eq!(grid.len(), 150);
}

#[test]
fn test_queries_near_the_border() {
    let mut rng = fastrand::Rng::with_seed(1234);
    let points: Vec<_> = (0..100).map(|_| random_point(&mut rng)).collect();

    let mut grid = SpatialGrid::new(WIDTH, HEIGHT, 4, 4, points.len());
    for (i, &p) in points.iter().enumerate() {
        grid.insert(i, p);
    }

    let corners = [
        Vector2D::new(0.0, 0.0),
        Vector2D::new(WIDTH, 0.0),
        Vector2D::new(0.0, HEIGHT),
        Vector2D::new(WIDTH, HEIGHT),
    ];
    for corner in corners {
        let got = sorted(grid.calculate_neighbors(corner, 150.0).to_vec());
        assert_eq!(got, brute_force(&points, corner, 150.0), "corner {:?}", corner);
    }
}
