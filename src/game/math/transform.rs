use super::{Matrix2D, Vector2D};

/// Maps a local-space outline (e.g. a vehicle triangle) into world space.
/// `scale` is skipped when it is the unit scale.
pub fn world_transform(
    points: &[Vector2D],
    pos: Vector2D,
    forward: Vector2D,
    side: Vector2D,
    scale: Option<Vector2D>,
) -> Vec<Vector2D> {
    let mut out = points.to_vec();
    let mut m = Matrix2D::identity();
    if let Some(s) = scale.filter(|s| s.x != 1.0 || s.y != 1.0) {
        m.scale(s.x, s.y);
    }
    m.rotate_basis(forward, side).translate(pos.x, pos.y);
    m.transform_points(&mut out);
    out
}

pub fn point_to_world_space(
    point: Vector2D,
    heading: Vector2D,
    side: Vector2D,
    pos: Vector2D,
) -> Vector2D {
    let mut m = Matrix2D::identity();
    m.rotate_basis(heading, side).translate(pos.x, pos.y);
    m.transform_point(point)
}

pub fn vector_to_world_space(vec: Vector2D, heading: Vector2D, side: Vector2D) -> Vector2D {
    let mut m = Matrix2D::identity();
    m.rotate_basis(heading, side);
    m.transform_point(vec)
}

pub fn point_to_local_space(
    point: Vector2D,
    heading: Vector2D,
    side: Vector2D,
    pos: Vector2D,
) -> Vector2D {
    Matrix2D::to_local(heading, side, pos).transform_point(point)
}

pub fn vector_to_local_space(vec: Vector2D, heading: Vector2D, side: Vector2D) -> Vector2D {
    Matrix2D::to_local(heading, side, Vector2D::ZERO).transform_point(vec)
}

pub fn rotate_around_origin(v: Vector2D, angle: f64) -> Vector2D {
    let mut m = Matrix2D::identity();
    m.rotate(angle);
    m.transform_point(v)
}
