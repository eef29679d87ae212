use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Double-precision 2D vector used by every simulation component.
///
/// Screen-space convention: `x` grows to the right, `y` grows downward, so
/// [`Vector2D::perp`] points to the agent's right-hand side when rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    pub fn is_zero(self) -> bool {
        self.x * self.x + self.y * self.y < f64::MIN_POSITIVE
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Rescales the vector to unit length in place. Vectors whose length is at
    /// or below machine epsilon are left untouched.
    pub fn normalize(&mut self) {
        let len = self.length();
        if len > f64::EPSILON {
            self.x /= len;
            self.y /= len;
        }
    }

    pub fn normalized(self) -> Self {
        let mut v = self;
        v.normalize();
        v
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// +1 if `other` is clockwise of this vector on screen (y axis pointing
    /// down), -1 otherwise. Rotating by `angle * sign` turns toward `other`.
    pub fn sign(self, other: Self) -> f64 {
        if self.y * other.x < self.x * other.y {
            1.0
        } else {
            -1.0
        }
    }

    pub fn perp(self) -> Self {
        Self { x: -self.y, y: self.x }
    }

    /// Clamps the length to `max` keeping the direction.
    pub fn truncate(&mut self, max: f64) {
        if self.length() > max {
            self.normalize();
            *self *= max;
        }
    }

    pub fn truncated(self, max: f64) -> Self {
        let mut v = self;
        v.truncate(max);
        v
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    pub fn distance_squared(self, other: Self) -> f64 {
        (other - self).length_squared()
    }

    /// Reflects about a unit normal, as a ball bouncing off a wall.
    pub fn reflect(&mut self, norm: Self) {
        *self += norm.reverse() * (2.0 * self.dot(norm));
    }

    pub fn reverse(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

/// Treats the rectangle `[0, max_x] x [0, max_y]` as a torus.
pub fn wrap_around(pos: &mut Vector2D, max_x: f64, max_y: f64) {
    if pos.x > max_x {
        pos.x = 0.0;
    }
    if pos.x < 0.0 {
        pos.x = max_x;
    }
    if pos.y < 0.0 {
        pos.y = max_y;
    }
    if pos.y > max_y {
        pos.y = 0.0;
    }
}

impl std::ops::Add for Vector2D {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vector2D {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f64> for Vector2D {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

impl std::ops::Mul<Vector2D> for f64 {
    type Output = Vector2D;
    fn mul(self, rhs: Vector2D) -> Self::Output {
        rhs * self
    }
}

impl std::ops::Div<f64> for Vector2D {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self { x: self.x / rhs, y: self.y / rhs }
    }
}

impl std::ops::Neg for Vector2D {
    type Output = Self;
    fn neg(self) -> Self::Output {
        self.reverse()
    }
}

impl std::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl std::ops::MulAssign<f64> for Vector2D {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl std::ops::DivAssign<f64> for Vector2D {
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_leaves_zero_vector_unchanged() {
        let mut v = Vector2D::ZERO;
        v.normalize();
        assert_eq!(v, Vector2D::ZERO);
        assert!(!v.x.is_nan() && !v.y.is_nan());
    }

    #[test]
    fn test_normalize_produces_unit_length() {
        let v = Vector2D::new(3.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_truncate_only_shortens() {
        let mut long = Vector2D::new(10.0, 0.0);
        long.truncate(4.0);
        assert!((long.length() - 4.0).abs() < 1e-12);

        let mut short = Vector2D::new(1.0, 1.0);
        short.truncate(4.0);
        assert_eq!(short, Vector2D::new(1.0, 1.0));
    }

    #[test]
    fn test_perp_is_orthogonal() {
        let v = Vector2D::new(0.3, -2.0);
        assert_eq!(v.dot(v.perp()), 0.0);
        assert_eq!(Vector2D::new(1.0, 0.0).perp(), Vector2D::new(0.0, 1.0));
    }

    #[test]
    fn test_reflect_off_horizontal_wall() {
        let mut v = Vector2D::new(1.0, 1.0);
        v.reflect(Vector2D::new(0.0, -1.0));
        assert!((v.x - 1.0).abs() < 1e-12);
        assert!((v.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sign_distinguishes_rotation_direction() {
        let heading = Vector2D::new(1.0, 0.0);
        assert_eq!(heading.sign(Vector2D::new(0.0, 1.0)), 1.0);
        assert_eq!(heading.sign(Vector2D::new(0.0, -1.0)), -1.0);
    }

    #[test]
    fn test_wrap_around_moves_to_opposite_edge() {
        let mut p = Vector2D::new(101.0, -1.0);
        wrap_around(&mut p, 100.0, 50.0);
        assert_eq!(p, Vector2D::new(0.0, 50.0));
    }
}
