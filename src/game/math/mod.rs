//! Double-precision 2D math shared by the simulation: vectors, affine
//! matrices, local/world space conversion and segment/circle geometry.

mod geometry;
mod matrix;
mod transform;
mod vec2;

pub use geometry::*;
pub use matrix::Matrix2D;
pub use transform::*;
pub use vec2::{wrap_around, Vector2D};

pub const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;
pub const TWO_PI: f64 = std::f64::consts::TAU;
