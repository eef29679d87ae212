use super::Vector2D;

/// 3x3 affine transform in row-vector form: a point `(x, y, 1)` multiplies the
/// matrix from the left, so translation lives in the third row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix2D {
    m: [[f64; 3]; 3],
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix2D {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    fn multiply(&mut self, rhs: &[[f64; 3]; 3]) {
        let a = self.m;
        let mut out = [[0.0; 3]; 3];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = a[row][0] * rhs[0][col] + a[row][1] * rhs[1][col] + a[row][2] * rhs[2][col];
            }
        }
        self.m = out;
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        self.multiply(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [x, y, 1.0]]);
        self
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.multiply(&[[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]]);
        self
    }

    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        let (sin, cos) = angle.sin_cos();
        self.multiply(&[[cos, sin, 0.0], [-sin, cos, 0.0], [0.0, 0.0, 1.0]]);
        self
    }

    /// Rotates so the local x axis maps onto `heading` and the local y axis
    /// onto `side`.
    pub fn rotate_basis(&mut self, heading: Vector2D, side: Vector2D) -> &mut Self {
        self.multiply(&[
            [heading.x, heading.y, 0.0],
            [side.x, side.y, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        self
    }

    /// Builds the inverse of a heading/side/position frame directly, without
    /// a general inversion.
    pub fn to_local(heading: Vector2D, side: Vector2D, pos: Vector2D) -> Self {
        Self {
            m: [
                [heading.x, side.x, 0.0],
                [heading.y, side.y, 0.0],
                [-pos.dot(heading), -pos.dot(side), 1.0],
            ],
        }
    }

    pub fn transform_point(&self, p: Vector2D) -> Vector2D {
        let m = &self.m;
        Vector2D::new(
            m[0][0] * p.x + m[1][0] * p.y + m[2][0],
            m[0][1] * p.x + m[1][1] * p.y + m[2][1],
        )
    }

    pub fn transform_points(&self, points: &mut [Vector2D]) {
        for p in points.iter_mut() {
            *p = self.transform_point(*p);
        }
    }
}
