/// Row-major 4x4 matrix; translation lives in the last column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4d {
    pub data: [[f64; 4]; 4],
}

impl Matrix4d {
    pub const IDENTITY: Self = Self {
        data: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn new(data: [[f64; 4]; 4]) -> Self {
        Self { data }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a matrix from glTF's column-major `matrix` property.
    pub fn from_column_major(columns: [[f32; 4]; 4]) -> Self {
        let mut data = [[0.0; 4]; 4];
        for (col, column) in columns.iter().enumerate() {
            for (row, &value) in column.iter().enumerate() {
                data[row][col] = value as f64;
            }
        }
        Self { data }
    }

    /// Composes `T * R * S`.
    pub fn from_trs(translation: Vector3d, rotation: Quaterniond, scale: Vector3d) -> Self {
        let rotation = rotation.rotation_rows();
        let scale = [scale.x, scale.y, scale.z];
        let mut data = Self::IDENTITY.data;
        for row in 0..3 {
            for col in 0..3 {
                data[row][col] = rotation[row][col] * scale[col];
            }
        }
        data[0][3] = translation.x;
        data[1][3] = translation.y;
        data[2][3] = translation.z;
        Self { data }
    }

    pub fn translation(&self) -> Vector3d {
        Vector3d::new(self.data[0][3], self.data[1][3], self.data[2][3])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn transform_point(&self, p: Vector3d) -> Vector3d {
        let v = [p.x, p.y, p.z, 1.0];
        let row = |r: usize| self.data[r].iter().zip(v).map(|(a, b)| a * b).sum::<f64>();
        Vector3d::new(row(0), row(1), row(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Vector3d {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0] as f64, v[1] as f64, v[2] as f64)
    }
}

/// Unit quaternion in glTF's `[x, y, z, w]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaterniond {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaterniond {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn from_xyzw(v: [f32; 4]) -> Self {
        Self { x: v[0] as f64, y: v[1] as f64, z: v[2] as f64, w: v[3] as f64 }
    }

    fn rotation_rows(&self) -> [[f64; 3]; 3] {
        let Self { x, y, z, w } = *self;
        [
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - z * w), 2.0 * (x * z + y * w)],
            [2.0 * (x * y + z * w), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - x * w)],
            [2.0 * (x * z - y * w), 2.0 * (y * z + x * w), 1.0 - 2.0 * (x * x + y * y)],
        ]
    }
}

/// A node transform the way glTF declares it: a full matrix, or translation,
/// rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrsMatrix {
    Matrix(Matrix4d),
    Decomposed {
        translation: Vector3d,
        rotation: Quaterniond,
        scale: Vector3d,
    },
}

impl Default for TrsMatrix {
    fn default() -> Self {
        Self::from_translation(Vector3d::ZERO)
    }
}

impl TrsMatrix {
    pub fn from_translation(translation: Vector3d) -> Self {
        Self::Decomposed { translation, rotation: Quaterniond::IDENTITY, scale: Vector3d::ONE }
    }

    pub fn translation(&self) -> Vector3d {
        match self {
            Self::Matrix(m) => m.translation(),
            Self::Decomposed { translation, .. } => *translation,
        }
    }

    pub fn to_matrix(&self) -> Matrix4d {
        match *self {
            Self::Matrix(m) => m,
            Self::Decomposed { translation, rotation, scale } => Matrix4d::from_trs(translation, rotation, scale),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.to_matrix().is_identity()
    }
}
