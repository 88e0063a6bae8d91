use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// A value pushed to a loose (non-block) uniform of the bound program.
///
/// Matrices are uploaded column-major without transposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Int(i32),
    IntArray(&'a [i32]),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Int(_) => "int",
            UniformValue::IntArray(_) => "int[]",
            UniformValue::Float(_) => "float",
            UniformValue::Float2(_) => "vec2",
            UniformValue::Float3(_) => "vec3",
            UniformValue::Float4(_) => "vec4",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
        }
    }
}

impl From<i32> for UniformValue<'_> {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl<'a> From<&'a [i32]> for UniformValue<'a> {
    fn from(values: &'a [i32]) -> Self {
        UniformValue::IntArray(values)
    }
}

impl From<f32> for UniformValue<'_> {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vec2> for UniformValue<'_> {
    fn from(value: Vec2) -> Self {
        UniformValue::Float2(value)
    }
}

impl From<Vec3> for UniformValue<'_> {
    fn from(value: Vec3) -> Self {
        UniformValue::Float3(value)
    }
}

impl From<Vec4> for UniformValue<'_> {
    fn from(value: Vec4) -> Self {
        UniformValue::Float4(value)
    }
}

impl From<Mat3> for UniformValue<'_> {
    fn from(value: Mat3) -> Self {
        UniformValue::Mat3(value)
    }
}

impl From<Mat4> for UniformValue<'_> {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}
