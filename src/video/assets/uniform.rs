use byteorder::{ByteOrder, LittleEndian};

use crate::math::prelude::{Matrix4, Vector3, Vector4};

/// Declared type of a `UniformVar`. Decides the size of its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniformType {
    Int,
    Float,
    Float2,
    Float3,
    Float4,
    Mat4,
    Mat4Array(usize),
}

impl UniformType {
    /// Size of the raw payload in bytes.
    pub fn size(self) -> usize {
        match self {
            UniformType::Int | UniformType::Float => 4,
            UniformType::Float2 => 8,
            UniformType::Float3 => 12,
            UniformType::Float4 => 16,
            UniformType::Mat4 => 64,
            UniformType::Mat4Array(n) => 64 * n,
        }
    }
}

/// A named uniform variable with its raw little-endian payload.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformVar {
    name: String,
    ty: UniformType,
    data: Vec<u8>,
}

impl UniformVar {
    /// Creates a zero-filled variable sized to `ty`.
    pub fn new<T: Into<String>>(name: T, ty: UniformType) -> Self {
        UniformVar {
            name: name.into(),
            ty,
            data: vec![0; ty.size()],
        }
    }

    pub fn int<T: Into<String>>(name: T, v: i32) -> Self {
        let mut var = UniformVar::new(name, UniformType::Int);
        LittleEndian::write_i32(&mut var.data, v);
        var
    }

    pub fn float<T: Into<String>>(name: T, v: f32) -> Self {
        let mut var = UniformVar::new(name, UniformType::Float);
        LittleEndian::write_f32(&mut var.data, v);
        var
    }

    pub fn vec3<T: Into<String>>(name: T, v: Vector3<f32>) -> Self {
        let mut var = UniformVar::new(name, UniformType::Float3);
        let floats: &[f32; 3] = v.as_ref();
        write_floats(&mut var.data, floats);
        var
    }

    pub fn vec4<T: Into<String>>(name: T, v: Vector4<f32>) -> Self {
        let mut var = UniformVar::new(name, UniformType::Float4);
        let floats: &[f32; 4] = v.as_ref();
        write_floats(&mut var.data, floats);
        var
    }

    pub fn mat4<T: Into<String>>(name: T, m: &Matrix4<f32>) -> Self {
        let mut var = UniformVar::new(name, UniformType::Mat4);
        write_matrix(&mut var.data, m);
        var
    }

    pub fn mat4_array<T: Into<String>>(name: T, ms: &[Matrix4<f32>]) -> Self {
        let mut var = UniformVar::new(name, UniformType::Mat4Array(ms.len()));
        for (i, m) in ms.iter().enumerate() {
            write_matrix(&mut var.data[i * 64..], m);
        }
        var
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> UniformType {
        self.ty
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Replaces type and payload with the ones of `other`, keeping the name.
    pub fn assign(&mut self, other: UniformVar) {
        self.ty = other.ty;
        self.data = other.data;
    }
}

/// Writes the 16 floats of `m` in column-major order.
pub(crate) fn write_matrix(dst: &mut [u8], m: &Matrix4<f32>) {
    let floats: &[f32; 16] = m.as_ref();
    write_floats(dst, floats);
}

fn write_floats(dst: &mut [u8], src: &[f32]) {
    for (i, v) in src.iter().enumerate() {
        LittleEndian::write_f32(&mut dst[i * 4..], *v);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::prelude::*;

    #[test]
    fn payload_size() {
        assert_eq!(UniformVar::int("a", 1).size(), 4);
        assert_eq!(UniformVar::mat4("m", &Matrix4::identity()).size(), 64);

        let ms = [Matrix4::identity(), Matrix4::identity(), Matrix4::identity()];
        let var = UniformVar::mat4_array("ms", &ms);
        assert_eq!(var.ty(), UniformType::Mat4Array(3));
        assert_eq!(var.size(), 192);
    }

    #[test]
    fn column_major() {
        let m = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let var = UniformVar::mat4("m", &m);
        // Translation sits in the fourth column.
        assert_eq!(LittleEndian::read_f32(&var.data()[48..]), 1.0);
        assert_eq!(LittleEndian::read_f32(&var.data()[52..]), 2.0);
        assert_eq!(LittleEndian::read_f32(&var.data()[56..]), 3.0);
        assert_eq!(LittleEndian::read_f32(&var.data()[60..]), 1.0);
    }
}
