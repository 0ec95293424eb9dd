//! The pass/batch data model recorded by `RenderBackendService`.

use bitflags::bitflags;
use smallvec::SmallVec;

use super::assets::prelude::*;
use super::assets::uniform::write_matrix;
use crate::math::prelude::{Matrix4, SquareMatrix};

bitflags! {
    /// Categories of batch data that changed since the last submission.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u32 {
        const MATRIX_BUFFER  = 1 << 0;
        const UNIFORM_BUFFER = 1 << 1;
        const MESH           = 1 << 2;
        const MESH_UPDATE    = 1 << 3;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatrixType {
    Model,
    View,
    Projection,
}

/// Model, view and projection matrices of a batch.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MatrixBuffer {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Default for MatrixBuffer {
    fn default() -> Self {
        MatrixBuffer {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }
}

impl MatrixBuffer {
    /// Size of the encoded buffer in bytes.
    pub const SIZE: usize = 3 * 64;

    pub fn set(&mut self, ty: MatrixType, m: &Matrix4<f32>) {
        match ty {
            MatrixType::Model => self.model = *m,
            MatrixType::View => self.view = *m,
            MatrixType::Projection => self.projection = *m,
        }
    }

    /// Encodes model, view and projection as column-major little-endian floats.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![0; Self::SIZE];
        write_matrix(&mut bytes[0..64], &self.model);
        write_matrix(&mut bytes[64..128], &self.view);
        write_matrix(&mut bytes[128..192], &self.projection);
        bytes
    }
}

/// The meshes of one `add_mesh`/`add_meshes` call.
#[derive(Debug, Clone)]
pub struct MeshEntry {
    pub meshes: SmallVec<[MeshRef; 4]>,
    pub num_instances: u32,
    pub dirty: bool,
}

#[derive(Debug, Clone)]
pub struct RenderBatchData {
    pub id: String,
    pub matrices: MatrixBuffer,
    pub uniforms: Vec<UniformVar>,
    pub meshes: Vec<MeshEntry>,
    pub update_meshes: Vec<MeshRef>,
    pub dirty: DirtyFlags,
}

impl RenderBatchData {
    pub fn new<T: Into<String>>(id: T) -> Self {
        RenderBatchData {
            id: id.into(),
            matrices: MatrixBuffer::default(),
            uniforms: Vec::new(),
            meshes: Vec::new(),
            update_meshes: Vec::new(),
            dirty: DirtyFlags::empty(),
        }
    }

    #[inline]
    pub fn uniform(&self, name: &str) -> Option<&UniformVar> {
        self.uniforms.iter().find(|v| v.name() == name)
    }

    /// Replaces the uniform with the same name, or appends a new one.
    pub fn upsert_uniform(&mut self, var: UniformVar) {
        match self.uniforms.iter_mut().find(|v| v.name() == var.name()) {
            Some(v) => v.assign(var),
            None => self.uniforms.push(var),
        }

        self.dirty |= DirtyFlags::UNIFORM_BUFFER;
    }
}

#[derive(Debug, Clone)]
pub struct PassData {
    pub id: String,
    pub batches: Vec<RenderBatchData>,
}

impl PassData {
    pub fn new<T: Into<String>>(id: T) -> Self {
        PassData {
            id: id.into(),
            batches: Vec::new(),
        }
    }

    /// Returns the index of the first batch whose id starts with `id`.
    #[inline]
    pub fn find_batch(&self, id: &str) -> Option<usize> {
        self.batches.iter().position(|v| matches(&v.id, id))
    }
}

/// Pass ids with their batch ids, as handed to the backend on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassDesc {
    pub id: String,
    pub batches: Vec<String>,
}

impl<'a> From<&'a PassData> for PassDesc {
    fn from(pass: &'a PassData) -> Self {
        PassDesc {
            id: pass.id.clone(),
            batches: pass.batches.iter().map(|v| v.id.clone()).collect(),
        }
    }
}

/// Ids are compared over the length of the requested one, so a registered
/// `"p1"` is found by `"p1"` and by `"p"`.
#[inline]
pub(crate) fn matches(registered: &str, requested: &str) -> bool {
    registered.as_bytes().starts_with(requested.as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::prelude::Vector3;
    use byteorder::{ByteOrder, LittleEndian};

    #[test]
    fn matrix_buffer_layout() {
        let mut buf = MatrixBuffer::default();
        buf.set(
            MatrixType::View,
            &Matrix4::from_translation(Vector3::new(7.0, 0.0, 0.0)),
        );

        let bytes = buf.encode();
        assert_eq!(bytes.len(), 192);
        assert_eq!(LittleEndian::read_f32(&bytes[0..]), 1.0);
        assert_eq!(LittleEndian::read_f32(&bytes[64 + 48..]), 7.0);
    }

    #[test]
    fn upsert_uniform() {
        let mut batch = RenderBatchData::new("b1");
        batch.upsert_uniform(UniformVar::float("alpha", 0.5));
        batch.upsert_uniform(UniformVar::float("alpha", 1.0));
        batch.upsert_uniform(UniformVar::int("index", 2));

        assert_eq!(batch.uniforms.len(), 2);
        assert_eq!(batch.uniform("alpha"), Some(&UniformVar::float("alpha", 1.0)));
        assert!(batch.dirty.contains(DirtyFlags::UNIFORM_BUFFER));
    }

    #[test]
    fn prefix_lookup() {
        assert!(matches("p1", "p1"));
        assert!(matches("p1", "p"));
        assert!(!matches("p", "p1"));
        assert!(!matches("q1", "p1"));
    }
}
