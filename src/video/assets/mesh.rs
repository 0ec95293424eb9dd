use std::sync::{Arc, RwLock};

impl_handle!(MeshHandle);

/// Vertex layouts understood by the backends.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexType {
    /// Position and color, both `vec3`.
    ColorVertex,
    /// Position `vec3` and texture coordinate `vec2`.
    RenderVertex,
}

impl VertexType {
    /// Stride of one vertex in bytes.
    pub fn stride(self) -> usize {
        match self {
            VertexType::ColorVertex => 24,
            VertexType::RenderVertex => 20,
        }
    }
}

/// Defines how the input vertex data is used to assemble primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshPrimitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MeshParams {
    pub vertex_type: VertexType,
    pub primitive: MeshPrimitive,
}

impl Default for MeshParams {
    fn default() -> Self {
        MeshParams {
            vertex_type: VertexType::ColorVertex,
            primitive: MeshPrimitive::Triangles,
        }
    }
}

/// Vertex data owned by the scene side. Batches hold `MeshRef`s and copy the
/// bytes into submit commands whenever the mesh is dirty.
#[derive(Debug)]
pub struct Mesh {
    handle: MeshHandle,
    params: MeshParams,
    vertices: RwLock<Vec<u8>>,
}

pub type MeshRef = Arc<Mesh>;

impl Mesh {
    pub fn new(handle: MeshHandle, params: MeshParams, vertices: Vec<u8>) -> Self {
        Mesh {
            handle,
            params,
            vertices: RwLock::new(vertices),
        }
    }

    #[inline]
    pub fn handle(&self) -> MeshHandle {
        self.handle
    }

    #[inline]
    pub fn params(&self) -> MeshParams {
        self.params
    }

    /// Returns a copy of the current vertex bytes.
    pub fn vertices(&self) -> Vec<u8> {
        self.vertices.read().unwrap().clone()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.read().unwrap().len() / self.params.vertex_type.stride()
    }

    /// Replaces the vertex bytes in place. Call `update_mesh` on the service
    /// afterwards to push them to the backend.
    pub fn update_vertices(&self, vertices: Vec<u8>) {
        *self.vertices.write().unwrap() = vertices;
    }
}
