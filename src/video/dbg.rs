//! Wireframe helpers drawn into the debug pass.

use byteorder::{ByteOrder, LittleEndian};

use crate::math::prelude::{Aabb3, Color, Matrix4, Point3, SquareMatrix};

use super::assets::prelude::*;
use super::pass::MatrixType;
use super::service::RenderBackendService;

pub const DBG_PASS: &str = "DbgPass";
pub const DBG_BATCH: &str = "dbgFontBatch";
pub const DBG_LINE_BATCH: &str = "dbgLineBatch";

/// Pairs of box corners, bottom face, top face, then the vertical edges.
const AABB_INDICES: [usize; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, 4, 5, 5, 6, 6, 7, 7, 4, 0, 4, 1, 5, 2, 6, 3, 7,
];

/// Records debug geometry into the `DbgPass` of a `RenderBackendService`.
#[derive(Debug)]
pub struct DbgRenderer {
    color: Color,
    lines: Vec<u8>,
}

impl Default for DbgRenderer {
    fn default() -> Self {
        DbgRenderer::new()
    }
}

impl DbgRenderer {
    pub fn new() -> Self {
        DbgRenderer {
            color: Color::white(),
            lines: Vec::new(),
        }
    }

    /// Sets the color of boxes drawn by `render_aabb`.
    #[inline]
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Draws the edges of `aabb`, transformed by `transform`. Returns the
    /// mesh that has been added to the debug batch.
    pub fn render_aabb(
        &mut self,
        service: &mut RenderBackendService,
        transform: &Matrix4<f32>,
        aabb: &Aabb3,
    ) -> Option<MeshRef> {
        let corners = aabb.to_corners();
        let stride = VertexType::ColorVertex.stride();
        let mut vertices = vec![0; AABB_INDICES.len() * stride];
        for (i, &index) in AABB_INDICES.iter().enumerate() {
            write_vertex(&mut vertices[i * stride..], corners[index], self.color);
        }

        let params = MeshParams {
            vertex_type: VertexType::ColorVertex,
            primitive: MeshPrimitive::Lines,
        };

        let mesh = service.create_mesh(params, vertices);
        if !Self::record(service, DBG_BATCH, transform, &mesh) {
            service.delete_mesh(&mesh);
            return None;
        }

        Some(mesh)
    }

    /// Queues a line segment. Lines are drawn with the next `flush_lines`.
    pub fn add_line(&mut self, v0: Point3<f32>, v1: Point3<f32>, color: Color) {
        let stride = VertexType::ColorVertex.stride();
        let start = self.lines.len();
        self.lines.resize(start + 2 * stride, 0);
        write_vertex(&mut self.lines[start..], v0, color);
        write_vertex(&mut self.lines[start + stride..], v1, color);
    }

    #[inline]
    pub fn num_lines(&self) -> usize {
        self.lines.len() / (2 * VertexType::ColorVertex.stride())
    }

    /// Submits the queued lines as one mesh, and resets the queue.
    pub fn flush_lines(&mut self, service: &mut RenderBackendService) -> Option<MeshRef> {
        if self.lines.is_empty() {
            return None;
        }

        let params = MeshParams {
            vertex_type: VertexType::ColorVertex,
            primitive: MeshPrimitive::Lines,
        };

        let vertices = ::std::mem::replace(&mut self.lines, Vec::new());
        let mesh = service.create_mesh(params, vertices);
        if !Self::record(service, DBG_LINE_BATCH, &Matrix4::identity(), &mesh) {
            service.delete_mesh(&mesh);
            return None;
        }

        Some(mesh)
    }

    #[inline]
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn record(
        service: &mut RenderBackendService,
        batch: &str,
        transform: &Matrix4<f32>,
        mesh: &MeshRef,
    ) -> bool {
        if !service.begin_pass(DBG_PASS) {
            return false;
        }

        if service.begin_render_batch(batch) {
            service.set_matrix(MatrixType::Model, transform);
            service.add_mesh(mesh, 0);
            service.end_render_batch();
        }

        service.end_pass()
    }
}

fn write_vertex(dst: &mut [u8], p: Point3<f32>, color: Color) {
    let v = [p.x, p.y, p.z, color.r, color.g, color.b];
    for (i, f) in v.iter().enumerate() {
        LittleEndian::write_f32(&mut dst[i * 4..], *f);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::settings::Settings;

    fn read_point(bytes: &[u8], vertex: usize) -> [f32; 3] {
        let v = &bytes[vertex * 24..];
        [
            LittleEndian::read_f32(&v[0..]),
            LittleEndian::read_f32(&v[4..]),
            LittleEndian::read_f32(&v[8..]),
        ]
    }

    #[test]
    fn aabb_edges() {
        let mut service = RenderBackendService::new(Settings::headless());
        let mut dbg = DbgRenderer::new();
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));

        let mesh = dbg
            .render_aabb(&mut service, &Matrix4::identity(), &aabb)
            .unwrap();

        assert_eq!(mesh.num_vertices(), 24);
        assert_eq!(mesh.params().primitive, MeshPrimitive::Lines);

        let bytes = mesh.vertices();
        assert_eq!(read_point(&bytes, 0), [0.0, 0.0, 0.0]);
        assert_eq!(read_point(&bytes, 1), [1.0, 0.0, 0.0]);
        // The last edge goes from corner 3 to corner 7.
        assert_eq!(read_point(&bytes, 22), [0.0, 2.0, 0.0]);
        assert_eq!(read_point(&bytes, 23), [0.0, 2.0, 3.0]);

        let pass = service.pass(DBG_PASS).unwrap();
        assert_eq!(pass.batches.len(), 1);
        assert_eq!(pass.batches[0].id, DBG_BATCH);
        assert_eq!(pass.batches[0].meshes.len(), 1);
    }

    #[test]
    fn lines() {
        let mut service = RenderBackendService::new(Settings::headless());
        let mut dbg = DbgRenderer::new();
        assert!(dbg.flush_lines(&mut service).is_none());

        let o = Point3::new(0.0, 0.0, 0.0);
        dbg.add_line(o, Point3::new(1.0, 0.0, 0.0), Color::red());
        dbg.add_line(o, Point3::new(0.0, 1.0, 0.0), Color::green());
        assert_eq!(dbg.num_lines(), 2);

        let mesh = dbg.flush_lines(&mut service).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(dbg.num_lines(), 0);

        dbg.add_line(o, o, Color::blue());
        dbg.clear();
        assert!(dbg.flush_lines(&mut service).is_none());

        let pass = service.pass(DBG_PASS).unwrap();
        assert_eq!(pass.batches[0].id, DBG_LINE_BATCH);
    }

    #[test]
    fn busy_pass() {
        let mut service = RenderBackendService::new(Settings::headless());
        service.begin_pass("RenderPass");

        let mut dbg = DbgRenderer::new();
        let aabb = Aabb3::zero();
        assert!(dbg
            .render_aabb(&mut service, &Matrix4::identity(), &aabb)
            .is_none());
    }
}
