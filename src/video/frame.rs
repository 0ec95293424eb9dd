//! Submit commands and the frame they are queued into.

use std::collections::VecDeque;

use super::assets::prelude::*;
use super::pass::MatrixBuffer;

/// What a `FrameSubmitCmd` updates on the backend side.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    UpdateMatrixes,
    UpdateUniforms,
    UpdateBuffer,
    AddMeshes,
}

/// Owned payload of a `FrameSubmitCmd`, one variant per `UpdateKind`.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameSubmitPayload {
    Matrices(MatrixBuffer),
    Uniform {
        name: String,
        ty: UniformType,
        data: Vec<u8>,
    },
    Buffer(Vec<u8>),
    Mesh {
        data: Vec<u8>,
        num_instances: u32,
        params: MeshParams,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSubmitCmd {
    pub pass_id: String,
    pub batch_id: String,
    pub mesh_id: Option<MeshHandle>,
    pub payload: FrameSubmitPayload,
}

impl FrameSubmitCmd {
    #[inline]
    pub fn kind(&self) -> UpdateKind {
        match self.payload {
            FrameSubmitPayload::Matrices(_) => UpdateKind::UpdateMatrixes,
            FrameSubmitPayload::Uniform { .. } => UpdateKind::UpdateUniforms,
            FrameSubmitPayload::Buffer(_) => UpdateKind::UpdateBuffer,
            FrameSubmitPayload::Mesh { .. } => UpdateKind::AddMeshes,
        }
    }

    /// Size of the encoded payload in bytes.
    pub fn size(&self) -> usize {
        match self.payload {
            FrameSubmitPayload::Matrices(_) => MatrixBuffer::SIZE,
            FrameSubmitPayload::Uniform {
                ref name, ref data, ..
            } => 1 + name.len().min(255) + data.len(),
            FrameSubmitPayload::Buffer(ref data) => data.len(),
            FrameSubmitPayload::Mesh { ref data, .. } => data.len(),
        }
    }

    /// Encodes the payload into its flat byte layout. Uniforms are a length
    /// byte followed by the name and the raw value, with names longer than
    /// 255 bytes truncated.
    pub fn encode(&self) -> Vec<u8> {
        match self.payload {
            FrameSubmitPayload::Matrices(ref m) => m.encode(),
            FrameSubmitPayload::Uniform {
                ref name, ref data, ..
            } => {
                let len = name.len().min(255);
                let mut bytes = Vec::with_capacity(1 + len + data.len());
                bytes.push(len as u8);
                bytes.extend_from_slice(&name.as_bytes()[..len]);
                bytes.extend_from_slice(data);
                bytes
            }
            FrameSubmitPayload::Buffer(ref data) => data.clone(),
            FrameSubmitPayload::Mesh { ref data, .. } => data.clone(),
        }
    }
}

/// Uniform values of one pass, gathered while a frame is committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformBuffer {
    vars: Vec<(String, Vec<u8>)>,
}

impl UniformBuffer {
    pub fn write(&mut self, name: &str, data: &[u8]) {
        match self.vars.iter_mut().find(|v| v.0 == name) {
            Some(v) => {
                v.1.clear();
                v.1.extend_from_slice(data);
            }
            None => self.vars.push((name.to_owned(), data.to_vec())),
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.vars
            .iter()
            .find(|v| v.0 == name)
            .map(|v| v.1.as_slice())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

/// A FIFO of submit commands plus per-pass uniform staging. Two of them live
/// in a `DoubleBuf`, one filled by the service while the render thread
/// consumes the other.
#[derive(Debug, Default)]
pub struct Frame {
    cmds: VecDeque<FrameSubmitCmd>,
    uniform_buffers: Vec<UniformBuffer>,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    /// Drops every queued command and sizes the uniform staging to
    /// `num_passes`.
    pub fn init(&mut self, num_passes: usize) {
        self.cmds.clear();
        self.uniform_buffers.clear();
        self.uniform_buffers
            .resize(num_passes, UniformBuffer::default());
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
        for v in &mut self.uniform_buffers {
            v.clear();
        }
    }

    #[inline]
    pub fn enqueue(&mut self, cmd: FrameSubmitCmd) {
        self.cmds.push_back(cmd);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    #[inline]
    pub fn cmds(&self) -> impl Iterator<Item = &FrameSubmitCmd> {
        self.cmds.iter()
    }

    /// Moves the queued commands out in submission order.
    #[inline]
    pub fn drain(&mut self) -> ::std::collections::vec_deque::Drain<FrameSubmitCmd> {
        self.cmds.drain(..)
    }

    #[inline]
    pub fn uniform_buffer(&self, pass: usize) -> Option<&UniformBuffer> {
        self.uniform_buffers.get(pass)
    }

    #[inline]
    pub fn uniform_buffer_mut(&mut self, pass: usize) -> Option<&mut UniformBuffer> {
        self.uniform_buffers.get_mut(pass)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn uniform(name: &str, data: Vec<u8>) -> FrameSubmitCmd {
        FrameSubmitCmd {
            pass_id: "p1".to_owned(),
            batch_id: "b1".to_owned(),
            mesh_id: None,
            payload: FrameSubmitPayload::Uniform {
                name: name.to_owned(),
                ty: UniformType::Int,
                data,
            },
        }
    }

    #[test]
    fn uniform_encoding() {
        let cmd = uniform("alpha", vec![1, 2, 3, 4]);
        assert_eq!(cmd.kind(), UpdateKind::UpdateUniforms);
        assert_eq!(cmd.size(), 10);
        assert_eq!(cmd.encode(), b"\x05alpha\x01\x02\x03\x04".to_vec());

        let long = "x".repeat(300);
        let cmd = uniform(&long, vec![9]);
        let bytes = cmd.encode();
        assert_eq!(bytes[0], 255);
        assert_eq!(bytes.len(), 1 + 255 + 1);
        assert_eq!(cmd.size(), bytes.len());
    }

    #[test]
    fn fifo() {
        let mut frame = Frame::new();
        frame.init(2);
        frame.enqueue(uniform("a", vec![]));
        frame.enqueue(uniform("b", vec![]));
        frame.uniform_buffer_mut(1).unwrap().write("a", &[1]);

        let names: Vec<_> = frame
            .drain()
            .map(|v| match v.payload {
                FrameSubmitPayload::Uniform { name, .. } => name,
                _ => unreachable!(),
            })
            .collect();

        assert_eq!(names, vec!["a", "b"]);
        assert!(frame.is_empty());
        assert_eq!(frame.uniform_buffer(1).unwrap().get("a"), Some(&[1u8][..]));
        assert!(frame.uniform_buffer(2).is_none());
    }
}
