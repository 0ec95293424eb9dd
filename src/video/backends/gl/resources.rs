//! Bookkeeping of the GL objects owned by `GLVisitor`.
//!
//! `GLResources` never calls into GL itself. The visitor generates or deletes
//! the GL names, the registry hands out typed handles for them, tracks the
//! active binding of every kind and keeps the name lookups of shaders and
//! textures in sync with their lifetime.

use std::collections::HashMap;

use gl::types::*;

use super::super::super::assets::prelude::*;
use super::super::super::errors::{Error, Result};
use crate::utils::prelude::{HandleLike, ObjectPool};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferType {
    Vertex,
    Index,
    Uniform,
}

impl From<BufferType> for GLenum {
    fn from(ty: BufferType) -> Self {
        match ty {
            BufferType::Vertex => gl::ARRAY_BUFFER,
            BufferType::Index => gl::ELEMENT_ARRAY_BUFFER,
            BufferType::Uniform => gl::UNIFORM_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GLBuffer {
    pub id: GLuint,
    pub ty: BufferType,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GLVertexArray {
    pub id: GLuint,
    pub buffer: BufferHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GLShader {
    pub id: GLuint,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GLTexture {
    pub id: GLuint,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GLFrameBuffer {
    pub id: GLuint,
    pub width: u32,
    pub height: u32,
}

/// Objects of one kind, with the currently bound one.
struct Slots<H: HandleLike, T> {
    objects: ObjectPool<H, T>,
    active: Option<H>,
    names: HashMap<String, H>,
    invalid: fn(H) -> Error,
}

impl<H: HandleLike, T> Slots<H, T> {
    fn new(invalid: fn(H) -> Error) -> Self {
        Slots {
            objects: ObjectPool::new(),
            active: None,
            names: HashMap::new(),
            invalid,
        }
    }

    fn create(&mut self, value: T, name: Option<&str>) -> H {
        let handle = self.objects.create(value);
        if let Some(name) = name {
            if let Some(prev) = self.names.insert(name.to_owned(), handle) {
                warn!("Name {} is taken over from {:?} by {:?}.", name, prev, handle);
            }
        }

        handle
    }

    fn get(&self, handle: H) -> Result<&T> {
        self.objects.get(handle).ok_or_else(|| (self.invalid)(handle))
    }

    fn bind(&mut self, handle: H) -> Result<&T> {
        let invalid = self.invalid;
        let v = self.objects.get(handle).ok_or_else(|| invalid(handle))?;
        self.active = Some(handle);
        Ok(v)
    }

    fn release(&mut self, handle: H) -> Result<T> {
        let v = self
            .objects
            .free(handle)
            .ok_or_else(|| (self.invalid)(handle))?;

        if self.active == Some(handle) {
            self.active = None;
        }

        self.names.retain(|_, v| *v != handle);
        Ok(v)
    }

    fn release_all(&mut self) -> Vec<T> {
        self.active = None;
        self.names.clear();
        self.objects.drain().into_iter().map(|v| v.1).collect()
    }

    fn find(&self, name: &str) -> Option<H> {
        self.names.get(name).cloned()
    }
}

pub struct GLResources {
    buffers: Slots<BufferHandle, GLBuffer>,
    vertex_arrays: Slots<VertexArrayHandle, GLVertexArray>,
    shaders: Slots<ShaderHandle, GLShader>,
    textures: Slots<TextureHandle, GLTexture>,
    frame_buffers: Slots<FrameBufferHandle, GLFrameBuffer>,
}

impl Default for GLResources {
    fn default() -> Self {
        GLResources::new()
    }
}

impl GLResources {
    pub fn new() -> Self {
        GLResources {
            buffers: Slots::new(Error::BufferHandleInvalid),
            vertex_arrays: Slots::new(Error::VertexArrayHandleInvalid),
            shaders: Slots::new(Error::ShaderHandleInvalid),
            textures: Slots::new(Error::TextureHandleInvalid),
            frame_buffers: Slots::new(Error::FrameBufferHandleInvalid),
        }
    }

    pub fn create_buffer(&mut self, buffer: GLBuffer) -> BufferHandle {
        self.buffers.create(buffer, None)
    }

    pub fn buffer(&self, handle: BufferHandle) -> Result<&GLBuffer> {
        self.buffers.get(handle)
    }

    pub fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut GLBuffer> {
        self.buffers
            .objects
            .get_mut(handle)
            .ok_or_else(|| Error::BufferHandleInvalid(handle))
    }

    pub fn bind_buffer(&mut self, handle: BufferHandle) -> Result<&GLBuffer> {
        self.buffers.bind(handle)
    }

    pub fn release_buffer(&mut self, handle: BufferHandle) -> Result<GLBuffer> {
        self.buffers.release(handle)
    }

    pub fn release_all_buffers(&mut self) -> Vec<GLBuffer> {
        self.buffers.release_all()
    }

    #[inline]
    pub fn active_buffer(&self) -> Option<BufferHandle> {
        self.buffers.active
    }

    #[inline]
    pub fn num_buffers(&self) -> usize {
        self.buffers.objects.len()
    }

    pub fn create_vertex_array(&mut self, vao: GLVertexArray) -> VertexArrayHandle {
        self.vertex_arrays.create(vao, None)
    }

    pub fn vertex_array(&self, handle: VertexArrayHandle) -> Result<&GLVertexArray> {
        self.vertex_arrays.get(handle)
    }

    pub fn bind_vertex_array(&mut self, handle: VertexArrayHandle) -> Result<&GLVertexArray> {
        self.vertex_arrays.bind(handle)
    }

    pub fn release_vertex_array(&mut self, handle: VertexArrayHandle) -> Result<GLVertexArray> {
        self.vertex_arrays.release(handle)
    }

    pub fn release_all_vertex_arrays(&mut self) -> Vec<GLVertexArray> {
        self.vertex_arrays.release_all()
    }

    #[inline]
    pub fn active_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_arrays.active
    }

    pub fn create_shader(&mut self, shader: GLShader) -> ShaderHandle {
        let name = shader.name.clone();
        self.shaders.create(shader, Some(&name))
    }

    pub fn shader(&self, handle: ShaderHandle) -> Result<&GLShader> {
        self.shaders.get(handle)
    }

    pub fn find_shader(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders.find(name)
    }

    pub fn bind_shader(&mut self, handle: ShaderHandle) -> Result<&GLShader> {
        self.shaders.bind(handle)
    }

    pub fn release_shader(&mut self, handle: ShaderHandle) -> Result<GLShader> {
        self.shaders.release(handle)
    }

    pub fn release_all_shaders(&mut self) -> Vec<GLShader> {
        self.shaders.release_all()
    }

    #[inline]
    pub fn active_shader(&self) -> Option<ShaderHandle> {
        self.shaders.active
    }

    pub fn create_texture(&mut self, texture: GLTexture) -> TextureHandle {
        let name = texture.name.clone();
        self.textures.create(texture, Some(&name))
    }

    pub fn texture(&self, handle: TextureHandle) -> Result<&GLTexture> {
        self.textures.get(handle)
    }

    pub fn find_texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.find(name)
    }

    pub fn bind_texture(&mut self, handle: TextureHandle) -> Result<&GLTexture> {
        self.textures.bind(handle)
    }

    pub fn release_texture(&mut self, handle: TextureHandle) -> Result<GLTexture> {
        self.textures.release(handle)
    }

    pub fn release_all_textures(&mut self) -> Vec<GLTexture> {
        self.textures.release_all()
    }

    #[inline]
    pub fn active_texture(&self) -> Option<TextureHandle> {
        self.textures.active
    }

    pub fn create_frame_buffer(&mut self, fbo: GLFrameBuffer) -> FrameBufferHandle {
        self.frame_buffers.create(fbo, None)
    }

    pub fn frame_buffer(&self, handle: FrameBufferHandle) -> Result<&GLFrameBuffer> {
        self.frame_buffers.get(handle)
    }

    pub fn bind_frame_buffer(&mut self, handle: FrameBufferHandle) -> Result<&GLFrameBuffer> {
        self.frame_buffers.bind(handle)
    }

    pub fn release_frame_buffer(&mut self, handle: FrameBufferHandle) -> Result<GLFrameBuffer> {
        self.frame_buffers.release(handle)
    }

    pub fn release_all_frame_buffers(&mut self) -> Vec<GLFrameBuffer> {
        self.frame_buffers.release_all()
    }

    #[inline]
    pub fn active_frame_buffer(&self) -> Option<FrameBufferHandle> {
        self.frame_buffers.active
    }

    /// Drops the default frame buffer binding.
    #[inline]
    pub fn unbind_frame_buffer(&mut self) {
        self.frame_buffers.active = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn buffer(id: GLuint) -> GLBuffer {
        GLBuffer {
            id,
            ty: BufferType::Vertex,
            size: 0,
        }
    }

    #[test]
    fn buffer_reuse() {
        let mut res = GLResources::new();
        let h1 = res.create_buffer(buffer(1));
        let h2 = res.create_buffer(buffer(2));
        assert_ne!(h1, h2);

        assert_eq!(res.release_buffer(h1).unwrap().id, 1);
        let h3 = res.create_buffer(buffer(3));
        assert_eq!(h3.index(), h1.index());
        assert_ne!(h3, h1);

        assert!(res.buffer(h1).is_err());
        assert_eq!(res.buffer(h3).unwrap().id, 3);
        assert_eq!(res.buffer(h2).unwrap().id, 2);
    }

    #[test]
    fn release_unknown() {
        let mut res = GLResources::new();
        let h = res.create_buffer(buffer(1));
        assert!(res.release_buffer(h).is_ok());

        match res.release_buffer(h) {
            Err(Error::BufferHandleInvalid(v)) => assert_eq!(v, h),
            _ => panic!(),
        }

        assert!(res.release_shader(ShaderHandle::default()).is_err());
    }

    #[test]
    fn binding() {
        let mut res = GLResources::new();
        let h = res.create_buffer(buffer(1));
        res.bind_buffer(h).unwrap();
        assert_eq!(res.active_buffer(), Some(h));

        res.release_buffer(h).unwrap();
        assert_eq!(res.active_buffer(), None);

        let h = res.create_vertex_array(GLVertexArray {
            id: 4,
            buffer: BufferHandle::default(),
        });
        res.bind_vertex_array(h).unwrap();
        assert_eq!(res.release_all_vertex_arrays().len(), 1);
        assert_eq!(res.active_vertex_array(), None);
        assert!(res.vertex_array(h).is_err());
    }

    #[test]
    fn names() {
        let mut res = GLResources::new();
        let t = res.create_texture(GLTexture {
            id: 1,
            name: "albedo".to_owned(),
            width: 4,
            height: 4,
        });

        let s = res.create_shader(GLShader {
            id: 2,
            name: "color".to_owned(),
        });

        assert_eq!(res.find_texture("albedo"), Some(t));
        assert_eq!(res.find_shader("color"), Some(s));

        res.release_texture(t).unwrap();
        assert_eq!(res.find_texture("albedo"), None);

        res.bind_shader(s).unwrap();
        assert_eq!(res.release_all_shaders().len(), 1);
        assert_eq!(res.find_shader("color"), None);
        assert_eq!(res.active_shader(), None);
    }
}
