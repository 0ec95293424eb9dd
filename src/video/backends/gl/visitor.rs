use std::collections::HashMap;
use std::ffi::CString;

use byteorder::{ByteOrder, LittleEndian};
use gl::types::*;

use crate::errors::*;

use super::super::super::assets::prelude::*;
use super::super::super::errors::Error;
use super::super::super::frame::{Frame, FrameSubmitCmd, FrameSubmitPayload};
use super::super::super::pass::{MatrixBuffer, PassDesc};
use super::super::{Viewport, Visitor};
use super::resources::{
    BufferType, GLBuffer, GLFrameBuffer, GLResources, GLShader, GLTexture, GLVertexArray,
};
use super::types;

const COLOR_VERTEX_SHADER: &str = "ColorVertex";

const COLOR_VS: &str = r#"
#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 color;
uniform mat4 Model;
uniform mat4 View;
uniform mat4 Projection;
out vec3 v_Color;
void main() {
    gl_Position = Projection * View * Model * vec4(position, 1.0);
    v_Color = color;
}
"#;

const COLOR_FS: &str = r#"
#version 330 core
in vec3 v_Color;
out vec4 o_Color;
void main() {
    o_Color = vec4(v_Color, 1.0);
}
"#;

/// GPU side of a mesh, shared by every draw that references it.
#[derive(Debug, Clone, Copy)]
struct GLMeshData {
    vao: VertexArrayHandle,
    vbo: BufferHandle,
    num_vertices: usize,
    params: MeshParams,
}

#[derive(Debug, Clone, Copy)]
struct GLDraw {
    mesh: MeshHandle,
    num_instances: u32,
}

#[derive(Debug, Clone)]
struct GLBatch {
    id: String,
    matrices: MatrixBuffer,
    uniforms: Vec<(String, UniformType, Vec<u8>)>,
    draws: Vec<GLDraw>,
}

#[derive(Debug, Clone)]
struct GLPass {
    id: String,
    /// Index of the pipeline pass with the same name.
    slot: Option<usize>,
    batches: Vec<GLBatch>,
}

/// Executes frames with OpenGL 3.3 core. Requires the GL function pointers of
/// a context that is current on the render thread.
pub struct GLVisitor {
    resources: GLResources,
    pipeline: Pipeline,
    passes: Vec<GLPass>,
    meshes: HashMap<MeshHandle, GLMeshData>,
    viewport: Viewport,
    default_shader: ShaderHandle,
}

impl GLVisitor {
    pub unsafe fn new() -> Result<Self> {
        if !gl::GetString::is_loaded() || !gl::GenVertexArrays::is_loaded() {
            return Err(Error::Requirement("a loaded OpenGL 3.3 context".to_owned()).into());
        }

        let mut visitor = GLVisitor {
            resources: GLResources::new(),
            pipeline: Pipeline::new(),
            passes: Vec::new(),
            meshes: HashMap::new(),
            viewport: Viewport::default(),
            default_shader: ShaderHandle::default(),
        };

        visitor.default_shader = visitor.create_shader(COLOR_VERTEX_SHADER, COLOR_VS, COLOR_FS)?;
        Self::reset_render_state()?;
        info!("GLVisitor is ready.");
        Ok(visitor)
    }

    /// Loads the GL function pointers with `loader`, then creates the visitor.
    pub unsafe fn with_loader<F>(loader: F) -> Result<Self>
    where
        F: FnMut(&'static str) -> *const std::os::raw::c_void,
    {
        gl::load_with(loader);
        Self::new()
    }

    /// Compiles and links a program named `name`.
    pub unsafe fn create_shader(&mut self, name: &str, vs: &str, fs: &str) -> Result<ShaderHandle> {
        let vs = Self::compile(gl::VERTEX_SHADER, vs)?;
        let fs = Self::compile(gl::FRAGMENT_SHADER, fs)?;
        let id = Self::link(&[vs, fs]);

        gl::DeleteShader(vs);
        gl::DeleteShader(fs);
        let id = id?;

        check()?;
        Ok(self.resources.create_shader(GLShader {
            id,
            name: name.to_owned(),
        }))
    }

    pub unsafe fn delete_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        if self.resources.active_shader() == Some(handle) {
            gl::UseProgram(0);
        }

        let shader = self.resources.release_shader(handle)?;
        gl::DeleteProgram(shader.id);
        check()
    }

    #[inline]
    pub fn find_shader(&self, name: &str) -> Option<ShaderHandle> {
        self.resources.find_shader(name)
    }

    /// Creates a RGBA8 texture, filled with `bytes` if present.
    pub unsafe fn create_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        sampler: SamplerState,
        bytes: Option<&[u8]>,
    ) -> Result<TextureHandle> {
        if let Some(bytes) = bytes {
            if bytes.len() != (width * height * 4) as usize {
                bail!("Texture {} needs {}x{} RGBA8 texels.", name, width, height);
            }
        }

        let mut id = 0;
        gl::GenTextures(1, &mut id);
        gl::BindTexture(gl::TEXTURE_2D, id);

        let filter: GLenum = sampler.filter.into();
        let wrap: GLenum = sampler.wrap.into();
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap as GLint);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap as GLint);

        let ptr = bytes.map_or(::std::ptr::null(), |v| v.as_ptr() as *const _);
        gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            gl::RGBA8 as GLint,
            width as GLsizei,
            height as GLsizei,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            ptr,
        );

        check()?;
        let handle = self.resources.create_texture(GLTexture {
            id,
            name: name.to_owned(),
            width,
            height,
        });

        self.resources.bind_texture(handle)?;
        Ok(handle)
    }

    pub unsafe fn delete_texture(&mut self, handle: TextureHandle) -> Result<()> {
        let texture = self.resources.release_texture(handle)?;
        gl::DeleteTextures(1, &texture.id);
        check()
    }

    #[inline]
    pub fn find_texture(&self, name: &str) -> Option<TextureHandle> {
        self.resources.find_texture(name)
    }

    /// Creates a frame buffer with `color` as its first color attachment.
    pub unsafe fn create_frame_buffer(&mut self, color: TextureHandle) -> Result<FrameBufferHandle> {
        let texture = self.resources.texture(color)?.clone();

        let mut id = 0;
        gl::GenFramebuffers(1, &mut id);
        gl::BindFramebuffer(gl::FRAMEBUFFER, id);
        gl::FramebufferTexture2D(
            gl::FRAMEBUFFER,
            gl::COLOR_ATTACHMENT0,
            gl::TEXTURE_2D,
            texture.id,
            0,
        );

        let status = gl::CheckFramebufferStatus(gl::FRAMEBUFFER);
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        self.resources.unbind_frame_buffer();

        if status != gl::FRAMEBUFFER_COMPLETE {
            gl::DeleteFramebuffers(1, &id);
            bail!("Frame buffer with {} is incomplete ({:#x}).", color, status);
        }

        check()?;
        Ok(self.resources.create_frame_buffer(GLFrameBuffer {
            id,
            width: texture.width,
            height: texture.height,
        }))
    }

    pub unsafe fn delete_frame_buffer(&mut self, handle: FrameBufferHandle) -> Result<()> {
        if self.resources.active_frame_buffer() == Some(handle) {
            gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        }

        let fbo = self.resources.release_frame_buffer(handle)?;
        gl::DeleteFramebuffers(1, &fbo.id);
        check()
    }
}

impl Visitor for GLVisitor {
    unsafe fn on_init_passes(&mut self, passes: &[PassDesc], pipeline: &Pipeline) -> Result<()> {
        self.pipeline = pipeline.clone();
        self.passes.clear();

        for desc in passes {
            self.pass_mut(&desc.id);
            for batch in &desc.batches {
                self.batch_mut(&desc.id, batch);
            }
        }

        debug!(
            "[GL] init {} passes with {} pipeline passes.",
            self.passes.len(),
            self.pipeline.num_passes()
        );

        Ok(())
    }

    unsafe fn on_commit_frame(&mut self, frame: &mut Frame) -> Result<()> {
        for cmd in frame.drain() {
            self.submit(cmd)?;
        }

        Ok(())
    }

    unsafe fn on_render_frame(&mut self) -> Result<()> {
        self.pipeline.begin_frame();

        for i in 0..self.passes.len() {
            let slot = self.passes[i].slot;
            let pass = match slot {
                Some(v) => self.pipeline.begin_pass(v),
                None => None,
            };

            let (states, target, shader) = match pass {
                Some(pass) => (*pass.states(), *pass.target(), pass.shader()),
                None => (RenderStates::default(), RenderTarget::default(), None),
            };

            self.bind_target(target)?;
            Self::apply_states(&states)?;

            let shader = shader.unwrap_or(self.default_shader);
            let program = self.resources.bind_shader(shader)?.id;
            gl::UseProgram(program);

            for batch in &self.passes[i].batches {
                Self::bind_batch_uniforms(program, batch)?;

                for draw in &batch.draws {
                    let mesh = match self.meshes.get(&draw.mesh) {
                        Some(mesh) => mesh,
                        None => return Err(Error::MeshHandleInvalid(draw.mesh).into()),
                    };

                    let vao = self.resources.bind_vertex_array(mesh.vao)?.id;
                    gl::BindVertexArray(vao);

                    let primitive: GLenum = mesh.params.primitive.into();
                    let count = mesh.num_vertices as GLsizei;
                    if draw.num_instances > 0 {
                        gl::DrawArraysInstanced(primitive, 0, count, draw.num_instances as GLsizei);
                    } else {
                        gl::DrawArrays(primitive, 0, count);
                    }
                }
            }

            if let Some(v) = slot {
                self.pipeline.end_pass(v);
            }
        }

        self.pipeline.end_frame();
        gl::BindVertexArray(0);
        check()
    }

    unsafe fn on_resize(&mut self, viewport: Viewport) -> Result<()> {
        self.viewport = viewport;
        gl::Viewport(
            viewport.x,
            viewport.y,
            viewport.width as GLsizei,
            viewport.height as GLsizei,
        );

        check()
    }

    unsafe fn on_shutdown(&mut self) -> Result<()> {
        gl::BindVertexArray(0);
        gl::UseProgram(0);
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);

        for v in self.resources.release_all_vertex_arrays() {
            gl::DeleteVertexArrays(1, &v.id);
        }

        for v in self.resources.release_all_buffers() {
            gl::DeleteBuffers(1, &v.id);
        }

        for v in self.resources.release_all_shaders() {
            gl::DeleteProgram(v.id);
        }

        for v in self.resources.release_all_textures() {
            gl::DeleteTextures(1, &v.id);
        }

        for v in self.resources.release_all_frame_buffers() {
            gl::DeleteFramebuffers(1, &v.id);
        }

        self.meshes.clear();
        self.passes.clear();
        self.pipeline.clear();
        check()
    }
}

impl GLVisitor {
    fn pass_mut(&mut self, id: &str) -> &mut GLPass {
        let index = match self.passes.iter().position(|v| v.id == id) {
            Some(index) => index,
            None => {
                let slot = self.pipeline.passes().iter().position(|v| {
                    PipelinePass::pass_name_by_id(v.id()).map_or(false, |name| name == id)
                });

                self.passes.push(GLPass {
                    id: id.to_owned(),
                    slot,
                    batches: Vec::new(),
                });

                self.passes.len() - 1
            }
        };

        &mut self.passes[index]
    }

    fn batch_mut(&mut self, pass: &str, id: &str) -> &mut GLBatch {
        let pass = self.pass_mut(pass);
        let index = match pass.batches.iter().position(|v| v.id == id) {
            Some(index) => index,
            None => {
                pass.batches.push(GLBatch {
                    id: id.to_owned(),
                    matrices: MatrixBuffer::default(),
                    uniforms: Vec::new(),
                    draws: Vec::new(),
                });

                pass.batches.len() - 1
            }
        };

        &mut pass.batches[index]
    }

    unsafe fn submit(&mut self, cmd: FrameSubmitCmd) -> Result<()> {
        let FrameSubmitCmd {
            pass_id,
            batch_id,
            mesh_id,
            payload,
        } = cmd;

        match payload {
            FrameSubmitPayload::Matrices(matrices) => {
                self.batch_mut(&pass_id, &batch_id).matrices = matrices;
            }

            FrameSubmitPayload::Uniform { name, ty, data } => {
                let batch = self.batch_mut(&pass_id, &batch_id);
                match batch.uniforms.iter_mut().find(|v| v.0 == name) {
                    Some(v) => {
                        v.1 = ty;
                        v.2 = data;
                    }
                    None => batch.uniforms.push((name, ty, data)),
                }
            }

            FrameSubmitPayload::Buffer(data) => {
                let handle = mesh_id.ok_or_else(|| format_err!("Buffer update without mesh."))?;
                let mesh = self
                    .meshes
                    .get_mut(&handle)
                    .ok_or_else(|| Error::MeshHandleInvalid(handle))?;

                mesh.num_vertices = data.len() / mesh.params.vertex_type.stride();
                Self::upload(&mut self.resources, mesh.vbo, &data)?;
            }

            FrameSubmitPayload::Mesh {
                data,
                num_instances,
                params,
            } => {
                let handle = mesh_id.ok_or_else(|| format_err!("Mesh without handle."))?;
                if let Some(mesh) = self.meshes.get_mut(&handle) {
                    mesh.num_vertices = data.len() / params.vertex_type.stride();
                    Self::upload(&mut self.resources, mesh.vbo, &data)?;
                } else {
                    let mesh = self.create_mesh(params, &data)?;
                    self.meshes.insert(handle, mesh);
                }

                self.batch_mut(&pass_id, &batch_id).draws.push(GLDraw {
                    mesh: handle,
                    num_instances,
                });
            }
        }

        Ok(())
    }

    unsafe fn create_mesh(&mut self, params: MeshParams, data: &[u8]) -> Result<GLMeshData> {
        let mut vbo = 0;
        gl::GenBuffers(1, &mut vbo);
        let vbo = self.resources.create_buffer(GLBuffer {
            id: vbo,
            ty: BufferType::Vertex,
            size: 0,
        });

        Self::upload(&mut self.resources, vbo, data)?;

        let mut vao = 0;
        gl::GenVertexArrays(1, &mut vao);
        gl::BindVertexArray(vao);
        let vao = self.resources.create_vertex_array(GLVertexArray { id: vao, buffer: vbo });
        self.resources.bind_vertex_array(vao)?;

        let stride = params.vertex_type.stride() as GLsizei;
        gl::EnableVertexAttribArray(0);
        gl::VertexAttribPointer(0, 3, gl::FLOAT, gl::FALSE, stride, ::std::ptr::null());

        match params.vertex_type {
            VertexType::ColorVertex => {
                gl::EnableVertexAttribArray(1);
                gl::VertexAttribPointer(1, 3, gl::FLOAT, gl::FALSE, stride, 12 as *const _);
            }
            VertexType::RenderVertex => {
                gl::EnableVertexAttribArray(2);
                gl::VertexAttribPointer(2, 2, gl::FLOAT, gl::FALSE, stride, 12 as *const _);
            }
        }

        check()?;
        Ok(GLMeshData {
            vao,
            vbo,
            num_vertices: data.len() / params.vertex_type.stride(),
            params,
        })
    }

    /// Writes `data` into the buffer, reallocating it when it grows.
    unsafe fn upload(resources: &mut GLResources, handle: BufferHandle, data: &[u8]) -> Result<()> {
        let buffer = resources.bind_buffer(handle)?.clone();
        let target: GLenum = buffer.ty.into();
        gl::BindBuffer(target, buffer.id);

        let size = data.len() as GLsizeiptr;
        if data.len() > buffer.size {
            gl::BufferData(target, size, data.as_ptr() as *const _, gl::DYNAMIC_DRAW);
            resources.buffer_mut(handle)?.size = data.len();
        } else {
            gl::BufferSubData(target, 0, size, data.as_ptr() as *const _);
        }

        check()
    }

    unsafe fn bind_target(&mut self, target: RenderTarget) -> Result<()> {
        match target.frame_buffer {
            Some(handle) => {
                let fbo = self.resources.bind_frame_buffer(handle)?.clone();
                gl::BindFramebuffer(gl::FRAMEBUFFER, fbo.id);
                gl::Viewport(0, 0, fbo.width as GLsizei, fbo.height as GLsizei);
            }
            None => {
                self.resources.unbind_frame_buffer();
                gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
                let vp = self.viewport;
                gl::Viewport(vp.x, vp.y, vp.width as GLsizei, vp.height as GLsizei);
            }
        }

        check()
    }

    unsafe fn reset_render_state() -> Result<()> {
        gl::Disable(gl::CULL_FACE);
        gl::FrontFace(gl::CCW);
        gl::Enable(gl::DEPTH_TEST);
        gl::DepthFunc(gl::LESS);
        gl::Disable(gl::BLEND);
        gl::Disable(gl::STENCIL_TEST);
        gl::PolygonMode(gl::FRONT_AND_BACK, gl::FILL);
        gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        gl::BindFramebuffer(gl::FRAMEBUFFER, 0);
        check()
    }

    unsafe fn apply_states(states: &RenderStates) -> Result<()> {
        gl::PolygonMode(gl::FRONT_AND_BACK, states.polygon.mode.into());

        match types::cull_face(states.cull.face) {
            Some(face) => {
                gl::Enable(gl::CULL_FACE);
                gl::CullFace(face);
            }
            None => gl::Disable(gl::CULL_FACE),
        }

        gl::FrontFace(states.cull.order.into());

        if let Some((equation, src, dst)) = states.blend.blend {
            gl::Enable(gl::BLEND);
            gl::BlendFunc(src.into(), dst.into());
            gl::BlendEquation(equation.into());
        } else {
            gl::Disable(gl::BLEND);
        }

        let stencil = &states.stencil;
        if stencil.enabled {
            gl::Enable(gl::STENCIL_TEST);
            gl::StencilFunc(stencil.func.into(), stencil.reference, stencil.mask);
            gl::StencilOp(
                stencil.fail.into(),
                stencil.depth_fail.into(),
                stencil.pass.into(),
            );
        } else {
            gl::Disable(gl::STENCIL_TEST);
        }

        let clear = &states.clear;
        let mask = types::clear_mask(clear.bits);
        if mask != 0 {
            let c = clear.color;
            gl::ClearColor(c.r, c.g, c.b, c.a);
            gl::ClearDepth(GLdouble::from(clear.depth));
            gl::ClearStencil(clear.stencil);
            gl::Clear(mask);
        }

        check()
    }

    unsafe fn bind_batch_uniforms(program: GLuint, batch: &GLBatch) -> Result<()> {
        let matrices = Self::floats(&batch.matrices.encode());
        Self::bind_matrices(program, "Model", 1, &matrices[0..16])?;
        Self::bind_matrices(program, "View", 1, &matrices[16..32])?;
        Self::bind_matrices(program, "Projection", 1, &matrices[32..48])?;

        for (name, ty, data) in &batch.uniforms {
            let location = Self::uniform_location(program, name)?;
            if location < 0 {
                continue;
            }

            let v = Self::floats(data);
            match *ty {
                UniformType::Int => gl::Uniform1i(location, LittleEndian::read_i32(data)),
                UniformType::Float => gl::Uniform1f(location, v[0]),
                UniformType::Float2 => gl::Uniform2fv(location, 1, v.as_ptr()),
                UniformType::Float3 => gl::Uniform3fv(location, 1, v.as_ptr()),
                UniformType::Float4 => gl::Uniform4fv(location, 1, v.as_ptr()),
                UniformType::Mat4 => gl::UniformMatrix4fv(location, 1, gl::FALSE, v.as_ptr()),
                UniformType::Mat4Array(n) => {
                    gl::UniformMatrix4fv(location, n as GLsizei, gl::FALSE, v.as_ptr())
                }
            }
        }

        check()
    }

    unsafe fn bind_matrices(program: GLuint, name: &str, n: usize, v: &[f32]) -> Result<()> {
        let location = Self::uniform_location(program, name)?;
        if location >= 0 {
            gl::UniformMatrix4fv(location, n as GLsizei, gl::FALSE, v.as_ptr());
        }

        Ok(())
    }

    unsafe fn uniform_location(program: GLuint, name: &str) -> Result<GLint> {
        let c_name = CString::new(name.as_bytes())
            .map_err(|_| format_err!("Uniform name {:?} contains a nul byte.", name))?;
        Ok(gl::GetUniformLocation(program, c_name.as_ptr()))
    }

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks(4)
            .filter(|v| v.len() == 4)
            .map(LittleEndian::read_f32)
            .collect()
    }

    unsafe fn compile(shader: GLenum, src: &str) -> Result<GLuint> {
        let shader = gl::CreateShader(shader);
        let c_str = CString::new(src.as_bytes())
            .map_err(|_| format_err!("Shader source contains a nul byte."))?;
        gl::ShaderSource(shader, 1, &c_str.as_ptr(), ::std::ptr::null());
        gl::CompileShader(shader);

        let mut status = GLint::from(gl::FALSE);
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let mut len = 0;
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetShaderInfoLog(
                shader,
                len,
                ::std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );

            gl::DeleteShader(shader);
            let log = String::from_utf8_lossy(&buf).trim_end_matches('\0').to_owned();
            Err(Error::ShaderCreationFailure(log).into())
        } else {
            Ok(shader)
        }
    }

    unsafe fn link(shaders: &[GLuint]) -> Result<GLuint> {
        let program = gl::CreateProgram();
        for shader in shaders {
            gl::AttachShader(program, *shader)
        }

        gl::LinkProgram(program);

        let mut status = GLint::from(gl::FALSE);
        gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);

        if status != GLint::from(gl::TRUE) {
            let mut len: GLint = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            let mut buf = vec![0u8; len.max(1) as usize];
            gl::GetProgramInfoLog(
                program,
                len,
                ::std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut GLchar,
            );

            gl::DeleteProgram(program);
            let log = String::from_utf8_lossy(&buf).trim_end_matches('\0').to_owned();
            Err(Error::ShaderCreationFailure(log).into())
        } else {
            Ok(program)
        }
    }
}

unsafe fn check() -> Result<()> {
    match gl::GetError() {
        gl::NO_ERROR => Ok(()),

        gl::INVALID_ENUM => {
            bail!("[GL] An unacceptable value is specified for an enumerated argument.")
        }

        gl::INVALID_VALUE => bail!("[GL] A numeric argument is out of range."),

        gl::INVALID_OPERATION => {
            bail!("[GL] The specified operation is not allowed in the current state.")
        }

        gl::INVALID_FRAMEBUFFER_OPERATION => bail!(
            "[GL] The command is trying to render to or read from an incomplete framebuffer."
        ),

        gl::OUT_OF_MEMORY => bail!("[GL] There is not enough memory left to execute the command."),
        _ => bail!("[GL] Oops, Unknown OpenGL error."),
    }
}
