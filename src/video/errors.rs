use super::assets::prelude::*;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Render backend is not running.")]
    BackendNotRunning,
    #[fail(display = "Timed out after {}ms waiting for frame.", _0)]
    FrameTimeout(u64),
    #[fail(display = "Unknown render api \'{}\'.", _0)]
    UnknownRenderApi(String),
    #[fail(display = "Render backend doesn\'t support {}.", _0)]
    Requirement(String),
    #[fail(display = "{} is invalid.", _0)]
    BufferHandleInvalid(BufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    VertexArrayHandleInvalid(VertexArrayHandle),
    #[fail(display = "{} is invalid.", _0)]
    ShaderHandleInvalid(ShaderHandle),
    #[fail(display = "{} is invalid.", _0)]
    TextureHandleInvalid(TextureHandle),
    #[fail(display = "{} is invalid.", _0)]
    FrameBufferHandleInvalid(FrameBufferHandle),
    #[fail(display = "{} is invalid.", _0)]
    MeshHandleInvalid(MeshHandle),
    #[fail(display = "Failed to create shader, errors: \n{}.", _0)]
    ShaderCreationFailure(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;
