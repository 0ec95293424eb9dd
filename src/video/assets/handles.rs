//! Typed handles of the resources owned by a backend executor.

impl_handle!(BufferHandle);
impl_handle!(VertexArrayHandle);
impl_handle!(ShaderHandle);
impl_handle!(TextureHandle);
impl_handle!(FrameBufferHandle);
