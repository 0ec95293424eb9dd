pub mod handles;
pub mod mesh;
pub mod pipeline;
pub mod uniform;

pub mod prelude {
    pub use super::handles::{
        BufferHandle, FrameBufferHandle, ShaderHandle, TextureHandle, VertexArrayHandle,
    };

    pub use super::mesh::{Mesh, MeshHandle, MeshParams, MeshPrimitive, MeshRef, VertexType};

    pub use super::pipeline::{
        BlendFactor, BlendState, BlendValue, ClearBits, ClearState, Comparison, CullFace,
        CullState, Equation, FrontFaceOrder, Pipeline, PipelinePass, PolygonMode, PolygonState,
        RenderStates, RenderTarget, SamplerState, StencilOp, StencilState, TextureFilter,
        TextureWrap,
    };

    pub use super::uniform::{UniformType, UniformVar};
}
