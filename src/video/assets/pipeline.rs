//! Fixed-function states and the `Pipeline`, an ordered list of passes with a
//! frame bracket on top.

use bitflags::bitflags;

use super::handles::{FrameBufferHandle, ShaderHandle};
use crate::math::prelude::Color;

const PASS_NAMES: [&str; 3] = ["RenderPass", "UiPass", "DbgPass"];

/// Rasterization mode of polygons.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PolygonMode {
    Point,
    Line,
    Fill,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PolygonState {
    pub mode: PolygonMode,
}

impl Default for PolygonState {
    fn default() -> Self {
        PolygonState {
            mode: PolygonMode::Fill,
        }
    }
}

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CullFace {
    Nothing,
    Front,
    Back,
    FrontAndBack,
}

/// Define front- and back-facing polygons.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FrontFaceOrder {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CullState {
    pub face: CullFace,
    pub order: FrontFaceOrder,
}

impl Default for CullState {
    fn default() -> Self {
        CullState {
            face: CullFace::Back,
            order: FrontFaceOrder::CounterClockwise,
        }
    }
}

/// A pixel-wise comparison function.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Comparison {
    Never,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Always,
}

/// Specifies how incoming RGBA values (source) and the RGBA in framebuffer
/// (destination) are combined.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Equation {
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlendValue {
    SourceColor,
    SourceAlpha,
    DestinationColor,
    DestinationAlpha,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlendFactor {
    Zero,
    One,
    Value(BlendValue),
    OneMinusValue(BlendValue),
}

/// Color blending, disabled when `None`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct BlendState {
    pub blend: Option<(Equation, BlendFactor, BlendFactor)>,
}

impl BlendState {
    /// Classic alpha blending.
    pub fn alpha() -> Self {
        BlendState {
            blend: Some((
                Equation::Add,
                BlendFactor::Value(BlendValue::SourceAlpha),
                BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
            )),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SamplerState {
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl Default for SamplerState {
    fn default() -> Self {
        SamplerState {
            filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
        }
    }
}

bitflags! {
    /// Buffers to clear when a pass begins.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClearBits: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ClearState {
    pub bits: ClearBits,
    pub color: Color,
    pub depth: f32,
    pub stencil: i32,
}

impl Default for ClearState {
    fn default() -> Self {
        ClearState {
            bits: ClearBits::COLOR | ClearBits::DEPTH,
            color: Color::black(),
            depth: 1.0,
            stencil: 0,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    Invert,
}

/// Stencil test, disabled when `enabled` is false.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct StencilState {
    pub enabled: bool,
    pub func: Comparison,
    pub reference: i32,
    pub mask: u32,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub pass: StencilOp,
}

impl Default for StencilState {
    fn default() -> Self {
        StencilState {
            enabled: false,
            func: Comparison::Always,
            reference: 0,
            mask: 0xFF,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

/// A struct that encapsulate all the fixed-function states of a pass.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct RenderStates {
    pub polygon: PolygonState,
    pub cull: CullState,
    pub blend: BlendState,
    pub sampler: SamplerState,
    pub clear: ClearState,
    pub stencil: StencilState,
}

/// Where a pass renders into. `None` targets the default frame buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct RenderTarget {
    pub frame_buffer: Option<FrameBufferHandle>,
}

#[derive(Debug, Clone)]
pub struct PipelinePass {
    id: u32,
    target: RenderTarget,
    states: RenderStates,
    shader: Option<ShaderHandle>,
}

impl PartialEq for PipelinePass {
    fn eq(&self, rhs: &Self) -> bool {
        self.id == rhs.id && self.states == rhs.states
    }
}

impl PipelinePass {
    pub fn new(id: u32, shader: Option<ShaderHandle>) -> Self {
        PipelinePass {
            id,
            target: RenderTarget::default(),
            states: RenderStates::default(),
            shader,
        }
    }

    /// Maps the ids of the builtin passes to their names.
    pub fn pass_name_by_id(id: u32) -> Option<&'static str> {
        PASS_NAMES.get(id as usize).cloned()
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set(&mut self, target: RenderTarget, states: RenderStates) {
        self.target = target;
        self.states = states;
    }

    #[inline]
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    #[inline]
    pub fn states(&self) -> &RenderStates {
        &self.states
    }

    #[inline]
    pub fn states_mut(&mut self) -> &mut RenderStates {
        &mut self.states
    }

    #[inline]
    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    #[inline]
    pub fn set_shader(&mut self, shader: Option<ShaderHandle>) {
        self.shader = shader;
    }
}

/// An ordered list of passes. Passes are visited inside a
/// `begin_frame`/`end_frame` bracket, one `begin_pass`/`end_pass` pair at a
/// time.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    passes: Vec<PipelinePass>,
    current: Option<usize>,
    in_frame: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    /// Builds the builtin render, ui and debug passes with default states.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Pipeline::new();
        for id in 0..PASS_NAMES.len() {
            let mut pass = PipelinePass::new(id as u32, None);
            if id > 0 {
                // Overlays are drawn over the scene, without clearing it.
                let states = pass.states_mut();
                states.clear.bits = ClearBits::empty();
                states.blend = BlendState::alpha();
                states.cull.face = CullFace::Nothing;
            }

            pipeline.add_pass(pass);
        }

        pipeline
    }

    #[inline]
    pub fn add_pass(&mut self, pass: PipelinePass) {
        self.passes.push(pass);
    }

    #[inline]
    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn pass(&self, index: usize) -> Option<&PipelinePass> {
        self.passes.get(index)
    }

    #[inline]
    pub fn passes(&self) -> &[PipelinePass] {
        &self.passes
    }

    #[inline]
    pub fn passes_mut(&mut self) -> &mut [PipelinePass] {
        &mut self.passes
    }

    #[inline]
    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    #[inline]
    pub fn current_pass(&self) -> Option<usize> {
        self.current
    }

    /// Enters a frame and returns the number of passes to visit. Returns 0 if
    /// we are in a frame already, or there is nothing to render.
    pub fn begin_frame(&mut self) -> usize {
        if self.in_frame || self.passes.is_empty() {
            return 0;
        }

        self.in_frame = true;
        self.passes.len()
    }

    pub fn begin_pass(&mut self, index: usize) -> Option<&PipelinePass> {
        if !self.in_frame {
            return None;
        }

        let pass = self.passes.get(index)?;
        self.current = Some(index);
        Some(pass)
    }

    /// Leaves the pass at `index`. Fails if we are not in a frame, or `index`
    /// is not the active pass.
    pub fn end_pass(&mut self, index: usize) -> bool {
        if !self.in_frame || self.current != Some(index) {
            return false;
        }

        self.current = None;
        true
    }

    pub fn end_frame(&mut self) {
        self.in_frame = false;
    }

    /// Resets the state machine and drops every pass.
    pub fn clear(&mut self) {
        self.current = None;
        self.in_frame = false;
        self.passes.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pass_names() {
        assert_eq!(PipelinePass::pass_name_by_id(0), Some("RenderPass"));
        assert_eq!(PipelinePass::pass_name_by_id(1), Some("UiPass"));
        assert_eq!(PipelinePass::pass_name_by_id(2), Some("DbgPass"));
        assert_eq!(PipelinePass::pass_name_by_id(3), None);
    }

    #[test]
    fn equality_ignores_shader() {
        let a = PipelinePass::new(0, None);
        let mut b = PipelinePass::new(0, Some(ShaderHandle::default()));
        assert_eq!(a, b);

        b.states_mut().polygon.mode = PolygonMode::Line;
        assert_ne!(a, b);
        assert_ne!(a, PipelinePass::new(1, None));
    }
}
