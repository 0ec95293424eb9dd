use gl::types::*;

use super::super::super::assets::prelude::*;

impl From<PolygonMode> for GLenum {
    fn from(mode: PolygonMode) -> Self {
        match mode {
            PolygonMode::Point => gl::POINT,
            PolygonMode::Line => gl::LINE,
            PolygonMode::Fill => gl::FILL,
        }
    }
}

impl From<FrontFaceOrder> for GLenum {
    fn from(order: FrontFaceOrder) -> Self {
        match order {
            FrontFaceOrder::Clockwise => gl::CW,
            FrontFaceOrder::CounterClockwise => gl::CCW,
        }
    }
}

impl From<Comparison> for GLenum {
    fn from(cmp: Comparison) -> Self {
        match cmp {
            Comparison::Never => gl::NEVER,
            Comparison::Less => gl::LESS,
            Comparison::LessOrEqual => gl::LEQUAL,
            Comparison::Greater => gl::GREATER,
            Comparison::GreaterOrEqual => gl::GEQUAL,
            Comparison::Equal => gl::EQUAL,
            Comparison::NotEqual => gl::NOTEQUAL,
            Comparison::Always => gl::ALWAYS,
        }
    }
}

impl From<Equation> for GLenum {
    fn from(eq: Equation) -> Self {
        match eq {
            Equation::Add => gl::FUNC_ADD,
            Equation::Subtract => gl::FUNC_SUBTRACT,
            Equation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        }
    }
}

impl From<BlendFactor> for GLenum {
    fn from(factor: BlendFactor) -> Self {
        match factor {
            BlendFactor::Zero => gl::ZERO,
            BlendFactor::One => gl::ONE,
            BlendFactor::Value(BlendValue::SourceColor) => gl::SRC_COLOR,
            BlendFactor::Value(BlendValue::SourceAlpha) => gl::SRC_ALPHA,
            BlendFactor::Value(BlendValue::DestinationColor) => gl::DST_COLOR,
            BlendFactor::Value(BlendValue::DestinationAlpha) => gl::DST_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::SourceColor) => gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha) => gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::DestinationColor) => gl::ONE_MINUS_DST_COLOR,
            BlendFactor::OneMinusValue(BlendValue::DestinationAlpha) => gl::ONE_MINUS_DST_ALPHA,
        }
    }
}

impl From<StencilOp> for GLenum {
    fn from(op: StencilOp) -> Self {
        match op {
            StencilOp::Keep => gl::KEEP,
            StencilOp::Zero => gl::ZERO,
            StencilOp::Replace => gl::REPLACE,
            StencilOp::Increment => gl::INCR,
            StencilOp::Decrement => gl::DECR,
            StencilOp::Invert => gl::INVERT,
        }
    }
}

impl From<TextureFilter> for GLenum {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Nearest => gl::NEAREST,
            TextureFilter::Linear => gl::LINEAR,
        }
    }
}

impl From<TextureWrap> for GLenum {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Repeat => gl::REPEAT,
            TextureWrap::ClampToEdge => gl::CLAMP_TO_EDGE,
            TextureWrap::MirroredRepeat => gl::MIRRORED_REPEAT,
        }
    }
}

impl From<MeshPrimitive> for GLenum {
    fn from(primitive: MeshPrimitive) -> Self {
        match primitive {
            MeshPrimitive::Points => gl::POINTS,
            MeshPrimitive::Lines => gl::LINES,
            MeshPrimitive::LineStrip => gl::LINE_STRIP,
            MeshPrimitive::Triangles => gl::TRIANGLES,
            MeshPrimitive::TriangleStrip => gl::TRIANGLE_STRIP,
        }
    }
}

/// Returns `None` if nothing should be culled.
pub fn cull_face(face: CullFace) -> Option<GLenum> {
    match face {
        CullFace::Nothing => None,
        CullFace::Front => Some(gl::FRONT),
        CullFace::Back => Some(gl::BACK),
        CullFace::FrontAndBack => Some(gl::FRONT_AND_BACK),
    }
}

pub fn clear_mask(bits: ClearBits) -> GLbitfield {
    let mut mask = 0;
    if bits.contains(ClearBits::COLOR) {
        mask |= gl::COLOR_BUFFER_BIT;
    }

    if bits.contains(ClearBits::DEPTH) {
        mask |= gl::DEPTH_BUFFER_BIT;
    }

    if bits.contains(ClearBits::STENCIL) {
        mask |= gl::STENCIL_BUFFER_BIT;
    }

    mask
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clear_bits() {
        assert_eq!(clear_mask(ClearBits::empty()), 0);
        assert_eq!(
            clear_mask(ClearBits::COLOR | ClearBits::STENCIL),
            gl::COLOR_BUFFER_BIT | gl::STENCIL_BUFFER_BIT
        );
        assert_eq!(cull_face(CullFace::Nothing), None);
        assert_eq!(GLenum::from(PolygonMode::Line), gl::LINE);
    }
}
