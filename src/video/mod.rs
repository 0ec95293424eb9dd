//! The render backend.
//!
//! Scene code records passes and batches into a `RenderBackendService` on its
//! own thread. Once per tick the changes are committed as `FrameSubmitCmd`s into
//! a double-buffered `Frame`, and a dedicated "RENDER" thread hands them to a
//! backend executor (`Visitor`), which owns every graphics API object.

pub mod assets;
pub mod backends;
pub mod dbg;
pub mod errors;
pub mod frame;
pub mod pass;
pub mod promise;
pub mod service;
pub mod task;

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::backends::headless::{HeadlessStats, HeadlessVisitor};
    pub use super::backends::{Viewport, Visitor, VisitorFactory};
    pub use super::dbg::DbgRenderer;
    pub use super::frame::{Frame, FrameSubmitCmd, FrameSubmitPayload, UpdateKind};
    pub use super::pass::{DirtyFlags, MatrixBuffer, MatrixType, PassDesc};
    pub use super::promise::Promise;
    pub use super::service::RenderBackendService;
}
