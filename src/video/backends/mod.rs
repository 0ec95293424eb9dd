//! The backend of renderer, which should be responsible for only one thing:
//! executing the submitted frames with a low-level graphics API.
//!
//! Executors are only ever touched by the render thread, which also builds
//! them from a `VisitorFactory`, since graphics contexts are thread-bound.

pub mod headless;

use super::assets::prelude::Pipeline;
use super::errors::Error;
use super::frame::Frame;
use super::pass::PassDesc;

use crate::errors::*;
use crate::settings::{RenderApi, WindowParams};

/// A rectangle on the render target, in pixels.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<WindowParams> for Viewport {
    fn from(window: WindowParams) -> Self {
        Viewport::new(window.x, window.y, window.width, window.height)
    }
}

pub trait Visitor {
    /// Called once before the first frame, and again after the passes of the
    /// service have been cleared.
    unsafe fn on_init_passes(&mut self, passes: &[PassDesc], pipeline: &Pipeline) -> Result<()>;

    /// Consumes the commands of a committed frame, in FIFO order.
    unsafe fn on_commit_frame(&mut self, frame: &mut Frame) -> Result<()>;

    /// Draws everything that has been committed so far.
    unsafe fn on_render_frame(&mut self) -> Result<()>;

    unsafe fn on_resize(&mut self, viewport: Viewport) -> Result<()>;

    unsafe fn on_attach_view(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases every backend resource. Called on the render thread right
    /// before it exits.
    unsafe fn on_shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Builds a executor on the render thread.
pub type VisitorFactory = Box<dyn FnOnce() -> Result<Box<dyn Visitor>> + Send>;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

/// Selects the executor factory of `api`.
pub fn new(api: RenderApi) -> Result<VisitorFactory> {
    match api {
        RenderApi::OpenGL => new_gl(),
        RenderApi::Vulkan => Err(Error::Requirement("Vulkan".to_owned()).into()),
        RenderApi::Headless => Ok(new_headless()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn new_gl() -> Result<VisitorFactory> {
    Ok(Box::new(|| {
        let visitor = unsafe { self::gl::visitor::GLVisitor::new()? };
        Ok(Box::new(visitor) as Box<dyn Visitor>)
    }))
}

#[cfg(target_arch = "wasm32")]
fn new_gl() -> Result<VisitorFactory> {
    Err(Error::Requirement("OpenGL".to_owned()).into())
}

pub fn new_headless() -> VisitorFactory {
    Box::new(|| Ok(Box::new(self::headless::HeadlessVisitor::new()) as Box<dyn Visitor>))
}
