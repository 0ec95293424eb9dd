use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::super::assets::prelude::Pipeline;
use super::super::frame::Frame;
use super::super::pass::PassDesc;
use super::{Viewport, Visitor};

use crate::errors::*;

/// Counters of the work a `HeadlessVisitor` has been handed.
#[derive(Debug, Default)]
pub struct HeadlessStats {
    pub inits: AtomicUsize,
    pub commands: AtomicUsize,
    pub frames: AtomicUsize,
    pub resizes: AtomicUsize,
}

impl HeadlessStats {
    #[inline]
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// A executor that draws nothing. It drops every command it receives and only
/// keeps count of them.
pub struct HeadlessVisitor {
    stats: Arc<HeadlessStats>,
}

impl Default for HeadlessVisitor {
    fn default() -> Self {
        HeadlessVisitor::new()
    }
}

impl HeadlessVisitor {
    pub fn new() -> Self {
        HeadlessVisitor {
            stats: Arc::new(HeadlessStats::default()),
        }
    }

    /// Creates a visitor which reports into the shared `stats`.
    pub fn with_stats(stats: Arc<HeadlessStats>) -> Self {
        HeadlessVisitor { stats }
    }
}

impl Visitor for HeadlessVisitor {
    unsafe fn on_init_passes(&mut self, passes: &[PassDesc], _: &Pipeline) -> Result<()> {
        trace!("[Headless] init {} passes.", passes.len());
        self.stats.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    unsafe fn on_commit_frame(&mut self, frame: &mut Frame) -> Result<()> {
        let n = frame.drain().count();
        self.stats.commands.fetch_add(n, Ordering::SeqCst);
        Ok(())
    }

    unsafe fn on_render_frame(&mut self) -> Result<()> {
        self.stats.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    unsafe fn on_resize(&mut self, viewport: Viewport) -> Result<()> {
        trace!("[Headless] resize to {:?}.", viewport);
        self.stats.resizes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
