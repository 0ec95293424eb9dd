//! The render thread. It owns the backend executor and consumes the frames
//! committed by `RenderBackendService`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::errors::*;
use crate::utils::prelude::DoubleBuf;

use super::assets::prelude::Pipeline;
use super::backends::{Viewport, Visitor, VisitorFactory};
use super::errors::Error;
use super::frame::Frame;
use super::pass::PassDesc;
use super::promise::Promise;

pub enum Event {
    InitPasses(Vec<PassDesc>, Pipeline),
    /// The back buffer of the frames is ready to be consumed.
    CommitFrame,
    RenderFrame(Arc<Promise>),
    Resize(Viewport),
    AttachView,
    Stop,
}

impl Event {
    fn name(&self) -> &'static str {
        match *self {
            Event::InitPasses(_, _) => "InitPasses",
            Event::CommitFrame => "CommitFrame",
            Event::RenderFrame(_) => "RenderFrame",
            Event::Resize(_) => "Resize",
            Event::AttachView => "AttachView",
            Event::Stop => "Stop",
        }
    }
}

#[derive(Default)]
struct TaskState {
    running: AtomicBool,
    detached: AtomicBool,
}

/// Marks the task as stopped when the render thread exits, even by a panic.
struct RunningGuard(Arc<TaskState>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Fails the startup if the render thread exits before reporting, e.g. when
/// the factory panics.
struct StartupGuard(Arc<Promise>);

impl Drop for StartupGuard {
    fn drop(&mut self) {
        if !self.0.is_set() {
            self.0.set(Err(format_err!("Render thread exited during startup.")));
        }
    }
}

pub struct RenderTask {
    chan: mpsc::SyncSender<Event>,
    state: Arc<TaskState>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RenderTask {
    /// Spawns the render thread, and blocks until the executor has been built
    /// by `factory` on it. A failed construction stops the thread and is
    /// returned here.
    pub fn spawn(
        factory: VisitorFactory,
        frames: Arc<DoubleBuf<Frame>>,
        capacity: usize,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let state = Arc::new(TaskState::default());
        let ready = Arc::new(Promise::new());

        let handle = {
            let state = state.clone();
            let ready = ready.clone();
            thread::Builder::new()
                .name("RENDER".into())
                .spawn(move || {
                    let ready = StartupGuard(ready);
                    let visitor = match factory() {
                        Ok(visitor) => visitor,
                        Err(err) => {
                            ready.0.set(Err(err));
                            return;
                        }
                    };

                    state.running.store(true, Ordering::SeqCst);
                    let guard = RunningGuard(state);
                    ready.0.set(Ok(()));
                    drop(ready);
                    RenderTask::run(&rx, &frames, &guard.0, visitor);
                })
                .map_err(|err| format_err!("Failed to spawn render thread: {}", err))?
        };

        if let Err(err) = ready.wait() {
            let _ = handle.join();
            return Err(err);
        }

        info!("[RenderTask] render thread is running.");
        Ok(RenderTask {
            chan: tx,
            state,
            handle: Some(handle),
        })
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst) && !self.state.detached.load(Ordering::SeqCst)
    }

    /// Posts `event` to the render thread. Blocks while the channel is full.
    pub fn send(&self, event: Event) -> ::std::result::Result<(), Error> {
        if !self.is_running() {
            return Err(Error::BackendNotRunning);
        }

        self.chan.send(event).map_err(|_| Error::BackendNotRunning)
    }

    /// Detaches the render thread and waits for it to exit. Events still
    /// queued are dropped without reaching the executor.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.state.detached.store(true, Ordering::SeqCst);
            let _ = self.chan.send(Event::Stop);

            if handle.join().is_err() {
                error!("[RenderTask] render thread panicked.");
            }

            info!("[RenderTask] render thread stopped.");
        }
    }

    fn run(
        chan: &mpsc::Receiver<Event>,
        frames: &DoubleBuf<Frame>,
        state: &TaskState,
        mut visitor: Box<dyn Visitor>,
    ) {
        // The first failure since the last rendered frame, reported through
        // the next `RenderFrame`.
        let mut failure: Option<failure::Error> = None;

        while let Ok(event) = chan.recv() {
            let stop = if let Event::Stop = event { true } else { false };
            if !stop && state.detached.load(Ordering::SeqCst) {
                trace!("[RenderTask] discards {} after detaching.", event.name());
                continue;
            }

            let rsp = unsafe {
                match event {
                    Event::InitPasses(passes, pipeline) => {
                        visitor.on_init_passes(&passes, &pipeline)
                    }
                    Event::CommitFrame => {
                        let mut frame = frames.write_back_buf();
                        visitor.on_commit_frame(&mut frame)
                    }
                    Event::RenderFrame(promise) => {
                        let rsp = match failure.take() {
                            Some(err) => Err(err),
                            None => visitor.on_render_frame(),
                        };

                        promise.set(rsp);
                        Ok(())
                    }
                    Event::Resize(viewport) => visitor.on_resize(viewport),
                    Event::AttachView => visitor.on_attach_view(),
                    Event::Stop => break,
                }
            };

            if let Err(err) = rsp {
                error!("[RenderTask] {}", err);
                if failure.is_none() {
                    failure = Some(err);
                }
            }
        }

        if let Err(err) = unsafe { visitor.on_shutdown() } {
            error!("[RenderTask] failed to shutdown backend: {}", err);
        }
    }
}

impl Drop for RenderTask {
    fn drop(&mut self) {
        self.stop();
    }
}
