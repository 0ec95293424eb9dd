//! The scene side of the render backend.
//!
//! `RenderBackendService` records passes and batches, keeps track of what
//! changed since the last tick and turns exactly those changes into submit
//! commands. Commands are queued into the front `Frame`, which is swapped and
//! handed to the render thread once per `on_update`.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::*;
use crate::math::prelude::Matrix4;
use crate::settings::{DirtyDispatch, Settings};
use crate::utils::prelude::{DoubleBuf, HandlePool};

use super::assets::prelude::*;
use super::backends::{self, Viewport, VisitorFactory};
use super::errors::Error;
use super::frame::{Frame, FrameSubmitCmd, FrameSubmitPayload};
use super::pass::{self, DirtyFlags, MatrixType, MeshEntry, PassData, PassDesc, RenderBatchData};
use super::promise::Promise;
use super::task::{Event, RenderTask};

/// Name of the pass that adopts batches recorded outside of any pass.
pub const DEFAULT_PASS: &str = "defaultPass";

/// The pass or batch being recorded. Either one that has been registered
/// before, or a new one that gets registered when it ends.
enum Recording<T> {
    Registered(usize),
    Fresh(T),
}

pub struct RenderBackendService {
    settings: Settings,
    frames: Arc<DoubleBuf<Frame>>,
    task: Option<RenderTask>,
    pipeline: Pipeline,

    passes: Vec<PassData>,
    pass: Option<Recording<PassData>>,
    batch: Option<Recording<RenderBatchData>>,

    meshes: HandlePool<MeshHandle>,
    frame_created: bool,
    dirty: bool,
    /// The frame handed to the render thread that hasn't been drawn yet.
    pending: Option<Arc<Promise>>,
}

impl RenderBackendService {
    pub fn new(settings: Settings) -> Self {
        let mut pipeline = Pipeline::default_pipeline();
        if let Some(pass) = pipeline.passes_mut().first_mut() {
            pass.states_mut().clear.color = settings.clear_color.into();
        }

        RenderBackendService {
            settings,
            frames: Arc::new(DoubleBuf::default()),
            task: None,
            pipeline,

            passes: Vec::new(),
            pass: None,
            batch: None,

            meshes: HandlePool::new(),
            frame_created: false,
            dirty: false,
            pending: None,
        }
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Starts the render thread with the executor selected by
    /// `Settings::render_api`.
    pub fn open(&mut self) -> Result<()> {
        let api = self.settings.render_api()?;
        info!("[RenderBackendService] opens with {:?} backend.", api);
        let factory = backends::new(api)?;
        self.open_with(factory)
    }

    /// Starts the render thread with a custom executor.
    pub fn open_with(&mut self, factory: VisitorFactory) -> Result<()> {
        if self.task.is_some() {
            warn!("[RenderBackendService] has been opened already.");
            return Ok(());
        }

        let task = RenderTask::spawn(
            factory,
            self.frames.clone(),
            self.settings.channel_capacity,
        )?;

        self.task = Some(task);
        self.frame_created = false;
        self.pending = None;

        let viewport = self.settings.window.into();
        self.send(Event::Resize(viewport))
    }

    /// Stops the render thread. Events which have not been consumed yet are
    /// discarded.
    pub fn on_close(&mut self) {
        self.pending = None;
        if let Some(mut task) = self.task.take() {
            task.stop();
            info!("[RenderBackendService] closed.");
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|v| v.is_running()).unwrap_or(false)
    }

    /// Returns true if anything has been recorded since the last committed
    /// frame.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Replaces the pipeline. It is handed to the backend with the next
    /// `InitPasses`.
    pub fn set_pipeline(&mut self, pipeline: Pipeline) {
        self.pipeline = pipeline;
        self.frame_created = false;
    }

    #[inline]
    pub fn passes(&self) -> &[PassData] {
        &self.passes
    }

    /// Finds a registered pass, with the same prefix rule as `begin_pass`.
    pub fn pass(&self, id: &str) -> Option<&PassData> {
        self.passes.iter().find(|v| pass::matches(&v.id, id))
    }

    #[inline]
    pub fn is_pass_active(&self) -> bool {
        self.pass.is_some()
    }

    #[inline]
    pub fn is_batch_active(&self) -> bool {
        self.batch.is_some()
    }

    /// Allocates a handle and wraps `vertices` into a shared mesh.
    pub fn create_mesh(&mut self, params: MeshParams, vertices: Vec<u8>) -> MeshRef {
        let handle = self.meshes.create();
        Arc::new(Mesh::new(handle, params, vertices))
    }

    /// Releases the handle of `mesh`. Entries that still refer to it keep
    /// their copy alive.
    pub fn delete_mesh(&mut self, mesh: &MeshRef) -> bool {
        self.meshes.free(mesh.handle())
    }

    /// Starts recording the pass `id`. Fails if another pass is being
    /// recorded.
    pub fn begin_pass(&mut self, id: &str) -> bool {
        if self.pass.is_some() {
            warn!("[RenderBackendService] begin_pass({}) while a pass is active.", id);
            return false;
        }

        self.open_pass(id);
        true
    }

    pub fn begin_render_batch(&mut self, id: &str) -> bool {
        if self.batch.is_some() {
            warn!("[RenderBackendService] begin_render_batch({}) while a batch is active.", id);
            return false;
        }

        let recording = match self.active_pass() {
            Some(pass) => match pass.find_batch(id) {
                Some(index) => Recording::Registered(index),
                None => Recording::Fresh(RenderBatchData::new(id)),
            },
            None => {
                warn!("[RenderBackendService] begin_render_batch({}) without a pass.", id);
                return false;
            }
        };

        self.batch = Some(recording);
        true
    }

    pub fn set_matrix(&mut self, ty: MatrixType, m: &Matrix4<f32>) {
        if let Some(batch) = self.batch_mut("set_matrix") {
            batch.matrices.set(ty, m);
            batch.dirty |= DirtyFlags::MATRIX_BUFFER;
        }
    }

    /// Sets a named `mat4` uniform.
    pub fn set_matrix_by_name(&mut self, name: &str, m: &Matrix4<f32>) {
        if let Some(batch) = self.batch_mut("set_matrix_by_name") {
            batch.upsert_uniform(UniformVar::mat4(name, m));
        }
    }

    pub fn set_matrix_array(&mut self, name: &str, ms: &[Matrix4<f32>]) {
        if let Some(batch) = self.batch_mut("set_matrix_array") {
            batch.upsert_uniform(UniformVar::mat4_array(name, ms));
        }
    }

    pub fn set_uniform(&mut self, var: UniformVar) {
        if let Some(batch) = self.batch_mut("set_uniform") {
            batch.upsert_uniform(var);
        }
    }

    /// Adds `mesh` to the active batch as a new entry.
    pub fn add_mesh(&mut self, mesh: &MeshRef, num_instances: u32) {
        self.add_meshes(&[mesh.clone()], num_instances);
    }

    pub fn add_meshes(&mut self, meshes: &[MeshRef], num_instances: u32) {
        if meshes.is_empty() {
            warn!("[RenderBackendService] add_meshes with no meshes.");
            return;
        }

        if let Some(batch) = self.batch_mut("add_meshes") {
            batch.meshes.push(MeshEntry {
                meshes: meshes.iter().cloned().collect(),
                num_instances,
                dirty: true,
            });

            batch.dirty |= DirtyFlags::MESH;
        }
    }

    /// Queues the current vertices of `mesh` as an in-place update. A mesh is
    /// queued at most once per frame.
    pub fn update_mesh(&mut self, mesh: &MeshRef) {
        if let Some(batch) = self.batch_mut("update_mesh") {
            if !batch.update_meshes.iter().any(|v| v.handle() == mesh.handle()) {
                batch.update_meshes.push(mesh.clone());
            }

            batch.dirty |= DirtyFlags::MESH_UPDATE;
        }
    }

    /// Finishes the active batch. A batch recorded outside of any pass is
    /// adopted by `DEFAULT_PASS`, which stays active afterwards.
    pub fn end_render_batch(&mut self) -> bool {
        let batch = match self.batch.take() {
            Some(batch) => batch,
            None => {
                warn!("[RenderBackendService] end_render_batch without a batch.");
                return false;
            }
        };

        if self.pass.is_none() {
            self.open_pass(DEFAULT_PASS);
        }

        if let Recording::Fresh(batch) = batch {
            if let Some(pass) = self.active_pass_mut() {
                if pass.batches.iter().any(|v| v.id == batch.id) {
                    debug!(
                        "[RenderBackendService] batch {} has been registered in {} already.",
                        batch.id, pass.id
                    );
                } else {
                    pass.batches.push(batch);
                }
            }
        }

        true
    }

    /// Finishes the active pass, and registers it if it's new.
    pub fn end_pass(&mut self) -> bool {
        let pass = match self.pass.take() {
            Some(pass) => pass,
            None => {
                warn!("[RenderBackendService] end_pass without a pass.");
                return false;
            }
        };

        if self.batch.take().is_some() {
            warn!("[RenderBackendService] end_pass drops an unfinished batch.");
        }

        if let Recording::Fresh(pass) = pass {
            if !self.passes.iter().any(|v| v.id == pass.id) {
                self.passes.push(pass);
            }
        }

        true
    }

    /// Drops every pass. The new pass list is sent to the backend with the
    /// next update.
    pub fn clear_passes(&mut self) {
        self.passes.clear();
        self.pass = None;
        self.batch = None;
        self.frame_created = false;
        self.dirty = true;
    }

    /// Resizes the viewport of the backend, if `behaviour.resize_viewport` is
    /// enabled.
    pub fn resize(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        if !self.settings.behaviour.resize_viewport {
            return Ok(());
        }

        self.send(Event::Resize(Viewport::new(x, y, width, height)))
    }

    pub fn attach_view(&mut self) -> Result<()> {
        self.send(Event::AttachView)
    }

    /// Commits the recorded changes as the next frame and blocks until the
    /// render thread has drawn it.
    ///
    /// A frame that timed out is still owned by the render thread. Until it
    /// has been drawn, `on_update` keeps failing with `FrameTimeout` and
    /// leaves the recorded changes untouched.
    pub fn on_update(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(Error::BackendNotRunning.into());
        }

        if let Some(promise) = self.pending.take() {
            match self.wait(&promise) {
                Err(Error::FrameTimeout(ms)) => {
                    self.pending = Some(promise);
                    return Err(Error::FrameTimeout(ms).into());
                }
                Err(err) => return Err(err.into()),
                Ok(rsp) => {
                    if let Err(err) = rsp {
                        warn!("[RenderBackendService] late frame failed: {}", err);
                    }
                }
            }
        }

        if !self.frame_created {
            let passes = self.passes.iter().map(PassDesc::from).collect();
            self.send(Event::InitPasses(passes, self.pipeline.clone()))?;
            self.frame_created = true;
        }

        self.commit_next_frame();
        self.frames.swap();

        // The changes stay dirty unless the frame actually reaches the render
        // thread.
        self.send(Event::CommitFrame)?;
        self.settle_committed_batches();

        let promise = Arc::new(Promise::new());
        self.send(Event::RenderFrame(promise.clone()))?;

        match self.wait(&promise) {
            Ok(rsp) => rsp,
            Err(err) => {
                if let Error::FrameTimeout(_) = err {
                    self.pending = Some(promise);
                }

                Err(err.into())
            }
        }
    }

    fn wait(&self, promise: &Promise) -> ::std::result::Result<Result<()>, Error> {
        match self.settings.frame_timeout_ms {
            Some(ms) => promise
                .wait_timeout(Duration::from_millis(ms))
                .ok_or(Error::FrameTimeout(ms)),
            None => Ok(promise.wait()),
        }
    }

    /// Queues the commands of every dirty batch into the front frame. Dirty
    /// state is left as is.
    fn commit_next_frame(&mut self) {
        let policy = self.settings.dirty_dispatch;
        let mut frame = self.frames.write();
        frame.init(self.passes.len());

        for (index, pass) in self.passes.iter().enumerate() {
            for batch in &pass.batches {
                if batch.dirty.is_empty() {
                    continue;
                }

                let dirty = serviced(policy, batch.dirty);

                trace!(
                    "[RenderBackendService] commits {}/{} with {:?}.",
                    pass.id,
                    batch.id,
                    dirty
                );

                let (pass_id, batch_id) = (&pass.id, batch.id.clone());
                let cmd = |mesh_id, payload| FrameSubmitCmd {
                    pass_id: pass_id.clone(),
                    batch_id: batch_id.clone(),
                    mesh_id,
                    payload,
                };

                if dirty.contains(DirtyFlags::MATRIX_BUFFER) {
                    frame.enqueue(cmd(None, FrameSubmitPayload::Matrices(batch.matrices)));
                }

                if dirty.contains(DirtyFlags::UNIFORM_BUFFER) {
                    for var in &batch.uniforms {
                        if let Some(staging) = frame.uniform_buffer_mut(index) {
                            staging.write(var.name(), var.data());
                        }

                        frame.enqueue(cmd(
                            None,
                            FrameSubmitPayload::Uniform {
                                name: var.name().to_owned(),
                                ty: var.ty(),
                                data: var.data().to_vec(),
                            },
                        ));
                    }
                }

                if dirty.contains(DirtyFlags::MESH_UPDATE) {
                    for mesh in &batch.update_meshes {
                        frame.enqueue(cmd(
                            Some(mesh.handle()),
                            FrameSubmitPayload::Buffer(mesh.vertices()),
                        ));
                    }
                }

                if dirty.contains(DirtyFlags::MESH) {
                    for entry in batch.meshes.iter().filter(|v| v.dirty) {
                        for mesh in &entry.meshes {
                            frame.enqueue(cmd(
                                Some(mesh.handle()),
                                FrameSubmitPayload::Mesh {
                                    data: mesh.vertices(),
                                    num_instances: entry.num_instances,
                                    params: mesh.params(),
                                },
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Clears the dirty state observed by the last `commit_next_frame`.
    /// Pending mesh updates go with the mask, serviced or not.
    fn settle_committed_batches(&mut self) {
        let policy = self.settings.dirty_dispatch;
        for batch in self.passes.iter_mut().flat_map(|v| v.batches.iter_mut()) {
            if batch.dirty.is_empty() {
                continue;
            }

            if serviced(policy, batch.dirty).contains(DirtyFlags::MESH) {
                for entry in &mut batch.meshes {
                    entry.dirty = false;
                }
            }

            batch.update_meshes.clear();
            batch.dirty = DirtyFlags::empty();
        }

        self.dirty = false;
    }

    fn send(&self, event: Event) -> Result<()> {
        match self.task {
            Some(ref task) => Ok(task.send(event)?),
            None => Err(Error::BackendNotRunning.into()),
        }
    }

    fn open_pass(&mut self, id: &str) {
        let recording = match self.passes.iter().position(|v| pass::matches(&v.id, id)) {
            Some(index) => Recording::Registered(index),
            None => Recording::Fresh(PassData::new(id)),
        };

        self.pass = Some(recording);
        self.dirty = true;
    }

    fn active_pass(&self) -> Option<&PassData> {
        match self.pass {
            Some(Recording::Registered(index)) => self.passes.get(index),
            Some(Recording::Fresh(ref pass)) => Some(pass),
            None => None,
        }
    }

    fn active_pass_mut(&mut self) -> Option<&mut PassData> {
        match self.pass {
            Some(Recording::Registered(index)) => self.passes.get_mut(index),
            Some(Recording::Fresh(ref mut pass)) => Some(pass),
            None => None,
        }
    }

    fn batch_mut(&mut self, op: &str) -> Option<&mut RenderBatchData> {
        match self.batch {
            Some(Recording::Fresh(ref mut batch)) => {
                self.dirty = true;
                Some(batch)
            }
            Some(Recording::Registered(index)) => {
                self.dirty = true;
                let pass = match self.pass {
                    Some(Recording::Registered(pass)) => self.passes.get_mut(pass),
                    Some(Recording::Fresh(ref mut pass)) => Some(pass),
                    None => None,
                };

                let batch = pass.and_then(|v| v.batches.get_mut(index));
                if batch.is_none() {
                    error!("[RenderBackendService] {} on a batch that is gone.", op);
                }

                batch
            }
            None => {
                error!("[RenderBackendService] {} without a batch.", op);
                None
            }
        }
    }
}

impl Drop for RenderBackendService {
    fn drop(&mut self) {
        self.on_close();
    }
}

fn serviced(policy: DirtyDispatch, dirty: DirtyFlags) -> DirtyFlags {
    match policy {
        DirtyDispatch::All => dirty,
        DirtyDispatch::FirstMatch => first_match(dirty),
    }
}

/// Keeps the first set category in matrix, uniform, mesh update, mesh order.
fn first_match(dirty: DirtyFlags) -> DirtyFlags {
    [
        DirtyFlags::MATRIX_BUFFER,
        DirtyFlags::UNIFORM_BUFFER,
        DirtyFlags::MESH_UPDATE,
        DirtyFlags::MESH,
    ]
    .iter()
    .cloned()
    .find(|v| dirty.contains(*v))
    .unwrap_or_else(DirtyFlags::empty)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::prelude::Color;

    #[test]
    fn first_match_order() {
        let all = DirtyFlags::all();
        assert_eq!(first_match(all), DirtyFlags::MATRIX_BUFFER);
        assert_eq!(
            first_match(DirtyFlags::MESH | DirtyFlags::MESH_UPDATE),
            DirtyFlags::MESH_UPDATE
        );
        assert_eq!(first_match(DirtyFlags::empty()), DirtyFlags::empty());
    }

    #[test]
    fn recording_without_backend() {
        let mut service = RenderBackendService::new(Settings::headless());
        assert!(!service.begin_render_batch("b1"));
        assert!(service.begin_pass("p1"));
        assert!(!service.begin_pass("p2"));
        assert!(service.begin_render_batch("b1"));
        assert!(service.end_render_batch());
        assert!(!service.end_render_batch());
        assert!(service.end_pass());
        assert!(!service.end_pass());

        assert_eq!(service.passes().len(), 1);
        assert_eq!(service.pass("p1").unwrap().batches.len(), 1);
        assert!(service.on_update().is_err());
        assert!(service.is_dirty());
    }

    #[test]
    fn default_pass() {
        let mut service = RenderBackendService::new(Settings::headless());
        service.batch = Some(Recording::Fresh(RenderBatchData::new("b1")));
        assert!(service.end_render_batch());
        assert!(service.is_pass_active());
        assert!(service.end_pass());
        assert_eq!(service.passes()[0].id, DEFAULT_PASS);
        assert_eq!(service.passes()[0].batches[0].id, "b1");
    }

    #[test]
    fn commit_keeps_dirty_state() {
        let mut service = RenderBackendService::new(Settings::headless());
        let mesh = service.create_mesh(MeshParams::default(), vec![0; 24]);
        service.begin_pass("p1");
        service.begin_render_batch("b1");
        service.set_matrix(MatrixType::Model, &Matrix4::from_scale(2.0));
        service.update_mesh(&mesh);
        service.update_mesh(&mesh);
        service.end_render_batch();
        service.end_pass();
        assert_eq!(service.passes()[0].batches[0].update_meshes.len(), 1);

        service.commit_next_frame();
        assert_eq!(service.frames.read().len(), 2);
        assert!(service.is_dirty());

        let batch = &service.passes()[0].batches[0];
        assert_eq!(batch.dirty, DirtyFlags::MATRIX_BUFFER | DirtyFlags::MESH_UPDATE);
        assert_eq!(batch.update_meshes.len(), 1);

        service.settle_committed_batches();
        assert!(!service.is_dirty());

        let batch = &service.passes()[0].batches[0];
        assert!(batch.dirty.is_empty());
        assert!(batch.update_meshes.is_empty());
    }

    #[test]
    fn clear_color() {
        let mut settings = Settings::headless();
        settings.clear_color = [1.0, 0.0, 0.0, 1.0];
        let service = RenderBackendService::new(settings);
        let pass = service.pipeline().pass(0).unwrap();
        assert_eq!(pass.states().clear.color, Color::red());
    }
}
