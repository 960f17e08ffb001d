//! Per-frame driver for the slab scene
//!
//! [`RenderOrchestrator`] owns every piece of mutable frame state. A host
//! scheduler calls [`RenderOrchestrator::tick`] once per display refresh and
//! only schedules another tick when the previous one returned
//! [`FrameRequest::Continue`].

use log::{debug, trace, warn};
use nalgebra::Vector3;

use crate::animation::AnimationState;
use crate::backend::{
    Display, GraphicsBackend, MeshHandle, RasterState, UniformSlot,
};
use crate::config::SceneConfig;
use crate::error::GlowslabResult;
use crate::geometry::{build_plane, build_volume, IndexWidth, Mesh};
use crate::shader::{FRAGMENT_SHADER, VERTEX_SHADER};
use crate::timer::FrameTimer;
use crate::transform::{Matrix4x4, Transform};

/// Where the orchestrator is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    Idle,
    UpdateState,
    DrawOpaque,
    DrawTransparent,
    Present,
}

/// Whether the host should schedule another tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    Continue,
    Stop,
}

/// A mesh living on the backend
#[derive(Debug, Clone, Copy)]
struct UploadedMesh {
    handle: MeshHandle,
    index_count: usize,
    index_width: IndexWidth,
}

impl UploadedMesh {
    fn upload<B: GraphicsBackend + ?Sized>(backend: &mut B, mesh: &Mesh) -> GlowslabResult<Self> {
        Ok(Self {
            handle: backend.upload_mesh(mesh)?,
            index_count: mesh.index_count(),
            index_width: mesh.index_width(),
        })
    }

    fn draw<B: GraphicsBackend + ?Sized>(&self, backend: &mut B) -> GlowslabResult<()> {
        backend.draw(self.handle, self.index_count, self.index_width)
    }
}

pub struct RenderOrchestrator {
    config: SceneConfig,
    plane: UploadedMesh,
    volume: UploadedMesh,
    projection: Matrix4x4,
    view: Matrix4x4,
    animation: AnimationState,
    timer: FrameTimer,
    last_timestamp: Option<f64>,
    volume_world: Matrix4x4,
    stage: FrameStage,
    cancelled: bool,
    frames_presented: u64,
    frames_skipped: u64,
}

impl RenderOrchestrator {
    /// Build the camera, program and static meshes on `backend`.
    ///
    /// Any failure here is fatal: the scene cannot run without them.
    pub fn new<B: GraphicsBackend + ?Sized>(config: SceneConfig, backend: &mut B) -> GlowslabResult<Self> {
        config.validate()?;

        let camera = config.camera();
        let projection = camera.projection_matrix()?;
        let view = camera.view_matrix()?;

        let program = backend.compile_and_link_program(VERTEX_SHADER, FRAGMENT_SHADER)?;
        backend.set_raster_state(RasterState::default());

        let plane_mesh = build_plane();
        let volume_mesh = build_volume(config.layer_count)?;
        let plane = UploadedMesh::upload(backend, &plane_mesh)?;
        let volume = UploadedMesh::upload(backend, &volume_mesh)?;

        debug!(
            "Scene ready: program {}, {}x{} viewport, {} layers ({} indices, {:?})",
            program.0,
            config.viewport_width,
            config.viewport_height,
            config.layer_count,
            volume.index_count,
            volume.index_width
        );

        Ok(Self {
            timer: FrameTimer::with_capacity(config.timer_samples)?,
            config,
            plane,
            volume,
            projection,
            view,
            animation: AnimationState::new(),
            last_timestamp: None,
            volume_world: Transform::identity(),
            stage: FrameStage::Idle,
            cancelled: false,
            frames_presented: 0,
            frames_skipped: 0,
        })
    }

    /// Run one frame at host time `now_ms`
    pub fn tick<B, D>(&mut self, now_ms: f64, backend: &mut B, display: &mut D) -> FrameRequest
    where
        B: GraphicsBackend + ?Sized,
        D: Display + ?Sized,
    {
        if self.cancelled {
            return FrameRequest::Stop;
        }

        self.enter(FrameStage::UpdateState);
        let elapsed = self.elapsed_since_last(now_ms);
        self.animation.advance(elapsed);

        let plane_world = Transform::identity();
        self.volume_world = Transform::translate(
            &Transform::identity(),
            Vector3::new(0.0, 0.0, self.animation.depth_offset()),
        );
        let view_projection = Transform::view_projection(&self.projection, &self.view);

        match self.render(backend, &view_projection, &plane_world) {
            Ok(()) => self.frames_presented += 1,
            Err(e) => {
                self.frames_skipped += 1;
                warn!("Skipping frame presentation: {}", e);
            }
        }

        self.timer.record_sample(elapsed);
        if let Some(text) = self.timer.as_fps_string() {
            display.set_text(&text);
        }
        self.enter(FrameStage::Idle);

        if self.cancelled {
            FrameRequest::Stop
        } else {
            FrameRequest::Continue
        }
    }

    fn render<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        view_projection: &Matrix4x4,
        plane_world: &Matrix4x4,
    ) -> GlowslabResult<()> {
        backend.clear();

        self.enter(FrameStage::DrawOpaque);
        backend.set_blend_enabled(false);
        backend.set_uniform_matrix(UniformSlot::ViewProjection, view_projection);
        backend.set_uniform_matrix(UniformSlot::World, plane_world);
        self.plane.draw(backend)?;

        // Layers were generated far-to-near, so a fixed submission order
        // composites correctly for this static camera.
        self.enter(FrameStage::DrawTransparent);
        backend.set_blend_enabled(true);
        backend.set_uniform_matrix(UniformSlot::World, &self.volume_world);
        self.volume.draw(backend)?;

        self.enter(FrameStage::Present);
        backend.present()
    }

    fn enter(&mut self, stage: FrameStage) {
        trace!("{:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn elapsed_since_last(&mut self, now_ms: f64) -> f64 {
        if !now_ms.is_finite() {
            return 0.0;
        }
        let elapsed = match self.last_timestamp {
            Some(last) => (now_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);
        elapsed
    }

    /// Stop requesting further frames; the next tick returns [`FrameRequest::Stop`]
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// World transform applied to the slab on the most recent tick
    pub fn volume_world(&self) -> &Matrix4x4 {
        &self.volume_world
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}
