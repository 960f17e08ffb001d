//! Capabilities the render orchestrator consumes
//!
//! A [`GraphicsBackend`] accepts mesh data and matrices and performs draw
//! calls; a [`Display`] shows a line of text. The core never looks past
//! these calls.

use crate::error::{GlowslabError, GlowslabResult};
use crate::geometry::{IndexWidth, Mesh};
use crate::transform::Matrix4x4;

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to a mesh uploaded to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Matrix uniforms understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    /// Model-to-world transform
    World,
    /// World-to-clip transform
    ViewProjection,
}

impl UniformSlot {
    /// Uniform name in the shader sources
    pub fn name(&self) -> &'static str {
        match self {
            UniformSlot::World => "mwMatrix",
            UniformSlot::ViewProjection => "mpvMatrix",
        }
    }
}

/// Fixed rasterizer state, set once after the program is linked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub depth_test: bool,
    /// Discard clockwise (back-facing) triangles
    pub cull_back_faces: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            depth_test: true,
            cull_back_faces: true,
        }
    }
}

/// Drawing surface the orchestrator renders through.
///
/// Blending, when enabled, is source-over: `src * srcAlpha + dst * (1 - srcAlpha)`.
pub trait GraphicsBackend {
    fn compile_and_link_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> GlowslabResult<ProgramHandle>;

    fn set_raster_state(&mut self, state: RasterState);

    fn upload_mesh(&mut self, mesh: &Mesh) -> GlowslabResult<MeshHandle>;

    fn set_uniform_matrix(&mut self, slot: UniformSlot, matrix: &Matrix4x4);

    fn set_blend_enabled(&mut self, enabled: bool);

    /// Clear color to opaque black and depth to the far plane
    fn clear(&mut self);

    /// Draw the first `index_count` indices of `mesh` as triangles
    fn draw(&mut self, mesh: MeshHandle, index_count: usize, index_width: IndexWidth) -> GlowslabResult<()>;

    fn present(&mut self) -> GlowslabResult<()>;
}

/// Check a draw request against the index data uploaded for `mesh`.
///
/// The index buffer was encoded at `uploaded_width`, so any other width
/// would read it with the wrong element size.
pub fn check_draw_request(
    mesh: MeshHandle,
    uploaded_count: usize,
    uploaded_width: IndexWidth,
    index_count: usize,
    index_width: IndexWidth,
) -> GlowslabResult<()> {
    if index_count > uploaded_count {
        return Err(GlowslabError::Draw(format!(
            "{} indices requested, mesh {:?} has {}",
            index_count, mesh, uploaded_count
        )));
    }
    if index_width != uploaded_width {
        return Err(GlowslabError::Draw(format!(
            "mesh {:?} was uploaded with {:?} indices, draw asked for {:?}",
            mesh, uploaded_width, index_width
        )));
    }
    Ok(())
}

/// Text output for the FPS readout
pub trait Display {
    fn set_text(&mut self, text: &str);
}

impl Display for String {
    fn set_text(&mut self, text: &str) {
        self.clear();
        self.push_str(text);
    }
}
