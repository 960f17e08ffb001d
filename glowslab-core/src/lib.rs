/// glowslab Core Library - Scene logic for the glowing slab renderer
/// 
/// This library provides the backend-independent core: transformation
/// matrices, procedural meshes, animation and frame timing, and the
/// per-frame orchestrator that drives a graphics backend.

pub mod animation;
pub mod backend;
pub mod config;
pub mod error;
pub mod geometry;
pub mod orchestrator;
pub mod projection;
pub mod shader;
pub mod timer;
pub mod transform;

// Re-export commonly used types
pub use animation::AnimationState;
pub use backend::{check_draw_request, Display, GraphicsBackend, MeshHandle, ProgramHandle, RasterState, UniformSlot};
pub use config::SceneConfig;
pub use error::{GlowslabError, GlowslabResult};
pub use geometry::{build_plane, build_volume, IndexWidth, Mesh, Vertex};
pub use orchestrator::{FrameRequest, FrameStage, RenderOrchestrator};
pub use projection::{look_at, perspective, Camera};
pub use timer::FrameTimer;
pub use transform::{Matrix4x4, Transform};
