/// Error types shared by the core and its backends
use thiserror::Error;

/// Errors raised while setting up or rendering the scene
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlowslabError {
    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("Program link failed: {0}")]
    ProgramLink(String),
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to upload mesh: {0}")]
    MeshUpload(String),
    #[error("Draw call failed: {0}")]
    Draw(String),
    #[error("Failed to present frame: {0}")]
    Present(String),
}

pub type GlowslabResult<T> = Result<T, GlowslabError>;
