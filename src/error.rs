//! Error types for the engine.
//!
//! Setup-phase failures ([`ShaderError`]) are fatal: the host should abort
//! startup with the diagnostic. Everything else is per-frame or per-object
//! and is designed to be recoverable — invalid geometry is rejected before
//! it reaches the scene, unknown uniforms are logged and skipped, and a
//! failed texture load leaves the texture permanently on its placeholder.

use std::path::PathBuf;

use thiserror::Error;

use crate::program::{ShaderStage, UniformKind};

/// Shader build failures reported by [`Program`](crate::Program).
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A single stage failed to compile. Carries the stage and the
    /// compiler diagnostic.
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },

    /// The compiled stages could not be linked into a usable pipeline.
    #[error("shader program failed to link: {0}")]
    Link(String),

    /// `link` was called before both stages were attached.
    #[error("program is missing its {0} shader")]
    MissingStage(ShaderStage),
}

/// Invalid buffer data supplied to [`Geometry`](crate::Geometry).
///
/// A failed call leaves the geometry's staged state untouched, so a
/// rejected object can simply not be added to the scene.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("malformed geometry: {0}")]
    Malformed(String),

    /// An index referenced a vertex past the end of the vertex sequence.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Uniform upload failures.
///
/// Non-fatal by default: optional uniforms are common, so callers usually
/// log an [`UniformError::Unknown`] and continue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UniformError {
    #[error("unknown uniform '{0}'")]
    Unknown(String),

    #[error("uniform '{name}' expects {expected}, got {got}")]
    KindMismatch {
        name: String,
        expected: UniformKind,
        got: UniformKind,
    },
}

/// Texture asset failures.
#[derive(Debug, Error)]
pub enum TextureError {
    /// The image could not be fetched or decoded. The owning texture
    /// stays on its placeholder in the `Failed` state.
    #[error("failed to load texture '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The decode worker disappeared without reporting a result.
    #[error("texture decode worker for '{}' exited without a result", path.display())]
    WorkerLost { path: PathBuf },
}

/// Frame-level failures reported by [`Renderer::render`](crate::Renderer::render).
#[derive(Debug, Error)]
pub enum RenderError {
    /// `render` was called before the renderer was fully configured.
    #[error("renderer is not configured: no {0} has been set")]
    NotConfigured(&'static str),

    /// The surface could not provide a frame and reconfiguring is not
    /// expected to help.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
