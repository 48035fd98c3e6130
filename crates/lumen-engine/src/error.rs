use std::fmt;

/// Failures raised by the offscreen / post-process pipeline.
///
/// Severity differs per variant:
/// - `ResourceCreation` and `UseAfterDispose` are fatal
/// - `InvalidViewport` and `ShaderBinding` only affect the current frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The platform rejected a GPU allocation (size, format or device limits).
    ResourceCreation(String),

    /// A resource was used after `dispose()`.
    UseAfterDispose(&'static str),

    /// Viewport dimensions were zero.
    InvalidViewport { width: u32, height: u32 },

    /// A named technique or parameter could not be resolved in the shader program.
    ShaderBinding(String),
}

impl PipelineError {
    pub(crate) fn resource(msg: impl Into<String>) -> Self {
        Self::ResourceCreation(msg.into())
    }

    pub(crate) fn binding(msg: impl Into<String>) -> Self {
        Self::ShaderBinding(msg.into())
    }

    /// True when the error only invalidates the current frame; the loop may continue.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, Self::InvalidViewport { .. } | Self::ShaderBinding(_))
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreation(msg) => write!(f, "resource creation failed: {msg}"),
            Self::UseAfterDispose(what) => write!(f, "{what} used after dispose"),
            Self::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {width}x{height}")
            }
            Self::ShaderBinding(msg) => write!(f, "shader binding failed: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}
