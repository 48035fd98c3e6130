//! FXAA post-process: program reflection, parameter computation and the pass.

pub mod params;
pub mod program;
mod stage;

pub use params::{compute, FxaaTunables, ParameterBundle, SubMode};
pub use program::{ShaderProgram, Technique};
pub use stage::{encode_uniforms, PostProcessStage};
