//! Per-frame orchestration: mode switching and the scene → FXAA/blit pipeline.

mod controller;
mod mode;

pub use controller::{FrameController, FrameReport};
pub use mode::{decide, AaMode, AaState, BlitReason, EffectiveMode, FramePath};
