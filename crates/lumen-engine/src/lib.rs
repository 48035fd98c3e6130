//! Lumen engine crate.
//!
//! Offscreen rendering with an optional FXAA post-process, plus the window,
//! GPU and input plumbing the viewer runs on.

pub mod asset;
pub mod coords;
pub mod core;
pub mod device;
pub mod frame;
pub mod input;
pub mod logging;
pub mod post;
pub mod render;
pub mod time;
pub mod window;

mod error;

pub use error::PipelineError;
