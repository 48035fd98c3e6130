//! Pixel-space geometry used by the scene and post-process passes.
//!
//! All positions are physical pixels of the render target, origin top-left,
//! +X right, +Y down. Shaders convert to NDC from the target size.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
