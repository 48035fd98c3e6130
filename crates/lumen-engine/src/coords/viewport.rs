/// Render target size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero dimension cannot be rendered into or post-processed.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn size(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Viewport {
    #[inline]
    fn from((width, height): (u32, u32)) -> Self {
        Viewport::new(width, height)
    }
}
