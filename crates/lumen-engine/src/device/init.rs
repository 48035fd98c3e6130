/// Options for bringing up the GPU.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB presentation format. The offscreen surface uses the same
    /// format, so this also decides where the FXAA pass reads from.
    pub prefer_srgb: bool,

    /// Swap behavior. The viewer runs without vsync to expose raw throughput.
    pub present_mode: wgpu::PresentMode,

    pub power_preference: wgpu::PowerPreference,

    pub required_limits: wgpu::Limits,

    /// Hint passed to the surface configuration.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::AutoNoVsync,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_is_off_by_default() {
        assert_eq!(GpuInit::default().present_mode, wgpu::PresentMode::AutoNoVsync);
        assert_eq!(GpuInit::default().with_vsync(true).present_mode, wgpu::PresentMode::AutoVsync);
    }
}
