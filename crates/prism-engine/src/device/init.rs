/// Initialization parameters for the GPU layer.
///
/// The surface size comes from the window and never changes afterwards.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Preferred surface color format.
    ///
    /// If the surface does not support it, a non-sRGB 8-bit format is tried
    /// next, then the first supported format.
    pub color_format: wgpu::TextureFormat,

    /// Adapter selection preference.
    pub power_preference: wgpu::PowerPreference,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            color_format: wgpu::TextureFormat::Rgba8Unorm,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
