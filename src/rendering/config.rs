#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub power_preference: wgpu::PowerPreference,
    pub desired_maximum_frame_latency: u32,
    /// Applied when rendering the sun's shadow map
    pub shadow_depth_bias: wgpu::DepthBiasState,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            desired_maximum_frame_latency: 2,
            shadow_depth_bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }
    }
}
