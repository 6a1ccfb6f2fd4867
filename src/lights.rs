use glam::{Mat4, Vec3};

use crate::config::{DirectionalLightConfig, SceneConfig, ShadowConfig};

/// Colors are kept in sRGB so the debug panel edits what the manifest says.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Shines from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    fn from_config(config: &DirectionalLightConfig) -> Self {
        Self {
            color: config.color.to_srgb(),
            intensity: config.intensity,
            position: config.position,
        }
    }

    /// Unit vector from the scene towards the light.
    pub fn direction(&self) -> Vec3 {
        self.position.try_normalize().unwrap_or(Vec3::Y)
    }
}

#[derive(Debug, Clone)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub sunset: DirectionalLight,
    pub sky_color: [f32; 3],
}

impl Lights {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            ambient: AmbientLight {
                color: config.lights.ambient.color.to_srgb(),
                intensity: config.lights.ambient.intensity,
            },
            sun: DirectionalLight::from_config(&config.lights.sun),
            sunset: DirectionalLight::from_config(&config.lights.sunset),
            sky_color: config.background.to_srgb(),
        }
    }

    /// Orthographic view-projection of the sun's shadow camera.
    pub fn sun_view_proj(&self, shadows: &ShadowConfig) -> Mat4 {
        let up = if self.sun.direction().abs_diff_eq(Vec3::Y, 1e-4) {
            Vec3::Z
        } else {
            Vec3::Y
        };

        let view = Mat4::look_at_rh(self.sun.position, Vec3::ZERO, up);
        let projection = Mat4::orthographic_rh(
            shadows.left,
            shadows.right,
            shadows.bottom,
            shadows.top,
            shadows.near,
            shadows.far,
        );

        projection * view
    }
}
