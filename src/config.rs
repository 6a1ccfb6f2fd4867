use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use glam::Vec3;
use serde::Deserialize;

use crate::animation::{Easing, Tween};
use crate::controls::OrbitLimits;
use crate::loading::registry::PropDefinition;

pub const DEFAULT_SCENE_PATH: &str = "assets/scene.ron";

/// 0xRRGGBB in sRGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct HexColor(pub u32);

impl HexColor {
    pub fn to_srgb(self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }
}

pub fn srgb_to_linear(color: [f32; 3]) -> Vec3 {
    let channel = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(channel(color[0]), channel(color[1]), channel(color[2]))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraMoveConfig {
    #[serde(default)]
    pub label: String,
    /// Where the camera jumps before moving. Moves start from the current position otherwise.
    #[serde(default)]
    pub from: Option<Vec3>,
    pub to: Vec3,
    #[serde(default)]
    pub delay_ms: u64,
    pub duration_ms: u64,
    #[serde(default)]
    pub easing: Easing,
}

impl CameraMoveConfig {
    pub fn tween(&self, current: Vec3) -> Tween {
        Tween::new(
            self.from.unwrap_or(current),
            self.to,
            Duration::from_millis(self.duration_ms),
        )
        .with_delay(Duration::from_millis(self.delay_ms))
        .with_easing(self.easing)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmbientLightConfig {
    pub color: HexColor,
    pub intensity: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionalLightConfig {
    pub color: HexColor,
    pub intensity: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightsConfig {
    pub ambient: AmbientLightConfig,
    pub sun: DirectionalLightConfig,
    pub sunset: DirectionalLightConfig,
}

/// Orthographic shadow camera of the sun.
#[derive(Debug, Clone, Deserialize)]
pub struct ShadowConfig {
    pub enabled: bool,
    pub map_size: u32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RockConfig {
    pub radius: f32,
    pub detail: u32,
    pub color: HexColor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RockPlacement {
    pub position: Vec3,
    pub scale: f32,
    #[serde(default)]
    pub cast_shadow: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    pub title: String,
    pub background: HexColor,
    pub camera: CameraConfig,
    pub intro: CameraMoveConfig,
    #[serde(default)]
    pub viewpoints: Vec<CameraMoveConfig>,
    #[serde(default)]
    pub orbit_limits: OrbitLimits,
    pub lights: LightsConfig,
    pub shadows: ShadowConfig,
    pub rock: RockConfig,
    #[serde(default)]
    pub rocks: Vec<RockPlacement>,
    #[serde(default)]
    pub props: Vec<PropDefinition>,
}

impl SceneConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene manifest {}", path.display()))?;

        Self::from_ron(&source)
            .with_context(|| format!("Failed to parse scene manifest {}", path.display()))
    }

    pub fn from_ron(source: &str) -> anyhow::Result<Self> {
        let config: SceneConfig = ron::de::from_str(source)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::f32::consts::PI;

    use super::*;
    use crate::loading::registry::PostLoad;

    pub const FULL_SCENE: &str = include_str!("../assets/scene.ron");
    pub const PLAIN_SCENE: &str = include_str!("../assets/scene_plain.ron");

    #[test]
    fn full_manifest_parses() {
        let config = SceneConfig::from_ron(FULL_SCENE).unwrap();

        assert_eq!(config.background, HexColor(0xc8f0f9));
        assert_eq!(config.intro.from, Some(Vec3::new(26.0, 8.0, -35.0)));
        assert_eq!(config.intro.to, Vec3::new(25.0, 20.0, 20.0));
        assert_eq!(config.intro.delay_ms, 1000);
        assert_eq!(config.intro.duration_ms, 6500);
        assert_eq!(config.viewpoints.len(), 2);
        assert!(config.shadows.enabled);
        assert_eq!(config.rocks.len(), 3);
        assert!((config.orbit_limits.max_polar_angle - PI / 2.4).abs() < 1e-4);
        assert_eq!(config.orbit_limits.max_distance, 60.0);
    }

    #[test]
    fn full_manifest_places_animated_props() {
        let config = SceneConfig::from_ron(FULL_SCENE).unwrap();
        let prop = |name: &str| {
            config
                .props
                .iter()
                .find(|prop| prop.name == name)
                .unwrap()
                .clone()
        };

        let birds = prop("birds");
        assert_eq!(birds.placement.position, Vec3::new(0.0, 5.0, 20.0));
        assert_eq!(birds.placement.scale, Vec3::ONE);
        assert!(birds.cast_shadow);
        assert_eq!(
            birds.hooks[0],
            PostLoad::FlyTo {
                to: Vec3::new(4.0, 5.0, -120.0),
                duration_ms: 30000,
                easing: Easing::SinusoidalInOut,
            }
        );
        assert_eq!(birds.hooks[1], PostLoad::PlayClip { clip: 0, time_scale: 4.0 });

        let smoke = prop("smoke");
        assert_eq!(smoke.placement.position, Vec3::new(1.0, 3.0, 3.8));
        assert_eq!(smoke.placement.scale, Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(smoke.hooks, vec![PostLoad::PlayClip { clip: 0, time_scale: 3.0 }]);

        assert!(!prop("campfire").cast_shadow);
        assert!(!prop("mountain").receive_shadow);
        assert!(prop("cloud1").cast_shadow);
    }

    #[test]
    fn full_manifest_viewpoints_share_timing() {
        let config = SceneConfig::from_ron(FULL_SCENE).unwrap();

        assert_eq!(config.camera.far, 300.0);
        for viewpoint in &config.viewpoints {
            assert_eq!(viewpoint.duration_ms, 4000);
            assert_eq!(viewpoint.delay_ms, 0);
            assert_eq!(viewpoint.easing, Easing::QuarticInOut);
            assert_eq!(viewpoint.from, None);
        }
        assert_eq!(config.viewpoints[0].to, Vec3::new(25.0, 20.0, 20.0));
        assert_eq!(config.viewpoints[1].to, Vec3::new(10.0, 5.0, 17.0));

        assert_eq!(config.shadows.map_size, 500);
        assert_eq!((config.shadows.left, config.shadows.right), (-50.0, 50.0));
        assert_eq!((config.shadows.top, config.shadows.bottom), (20.0, -50.0));
    }

    #[test]
    fn plain_manifest_parses_without_animated_meshes() {
        let config = SceneConfig::from_ron(PLAIN_SCENE).unwrap();

        assert!(!config.shadows.enabled);
        assert!(config.viewpoints.is_empty());
        assert_eq!(config.lights.sun.color, HexColor(0xe8c37b));
        assert_eq!(config.camera.far, 100.0);
        assert!(config
            .props
            .iter()
            .all(|prop| !prop.hooks.iter().any(|hook| matches!(hook, PostLoad::PlayClip { .. }))));
    }

    #[test]
    fn prop_names_are_unique() {
        for source in [FULL_SCENE, PLAIN_SCENE] {
            let config = SceneConfig::from_ron(source).unwrap();
            let names: HashSet<_> = config.props.iter().map(|prop| prop.name.as_str()).collect();
            assert_eq!(names.len(), config.props.len());
        }
    }

    #[test]
    fn full_manifest_drifts_three_clouds() {
        let config = SceneConfig::from_ron(FULL_SCENE).unwrap();
        let drifting = config
            .props
            .iter()
            .filter(|prop| prop.hooks.iter().any(|hook| matches!(hook, PostLoad::Drift { .. })))
            .count();
        assert_eq!(drifting, 3);
    }

    #[test]
    fn hex_colors_unpack_channels() {
        assert_eq!(HexColor(0xff0000).to_srgb(), [1.0, 0.0, 0.0]);
        assert_eq!(HexColor(0x00ff00).to_srgb(), [0.0, 1.0, 0.0]);

        let linear = srgb_to_linear(HexColor(0xffffff).to_srgb());
        assert!(linear.abs_diff_eq(Vec3::ONE, 1e-6));
    }

    #[test]
    fn camera_move_starts_from_current_position_when_unset() {
        let config = SceneConfig::from_ron(FULL_SCENE).unwrap();
        let tween = config.viewpoints[1].tween(Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(tween.from(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(tween.to(), Vec3::new(10.0, 5.0, 17.0));
    }

    #[test]
    fn broken_manifest_reports_error() {
        assert!(SceneConfig::from_ron("(title: \"oops\")").is_err());
    }
}
