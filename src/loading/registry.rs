use std::collections::HashMap;
use std::path::PathBuf;

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::animation::Easing;

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    /// Radians around +Y
    #[serde(default)]
    pub rotation_y: f32,
}

impl Placement {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation_y)
    }
}

/// Work to start once an asset is in the scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum PostLoad {
    /// Endless back and forth between the placement position and `to`.
    Drift {
        to: Vec3,
        out_ms: u64,
        back_ms: u64,
        #[serde(default)]
        easing: Easing,
    },
    /// One-shot move of the whole asset.
    FlyTo {
        to: Vec3,
        duration_ms: u64,
        #[serde(default)]
        easing: Easing,
    },
    /// Loops one of the asset's animation clips.
    PlayClip {
        #[serde(default)]
        clip: usize,
        time_scale: f32,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropDefinition {
    pub name: String,
    pub path: PathBuf,
    pub placement: Placement,
    #[serde(default)]
    pub cast_shadow: bool,
    #[serde(default)]
    pub receive_shadow: bool,
    #[serde(default)]
    pub hooks: Vec<PostLoad>,
}

/// Outstanding loads by asset name.
#[derive(Default)]
pub struct PendingLoads {
    entries: HashMap<String, PropDefinition>,
}

impl PendingLoads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: PropDefinition) -> anyhow::Result<()> {
        if self.entries.contains_key(&definition.name) {
            anyhow::bail!("Asset {} is already pending", definition.name);
        }

        self.entries.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Removes the entry so that each load resolves at most once.
    pub fn resolve(&mut self, key: &str) -> Option<PropDefinition> {
        let definition = self.entries.remove(key);
        if definition.is_none() {
            log::warn!("No pending load named {}", key);
        }
        definition
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str) -> PropDefinition {
        PropDefinition {
            name: name.to_string(),
            path: PathBuf::from(format!("assets/models/{}.glb", name)),
            placement: Placement {
                position: Vec3::new(1.0, 2.0, 3.0),
                scale: Vec3::splat(0.5),
                rotation_y: 0.0,
            },
            cast_shadow: true,
            receive_shadow: false,
            hooks: vec![],
        }
    }

    #[test]
    fn resolve_removes_entry() {
        let mut pending = PendingLoads::new();
        pending.register(prop("tree1")).unwrap();
        pending.register(prop("tree2")).unwrap();

        let tree = pending.resolve("tree1").unwrap();
        assert_eq!(tree.placement.scale, Vec3::splat(0.5));
        assert_eq!(pending.len(), 1);
        assert!(pending.resolve("tree1").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut pending = PendingLoads::new();
        pending.register(prop("cloud1")).unwrap();

        assert!(pending.register(prop("cloud1")).is_err());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn unknown_key_resolves_to_nothing() {
        let mut pending = PendingLoads::new();
        assert!(pending.resolve("island").is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn hooks_parse_from_ron() {
        let hooks: Vec<PostLoad> = ron::de::from_str(
            "[Drift(to: (1.0, 2.0, 3.0), out_ms: 5000, back_ms: 4000, easing: SinusoidalInOut), \
             PlayClip(time_scale: 3.0)]",
        )
        .unwrap();

        assert_eq!(
            hooks,
            vec![
                PostLoad::Drift {
                    to: Vec3::new(1.0, 2.0, 3.0),
                    out_ms: 5000,
                    back_ms: 4000,
                    easing: Easing::SinusoidalInOut,
                },
                PostLoad::PlayClip {
                    clip: 0,
                    time_scale: 3.0,
                },
            ]
        );
    }
}
