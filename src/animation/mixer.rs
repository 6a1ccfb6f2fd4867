use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;

use crate::model::Buffers;
use crate::scene_graph::{ObjectId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
}

#[derive(Debug, Clone)]
pub enum ChannelValues {
    Translations(Vec<Vec3>),
    Rotations(Vec<Quat>),
    Scales(Vec<Vec3>),
}

#[derive(Debug, Clone)]
pub struct Channel {
    /// glTF node index the channel animates
    pub node: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn from_gltf(animation: &gltf::Animation, buffers: Buffers) -> anyhow::Result<Self> {
        let name = animation
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Animation {}", animation.index()));

        let mut channels = Vec::new();
        let mut duration = 0.0f32;

        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            let times: Vec<f32> = reader
                .read_inputs()
                .with_context(|| format!("Channel without keyframe times in {}", name))?
                .collect();

            let (interpolation, cubic) = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
                gltf::animation::Interpolation::Step => (Interpolation::Step, false),
                // Tangents are dropped and the spline keys are interpolated linearly
                gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
            };

            let values = match reader
                .read_outputs()
                .with_context(|| format!("Channel without keyframe values in {}", name))?
            {
                ReadOutputs::Translations(outputs) => {
                    ChannelValues::Translations(spline_keys(outputs.map(Vec3::from), cubic))
                }
                ReadOutputs::Rotations(outputs) => ChannelValues::Rotations(spline_keys(
                    outputs.into_f32().map(Quat::from_array),
                    cubic,
                )),
                ReadOutputs::Scales(outputs) => {
                    ChannelValues::Scales(spline_keys(outputs.map(Vec3::from), cubic))
                }
                ReadOutputs::MorphTargetWeights(_) => {
                    log::debug!("Skipping morph target channel in {}", name);
                    continue;
                }
            };

            if let Some(last) = times.last() {
                duration = duration.max(*last);
            }

            channels.push(Channel {
                node: channel.target().node().index(),
                times,
                values,
                interpolation,
            });
        }

        Ok(Self {
            name,
            duration,
            channels,
        })
    }
}

fn spline_keys<T>(outputs: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    if cubic {
        // (in-tangent, value, out-tangent) triples
        outputs.skip(1).step_by(3).collect()
    } else {
        outputs.collect()
    }
}

/// Returns the keyframe pair surrounding `time` and the blend factor between them.
fn keyframes(times: &[f32], time: f32) -> (usize, usize, f32) {
    let next = times.partition_point(|&t| t <= time);

    if next == 0 {
        return (0, 0, 0.0);
    }

    if next >= times.len() {
        let last = times.len() - 1;
        return (last, last, 0.0);
    }

    let previous = next - 1;
    let span = times[next] - times[previous];
    let factor = if span > 0.0 {
        (time - times[previous]) / span
    } else {
        0.0
    };

    (previous, next, factor)
}

impl Channel {
    fn apply(&self, scene: &mut Scene, object_id: ObjectId, time: f32) {
        if self.times.is_empty() {
            return;
        }

        let (previous, next, factor) = keyframes(&self.times, time);
        let factor = match self.interpolation {
            Interpolation::Linear => factor,
            Interpolation::Step => 0.0,
        };

        match &self.values {
            ChannelValues::Translations(values) => {
                let (Some(a), Some(b)) = (values.get(previous), values.get(next)) else {
                    return;
                };
                scene.set_object_translation(object_id, a.lerp(*b, factor));
            }
            ChannelValues::Rotations(values) => {
                let (Some(a), Some(b)) = (values.get(previous), values.get(next)) else {
                    return;
                };
                scene.set_object_rotation(object_id, a.slerp(*b, factor).normalize());
            }
            ChannelValues::Scales(values) => {
                let (Some(a), Some(b)) = (values.get(previous), values.get(next)) else {
                    return;
                };
                scene.set_object_scale(object_id, a.lerp(*b, factor));
            }
        }
    }
}

/// Plays one looping clip on the objects spawned from a glTF file.
pub struct AnimationMixer {
    clip: AnimationClip,
    targets: Vec<Option<ObjectId>>,
    time: f32,
    time_scale: f32,
}

impl AnimationMixer {
    pub fn new(
        clip: AnimationClip,
        node_objects: &HashMap<usize, ObjectId>,
        time_scale: f32,
    ) -> Self {
        let targets = clip
            .channels
            .iter()
            .map(|channel| node_objects.get(&channel.node).copied())
            .collect();

        Self {
            clip,
            targets,
            time: 0.0,
            time_scale,
        }
    }

    pub fn clip_name(&self) -> &str {
        &self.clip.name
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn advance(&mut self, delta: Duration, scene: &mut Scene) {
        self.time += delta.as_secs_f32() * self.time_scale;

        if self.clip.duration > 0.0 {
            self.time = self.time.rem_euclid(self.clip.duration);
        } else {
            self.time = 0.0;
        }

        for (channel, target) in self.clip.channels.iter().zip(&self.targets) {
            if let Some(object_id) = target {
                channel.apply(scene, *object_id, self.time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::Object3D;

    fn bobbing_clip() -> AnimationClip {
        AnimationClip {
            name: "Bob".to_string(),
            duration: 2.0,
            channels: vec![Channel {
                node: 0,
                times: vec![0.0, 1.0, 2.0],
                values: ChannelValues::Translations(vec![
                    Vec3::ZERO,
                    Vec3::new(0.0, 1.0, 0.0),
                    Vec3::ZERO,
                ]),
                interpolation: Interpolation::Linear,
            }],
        }
    }

    fn scene_with_node() -> (Scene, HashMap<usize, ObjectId>) {
        let mut scene = Scene::new();
        let object_id = scene.add_object(Object3D::default());
        let node_objects = HashMap::from([(0, object_id)]);
        (scene, node_objects)
    }

    #[test]
    fn keyframe_lookup_clamps_to_ends() {
        let times = [0.0, 1.0, 2.0];
        assert_eq!(keyframes(&times, -1.0), (0, 0, 0.0));
        assert_eq!(keyframes(&times, 5.0), (2, 2, 0.0));
        assert_eq!(keyframes(&times, 1.5), (1, 2, 0.5));
    }

    #[test]
    fn time_scale_speeds_up_playback() {
        let (mut scene, node_objects) = scene_with_node();
        let object_id = node_objects[&0];
        let mut mixer = AnimationMixer::new(bobbing_clip(), &node_objects, 4.0);

        mixer.advance(Duration::from_millis(125), &mut scene);

        assert!((mixer.time() - 0.5).abs() < 1e-5);
        let translation = scene.get_object_transform(object_id).unwrap().translation();
        assert!(translation.abs_diff_eq(Vec3::new(0.0, 0.5, 0.0), 1e-5));
    }

    #[test]
    fn playback_loops() {
        let (mut scene, node_objects) = scene_with_node();
        let mut mixer = AnimationMixer::new(bobbing_clip(), &node_objects, 1.0);

        mixer.advance(Duration::from_millis(2500), &mut scene);

        assert!((mixer.time() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn unbound_channels_are_ignored() {
        let mut scene = Scene::new();
        let mut mixer = AnimationMixer::new(bobbing_clip(), &HashMap::new(), 1.0);
        mixer.advance(Duration::from_millis(100), &mut scene);
        assert_eq!(mixer.clip_name(), "Bob");
    }

    #[test]
    fn cubic_spline_outputs_keep_only_values() {
        let keys = spline_keys([9, 1, 9, 9, 2, 9].into_iter(), true);
        assert_eq!(keys, vec![1, 2]);
    }
}
