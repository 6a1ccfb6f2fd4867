use std::time::Duration;

use crate::animation::{mixer::AnimationMixer, ping_pong::PingPong, tween::Tween};
use crate::camera::Camera;
use crate::scene_graph::{ObjectId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The scripted camera move finished and the camera can go back to the user.
    CameraReleased,
}

struct ObjectTween {
    object_id: ObjectId,
    tween: Tween,
}

struct ObjectDrift {
    object_id: ObjectId,
    drift: PingPong,
}

/// Advances every time-based animation once per frame.
#[derive(Default)]
pub struct AnimationScheduler {
    camera_move: Option<Tween>,
    object_tweens: Vec<ObjectTween>,
    drifts: Vec<ObjectDrift>,
    mixers: Vec<AnimationMixer>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any running camera move. The replaced move never reports completion.
    pub fn start_camera_move(&mut self, tween: Tween) {
        if self.camera_move.is_some() {
            log::debug!("Replacing running camera move");
        }
        self.camera_move = Some(tween);
    }

    pub fn has_camera_move(&self) -> bool {
        self.camera_move.is_some()
    }

    pub fn add_object_tween(&mut self, object_id: ObjectId, tween: Tween) {
        self.object_tweens.push(ObjectTween { object_id, tween });
    }

    pub fn add_drift(&mut self, object_id: ObjectId, drift: PingPong) {
        self.drifts.push(ObjectDrift { object_id, drift });
    }

    pub fn add_mixer(&mut self, mixer: AnimationMixer) {
        self.mixers.push(mixer);
    }

    pub fn active_tween_count(&self) -> usize {
        self.object_tweens.len() + usize::from(self.camera_move.is_some())
    }

    pub fn drift_count(&self) -> usize {
        self.drifts.len()
    }

    pub fn mixer_count(&self) -> usize {
        self.mixers.len()
    }

    pub fn advance(
        &mut self,
        delta: Duration,
        scene: &mut Scene,
        camera: &mut Camera,
    ) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();

        if let Some(tween) = self.camera_move.as_mut() {
            let step = tween.advance(delta);
            camera.eye = step.value;

            if step.finished {
                self.camera_move = None;
                events.push(SchedulerEvent::CameraReleased);
            }
        }

        self.object_tweens.retain_mut(|object_tween| {
            let step = object_tween.tween.advance(delta);
            scene.set_object_translation(object_tween.object_id, step.value);
            !step.finished
        });

        for object_drift in &mut self.drifts {
            let position = object_drift.drift.advance(delta);
            scene.set_object_translation(object_drift.object_id, position);
        }

        for mixer in &mut self.mixers {
            mixer.advance(delta, scene);
        }

        events
    }
}
