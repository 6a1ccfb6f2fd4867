use std::path::Path;
use std::time::Duration;

use glam::{Quat, Vec3};
use winit::dpi::PhysicalSize;

use crate::animation::{
    AnimationClip, AnimationMixer, AnimationScheduler, PingPong, SchedulerEvent, Tween,
};
use crate::camera::Camera;
use crate::config::{srgb_to_linear, SceneConfig};
use crate::controls::OrbitControls;
use crate::geometry;
use crate::lights::Lights;
use crate::loading::{AssetLoader, LoadEvent, PendingLoads, PostLoad, PropDefinition};
use crate::scene_graph::{Object3D, Scene, SceneModel, SpawnedAsset};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

pub struct GltfAsset {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

pub fn decode_gltf(path: &Path) -> anyhow::Result<GltfAsset> {
    let (document, buffers, _images) = gltf::import(path)?;

    if document.extensions_used().any(|extension| extension == DRACO_EXTENSION) {
        anyhow::bail!("Draco compressed meshes are not supported");
    }

    Ok(GltfAsset { document, buffers })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingStatus {
    pub loaded_bytes: u64,
    pub total_bytes: u64,
    pub fraction: f32,
}

/// Everything the frame loop and the input handlers operate on.
pub struct Diorama {
    pub config: SceneConfig,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub lights: Lights,
    pub scene: Scene,
    scheduler: AnimationScheduler,
    loader: AssetLoader<GltfAsset>,
    pending: PendingLoads,
    all_loaded: bool,
}

impl Diorama {
    pub fn new(config: SceneConfig, size: PhysicalSize<u32>) -> anyhow::Result<Self> {
        let camera = Camera::from_config(&config.camera, size);
        let lights = Lights::from_config(&config);

        let mut diorama = Self {
            camera,
            controls: OrbitControls::new(Vec3::ZERO),
            lights,
            scene: Scene::new(),
            scheduler: AnimationScheduler::new(),
            loader: AssetLoader::new(decode_gltf)?,
            pending: PendingLoads::new(),
            all_loaded: false,
            config,
        };

        diorama.spawn_rocks();
        diorama.request_props()?;

        let intro = diorama.config.intro.tween(diorama.camera.eye);
        diorama.begin_camera_move(intro);

        Ok(diorama)
    }

    fn spawn_rocks(&mut self) {
        let rock = &self.config.rock;
        let color = srgb_to_linear(rock.color.to_srgb());
        let model = geometry::octahedron("Rock", rock.radius, rock.detail, color);
        let model_id = self.scene.add_model(SceneModel::new(model));

        for (i, placement) in self.config.rocks.iter().enumerate() {
            let mut object = Object3D::named(format!("rock{}", i + 1));
            object.model_id = Some(model_id);
            object.cast_shadow = placement.cast_shadow && self.config.shadows.enabled;
            object.transform.set_transform(
                placement.position,
                Quat::IDENTITY,
                Vec3::splat(placement.scale),
            );
            self.scene.add_object(object);
        }
    }

    fn request_props(&mut self) -> anyhow::Result<()> {
        for prop in &self.config.props {
            self.pending.register(prop.clone())?;
            self.loader.request(prop.name.clone(), prop.path.clone());
        }

        Ok(())
    }

    /// Hands the camera to a scripted move. A running move is replaced and never
    /// releases the camera.
    pub fn begin_camera_move(&mut self, tween: Tween) {
        self.controls.disable();
        self.camera.eye = tween.from();
        self.scheduler.start_camera_move(tween);
    }

    pub fn go_to_viewpoint(&mut self, index: usize) {
        let Some(viewpoint) = self.config.viewpoints.get(index) else {
            log::warn!("No viewpoint {}", index + 1);
            return;
        };

        log::debug!("Moving camera to viewpoint {}", index + 1);
        let tween = viewpoint.tween(self.camera.eye);
        self.begin_camera_move(tween);
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.camera.resize(size);
    }

    /// `None` once every asset has settled.
    pub fn loading_status(&self) -> Option<LoadingStatus> {
        if self.all_loaded || self.loader.progress().requested() == 0 {
            return None;
        }

        let progress = self.loader.progress();
        Some(LoadingStatus {
            loaded_bytes: progress.loaded_bytes(),
            total_bytes: progress.total_bytes(),
            fraction: progress.fraction(),
        })
    }

    pub fn tick(&mut self, delta: Duration) {
        self.process_loads();

        let events = self.scheduler.advance(delta, &mut self.scene, &mut self.camera);
        for event in events {
            match event {
                SchedulerEvent::CameraReleased => {
                    log::info!("Camera released to orbit controls");
                    self.controls.enable_with_limits(self.config.orbit_limits);
                }
            }
        }

        self.scene.late_update();
        self.controls.update(&mut self.camera);
    }

    fn process_loads(&mut self) {
        for event in self.loader.poll() {
            match event {
                LoadEvent::Loaded { key, asset } => {
                    let Some(definition) = self.pending.resolve(&key) else {
                        continue;
                    };

                    if let Err(e) = self.spawn_prop(&definition, &asset) {
                        log::error!("Failed to spawn {}: {:?}", key, e);
                    }
                }
                LoadEvent::Failed { key, error } => {
                    log::warn!("{} will be missing from the scene: {:#}", key, error);
                    self.pending.resolve(&key);
                }
                LoadEvent::Progress { loaded, total } => {
                    log::debug!("Loaded {}/{} bytes", loaded, total);
                }
                LoadEvent::AllLoaded => {
                    self.all_loaded = true;
                }
            }
        }
    }

    fn spawn_prop(&mut self, definition: &PropDefinition, asset: &GltfAsset) -> anyhow::Result<()> {
        let source = definition.path.to_string_lossy();
        let spawned =
            self.scene
                .spawn_gltf_asset(&definition.name, &source, &asset.document, &asset.buffers)?;

        let placement = &definition.placement;
        self.scene.set_object_transform(
            spawned.root,
            placement.position,
            placement.rotation(),
            placement.scale,
        );

        let shadows = self.config.shadows.enabled;
        self.scene.set_shadow_flags(
            spawned.root,
            definition.cast_shadow && shadows,
            definition.receive_shadow && shadows,
        );

        for hook in &definition.hooks {
            self.start_hook(definition, hook, asset, &spawned);
        }

        log::debug!(
            "Spawned {} with {} nodes",
            definition.name,
            spawned.node_objects.len()
        );

        Ok(())
    }

    fn start_hook(
        &mut self,
        definition: &PropDefinition,
        hook: &PostLoad,
        asset: &GltfAsset,
        spawned: &SpawnedAsset,
    ) {
        let origin = definition.placement.position;

        match hook {
            PostLoad::Drift {
                to,
                out_ms,
                back_ms,
                easing,
            } => {
                let drift = PingPong::new(
                    origin,
                    *to,
                    Duration::from_millis(*out_ms),
                    Duration::from_millis(*back_ms),
                    *easing,
                );
                self.scheduler.add_drift(spawned.root, drift);
            }
            PostLoad::FlyTo {
                to,
                duration_ms,
                easing,
            } => {
                let tween = Tween::new(origin, *to, Duration::from_millis(*duration_ms))
                    .with_easing(*easing);
                self.scheduler.add_object_tween(spawned.root, tween);
            }
            PostLoad::PlayClip { clip, time_scale } => {
                let Some(animation) = asset.document.animations().nth(*clip) else {
                    log::warn!("{} has no animation clip {}", definition.name, clip);
                    return;
                };

                match AnimationClip::from_gltf(&animation, &asset.buffers) {
                    Ok(clip) => {
                        let mixer = AnimationMixer::new(clip, &spawned.node_objects, *time_scale);
                        log::debug!("Playing {} on {}", mixer.clip_name(), definition.name);
                        self.scheduler.add_mixer(mixer);
                    }
                    Err(e) => log::warn!("Skipping clip of {}: {:?}", definition.name, e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diorama_without_props() -> Diorama {
        let mut config = SceneConfig::from_ron(include_str!("../assets/scene.ron")).unwrap();
        config.props.clear();
        Diorama::new(config, PhysicalSize::new(1280, 720)).unwrap()
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn intro_starts_from_scripted_position() {
        let mut diorama = diorama_without_props();
        diorama.tick(Duration::ZERO);

        assert!(diorama.camera.eye.abs_diff_eq(Vec3::new(26.0, 8.0, -35.0), 1e-3));
        assert!(!diorama.controls.is_enabled());
    }

    #[test]
    fn intro_releases_camera_exactly_at_end() {
        let mut diorama = diorama_without_props();
        let step = ms(100);
        let total = diorama.config.intro.delay_ms + diorama.config.intro.duration_ms;

        for _ in 0..(total / 100 - 1) {
            diorama.tick(step);
            assert!(!diorama.controls.is_enabled());
        }

        diorama.tick(step);

        assert!(diorama.controls.is_enabled());
        assert!(diorama.camera.eye.abs_diff_eq(Vec3::new(25.0, 20.0, 20.0), 1e-3));
        assert_eq!(diorama.controls.limits(), &diorama.config.orbit_limits);
    }

    #[test]
    fn camera_stays_put_after_release() {
        let mut diorama = diorama_without_props();
        diorama.tick(ms(7500));
        assert!(diorama.controls.is_enabled());

        for _ in 0..10 {
            diorama.tick(ms(16));
        }

        assert!(diorama.camera.eye.abs_diff_eq(Vec3::new(25.0, 20.0, 20.0), 1e-3));
    }

    #[test]
    fn viewpoint_takes_camera_from_user() {
        let mut diorama = diorama_without_props();
        diorama.tick(ms(7500));

        diorama.go_to_viewpoint(1);
        assert!(!diorama.controls.is_enabled());

        diorama.tick(ms(2000));
        assert!(!diorama.controls.is_enabled());

        diorama.tick(ms(2000));
        assert!(diorama.controls.is_enabled());
        // The polar limit may tilt the final position slightly, never the distance
        let expected = Vec3::new(10.0, 5.0, 17.0);
        assert!((diorama.camera.eye.length() - expected.length()).abs() < 1e-3);
        assert!(diorama.camera.eye.distance(expected) < 0.5);
    }

    #[test]
    fn viewpoint_during_intro_replaces_it() {
        let mut diorama = diorama_without_props();
        diorama.tick(ms(3000));

        diorama.go_to_viewpoint(0);
        diorama.tick(ms(3999));
        assert!(!diorama.controls.is_enabled());

        diorama.tick(ms(1));
        assert!(diorama.controls.is_enabled());
        assert!(diorama.camera.eye.abs_diff_eq(Vec3::new(25.0, 20.0, 20.0), 1e-3));
    }

    #[test]
    fn unknown_viewpoint_is_ignored() {
        let mut diorama = diorama_without_props();
        diorama.tick(ms(7500));

        diorama.go_to_viewpoint(9);
        assert!(diorama.controls.is_enabled());
    }

    #[test]
    fn rocks_share_one_model() {
        let diorama = diorama_without_props();

        assert_eq!(diorama.scene.object_count(), 3);
        assert_eq!(diorama.scene.models.len(), 1);
        assert!(diorama.loading_status().is_none());
    }

    #[test]
    fn resize_updates_aspect() {
        let mut diorama = diorama_without_props();
        diorama.resize(PhysicalSize::new(800, 400));
        assert_eq!(diorama.camera.aspect, 2.0);
    }

    #[test]
    fn missing_models_still_finish_loading() {
        let mut config = SceneConfig::from_ron(include_str!("../assets/scene.ron")).unwrap();
        for prop in &mut config.props {
            prop.path = format!("does/not/exist/{}.glb", prop.name).into();
        }
        let mut diorama = Diorama::new(config, PhysicalSize::new(640, 480)).unwrap();
        assert!(diorama.loading_status().is_some());

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while diorama.loading_status().is_some() && std::time::Instant::now() < deadline {
            diorama.tick(ms(1));
            std::thread::sleep(ms(5));
        }

        assert!(diorama.loading_status().is_none());
        assert_eq!(diorama.scene.object_count(), 3);
    }
}
