use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::camera::Camera;

const MIN_POLAR_EPSILON: f32 = 1e-6;

/// Constraints applied once the scripted intro hands the camera to the user.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OrbitLimits {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
}

impl OrbitLimits {
    pub fn unconstrained() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
        }
    }
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self::unconstrained()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }

        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit, dolly and pan around a target point.
///
/// While disabled, pointer input is ignored so that a scripted move has sole
/// control of the camera. `update` still runs every frame to keep the camera
/// looking at the target.
pub struct OrbitControls {
    pub target: Vec3,
    enabled: bool,
    limits: OrbitLimits,
    rotate_speed: f32,
    zoom_speed: f32,
    pan_speed: f32,

    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,

    drag: Option<DragMode>,
    last_pointer: Option<Vec2>,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enabled: true,
            limits: OrbitLimits::unconstrained(),
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            drag: None,
            last_pointer: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limits(&self) -> &OrbitLimits {
        &self.limits
    }

    /// Hands the camera to a script. Pending motion and drags are dropped.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.drag = None;
        self.last_pointer = None;
        self.reset_deltas();
    }

    pub fn enable_with_limits(&mut self, limits: OrbitLimits) {
        self.enabled = true;
        self.limits = limits;
    }

    fn reset_deltas(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }

    pub fn on_pointer_down(&mut self, button: PointerButton, position: Vec2) {
        if !self.enabled {
            return;
        }

        self.drag = match button {
            PointerButton::Primary if self.limits.enable_rotate => Some(DragMode::Rotate),
            PointerButton::Secondary | PointerButton::Middle if self.limits.enable_pan => {
                Some(DragMode::Pan)
            }
            _ => None,
        };
        self.last_pointer = Some(position);
    }

    pub fn on_pointer_up(&mut self, _button: PointerButton) {
        self.drag = None;
        self.last_pointer = None;
    }

    /// `viewport_height` is in the same units as `position`.
    pub fn on_pointer_move(&mut self, position: Vec2, viewport_height: f32, camera: &Camera) {
        let previous = self.last_pointer.replace(position);

        if !self.enabled || viewport_height <= 0.0 {
            return;
        }

        let (Some(mode), Some(previous)) = (self.drag, previous) else {
            return;
        };

        let delta = position - previous;

        match mode {
            DragMode::Rotate => {
                self.delta_theta -= TAU * delta.x / viewport_height * self.rotate_speed;
                self.delta_phi -= TAU * delta.y / viewport_height * self.rotate_speed;
            }
            DragMode::Pan => self.pan(delta, viewport_height, camera),
        }
    }

    /// Positive `notches` dolly towards the target.
    pub fn on_wheel(&mut self, notches: f32) {
        if !self.enabled || !self.limits.enable_zoom || notches == 0.0 {
            return;
        }

        let zoom_scale = 0.95f32.powf(self.zoom_speed * notches.abs());
        if notches > 0.0 {
            self.scale *= zoom_scale;
        } else {
            self.scale /= zoom_scale;
        }
    }

    fn pan(&mut self, delta: Vec2, viewport_height: f32, camera: &Camera) {
        let distance = (camera.eye - self.target).length() * (camera.fov_y / 2.0).tan();
        let (right, up) = camera.basis();

        let left = -right * (2.0 * delta.x * distance / viewport_height) * self.pan_speed;
        let up = up * (2.0 * delta.y * distance / viewport_height) * self.pan_speed;
        self.pan_offset += left + up;
    }

    /// Applies pending motion and limits to the camera.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.eye - self.target;
        let mut spherical = Spherical::from_offset(offset);

        let damping = if self.limits.enable_damping {
            self.limits.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.delta_theta * damping;
        spherical.phi += self.delta_phi * damping;

        spherical.phi = spherical
            .phi
            .clamp(self.limits.min_polar_angle, self.limits.max_polar_angle)
            .clamp(MIN_POLAR_EPSILON, PI - MIN_POLAR_EPSILON);

        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.limits.min_distance, self.limits.max_distance);

        self.target += self.pan_offset * damping;

        camera.eye = self.target + spherical.to_offset();
        camera.target = self.target;

        if self.limits.enable_damping {
            self.delta_theta *= 1.0 - self.limits.damping_factor;
            self.delta_phi *= 1.0 - self.limits.damping_factor;
            self.pan_offset *= 1.0 - self.limits.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }

        self.scale = 1.0;
    }
}
