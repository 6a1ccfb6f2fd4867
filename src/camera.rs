use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::config::CameraConfig;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig, size: PhysicalSize<u32>) -> Self {
        let mut camera = Self {
            eye: config.position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: config.fov_y_degrees.to_radians(),
            near: config.near,
            far: config.far,
            ..Default::default()
        };
        camera.resize(size);
        camera
    }

    /// Keeps the aspect ratio in sync with the surface. Zero-sized surfaces are ignored.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width > 0 && size.height > 0 {
            self.aspect = size.width as f32 / size.height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn get_vp_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Camera-space right and up axes in world space.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.eye).try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = forward.cross(self.up).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        (right, up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 35.0f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 300.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    position: Vec4,
}

impl CameraUniform {
    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.get_vp_matrix();
        self.position = camera.eye.extend(1.0);
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_aspect_consistent() {
        let mut camera = Camera::default();

        for (width, height) in [(1920, 1080), (800, 600), (333, 1000), (1, 1)] {
            camera.resize(PhysicalSize::new(width, height));
            assert_eq!(camera.aspect, width as f32 / height as f32);
        }
    }

    #[test]
    fn minimized_window_keeps_previous_aspect() {
        let mut camera = Camera::default();
        camera.resize(PhysicalSize::new(1000, 500));
        camera.resize(PhysicalSize::new(0, 0));
        assert_eq!(camera.aspect, 2.0);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = Camera {
            eye: Vec3::new(25.0, 20.0, 20.0),
            ..Default::default()
        };

        let clip = camera.get_vp_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn basis_is_orthonormal() {
        let camera = Camera {
            eye: Vec3::new(26.0, 8.0, -35.0),
            ..Default::default()
        };
        let (right, up) = camera.basis();
        assert!(right.dot(up).abs() < 1e-5);
        assert!((right.length() - 1.0).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
    }
}
