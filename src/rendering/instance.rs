use glam::{Mat4, Vec4};
use id_arena::Arena;
use wgpu::BufferUsages;

use crate::rendering::render_model::RenderModel;
use crate::scene_graph::{Object3D, Scene};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub normal: Mat4,
    /// x: receives shadows
    pub params: Vec4,
}

impl Instance {
    pub fn from_object(object: &Object3D) -> Self {
        // Skinned vertices are already in world space
        let (model, normal) = if object.skin.is_some() {
            (Mat4::IDENTITY, Mat4::IDENTITY)
        } else {
            (
                *object.transform.get_world_matrix(),
                *object.transform.get_inverse_transpose_world_matrix(),
            )
        };

        Self {
            model,
            normal,
            params: Vec4::new(if object.receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0),
        }
    }

    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x4,
            10 => Float32x4,
            11 => Float32x4,
            12 => Float32x4,
            13 => Float32x4,
        ];

        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[derive(Default)]
pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn as_slice(&self) -> &[Instance] {
        &self.instances
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

/// Grows to fit; never shrinks.
pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    label: String,
}

impl InstanceBuffer {
    pub fn new(device: &wgpu::Device, name: &str, capacity: usize) -> Self {
        let label = format!("Instance buffer ({})", name);
        let capacity = capacity.max(1);
        let buffer = Self::create_buffer(device, &label, capacity);

        Self {
            buffer,
            capacity,
            label,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (size_of::<Instance>() * capacity) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &Instances) {
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.buffer = Self::create_buffer(device, &self.label, self.capacity);
            log::debug!("Grew {} to {} instances", self.label, self.capacity);
        }

        if instances.should_render() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances.as_slice()));
        }
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer.slice(..));
    }
}

/// Rebuilds the per-model instance lists from the scene.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
        render_model.casters.clear();
    }

    for (_, object) in scene.objects.iter() {
        let Some(render_model) = object
            .model_id
            .and_then(|model_id| scene.models.get(model_id))
            .and_then(|model| model.render_model)
            .and_then(|render_model_id| render_models.get_mut(render_model_id))
        else {
            continue;
        };

        let instance = Instance::from_object(object);
        render_model.instances.add(instance);
        if object.cast_shadow {
            render_model.casters.add(instance);
        }
    }
}
