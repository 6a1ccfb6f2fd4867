use std::mem::offset_of;

use id_arena::Id;
use wgpu::util::DeviceExt;

use crate::model::{Model, ModelPrimitive, Vertex};
use crate::rendering::instance::{InstanceBuffer, Instances};

pub type RenderModelId = Id<RenderModel>;

const INITIAL_INSTANCE_CAPACITY: usize = 8;

pub struct RenderPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl RenderPrimitive {
    fn from_primitive(device: &wgpu::Device, model: &Model, primitive: &ModelPrimitive) -> Self {
        let vertex_buffer_name = format!(
            "Vertex buffer ({}, primitive {})",
            model.name, primitive.index
        );
        let index_buffer_name = format!(
            "Index buffer ({}, primitive {})",
            model.name, primitive.index
        );

        // Skinned vertices are rewritten every frame
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&vertex_buffer_name),
            contents: bytemuck::cast_slice(&primitive.vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&index_buffer_name),
            contents: bytemuck::cast_slice(&primitive.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: primitive.indices.len() as u32,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, instance_count: u32) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..instance_count);
    }
}

pub struct RenderModel {
    pub name: String,
    pub primitives: Vec<RenderPrimitive>,
    pub instances: Instances,
    pub casters: Instances,
    instance_buffer: InstanceBuffer,
    caster_buffer: InstanceBuffer,
}

impl RenderModel {
    pub fn from_model(device: &wgpu::Device, model: &Model) -> Self {
        let primitives = model
            .primitives
            .iter()
            .map(|primitive| RenderPrimitive::from_primitive(device, model, primitive))
            .collect();

        RenderModel {
            name: model.name.clone(),
            primitives,
            instances: Instances::new(),
            casters: Instances::new(),
            instance_buffer: InstanceBuffer::new(device, &model.name, INITIAL_INSTANCE_CAPACITY),
            caster_buffer: InstanceBuffer::new(
                device,
                &format!("{} casters", model.name),
                INITIAL_INSTANCE_CAPACITY,
            ),
        }
    }

    pub fn upload_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.instance_buffer.write(device, queue, &self.instances);
        self.caster_buffer.write(device, queue, &self.casters);
    }

    pub fn draw_instances(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        Self::draw_with(render_pass, &self.primitives, &self.instance_buffer, &self.instances);
    }

    pub fn draw_casters(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        Self::draw_with(render_pass, &self.primitives, &self.caster_buffer, &self.casters);
    }

    fn draw_with(
        render_pass: &mut wgpu::RenderPass<'_>,
        primitives: &[RenderPrimitive],
        buffer: &InstanceBuffer,
        instances: &Instances,
    ) {
        if !instances.should_render() {
            return;
        }

        buffer.bind(render_pass);
        for primitive in primitives {
            primitive.draw(render_pass, instances.len() as u32);
        }
    }
}

pub const RENDER_MODEL_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x3,
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(RENDER_MODEL_VBL.array_stride, 36);
        assert_eq!(RENDER_MODEL_VBL.attributes[2].offset, 24);
    }
}
