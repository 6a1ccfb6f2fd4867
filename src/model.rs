use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4, Vec4Swizzles};
use gltf::buffer;
use itertools::izip;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Linear RGB albedo
    pub color: Vec3,
}

/// Up to four joint influences of one vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SkinWeights {
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub skin_weights: Option<Vec<SkinWeights>>,
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of {}: unsupported mode {:?}",
                    primitive.index(),
                    model.name,
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .with_context(|| format!("Primitive without positions in {}", model.name))?
                .map(Vec3::from)
                .collect();

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let normals: Vec<Vec3> = match reader.read_normals() {
                Some(normals) => normals.map(Vec3::from).collect(),
                None => compute_normals(&positions, &indices),
            };

            let base_color =
                Vec4::from(primitive.material().pbr_metallic_roughness().base_color_factor()).xyz();

            let colors: Vec<Vec3> = match reader.read_colors(0) {
                Some(colors) => colors
                    .into_rgb_f32()
                    .map(|color| Vec3::from(color) * base_color)
                    .collect(),
                None => vec![base_color; positions.len()],
            };

            let vertices = izip!(positions, normals, colors)
                .map(|(position, normal, color)| Vertex {
                    position,
                    normal,
                    color,
                })
                .collect::<Vec<Vertex>>();

            let skin_weights = match (reader.read_joints(0), reader.read_weights(0)) {
                (Some(joints), Some(weights)) => Some(
                    joints
                        .into_u16()
                        .zip(weights.into_f32())
                        .map(|(joints, weights)| SkinWeights { joints, weights })
                        .collect::<Vec<_>>(),
                ),
                _ => None,
            };

            model.primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
                skin_weights,
            });
        }

        if model.primitives.is_empty() {
            return Err(anyhow::anyhow!("Mesh without primitives: {}", model.name));
        }

        Ok(model)
    }

    pub fn is_skinned(&self) -> bool {
        self.primitives
            .iter()
            .any(|primitive| primitive.skin_weights.is_some())
    }
}

/// Smooth normals from the triangle list, for meshes exported without them.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }

        let face_normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }

    normals
        .into_iter()
        .map(|normal| normal.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}
