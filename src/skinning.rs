use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::model::{SkinWeights, Vertex};
use crate::scene_graph::{Scene, SkinBinding};

/// `joint_world * inverse_bind` for every joint. Joints that were never
/// spawned or no longer exist fall back to the identity.
pub fn joint_matrices(scene: &Scene, skin: &SkinBinding) -> Vec<Mat4> {
    skin.joint_ids
        .iter()
        .enumerate()
        .map(|(i, joint_id)| {
            let inverse_bind = skin
                .inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Mat4::IDENTITY);

            joint_id
                .and_then(|id| scene.get_object_transform(id))
                .map(|transform| *transform.get_world_matrix() * inverse_bind)
                .unwrap_or(Mat4::IDENTITY)
        })
        .collect()
}

/// Linear blend skinning. The result is in world space.
pub fn skin_vertices(
    bind_pose: &[Vertex],
    weights: &[SkinWeights],
    joint_matrices: &[Mat4],
) -> Vec<Vertex> {
    bind_pose
        .par_iter()
        .zip(weights.par_iter())
        .map(|(vertex, influence)| {
            let mut skin_matrix = Mat4::ZERO;
            let mut total_weight = 0.0;

            for (joint, weight) in influence.joints.iter().zip(influence.weights) {
                if weight <= 0.0 {
                    continue;
                }
                if let Some(matrix) = joint_matrices.get(*joint as usize) {
                    skin_matrix += *matrix * weight;
                    total_weight += weight;
                }
            }

            if total_weight <= 0.0 {
                return *vertex;
            }

            let skin_matrix = skin_matrix * (1.0 / total_weight);

            Vertex {
                position: skin_matrix.transform_point3(vertex.position),
                normal: skin_matrix
                    .transform_vector3(vertex.normal)
                    .try_normalize()
                    .unwrap_or(Vec3::Y),
                color: vertex.color,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::Object3D;

    fn vertex(position: Vec3) -> Vertex {
        Vertex {
            position,
            normal: Vec3::Y,
            color: Vec3::ONE,
        }
    }

    #[test]
    fn single_joint_moves_vertex() {
        let bind_pose = [vertex(Vec3::ZERO)];
        let weights = [SkinWeights {
            joints: [1, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }];
        let joints = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))];

        let skinned = skin_vertices(&bind_pose, &weights, &joints);
        assert!(skinned[0].position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn weights_blend_between_joints() {
        let bind_pose = [vertex(Vec3::ZERO)];
        let weights = [SkinWeights {
            joints: [0, 1, 0, 0],
            weights: [0.5, 0.5, 0.0, 0.0],
        }];
        let joints = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(4.0, 0.0, 0.0))];

        let skinned = skin_vertices(&bind_pose, &weights, &joints);
        assert!(skinned[0].position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn missing_joint_keeps_later_joints_in_place() {
        let mut scene = Scene::new();
        let joint = scene.add_object(Object3D::named("Wing"));
        scene.set_object_translation(joint, Vec3::new(0.0, 3.0, 0.0));
        scene.late_update();

        let skin = SkinBinding {
            joint_ids: vec![None, Some(joint)],
            inverse_bind_matrices: vec![
                Mat4::from_translation(Vec3::X),
                Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
            ],
        };

        let joints = joint_matrices(&scene, &skin);
        assert_eq!(joints.len(), 2);
        assert_eq!(joints[0], Mat4::IDENTITY);
        assert!(joints[1]
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn unweighted_vertex_stays_in_bind_pose() {
        let bind_pose = [vertex(Vec3::ONE)];
        let weights = [SkinWeights {
            joints: [9, 9, 9, 9],
            weights: [1.0, 0.0, 0.0, 0.0],
        }];

        let skinned = skin_vertices(&bind_pose, &weights, &[]);
        assert_eq!(skinned[0], bind_pose[0]);
    }
}
