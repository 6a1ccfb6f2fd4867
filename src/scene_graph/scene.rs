use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::HashMap;

use anyhow::Context;

use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectId, SkinBinding};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GltfMeshKey {
    source: String,
    mesh_index: usize,
}

/// Objects created from one glTF file.
pub struct SpawnedAsset {
    pub root: ObjectId,
    /// glTF node index to the object spawned for it
    pub node_objects: HashMap<usize, ObjectId>,
}

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<GltfMeshKey, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Spawns the default scene of a glTF document under a new root object named `name`.
    ///
    /// Meshes are shared between spawns of the same `source` file unless they are skinned,
    /// because skinned vertices are rewritten per object every frame.
    pub fn spawn_gltf_asset(
        &mut self,
        name: &str,
        source: &str,
        document: &gltf::Document,
        buffers: Buffers,
    ) -> anyhow::Result<SpawnedAsset> {
        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .with_context(|| format!("No scenes in {}", source))?;

        let root = self.add_object(Object3D::named(name));
        let mut node_objects = HashMap::new();

        for node in gltf_scene.nodes() {
            self.spawn_gltf_node(source, buffers, &node, root, &mut node_objects);
        }

        for node in gltf_scene.nodes() {
            self.bind_gltf_skins(buffers, &node, &node_objects);
        }

        Ok(SpawnedAsset { root, node_objects })
    }

    fn spawn_gltf_node(
        &mut self,
        source: &str,
        buffers: Buffers,
        node: &gltf::Node,
        parent: ObjectId,
        node_objects: &mut HashMap<usize, ObjectId>,
    ) -> ObjectId {
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut object = Object3D::named(node_name.clone());
        object.transform.set_transform(
            translation.into(),
            Quat::from_array(rotation),
            scale.into(),
        );

        if let Some(mesh) = node.mesh() {
            let skinned = node.skin().is_some();
            object.model_id = self.model_for_mesh(source, buffers, &node_name, mesh, skinned);
        }

        let object_id = self.add_object(object);
        node_objects.insert(node.index(), object_id);
        self.set_object_parent(object_id, Some(parent));

        for child in node.children() {
            self.spawn_gltf_node(source, buffers, &child, object_id, node_objects);
        }

        object_id
    }

    fn model_for_mesh(
        &mut self,
        source: &str,
        buffers: Buffers,
        node_name: &str,
        mesh: gltf::Mesh,
        skinned: bool,
    ) -> Option<SceneModelId> {
        let key = GltfMeshKey {
            source: source.to_string(),
            mesh_index: mesh.index(),
        };

        if !skinned {
            if let Some(model_id) = self.gltf_mesh_to_model.get(&key) {
                return Some(*model_id);
            }
        }

        let mesh_name = mesh
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("{} (Mesh)", node_name));

        match Model::from_gltf(mesh_name, mesh, buffers) {
            Ok(model) => {
                let model_id = self.add_model(SceneModel::new(model));
                if !skinned {
                    self.gltf_mesh_to_model.insert(key, model_id);
                }
                Some(model_id)
            }
            Err(e) => {
                log::warn!("Skipping mesh of {} in {}: {:?}", node_name, source, e);
                None
            }
        }
    }

    fn bind_gltf_skins(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        node_objects: &HashMap<usize, ObjectId>,
    ) {
        if let Some(skin) = node.skin() {
            let joint_ids: Vec<Option<ObjectId>> = skin
                .joints()
                .map(|joint| node_objects.get(&joint.index()).copied())
                .collect();

            let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
            let inverse_bind_matrices: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
                Some(matrices) => matrices.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
                None => vec![Mat4::IDENTITY; joint_ids.len()],
            };

            if joint_ids.len() != inverse_bind_matrices.len() {
                log::warn!(
                    "Skin on {} has {} joints but {} inverse bind matrices",
                    node.name().unwrap_or("Unnamed"),
                    joint_ids.len(),
                    inverse_bind_matrices.len()
                );
            }

            if let Some(object) = node_objects
                .get(&node.index())
                .and_then(|id| self.objects.get_mut(*id))
            {
                object.skin = Some(SkinBinding {
                    joint_ids,
                    inverse_bind_matrices,
                });
            }
        }

        for child in node.children() {
            self.bind_gltf_skins(buffers, &child, node_objects);
        }
    }

    /// Applies shadow flags to an object and everything below it.
    pub fn set_shadow_flags(&mut self, object_id: ObjectId, cast: bool, receive: bool) {
        let child_ids = match self.objects.get_mut(object_id) {
            Some(object) => {
                object.cast_shadow = cast;
                object.receive_shadow = receive;
                object.child_ids.clone()
            }
            None => return,
        };

        for child_id in child_ids {
            self.set_shadow_flags(child_id, cast, receive);
        }
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    /// Recursively updates an object's world transform and its children
    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_rotation(&mut self, object_id: ObjectId, rotation: Quat) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_rotation(rotation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_world_matrix_includes_parent() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::named("Island"));
        let child = scene.add_object(Object3D::named("Palm"));
        scene.set_object_parent(child, Some(parent));

        scene.set_object_transform(
            parent,
            Vec3::new(0.0, 2.0, 0.0),
            Quat::IDENTITY,
            Vec3::splat(0.5),
        );
        scene.set_object_translation(child, Vec3::new(4.0, 0.0, 0.0));
        scene.late_update();

        let world = *scene.get_object_transform(child).unwrap().get_world_matrix();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(2.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn moving_parent_moves_children_next_update() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::named("Cloud"));
        let child = scene.add_object(Object3D::named("Puff"));
        scene.set_object_parent(child, Some(parent));
        scene.late_update();

        scene.set_object_translation(parent, Vec3::new(-1.0, 10.0, -1.0));
        scene.late_update();

        let world = *scene.get_object_transform(child).unwrap().get_world_matrix();
        assert!(world
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(-1.0, 10.0, -1.0), 1e-6));
    }

    #[test]
    fn reparenting_updates_child_lists() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::named("A"));
        let b = scene.add_object(Object3D::named("B"));
        let child = scene.add_object(Object3D::named("Child"));

        scene.set_object_parent(child, Some(a));
        scene.set_object_parent(child, Some(b));

        assert!(scene.get_object(a).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_object(b).unwrap().child_ids, vec![child]);
        assert_eq!(scene.get_object(child).unwrap().parent_id, Some(b));
    }

    #[test]
    fn shadow_flags_reach_every_descendant() {
        let mut scene = Scene::new();
        let root = scene.add_object(Object3D::named("Tree"));
        let trunk = scene.add_object(Object3D::named("Trunk"));
        let leaves = scene.add_object(Object3D::named("Leaves"));
        scene.set_object_parent(trunk, Some(root));
        scene.set_object_parent(leaves, Some(trunk));

        scene.set_shadow_flags(root, true, false);

        let root_object = scene.get_object(root).unwrap();
        assert_eq!(root_object.children(&scene).count(), 1);
        for id in [root, trunk, leaves] {
            let object = scene.get_object(id).unwrap();
            assert!(object.cast_shadow);
            assert!(!object.receive_shadow);
        }
    }
}
