use glam::{Mat4, Vec3};
use id_arena::Id;

use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// Joints driving a skinned mesh, in glTF joint order. `None` marks a joint
/// node that was never spawned so later joints keep their index.
#[derive(Debug, Clone)]
pub struct SkinBinding {
    pub joint_ids: Vec<Option<ObjectId>>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub skin: Option<SkinBinding>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Object3D {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Object3D> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_object(*id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            model_id: None,
            skin: None,
            parent_id: None,
            child_ids: Vec::new(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}
