use std::sync::Arc;

use cgmath::Matrix4;

use crate::assets::PreparedModel;
use crate::gfx::scene::{
    rgb, GeometryKey, Material, NodeKey, SceneError, SceneGraph, VisualNode,
};

#[derive(Debug, Clone)]
struct MeshHandle {
    name: String,
    geometry: GeometryKey,
    material: Material,
}

/// A loaded model uploaded into the graph's stores once, then instantiated
/// as often as needed
#[derive(Debug, Clone)]
pub struct ModelHandles {
    meshes: Vec<MeshHandle>,
    transform: Matrix4<f32>,
}

impl ModelHandles {
    pub fn upload(graph: &mut SceneGraph, label: &str, model: &PreparedModel) -> Self {
        let texture = model.texture.as_ref().map(|image| {
            let slot = graph.create_texture(label);
            graph.fill_texture(slot, Arc::clone(image));
            slot
        });

        let meshes = model
            .meshes
            .iter()
            .map(|mesh| {
                let material = match (texture, mesh.diffuse) {
                    (Some(map), _) => Material::Lambert {
                        color: [1.0, 1.0, 1.0],
                        map: Some(map),
                    },
                    (None, Some(color)) => Material::Phong {
                        color,
                        specular: rgb(0x111111),
                        shininess: 30.0,
                    },
                    (None, None) => Material::phong(0xFFFFFF, 0x111111, 30.0),
                };
                MeshHandle {
                    name: mesh.name.clone(),
                    geometry: graph.insert_shared_geometry(Arc::clone(&mesh.geometry)),
                    material,
                }
            })
            .collect();

        Self {
            meshes,
            transform: model.transform,
        }
    }

    /// Adds a group holding every mesh of the model under `parent`
    pub fn instantiate(&self, graph: &mut SceneGraph, parent: NodeKey) -> Result<NodeKey, SceneError> {
        let group = graph.add_child(
            parent,
            VisualNode::group("model").with_transform(self.transform),
        )?;
        for mesh in &self.meshes {
            graph.add_child(
                group,
                VisualNode::mesh(mesh.name.clone(), mesh.geometry, mesh.material).with_shadows(),
            )?;
        }
        Ok(group)
    }
}
