use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::gfx::{geometry::GeometryData, scene::ImageData};

use super::AssetError;

/// One mesh of a loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMesh {
    pub name: String,
    pub geometry: GeometryData,
    /// Diffuse colour from the model's material library, if it has one
    pub diffuse: Option<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedModel {
    pub meshes: Vec<LoadedMesh>,
}

/// Where model and image bytes come from
///
/// Implementations are called from worker threads.
pub trait AssetSource: Send + Sync + 'static {
    fn load_model(&self, path: &str) -> Result<LoadedModel, AssetError>;

    /// Loads a model whose materials live in an explicitly named MTL file
    fn load_model_with_mtl(&self, obj: &str, mtl: &str) -> Result<LoadedModel, AssetError>;

    fn load_image(&self, path: &str) -> Result<ImageData, AssetError>;
}

/// Loads OBJ/MTL files with `tobj` and images with `image`, relative to a root
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

impl AssetSource for FsAssetSource {
    fn load_model(&self, path: &str) -> Result<LoadedModel, AssetError> {
        let full = self.resolve(path);
        log::debug!("Loading model {}", full.display());

        let (models, materials) =
            tobj::load_obj(&full, &load_options()).map_err(|source| AssetError::Obj {
                path: full.clone(),
                source,
            })?;

        let materials = materials.unwrap_or_else(|err| {
            log::debug!("{} has no usable material library: {err}", full.display());
            Vec::new()
        });

        convert_models(&full, &models, &materials)
    }

    fn load_model_with_mtl(&self, obj: &str, mtl: &str) -> Result<LoadedModel, AssetError> {
        let obj_path = self.resolve(obj);
        let mtl_path = self.resolve(mtl);
        log::debug!(
            "Loading model {} with materials {}",
            obj_path.display(),
            mtl_path.display()
        );

        let file = File::open(&obj_path).map_err(|source| AssetError::Io {
            path: obj_path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let (models, materials) =
            tobj::load_obj_buf(&mut reader, &load_options(), |_| tobj::load_mtl(&mtl_path))
                .map_err(|source| AssetError::Obj {
                    path: obj_path.clone(),
                    source,
                })?;

        let materials = materials.map_err(|source| AssetError::Obj {
            path: mtl_path.clone(),
            source,
        })?;

        convert_models(&obj_path, &models, &materials)
    }

    fn load_image(&self, path: &str) -> Result<ImageData, AssetError> {
        let full = self.resolve(path);

        let rgba = image::open(&full)
            .map_err(|source| AssetError::Image {
                path: full.clone(),
                source,
            })?
            .to_rgba8();
        let (width, height) = rgba.dimensions();

        log::debug!("Loaded image {}x{} from {}", width, height, full.display());

        Ok(ImageData {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

fn convert_models(
    path: &Path,
    models: &[tobj::Model],
    materials: &[tobj::Material],
) -> Result<LoadedModel, AssetError> {
    let meshes: Vec<LoadedMesh> = models
        .iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let mesh = &model.mesh;
            let diffuse = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|material| material.diffuse);

            LoadedMesh {
                name: model.name.clone(),
                geometry: convert_mesh(mesh),
                diffuse,
            }
        })
        .collect();

    if meshes.is_empty() {
        return Err(AssetError::EmptyModel(path.to_path_buf()));
    }

    Ok(LoadedModel { meshes })
}

fn convert_mesh(mesh: &tobj::Mesh) -> GeometryData {
    let vertices: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        Vec::new()
    };

    // OBJ puts v = 0 at the bottom of the image
    let tex_coords = if mesh.texcoords.len() / 2 == vertices.len() {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect()
    } else {
        vec![[0.0, 0.0]; vertices.len()]
    };

    GeometryData {
        vertices,
        tex_coords,
        normals,
        indices: mesh.indices.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_mesh_flips_v_and_pads_uvs() {
        let mesh = tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            texcoords: vec![0.0, 0.0, 1.0, 0.25, 0.0, 1.0],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let geometry = convert_mesh(&mesh);
        assert_eq!(geometry.vertex_count(), 3);
        assert_eq!(geometry.tex_coords[1], [1.0, 0.75]);
        assert!(geometry.normals.is_empty());

        let bare = tobj::Mesh {
            positions: mesh.positions.clone(),
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        assert_eq!(convert_mesh(&bare).tex_coords.len(), 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = FsAssetSource::new("/nonexistent-asset-root");
        assert!(matches!(
            source.load_model("missing.obj"),
            Err(AssetError::Obj { .. })
        ));
        assert!(matches!(
            source.load_model_with_mtl("missing.obj", "missing.mtl"),
            Err(AssetError::Io { .. })
        ));
        assert!(matches!(
            source.load_image("missing.png"),
            Err(AssetError::Image { .. })
        ));
    }
}
