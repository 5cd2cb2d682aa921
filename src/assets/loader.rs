use std::{
    cell::{Cell, RefCell},
    future::Future,
    rc::Rc,
    sync::Arc,
};

use cgmath::{Matrix4, Rad};
use futures::{
    channel::oneshot,
    executor::{LocalPool, LocalSpawner},
    task::LocalSpawnExt,
};

use crate::gfx::{
    geometry::GeometryData,
    scene::{CubeTextureKey, ImageData, TextureKey},
};

use super::{AssetError, AssetSource, LoadedModel};

/// Id of one build of a rebuildable part of the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Hands out strictly increasing generations
#[derive(Debug, Default)]
pub struct GenerationCounter {
    last: u64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> Generation {
        self.last += 1;
        Generation(self.last)
    }
}

/// Mesh ready to be inserted into the scene graph
#[derive(Debug, Clone)]
pub struct PreparedMesh {
    pub name: String,
    pub geometry: Arc<GeometryData>,
    pub diffuse: Option<[f32; 3]>,
}

/// Model with normals computed and its placement transform decided
#[derive(Debug, Clone)]
pub struct PreparedModel {
    pub meshes: Vec<PreparedMesh>,
    pub texture: Option<Arc<ImageData>>,
    /// Local transform of the node holding the meshes
    pub transform: Matrix4<f32>,
}

impl PreparedModel {
    fn new(model: LoadedModel, texture: Option<Arc<ImageData>>, transform: Matrix4<f32>) -> Self {
        let meshes = model
            .meshes
            .into_iter()
            .map(|mesh| {
                let mut geometry = mesh.geometry;
                geometry.compute_vertex_normals();
                PreparedMesh {
                    name: mesh.name,
                    geometry: Arc::new(geometry),
                    diffuse: mesh.diffuse,
                }
            })
            .collect();

        Self {
            meshes,
            texture,
            transform,
        }
    }
}

/// Which part of the room a model load feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTarget {
    Sunflowers,
    FlowerHeads,
}

/// A finished load, delivered by [`PendingLoads::poll`]
#[derive(Debug)]
pub enum Completion {
    Model {
        target: ModelTarget,
        generation: Generation,
        path: &'static str,
        result: Result<Arc<PreparedModel>, AssetError>,
    },
    Texture {
        slot: TextureKey,
        path: &'static str,
        result: Result<Arc<ImageData>, AssetError>,
    },
    CubeTexture {
        slot: CubeTextureKey,
        result: Result<[Arc<ImageData>; 6], AssetError>,
    },
}

/// Issues asset loads on worker threads
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    fn spawn<T, F>(&self, label: &str, job: F) -> impl Future<Output = Result<T, AssetError>>
    where
        T: Send + 'static,
        F: FnOnce(&dyn AssetSource) -> Result<T, AssetError> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let label = label.to_string();

        let spawned = std::thread::Builder::new()
            .name("asset-io".into())
            .spawn(move || {
                // The receiver may already be gone; nothing to report then
                let _ = sender.send(job(source.as_ref()));
            });
        if let Err(err) = spawned {
            log::warn!("Could not start loader thread for {label}: {err}");
        }

        async move {
            receiver
                .await
                .map_err(|_| AssetError::Cancelled(label))?
        }
    }

    pub fn load_image(
        &self,
        path: &'static str,
    ) -> impl Future<Output = Result<Arc<ImageData>, AssetError>> {
        let image = self.spawn(path, move |source| source.load_image(path));
        async move { image.await.map(Arc::new) }
    }

    /// Loads the six faces of a cube texture in parallel
    pub fn load_cube(
        &self,
        faces: [&'static str; 6],
    ) -> impl Future<Output = Result<[Arc<ImageData>; 6], AssetError>> {
        let [px, nx, py, ny, pz, nz] = faces.map(|face| self.load_image(face));
        async move {
            let (px, nx, py, ny, pz, nz) = futures::try_join!(px, nx, py, ny, pz, nz)?;
            Ok([px, nx, py, ny, pz, nz])
        }
    }

    /// Loads an OBJ model and its texture concurrently
    ///
    /// Normals are recomputed, and the model is tilted by `x_rotation` and
    /// scaled uniformly by `size`.
    pub fn load_textured_model(
        &self,
        obj: &'static str,
        texture: &'static str,
        size: f32,
        x_rotation: Rad<f32>,
    ) -> impl Future<Output = Result<PreparedModel, AssetError>> {
        let model = self.spawn(obj, move |source| source.load_model(obj));
        let image = self.load_image(texture);

        async move {
            let (model, image) = futures::try_join!(model, image)?;
            let transform = Matrix4::from_angle_x(x_rotation) * Matrix4::from_scale(size);
            Ok(PreparedModel::new(model, Some(image), transform))
        }
    }

    /// Loads an OBJ model with an explicit MTL file, keeping its diffuse colours
    pub fn load_model_with_mtl(
        &self,
        obj: &'static str,
        mtl: &'static str,
        size: f32,
    ) -> impl Future<Output = Result<PreparedModel, AssetError>> {
        let model = self.spawn(obj, move |source| source.load_model_with_mtl(obj, mtl));

        async move {
            let model = model.await?;
            Ok(PreparedModel::new(model, None, Matrix4::from_scale(size)))
        }
    }
}

/// Drives in-flight loads on the main thread
///
/// Futures run on a [`LocalPool`]; each finished future pushes its
/// [`Completion`] into a shared queue that [`poll`](PendingLoads::poll)
/// drains.
pub struct PendingLoads {
    pool: LocalPool,
    spawner: LocalSpawner,
    finished: Rc<RefCell<Vec<Completion>>>,
    in_flight: Rc<Cell<usize>>,
}

impl Default for PendingLoads {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingLoads {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool,
            spawner,
            finished: Rc::new(RefCell::new(Vec::new())),
            in_flight: Rc::new(Cell::new(0)),
        }
    }

    /// Starts driving `load`; `complete` wraps its output once it finishes
    pub fn track<F, C>(&mut self, load: F, complete: C)
    where
        F: Future + 'static,
        C: FnOnce(F::Output) -> Completion + 'static,
    {
        let finished = Rc::clone(&self.finished);
        let in_flight = Rc::clone(&self.in_flight);
        in_flight.set(in_flight.get() + 1);

        let task = async move {
            let output = load.await;
            finished.borrow_mut().push(complete(output));
            in_flight.set(in_flight.get() - 1);
        };

        if let Err(err) = self.spawner.spawn_local(task) {
            log::warn!("Could not schedule asset load: {err}");
            self.in_flight.set(self.in_flight.get() - 1);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// Makes as much progress as possible without blocking
    pub fn poll(&mut self) -> Vec<Completion> {
        self.pool.run_until_stalled();
        self.finished.borrow_mut().drain(..).collect()
    }

    /// Blocks until every tracked load has finished
    pub fn wait_all(&mut self) -> Vec<Completion> {
        self.pool.run();
        self.finished.borrow_mut().drain(..).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gfx::{geometry::generate_cube, scene::SceneGraph};
    use crate::assets::LoadedMesh;
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    /// Serves fixed models and images from memory, counting requests
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub models: HashMap<String, LoadedModel>,
        pub images: HashMap<String, ImageData>,
        pub requests: AtomicUsize,
        pub requested: Mutex<Vec<String>>,
    }

    impl MemorySource {
        /// Every asset the room asks for, as tiny placeholders
        pub fn room() -> Self {
            let mut source = Self::default();
            let cube = LoadedModel {
                meshes: vec![LoadedMesh {
                    name: "cube".into(),
                    geometry: generate_cube(),
                    diffuse: Some([1.0, 0.8, 0.0]),
                }],
            };
            for model in [
                crate::assets::paths::SUNFLOWER_MODEL,
                crate::assets::paths::FLOWER_HEAD_MODEL,
            ] {
                source.models.insert(model.to_string(), cube.clone());
            }
            let mut images = vec![
                crate::assets::paths::WALL_TEXTURE,
                crate::assets::paths::SUNFLOWER_TEXTURE,
                crate::assets::paths::BUTTERFLY_FRONT,
                crate::assets::paths::BUTTERFLY_BACK,
            ];
            images.extend(crate::assets::paths::SKYBOX_FACES);
            for image in images {
                source
                    .images
                    .insert(image.to_string(), ImageData::solid(2, 2, [255; 4]));
            }
            source
        }

        fn record(&self, path: &str) {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(path.to_string());
            }
        }

        pub fn count_requests(&self, path: &str) -> usize {
            self.requested
                .lock()
                .map(|requested| requested.iter().filter(|p| p.as_str() == path).count())
                .unwrap_or(0)
        }
    }

    fn missing(path: &str) -> AssetError {
        AssetError::Io {
            path: path.into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory"),
        }
    }

    impl AssetSource for MemorySource {
        fn load_model(&self, path: &str) -> Result<LoadedModel, AssetError> {
            self.record(path);
            self.models.get(path).cloned().ok_or_else(|| missing(path))
        }

        fn load_model_with_mtl(&self, obj: &str, _mtl: &str) -> Result<LoadedModel, AssetError> {
            self.load_model(obj)
        }

        fn load_image(&self, path: &str) -> Result<ImageData, AssetError> {
            self.record(path);
            self.images.get(path).cloned().ok_or_else(|| missing(path))
        }
    }

    #[test]
    fn test_generations_increase() {
        let mut counter = GenerationCounter::new();
        let first = counter.next();
        let second = counter.next();
        assert!(second > first);
        assert_eq!(second.value(), first.value() + 1);
    }

    #[test]
    fn test_textured_model_loads_both_parts() {
        let source = Arc::new(MemorySource::room());
        let loader = AssetLoader::new(source.clone());
        let mut pending = PendingLoads::new();

        let load = loader.load_textured_model(
            crate::assets::paths::SUNFLOWER_MODEL,
            crate::assets::paths::SUNFLOWER_TEXTURE,
            0.4,
            Rad(0.0),
        );
        pending.track(load, |result| Completion::Model {
            target: ModelTarget::Sunflowers,
            generation: Generation::default(),
            path: crate::assets::paths::SUNFLOWER_MODEL,
            result: result.map(Arc::new),
        });
        assert_eq!(pending.in_flight(), 1);

        let completions = pending.wait_all();
        assert_eq!(completions.len(), 1);
        assert_eq!(pending.in_flight(), 0);
        assert_eq!(source.requests.load(Ordering::SeqCst), 2);

        let Completion::Model { result, .. } = &completions[0] else {
            panic!("expected a model completion");
        };
        let model = result.as_ref().expect("model should load");
        assert!(model.texture.is_some());
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(
            model.meshes[0].geometry.normals.len(),
            model.meshes[0].geometry.vertex_count()
        );
        assert!((model.transform.x.x - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_missing_texture_fails_the_model() {
        let mut source = MemorySource::room();
        source.images.remove(crate::assets::paths::SUNFLOWER_TEXTURE);
        let loader = AssetLoader::new(Arc::new(source));

        let result = futures::executor::block_on(loader.load_textured_model(
            crate::assets::paths::SUNFLOWER_MODEL,
            crate::assets::paths::SUNFLOWER_TEXTURE,
            1.0,
            Rad(0.0),
        ));
        assert!(matches!(result, Err(AssetError::Io { .. })));
    }

    #[test]
    fn test_cube_faces_keep_order() {
        let mut source = MemorySource::room();
        for (i, face) in crate::assets::paths::SKYBOX_FACES.iter().enumerate() {
            source
                .images
                .insert(face.to_string(), ImageData::solid(1, 1, [i as u8, 0, 0, 255]));
        }
        let loader = AssetLoader::new(Arc::new(source));
        let faces = futures::executor::block_on(loader.load_cube(crate::assets::paths::SKYBOX_FACES))
            .expect("faces should load");
        for (i, face) in faces.iter().enumerate() {
            assert_eq!(face.rgba[0], i as u8);
        }
    }

    #[test]
    fn test_texture_completion_fills_slot() {
        let loader = AssetLoader::new(Arc::new(MemorySource::room()));
        let mut pending = PendingLoads::new();
        let mut graph = SceneGraph::new();
        let slot = graph.create_texture("wall");

        let path = crate::assets::paths::WALL_TEXTURE;
        pending.track(loader.load_image(path), move |result| Completion::Texture {
            slot,
            path,
            result,
        });

        for completion in pending.wait_all() {
            if let Completion::Texture { slot, result: Ok(image), .. } = completion {
                assert!(graph.fill_texture(slot, image));
            }
        }
        assert!(graph.texture(slot).and_then(|t| t.image.as_ref()).is_some());
    }
}
