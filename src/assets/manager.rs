use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Rad;

use crate::gfx::scene::{CubeTextureKey, SceneGraph, TextureKey};

use super::{
    AssetCache, AssetError, AssetLoader, AssetSource, Completion, Generation, ModelTarget,
    PendingLoads, PreparedModel,
};

/// A model the room needs, described the way it is loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelRequest {
    /// OBJ geometry plus a separate texture image
    Textured {
        obj: &'static str,
        texture: &'static str,
        size: f32,
        x_rotation: Rad<f32>,
    },
    /// OBJ geometry coloured by an MTL material library
    WithMaterials {
        obj: &'static str,
        mtl: &'static str,
        size: f32,
    },
}

impl ModelRequest {
    /// Cache key of the request
    pub fn path(&self) -> &'static str {
        match self {
            ModelRequest::Textured { obj, .. } | ModelRequest::WithMaterials { obj, .. } => *obj,
        }
    }
}

/// Loader, in-flight loads and cache behind one handle
///
/// A model path is loaded at most once at a time. Requests arriving while it
/// is in flight only move its completion to the newest generation.
pub struct AssetManager {
    loader: AssetLoader,
    pending: PendingLoads,
    cache: AssetCache,
    loading_models: HashMap<&'static str, Generation>,
}

impl AssetManager {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            loader: AssetLoader::new(source),
            pending: PendingLoads::new(),
            cache: AssetCache::new(),
            loading_models: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn in_flight(&self) -> usize {
        self.pending.in_flight()
    }

    /// Creates a texture slot, filled now when the image is cached or once
    /// its load completes
    pub fn texture(&mut self, graph: &mut SceneGraph, path: &'static str) -> TextureKey {
        let slot = graph.create_texture(path);

        if let Some(image) = self.cache.image(path) {
            graph.fill_texture(slot, image);
        } else {
            self.pending
                .track(self.loader.load_image(path), move |result| {
                    Completion::Texture { slot, path, result }
                });
        }
        slot
    }

    pub fn cube_texture(
        &mut self,
        graph: &mut SceneGraph,
        label: &str,
        faces: [&'static str; 6],
    ) -> CubeTextureKey {
        let slot = graph.create_cube_texture(label);
        self.pending
            .track(self.loader.load_cube(faces), move |result| {
                Completion::CubeTexture { slot, result }
            });
        slot
    }

    /// Returns the model right away when cached, otherwise makes sure it is
    /// loading for `generation` and returns `None`
    pub fn model(
        &mut self,
        target: ModelTarget,
        generation: Generation,
        request: ModelRequest,
    ) -> Option<Arc<PreparedModel>> {
        let path = request.path();
        if let Some(model) = self.cache.model(path) {
            log::debug!("Using cached model {path}");
            return Some(model);
        }

        if let Some(latest) = self.loading_models.get_mut(path) {
            log::debug!("{path} already loading, now for generation {}", generation.value());
            *latest = generation;
            return None;
        }
        self.loading_models.insert(path, generation);

        log::debug!("Loading {path} for {target:?} (generation {})", generation.value());
        let wrap = move |result: Result<PreparedModel, AssetError>| Completion::Model {
            target,
            generation,
            path,
            result: result.map(Arc::new),
        };

        match request {
            ModelRequest::Textured {
                obj,
                texture,
                size,
                x_rotation,
            } => self.pending.track(
                self.loader.load_textured_model(obj, texture, size, x_rotation),
                wrap,
            ),
            ModelRequest::WithMaterials { obj, mtl, size } => self
                .pending
                .track(self.loader.load_model_with_mtl(obj, mtl, size), wrap),
        }
        None
    }

    /// Collects finished loads without blocking, caching every success
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut completions = self.pending.poll();
        self.remember(&mut completions);
        completions
    }

    /// Blocks until every load in flight has finished
    pub fn wait_all(&mut self) -> Vec<Completion> {
        let mut completions = self.pending.wait_all();
        self.remember(&mut completions);
        completions
    }

    /// Caches successes and hands each model to the last generation that
    /// asked for it
    fn remember(&mut self, completions: &mut [Completion]) {
        for completion in completions {
            match completion {
                Completion::Model {
                    path,
                    generation,
                    result,
                    ..
                } => {
                    if let Some(latest) = self.loading_models.remove(*path) {
                        *generation = latest;
                    }
                    if let Ok(model) = result {
                        self.cache.insert_model(*path, Arc::clone(model));
                    }
                }
                Completion::Texture {
                    path,
                    result: Ok(image),
                    ..
                } => self.cache.insert_image(*path, Arc::clone(image)),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{loader::tests::MemorySource, paths};

    fn sunflower_request() -> ModelRequest {
        ModelRequest::Textured {
            obj: paths::SUNFLOWER_MODEL,
            texture: paths::SUNFLOWER_TEXTURE,
            size: 0.4,
            x_rotation: Rad(0.0),
        }
    }

    #[test]
    fn test_second_request_is_served_from_cache() {
        let source = Arc::new(MemorySource::room());
        let mut assets = AssetManager::new(source.clone());
        let mut generations = crate::assets::GenerationCounter::new();

        let first = generations.next();
        assert!(assets
            .model(ModelTarget::Sunflowers, first, sunflower_request())
            .is_none());
        let completions = assets.wait_all();
        assert_eq!(completions.len(), 1);

        let second = generations.next();
        assert!(assets
            .model(ModelTarget::Sunflowers, second, sunflower_request())
            .is_some());
        assert_eq!(assets.in_flight(), 0);
        assert_eq!(source.count_requests(paths::SUNFLOWER_MODEL), 1);
    }

    #[test]
    fn test_model_in_flight_is_not_requested_again() {
        let source = Arc::new(MemorySource::room());
        let mut assets = AssetManager::new(source.clone());
        let mut generations = crate::assets::GenerationCounter::new();

        let mut latest = generations.next();
        for _ in 0..10 {
            assert!(assets
                .model(ModelTarget::Sunflowers, latest, sunflower_request())
                .is_none());
            latest = generations.next();
        }
        assert!(assets
            .model(ModelTarget::Sunflowers, latest, sunflower_request())
            .is_none());
        assert_eq!(assets.in_flight(), 1);

        let completions = assets.wait_all();
        assert_eq!(source.count_requests(paths::SUNFLOWER_MODEL), 1);
        match completions.as_slice() {
            [Completion::Model { generation, result: Ok(_), .. }] => assert_eq!(*generation, latest),
            other => panic!("expected one model completion, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_model_can_be_requested_again() {
        let mut source = MemorySource::room();
        source.models.clear();
        let source = Arc::new(source);
        let mut assets = AssetManager::new(source.clone());

        assets.model(ModelTarget::Sunflowers, Generation::default(), sunflower_request());
        assets.wait_all();
        assets.model(ModelTarget::Sunflowers, Generation::default(), sunflower_request());
        assets.wait_all();
        assert_eq!(source.count_requests(paths::SUNFLOWER_MODEL), 2);
    }

    #[test]
    fn test_cached_texture_fills_immediately() {
        let mut assets = AssetManager::new(Arc::new(MemorySource::room()));
        let mut graph = SceneGraph::new();

        let first = assets.texture(&mut graph, paths::WALL_TEXTURE);
        for completion in assets.wait_all() {
            if let Completion::Texture { slot, result: Ok(image), .. } = completion {
                graph.fill_texture(slot, image);
            }
        }
        assert!(graph.texture(first).and_then(|t| t.image.as_ref()).is_some());

        let second = assets.texture(&mut graph, paths::WALL_TEXTURE);
        assert_eq!(assets.in_flight(), 0);
        assert!(graph.texture(second).and_then(|t| t.image.as_ref()).is_some());
    }

    #[test]
    fn test_failed_loads_are_not_cached() {
        let mut source = MemorySource::room();
        source.models.clear();
        let mut assets = AssetManager::new(Arc::new(source));

        let request = ModelRequest::WithMaterials {
            obj: paths::FLOWER_HEAD_MODEL,
            mtl: paths::FLOWER_HEAD_MATERIALS,
            size: 10.0,
        };
        assets.model(ModelTarget::FlowerHeads, Generation::default(), request);
        let completions = assets.wait_all();
        assert!(matches!(
            completions.as_slice(),
            [Completion::Model { result: Err(_), .. }]
        ));
        assert!(assets.cache().model(paths::FLOWER_HEAD_MODEL).is_none());
    }
}
