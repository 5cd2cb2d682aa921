use std::{collections::HashMap, sync::Arc};

use crate::gfx::scene::ImageData;

use super::PreparedModel;

/// Finished loads keyed by asset path
///
/// Only successful loads are cached; a failed path is requested again by the
/// next rebuild that needs it.
#[derive(Debug, Default)]
pub struct AssetCache {
    models: HashMap<&'static str, Arc<PreparedModel>>,
    images: HashMap<&'static str, Arc<ImageData>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self, path: &str) -> Option<Arc<PreparedModel>> {
        self.models.get(path).cloned()
    }

    pub fn insert_model(&mut self, path: &'static str, model: Arc<PreparedModel>) {
        self.models.insert(path, model);
    }

    pub fn image(&self, path: &str) -> Option<Arc<ImageData>> {
        self.images.get(path).cloned()
    }

    pub fn insert_image(&mut self, path: &'static str, image: Arc<ImageData>) {
        self.images.insert(path, image);
    }

    pub fn len(&self) -> usize {
        self.models.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix4, SquareMatrix};

    #[test]
    fn test_cache_hands_out_shared_copies() {
        let mut cache = AssetCache::new();
        assert!(cache.is_empty());

        let model = Arc::new(PreparedModel {
            meshes: Vec::new(),
            texture: None,
            transform: Matrix4::identity(),
        });
        cache.insert_model("a.obj", Arc::clone(&model));
        cache.insert_image("a.png", Arc::new(ImageData::solid(1, 1, [0; 4])));

        let cached = cache.model("a.obj").expect("model is cached");
        assert!(Arc::ptr_eq(&cached, &model));
        assert!(cache.image("a.png").is_some());
        assert!(cache.model("b.obj").is_none());
        assert_eq!(cache.len(), 2);
    }
}
