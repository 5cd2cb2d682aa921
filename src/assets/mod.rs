//! # Asset Loading
//!
//! Models and images are read on short-lived worker threads and handed back
//! to the main thread as futures. The main thread drives those futures from a
//! local executor once per frame, so the render loop never blocks on disk.
//!
//! ## Key Components
//!
//! - [`AssetSource`] - Where bytes come from (the file system in the app)
//! - [`AssetLoader`] - Issues loads and exposes them as futures
//! - [`PendingLoads`] - Drives in-flight loads and collects [`Completion`]s
//! - [`AssetCache`] - Finished loads by path, so rebuilds attach synchronously
//! - [`AssetManager`] - The three above behind one handle
//!
//! Every completion that belongs to a rebuildable part of the room carries the
//! [`Generation`] that was current when it was requested; completions for a
//! superseded generation are dropped by the consumer.

pub mod cache;
pub mod loader;
pub mod manager;
pub mod paths;
pub mod source;

use std::path::PathBuf;

pub use cache::AssetCache;
pub use loader::{
    AssetLoader, Completion, Generation, GenerationCounter, ModelTarget, PendingLoads,
    PreparedMesh, PreparedModel,
};
pub use manager::{AssetManager, ModelRequest};
pub use source::{AssetSource, FsAssetSource, LoadedMesh, LoadedModel};

#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("load of {0} was abandoned before it finished")]
    Cancelled(String),
    #[error("{0} contains no meshes")]
    EmptyModel(PathBuf),
}
