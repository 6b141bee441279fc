//! Resource management system.
//!
//! This provides a `ResourceManager` with simple typed handles, the model
//! descriptor format, and the asynchronous `AssetLoader` seam. Loading is
//! fire-and-forget from the game's point of view: the controller only ever
//! sees the `AssetLoadState` projection of a finished load.

use std::{
    any::{Any, TypeId},
    collections::{BTreeSet, HashMap},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Typed resource handle.
#[derive(Debug)]
pub struct Handle<T> {
    id: u64,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            _phantom: std::marker::PhantomData,
        }
    }
}

/// In-memory resource manager.
#[derive(Default)]
pub struct ResourceManager {
    next_id: u64,
    by_type: HashMap<TypeId, HashMap<u64, Arc<dyn Any + Send + Sync>>>,
}

impl ResourceManager {
    /// Inserts a resource and returns a handle.
    pub fn insert<T: 'static + Send + Sync>(&mut self, value: T) -> Handle<T> {
        let id = self.next_id;
        self.next_id += 1;
        let map = self.by_type.entry(TypeId::of::<T>()).or_default();
        map.insert(id, Arc::new(value));
        Handle {
            id,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Gets a resource by handle.
    pub fn get<T: 'static + Send + Sync>(&self, h: &Handle<T>) -> Option<Arc<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|map| map.get(&h.id))
            .and_then(|arc_any| arc_any.clone().downcast::<T>().ok())
    }
}

/// On-disk description of a character model.
///
/// ```json
/// { "name": "archer", "mesh": "archer.glb", "clips": ["idle", "draw"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    /// Mesh file, relative to the descriptor's directory.
    pub mesh: String,
    #[serde(default)]
    pub clips: Vec<String>,
}

/// A model the engine has imported.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub name: String,
    pub mesh_path: PathBuf,
    pub clips: BTreeSet<String>,
}

impl LoadedModel {
    pub fn from_descriptor(desc: ModelDescriptor, base_dir: &std::path::Path) -> Self {
        Self {
            mesh_path: base_dir.join(&desc.mesh),
            name: desc.name,
            clips: desc.clips.into_iter().collect(),
        }
    }
}

/// Readiness of the character's assets, as seen by the controller.
///
/// Monotonic: once `model_loaded` is set it never reverts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetLoadState {
    model_loaded: bool,
    available_clips: BTreeSet<String>,
}

impl AssetLoadState {
    /// Nothing loaded yet.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn from_model(model: &LoadedModel) -> Self {
        Self {
            model_loaded: true,
            available_clips: model.clips.clone(),
        }
    }

    /// Merges a later load result; never un-loads.
    pub fn absorb(&mut self, other: AssetLoadState) {
        self.model_loaded |= other.model_loaded;
        self.available_clips.extend(other.available_clips);
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    /// True once clip selection may run.
    pub fn is_ready(&self) -> bool {
        self.model_loaded && !self.available_clips.is_empty()
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.available_clips.contains(name)
    }

    pub fn clip_count(&self) -> usize {
        self.available_clips.len()
    }
}

/// Asynchronous model import.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load_model(&self) -> anyhow::Result<LoadedModel>;
}

/// Loads a model descriptor from the first directory that has a valid one.
pub struct FsAssetLoader {
    search_dirs: Vec<PathBuf>,
    model_file: String,
}

impl FsAssetLoader {
    pub fn new(search_dirs: Vec<PathBuf>, model_file: impl Into<String>) -> Self {
        Self {
            search_dirs,
            model_file: model_file.into(),
        }
    }

    async fn load_from(&self, dir: &std::path::Path) -> anyhow::Result<LoadedModel> {
        let path = dir.join(&self.model_file);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read model descriptor {}", path.display()))?;
        let desc: ModelDescriptor = serde_json::from_str(&text)
            .with_context(|| format!("parse model descriptor {}", path.display()))?;
        Ok(LoadedModel::from_descriptor(desc, dir))
    }
}

#[async_trait]
impl AssetLoader for FsAssetLoader {
    async fn load_model(&self) -> anyhow::Result<LoadedModel> {
        let mut last_err = None;
        for dir in &self.search_dirs {
            debug!(dir = %dir.display(), file = %self.model_file, "Trying asset directory");
            match self.load_from(dir).await {
                Ok(model) => {
                    info!(model = %model.name, clips = model.clips.len(), dir = %dir.display(), "Model loaded");
                    return Ok(model);
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %format!("{e:#}"), "Model not loadable here");
                    last_err = Some(e);
                }
            }
        }
        let err = last_err.unwrap_or_else(|| anyhow!("no asset directories configured"));
        Err(err.context(format!("load {}", self.model_file)))
    }
}
