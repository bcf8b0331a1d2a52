//! Registry of imported maps that texture nodes read by id.
//!
//! Decoding image files is left to the caller; the registry only stores finished
//! [`MapValue`]s so a texture node's output shares the registered allocation.
use std::collections::HashMap;

use tracing::warn;

use super::MapValue;
use crate::error::{Error, Result};

/// Imported maps keyed by the id texture nodes refer to.
#[derive(Clone, Debug)]
pub struct TextureRegistry {
    textures: HashMap<String, MapValue>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Registers a map under `id`, returning the map it replaced.
    pub fn register(&mut self, id: impl Into<String>, map: impl Into<MapValue>) -> Option<MapValue> {
        self.textures.insert(id.into(), map.into())
    }

    /// Drops the map under `id`. Returns `false` if nothing was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.textures.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.textures.contains_key(id)
    }

    /// Shared handle to the map under `id`.
    pub fn get(&self, id: &str) -> Option<MapValue> {
        self.textures.get(id).cloned()
    }

    /// Like [`get`](Self::get), but a missing id is an error.
    pub fn require(&self, id: &str) -> Result<MapValue> {
        self.get(id).ok_or_else(|| {
            warn!("Unknown texture id '{}'.", id);
            Error::MissingTexture { id: id.to_owned() }
        })
    }

    /// Registered ids in arbitrary order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(String::as_str)
    }
}

impl Default for TextureRegistry {
    fn default() -> Self {
        Self::new()
    }
}
