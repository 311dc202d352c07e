// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::ModuleError;

/// Module identifier handed out by a `ModuleStore` on mount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A mounted, immutable executable definition.
///
/// The definition itself is opaque here: the store that mounted the module
/// decides its type, and the executor paired with that store reads it back
/// with `definition::<T>()`.
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    pub name: Option<String>,
    pub source_size: usize,
    definition: Arc<dyn Any + Send + Sync>,
}

impl Module {
    pub fn new<T: Any + Send + Sync>(
        id: ModuleId,
        name: Option<String>,
        source_size: usize,
        definition: T,
    ) -> Self {
        Self {
            id,
            name,
            source_size,
            definition: Arc::new(definition),
        }
    }

    /// The definition, if it is a `T`.
    pub fn definition<T: Any>(&self) -> Option<&T> {
        self.definition.downcast_ref::<T>()
    }
}

/// Collaborator that turns module source into mounted modules and looks them
/// up by id.
pub trait ModuleStore: Send + Sync {
    /// Validate and store `source`, returning its module id.
    fn mount(&self, source: &[u8]) -> Result<ModuleId, ModuleError>;

    /// Look up a mounted module.
    fn get(&self, mid: &ModuleId) -> Option<Arc<Module>>;

    fn contains(&self, mid: &ModuleId) -> bool {
        self.get(mid).is_some()
    }
}
