// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::backends::script::parse_program;
use crate::errors::ModuleError;
use crate::observability::messages::module::{ModuleMounted, ModuleRejected};
use crate::observability::messages::StructuredLog;
use crate::traits::{Module, ModuleId, ModuleStore};

/// In-memory store of mounted script modules.
///
/// Module ids are derived from the source bytes, so mounting identical source
/// again returns the existing id.
pub struct ScriptModuleStore {
    modules: DashMap<ModuleId, Arc<Module>>,
    max_source_bytes: usize,
}

impl ScriptModuleStore {
    pub fn new(max_source_bytes: usize) -> Self {
        Self {
            modules: DashMap::new(),
            max_source_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// URL-safe base64 of the SHA-256 digest of `source`.
    fn module_id(source: &[u8]) -> ModuleId {
        ModuleId::from(URL_SAFE_NO_PAD.encode(Sha256::digest(source)))
    }
}

impl ModuleStore for ScriptModuleStore {
    fn mount(&self, source: &[u8]) -> Result<ModuleId, ModuleError> {
        if source.len() > self.max_source_bytes {
            let error = ModuleError::TooLarge {
                size: source.len(),
                limit: self.max_source_bytes,
            };
            ModuleRejected { error: &error }.log();
            return Err(error);
        }

        let program = parse_program(source).map_err(|error| {
            ModuleRejected { error: &error }.log();
            error
        })?;

        let mid = Self::module_id(source);
        let name = program.name.clone();
        let steps = program.steps.len();
        self.modules.entry(mid.clone()).or_insert_with(|| {
            Arc::new(Module::new(mid.clone(), name.clone(), source.len(), program))
        });

        ModuleMounted {
            mid: &mid,
            name: name.as_deref(),
            steps,
        }
        .log();
        Ok(mid)
    }

    fn get(&self, mid: &ModuleId) -> Option<Arc<Module>> {
        self.modules.get(mid).map(|module| Arc::clone(module.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::script::Program;

    const SCRIPT: &str = "name: answer\nsteps:\n  - op: complete\n    value: 42\n";

    #[test]
    fn test_mount_and_get() {
        let store = ScriptModuleStore::new(1024);
        let mid = store.mount(SCRIPT.as_bytes()).unwrap();

        let module = store.get(&mid).unwrap();
        assert_eq!(module.id, mid);
        assert_eq!(module.name.as_deref(), Some("answer"));
        assert_eq!(module.source_size, SCRIPT.len());
        assert_eq!(module.definition::<Program>().map(|p| p.steps.len()), Some(1));
        assert!(store.contains(&mid));
        assert!(!store.contains(&ModuleId::from("missing")));
    }

    #[test]
    fn test_identical_source_shares_an_id() {
        let store = ScriptModuleStore::new(1024);
        let first = store.mount(SCRIPT.as_bytes()).unwrap();
        let second = store.mount(SCRIPT.as_bytes()).unwrap();
        let other = store
            .mount(b"steps:\n  - op: complete\n    value: 7\n")
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_module_ids_are_url_safe() {
        let store = ScriptModuleStore::new(1024);
        let mid = store.mount(SCRIPT.as_bytes()).unwrap();
        assert_eq!(mid.as_str().len(), 43);
        assert!(mid
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_module_id_is_the_source_digest() {
        let store = ScriptModuleStore::new(1024);
        let mid = store.mount(SCRIPT.as_bytes()).unwrap();
        assert_eq!(mid.as_str(), "4skNyPyzx5MR63OjRfqDD4MMx2tGfnl1COv6RySSk0o");
    }

    #[test]
    fn test_rejects_oversized_source() {
        let store = ScriptModuleStore::new(8);
        assert_eq!(
            store.mount(SCRIPT.as_bytes()),
            Err(ModuleError::TooLarge { size: SCRIPT.len(), limit: 8 })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_rejects_invalid_source() {
        let store = ScriptModuleStore::new(1024);
        assert!(matches!(
            store.mount(b"not: [a, script"),
            Err(ModuleError::InvalidSource(_))
        ));
        assert!(store.is_empty());
    }
}
