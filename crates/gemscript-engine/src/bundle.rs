//! Compiled blueprints and the blueprint registry.
//!
//! # Design
//!
//! Bundles are immutable once built and shared as `Arc<BlueprintBundle>`.
//! Re-registering a name swaps the `Arc` under a write lock, so a reader
//! holding the previous bundle keeps a complete copy of it and new readers
//! see only the new one.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use gemscript_foundation::{ProgramKind, Value};
use gemscript_symbols::SymbolData;
use gemscript_vm::OpProgram;

/// The registered, compiled form of a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintBundle {
    pub name: String,
    /// One program per phase that has statements.
    pub programs: BTreeMap<ProgramKind, OpProgram>,
    /// Top-level scope: declared props plus every used feature.
    pub symbols: SymbolData,
    pub tags: IndexMap<String, Value>,
    /// Features used, in decoration order.
    pub features: Vec<String>,
}

impl BlueprintBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            programs: BTreeMap::new(),
            symbols: SymbolData::default(),
            tags: IndexMap::new(),
            features: Vec::new(),
        }
    }

    pub fn program(&self, kind: ProgramKind) -> Option<&OpProgram> {
        self.programs.get(&kind)
    }

    pub fn tag(&self, name: &str) -> Option<&Value> {
        self.tags.get(name)
    }

    /// True when the tag is present and truthy.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some_and(Value::truthy)
    }
}

/// Blueprint bundles by name.
#[derive(Debug, Default)]
pub struct BlueprintRegistry {
    bundles: RwLock<IndexMap<String, Arc<BlueprintBundle>>>,
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bundle`, replacing any bundle of the same name.
    ///
    /// Returns the replaced bundle, if any.
    pub fn register(&self, bundle: BlueprintBundle) -> Option<Arc<BlueprintBundle>> {
        let name = bundle.name.clone();
        let programs = bundle.programs.len();
        let previous = self.bundles.write().insert(name.clone(), Arc::new(bundle));
        if previous.is_some() {
            info!(blueprint = %name, programs, "replaced blueprint");
        } else {
            info!(blueprint = %name, programs, "registered blueprint");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<BlueprintBundle>> {
        self.bundles.read().get(name).cloned()
    }

    /// Every bundle, in first-registration order.
    pub fn all(&self) -> Vec<Arc<BlueprintBundle>> {
        self.bundles.read().values().cloned().collect()
    }

    pub fn delete(&self, name: &str) -> Option<Arc<BlueprintBundle>> {
        let removed = self.bundles.write().shift_remove(name);
        if removed.is_some() {
            info!(blueprint = %name, "deleted blueprint");
        }
        removed
    }

    /// Bundles whose tag `tag` is truthy.
    pub fn with_tag(&self, tag: &str) -> Vec<Arc<BlueprintBundle>> {
        self.bundles
            .read()
            .values()
            .filter(|bundle| bundle.has_tag(tag))
            .cloned()
            .collect()
    }

    /// Symbol scopes of every registered blueprint, for cross-agent
    /// references.
    pub fn symbol_context(&self) -> IndexMap<String, SymbolData> {
        self.bundles
            .read()
            .iter()
            .map(|(name, bundle)| (name.clone(), bundle.symbols.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bundles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(name: &str, tag: bool) -> BlueprintBundle {
        let mut bundle = BlueprintBundle::new(name);
        bundle.tags.insert("isCharControllable".to_string(), Value::Boolean(tag));
        bundle
    }

    #[test]
    fn test_replace_keeps_old_arc() {
        let registry = BlueprintRegistry::new();
        registry.register(tagged("Fish", false));
        let old = registry.get("Fish").unwrap();

        let replaced = registry.register(tagged("Fish", true));
        assert!(replaced.is_some());
        assert!(!old.has_tag("isCharControllable"));
        assert!(registry.get("Fish").unwrap().has_tag("isCharControllable"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_with_tag_and_delete() {
        let registry = BlueprintRegistry::new();
        registry.register(tagged("Fish", true));
        registry.register(tagged("Rock", false));
        let names: Vec<_> = registry
            .with_tag("isCharControllable")
            .iter()
            .map(|b| b.name.clone())
            .collect();
        assert_eq!(names, vec!["Fish"]);

        assert!(registry.delete("Fish").is_some());
        assert!(registry.delete("Fish").is_none());
        assert!(registry.get("Fish").is_none());
    }

    #[test]
    fn test_bundle_serializes() {
        let bundle = tagged("Fish", true);
        let json = serde_json::to_string(&bundle).unwrap();
        let back: BlueprintBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }
}
