//! Features: reusable capability packs.
//!
//! A [`Feature`] declares props and methods. Its symbol scope is merged
//! into every blueprint that uses it, and at instantiation it decorates the
//! agent with its props (under the feature's namespace) and a per-agent
//! state bag.
//!
//! # Design
//!
//! Method bodies are a closed set of kinds ([`FeatureKind`]). Built-in
//! features dispatch natively; scripted features hand an [`OpProgram`] back
//! to the machine. The registry keeps features in registration order and
//! agents hold the registry index, so runtime dispatch does not search by
//! name.

mod iu;
mod movement;
mod scripted;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use gemscript_foundation::{Path, PropType, Value};
use gemscript_symbols::{DeclarationError, MethodSignature, ScopeBuilder, SymbolData};
use gemscript_vm::{ExecutionError, Invocation, OpProgram};

use crate::agent::{Agent, FeatureState};
use crate::prop::Prop;

pub use scripted::ScriptedFeature;

/// A prop a feature adds to every agent that uses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProp {
    pub name: String,
    pub kind: PropType,
    pub default: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub wrap: bool,
}

impl FeatureProp {
    pub fn new(name: impl Into<String>, kind: PropType, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: default.into(),
            min: None,
            max: None,
            wrap: false,
        }
    }

    pub fn bounded(mut self, min: f64, max: f64, wrap: bool) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.wrap = wrap;
        self
    }
}

/// How a feature's methods run.
#[derive(Debug, Clone)]
pub enum FeatureKind {
    Movement,
    Iu,
    /// Method name to program body.
    Scripted(IndexMap<String, Arc<OpProgram>>),
}

/// A registered capability pack.
#[derive(Debug, Clone)]
pub struct Feature {
    pub name: String,
    pub props: Vec<FeatureProp>,
    pub methods: IndexMap<String, MethodSignature>,
    pub kind: FeatureKind,
}

impl Feature {
    /// The scope this feature contributes under its name.
    pub fn symbols(&self) -> Result<SymbolData, DeclarationError> {
        let mut builder = ScopeBuilder::new();
        for prop in &self.props {
            builder.prop(&prop.name, prop.kind)?;
        }
        for (name, signature) in &self.methods {
            builder.method(name, signature.clone())?;
        }
        Ok(builder.build())
    }

    /// Add this feature's props and state to `agent`.
    ///
    /// `index` is the feature's position in the registry.
    pub fn decorate(&self, agent: &mut Agent, index: usize) -> Result<(), ExecutionError> {
        agent.add_feature_state(&self.name, FeatureState::new(index))?;
        for decl in &self.props {
            let prop = Prop::new(decl.kind, decl.default.clone())?
                .with_bounds(decl.min, decl.max, decl.wrap);
            agent.add_prop(Path::feature_prop(&self.name, &decl.name), prop)?;
        }
        debug!(feature = %self.name, agent = %agent.id(), props = self.props.len(), "decorated agent");
        Ok(())
    }

    /// Dispatch one of this feature's methods for `agent`.
    pub fn invoke(
        &self,
        agent: &mut Agent,
        method: &str,
        args: &[Value],
    ) -> Result<Invocation, ExecutionError> {
        let signature = self
            .methods
            .get(method)
            .ok_or_else(|| ExecutionError::MethodNotFound {
                target: format!("feature {}", self.name),
                method: method.to_string(),
            })?;
        if signature.arity() != args.len() {
            return Err(ExecutionError::ArgumentCount {
                method: method.to_string(),
                expected: signature.arity(),
                found: args.len(),
            });
        }
        match &self.kind {
            FeatureKind::Movement => movement::invoke(self, agent, method, args),
            FeatureKind::Iu => iu::invoke(self, agent, method, args),
            FeatureKind::Scripted(bodies) => bodies
                .get(method)
                .cloned()
                .map(Invocation::Program)
                .ok_or_else(|| ExecutionError::MethodNotFound {
                    target: format!("feature {}", self.name),
                    method: method.to_string(),
                }),
        }
    }

    /// Path of one of this feature's props on an agent.
    pub fn prop_path(&self, prop: &str) -> Path {
        Path::feature_prop(&self.name, prop)
    }
}

/// Features available to blueprints, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: IndexMap<String, Arc<Feature>>,
}

impl FeatureRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `Movement` and `IU` features.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(movement::feature());
        registry.register(iu::feature());
        registry
    }

    /// Register a feature, replacing any feature of the same name in place.
    pub fn register(&mut self, feature: Feature) {
        debug!(feature = %feature.name, methods = feature.methods.len(), "registered feature");
        self.features.insert(feature.name.clone(), Arc::new(feature));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Feature>> {
        self.features.get(name)
    }

    /// Feature and its registry index.
    pub fn get_full(&self, name: &str) -> Option<(usize, &Arc<Feature>)> {
        self.features.get_full(name).map(|(index, _, feature)| (index, feature))
    }

    pub fn get_index(&self, index: usize) -> Option<&Arc<Feature>> {
        self.features.get_index(index).map(|(_, feature)| feature)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemscript_foundation::AgentId;

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = FeatureRegistry::with_builtins();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Movement", "IU"]);
        let (index, feature) = registry.get_full("IU").unwrap();
        assert_eq!(index, 1);
        assert_eq!(feature.name, "IU");
    }

    #[test]
    fn test_movement_symbols() {
        let registry = FeatureRegistry::with_builtins();
        let scope = registry.get("Movement").unwrap().symbols().unwrap();
        assert_eq!(scope.prop("direction").unwrap().kind, Some(PropType::Number));
        assert_eq!(scope.method("setDirection").unwrap().arity(), 1);
    }

    #[test]
    fn test_decorate_adds_namespaced_props() {
        let registry = FeatureRegistry::with_builtins();
        let mut agent = Agent::new(AgentId::new(1), "Fish");
        registry.get("Movement").unwrap().decorate(&mut agent, 0).unwrap();
        assert_eq!(
            agent.prop_value(&Path::from_path_str("Movement.movementType")),
            Some(&Value::from("static"))
        );
        assert!(agent.has_feature("Movement"));
    }

    #[test]
    fn test_decorate_twice_fails() {
        let registry = FeatureRegistry::with_builtins();
        let mut agent = Agent::new(AgentId::new(1), "Fish");
        let iu = registry.get("IU").unwrap();
        iu.decorate(&mut agent, 1).unwrap();
        assert_eq!(
            iu.decorate(&mut agent, 1),
            Err(ExecutionError::DuplicateFeature("IU".to_string()))
        );
    }

    #[test]
    fn test_invoke_checks_arity() {
        let registry = FeatureRegistry::with_builtins();
        let mut agent = Agent::new(AgentId::new(1), "Fish");
        let movement = registry.get("Movement").unwrap();
        movement.decorate(&mut agent, 0).unwrap();
        assert!(matches!(
            movement.invoke(&mut agent, "setDirection", &[]),
            Err(ExecutionError::ArgumentCount { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            movement.invoke(&mut agent, "fly", &[]),
            Err(ExecutionError::MethodNotFound { .. })
        ));
    }
}
