//! Agent instances and their runtime binding.
//!
//! An [`Agent`] owns its props (keyed by path, feature props namespaced
//! under the feature name) and one [`FeatureState`] per feature it uses.
//! [`AgentRuntime`] pairs an agent with the feature registry and implements
//! the machine's [`AgentContext`] seam.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use gemscript_foundation::{AgentId, Path, PropType, Value};
use gemscript_vm::{AgentContext, ExecutionError, Invocation, Scopeable};

use crate::feature::FeatureRegistry;
use crate::prop::Prop;

/// Per-agent state of one feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureState {
    /// Position of the feature in the registry at decoration time.
    pub index: usize,
    /// Feature-private values.
    pub data: IndexMap<String, Value>,
}

impl FeatureState {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            data: IndexMap::new(),
        }
    }
}

/// A live instance of a blueprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: AgentId,
    blueprint: String,
    props: IndexMap<Path, Prop>,
    features: IndexMap<String, FeatureState>,
}

impl Agent {
    pub fn new(id: AgentId, blueprint: impl Into<String>) -> Self {
        Self {
            id,
            blueprint: blueprint.into(),
            props: IndexMap::new(),
            features: IndexMap::new(),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Name of the blueprint this agent was instantiated from.
    pub fn blueprint(&self) -> &str {
        &self.blueprint
    }

    pub fn prop(&self, path: &Path) -> Option<&Prop> {
        self.props.get(path)
    }

    pub fn prop_mut(&mut self, path: &Path) -> Option<&mut Prop> {
        self.props.get_mut(path)
    }

    pub fn prop_value(&self, path: &Path) -> Option<&Value> {
        self.props.get(path).map(Prop::value)
    }

    /// All props in declaration order.
    pub fn props(&self) -> impl Iterator<Item = (&Path, &Prop)> {
        self.props.iter()
    }

    pub fn add_prop(&mut self, path: Path, prop: Prop) -> Result<(), ExecutionError> {
        if self.props.contains_key(&path) {
            return Err(ExecutionError::DuplicateProp(path));
        }
        self.props.insert(path, prop);
        Ok(())
    }

    pub fn set_prop_value(&mut self, path: &Path, value: Value) -> Result<(), ExecutionError> {
        self.props
            .get_mut(path)
            .ok_or_else(|| ExecutionError::PropNotFound(path.clone()))?
            .set(value)
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Names of the features this agent uses, in decoration order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn feature_state(&self, name: &str) -> Option<&FeatureState> {
        self.features.get(name)
    }

    pub fn feature_state_mut(&mut self, name: &str) -> Option<&mut FeatureState> {
        self.features.get_mut(name)
    }

    pub fn add_feature_state(&mut self, name: &str, state: FeatureState) -> Result<(), ExecutionError> {
        if self.features.contains_key(name) {
            return Err(ExecutionError::DuplicateFeature(name.to_string()));
        }
        self.features.insert(name.to_string(), state);
        Ok(())
    }

    /// Prop names and types, for comparing agents structurally.
    pub fn prop_types(&self) -> Vec<(String, PropType)> {
        self.props
            .iter()
            .map(|(path, prop)| (path.to_string(), prop.kind()))
            .collect()
    }

    /// Serializable view of the agent.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            blueprint: self.blueprint.clone(),
            props: self
                .props
                .iter()
                .map(|(path, prop)| (path.to_string(), prop.value().clone()))
                .collect(),
            features: self.features.clone(),
        }
    }
}

/// Plain-data dump of an agent, keyed by dotted prop path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub blueprint: String,
    pub props: IndexMap<String, Value>,
    pub features: IndexMap<String, FeatureState>,
}

/// An agent bound to the feature registry for one invocation.
pub struct AgentRuntime<'a> {
    agent: &'a mut Agent,
    features: &'a FeatureRegistry,
}

impl<'a> AgentRuntime<'a> {
    pub fn new(agent: &'a mut Agent, features: &'a FeatureRegistry) -> Self {
        Self { agent, features }
    }
}

impl AgentContext for AgentRuntime<'_> {
    fn agent_id(&self) -> AgentId {
        self.agent.id
    }

    fn has_prop(&self, path: &Path) -> bool {
        self.agent.props.contains_key(path)
    }

    fn has_feature(&self, name: &str) -> bool {
        self.agent.has_feature(name)
    }

    fn prop_value(&self, path: &Path) -> Result<Value, ExecutionError> {
        self.agent
            .prop_value(path)
            .cloned()
            .ok_or_else(|| ExecutionError::PropNotFound(path.clone()))
    }

    fn set_prop_value(&mut self, path: &Path, value: Value) -> Result<(), ExecutionError> {
        self.agent.set_prop_value(path, value)
    }

    fn add_prop(&mut self, path: Path, kind: PropType, default: Value) -> Result<(), ExecutionError> {
        let prop = Prop::new(kind, default)?;
        self.agent.add_prop(path, prop)
    }

    fn add_feature(&mut self, name: &str) -> Result<(), ExecutionError> {
        let (index, feature) = self
            .features
            .get_full(name)
            .ok_or_else(|| ExecutionError::FeatureNotFound(name.to_string()))?;
        feature.decorate(self.agent, index)
    }

    fn invoke(
        &mut self,
        target: &Scopeable,
        method: &str,
        args: &[Value],
    ) -> Result<Invocation, ExecutionError> {
        match target {
            Scopeable::Prop(path) => {
                let prop = self
                    .agent
                    .prop_mut(path)
                    .ok_or_else(|| ExecutionError::PropNotFound(path.clone()))?;
                prop.invoke(method, args).map(Invocation::Value)
            }
            Scopeable::Feature(name) => {
                let features = self.features;
                let feature = self
                    .agent
                    .feature_state(name)
                    .and_then(|state| features.get_index(state.index))
                    .filter(|feature| feature.name == *name)
                    .or_else(|| features.get(name))
                    .ok_or_else(|| ExecutionError::FeatureNotFound(name.clone()))?;
                if !self.agent.has_feature(name) {
                    return Err(ExecutionError::FeatureNotFound(name.clone()));
                }
                feature.invoke(self.agent, method, args)
            }
            Scopeable::Agent(id) => Err(ExecutionError::MethodNotFound {
                target: id.to_string(),
                method: method.to_string(),
            }),
        }
    }

    fn debug_out(&mut self, message: &str) {
        info!(
            target: "gemscript::script",
            agent = %self.agent.id,
            blueprint = %self.agent.blueprint,
            "{}",
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_prop_rejected() {
        let mut agent = Agent::new(AgentId::new(1), "Fish");
        let prop = Prop::new(PropType::Number, Value::Number(0.0)).unwrap();
        agent.add_prop(Path::from("x"), prop.clone()).unwrap();
        assert_eq!(
            agent.add_prop(Path::from("x"), prop),
            Err(ExecutionError::DuplicateProp(Path::from("x")))
        );
    }

    #[test]
    fn test_runtime_dispatches_prop_methods() {
        let features = FeatureRegistry::new();
        let mut agent = Agent::new(AgentId::new(1), "Fish");
        let mut rt = AgentRuntime::new(&mut agent, &features);
        rt.add_prop(Path::from("x"), PropType::Number, Value::Number(2.0)).unwrap();
        let result = rt
            .invoke(&Scopeable::Prop(Path::from("x")), "mul", &[Value::Number(4.0)])
            .unwrap();
        assert!(matches!(result, Invocation::Value(Some(Value::Number(n))) if n == 8.0));
    }

    #[test]
    fn test_runtime_unknown_feature() {
        let features = FeatureRegistry::with_builtins();
        let mut agent = Agent::new(AgentId::new(1), "Fish");
        let mut rt = AgentRuntime::new(&mut agent, &features);
        assert_eq!(
            rt.add_feature("Wings"),
            Err(ExecutionError::FeatureNotFound("Wings".to_string()))
        );
        assert!(matches!(
            rt.invoke(&Scopeable::Feature("IU".to_string()), "logProperty", &[]),
            Err(ExecutionError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_serializes_paths() {
        let features = FeatureRegistry::with_builtins();
        let mut agent = Agent::new(AgentId::new(5), "Fish");
        AgentRuntime::new(&mut agent, &features).add_feature("IU").unwrap();
        let json = serde_json::to_value(agent.snapshot()).unwrap();
        assert_eq!(json["props"]["IU.logStringText"], "INIT");
        assert_eq!(json["blueprint"], "Fish");
    }
}
