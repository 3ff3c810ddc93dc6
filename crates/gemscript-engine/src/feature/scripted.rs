//! Features whose methods are compiled programs.

use std::sync::Arc;

use indexmap::IndexMap;

use gemscript_foundation::{PropType, Value};
use gemscript_symbols::MethodSignature;
use gemscript_vm::OpProgram;

use super::{Feature, FeatureKind, FeatureProp};
use crate::error::CompileError;

/// Builder for a [`Feature`] backed by [`OpProgram`] method bodies.
///
/// A body runs in a nested machine state holding the invoking agent (when
/// called through `featCall`) followed by the arguments; whatever it leaves
/// on top of its stack is the method result.
///
/// ```ignore
/// let feature = ScriptedFeature::new("Health")
///     .prop(FeatureProp::new("hp", PropType::Number, 10.0))
///     .method("heal", &["amount:number"], body)?
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedFeature {
    name: String,
    props: Vec<FeatureProp>,
    methods: IndexMap<String, MethodSignature>,
    bodies: IndexMap<String, Arc<OpProgram>>,
}

impl ScriptedFeature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
            methods: IndexMap::new(),
            bodies: IndexMap::new(),
        }
    }

    pub fn prop(mut self, prop: FeatureProp) -> Self {
        self.props.push(prop);
        self
    }

    /// Shorthand for an unbounded prop.
    pub fn simple_prop(self, name: &str, kind: PropType, default: impl Into<Value>) -> Self {
        self.prop(FeatureProp::new(name, kind, default))
    }

    /// Declare a method with `name:type` argument declarations.
    pub fn method(mut self, name: &str, args: &[&str], body: OpProgram) -> Result<Self, CompileError> {
        let signature = MethodSignature::parse(args).map_err(|message| CompileError::InvalidFeature {
            feature: self.name.clone(),
            message,
        })?;
        self.methods.insert(name.to_string(), signature);
        self.bodies.insert(name.to_string(), Arc::new(body));
        Ok(self)
    }

    pub fn build(self) -> Feature {
        Feature {
            name: self.name,
            props: self.props,
            methods: self.methods,
            kind: FeatureKind::Scripted(self.bodies),
        }
    }
}
