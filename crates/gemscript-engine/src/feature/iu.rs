//! Built-in `IU` feature: script-visible logging.

use indexmap::IndexMap;
use tracing::info;

use gemscript_foundation::{ArgSpec, ArgType, PropType, Value};
use gemscript_symbols::MethodSignature;
use gemscript_vm::{ExecutionError, Invocation};

use super::{Feature, FeatureKind, FeatureProp};
use crate::agent::Agent;

/// Key in the feature state holding the last logged text.
pub const LAST_LOG: &str = "lastLog";

pub(super) fn feature() -> Feature {
    let mut methods = IndexMap::new();
    methods.insert(
        "logString".to_string(),
        MethodSignature::new(vec![ArgSpec::new("text", ArgType::String)]),
    );
    methods.insert("logProperty".to_string(), MethodSignature::default());
    Feature {
        name: "IU".to_string(),
        props: vec![FeatureProp::new("logStringText", PropType::String, "INIT")],
        methods,
        kind: FeatureKind::Iu,
    }
}

pub(super) fn invoke(
    feature: &Feature,
    agent: &mut Agent,
    method: &str,
    args: &[Value],
) -> Result<Invocation, ExecutionError> {
    let text = match method {
        "logString" => args[0].to_string(),
        "logProperty" => agent
            .prop_value(&feature.prop_path("logStringText"))
            .map(Value::to_string)
            .ok_or_else(|| ExecutionError::PropNotFound(feature.prop_path("logStringText")))?,
        other => {
            return Err(ExecutionError::MethodNotFound {
                target: format!("feature {}", feature.name),
                method: other.to_string(),
            })
        }
    };
    info!(target: "gemscript::script", agent = %agent.id(), blueprint = %agent.blueprint(), "{}", text);
    let state = agent
        .feature_state_mut(&feature.name)
        .ok_or_else(|| ExecutionError::FeatureNotFound(feature.name.clone()))?;
    state.data.insert(LAST_LOG.to_string(), Value::String(text));
    Ok(Invocation::Value(None))
}
