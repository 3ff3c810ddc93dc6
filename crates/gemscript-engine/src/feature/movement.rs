//! Built-in `Movement` feature.

use indexmap::IndexMap;

use gemscript_foundation::{ArgSpec, ArgType, PropType, Value};
use gemscript_symbols::MethodSignature;
use gemscript_vm::{ExecutionError, Invocation};

use super::{Feature, FeatureKind, FeatureProp};
use crate::agent::Agent;

pub(super) fn feature() -> Feature {
    let mut methods = IndexMap::new();
    methods.insert(
        "setController".to_string(),
        MethodSignature::new(vec![ArgSpec::new("controller", ArgType::String)]),
    );
    methods.insert(
        "setMovementType".to_string(),
        MethodSignature::new(vec![ArgSpec::new("type", ArgType::String)]),
    );
    methods.insert(
        "setDirection".to_string(),
        MethodSignature::new(vec![ArgSpec::new("degrees", ArgType::Number)]),
    );
    Feature {
        name: "Movement".to_string(),
        props: vec![
            FeatureProp::new("movementType", PropType::String, "static"),
            FeatureProp::new("controller", PropType::String, ""),
            FeatureProp::new("direction", PropType::Number, 0.0).bounded(0.0, 360.0, true),
        ],
        methods,
        kind: FeatureKind::Movement,
    }
}

/// Each method stores its argument into the prop of the same role.
pub(super) fn invoke(
    feature: &Feature,
    agent: &mut Agent,
    method: &str,
    args: &[Value],
) -> Result<Invocation, ExecutionError> {
    let prop = match method {
        "setController" => "controller",
        "setMovementType" => "movementType",
        "setDirection" => "direction",
        other => {
            return Err(ExecutionError::MethodNotFound {
                target: format!("feature {}", feature.name),
                method: other.to_string(),
            })
        }
    };
    let path = feature.prop_path(prop);
    agent.set_prop_value(&path, args[0].clone())?;
    Ok(Invocation::Value(agent.prop_value(&path).cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemscript_foundation::{AgentId, Path};

    #[test]
    fn test_set_direction_wraps() {
        let movement = feature();
        let mut agent = Agent::new(AgentId::new(7), "Fish");
        movement.decorate(&mut agent, 0).unwrap();

        let result = movement
            .invoke(&mut agent, "setDirection", &[Value::Number(400.0)])
            .unwrap();
        assert!(matches!(result, Invocation::Value(Some(Value::Number(n))) if n == 40.0));
        assert_eq!(
            agent.prop_value(&Path::from_path_str("Movement.direction")),
            Some(&Value::Number(40.0))
        );
    }

    #[test]
    fn test_set_controller_type_checked() {
        let movement = feature();
        let mut agent = Agent::new(AgentId::new(7), "Fish");
        movement.decorate(&mut agent, 0).unwrap();
        assert!(matches!(
            movement.invoke(&mut agent, "setController", &[Value::Number(1.0)]),
            Err(ExecutionError::TypeMismatch { .. })
        ));
        movement
            .invoke(&mut agent, "setController", &[Value::from("keyboard")])
            .unwrap();
        assert_eq!(
            agent.prop_value(&Path::from_path_str("Movement.controller")),
            Some(&Value::from("keyboard"))
        );
    }
}
