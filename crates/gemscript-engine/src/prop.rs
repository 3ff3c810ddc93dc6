//! Live property values.
//!
//! A [`Prop`] is a typed value slot on an agent. Number props may carry a
//! lower and upper bound; values outside the bounds are clamped, or wrapped
//! into range once `setWrap` has been called and both bounds are set.

use serde::{Deserialize, Serialize};

use gemscript_foundation::{PropType, Value};
use gemscript_vm::ExecutionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    kind: PropType,
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(default)]
    wrap: bool,
}

impl Prop {
    /// A prop holding `initial`, which must match `kind`.
    pub fn new(kind: PropType, initial: Value) -> Result<Self, ExecutionError> {
        check_type(kind, &initial)?;
        Ok(Self {
            kind,
            value: initial,
            min: None,
            max: None,
            wrap: false,
        })
    }

    /// Apply bounds to a number prop and re-constrain its value.
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>, wrap: bool) -> Self {
        self.min = min;
        self.max = max;
        self.wrap = wrap;
        self.value = self.constrain(self.value.clone());
        self
    }

    pub fn kind(&self) -> PropType {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn bounds(&self) -> (Option<f64>, Option<f64>, bool) {
        (self.min, self.max, self.wrap)
    }

    /// Store a new value, type-checked and constrained to the bounds.
    pub fn set(&mut self, value: Value) -> Result<(), ExecutionError> {
        check_type(self.kind, &value)?;
        self.value = self.constrain(value);
        Ok(())
    }

    fn constrain(&self, value: Value) -> Value {
        let Value::Number(n) = value else {
            return value;
        };
        let n = match (self.min, self.max) {
            (Some(lo), Some(hi)) if self.wrap && hi > lo => lo + (n - lo).rem_euclid(hi - lo),
            (lo, hi) => {
                let mut n = n;
                if let Some(lo) = lo {
                    n = n.max(lo);
                }
                if let Some(hi) = hi {
                    n = n.min(hi);
                }
                n
            }
        };
        Value::Number(n)
    }

    fn number(&self) -> f64 {
        self.value.as_number().unwrap_or_default()
    }

    /// Run a built-in method of this prop's type.
    ///
    /// Mutators return the new value; comparisons return a boolean.
    pub fn invoke(&mut self, method: &str, args: &[Value]) -> Result<Option<Value>, ExecutionError> {
        let decl = self
            .kind
            .method(method)
            .ok_or_else(|| ExecutionError::MethodNotFound {
                target: format!("{} prop", self.kind),
                method: method.to_string(),
            })?;
        if args.len() != decl.arity() {
            return Err(ExecutionError::ArgumentCount {
                method: method.to_string(),
                expected: decl.arity(),
                found: args.len(),
            });
        }

        let result = match (self.kind, method) {
            (_, "setTo") => {
                self.set(args[0].clone())?;
                self.value.clone()
            }
            (_, "equal") => {
                check_type(self.kind, &args[0])?;
                Value::Boolean(self.value == args[0])
            }
            (PropType::Number, "add") => self.apply(number_arg(&args[0])?, |a, b| a + b)?,
            (PropType::Number, "sub") => self.apply(number_arg(&args[0])?, |a, b| a - b)?,
            (PropType::Number, "mul") => self.apply(number_arg(&args[0])?, |a, b| a * b)?,
            (PropType::Number, "div") => self.apply(number_arg(&args[0])?, |a, b| a / b)?,
            (PropType::Number, "setMin") => {
                self.min = Some(number_arg(&args[0])?);
                self.value = self.constrain(self.value.clone());
                self.value.clone()
            }
            (PropType::Number, "setMax") => {
                self.max = Some(number_arg(&args[0])?);
                self.value = self.constrain(self.value.clone());
                self.value.clone()
            }
            (PropType::Number, "setWrap") => {
                self.wrap = true;
                self.value = self.constrain(self.value.clone());
                self.value.clone()
            }
            (PropType::Number, "greaterThan") => Value::Boolean(self.number() > number_arg(&args[0])?),
            (PropType::Number, "lessThan") => Value::Boolean(self.number() < number_arg(&args[0])?),
            (PropType::Boolean, "toggle") => {
                let flipped = !self.value.truthy();
                self.set(Value::Boolean(flipped))?;
                self.value.clone()
            }
            (PropType::Boolean, "isTrue") => Value::Boolean(self.value.truthy()),
            (kind, method) => {
                return Err(ExecutionError::MethodNotFound {
                    target: format!("{} prop", kind),
                    method: method.to_string(),
                })
            }
        };
        Ok(Some(result))
    }

    fn apply(&mut self, rhs: f64, op: impl Fn(f64, f64) -> f64) -> Result<Value, ExecutionError> {
        let next = op(self.number(), rhs);
        self.set(Value::Number(next))?;
        Ok(self.value.clone())
    }
}

fn check_type(kind: PropType, value: &Value) -> Result<(), ExecutionError> {
    if kind.accepts(value) {
        Ok(())
    } else {
        Err(ExecutionError::TypeMismatch {
            expected: kind.arg_type().name(),
            found: value.type_name().to_string(),
        })
    }
}

fn number_arg(value: &Value) -> Result<f64, ExecutionError> {
    value.as_number().ok_or_else(|| ExecutionError::TypeMismatch {
        expected: "number",
        found: value.type_name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> Prop {
        Prop::new(PropType::Number, Value::Number(n)).unwrap()
    }

    #[test]
    fn test_arithmetic_returns_new_value() {
        let mut p = number(10.0);
        assert_eq!(p.invoke("add", &[Value::Number(5.0)]).unwrap(), Some(Value::Number(15.0)));
        p.invoke("div", &[Value::Number(3.0)]).unwrap();
        assert_eq!(p.value(), &Value::Number(5.0));
    }

    #[test]
    fn test_clamp_and_wrap() {
        let mut p = number(0.0);
        p.invoke("setMin", &[Value::Number(0.0)]).unwrap();
        p.invoke("setMax", &[Value::Number(360.0)]).unwrap();
        p.invoke("sub", &[Value::Number(30.0)]).unwrap();
        assert_eq!(p.value(), &Value::Number(0.0));

        p.invoke("setWrap", &[]).unwrap();
        p.invoke("sub", &[Value::Number(30.0)]).unwrap();
        assert_eq!(p.value(), &Value::Number(330.0));
        p.invoke("add", &[Value::Number(40.0)]).unwrap();
        assert_eq!(p.value(), &Value::Number(10.0));
    }

    #[test]
    fn test_comparisons() {
        let mut p = number(3.0);
        assert_eq!(
            p.invoke("greaterThan", &[Value::Number(2.0)]).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            p.invoke("equal", &[Value::Number(4.0)]).unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn test_boolean_toggle() {
        let mut p = Prop::new(PropType::Boolean, Value::Boolean(false)).unwrap();
        p.invoke("toggle", &[]).unwrap();
        assert_eq!(p.invoke("isTrue", &[]).unwrap(), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_type_and_arity_errors() {
        let mut p = Prop::new(PropType::String, Value::from("a")).unwrap();
        assert!(matches!(
            p.invoke("setTo", &[Value::Number(1.0)]),
            Err(ExecutionError::TypeMismatch { expected: "string", .. })
        ));
        assert!(matches!(
            p.invoke("setTo", &[]),
            Err(ExecutionError::ArgumentCount { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            p.invoke("add", &[Value::Number(1.0)]),
            Err(ExecutionError::MethodNotFound { .. })
        ));
        assert!(Prop::new(PropType::Number, Value::Boolean(true)).is_err());
    }
}
