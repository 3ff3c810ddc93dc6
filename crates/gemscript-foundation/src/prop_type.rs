//! Property types and their built-in methods.
//!
//! # Design
//!
//! The method table here is the single source of truth for what a property
//! can do. Symbol tables read it to describe a prop's scope; the runtime
//! reads it to check arity before dispatching. Arguments are declared as
//! typed `(name, ArgType)` pairs, so the table cannot hold a malformed
//! entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The data type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropType {
    Number,
    String,
    Boolean,
}

/// Static declaration of a built-in method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDecl {
    /// Method name as written in scripts.
    pub name: &'static str,
    /// Argument names and types, in call order.
    pub args: &'static [(&'static str, ArgType)],
}

impl MethodDecl {
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Owned argument specs, as stored in symbol tables.
    pub fn arg_specs(&self) -> Vec<ArgSpec> {
        self.args
            .iter()
            .map(|&(name, kind)| ArgSpec::new(name, kind))
            .collect()
    }
}

macro_rules! method {
    ($name:literal) => {
        MethodDecl { name: $name, args: &[] }
    };
    ($name:literal, $($arg:ident: $ty:ident),+) => {
        MethodDecl { name: $name, args: &[$((stringify!($arg), ArgType::$ty)),+] }
    };
}

const NUMBER_METHODS: &[MethodDecl] = &[
    method!("setTo", value: Number),
    method!("add", value: Number),
    method!("sub", value: Number),
    method!("mul", value: Number),
    method!("div", value: Number),
    method!("setMin", min: Number),
    method!("setMax", max: Number),
    method!("setWrap"),
    method!("equal", value: Number),
    method!("greaterThan", value: Number),
    method!("lessThan", value: Number),
];

const STRING_METHODS: &[MethodDecl] = &[
    method!("setTo", value: String),
    method!("equal", value: String),
];

const BOOLEAN_METHODS: &[MethodDecl] = &[
    method!("setTo", value: Boolean),
    method!("toggle"),
    method!("isTrue"),
];

impl PropType {
    pub fn name(self) -> &'static str {
        match self {
            PropType::Number => "Number",
            PropType::String => "String",
            PropType::Boolean => "Boolean",
        }
    }

    /// Built-in methods available on a property of this type.
    pub fn methods(self) -> &'static [MethodDecl] {
        match self {
            PropType::Number => NUMBER_METHODS,
            PropType::String => STRING_METHODS,
            PropType::Boolean => BOOLEAN_METHODS,
        }
    }

    /// Look up a built-in method by name.
    pub fn method(self, name: &str) -> Option<&'static MethodDecl> {
        self.methods().iter().find(|m| m.name == name)
    }

    /// Whether `value` can be stored in a property of this type.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (PropType::Number, Value::Number(_))
                | (PropType::String, Value::String(_))
                | (PropType::Boolean, Value::Boolean(_))
        )
    }

    /// Value a freshly declared property holds when no default is given.
    pub fn zero(self) -> Value {
        match self {
            PropType::Number => Value::Number(0.0),
            PropType::String => Value::String(String::new()),
            PropType::Boolean => Value::Boolean(false),
        }
    }

    /// Argument type matching this property type.
    pub fn arg_type(self) -> ArgType {
        match self {
            PropType::Number => ArgType::Number,
            PropType::String => ArgType::String,
            PropType::Boolean => ArgType::Boolean,
        }
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Number" | "number" => Ok(PropType::Number),
            "String" | "string" => Ok(PropType::String),
            "Boolean" | "boolean" => Ok(PropType::Boolean),
            other => Err(format!("unknown property type '{}'", other)),
        }
    }
}

/// Declared type of a method argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    Number,
    String,
    Boolean,
    /// Untyped argument; any literal is accepted.
    Any,
}

impl ArgType {
    pub fn name(self) -> &'static str {
        match self {
            ArgType::Number => "number",
            ArgType::String => "string",
            ArgType::Boolean => "boolean",
            ArgType::Any => "any",
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ArgType::Any => true,
            ArgType::Number => matches!(value, Value::Number(_)),
            ArgType::String => matches!(value, Value::String(_)),
            ArgType::Boolean => matches!(value, Value::Boolean(_)),
        }
    }
}

/// One parsed argument declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgType,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, kind: ArgType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Parse a `name:type` declaration. A bare name is untyped.
    pub fn parse(decl: &str) -> Result<Self, String> {
        let (name, kind) = match decl.split_once(':') {
            Some((name, ty)) => {
                let kind = match ty.trim() {
                    "number" => ArgType::Number,
                    "string" => ArgType::String,
                    "boolean" => ArgType::Boolean,
                    "any" => ArgType::Any,
                    other => return Err(format!("unknown argument type '{}' in '{}'", other, decl)),
                };
                (name.trim(), kind)
            }
            None => (decl.trim(), ArgType::Any),
        };
        if name.is_empty() {
            return Err(format!("argument declaration '{}' has no name", decl));
        }
        Ok(Self::new(name, kind))
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind.name())
    }
}
