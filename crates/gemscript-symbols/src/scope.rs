//! Scope model.
//!
//! A scope has up to three dictionaries: `props`, `methods` and
//! `features`. A prop's own scope carries its type tag and the methods of
//! that type. A feature's scope carries the props and methods it
//! declares. A blueprint's scope carries its own props plus every feature
//! scope, and no methods of its own.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use gemscript_foundation::{ArgSpec, PropType};

use crate::error::DeclarationError;
use crate::resolver::AGENT_KEYWORD;

/// Argument signature of a callable method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub args: Vec<ArgSpec>,
}

impl MethodSignature {
    pub fn new(args: Vec<ArgSpec>) -> Self {
        Self { args }
    }

    /// Build a signature from `name:type` declarations.
    pub fn parse(decls: &[&str]) -> Result<Self, String> {
        let args = decls
            .iter()
            .map(|d| ArgSpec::parse(d))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { args })
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// Static description of the names reachable from one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolData {
    /// Type tag; present only on prop scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<IndexMap<String, SymbolData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<IndexMap<String, MethodSignature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<IndexMap<String, SymbolData>>,
}

impl SymbolData {
    /// Scope of a prop of the given type: its type tag plus the type's
    /// built-in methods.
    pub fn for_prop(kind: PropType) -> Self {
        let methods = kind
            .methods()
            .iter()
            .map(|decl| (decl.name.to_string(), MethodSignature::new(decl.arg_specs())))
            .collect();
        Self {
            kind: Some(kind),
            props: None,
            methods: Some(methods),
            features: None,
        }
    }

    pub fn is_prop(&self) -> bool {
        self.kind.is_some()
    }

    pub fn prop(&self, name: &str) -> Option<&SymbolData> {
        self.props.as_ref()?.get(name)
    }

    pub fn feature(&self, name: &str) -> Option<&SymbolData> {
        self.features.as_ref()?.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.as_ref()?.get(name)
    }

    pub fn prop_names(&self) -> impl Iterator<Item = &str> {
        self.props.iter().flat_map(|m| m.keys().map(String::as_str))
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().flat_map(|m| m.keys().map(String::as_str))
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().flat_map(|m| m.keys().map(String::as_str))
    }

    /// Descend through prop and feature names, returning the scope
    /// reached at each hop. `None` if any segment is unknown.
    pub fn descend<'a>(&'a self, segments: &[&str]) -> Option<Vec<&'a SymbolData>> {
        let mut hops = Vec::with_capacity(segments.len());
        let mut current = self;
        for segment in segments {
            current = current.prop(segment).or_else(|| current.feature(segment))?;
            hops.push(current);
        }
        Some(hops)
    }
}

/// Builds a [`SymbolData`] while rejecting name collisions.
#[derive(Debug, Default)]
pub struct ScopeBuilder {
    data: SymbolData,
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a prop of the given type.
    pub fn prop(&mut self, name: &str, kind: PropType) -> Result<&mut Self, DeclarationError> {
        check_reserved(name)?;
        if self.data.prop(name).is_some() {
            return Err(DeclarationError::DuplicateProp(name.to_string()));
        }
        if self.data.feature(name).is_some() {
            return Err(DeclarationError::NamespaceCollision(name.to_string()));
        }
        self.data
            .props
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), SymbolData::for_prop(kind));
        Ok(self)
    }

    /// Attach a feature's scope under its name.
    pub fn feature(&mut self, name: &str, scope: SymbolData) -> Result<&mut Self, DeclarationError> {
        check_reserved(name)?;
        if self.data.feature(name).is_some() {
            return Err(DeclarationError::DuplicateFeature(name.to_string()));
        }
        if self.data.prop(name).is_some() {
            return Err(DeclarationError::NamespaceCollision(name.to_string()));
        }
        self.data
            .features
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), scope);
        Ok(self)
    }

    /// Declare a callable method.
    pub fn method(
        &mut self,
        name: &str,
        signature: MethodSignature,
    ) -> Result<&mut Self, DeclarationError> {
        if self.data.method(name).is_some() {
            return Err(DeclarationError::DuplicateMethod(name.to_string()));
        }
        self.data
            .methods
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), signature);
        Ok(self)
    }

    pub fn build(self) -> SymbolData {
        self.data
    }
}

fn check_reserved(name: &str) -> Result<(), DeclarationError> {
    if name == AGENT_KEYWORD {
        return Err(DeclarationError::Reserved(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemscript_foundation::ArgType;

    fn movement() -> SymbolData {
        let mut b = ScopeBuilder::new();
        b.prop("direction", PropType::Number).unwrap();
        b.method("setController", MethodSignature::parse(&["controller:string"]).unwrap())
            .unwrap();
        b.build()
    }

    #[test]
    fn test_prop_scope_carries_type_methods() {
        let scope = SymbolData::for_prop(PropType::Boolean);
        assert_eq!(scope.kind, Some(PropType::Boolean));
        let names: Vec<&str> = scope.method_names().collect();
        assert_eq!(names, vec!["setTo", "toggle", "isTrue"]);
    }

    #[test]
    fn test_prop_scope_lists_every_table_method() {
        for kind in [PropType::Number, PropType::String, PropType::Boolean] {
            let scope = SymbolData::for_prop(kind);
            assert_eq!(scope.method_names().count(), kind.methods().len());
            for decl in kind.methods() {
                let sig = scope.method(decl.name).unwrap();
                assert_eq!(sig.args, decl.arg_specs());
            }
        }
        let scope = SymbolData::for_prop(PropType::Number);
        assert_eq!(scope.method("add").unwrap().args[0].kind, ArgType::Number);
    }

    #[test]
    fn test_descend_returns_each_hop() {
        let mut b = ScopeBuilder::new();
        b.prop("energy", PropType::Number).unwrap();
        b.feature("Movement", movement()).unwrap();
        let bp = b.build();

        let hops = bp.descend(&["Movement", "direction"]).unwrap();
        assert_eq!(hops.len(), 2);
        assert!(hops[0].method("setController").is_some());
        assert_eq!(hops[1].kind, Some(PropType::Number));
        assert!(bp.descend(&["Movement", "speed"]).is_none());
    }

    #[test]
    fn test_collisions_rejected() {
        let mut b = ScopeBuilder::new();
        b.prop("x", PropType::Number).unwrap();
        assert_eq!(
            b.prop("x", PropType::String).unwrap_err(),
            DeclarationError::DuplicateProp("x".into())
        );
        assert_eq!(
            b.feature("x", movement()).unwrap_err(),
            DeclarationError::NamespaceCollision("x".into())
        );
        b.feature("Movement", movement()).unwrap();
        assert_eq!(
            b.feature("Movement", movement()).unwrap_err(),
            DeclarationError::DuplicateFeature("Movement".into())
        );
        assert_eq!(
            b.prop("agent", PropType::Number).unwrap_err(),
            DeclarationError::Reserved("agent".into())
        );
    }

    #[test]
    fn test_serializes_without_empty_dictionaries() {
        let json = serde_json::to_value(SymbolData::for_prop(PropType::String)).unwrap();
        assert!(json.get("props").is_none());
        assert!(json.get("methods").unwrap().get("equal").is_some());
    }
}
