//! Reference resolution.
//!
//! [`SymbolHelper`] validates the tokens of one statement at a time
//! against a blueprint scope. It keeps a cursor (the scope established by
//! the last successful step) and a sticky scan-error flag.
//!
//! # Object references
//!
//! The first segment is matched in fixed precedence: the word `agent`
//! (the blueprint's own scope), a feature name, a prop name, then a
//! blueprint name from the global context. Each later segment is matched
//! as a prop, a feature, or a blueprint against the current scope. A path
//! must end on a prop or a feature.
//!
//! # Sticky errors
//!
//! Any failed object, feature or method step sets the scan-error flag;
//! until [`SymbolHelper::reset`] every later step reports `noscope`
//! without looking at its token. Argument checks are per position and do
//! not set the flag, so one bad argument does not hide the others.

use indexmap::IndexMap;
use tracing::{trace, warn};

use gemscript_ast::Token;
use gemscript_foundation::{ArgSpec, Path};

use crate::error::{SymbolError, SymbolErrorCode};
use crate::scope::{MethodSignature, SymbolData};

/// The literal word that binds to the blueprint's own scope.
pub const AGENT_KEYWORD: &str = "agent";

/// How an object reference was rooted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefRoot {
    /// `agent.…`
    Agent,
    /// A feature used by this blueprint.
    Feature(String),
    /// A prop declared by this blueprint.
    Prop(String),
    /// Another blueprint from the global context.
    Blueprint(String),
}

/// What the final segment of a reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Prop,
    Feature,
}

/// A successfully resolved object reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    /// Scope of the final segment.
    pub scope: &'a SymbolData,
    pub root: RefRoot,
    pub terminal: Terminal,
    /// Segments with any leading `agent` removed.
    pub segments: Vec<String>,
}

impl Resolved<'_> {
    /// Path of the reference on the running agent; `None` for references
    /// into another blueprint.
    pub fn agent_path(&self) -> Option<Path> {
        match self.root {
            RefRoot::Blueprint(_) => None,
            _ => Some(Path::new(self.segments.clone())),
        }
    }

    pub fn is_prop(&self) -> bool {
        self.terminal == Terminal::Prop
    }
}

/// Statement-at-a-time resolver over one blueprint scope.
#[derive(Debug, Clone)]
pub struct SymbolHelper<'a> {
    bundle: &'a SymbolData,
    context: Option<&'a IndexMap<String, SymbolData>>,
    cursor: &'a SymbolData,
    method: Option<&'a MethodSignature>,
    scan_error: bool,
}

impl<'a> SymbolHelper<'a> {
    /// Resolver over a blueprint's top-level scope.
    pub fn new(bundle: &'a SymbolData) -> Self {
        Self {
            bundle,
            context: None,
            cursor: bundle,
            method: None,
            scan_error: false,
        }
    }

    /// Make other blueprints' scopes visible for cross-agent references.
    pub fn with_context(mut self, context: &'a IndexMap<String, SymbolData>) -> Self {
        self.context = Some(context);
        self
    }

    /// Start a new statement: back to the top scope, errors cleared.
    pub fn reset(&mut self) {
        self.cursor = self.bundle;
        self.method = None;
        self.scan_error = false;
    }

    pub fn scan_error(&self) -> bool {
        self.scan_error
    }

    pub fn bundle(&self) -> &'a SymbolData {
        self.bundle
    }

    /// Scope established by the last successful step.
    pub fn cursor(&self) -> &'a SymbolData {
        self.cursor
    }

    /// Method established by the last successful [`scope_method`](Self::scope_method).
    pub fn method(&self) -> Option<&'a MethodSignature> {
        self.method
    }

    /// Resolve a token from scratch. Intended for editor tooling.
    pub fn resolve(&mut self, token: &Token) -> Result<Resolved<'a>, SymbolError> {
        self.reset();
        self.obj_ref(token)
    }

    fn fail(&mut self, err: SymbolError) -> SymbolError {
        self.scan_error = true;
        trace!(code = %err.code, info = %err.info, "symbol error");
        err.with_scope(self.cursor)
    }

    fn suppressed() -> SymbolError {
        SymbolError::noscope("skipped after an earlier error in this statement")
    }

    fn blueprint(&self, name: &str) -> Option<&'a SymbolData> {
        self.context.and_then(|ctx| ctx.get(name))
    }

    /// Resolve an identifier or objref token to a prop or feature scope.
    ///
    /// The cursor is reset to the top scope first. On success it is left
    /// on the resolved scope.
    pub fn obj_ref(&mut self, token: &Token) -> Result<Resolved<'a>, SymbolError> {
        self.cursor = self.bundle;
        self.method = None;
        if self.scan_error {
            return Err(Self::suppressed());
        }
        let parts = match token.ref_parts() {
            Some(parts) if !parts.is_empty() => parts,
            _ => {
                let err = SymbolError::noparse(format!(
                    "expected a reference, found {}",
                    token.kind().name()
                ));
                return Err(self.fail(err));
            }
        };
        let (first, rest) = (parts[0], &parts[1..]);

        let (root, mut scope, mut terminal) = if first == AGENT_KEYWORD {
            (RefRoot::Agent, self.bundle, None)
        } else if let Some(feature) = self.bundle.feature(first) {
            (RefRoot::Feature(first.to_string()), feature, Some(Terminal::Feature))
        } else if let Some(prop) = self.bundle.prop(first) {
            (RefRoot::Prop(first.to_string()), prop, Some(Terminal::Prop))
        } else if let Some(blueprint) = self.blueprint(first) {
            (RefRoot::Blueprint(first.to_string()), blueprint, None)
        } else {
            let err = SymbolError::noscope(format!(
                "'{}' is not a feature, prop or blueprint",
                first
            ));
            return Err(self.fail(err));
        };
        self.cursor = scope;

        for (i, segment) in rest.iter().enumerate() {
            if let Some(prop) = scope.prop(segment) {
                scope = prop;
                terminal = Some(Terminal::Prop);
            } else if let Some(feature) = scope.feature(segment) {
                scope = feature;
                terminal = Some(Terminal::Feature);
            } else if let Some(blueprint) = self.blueprint(segment) {
                scope = blueprint;
                terminal = None;
            } else {
                let err = SymbolError::noscope(format!(
                    "'{}' does not exist in '{}'",
                    segment,
                    parts[..=i].join(".")
                ));
                return Err(self.fail(err));
            }
            self.cursor = scope;
        }

        let Some(terminal) = terminal else {
            let err = SymbolError::noparse(format!(
                "'{}' does not name a prop or feature",
                parts.join(".")
            ));
            return Err(self.fail(err));
        };
        let segments = if first == AGENT_KEYWORD { rest } else { &parts[..] };
        Ok(Resolved {
            scope,
            root,
            terminal,
            segments: segments.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Resolve a bare feature name against the blueprint's features.
    pub fn feature_ref(&mut self, token: Option<&Token>) -> Result<&'a SymbolData, SymbolError> {
        self.cursor = self.bundle;
        self.method = None;
        if self.scan_error {
            return Err(Self::suppressed());
        }
        let Some(token) = token else {
            return Err(self.fail(SymbolError::noparse("missing feature name")));
        };
        let Some(name) = token.identifier() else {
            let err = SymbolError::noparse(format!(
                "expected a feature name, found {}",
                token.kind().name()
            ));
            return Err(self.fail(err));
        };
        match self.bundle.feature(name) {
            Some(scope) => {
                self.cursor = scope;
                Ok(scope)
            }
            None => {
                let err = match self.bundle.features {
                    None => SymbolError::noexist("blueprint uses no features"),
                    Some(_) => SymbolError::noexist(format!("feature '{}' is not used", name)),
                };
                Err(self.fail(err))
            }
        }
    }

    /// Resolve a method name token against the current scope.
    pub fn scope_method(
        &mut self,
        token: Option<&Token>,
    ) -> Result<&'a MethodSignature, SymbolError> {
        if self.scan_error {
            return Err(Self::suppressed());
        }
        let Some(token) = token else {
            return Err(self.fail(SymbolError::noparse("missing method name")));
        };
        let Some(name) = token.identifier() else {
            let err = SymbolError::noparse(format!(
                "expected a method name, found {}",
                token.kind().name()
            ));
            return Err(self.fail(err));
        };
        let Some(methods) = self.cursor.methods.as_ref() else {
            return Err(self.fail(SymbolError::noexist("scope has no methods")));
        };
        match methods.get(name) {
            Some(signature) => {
                self.method = Some(signature);
                Ok(signature)
            }
            None => {
                let err = SymbolError::noexist(format!("method '{}' does not exist", name));
                Err(self.fail(err))
            }
        }
    }

    /// Check argument tokens against the current method's signature.
    ///
    /// Returns one result per position, covering both the declared
    /// arguments and the supplied tokens: extra tokens are `over`, missing
    /// ones are `under`, and each supplied argument is type-checked.
    pub fn scope_args(&mut self, tokens: &[Token]) -> Vec<Result<(), SymbolError>> {
        if self.scan_error {
            return (0..tokens.len().max(1))
                .map(|_| Err(Self::suppressed()))
                .collect();
        }
        let Some(signature) = self.method else {
            return vec![Err(SymbolError::new(
                SymbolErrorCode::Debug,
                "no method in scope for arguments",
            ))];
        };
        let count = signature.arity().max(tokens.len());
        (0..count)
            .map(|i| match (signature.args.get(i), tokens.get(i)) {
                (Some(spec), Some(token)) => check_arg(spec, token),
                (None, Some(token)) => {
                    warn!(position = i + 1, kind = token.kind().name(), "extra argument ignored");
                    Err(SymbolError::new(
                        SymbolErrorCode::Over,
                        format!("extra argument at position {}", i + 1),
                    ))
                }
                (Some(spec), None) => Err(SymbolError::new(
                    SymbolErrorCode::Under,
                    format!("missing argument '{}' at position {}", spec, i + 1),
                )),
                (None, None) => Ok(()),
            })
            .collect()
    }
}

fn check_arg(spec: &ArgSpec, token: &Token) -> Result<(), SymbolError> {
    match token.literal_value() {
        Some(value) if spec.kind.accepts(value) => Ok(()),
        Some(value) => Err(SymbolError::noparse(format!(
            "argument '{}' expects {}, found {}",
            spec.name,
            spec.kind.name(),
            value.type_name()
        ))),
        None => Err(SymbolError::noparse(format!(
            "argument '{}' must be a literal, found {}",
            spec.name,
            token.kind().name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeBuilder;
    use gemscript_foundation::PropType;

    fn movement() -> SymbolData {
        let mut b = ScopeBuilder::new();
        b.prop("movementType", PropType::String).unwrap();
        b.prop("direction", PropType::Number).unwrap();
        b.method("setController", MethodSignature::parse(&["controller:string"]).unwrap())
            .unwrap();
        b.method(
            "moveTo",
            MethodSignature::parse(&["x:number", "y:number"]).unwrap(),
        )
        .unwrap();
        b.build()
    }

    fn fish() -> SymbolData {
        let mut b = ScopeBuilder::new();
        b.prop("energy", PropType::Number).unwrap();
        b.feature("Movement", movement()).unwrap();
        b.build()
    }

    fn codes(results: &[Result<(), SymbolError>]) -> Vec<Option<SymbolErrorCode>> {
        results.iter().map(|r| r.as_ref().err().map(|e| e.code)).collect()
    }

    #[test]
    fn test_agent_feature_prop_path() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let resolved = helper
            .resolve(&Token::objref("agent.Movement.direction"))
            .unwrap();
        assert_eq!(resolved.scope, bp.descend(&["Movement", "direction"]).unwrap()[1]);
        assert_eq!(resolved.terminal, Terminal::Prop);
        assert_eq!(resolved.root, RefRoot::Agent);
        assert_eq!(resolved.agent_path(), Some(Path::from("Movement.direction")));
        assert!(!helper.scan_error());
    }

    #[test]
    fn test_unknown_first_segment_is_noscope_and_sticky() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let err = helper.obj_ref(&Token::objref("Nope.thing")).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoScope);
        assert!(helper.scan_error());

        // Later steps in the same statement are suppressed.
        let err = helper.obj_ref(&Token::objref("agent.energy")).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoScope);
        let err = helper.scope_method(Some(&Token::ident("add"))).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoScope);

        helper.reset();
        assert!(helper.obj_ref(&Token::objref("agent.energy")).is_ok());
    }

    #[test]
    fn test_agent_unknown_member_is_noscope() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let err = helper.resolve(&Token::objref("agent.Nope")).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoScope);
        assert_eq!(err.scope.as_ref(), Some(&bp));
    }

    #[test]
    fn test_non_reference_token_is_noparse() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let err = helper.resolve(&Token::literal(3.0)).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoParse);
        assert!(helper.scan_error());
    }

    #[test]
    fn test_path_without_prop_or_feature_is_noparse() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let err = helper.resolve(&Token::ident("agent")).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoParse);
    }

    #[test]
    fn test_bare_prop_and_feature() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let energy = helper.resolve(&Token::ident("energy")).unwrap();
        assert_eq!(energy.root, RefRoot::Prop("energy".into()));
        let movement = helper.resolve(&Token::ident("Movement")).unwrap();
        assert_eq!(movement.terminal, Terminal::Feature);
        assert_eq!(movement.agent_path(), Some(Path::from("Movement")));
    }

    #[test]
    fn test_blueprint_context_reference() {
        let bp = fish();
        let mut context = IndexMap::new();
        context.insert("Shark".to_string(), fish());
        let mut helper = SymbolHelper::new(&bp).with_context(&context);
        let resolved = helper.resolve(&Token::objref("Shark.energy")).unwrap();
        assert_eq!(resolved.root, RefRoot::Blueprint("Shark".into()));
        assert_eq!(resolved.agent_path(), None);
    }

    #[test]
    fn test_method_lookup_errors() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);

        helper.resolve(&Token::objref("agent.energy")).unwrap();
        let sig = helper.scope_method(Some(&Token::ident("add"))).unwrap();
        assert_eq!(sig.arity(), 1);

        helper.resolve(&Token::objref("agent.energy")).unwrap();
        let err = helper.scope_method(Some(&Token::ident("fly"))).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoExist);

        helper.resolve(&Token::objref("agent.energy")).unwrap();
        let err = helper.scope_method(Some(&Token::literal(1.0))).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoParse);

        helper.resolve(&Token::objref("agent.energy")).unwrap();
        let err = helper.scope_method(None).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoParse);
    }

    #[test]
    fn test_feature_ref() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        assert!(helper.feature_ref(Some(&Token::ident("Movement"))).is_ok());
        assert!(helper.scope_method(Some(&Token::ident("setController"))).is_ok());

        helper.reset();
        let err = helper.feature_ref(Some(&Token::ident("IU"))).unwrap_err();
        assert_eq!(err.code, SymbolErrorCode::NoExist);
    }

    #[test]
    fn test_under_keeps_validating_earlier_args() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        helper.feature_ref(Some(&Token::ident("Movement"))).unwrap();
        helper.scope_method(Some(&Token::ident("moveTo"))).unwrap();

        let ok_first = helper.scope_args(&[Token::literal(1.0)]);
        assert_eq!(codes(&ok_first), vec![None, Some(SymbolErrorCode::Under)]);

        let bad_first = helper.scope_args(&[Token::literal("one")]);
        assert_eq!(
            codes(&bad_first),
            vec![Some(SymbolErrorCode::NoParse), Some(SymbolErrorCode::Under)]
        );
        assert!(!helper.scan_error());
    }

    #[test]
    fn test_over_tags_extra_args() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        helper.resolve(&Token::objref("agent.energy")).unwrap();
        helper.scope_method(Some(&Token::ident("add"))).unwrap();
        let results = helper.scope_args(&[Token::literal(1.0), Token::literal(2.0)]);
        assert_eq!(codes(&results), vec![None, Some(SymbolErrorCode::Over)]);
    }

    #[test]
    fn test_args_without_method_is_debug() {
        let bp = fish();
        let mut helper = SymbolHelper::new(&bp);
        let results = helper.scope_args(&[]);
        assert_eq!(codes(&results), vec![Some(SymbolErrorCode::Debug)]);
    }
}
