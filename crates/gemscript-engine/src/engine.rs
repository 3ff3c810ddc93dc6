//! The engine facade.
//!
//! [`Engine`] owns the feature registry and the blueprint registry and is
//! the single entry point for hosts: compile and register blueprints,
//! instantiate agents, run phase programs, and answer editor resolution
//! queries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use gemscript_ast::{Script, Token};
use gemscript_foundation::{AgentId, ProgramKind};
use gemscript_lexer::parse_script;
use gemscript_symbols::{SymbolData, SymbolError, SymbolHelper};
use gemscript_vm::{ExecutionError, Machine, RunOutcome};

use crate::agent::{Agent, AgentRuntime};
use crate::bundle::{BlueprintBundle, BlueprintRegistry};
use crate::compiler::{self, CompileReport};
use crate::config::EngineConfig;
use crate::error::{CompileError, EngineError};
use crate::feature::{Feature, FeatureRegistry};
use crate::keywords::Diagnostic;

/// Process-scoped scripting engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    features: RwLock<FeatureRegistry>,
    blueprints: BlueprintRegistry,
    next_agent: AtomicU64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with the built-in features and default limits.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            features: RwLock::new(FeatureRegistry::with_builtins()),
            blueprints: BlueprintRegistry::new(),
            next_agent: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Features ===

    /// Register a feature for blueprints compiled from now on.
    ///
    /// Already-registered blueprints keep the scope they were compiled
    /// with; recompile them to pick up a changed declaration.
    pub fn register_feature(&self, feature: Feature) {
        self.features.write().register(feature);
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.read().names().map(str::to_string).collect()
    }

    // === Compilation ===

    /// Parse and compile blueprint source text. Nothing is registered.
    pub fn compile_source(&self, source: &str) -> Result<CompileReport, CompileError> {
        let script = parse_script(source)?;
        self.compile_script(&script)
    }

    /// Compile a parsed script. Nothing is registered.
    pub fn compile_script(&self, script: &Script) -> Result<CompileReport, CompileError> {
        let context = self.blueprints.symbol_context();
        let features = self.features.read();
        compiler::compile_blueprint(script, &features, &context)
    }

    /// Compile source text and register the result.
    pub fn load_blueprint(&self, source: &str) -> Result<CompileReport, CompileError> {
        let report = self.compile_source(source)?;
        self.register_blueprint(report.bundle.clone());
        Ok(report)
    }

    /// Validate a script without compiling or registering it.
    pub fn validate_script(&self, script: &Script) -> Result<Vec<Diagnostic>, CompileError> {
        let context = self.blueprints.symbol_context();
        let features = self.features.read();
        compiler::validate_script(script, &features, &context)
    }

    // === Blueprints ===

    /// Register a bundle, replacing any bundle of the same name.
    pub fn register_blueprint(&self, bundle: BlueprintBundle) -> Option<Arc<BlueprintBundle>> {
        self.blueprints.register(bundle)
    }

    pub fn get_blueprint(&self, name: &str) -> Option<Arc<BlueprintBundle>> {
        self.blueprints.get(name)
    }

    pub fn get_all_blueprints(&self) -> Vec<Arc<BlueprintBundle>> {
        self.blueprints.all()
    }

    pub fn delete_blueprint(&self, name: &str) -> Option<Arc<BlueprintBundle>> {
        self.blueprints.delete(name)
    }

    pub fn blueprints_with_tag(&self, tag: &str) -> Vec<Arc<BlueprintBundle>> {
        self.blueprints.with_tag(tag)
    }

    // === Agents ===

    /// Create an agent from a registered blueprint: a fresh agent runs the
    /// DEFINE program and then the INIT program.
    pub fn instantiate(&self, blueprint: &str) -> Result<Agent, EngineError> {
        let bundle = self
            .get_blueprint(blueprint)
            .ok_or_else(|| EngineError::UnknownBlueprint(blueprint.to_string()))?;
        let id = AgentId::new(self.next_agent.fetch_add(1, Ordering::Relaxed));
        let mut agent = Agent::new(id, bundle.name.clone());
        self.run_program(&bundle, ProgramKind::Define, &mut agent)?;
        self.run_program(&bundle, ProgramKind::Init, &mut agent)?;
        info!(agent = %id, blueprint = %bundle.name, props = agent.props().count(), "instantiated agent");
        Ok(agent)
    }

    /// Run one phase program of `bundle` against `agent`.
    ///
    /// A bundle without a program for `kind` does nothing. On error the
    /// agent keeps the mutations applied before the failing opcode.
    pub fn run_program(
        &self,
        bundle: &BlueprintBundle,
        kind: ProgramKind,
        agent: &mut Agent,
    ) -> Result<RunOutcome, ExecutionError> {
        let Some(program) = bundle.program(kind) else {
            return Ok(RunOutcome {
                stack: Vec::new(),
                executed: 0,
            });
        };
        let features = self.features.read();
        let mut runtime = AgentRuntime::new(agent, &features);
        let outcome = Machine::new(self.config.limits()).run(program, &mut runtime)?;
        debug!(blueprint = %bundle.name, program = %kind, executed = outcome.executed, "ran program");
        Ok(outcome)
    }

    // === Editor support ===

    /// Resolve a reference token against a registered blueprint's scope.
    ///
    /// Read-only: no registry or agent is touched.
    pub fn resolve(&self, token: &Token, blueprint: &str) -> Result<SymbolData, SymbolError> {
        let bundle = self
            .get_blueprint(blueprint)
            .ok_or_else(|| SymbolError::noscope(format!("unknown blueprint '{}'", blueprint)))?;
        let context = self.blueprints.symbol_context();
        let mut helper = SymbolHelper::new(&bundle.symbols).with_context(&context);
        helper.resolve(token).map(|resolved| resolved.scope.clone())
    }
}
