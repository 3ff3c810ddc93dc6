//! Integration test harness for GEMSCRIPT.
//!
//! This crate provides utilities for end-to-end testing of the full
//! pipeline: Parse → Symbolize → Validate → Compile → Instantiate → Run.

use std::sync::Arc;

use gemscript_engine::{Agent, BlueprintBundle, CompileReport, Engine, EngineConfig, Feature};
use gemscript_foundation::{Path, ProgramKind, Value};
use gemscript_vm::{ExecutionError, RunOutcome};

/// Test harness owning an engine and the agents it instantiated.
pub struct TestHarness {
    engine: Engine,
    agents: Vec<Agent>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_engine(Engine::new())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_engine(Engine::with_config(config))
    }

    fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            agents: Vec::new(),
        }
    }

    /// Create a harness and load one blueprint.
    ///
    /// # Panics
    ///
    /// Panics if the blueprint fails to compile.
    pub fn from_source(source: &str) -> Self {
        let mut harness = Self::new();
        harness.load(source);
        harness
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn register_feature(&self, feature: Feature) {
        self.engine.register_feature(feature);
    }

    /// Compile and register a blueprint.
    ///
    /// # Panics
    ///
    /// Panics if compilation fails.
    pub fn load(&mut self, source: &str) -> CompileReport {
        match self.engine.load_blueprint(source) {
            Ok(report) => report,
            Err(err) => panic!("Compilation failed: {}", err),
        }
    }

    pub fn bundle(&self, name: &str) -> Arc<BlueprintBundle> {
        self.engine
            .get_blueprint(name)
            .unwrap_or_else(|| panic!("Blueprint '{}' is not registered", name))
    }

    /// Instantiate an agent and return its index in the harness.
    ///
    /// # Panics
    ///
    /// Panics if instantiation fails.
    pub fn spawn(&mut self, blueprint: &str) -> usize {
        let agent = match self.engine.instantiate(blueprint) {
            Ok(agent) => agent,
            Err(err) => panic!("Instantiation of '{}' failed: {}", blueprint, err),
        };
        self.agents.push(agent);
        self.agents.len() - 1
    }

    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index]
    }

    /// Run one phase program for one agent.
    pub fn run(&mut self, index: usize, kind: ProgramKind) -> Result<RunOutcome, ExecutionError> {
        let agent = &mut self.agents[index];
        let bundle = self
            .engine
            .get_blueprint(agent.blueprint())
            .unwrap_or_else(|| panic!("Blueprint '{}' is not registered", agent.blueprint()));
        self.engine.run_program(&bundle, kind, agent)
    }

    /// Run UPDATE then THINK for every agent, `count` times. Errors are
    /// returned per agent per phase and do not stop the tick.
    pub fn run_ticks(&mut self, count: u64) -> Vec<(usize, ExecutionError)> {
        let mut errors = Vec::new();
        for _ in 0..count {
            for index in 0..self.agents.len() {
                for kind in [ProgramKind::Update, ProgramKind::Think] {
                    if let Err(err) = self.run(index, kind) {
                        errors.push((index, err));
                    }
                }
            }
        }
        errors
    }

    /// A prop value by dotted path.
    pub fn value(&self, index: usize, path: &str) -> Option<&Value> {
        self.agents[index].prop_value(&Path::from_path_str(path))
    }

    /// A number prop by dotted path.
    pub fn number(&self, index: usize, path: &str) -> Option<f64> {
        self.value(index, path).and_then(Value::as_number)
    }
}
