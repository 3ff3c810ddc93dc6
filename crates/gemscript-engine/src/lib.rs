//! GEMSCRIPT engine: blueprint compiler, feature registry and agent
//! runtime.
//!
//! A blueprint is authored as script text, compiled into a
//! [`BlueprintBundle`] of per-phase opcode programs, and registered by name.
//! Agents are instantiated from bundles and driven one phase program at a
//! time by an external scheduler through [`Engine::run_program`].
//!
//! ```text
//! source ─▶ lexer ─▶ Script ─▶ symbolize ─▶ validate ─▶ compile ─▶ BlueprintBundle
//!                                                                      │
//!                          Agent ◀── DEFINE/INIT ◀── instantiate ◀─────┘
//! ```
//!
//! # Design
//!
//! - Registries are owned by [`Engine`]; nothing is global
//! - Bundles are replaced wholesale by name and shared as `Arc`
//! - Statement problems are diagnostics; blueprint-level problems are
//!   [`CompileError`]s that block registration
//! - A runtime error aborts one invocation for one agent only

pub mod agent;
pub mod bundle;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod feature;
pub mod keywords;
pub mod prop;

pub use agent::{Agent, AgentRuntime, AgentSnapshot, FeatureState};
pub use bundle::{BlueprintBundle, BlueprintRegistry};
pub use compiler::{compile_blueprint, symbolize, validate_script, CompileReport};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{CompileError, EngineError};
pub use feature::{Feature, FeatureKind, FeatureProp, FeatureRegistry, ScriptedFeature};
pub use keywords::{keyword_for, keyword_specs, Diagnostic, KeywordSpec};
pub use prop::Prop;
