//! Integration tests for end-to-end GEMSCRIPT execution.
//!
//! These tests verify the full pipeline:
//! Source → Compile → Register → Instantiate → Run → Verify

use std::sync::Arc;

use proptest::prelude::*;

use gemscript_ast::{to_text, Token};
use gemscript_engine::{CompileError, FeatureProp, ScriptedFeature};
use gemscript_foundation::{Path, ProgramKind, PropType, Value};
use gemscript_lexer::parse_script;
use gemscript_symbols::{DeclarationError, SymbolErrorCode};
use gemscript_tests::TestHarness;
use gemscript_vm::{ExecutionError, OpProgram, Opcode};

const FISH: &str = r#"
# BLUEPRINT Fish
# TAG isCharControllable true
addProp energy Number 10
addProp mood String "calm"
addProp alive Boolean true
useFeature Movement
useFeature IU

# PROGRAM INIT
prop energy setMin 0
prop energy setMax 20

# PROGRAM UPDATE
prop energy sub 3
ifProp energy lessThan 5 [[
  setProp mood "hungry"
  featCall IU logString "need food"
]] [[
  setProp mood "calm"
]]

# PROGRAM THINK
prop agent.Movement.direction sub 30
"#;

/// Scenario: a pushed literal popped into a declared prop.
#[test]
fn test_push_then_pop_into_prop() {
    let mut harness = TestHarness::from_source("# BLUEPRINT Counter\naddProp x Number 0\n");
    let mut bundle = (*harness.bundle("Counter")).clone();
    bundle.programs.insert(
        ProgramKind::Update,
        OpProgram::from_ops(vec![
            Opcode::Push(Value::Number(5.0)),
            Opcode::PopAgentPropValue(Path::from("x")),
        ]),
    );
    harness.engine().register_blueprint(bundle);

    let agent = harness.spawn("Counter");
    let outcome = harness.run(agent, ProgramKind::Update).unwrap();
    assert!(outcome.stack.is_empty());
    assert_eq!(harness.number(agent, "x"), Some(5.0));
}

/// Scenario: a feature prop resolves through `agent.Feature.prop`.
#[test]
fn test_resolve_feature_prop() {
    let harness = TestHarness::from_source(FISH);
    let scope = harness
        .engine()
        .resolve(&Token::objref("agent.Movement.direction"), "Fish")
        .unwrap();
    assert_eq!(scope.kind, Some(PropType::Number));
    assert!(scope.method("setWrap").is_some());
}

/// Scenario: an unknown segment under `agent` is `noscope`.
#[test]
fn test_resolve_unknown_is_noscope() {
    let harness = TestHarness::from_source(FISH);
    let err = harness
        .engine()
        .resolve(&Token::objref("agent.Nope"), "Fish")
        .unwrap_err();
    assert_eq!(err.code, SymbolErrorCode::NoScope);
}

/// Scenario: one argument for a two-argument method is `under` at the
/// missing position; the supplied argument is still type-checked.
#[test]
fn test_missing_argument_is_under() {
    let mut harness = TestHarness::new();
    harness.register_feature(
        ScriptedFeature::new("Pair")
            .method("combine", &["a:number", "b:number"], OpProgram::new())
            .unwrap()
            .build(),
    );

    let report = harness.load("# BLUEPRINT P\nuseFeature Pair\n# PROGRAM UPDATE\nfeatCall Pair combine 1\n");
    let found: Vec<_> = report.diagnostics.iter().map(|d| (d.token, d.error.code)).collect();
    assert_eq!(found, vec![(4, SymbolErrorCode::Under)]);

    let report = harness.load("# BLUEPRINT P\nuseFeature Pair\n# PROGRAM UPDATE\nfeatCall Pair combine true\n");
    let found: Vec<_> = report.diagnostics.iter().map(|d| (d.token, d.error.code)).collect();
    assert_eq!(found, vec![(3, SymbolErrorCode::NoParse), (4, SymbolErrorCode::Under)]);
}

#[test]
fn test_extra_argument_is_over_and_still_runs() {
    let mut harness = TestHarness::from_source("# BLUEPRINT P\naddProp x Number 1\n");
    let report = harness.load("# BLUEPRINT P\naddProp x Number 1\n# PROGRAM UPDATE\nprop x add 2 99\n");
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].error.code, SymbolErrorCode::Over);
    assert!(!report.has_errors());

    let agent = harness.spawn("P");
    harness.run(agent, ProgramKind::Update).unwrap();
    assert_eq!(harness.number(agent, "x"), Some(3.0));
}

/// A declaration whose default does not fit its type is skipped, and the
/// prop never reaches the blueprint scope for later statements to use.
#[test]
fn test_mistyped_default_declares_nothing() {
    let mut harness = TestHarness::new();
    let report = harness.load("# BLUEPRINT F\naddProp x Number \"a\"\n# PROGRAM UPDATE\nsetProp x 5\n");
    let found: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.keyword.as_str(), d.token, d.error.code))
        .collect();
    assert_eq!(
        found,
        vec![("addProp", 3, SymbolErrorCode::NoParse), ("setProp", 1, SymbolErrorCode::NoScope)]
    );
    assert!(harness.bundle("F").symbols.prop("x").is_none());

    let agent = harness.spawn("F");
    harness.run(agent, ProgramKind::Update).unwrap();
    assert!(harness.value(agent, "x").is_none());
}

#[test]
fn test_fish_lifecycle() {
    let mut harness = TestHarness::from_source(FISH);
    let fish = harness.spawn("Fish");
    assert_eq!(harness.number(fish, "energy"), Some(10.0));
    assert_eq!(harness.value(fish, "IU.logStringText"), Some(&Value::from("INIT")));

    assert!(harness.run_ticks(1).is_empty());
    assert_eq!(harness.number(fish, "energy"), Some(7.0));
    assert_eq!(harness.value(fish, "mood"), Some(&Value::from("calm")));
    assert_eq!(harness.number(fish, "Movement.direction"), Some(330.0));

    assert!(harness.run_ticks(1).is_empty());
    assert_eq!(harness.number(fish, "energy"), Some(4.0));
    assert_eq!(harness.value(fish, "mood"), Some(&Value::from("hungry")));
    assert_eq!(
        harness.agent(fish).feature_state("IU").unwrap().data.get("lastLog"),
        Some(&Value::from("need food"))
    );

    // Clamped at the lower bound set during INIT.
    assert!(harness.run_ticks(3).is_empty());
    assert_eq!(harness.number(fish, "energy"), Some(0.0));
    assert_eq!(harness.number(fish, "Movement.direction"), Some(210.0));
}

#[test]
fn test_source_round_trip() {
    let script = parse_script(FISH).unwrap();
    let text = to_text(&script);
    assert_eq!(parse_script(&text).unwrap(), script);
    assert_eq!(to_text(&parse_script(&text).unwrap()), text);
}

#[test]
fn test_instantiation_is_idempotent() {
    let mut harness = TestHarness::from_source(FISH);
    let a = harness.spawn("Fish");
    let b = harness.spawn("Fish");
    assert_ne!(harness.agent(a).id(), harness.agent(b).id());
    assert_eq!(harness.agent(a).prop_types(), harness.agent(b).prop_types());
    assert_eq!(
        harness.agent(a).feature_names().collect::<Vec<_>>(),
        vec!["Movement", "IU"]
    );
}

#[test]
fn test_collisions_block_registration() {
    let harness = TestHarness::new();
    let err = harness
        .engine()
        .load_blueprint("# BLUEPRINT Bad\naddProp Movement Number 0\nuseFeature Movement\n")
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::Declaration(DeclarationError::NamespaceCollision("Movement".to_string()))
    );
    assert!(harness.engine().get_blueprint("Bad").is_none());

    harness.register_feature(
        ScriptedFeature::new("Tank")
            .prop(FeatureProp::new("level", PropType::Number, 0.0))
            .build(),
    );
    let err = harness
        .engine()
        .load_blueprint("# BLUEPRINT Bad\nuseFeature Tank\nuseFeature Tank\n")
        .unwrap_err();
    assert!(matches!(err, CompileError::Declaration(DeclarationError::DuplicateFeature(_))));
    assert!(harness.engine().get_blueprint("Bad").is_none());
}

#[test]
fn test_replacement_keeps_old_bundle_for_readers() {
    let mut harness = TestHarness::from_source("# BLUEPRINT Fish\naddProp x Number 1\n");
    let old = harness.bundle("Fish");
    harness.load("# BLUEPRINT Fish\n# TAG fast\naddProp x Number 1\naddProp y Number 2\n");

    let new = harness.bundle("Fish");
    assert!(!Arc::ptr_eq(&old, &new));
    assert!(old.symbols.prop("y").is_none());
    assert!(new.symbols.prop("y").is_some());
    assert!(!old.has_tag("fast"));
    assert_eq!(harness.engine().blueprints_with_tag("fast").len(), 1);
    assert_eq!(harness.engine().get_all_blueprints().len(), 1);
}

#[test]
fn test_runtime_error_is_isolated() {
    let mut harness = TestHarness::new();
    harness.register_feature(
        ScriptedFeature::new("Faulty")
            .method(
                "explode",
                &[],
                OpProgram::from_ops(vec![Opcode::Push(Value::Number(3.0)), Opcode::StackToScope]),
            )
            .unwrap()
            .build(),
    );
    harness.load(
        "# BLUEPRINT Bomb\naddProp ticks Number 0\nuseFeature Faulty\n# PROGRAM UPDATE\nprop ticks add 1\nfeatCall Faulty explode\nprop ticks add 100\n",
    );
    harness.load("# BLUEPRINT Clock\naddProp ticks Number 0\n# PROGRAM UPDATE\nprop ticks add 1\n");

    let bomb = harness.spawn("Bomb");
    let clock = harness.spawn("Clock");
    let errors = harness.run_ticks(1);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, bomb);
    assert!(matches!(errors[0].1, ExecutionError::TypeMismatch { .. }));
    // Mutations before the failure stay; later statements never ran.
    assert_eq!(harness.number(bomb, "ticks"), Some(1.0));
    assert_eq!(harness.number(clock, "ticks"), Some(1.0));
}

#[test]
fn test_scripted_method_receives_agent_and_args() {
    let mut harness = TestHarness::new();
    // Stack on entry: [agent, value]. Store the value, leave the agent.
    harness.register_feature(
        ScriptedFeature::new("Health")
            .simple_prop("hp", PropType::Number, 10.0)
            .method(
                "setHp",
                &["value:number"],
                OpProgram::from_ops(vec![Opcode::PopAgentPropValue(Path::feature_prop("Health", "hp"))]),
            )
            .unwrap()
            .build(),
    );
    harness.load("# BLUEPRINT Knight\nuseFeature Health\n# PROGRAM UPDATE\nfeatCall Health setHp 42\n");
    let knight = harness.spawn("Knight");
    let outcome = harness.run(knight, ProgramKind::Update).unwrap();
    assert!(outcome.stack.is_empty());
    assert_eq!(harness.number(knight, "Health.hp"), Some(42.0));
}

#[test]
fn test_call_depth_limit() {
    let mut harness = TestHarness::with_config(gemscript_engine::EngineConfig {
        max_call_depth: 2,
        ..Default::default()
    });
    // A method that calls itself through the scope stack.
    harness.register_feature(
        ScriptedFeature::new("Loop")
            .method(
                "again",
                &[],
                OpProgram::from_ops(vec![
                    Opcode::AgentFeatureToScope("Loop".to_string()),
                    Opcode::InvokeScoped {
                        method: "again".to_string(),
                        args: vec![],
                        with_agent: true,
                    },
                ]),
            )
            .unwrap()
            .build(),
    );
    harness.load("# BLUEPRINT L\nuseFeature Loop\n# PROGRAM UPDATE\nfeatCall Loop again\n");
    let agent = harness.spawn("L");
    assert_eq!(
        harness.run(agent, ProgramKind::Update),
        Err(ExecutionError::CallDepthExceeded { limit: 2 })
    );
}

#[test]
fn test_validate_script_reports_without_registering() {
    let harness = TestHarness::new();
    let script = parse_script("# BLUEPRINT Draft\naddProp x Number 0\nprop x fly\nsetProp y 1\n").unwrap();
    let diagnostics = harness.engine().validate_script(&script).unwrap();
    let codes: Vec<_> = diagnostics.iter().map(|d| d.error.code).collect();
    assert_eq!(codes, vec![SymbolErrorCode::NoExist, SymbolErrorCode::NoScope]);
    assert!(harness.engine().get_blueprint("Draft").is_none());
}

#[test]
fn test_snapshot_json() {
    let mut harness = TestHarness::from_source(FISH);
    let fish = harness.spawn("Fish");
    let json = serde_json::to_value(harness.agent(fish).snapshot()).unwrap();
    assert_eq!(json["props"]["energy"], 10.0);
    assert_eq!(json["props"]["Movement.movementType"], "static");
}

proptest! {
    #[test]
    fn prop_repeat_accumulates(n in -1000i32..1000, k in 0u32..8) {
        let source = format!(
            "# BLUEPRINT Acc\naddProp x Number 0\n# PROGRAM UPDATE\nrepeat {} [[\n  prop x add {}\n]]\n",
            k, n
        );
        let mut harness = TestHarness::from_source(&source);
        let agent = harness.spawn("Acc");
        harness.run(agent, ProgramKind::Update).unwrap();
        prop_assert_eq!(harness.number(agent, "x"), Some(f64::from(n) * f64::from(k)));
    }
}
