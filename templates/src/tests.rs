//! End-to-end lifecycle tests: fit, register, reload, run, remove.

use std::path::Path;
use std::sync::Arc;

use modelmanager_orchestration::{MemoryEngine, Orchestrator, Table};
use modelmanager_registry::{
    store, ModelManager, RegistryError, Step, StepConfig, TemplateMode, TemplateSet,
};

use crate::binary_logit::BinaryLogitStep;
use crate::regression::{self, OLSRegressionStep, OutTransform};
use crate::register_templates;

fn templates() -> Arc<TemplateSet> {
    let mut set = TemplateSet::new();
    register_templates(&mut set);
    Arc::new(set)
}

/// Four homes with an exact price = 1 + 2 * sqft relationship.
fn engine_with_homes() -> Arc<MemoryEngine> {
    let engine = Arc::new(MemoryEngine::new());
    engine
        .put_table(
            "homes",
            Table::new()
                .with("sqft", vec![0.0, 1.0, 2.0, 3.0])
                .with("price", vec![1.0, 3.0, 5.0, 7.0]),
        )
        .unwrap();
    engine
}

fn manager(dir: &Path, engine: Arc<MemoryEngine>) -> ModelManager {
    ModelManager::initialize(
        Some(dir.to_path_buf()),
        TemplateMode::Lenient,
        templates(),
        engine as Arc<dyn Orchestrator>,
    )
    .unwrap()
}

fn fitted_ols(engine: &dyn Orchestrator, name: &str) -> OLSRegressionStep {
    let mut step = OLSRegressionStep::new();
    step.set_name(name);
    step.table = Some("homes".into());
    step.model_expression = Some("price ~ sqft".into());
    step.fit(engine).unwrap();
    step
}

#[test]
fn test_fitted_step_round_trips_through_config() {
    let engine = engine_with_homes();
    let step = fitted_ols(engine.as_ref(), "price-prediction");

    let config = step.to_config().unwrap();
    let rebuilt = regression::build(&config).unwrap();
    assert_eq!(rebuilt.to_config().unwrap(), config);
}

#[test]
fn test_register_then_get_step_preserves_state() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    let step = fitted_ols(engine.as_ref(), "price-prediction");
    m.register(&step).unwrap();

    let loaded = m.get_step("price-prediction").unwrap();
    assert_eq!(loaded.to_config().unwrap(), step.to_config().unwrap());
}

#[test]
fn test_fresh_manager_reloads_and_runs_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let engine = engine_with_homes();
        let mut m = manager(tmp.path(), Arc::clone(&engine));
        let mut step = fitted_ols(engine.as_ref(), "price-prediction");
        step.out_column = Some("predicted".into());
        m.register(&step).unwrap();
    }

    // A new process over the same directory.
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));
    m.run_step("price-prediction").unwrap();

    let homes = engine.get_table("homes").unwrap();
    let predicted = homes.column("predicted").unwrap();
    for (p, expected) in predicted.iter().zip([1.0, 3.0, 5.0, 7.0]) {
        assert!((p - expected).abs() < 1e-8);
    }
}

#[test]
fn test_supplemental_file_lifecycle() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    let step = fitted_ols(engine.as_ref(), "price-prediction");
    m.register(&step).unwrap();

    let config_file = tmp.path().join("price-prediction.yaml");
    let model_file = tmp.path().join("price-prediction-fitted-model.rmp");
    assert!(config_file.is_file());
    assert!(model_file.is_file());

    // The YAML carries only the reference, never the bytes.
    let text = std::fs::read_to_string(&config_file).unwrap();
    assert!(text.contains("fitted-model"));
    assert!(!text.contains("content:"));

    m.remove_step("price-prediction").unwrap();
    assert!(!config_file.exists());
    assert!(!model_file.exists());
}

#[test]
fn test_reregister_without_fit_drops_stale_model_file() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    m.register(&fitted_ols(engine.as_ref(), "price-prediction"))
        .unwrap();
    let model_file = tmp.path().join("price-prediction-fitted-model.rmp");
    assert!(model_file.is_file());

    // Overwriting with an unfitted step leaves no supplemental reference,
    // so the old artifact file must go.
    let mut unfitted = OLSRegressionStep::new();
    unfitted.set_name("price-prediction");
    unfitted.table = Some("homes".into());
    unfitted.model_expression = Some("price ~ sqft".into());
    m.register(&unfitted).unwrap();

    assert!(!model_file.exists());
    assert!(tmp.path().join("price-prediction.yaml").is_file());
    assert!(m.get_step("price-prediction").unwrap().to_config().unwrap().supplemental.is_empty());
}

#[test]
fn test_rename_keeps_both_steps() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    m.register(&fitted_ols(engine.as_ref(), "price-prediction"))
        .unwrap();

    let listed = m.list_steps();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "price-prediction");
    assert_eq!(listed[0].template, "OLSRegressionStep");
    assert!(listed[0].tags.is_empty());

    let mut renamed = m.get_step("price-prediction").unwrap();
    renamed.set_name("better-price-prediction");
    m.register(renamed.as_ref()).unwrap();

    assert!(tmp.path().join("price-prediction.yaml").is_file());
    assert!(tmp.path().join("better-price-prediction.yaml").is_file());
    let names: Vec<String> = m.list_steps().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["better-price-prediction", "price-prediction"]);

    m.remove_step("better-price-prediction").unwrap();
    assert!(!tmp.path().join("better-price-prediction.yaml").exists());
    assert!(tmp.path().join("price-prediction.yaml").is_file());
    let names: Vec<String> = m.list_steps().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["price-prediction"]);
}

#[test]
fn test_list_steps_sorted_without_duplicates() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    for name in ["b", "a", "c"] {
        let mut step = OLSRegressionStep::new();
        step.set_name(name);
        m.register(&step).unwrap();
    }
    // Re-registering an existing name overwrites, it does not duplicate.
    let mut again = OLSRegressionStep::new();
    again.set_name("b");
    m.register(&again).unwrap();

    let names: Vec<String> = m.list_steps().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_remove_is_idempotent_and_lookup_fails_after() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    m.register(&fitted_ols(engine.as_ref(), "price-prediction"))
        .unwrap();
    m.remove_step("price-prediction").unwrap();
    assert!(matches!(
        m.get_step("price-prediction"),
        Err(RegistryError::StepNotFound(_))
    ));
    m.remove_step("price-prediction").unwrap();
}

#[test]
fn test_initialize_skips_unknown_template_file() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    {
        let mut m = manager(tmp.path(), Arc::clone(&engine));
        m.register(&fitted_ols(engine.as_ref(), "good")).unwrap();
    }
    store::write_config(tmp.path(), &StepConfig::new("mystery", "SomeOtherTemplate")).unwrap();

    let m = manager(tmp.path(), engine_with_homes());
    let names: Vec<String> = m.list_steps().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["good"]);
}

#[test]
fn test_autorun_runs_on_register() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine_with_homes();
    let mut m = manager(tmp.path(), Arc::clone(&engine));

    let mut step = fitted_ols(engine.as_ref(), "price-prediction");
    step.out_column = Some("predicted".into());
    step.autorun = true;
    m.register(&step).unwrap();

    let homes = engine.get_table("homes").unwrap();
    assert!(homes.has_column("predicted"));
}

#[test]
fn test_autorun_runs_on_initialize() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let engine = engine_with_homes();
        let mut m = manager(tmp.path(), Arc::clone(&engine));
        let mut step = fitted_ols(engine.as_ref(), "price-prediction");
        step.out_column = Some("predicted".into());
        step.autorun = true;
        m.register(&step).unwrap();
    }

    // Loading the stored step runs it without an explicit run_step call.
    let engine = engine_with_homes();
    let _m = manager(tmp.path(), Arc::clone(&engine));
    let homes = engine.get_table("homes").unwrap();
    assert!(homes.has_column("predicted"));
}

#[test]
fn test_out_transform_exp() {
    let engine = Arc::new(MemoryEngine::new());
    engine
        .put_table(
            "homes",
            Table::new()
                .with("sqft", vec![0.0, 1.0, 2.0, 3.0])
                .with("log_price", vec![0.0, 0.0, 0.0, 0.0]),
        )
        .unwrap();

    let mut step = OLSRegressionStep::new();
    step.set_name("exp-prediction");
    step.table = Some("homes".into());
    step.model_expression = Some("log_price ~ sqft".into());
    step.out_column = Some("price".into());
    step.out_transform = OutTransform::Exp;
    step.fit(engine.as_ref()).unwrap();
    step.run(engine.as_ref()).unwrap();

    let homes = engine.get_table("homes").unwrap();
    for &p in homes.column("price").unwrap() {
        assert!((p - 1.0).abs() < 1e-8);
    }
}

fn engine_with_choices() -> Arc<MemoryEngine> {
    let xs = vec![
        -3.0, -2.5, -2.0, -1.5, -1.0, -0.5, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0,
    ];
    let ys = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0];
    let engine = Arc::new(MemoryEngine::new());
    engine
        .put_table(
            "households",
            Table::new().with("income", xs).with("chose", ys),
        )
        .unwrap();
    engine
}

#[test]
fn test_logit_simulation_writes_binary_outcomes() {
    let engine = engine_with_choices();
    let mut step = BinaryLogitStep::new();
    step.set_name("choice-model");
    step.table = Some("households".into());
    step.model_expression = Some("chose ~ income".into());
    step.out_column = Some("simulated".into());
    step.fit(engine.as_ref()).unwrap();
    step.run(engine.as_ref()).unwrap();

    let table = engine.get_table("households").unwrap();
    let simulated = table.column("simulated").unwrap();
    assert_eq!(simulated.len(), 12);
    assert!(simulated.iter().all(|&v| v == 0.0 || v == 1.0));
}

#[test]
fn test_logit_none_outcome_leaves_rows_unchanged() {
    let engine = engine_with_choices();
    engine
        .update_column("households", "simulated", vec![5.0; 12])
        .unwrap();

    let mut step = BinaryLogitStep::new();
    step.set_name("choice-model");
    step.table = Some("households".into());
    step.model_expression = Some("chose ~ income".into());
    step.out_column = Some("simulated".into());
    step.out_value_false = None;
    step.fit(engine.as_ref()).unwrap();
    step.run(engine.as_ref()).unwrap();

    let table = engine.get_table("households").unwrap();
    let simulated = table.column("simulated").unwrap();
    assert!(simulated.iter().all(|&v| v == 1.0 || v == 5.0));
}

#[test]
fn test_logit_round_trips_through_config() {
    let engine = engine_with_choices();
    let mut step = BinaryLogitStep::new();
    step.set_name("choice-model");
    step.table = Some("households".into());
    step.model_expression = Some("chose ~ income".into());
    step.fit(engine.as_ref()).unwrap();

    let config = step.to_config().unwrap();
    let rebuilt = crate::binary_logit::build(&config).unwrap();
    assert_eq!(rebuilt.to_config().unwrap(), config);
}

#[test]
fn test_config_yaml_is_one_flat_mapping() {
    let engine = engine_with_homes();
    let step = fitted_ols(engine.as_ref(), "price-prediction");
    let text = serde_yaml::to_string(&step.to_config().unwrap()).unwrap();
    assert!(text.contains("template: OLSRegressionStep"));
    assert!(text.contains("model_expression: price ~ sqft"));
    assert!(text.contains("out_transform: none"));
    assert!(text.contains("fitted_parameters:"));
}

#[test]
fn test_fit_generates_name_when_unset() {
    let engine = engine_with_homes();
    let mut step = OLSRegressionStep::new();
    step.table = Some("homes".into());
    step.model_expression = Some("price ~ sqft".into());
    step.fit(engine.as_ref()).unwrap();
    assert!(step.name().starts_with("OLSRegressionStep-"));
}
