//! End-to-end: Parse → Validate → Lower → Plan validate → Codegen, and
//! execution of the lowered plan against backends.

mod helpers;

use compiler::codegen::{self, CodegenOptions};
use compiler::ir::PipelinePlan;
use compiler::parse;
use compiler::runtime::{
    BackendError, Executor, LlmSettings, MockBackend, MockCall, PipelineState, RuntimeError,
    StepBackend,
};
use serde_json::{Map, Value, json};

fn sample_plan() -> PipelinePlan {
    let doc = parse::parse_yaml(helpers::SAMPLE).unwrap();
    compiler::compile_document(&doc).expect("sample compiles")
}

fn inputs(value: Value) -> Map<String, Value> {
    serde_json::from_value(value).unwrap()
}

fn run_sample(seed: &str) -> PipelineState {
    let plan = sample_plan();
    Executor::new(&plan, MockBackend::new(seed))
        .run(inputs(json!({"workorder_description": "pump leaking"})))
        .expect("sample runs")
}

#[test]
fn file_to_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("workorder_similarity_search.yaml");
    std::fs::write(&source, helpers::SAMPLE).unwrap();

    let doc = parse::parse_file(&source).unwrap();
    let plan = compiler::compile_document(&doc).unwrap();
    let bundle = codegen::codegen(&doc, &plan, &CodegenOptions::now());

    let out = tmp.path().join("output");
    let written = bundle.write_to(&out, false).unwrap();
    assert_eq!(written.len(), 3);

    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["input_hash"], codegen::fingerprint(&doc));
}

#[test]
fn invalid_skills_never_reach_codegen() {
    for (fixture, code) in [
        (helpers::DUPLICATE_IDS, "S001"),
        (helpers::GHOST_EDGE, "S002"),
        (helpers::CYCLE, "S003"),
        (helpers::UNDEFINED_VAR, "V001"),
        (helpers::MISSING_CONFIG, "C001"),
        (helpers::USER_APPROVAL, "L001"),
    ] {
        let doc = parse::parse_yaml(fixture).unwrap();
        let errors = compiler::compile_document(&doc).unwrap_err();
        assert_eq!(errors[0].code, code);
    }
}

#[test]
fn sample_run_binds_every_name() {
    let state = run_sample("seed");
    let names: Vec<&str> = state.names().collect();
    assert_eq!(
        names,
        vec![
            "display_results",
            "embedding",
            "enriched_results",
            "limit",
            "similar_workorders",
            "summarized_findings",
            "workorder_description",
        ]
    );
    assert_eq!(state.get("limit"), Some(&json!(10)));
    assert_eq!(state.get("embedding").unwrap()["status"], 200);
    assert_eq!(state.get("display_results").unwrap()["rendered"], "card");
    let summary = state.get("summarized_findings").unwrap().as_str().unwrap();
    assert!(summary.starts_with("[mock claude-sonnet-4-5 "));

    let values = state.into_inner();
    assert_eq!(values["workorder_description"], "pump leaking");
}

#[test]
fn backend_sees_resolved_values() {
    let plan = sample_plan();
    let mut backend = MockBackend::new("seed");
    let state = Executor::new(&plan, &mut backend)
        .run(inputs(json!({"workorder_description": "pump leaking", "limit": 3})))
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 5);

    match &calls[0] {
        MockCall::Api { path, params } => {
            assert_eq!(path, "/api/embeddings/generate");
            assert_eq!(params["text"], "pump leaking");
        }
        other => panic!("Expected Api call, got {:?}", other),
    }

    // Structured: the embedding arrives as the stored object, not text.
    match &calls[1] {
        MockCall::Function { name, params } => {
            assert_eq!(name, "VectorSearchWorkOrders");
            assert_eq!(params["limit"], 3);
            assert_eq!(&params["embedding"], state.get("embedding").unwrap());
        }
        other => panic!("Expected Function call, got {:?}", other),
    }

    // String-safe: enriched results are embedded as escaped compact JSON.
    match &calls[3] {
        MockCall::Llm { prompt, settings } => {
            assert!(prompt.contains(r#"for: "pump leaking""#));
            assert!(prompt.contains(r#"\"function\":\"MxFetchWorkOrderDetails\""#));
            assert_eq!(settings.temperature, Some(0.3));
        }
        other => panic!("Expected Llm call, got {:?}", other),
    }

    match &calls[4] {
        MockCall::Visualize { payload } => {
            let resolved = &payload["resolved_template"];
            assert_eq!(resolved["title"], "Similar Work Orders");
            assert_eq!(
                &resolved["sections"][0]["data"],
                state.get("summarized_findings").unwrap()
            );
            assert_eq!(
                resolved["sections"][1]["data"],
                state.get("enriched_results").unwrap().to_string()
            );
            assert_eq!(payload["template"]["sections"][1]["data"], "{{enriched_results}}");
        }
        other => panic!("Expected Visualize call, got {:?}", other),
    }
}

#[test]
fn runs_are_deterministic_per_seed() {
    assert_eq!(run_sample("alpha"), run_sample("alpha"));
    assert_ne!(run_sample("alpha"), run_sample("beta"));
}

#[test]
fn missing_required_input() {
    let plan = sample_plan();
    let err = Executor::new(&plan, MockBackend::new("seed"))
        .run(Map::new())
        .unwrap_err();
    assert!(matches!(
        &err,
        RuntimeError::MissingInput { name } if name == "workorder_description"
    ));
    assert_eq!(err.to_string(), "Missing required input: workorder_description");
}

/// Succeeds at everything except the model call.
struct OfflineLlm(MockBackend);

impl StepBackend for OfflineLlm {
    fn call_function(
        &mut self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, BackendError> {
        self.0.call_function(name, params)
    }

    fn call_api(&mut self, path: &str, params: &Map<String, Value>) -> Result<Value, BackendError> {
        self.0.call_api(path, params)
    }

    fn call_llm(&mut self, _prompt: &str, _settings: &LlmSettings) -> Result<Value, BackendError> {
        Err(BackendError::new("model unavailable"))
    }

    fn visualize(&mut self, payload: &Value) -> Result<Value, BackendError> {
        self.0.visualize(payload)
    }
}

#[test]
fn backend_failure_names_the_step() {
    let plan = sample_plan();
    let mut executor = Executor::new(&plan, OfflineLlm(MockBackend::new("seed")));
    let err = executor
        .run(inputs(json!({"workorder_description": "pump leaking"})))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Step 'summarize_findings': backend call failed: model unavailable"
    );
    // Later steps never ran.
    assert_eq!(executor.into_backend().0.calls().len(), 3);
}

const NESTED_PARAMS: &str = r#"
skill:
  metadata: {id: nested_params, name: Nested Params, description: Filters built from state, category: test}
  inputs:
    parameters:
      - {name: q, type: string}
  workflow:
    nodes:
      - id: lookup_assets
        type: function_call
        config:
          function_name: LookupAssets
          function_params:
            filter: {asset: "{{q}}", site: north}
            note: "Error on {{q}}"
    edges: []
"#;

#[test]
fn nested_params_reach_the_backend_resolved() {
    let doc = parse::parse_yaml(NESTED_PARAMS).unwrap();
    let plan = compiler::compile_document(&doc).expect("nested params compile");

    let mut backend = MockBackend::new("seed");
    Executor::new(&plan, &mut backend)
        .run(inputs(json!({"q": "pump \"A\"\nline2"})))
        .unwrap();

    match &backend.calls()[0] {
        MockCall::Function { name, params } => {
            assert_eq!(name, "LookupAssets");
            assert_eq!(
                params["filter"],
                json!({"asset": "pump \"A\"\nline2", "site": "north"})
            );
            assert_eq!(params["note"], "Error on pump \"A\"\nline2");
        }
        other => panic!("Expected Function call, got {:?}", other),
    }
}
