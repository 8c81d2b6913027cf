//! Executor behaviour against a scripted capability provider
//!
//! Covers ordering, abort-on-failure, teardown and variable substitution.

mod common;

use common::{Call, Fault, ScriptedFactory};
use flowhand::core::ErrorKind;
use flowhand::runner::{self, WorkflowExecutor};
use flowhand::workflow::builtin::{product_listing_schema, purchase_flow};
use flowhand::workflow::{ExtractSchema, SchemaField, Workflow, WorkflowStep};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn products_schema() -> ExtractSchema {
    ExtractSchema::new().field(
        "products",
        SchemaField::array(SchemaField::object([
            ("name", SchemaField::string().optional()),
            ("price", SchemaField::number().optional()),
        ])),
    )
}

#[tokio::test]
async fn test_single_navigate_succeeds() {
    let factory = ScriptedFactory::new();
    let workflow = Workflow::new("a").step(WorkflowStep::navigate("https://x/"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.steps_completed, 1);
    assert_eq!(factory.calls(), vec![Call::Navigate("https://x/".to_string())]);
    assert_eq!(factory.opens(), 1);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_failing_act_aborts_and_closes() {
    let factory = ScriptedFactory::new().fail_at(1, Fault::Action("element not found".into()));
    let workflow = Workflow::new("b")
        .step(WorkflowStep::navigate("https://x/"))
        .step(WorkflowStep::act("click the missing button"))
        .step(WorkflowStep::act("click the next button"))
        .step(WorkflowStep::navigate("https://x/never"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert!(!result.success);
    let error = result.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Action);
    assert_eq!(error.step, Some(1));
    assert!(error.message.contains("element not found"));
    assert_eq!(result.steps_completed, 1);
    assert_eq!(factory.calls().len(), 2);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_extraction_stored_by_step_index() {
    let factory = ScriptedFactory::new().extract_at(
        3,
        json!({
            "products": [
                {"name": "OLED White", "price": 349.99},
                {"name": "OLED Neon", "price": "$329.00"},
                {"name": "OLED Mario Red"}
            ]
        }),
    );
    let workflow = Workflow::new("c")
        .step(WorkflowStep::navigate("https://shop.example/"))
        .step(WorkflowStep::act("type OLED into the search box"))
        .step(WorkflowStep::act("click the search button"))
        .step(WorkflowStep::extract("extract the products", products_schema()));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert!(result.success);
    let extraction = result.extraction(3).expect("extraction at step index 3");
    let products = extraction.records("products").unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[1]["price"], json!(329.0));
    assert!(result.extraction(0).is_none());
}

#[tokio::test]
async fn test_empty_workflow_succeeds_without_dispatch() {
    let factory = ScriptedFactory::new();

    let result = WorkflowExecutor::new(factory.shared())
        .run(&Workflow::new("empty"))
        .await;

    assert!(result.success);
    assert_eq!(result.steps_completed, 0);
    assert!(factory.calls().is_empty());
    assert_eq!(factory.closes(), factory.opens());
}

#[tokio::test]
async fn test_undefined_variable_fails_before_dispatch() {
    let factory = ScriptedFactory::new();
    let workflow = Workflow::new("vars")
        .step(WorkflowStep::navigate("https://x/"))
        .step(WorkflowStep::act("type {{query}} into the search box"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Configuration));
    assert!(result.error.as_ref().unwrap().step.is_none());
    assert!(factory.calls().is_empty());
    assert_eq!(factory.opens(), 0);
}

#[tokio::test]
async fn test_malformed_schema_is_configuration_error() {
    let factory = ScriptedFactory::new();
    let workflow =
        Workflow::new("schema").step(WorkflowStep::extract("extract it", ExtractSchema::new()));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Configuration));
    assert_eq!(factory.opens(), 0);
}

#[tokio::test]
async fn test_variables_substituted_verbatim() {
    let factory = ScriptedFactory::new();
    let workflow = Workflow::new("vars")
        .with_variable("query", "Nintendo Switch – OLED \"White\"")
        .with_variable("host", "shop.example")
        .step(WorkflowStep::navigate("https://{{host}}/"))
        .step(WorkflowStep::act("type {{query}} into the search box"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert!(result.success);
    assert_eq!(
        factory.calls(),
        vec![
            Call::Navigate("https://shop.example/".to_string()),
            Call::Act("type Nintendo Switch – OLED \"White\" into the search box".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_teardown_failure_does_not_mask_success() {
    let factory = ScriptedFactory::new().fail_close();
    let workflow = Workflow::new("teardown").step(WorkflowStep::navigate("https://x/"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert!(result.success);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_teardown_failure_keeps_primary_error() {
    let factory = ScriptedFactory::new()
        .fail_close()
        .fail_at(0, Fault::Navigation("unreachable".into()));
    let workflow = Workflow::new("teardown").step(WorkflowStep::navigate("https://x/"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Navigation));
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_open_failure_reports_session_error() {
    let factory = ScriptedFactory::new().fail_open();
    let workflow = Workflow::new("open").step(WorkflowStep::navigate("https://x/"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Session));
    assert!(factory.calls().is_empty());
    assert_eq!(runner::exit_code(&result), 1);
}

#[tokio::test]
async fn test_untyped_provider_error_takes_step_kind() {
    let factory = ScriptedFactory::new().fail_at(1, Fault::Untyped("exit status 2".into()));
    let workflow = Workflow::new("kinds")
        .step(WorkflowStep::navigate("https://x/"))
        .step(WorkflowStep::extract("extract it", products_schema()));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Extraction));
    assert_eq!(result.error.unwrap().step, Some(1));
}

#[tokio::test]
async fn test_session_error_inside_step_takes_step_kind() {
    let factory = ScriptedFactory::new().fail_at(1, Fault::MissingBrowser);
    let workflow = Workflow::new("kinds")
        .step(WorkflowStep::navigate("https://x/"))
        .step(WorkflowStep::act("click the search button"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Action));
    assert_eq!(result.error.as_ref().unwrap().step, Some(1));
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_extraction_schema_mismatch_fails_step() {
    let factory = ScriptedFactory::new().extract_at(0, json!({"products": {"name": "x"}}));
    let workflow = Workflow::new("mismatch")
        .step(WorkflowStep::extract("extract it", products_schema()))
        .step(WorkflowStep::act("click next"));

    let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Extraction));
    assert_eq!(factory.calls().len(), 1);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_panicking_step_still_closes_session() {
    let factory = ScriptedFactory::new().fail_at(1, Fault::Panic);
    let workflow = Workflow::new("panic")
        .step(WorkflowStep::navigate("https://x/"))
        .step(WorkflowStep::act("explode"))
        .step(WorkflowStep::act("never runs"));
    let executor = WorkflowExecutor::new(factory.shared());

    let outcome = tokio::spawn(async move { executor.run(&workflow).await }).await;

    let join_error = assert_err!(outcome);
    assert!(join_error.is_panic());
    assert_eq!(factory.calls().len(), 2);
    assert_eq!(factory.closes(), 1);
}

#[tokio::test]
async fn test_purchase_flow_runs_all_eight_steps() {
    let factory = ScriptedFactory::new().extract_at(
        3,
        json!({"products": [{
            "name": "Nintendo Switch – OLED Model",
            "price": 349.99,
            "availability": "In Stock"
        }]}),
    );

    let result = runner::run_once(&purchase_flow(), factory.shared()).await;

    assert!(result.success);
    assert_eq!(result.steps_completed, 8);
    assert_eq!(runner::exit_code(&result), 0);
    assert_eq!(
        factory.calls()[1],
        Call::Act("type Nintendo Switch OLED console into the search box".to_string())
    );
    assert_eq!(
        factory.calls().last(),
        Some(&Call::Act("click the Proceed to checkout button".to_string()))
    );

    let products = result.extraction(3).unwrap().records("products").unwrap();
    assert_eq!(products[0]["availability"], "In Stock");
    let stored = result.extraction(3).unwrap();
    let reparsed = assert_ok!(product_listing_schema().coerce(stored.clone().into_value()));
    assert_eq!(&reparsed, stored);
}

#[tokio::test]
async fn test_every_successful_run_closes_once() {
    for len in 0..5 {
        let factory = ScriptedFactory::new();
        let mut workflow = Workflow::new("n");
        for i in 0..len {
            workflow = workflow.step(WorkflowStep::act(format!("click button {}", i)));
        }

        let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

        assert!(result.success);
        assert_eq!(factory.calls().len(), len);
        assert_eq!(factory.opens(), 1);
        assert_eq!(factory.closes(), 1);
    }
}

#[tokio::test]
async fn test_failure_at_any_index_stops_there() {
    for fail_at in 0..4 {
        let factory = ScriptedFactory::new().fail_at(fail_at, Fault::Action("nope".into()));
        let mut workflow = Workflow::new("n");
        for i in 0..4 {
            workflow = workflow.step(WorkflowStep::act(format!("click button {}", i)));
        }

        let result = WorkflowExecutor::new(factory.shared()).run(&workflow).await;

        assert!(!result.success);
        assert_eq!(result.error.as_ref().unwrap().step, Some(fail_at));
        assert_eq!(factory.calls().len(), fail_at + 1);
        assert_eq!(factory.closes(), 1);
    }
}
