//! End-to-end tests for the widgets API: gateway events are parsed and
//! executed exactly as the deployed function would.

use serde_json::{json, Value};

use handlerkit::{HttpResponse, ResponseContext, Runner, RunnerConfig};
use handlerkit_lambda::parse_invocation;
use handlerkit_lambda::test_utils::{hot_trigger_event, EventBuilder};
use handlerkit_sample::build_runner;
use handlerkit_sample::store::WidgetStore;

fn runner() -> Runner {
    build_runner(RunnerConfig::default()).expect("valid configuration")
}

async fn call(runner: &Runner, payload: Value) -> HttpResponse {
    let invocation = parse_invocation(payload, "test-ctx").expect("parseable event");
    runner.execute(invocation).await.expect("no config error")
}

#[tokio::test]
async fn cold_start_seeds_the_inventory() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("GET", "/widgets").build()).await;

    assert_eq!(response.status_code, 200);
    let body = response.body_json().unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["widgets"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_honours_the_limit_query() {
    let runner = runner();
    let event = EventBuilder::new("GET", "/widgets").query("limit", "1").build();
    let response = call(&runner, event).await;

    let body = response.body_json().unwrap();
    assert_eq!(body["data"]["widgets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn created_widget_can_be_fetched_back() {
    let runner = runner();
    let create = EventBuilder::new("POST", "/widgets")
        .body(json!({ "name": "gizmo", "quantity": 5 }))
        .build();
    let response = call(&runner, create).await;

    assert_eq!(response.status_code, 201);
    let body = response.body_json().unwrap();
    assert_eq!(body["data"]["name"], "gizmo");
    assert_eq!(body["data"]["quantity"], 5);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let fetch = EventBuilder::new("GET", &format!("/widget/{id}")).build();
    let response = call(&runner, fetch).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_json().unwrap()["data"]["id"], id.as_str());
}

#[tokio::test]
async fn second_path_parameter_projects_a_field() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("GET", "/widget/w-1/name").build()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_json().unwrap()["data"], "sprocket");
}

#[tokio::test]
async fn unknown_projection_field_is_a_400_fail() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("GET", "/widget/w-1/color").build()).await;

    assert_eq!(response.status_code, 400);
    let body = response.body_json().unwrap();
    assert_eq!(body["status"], "fail");
    assert!(body["data"]["description"]
        .as_str()
        .unwrap()
        .contains("Unknown widget field"));
}

#[tokio::test]
async fn missing_widget_is_a_404_fail() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("GET", "/widget/nope").build()).await;

    assert_eq!(response.status_code, 404);
    let body = response.body_json().unwrap();
    assert_eq!(body["status"], "fail");
    assert!(body["data"]["description"]
        .as_str()
        .unwrap()
        .contains("No widget"));
}

#[tokio::test]
async fn deleted_widget_stays_gone() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("DELETE", "/widget/w-2").build()).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_json().unwrap()["data"]["id"], "w-2");

    let response = call(&runner, EventBuilder::new("GET", "/widget/w-2").build()).await;
    assert_eq!(response.status_code, 404);
}

#[tokio::test]
async fn create_without_a_name_is_rejected_with_the_configured_message() {
    let runner = runner();
    let event = EventBuilder::new("POST", "/widgets")
        .body(json!({ "quantity": 2 }))
        .build();
    let response = call(&runner, event).await;

    assert_eq!(response.status_code, 400);
    let body = response.body_json().unwrap();
    assert_eq!(body["status"], "invalid");
    assert_eq!(body["data"]["messages"], json!(["The 'name' field is required"]));
    assert_eq!(
        body["data"]["schema"]["body"],
        json!(["body.name: string", "body.quantity: number"])
    );
}

#[tokio::test]
async fn create_without_a_body_reports_no_input_first() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("POST", "/widgets").build()).await;

    assert_eq!(response.status_code, 400);
    let body = response.body_json().unwrap();
    assert_eq!(
        body["data"]["messages"][0],
        "No input was provided for `body`."
    );
}

#[tokio::test]
async fn maintenance_header_short_circuits_before_routing() {
    let runner = runner();
    let event = EventBuilder::new("GET", "/widgets")
        .header("X-Maintenance", "1")
        .build();
    let response = call(&runner, event).await;

    assert_eq!(response.status_code, 503);
    assert_eq!(response.body, "Service temporarily offline");
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("text/plain")
    );
}

#[tokio::test]
async fn hot_trigger_warms_the_inventory() {
    let runner = runner();
    let response = call(&runner, hot_trigger_event()).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body_json().unwrap()["data"], Value::Null);
    let store = WidgetStore::new(runner.cache().clone());
    assert_eq!(store.len().unwrap(), 2);
}

#[tokio::test]
async fn unknown_route_is_a_404_fail() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("GET", "/nope").build()).await;

    assert_eq!(response.status_code, 404);
    let body = response.body_json().unwrap();
    assert_eq!(body["status"], "fail");
    assert!(body["data"]["description"]
        .as_str()
        .unwrap()
        .contains("not be found"));
}

#[tokio::test]
async fn wrong_verb_advertises_siblings_through_allow() {
    let runner = runner();
    let response = call(&runner, EventBuilder::new("PUT", "/widgets").build()).await;

    assert_eq!(response.status_code, 404);
    assert_eq!(
        response.headers.get("allow").map(String::as_str),
        Some("GET, POST")
    );
}

#[tokio::test]
async fn ambient_service_header_is_attached_to_every_response() {
    let config = RunnerConfig {
        response_context: ResponseContext {
            headers: std::collections::HashMap::from([(
                "x-service".to_string(),
                "widgets-sample".to_string(),
            )]),
            cookies: Vec::new(),
        },
        ..RunnerConfig::default()
    };
    let runner = build_runner(config).unwrap();

    let response = call(&runner, EventBuilder::new("GET", "/").build()).await;
    assert_eq!(
        response.headers.get("x-service").map(String::as_str),
        Some("widgets-sample")
    );

    let response = call(&runner, EventBuilder::new("GET", "/nope").build()).await;
    assert_eq!(
        response.headers.get("x-service").map(String::as_str),
        Some("widgets-sample")
    );
}
