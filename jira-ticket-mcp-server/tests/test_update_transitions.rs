//! Two-phase updates: workflow transition first, then the field write

mod common;

use common::{mock_config, mock_service, transitions_response};
use jira_ticket_mcp_server::config::JiraConfig;
use jira_ticket_mcp_server::field_mapper::{SchemaVariant, TicketPatch};
use jira_ticket_mcp_server::service::cancellation_pair;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_transitions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .and(query_param("expand", "transitions.fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transitions_response()))
        .mount(server)
        .await;
}

fn summary_patch() -> TicketPatch {
    TicketPatch {
        summary: Some("Renamed".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_transition_precedes_field_update() {
    let server = MockServer::start().await;
    mount_transitions(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .and(body_json(json!({ "transition": { "id": "11" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .and(body_json(json!({ "fields": { "summary": "Renamed" } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &summary_patch(), Some("in progress"))
        .await
        .unwrap();

    let value = result.to_value();
    assert_eq!(value["isIssueUpdated"], true);
    assert_eq!(value["response"], "Successfully updated");
    assert_eq!(value["transition"]["applied"]["id"], "11");
    assert!(value.get("warnings").is_none());

    let order: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r.method.as_str(), r.url.path()))
        .collect();
    assert_eq!(
        order,
        vec![
            "GET /rest/api/2/issue/FCA-1/transitions",
            "POST /rest/api/2/issue/FCA-1/transitions",
            "PUT /rest/api/2/issue/FCA-1",
        ]
    );
}

#[tokio::test]
async fn test_resolution_attached_when_required() {
    let server = MockServer::start().await;
    mount_transitions(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .and(body_json(json!({
            "transition": { "id": "31" },
            "fields": { "resolution": { "name": "Done" } }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &TicketPatch::default(), Some("CLOSED"))
        .await
        .unwrap();

    assert!(result.is_success());
}

#[tokio::test]
async fn test_unknown_status_updates_fields_and_warns() {
    let server = MockServer::start().await;
    mount_transitions(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &summary_patch(), Some("Archived"))
        .await
        .unwrap();

    let value = result.to_value();
    assert_eq!(value["isIssueUpdated"], true);
    assert_eq!(value["transition"]["applied"], serde_json::Value::Null);
    assert_eq!(
        value["transition"]["availableStatuses"],
        json!(["In Progress", "Closed"])
    );
    assert!(value["warnings"][0]
        .as_str()
        .unwrap()
        .contains("'Archived'"));
}

#[tokio::test]
async fn test_rejected_transition_skips_field_update() {
    let server = MockServer::start().await;
    mount_transitions(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"errors":{"resolution":"Resolution is required."}}"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &summary_patch(), Some("Closed"))
        .await
        .unwrap();

    let value = result.to_value();
    assert_eq!(value["isIssueUpdated"], false);
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("Resolution is required."));
    assert_eq!(value["transition"]["state"], "failed");
    assert_eq!(value["transition"]["failedDuring"], "applying_transition");
}

#[tokio::test]
async fn test_field_update_error_is_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &summary_patch(), None)
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(result.error().unwrap().starts_with("HTTP error occurred: 403 Forbidden"));
}

#[tokio::test]
async fn test_clearing_assignee_sends_null() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .and(body_json(json!({ "fields": { "assignee": null } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let patch = TicketPatch {
        assignee: Some(String::new()),
        ..Default::default()
    };
    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &patch, None)
        .await
        .unwrap();

    assert!(result.is_success());
}

#[tokio::test]
async fn test_current_schema_assigns_by_account_id() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .and(body_json(json!({ "fields": { "assignee": { "accountId": "557058:abc" } } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = JiraConfig {
        schema_variant: SchemaVariant::Current,
        ..mock_config(&server)
    };
    let patch = TicketPatch {
        assignee: Some("557058:abc".to_string()),
        ..Default::default()
    };
    let result = mock_service(config)
        .update_ticket("FCA-1", &patch, None)
        .await
        .unwrap();

    assert!(result.is_success());
}

#[tokio::test]
async fn test_numeric_transition_ids_are_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transitions": [
                { "id": 11, "name": "Start Progress", "to": { "name": "In Progress" }, "fields": null },
                { "id": 31, "to": "Closed", "fields": { "resolution": { "required": true } } }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .and(body_json(json!({
            "transition": { "id": "31" },
            "fields": { "resolution": { "name": "Done" } }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = mock_service(mock_config(&server))
        .update_ticket("FCA-1", &TicketPatch::default(), Some("Closed"))
        .await
        .unwrap();

    let value = result.to_value();
    assert_eq!(value["isIssueUpdated"], true);
    assert_eq!(value["transition"]["applied"]["id"], "31");
    assert_eq!(value["transition"]["state"], "done");
}

#[tokio::test]
async fn test_cancellation_stops_multi_call_update() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/FCA-1/transitions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(transitions_response())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/rest/api/2/issue/FCA-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let config = JiraConfig {
        request_timeout_seconds: 30,
        ..mock_config(&server)
    };
    let (trigger, handle) = cancellation_pair();
    let service = mock_service(config).with_cancellation(handle);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let result = service
        .update_ticket("FCA-1", &summary_patch(), Some("Closed"))
        .await
        .unwrap();
    canceller.await.unwrap();

    assert!(!result.is_success());
    assert_eq!(result.error_category(), Some("cancelled"));
}
