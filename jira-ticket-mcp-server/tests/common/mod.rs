/// Common utilities for JIRA ticket server integration tests
use jira_ticket_mcp_server::config::{AuthScheme, JiraConfig};
use jira_ticket_mcp_server::service::TicketService;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

/// A complete configuration pointing at `server`
#[allow(dead_code)]
pub fn mock_config(server: &MockServer) -> JiraConfig {
    JiraConfig {
        base_url: format!("{}/", server.uri()),
        user_email: "dev@example.com".to_string(),
        user_id: "jdoe".to_string(),
        api_token: "secret".to_string(),
        auth_scheme: AuthScheme::Bearer,
        request_timeout_seconds: 5,
        ..Default::default()
    }
}

/// A service using the HTTP transport against `server`
#[allow(dead_code)]
pub fn mock_service(config: JiraConfig) -> TicketService {
    TicketService::new(Arc::new(config)).expect("Failed to build HTTP transport")
}

/// Transition list as returned with `expand=transitions.fields`
#[allow(dead_code)]
pub fn transitions_response() -> Value {
    json!({
        "expand": "transitions",
        "transitions": [
            {
                "id": "11",
                "name": "Start Progress",
                "to": { "id": "3", "name": "In Progress" },
                "fields": {}
            },
            {
                "id": "31",
                "name": "Close Issue",
                "to": { "id": "6", "name": "Closed" },
                "fields": {
                    "resolution": { "required": true, "name": "Resolution" }
                }
            }
        ]
    })
}
