//! Uniform result envelope for tracker operations
//!
//! Every operation reports a boolean success flag and either a payload or an
//! error string. The key names differ per operation, e.g. creation reports
//! `isIssueLogged`/`response` while search reports `success`/`issues`.

use crate::error::TrackerError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// The tracker operations and their envelope key names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateTicket,
    GetIssue,
    UpdateTicket,
    SearchIssues,
    GetComments,
    AddComment,
    GetProject,
    GetAllProjects,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateTicket => "create_ticket",
            Operation::GetIssue => "get_issue",
            Operation::UpdateTicket => "update_ticket",
            Operation::SearchIssues => "search_issues",
            Operation::GetComments => "get_comments",
            Operation::AddComment => "add_comment",
            Operation::GetProject => "get_project",
            Operation::GetAllProjects => "get_all_projects",
        }
    }

    /// Key of the boolean outcome flag
    pub fn success_key(self) -> &'static str {
        match self {
            Operation::CreateTicket => "isIssueLogged",
            Operation::UpdateTicket => "isIssueUpdated",
            _ => "success",
        }
    }

    /// Key of the payload on success
    pub fn payload_key(self) -> &'static str {
        match self {
            Operation::CreateTicket | Operation::UpdateTicket | Operation::AddComment => {
                "response"
            }
            Operation::GetIssue => "issue",
            Operation::SearchIssues => "issues",
            Operation::GetComments => "comments",
            Operation::GetProject => "project",
            Operation::GetAllProjects => "projects",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one operation
///
/// Exactly one of payload and error is present. Extra details (the JQL that
/// was run, a transition report, warnings) ride alongside either.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    operation: Operation,
    outcome: Result<Value, String>,
    error_category: Option<&'static str>,
    details: Map<String, Value>,
}

impl OperationResult {
    pub fn ok(operation: Operation, payload: Value) -> Self {
        Self {
            operation,
            outcome: Ok(payload),
            error_category: None,
            details: Map::new(),
        }
    }

    pub fn failed(operation: Operation, error: &TrackerError) -> Self {
        Self {
            operation,
            outcome: Err(error.to_string()),
            error_category: Some(error.category()),
            details: Map::new(),
        }
    }

    /// Attach an extra key; envelope keys cannot be overwritten
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Append to the `warnings` list
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        let entry = self
            .details
            .entry("warnings")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(warnings) = entry {
            warnings.push(Value::String(warning.into()));
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    pub fn error_category(&self) -> Option<&'static str> {
        self.error_category
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// The envelope as a JSON object
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            self.operation.success_key().to_string(),
            Value::Bool(self.is_success()),
        );

        match &self.outcome {
            Ok(payload) => {
                map.insert(self.operation.payload_key().to_string(), payload.clone());
            }
            Err(message) => {
                map.insert("error".to_string(), Value::String(message.clone()));
                if let Some(category) = self.error_category {
                    map.insert(
                        "errorCategory".to_string(),
                        Value::String(category.to_string()),
                    );
                }
            }
        }

        for (key, value) in &self.details {
            if !map.contains_key(key) {
                map.insert(key.clone(), value.clone());
            }
        }

        Value::Object(map)
    }
}

impl Serialize for OperationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// Display as JSON so MCP clients receive structured text
impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.to_value()) {
            Ok(json) => write!(f, "{}", json),
            Err(e) => write!(f, "{{\"error\": \"Failed to serialize: {}\"}}", e),
        }
    }
}
