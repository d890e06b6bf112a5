//! Workflow transition resolution
//!
//! JIRA doesn't allow direct status updates - you must trigger a transition
//! that leads to the wanted state. The resolver fetches the transitions
//! available for an issue, matches the requested status name against each
//! transition's destination and triggers the first match.

use crate::error::{TrackerError, TrackerResult};
use crate::transport::{ApiRequest, Transport};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

/// A transition currently available for an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransitionInfo {
    /// Unique identifier for the transition
    pub id: String,

    /// Human-readable name of the transition (e.g., "Start Progress")
    pub name: String,

    /// The status this transition leads to
    pub to_status: String,

    /// Field ids the transition screen accepts
    #[serde(default)]
    pub fields: Vec<String>,
}

impl TransitionInfo {
    /// The transition screen carries a resolution field
    pub fn requires_resolution(&self) -> bool {
        self.fields.iter().any(|field| field == "resolution")
    }
}

/// Progress of one status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionState {
    Unresolved,
    FetchingTransitions,
    Matching,
    ApplyingTransition,
    Done,
    Failed,
}

/// What happened to a requested status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionReport {
    pub requested_status: String,

    /// `Done` or `Failed`
    pub state: TransitionState,

    /// Phase that was running when the change failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_during: Option<TransitionState>,

    /// The transition that was triggered; `None` when nothing matched
    pub applied: Option<TransitionInfo>,

    /// Destination statuses that were available, filled when nothing matched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_statuses: Vec<String>,
}

impl TransitionReport {
    fn new(requested_status: &str) -> Self {
        Self {
            requested_status: requested_status.to_string(),
            state: TransitionState::Unresolved,
            failed_during: None,
            applied: None,
            available_statuses: Vec::new(),
        }
    }

    pub fn was_applied(&self) -> bool {
        self.applied.is_some()
    }

    pub fn has_failed(&self) -> bool {
        self.state == TransitionState::Failed
    }

    /// Human-readable notice for a status change that was skipped
    pub fn notice(&self) -> Option<String> {
        if self.was_applied() || self.has_failed() {
            return None;
        }
        Some(format!(
            "No transition to status '{}' is available; status left unchanged. Available: {}",
            self.requested_status,
            if self.available_statuses.is_empty() {
                "none".to_string()
            } else {
                self.available_statuses.join(", ")
            }
        ))
    }
}

/// A status change that stopped part-way
#[derive(Debug)]
pub struct TransitionFailure {
    /// Report in the `Failed` state
    pub report: TransitionReport,
    pub error: TrackerError,
}

#[derive(Debug, Deserialize)]
struct TransitionOptions {
    #[serde(default)]
    transitions: Vec<TransitionOption>,
}

#[derive(Debug, Deserialize)]
struct TransitionOption {
    id: TransitionId,
    #[serde(default)]
    name: Option<String>,
    to: TransitionTo,
    #[serde(default)]
    fields: Option<Map<String, Value>>,
}

/// Server returns string ids; some proxies and fixtures send numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransitionId {
    Text(String),
    Number(i64),
}

impl TransitionId {
    fn into_string(self) -> String {
        match self {
            TransitionId::Text(id) => id,
            TransitionId::Number(id) => id.to_string(),
        }
    }
}

/// `{"name": "Closed", ...}` or a bare `"Closed"`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransitionTo {
    Status { name: String },
    Name(String),
}

impl TransitionTo {
    fn into_name(self) -> String {
        match self {
            TransitionTo::Status { name } | TransitionTo::Name(name) => name,
        }
    }
}

/// Parse the body of `GET .../transitions?expand=transitions.fields`
pub fn parse_transitions(body: Value) -> TrackerResult<Vec<TransitionInfo>> {
    let options: TransitionOptions = serde_json::from_value(body)?;

    Ok(options
        .transitions
        .into_iter()
        .map(|option| TransitionInfo {
            id: option.id.into_string(),
            name: option.name.unwrap_or_default(),
            to_status: option.to.into_name(),
            fields: option
                .fields
                .map(|fields| fields.keys().cloned().collect())
                .unwrap_or_default(),
        })
        .collect())
}

/// First transition whose destination status equals `target`, ignoring case
pub fn match_transition<'a>(
    transitions: &'a [TransitionInfo],
    target: &str,
) -> Option<&'a TransitionInfo> {
    let target = target.trim().to_lowercase();
    transitions
        .iter()
        .find(|t| t.to_status.to_lowercase() == target)
}

/// Body for `POST .../transitions`
///
/// Transitions whose screen has a resolution field get `default_resolution`.
pub fn transition_payload(transition: &TransitionInfo, default_resolution: &str) -> Value {
    let mut payload = json!({ "transition": { "id": transition.id } });

    if transition.requires_resolution() {
        payload["fields"] = json!({ "resolution": { "name": default_resolution } });
    }

    payload
}

/// Drives one status change through the transport
pub struct TransitionResolver<'a> {
    transport: &'a dyn Transport,
    default_resolution: &'a str,
    strict: bool,
}

impl<'a> TransitionResolver<'a> {
    pub fn new(transport: &'a dyn Transport, default_resolution: &'a str) -> Self {
        Self {
            transport,
            default_resolution,
            strict: false,
        }
    }

    /// Treat an unmatched status as `TrackerError::TransitionNotFound`
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Move `issue_key` to `target_status`
    ///
    /// Fetch and trigger failures come back as a `TransitionFailure` whose
    /// report records the phase that failed. An unmatched status yields a
    /// report with `applied: None` unless the resolver is strict.
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        issue_key: &str,
        target_status: &str,
    ) -> Result<TransitionReport, TransitionFailure> {
        let mut report = TransitionReport::new(target_status);
        let path = format!("/rest/api/2/issue/{}/transitions", issue_key);

        advance(&mut report, TransitionState::FetchingTransitions);
        let fetched = self
            .transport
            .send(ApiRequest::get(path.as_str()).with_query("expand", "transitions.fields"))
            .await
            .and_then(parse_transitions);
        let transitions = match fetched {
            Ok(transitions) => transitions,
            Err(error) => return Err(fail(report, error)),
        };

        advance(&mut report, TransitionState::Matching);
        let Some(transition) = match_transition(&transitions, target_status) else {
            let available: Vec<String> =
                transitions.iter().map(|t| t.to_status.clone()).collect();
            warn!(
                "No transition to '{}' for {}; available: {:?}",
                target_status, issue_key, available
            );

            if self.strict {
                let error = TrackerError::TransitionNotFound {
                    issue_key: issue_key.to_string(),
                    status: target_status.to_string(),
                    available: available.clone(),
                };
                report.available_statuses = available;
                return Err(fail(report, error));
            }

            report.available_statuses = available;
            advance(&mut report, TransitionState::Done);
            return Ok(report);
        };

        advance(&mut report, TransitionState::ApplyingTransition);
        if let Err(error) = self
            .transport
            .send(ApiRequest::post(
                path,
                transition_payload(transition, self.default_resolution),
            ))
            .await
        {
            return Err(fail(report, error));
        }

        info!(
            "Transitioned {} via '{}' to '{}'",
            issue_key, transition.name, transition.to_status
        );

        report.applied = Some(transition.clone());
        advance(&mut report, TransitionState::Done);
        Ok(report)
    }
}

fn advance(report: &mut TransitionReport, to: TransitionState) {
    debug!("Transition state {:?} -> {:?}", report.state, to);
    report.state = to;
}

fn fail(mut report: TransitionReport, error: TrackerError) -> TransitionFailure {
    warn!("Transition failed during {:?}: {}", report.state, error);
    report.failed_during = Some(report.state);
    report.state = TransitionState::Failed;
    TransitionFailure { report, error }
}
