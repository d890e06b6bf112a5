//! Tracker operations
//!
//! `TicketService` composes the field mapper, JQL builder and transition
//! resolver over a `Transport`. Configuration and input problems are returned
//! as `Err` before any remote call; everything that goes wrong remotely is
//! reported inside the `OperationResult` envelope.

use crate::config::JiraConfig;
use crate::envelope::{Operation, OperationResult};
use crate::error::{TrackerError, TrackerResult};
use crate::field_mapper::{FieldMapper, TicketDraft, TicketPatch};
use crate::jql::{build_jql, SearchFilters};
use crate::transitions::TransitionResolver;
use crate::transport::{ApiRequest, HttpTransport, Transport};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

/// Receiving side of a cancellation signal
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    rx: watch::Receiver<bool>,
}

/// Sending side of a cancellation signal
#[derive(Debug)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

/// Create a connected trigger/handle pair
pub fn cancellation_pair() -> (CancelTrigger, CancellationHandle) {
    let (tx, rx) = watch::channel(false);
    (CancelTrigger { tx }, CancellationHandle { rx })
}

impl CancelTrigger {
    pub fn cancel(&self) {
        // Receivers may already be gone, which is fine
        let _ = self.tx.send(true);
    }
}

impl CancellationHandle {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; never if the trigger is dropped first
    pub async fn cancelled(&mut self) {
        let trigger_dropped = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if trigger_dropped {
            std::future::pending::<()>().await;
        }
    }
}

/// Façade over the tracker operations
#[derive(Clone)]
pub struct TicketService {
    config: Arc<JiraConfig>,
    transport: Arc<dyn Transport>,
    mapper: FieldMapper,
    cancellation: Option<CancellationHandle>,
}

impl std::fmt::Debug for TicketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketService")
            .field("base_url", &self.config.base_url)
            .field("schema", &self.mapper.schema())
            .finish()
    }
}

impl TicketService {
    /// Service talking to JIRA over HTTP
    pub fn new(config: Arc<JiraConfig>) -> TrackerResult<Self> {
        let transport = Arc::new(HttpTransport::new(config.clone())?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: Arc<JiraConfig>, transport: Arc<dyn Transport>) -> Self {
        let mapper = FieldMapper::from_config(&config);
        Self {
            config,
            transport,
            mapper,
            cancellation: None,
        }
    }

    /// Copy of this service whose calls stop when `handle` fires
    pub fn with_cancellation(&self, handle: CancellationHandle) -> Self {
        Self {
            cancellation: Some(handle),
            ..self.clone()
        }
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// Create a ticket
    #[instrument(skip(self, draft), fields(summary = %draft.summary))]
    pub async fn create_ticket(&self, draft: &TicketDraft) -> TrackerResult<OperationResult> {
        self.config.validate()?;
        let fields = self.mapper.build_create_fields(draft)?;

        let path = format!("/rest/api/{}/issue", self.mapper.schema().api_version());
        let result = self
            .call(ApiRequest::post(path, json!({ "fields": fields })))
            .await;

        if let Ok(created) = &result {
            info!(
                "Created ticket {}",
                created.get("key").and_then(|k| k.as_str()).unwrap_or("<unknown>")
            );
        }

        Ok(self.envelope(Operation::CreateTicket, result))
    }

    /// Fetch one issue by key or id
    #[instrument(skip(self))]
    pub async fn get_issue(&self, issue_key: &str) -> TrackerResult<OperationResult> {
        self.config.validate()?;
        let issue_key = validate_issue_key(issue_key)?;

        let path = format!(
            "/rest/api/{}/issue/{}",
            self.mapper.schema().api_version(),
            issue_key
        );
        let result = self.call(ApiRequest::get(path)).await;

        Ok(self.envelope(Operation::GetIssue, result))
    }

    /// Apply field changes and optionally move the ticket to `status`
    ///
    /// The transition happens before the field write. A failed transition
    /// fetch or trigger fails the whole update and no fields are written. A
    /// status with no matching transition is skipped with a warning unless
    /// `strict_transitions` is configured.
    #[instrument(skip(self, patch))]
    pub async fn update_ticket(
        &self,
        issue_key: &str,
        patch: &TicketPatch,
        status: Option<&str>,
    ) -> TrackerResult<OperationResult> {
        self.config.validate()?;
        let issue_key = validate_issue_key(issue_key)?;
        let status = match status.map(str::trim) {
            Some("") => {
                return Err(TrackerError::invalid_param(
                    "status_name",
                    "Status cannot be empty",
                ))
            }
            other => other,
        };

        let fields = self.mapper.build_update_fields(patch);

        let report = match status {
            Some(status) => {
                let resolver =
                    TransitionResolver::new(self.transport.as_ref(), &self.config.defaults.resolution)
                        .strict(self.config.strict_transitions);
                match self
                    .guarded(async { Ok(resolver.apply(issue_key, status).await) })
                    .await
                {
                    Ok(Ok(report)) => Some(report),
                    Ok(Err(failure)) => {
                        let report = serde_json::to_value(&failure.report)?;
                        return Ok(self
                            .envelope(Operation::UpdateTicket, Err(failure.error))
                            .with_detail("transition", report));
                    }
                    Err(e) => return Ok(self.envelope(Operation::UpdateTicket, Err(e))),
                }
            }
            None => None,
        };

        let updated_fields: Vec<String> = fields.keys().cloned().collect();

        if fields.is_empty() {
            info!("No field changes for {}, skipping field write", issue_key);
        } else {
            let path = format!("/rest/api/2/issue/{}", issue_key);
            if let Err(e) = self
                .call(ApiRequest::put(path, json!({ "fields": fields })))
                .await
            {
                return Ok(self.envelope(Operation::UpdateTicket, Err(e)));
            }
        }

        let mut result = OperationResult::ok(
            Operation::UpdateTicket,
            Value::String("Successfully updated".to_string()),
        )
        .with_detail("updatedFields", updated_fields);

        if let Some(report) = report {
            if let Some(notice) = report.notice() {
                result = result.with_warning(notice);
            }
            result = result.with_detail("transition", serde_json::to_value(&report)?);
        }

        info!("Updated ticket {}", issue_key);
        Ok(result)
    }

    /// Search issues in `project_key` (default project when `None`)
    ///
    /// The page size defaults to the configured search default and is capped
    /// at `max_search_results`.
    #[instrument(skip(self, filters))]
    pub async fn search_issues(
        &self,
        filters: &SearchFilters,
        project_key: Option<&str>,
        max_results: Option<u32>,
    ) -> TrackerResult<OperationResult> {
        self.config.validate()?;

        let project_key = project_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(self.config.defaults.search_project_key.as_str());
        let max_results = max_results
            .unwrap_or(self.config.defaults.search_max_results)
            .clamp(1, self.config.max_search_results);

        let jql = build_jql(filters, project_key).to_string();
        info!("Searching issues with JQL: {}", jql);

        let request = ApiRequest::get("/rest/api/2/search")
            .with_query("jql", jql.as_str())
            .with_query("maxResults", max_results.to_string());
        let result = self.call(request).await;

        Ok(self
            .envelope(Operation::SearchIssues, result)
            .with_detail("jql", jql))
    }

    /// List comments of an issue
    #[instrument(skip(self))]
    pub async fn get_comments(&self, issue_key: &str) -> TrackerResult<OperationResult> {
        self.config.validate()?;
        let issue_key = validate_issue_key(issue_key)?;

        let path = format!("/rest/api/2/issue/{}/comment", issue_key);
        let result = self.call(ApiRequest::get(path)).await;

        Ok(self.envelope(Operation::GetComments, result))
    }

    /// Add a plain-text comment to an issue
    #[instrument(skip(self, body))]
    pub async fn add_comment(&self, issue_key: &str, body: &str) -> TrackerResult<OperationResult> {
        self.config.validate()?;
        let issue_key = validate_issue_key(issue_key)?;
        if body.trim().is_empty() {
            return Err(TrackerError::invalid_param(
                "comment",
                "Comment body cannot be empty",
            ));
        }

        let path = format!("/rest/api/2/issue/{}/comment", issue_key);
        let result = self
            .call(ApiRequest::post(path, json!({ "body": body })))
            .await;

        Ok(self.envelope(Operation::AddComment, result))
    }

    /// Fetch one project; the key wins when both key and id are given
    #[instrument(skip(self))]
    pub async fn get_project(
        &self,
        project_key: Option<&str>,
        project_id: Option<&str>,
    ) -> TrackerResult<OperationResult> {
        self.config.validate()?;

        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        let reference = non_empty(project_key)
            .or_else(|| non_empty(project_id))
            .ok_or_else(|| {
                TrackerError::invalid_param(
                    "project_key",
                    "Either project_key or project_id must be provided",
                )
            })?;
        let reference = path_segment("project_key", reference)?;

        let path = format!(
            "/rest/api/{}/project/{}",
            self.mapper.schema().api_version(),
            reference
        );
        let result = self.call(ApiRequest::get(path)).await;

        Ok(self.envelope(Operation::GetProject, result))
    }

    /// List all projects visible to the account
    #[instrument(skip(self))]
    pub async fn get_all_projects(&self) -> TrackerResult<OperationResult> {
        self.config.validate()?;

        let result = self
            .call(ApiRequest::get("/rest/api/3/project/search"))
            .await
            .map(|page| match page.get("values") {
                Some(values) => values.clone(),
                None => Value::Array(Vec::new()),
            });

        Ok(self.envelope(Operation::GetAllProjects, result))
    }

    async fn call(&self, request: ApiRequest) -> TrackerResult<Value> {
        self.guarded(self.transport.send(request)).await
    }

    /// Race `future` against the cancellation signal, if any
    async fn guarded<T>(&self, future: impl Future<Output = TrackerResult<T>>) -> TrackerResult<T> {
        match &self.cancellation {
            None => future.await,
            Some(handle) if handle.is_cancelled() => {
                warn!("Operation cancelled before it was sent");
                Err(TrackerError::Cancelled)
            }
            Some(handle) => {
                let mut handle = handle.clone();
                tokio::select! {
                    biased;
                    _ = handle.cancelled() => {
                        warn!("Operation cancelled by caller");
                        Err(TrackerError::Cancelled)
                    }
                    result = future => result,
                }
            }
        }
    }

    fn envelope(&self, operation: Operation, result: TrackerResult<Value>) -> OperationResult {
        match result {
            Ok(payload) => OperationResult::ok(operation, payload),
            Err(e) => {
                error!(
                    operation = %operation,
                    category = e.category(),
                    code = e.error_code(),
                    "Operation failed: {}",
                    e
                );
                OperationResult::failed(operation, &e)
            }
        }
    }
}

/// Reject keys that are empty or would escape their URL path segment
fn validate_issue_key(issue_key: &str) -> TrackerResult<&str> {
    path_segment("issue_key", issue_key)
}

fn path_segment<'a>(parameter: &str, value: &'a str) -> TrackerResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(TrackerError::invalid_param(parameter, "Value cannot be empty"));
    }

    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(TrackerError::invalid_param(
            parameter,
            format!("'{}' is not a valid path segment", value),
        ));
    }

    Ok(value)
}
