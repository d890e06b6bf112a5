//! JIRA Ticket MCP Server Library
//!
//! Exposes JIRA ticket operations (create, read, update with workflow
//! transitions, JQL search, comments and project lookup) as Model Context
//! Protocol tools.
//!
//! ## Features
//!
//! - **Flat tool parameters**: tools take simple optional parameters; the
//!   server maps them onto JIRA's nested field payloads
//! - **Status changes**: updates resolve the workflow transition for the
//!   requested status before writing fields
//! - **Uniform results**: every tool answers with a success flag and either a
//!   payload or an error string
//! - **Error Handling**: MCP-compliant error codes for configuration and
//!   parameter problems

use crate::config::JiraConfig;
use crate::envelope::OperationResult;
use crate::error::{TrackerError, TrackerResult};
use crate::service::TicketService;
use crate::tools::{
    AddCommentParams, CreateJiraTicketParams, GetCommentsParams, GetIssueParams,
    GetProjectByIdParams, GetProjectByKeyParams, SearchIssuesParams, UpdateJiraTicketParams,
};

use pulseengine_mcp_macros::{mcp_server, mcp_tools};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

// Re-export modules for external use
pub mod config;
pub mod envelope;
pub mod error;
pub mod field_mapper;
pub mod jql;
pub mod service;
pub mod tools;
pub mod transitions;
pub mod transport;

/// JIRA Ticket MCP Server
///
/// Uses the #[mcp_server] macro for automatic MCP infrastructure generation.
#[mcp_server(
    name = "JIRA Ticket MCP Server",
    version = "0.1.0",
    description = "JIRA ticket creation, update, search, comment and project tools",
    auth = "disabled"
)]
#[derive(Clone)]
pub struct JiraTicketServer {
    /// Tracker operations, holding the configuration
    service: Arc<TicketService>,
}

impl Default for JiraTicketServer {
    fn default() -> Self {
        // The macro requires Default; build the server with `new()` or `with_config()`
        panic!("JiraTicketServer cannot be created with default(). Use JiraTicketServer::new() instead.")
    }
}

impl JiraTicketServer {
    /// Create a server from the TOML file and environment
    #[instrument]
    pub async fn new() -> TrackerResult<Self> {
        info!("Initializing JIRA Ticket MCP Server");

        let config = JiraConfig::load()?;
        info!("Configuration loaded");

        Self::with_config(config)
    }

    /// Create server with custom configuration (for testing)
    #[instrument(skip(config))]
    pub fn with_config(config: JiraConfig) -> TrackerResult<Self> {
        let config = Arc::new(config);
        let service = Arc::new(TicketService::new(Arc::clone(&config))?);

        info!(
            "JIRA Ticket MCP Server initialized for {} ({:?} schema)",
            config.base_url, config.schema_variant
        );

        Ok(Self { service })
    }
}

/// All public methods in this impl block become MCP tools automatically
/// The #[mcp_tools] macro discovers these methods and exposes them via MCP
#[mcp_tools]
impl JiraTicketServer {
    /// Create a JIRA ticket
    ///
    /// Only summary and description are required. Project, issue type,
    /// priority, cost centers and the flow/tag/beat classifiers fall back to
    /// configured defaults.
    ///
    /// # Examples
    /// - Minimal ticket: `{"summary": "Login fails", "description": "Steps..."}`
    /// - Bug with assignee: `{"summary": "...", "description": "...", "issue_type": "Bug", "assignee": "jdoe"}`
    #[instrument(skip(self, params), fields(summary = %params.summary))]
    pub async fn create_jira_ticket(
        &self,
        params: CreateJiraTicketParams,
    ) -> anyhow::Result<OperationResult> {
        let draft = params.into_draft(&self.service.config().defaults);
        self.service
            .create_ticket(&draft)
            .await
            .map_err(|e| tool_error("create_jira_ticket", e))
    }

    /// Update a JIRA ticket and optionally change its status
    ///
    /// Only the given fields change. When `status_name` is set, the matching
    /// workflow transition runs first; if none matches, fields are still
    /// updated and the result carries a warning listing available statuses.
    ///
    /// # Examples
    /// - Close a ticket: `{"issue_key": "FCA-12", "status_name": "Closed"}`
    /// - Unassign: `{"issue_key": "FCA-12", "assignee": ""}`
    #[instrument(skip(self, params), fields(issue_key = %params.issue_key))]
    pub async fn update_jira_ticket(
        &self,
        params: UpdateJiraTicketParams,
    ) -> anyhow::Result<OperationResult> {
        let (issue_key, status, patch) = params.into_parts();
        self.service
            .update_ticket(&issue_key, &patch, status.as_deref())
            .await
            .map_err(|e| tool_error("update_jira_ticket", e))
    }

    /// Get a JIRA issue by key or id
    #[instrument(skip(self))]
    pub async fn get_issue(&self, params: GetIssueParams) -> anyhow::Result<OperationResult> {
        self.service
            .get_issue(&params.issue_key)
            .await
            .map_err(|e| tool_error("get_issue", e))
    }

    /// Search JIRA issues with structured filters
    ///
    /// Defaults to the configured project and to issues assigned to the
    /// configured user; pass `"assignee": "null"` to drop the assignee filter.
    ///
    /// # Examples
    /// - My open work: `{"status": ["To Do", "In Progress"]}`
    /// - A sprint's bugs: `{"assignee": "null", "sprint": "42", "issue_type": "Bug"}`
    #[instrument(skip(self))]
    pub async fn search_issues(
        &self,
        params: SearchIssuesParams,
    ) -> anyhow::Result<OperationResult> {
        let filters = params.to_filters(&self.service.config().user_id);
        self.service
            .search_issues(&filters, params.project_key.as_deref(), params.max_results)
            .await
            .map_err(|e| tool_error("search_issues", e))
    }

    /// Get all comments of a JIRA issue
    #[instrument(skip(self))]
    pub async fn get_comments(
        &self,
        params: GetCommentsParams,
    ) -> anyhow::Result<OperationResult> {
        self.service
            .get_comments(&params.issue_key)
            .await
            .map_err(|e| tool_error("get_comments", e))
    }

    /// Add a plain-text comment to a JIRA issue
    #[instrument(skip(self, params), fields(issue_key = %params.issue_key))]
    pub async fn add_comment(&self, params: AddCommentParams) -> anyhow::Result<OperationResult> {
        self.service
            .add_comment(&params.issue_key, &params.comment)
            .await
            .map_err(|e| tool_error("add_comment", e))
    }

    /// Get a JIRA project by its numeric id
    #[instrument(skip(self))]
    pub async fn get_project_by_id(
        &self,
        params: GetProjectByIdParams,
    ) -> anyhow::Result<OperationResult> {
        self.service
            .get_project(None, Some(&params.project_id))
            .await
            .map_err(|e| tool_error("get_project_by_id", e))
    }

    /// Get a JIRA project by its key
    #[instrument(skip(self))]
    pub async fn get_project_by_key(
        &self,
        params: GetProjectByKeyParams,
    ) -> anyhow::Result<OperationResult> {
        self.service
            .get_project(Some(&params.project_key), None)
            .await
            .map_err(|e| tool_error("get_project_by_key", e))
    }

    /// List all JIRA projects visible to the configured account
    #[instrument(skip(self))]
    pub async fn get_all_projects(&self) -> anyhow::Result<OperationResult> {
        self.service
            .get_all_projects()
            .await
            .map_err(|e| tool_error("get_all_projects", e))
    }
}

/// Log a tool error and hand it to the MCP layer
fn tool_error(tool: &str, e: TrackerError) -> anyhow::Error {
    if e.is_fatal() {
        warn!(code = e.error_code(), "{} rejected: {}", tool, e);
    } else {
        error!(code = e.error_code(), "{} failed: {}", tool, e);
    }
    anyhow::Error::new(e)
}
