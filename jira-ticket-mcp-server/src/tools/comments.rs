//! Parameters of the comment tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the get_comments tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetCommentsParams {
    /// JIRA issue key (required)
    /// Examples: "FCA-123"
    pub issue_key: String,
}

/// Parameters for the add_comment tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AddCommentParams {
    /// JIRA issue key (required)
    pub issue_key: String,

    /// Plain-text comment body (required)
    pub comment: String,
}
