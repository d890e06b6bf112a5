//! Parameters of the project lookup tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the get_project_by_id tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetProjectByIdParams {
    /// Numeric project id, e.g. "31900"
    pub project_id: String,
}

/// Parameters for the get_project_by_key tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetProjectByKeyParams {
    /// Project key, e.g. "FCA"
    pub project_key: String,
}
