//! JQL construction for issue search
//!
//! Filters become an ordered conjunction of predicates. The order is fixed
//! by this module, not by the caller, so equal filter sets always render the
//! same query string.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Sentinel that switches the assignee filter off
const NULL_ASSIGNEE: &str = "null";

/// Optional search filters; `None` or empty values add no predicate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub fix_version: Option<String>,
    pub dev_assignee: Option<String>,
    pub qa_assignee: Option<String>,
    pub be_delivery_date: Option<String>,
    pub fe_delivery_date: Option<String>,
    pub dev_delivery_date: Option<String>,
    pub qa_delivery_date: Option<String>,
    pub qa_required: Option<String>,
    pub dependent_systems: Option<String>,
    pub epic_link: Option<String>,
    pub sprint: Option<String>,
    pub priority: Option<String>,
    pub issue_type: Option<String>,
    pub status: Option<Vec<String>>,
}

/// A built query: project predicate, filter predicates, ordering clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JqlQuery {
    predicates: Vec<String>,
}

impl JqlQuery {
    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }
}

impl fmt::Display for JqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ORDER BY updated DESC", self.predicates.join(" AND "))
    }
}

/// Build the search query for `project_key` narrowed by `filters`
///
/// Quoted values have `\` and `"` escaped so they stay literal inside the
/// string; no other JQL-injection defence is attempted. The project key is
/// emitted bare, as JQL accepts keys as identifiers.
pub fn build_jql(filters: &SearchFilters, project_key: &str) -> JqlQuery {
    let mut predicates = vec![format!("project = {}", project_key.trim())];

    let assignee = present(&filters.assignee)
        .filter(|assignee| !assignee.eq_ignore_ascii_case(NULL_ASSIGNEE));

    let scalar_filters: [(&str, Option<&str>); 15] = [
        ("assignee", assignee),
        ("reporter", present(&filters.reporter)),
        ("fixVersion", present(&filters.fix_version)),
        ("\"Dev Assignee\"", present(&filters.dev_assignee)),
        ("\"QA Assignee\"", present(&filters.qa_assignee)),
        ("cf[20109]", present(&filters.be_delivery_date)),
        ("cf[20108]", present(&filters.fe_delivery_date)),
        ("cf[19204]", present(&filters.dev_delivery_date)),
        ("cf[19205]", present(&filters.qa_delivery_date)),
        ("cf[13303]", present(&filters.qa_required)),
        ("cf[15506]", present(&filters.dependent_systems)),
        ("cf[10008]", present(&filters.epic_link)),
        ("cf[10007]", present(&filters.sprint)),
        ("priority", present(&filters.priority)),
        ("issuetype", present(&filters.issue_type)),
    ];

    for (field, value) in scalar_filters {
        if let Some(value) = value {
            predicates.push(format!("{} = {}", field, quote(value)));
        }
    }

    if let Some(statuses) = filters.status.as_ref().filter(|s| !s.is_empty()) {
        let joined = statuses
            .iter()
            .map(|s| quote(s))
            .collect::<Vec<_>>()
            .join(", ");
        predicates.push(format!("status in ({})", joined));
    }

    let query = JqlQuery { predicates };
    debug!("Built JQL query: {}", query);
    query
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Escape special characters in JQL string literals and wrap in quotes
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
