//! Tool parameter schemas for the JIRA ticket server
//!
//! Each tool takes one parameter struct whose JSON schema is advertised to the
//! calling agent. Conversions into drafts, patches and filters apply the
//! configured defaults.

pub mod comments;
pub mod create_ticket;
pub mod issues;
pub mod projects;
pub mod search_issues;
pub mod update_ticket;

pub use comments::*;
pub use create_ticket::*;
pub use issues::*;
pub use projects::*;
pub use search_issues::*;
pub use update_ticket::*;
