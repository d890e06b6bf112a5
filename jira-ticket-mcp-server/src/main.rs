//! JIRA Ticket MCP Server - JIRA ticket tools via MCP
//!
//! Serves the ticket tools over STDIO to an MCP client.

use dotenv::dotenv;
use jira_ticket_mcp_server::JiraTicketServer;
use pulseengine_mcp_server::McpServerBuilder;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the environment may already be set
    dotenv().ok();

    // Configure logging for STDIO transport
    JiraTicketServer::configure_stdio_logging();

    info!("Starting JIRA Ticket MCP Server...");

    let jira_server = match JiraTicketServer::new().await {
        Ok(server) => {
            info!("JIRA Ticket MCP Server created successfully");
            server
        }
        Err(e) => {
            error!("Failed to create JIRA Ticket MCP Server: {}", e);
            eprintln!("Failed to start JIRA Ticket MCP Server: {}", e);
            eprintln!("\nPlease check:");
            eprintln!("  - JIRA_BASE_URL, JIRA_USER_EMAIL, JIRA_USER_ID and JIRA_API_TOKEN are set");
            eprintln!("  - JIRA_REQUEST_TIMEOUT, if set, is a whole number of seconds");
            std::process::exit(1);
        }
    };

    info!("Starting MCP server with STDIO transport...");

    // Start the server using the macro-generated infrastructure
    let mut server = jira_server.serve_stdio().await?;

    info!("JIRA Ticket MCP Server is running and ready to serve requests");

    server.run().await?;

    Ok(())
}
