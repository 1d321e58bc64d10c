//! MCP stdio Server
//!
//! Async Tokio task that handles JSON-RPC 2.0 requests over stdin/stdout.
//! Each request runs in its own task, so a slow load does not hold up
//! listing or paging; responses go through a single writer task and may
//! arrive out of request order.

use crate::mcp::handlers::{initialize, tools};
use crate::mcp::types::{MCPError, MCPRequest, MCPResponse};
use crate::services::DataService;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Run the MCP stdio server
///
/// Reads JSON-RPC requests from stdin, processes them via handlers,
/// and writes responses to stdout. Runs until EOF on stdin, after
/// in-flight requests have been answered.
#[instrument(skip(service))]
pub async fn run_mcp_server(service: Arc<DataService>) -> anyhow::Result<()> {
    info!("🔌 MCP stdio server started");

    let reader = BufReader::new(tokio::io::stdin());
    serve(service, reader, tokio::io::stdout()).await?;

    info!("🔌 MCP stdio server stopped (stdin closed)");
    Ok(())
}

/// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`
pub async fn serve<R, W>(service: Arc<DataService>, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<MCPResponse>();
    let writer_task = tokio::spawn(async move {
        let mut writer = BufWriter::new(writer);
        while let Some(response) = rx.recv().await {
            write_response(&mut writer, &response).await?;
        }
        Ok::<(), anyhow::Error>(())
    });

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("📥 MCP request: {}", line);

        let request = match parse_request(&line) {
            Ok(request) => request,
            Err(response) => {
                let _ = tx.send(*response);
                continue;
            }
        };

        let service = service.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = respond(service, request).await {
                // The writer only stops once every sender is gone
                let _ = tx.send(response);
            }
        });

        while let Some(finished) = in_flight.try_join_next() {
            if let Err(e) = finished {
                error!("❌ MCP request task failed: {}", e);
            }
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        if let Err(e) = finished {
            error!("❌ MCP request task failed: {}", e);
        }
    }
    drop(tx);

    writer_task.await??;
    Ok(())
}

/// Parse one line; the error side is the response to send back
fn parse_request(line: &str) -> Result<MCPRequest, Box<MCPResponse>> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        warn!("❌ Failed to parse JSON-RPC request: {}", e);
        Box::new(MCPResponse::error(
            Value::Null,
            MCPError::parse_error(format!("Invalid JSON: {}", e)),
        ))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        warn!("❌ Invalid JSON-RPC request: {}", e);
        Box::new(MCPResponse::error(
            id,
            MCPError::invalid_request(format!("Invalid request: {}", e)),
        ))
    })
}

/// Run one request in its own task so a panic still produces a response
async fn respond(service: Arc<DataService>, request: MCPRequest) -> Option<MCPResponse> {
    let id = request.id.clone();
    let method = request.method.clone();
    match tokio::spawn(async move { handle_request(&service, request).await }).await {
        Ok(response) => response,
        Err(e) => {
            error!("❌ MCP method '{}' aborted: {}", method, e);
            id.map(|id| {
                MCPResponse::error(
                    id,
                    MCPError::internal_error(format!("Request '{}' failed unexpectedly", method)),
                )
            })
        }
    }
}

/// Handle a JSON-RPC request and return a response
///
/// Tool names are accepted as methods too, in which case the raw result
/// (or a JSON-RPC error) is returned instead of the tools/call envelope.
/// Notifications are executed but never answered.
#[instrument(skip(service, request), fields(method = %request.method))]
pub async fn handle_request(service: &Arc<DataService>, request: MCPRequest) -> Option<MCPResponse> {
    let MCPRequest {
        id, method, params, ..
    } = request;

    let result = match method.as_str() {
        "initialize" => initialize::handle_initialize(params),
        "notifications/initialized" | "initialized" => {
            debug!("🤝 MCP client initialized");
            Ok(json!({}))
        }
        "ping" => Ok(json!({})),
        "tools/list" => tools::handle_tools_list(params),
        "tools/call" => tools::handle_tools_call(service, params).await,
        name if tools::is_tool(name) => tools::call_tool(service, name, params).await,
        _ => {
            warn!("⚠️  Unknown MCP method: {}", method);
            Err(MCPError::method_not_found(&method))
        }
    };

    let Some(id) = id else {
        if let Err(e) = result {
            debug!("Notification '{}' failed: {}", method, e.message);
        }
        return None;
    };

    let response = match result {
        Ok(result) => {
            debug!("✅ MCP request {} succeeded", id);
            MCPResponse::success(id, result)
        }
        Err(error) => {
            error!(
                "❌ MCP request {} failed: {} (code: {})",
                id, error.message, error.code
            );
            MCPResponse::error(id, error)
        }
    };
    debug!("📤 MCP response for method '{}'", method);
    Some(response)
}

/// Write a JSON-RPC response as one line
async fn write_response<W>(writer: &mut BufWriter<W>, response: &MCPResponse) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

// Include tests
#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;
