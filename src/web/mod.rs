//! Embedded HTTP API for the mlboard dashboard.
//!
//! Provides a lightweight JSON server (sync, via `tiny_http`) exposing the
//! two insight flows, the experiment comparison merge, invocation stats, and
//! a health probe. The dashboard UI itself lives elsewhere; this server is
//! API-only.
//!
//! Launched via `mlboard serve` (default: `http://127.0.0.1:9748`).

use std::io::Cursor;

use anyhow::Result;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::llm::gemini::GeminiClient;

pub mod api;

use api::ApiReply;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the API server on the given address.
///
/// Blocks the current thread. Handles requests sequentially, which is
/// sufficient for a local single-user dashboard: each flow invocation is one
/// blocking provider call anyway, and concurrent browser tabs just queue.
pub fn serve(addr: &str, client: &GeminiClient) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("mlboard API running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = dispatch(client, &method, &url, body.as_deref());
        let _ = request.respond(to_response(reply));

        // Brief access log
        println!(
            "{} {} {}",
            method,
            url,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(client: &GeminiClient, method: &Method, url: &str, body: Option<&str>) -> ApiReply {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Flows
        (&Method::Post, "/api/analyze") => api::post_analyze(client, body.unwrap_or("")),
        (&Method::Post, "/api/summarize") => api::post_summarize(client, body.unwrap_or("")),

        // Comparison
        (&Method::Post, "/api/compare") => api::post_compare(body.unwrap_or("")),

        // Diagnostics
        (&Method::Get, "/api/health") => api::get_health(client),
        (&Method::Get, "/api/stats") => api::get_stats(),

        // 404
        _ => ApiReply::not_found(),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn to_response(reply: ApiReply) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(reply.body.to_string().into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(reply.status))
}

/// JSON content type header.
fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}
