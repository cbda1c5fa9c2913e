//! HTTP control plane for the pursuit session.
//!
//! Runs on a background thread with a blocking HTTP server. Each request is
//! turned into a [`ControlRequest`], handed to the hub loop, and answered with
//! whatever JSON the hub replies with.

use crate::error::HubError;
use crate::hub::ServerMessage;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::thread;
use tiny_http::{Header, Method, Request, Response, Server};
use tokio::sync::{mpsc, oneshot};

/// JSON body returned by the hub for a control request
pub type ControlReply = Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlRequest {
    Start {
        difficulty: Option<u8>,
        map: Option<String>,
    },
    Stop,
    State,
    StartTest,
    List,
    Status,
}

#[derive(Debug, Default, Deserialize)]
struct StartBody {
    difficulty: Option<u8>,
    map: Option<String>,
}

/// Maps a method and URL to a request. `Ok(None)` means no such route.
pub fn route(method: &Method, url: &str, body: &str) -> Result<Option<ControlRequest>, HubError> {
    let path = url.split('?').next().unwrap_or(url);

    let request = match (method, path) {
        (&Method::Post, "/admin/zombie/start") => {
            let body: StartBody = if body.trim().is_empty() {
                StartBody::default()
            } else {
                serde_json::from_str(body)?
            };
            ControlRequest::Start {
                difficulty: body.difficulty,
                map: body.map,
            }
        }
        (&Method::Post, "/admin/zombie/stop") => ControlRequest::Stop,
        (&Method::Get, "/admin/zombie/state") => ControlRequest::State,
        (&Method::Get, "/admin/zombie/start-test") => ControlRequest::StartTest,
        (&Method::Get, "/admin/zombie/list") => ControlRequest::List,
        (&Method::Get, "/") => ControlRequest::Status,
        _ => return Ok(None),
    };
    Ok(Some(request))
}

/// Handle to a running control plane. The serving thread is detached and
/// lives until the process exits, whether or not this value is kept.
pub struct ControlServer {
    local_addr: Option<SocketAddr>,
}

impl ControlServer {
    /// Binds `address` and starts serving on a new thread.
    pub fn start(address: &str, hub: mpsc::UnboundedSender<ServerMessage>) -> Result<Self, HubError> {
        let server = Server::http(address)
            .map_err(|e| HubError::Control(format!("failed to bind {}: {}", address, e)))?;
        let local_addr = server.server_addr().to_ip();
        info!("Control plane listening on {}", address);

        thread::Builder::new()
            .name("control-plane".to_string())
            .spawn(move || run_server(server, hub))?;

        Ok(Self { local_addr })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

fn run_server(server: Server, hub: mpsc::UnboundedSender<ServerMessage>) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &hub) {
            error!("Control plane error: {}", e);
        }
    }
}

fn handle_request(mut request: Request, hub: &mpsc::UnboundedSender<ServerMessage>) -> Result<(), HubError> {
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body)?;
    debug!("{} {}", request.method(), request.url());

    let response = match route(request.method(), request.url(), &body) {
        Ok(Some(control)) => match dispatch(control, hub) {
            Some(reply) => json_response(200, &reply),
            None => json_response(503, &json!({"error": "Hub unavailable"})),
        },
        Ok(None) => json_response(404, &json!({"error": "Not Found"})),
        Err(e) => {
            warn!("Rejected control request: {}", e);
            json_response(400, &json!({"error": e.to_string()}))
        }
    };

    request.respond(response)?;
    Ok(())
}

/// Hands `request` to the hub and blocks until it answers.
fn dispatch(request: ControlRequest, hub: &mpsc::UnboundedSender<ServerMessage>) -> Option<ControlReply> {
    let (reply, response) = oneshot::channel();
    if hub.send(ServerMessage::Control { request, reply }).is_err() {
        return None;
    }
    response.blocking_recv().ok()
}

fn json_response(status: u16, body: &Value) -> Response<Cursor<Vec<u8>>> {
    let response = Response::from_string(body.to_string()).with_status_code(status);
    match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
