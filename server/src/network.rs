//! WebSocket transport between clients and the hub.
//!
//! Every accepted socket gets a server-assigned [`ConnectionId`] and two
//! halves: an incoming half that forwards text frames to the hub, and an
//! outgoing half that drains the connection's outbox onto the socket. When
//! either half ends, the hub is told the connection closed.

use crate::broadcaster::ConnectionId;
use crate::error::HubError;
use crate::hub::ServerMessage;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub struct NetworkServer {
    listener: TcpListener,
    hub: mpsc::UnboundedSender<ServerMessage>,
}

impl NetworkServer {
    pub async fn bind(address: &str, hub: mpsc::UnboundedSender<ServerMessage>) -> Result<Self, HubError> {
        let listener = TcpListener::bind(address).await?;
        info!("WebSocket server listening on {}", listener.local_addr()?);
        Ok(Self { listener, hub })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, HubError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop; runs until the task is dropped.
    pub async fn run(self) {
        let mut next_connection_id: ConnectionId = 1;

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let connection_id = next_connection_id;
                    next_connection_id += 1;
                    let hub = self.hub.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, connection_id, hub).await {
                            warn!("Connection {} from {} failed: {}", connection_id, addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Drives one client socket from handshake to close.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connection_id: ConnectionId,
    hub: mpsc::UnboundedSender<ServerMessage>,
) -> Result<(), HubError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| HubError::Network(format!("WebSocket handshake failed: {e}")))?;
    debug!("Connection {} established from {}", connection_id, addr);

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let ws_sender = Arc::new(Mutex::new(ws_sender));
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<String>();

    hub.send(ServerMessage::Connected {
        connection_id,
        outbox,
    })
    .map_err(|_| HubError::Network("hub is not running".to_string()))?;

    let incoming_task = {
        let hub = hub.clone();
        let ws_sender = ws_sender.clone();

        async move {
            while let Some(msg) = ws_receiver.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text.as_str().to_owned(),
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            trace!("Dropping non UTF-8 frame from connection {}", connection_id);
                            continue;
                        }
                    },
                    Ok(Message::Ping(data)) => {
                        let mut ws_sender = ws_sender.lock().await;
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            debug!("Failed to answer ping on connection {}: {}", connection_id, e);
                        }
                        continue;
                    }
                    Ok(Message::Close(_)) => {
                        debug!("Client {} requested close", connection_id);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("WebSocket error for connection {}: {}", connection_id, e);
                        break;
                    }
                };

                if hub.send(ServerMessage::Received { connection_id, text }).is_err() {
                    break;
                }
            }
        }
    };

    let outgoing_task = async move {
        while let Some(frame) = outbox_rx.recv().await {
            let mut ws_sender = ws_sender.lock().await;
            if let Err(e) = ws_sender.send(Message::text(frame)).await {
                debug!("Failed to send to connection {}: {}", connection_id, e);
                break;
            }
        }
    };

    // Run both halves until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    if hub.send(ServerMessage::Closed { connection_id }).is_err() {
        debug!("Hub gone before close of connection {} was reported", connection_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::connect_async;

    async fn expect_connected(
        rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
    ) -> (ConnectionId, mpsc::UnboundedSender<String>) {
        match rx.recv().await {
            Some(ServerMessage::Connected {
                connection_id,
                outbox,
            }) => (connection_id, outbox),
            other => panic!("Unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = NetworkServer::bind("127.0.0.1:0", tx).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let (mut client, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        let (connection_id, outbox) = expect_connected(&mut rx).await;
        assert_eq!(connection_id, 1);

        client
            .send(Message::text(r#"{"type":"request_positions"}"#))
            .await
            .unwrap();
        match rx.recv().await {
            Some(ServerMessage::Received { connection_id, text }) => {
                assert_eq!(connection_id, 1);
                assert_eq!(text, r#"{"type":"request_positions"}"#);
            }
            other => panic!("Unexpected message {:?}", other),
        }

        outbox.send(r#"{"type":"disconnect","id":"p1"}"#.to_string()).unwrap();
        match client.next().await {
            Some(Ok(Message::Text(text))) => {
                assert_eq!(text.as_str(), r#"{"type":"disconnect","id":"p1"}"#)
            }
            other => panic!("Unexpected frame {:?}", other),
        }

        client.close(None).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::Closed { connection_id: 1 })
        ));
    }

    #[tokio::test]
    async fn test_ping_is_answered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = NetworkServer::bind("127.0.0.1:0", tx).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let (mut client, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        let (connection_id, _outbox) = expect_connected(&mut rx).await;

        client.send(Message::Ping(vec![7, 7].into())).await.unwrap();
        match client.next().await {
            Some(Ok(Message::Pong(data))) => assert_eq!(&data[..], &[7, 7]),
            other => panic!("Unexpected frame {:?}", other),
        }

        // Pings are not forwarded to the hub
        drop(client);
        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::Closed { connection_id: id }) if id == connection_id
        ));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let server = NetworkServer::bind("127.0.0.1:0", tx).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let (_first, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        let (first_id, _) = expect_connected(&mut rx).await;
        let (_second, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
        let (second_id, _) = expect_connected(&mut rx).await;

        assert_ne!(first_id, second_id);
    }
}
