// Copyright 2026 The Paxos Store Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The mediator: listens for inbound links, dials configured peers, runs
//! the handshake/greeting, and exposes `send`/`broadcast` to the consensus
//! handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;

use crate::codec::MessageCodec;
use crate::connection::WriterHandle;
use crate::connection_map::ConnMap;
use crate::error::{fatal, ProtocolError};
use crate::hostfile::Endpoint;
use crate::messages::{Acknowledge, Denied, Message, Server};
use crate::retry;
use crate::security::SecurityContext;

/// Connection mediator: owns the peer and client connection maps and the
/// listener/dial lifecycle.
pub struct Mediator {
    security: SecurityContext,
    peers: Arc<ConnMap>,
    clients: Arc<ConnMap>,
    endpoints: Vec<Endpoint>,
    majority: usize,
}

impl Mediator {
    /// `inbound` receives every authenticated `(uid, Message)` the maps
    /// accept, destined for the consensus handler's dedicated task.
    pub fn new(
        endpoints: Vec<Endpoint>,
        security: SecurityContext,
        inbound: mpsc::UnboundedSender<(u128, Message)>,
    ) -> Arc<Self> {
        let majority = endpoints.len() / 2 + 1;

        let peers = ConnMap::new(
            dispatch(inbound.clone(), security.clone()),
            move |map, _uid| {
                tokio::spawn(async move {
                    if map.len().await < majority {
                        fatal("lost connection to the majority of servers");
                    }
                });
            },
        );

        let clients = ConnMap::new(
            dispatch(inbound, security.clone()),
            |_map, uid| {
                debug!("client {:032x} disconnected", uid);
            },
        );

        Arc::new(Self {
            security,
            peers,
            clients,
            endpoints,
            majority,
        })
    }

    /// Runs the startup sequence: listener, parallel peer dials, then a
    /// majority check. Fails fatally (process exit) rather than returning
    /// an error on listener bind failure or quorum loss.
    pub async fn start(self: &Arc<Self>, port: u16) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("binding listener on port {}", port))?;
        info!("listening on port {}", port);

        let accept_mediator = self.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        debug!("accepted connection from {}", addr);
                        let mediator = accept_mediator.clone();
                        tokio::spawn(async move { mediator.greet(stream).await });
                    }
                    Err(err) => warn!("accept error: {}", err),
                }
            }
        });

        let dials: Vec<_> = self
            .endpoints
            .iter()
            .cloned()
            .map(|endpoint| {
                let mediator = self.clone();
                tokio::spawn(async move { mediator.handshake(endpoint).await })
            })
            .collect();

        for dial in dials {
            let _ = dial.await;
        }

        if self.peers.len().await < self.majority {
            fatal("failed to connect to the majority of servers");
        }

        Ok(())
    }

    /// Sends `message` to `uid`, which must be in exactly one of the two
    /// maps.
    pub async fn send(&self, uid: u128, mut message: Message) -> Result<()> {
        self.security.sign(&mut message);

        if self.peers.contains(uid).await {
            self.peers.send(uid, message).await
        } else {
            self.clients.send(uid, message).await
        }
    }

    /// Sends `message` to every peer. Clients never receive broadcasts.
    pub async fn broadcast(&self, mut message: Message) {
        self.security.sign(&mut message);
        self.peers.broadcast(message).await;
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.len().await
    }

    pub async fn close(&self) {
        self.peers.clear().await;
        self.clients.clear().await;
    }

    /// Outbound side of the peer handshake.
    async fn handshake(self: Arc<Self>, endpoint: Endpoint) {
        let result = retry::retry(retry::dial_delays(), || TcpStream::connect(endpoint.authority())).await;

        let stream = match result {
            Ok(stream) => stream,
            Err(err) => {
                warn!("failed to connect to peer {}: {}", endpoint, err);
                return;
            }
        };

        let (read_half, write_half) = stream.into_split();
        let writer = WriterHandle::new(write_half);
        let mut reader = FramedRead::new(read_half, MessageCodec);

        let mut greeting = Message::Server(Server {
            uid: self.security.uid(),
            hash: String::new(),
        });
        self.security.sign(&mut greeting);

        if let Err(err) = writer.send_now(greeting).await {
            warn!("handshake with {} failed to send greeting: {}", endpoint, err);
            return;
        }

        let reply = match futures::StreamExt::next(&mut reader).await {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                warn!("handshake with {} failed to decode reply: {}", endpoint, err);
                return;
            }
            None => {
                warn!("handshake with {} closed before replying", endpoint);
                return;
            }
        };

        let other = match reply {
            Message::Server(ref server) if self.security.authenticate(&reply) => server.uid,
            Message::Server(_) => {
                warn!("handshake with {} failed authentication", endpoint);
                return;
            }
            other => {
                warn!("handshake with {} sent unexpected reply {}", endpoint, other);
                return;
            }
        };

        let connection = self.peers.add(other).await;
        connection.set_writer(Some(writer)).await;
        info!("established outbound link to peer {:032x} ({})", other, endpoint);
    }

    /// Inbound greeting.
    async fn greet(self: Arc<Self>, stream: TcpStream) {
        let (read_half, write_half) = stream.into_split();
        let writer = WriterHandle::new(write_half);
        let mut reader = FramedRead::new(read_half, MessageCodec);

        let first = match futures::StreamExt::next(&mut reader).await {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                warn!("greeting failed to decode: {}", err);
                return;
            }
            None => return,
        };

        if first.kind().is_authenticated() && !self.security.authenticate(&first) {
            let err = ProtocolError::AuthenticationFailed;
            warn!("greeting rejected: {}", err);
            let _ = writer
                .send_now(Message::Denied(Denied {
                    reason: err.to_string(),
                }))
                .await;
            return;
        }

        match first {
            Message::Server(server) => {
                let mut reply = Message::Server(Server {
                    uid: self.security.uid(),
                    hash: String::new(),
                });
                self.security.sign(&mut reply);
                if writer.send_now(reply).await.is_err() {
                    return;
                }

                let connection = self.peers.add(server.uid).await;
                connection.set_reader(Some(reader), Some(writer)).await;
                info!("established inbound link from peer {:032x}", server.uid);
            }
            Message::Client(_) => {
                if writer.send_now(Message::Acknowledge(Acknowledge {})).await.is_err() {
                    return;
                }

                let uid = rand::random::<u128>();
                let connection = self.clients.add(uid).await;
                connection.set_writer(Some(writer.clone())).await;
                connection.set_reader(Some(reader), Some(writer)).await;
                debug!("greeted client {:032x}", uid);
            }
            other => {
                let err = ProtocolError::UnexpectedGreeting(other.to_string());
                warn!("greeting rejected: {}", err);
                let _ = writer
                    .send_now(Message::Denied(Denied {
                        reason: err.to_string(),
                    }))
                    .await;
            }
        }
    }
}

/// Builds the on-receive callback shared by both maps: authenticate, then
/// forward to the consensus handler's inbound channel, or reply `Denied`
/// and drop.
fn dispatch(
    inbound: mpsc::UnboundedSender<(u128, Message)>,
    security: SecurityContext,
) -> impl Fn(Arc<ConnMap>, u128, Message) + Send + Sync + 'static {
    move |map, uid, message| {
        if security.authenticate(&message) {
            let _ = inbound.send((uid, message));
            return;
        }

        let err = ProtocolError::AuthenticationFailed;
        warn!("dropping message from {:032x}: {}", uid, err);

        tokio::spawn(async move {
            let _ = map
                .send(
                    uid,
                    Message::Denied(Denied {
                        reason: err.to_string(),
                    }),
                )
                .await;
        });
    }
}
