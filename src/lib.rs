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

//! A replicated value-set store built on single-decree Paxos.
//!
//! # Overview
//!
//! This crate contains the following APIs:
//!
//! - [`Replica`] wires the mediator, the consensus handler, and the
//!   external value set into one running node.
//! - [`network::Mediator`] accepts peer/client links, performs the
//!   handshake, and exposes `send`/`broadcast` to the consensus handler.
//! - [`consensus::Handler`] is the Paxos round state machine.
//! - [`security::SecurityContext`] computes and verifies the keyed-hash
//!   authentication carried by a subset of message kinds.

pub mod codec;
pub mod config;
pub mod connection;
pub mod connection_map;
pub mod consensus;
pub mod error;
pub mod hostfile;
pub mod messages;
pub mod network;
pub mod proposer;
pub mod retry;
pub mod security;
pub mod state;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use consensus::Handler;
use hostfile::Endpoint;
use network::Mediator;
use security::SecurityContext;
use storage::ValueSet;

/// One running replica: the mediator and the consensus handler's dedicated
/// task, wired together.
pub struct Replica {
    mediator: Arc<Mediator>,
}

impl Replica {
    /// Constructs and starts a replica: binds `port`, dials `peers` in
    /// parallel, and spawns the consensus handler's dedicated task.
    /// Returns once the majority check in [`Mediator::start`] has passed.
    pub async fn start(
        port: u16,
        peers: Vec<Endpoint>,
        security: SecurityContext,
        storage: ValueSet,
    ) -> Result<Self> {
        let majority = peers.len() / 2 + 1;
        let (tx, rx) = mpsc::unbounded_channel();

        let mediator = Mediator::new(peers, security.clone(), tx);
        mediator.start(port).await?;

        let handler = Handler::new(mediator.clone(), storage, security.uid(), majority);
        tokio::spawn(handler.run(rx));

        Ok(Self { mediator })
    }

    /// Tears down every connection, idempotently.
    pub async fn close(&self) {
        self.mediator.close().await;
    }
}
