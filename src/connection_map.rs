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

//! A uid-keyed table of [`Connection`]s, shared between the client map and
//! the peer map. Both maps wire every connection's `on_receive`/
//! `on_fail` to the same pair of closures at creation time and never change
//! them afterward, so `Connection` itself only exposes construct-with-
//! callbacks.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;

use crate::connection::{Connection, OnFail, OnReceive};
use crate::messages::Message;

/// Keyed store of live connections, each wired to a shared dispatch and
/// failure callback at insertion time. Callbacks receive the map itself
/// (as an `Arc`) so a dispatch callback can reply on the same map, e.g. to
/// send `Denied` back to the uid that failed authentication.
pub struct ConnMap {
    connections: Mutex<HashMap<u128, Arc<Connection>>>,
    on_receive: Arc<dyn Fn(Arc<ConnMap>, u128, Message) + Send + Sync>,
    on_fail: Arc<dyn Fn(Arc<ConnMap>, u128) + Send + Sync>,
}

impl ConnMap {
    pub fn new(
        on_receive: impl Fn(Arc<ConnMap>, u128, Message) + Send + Sync + 'static,
        on_fail: impl Fn(Arc<ConnMap>, u128) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(HashMap::new()),
            on_receive: Arc::new(on_receive),
            on_fail: Arc::new(on_fail),
        })
    }

    /// Returns the existing connection entry for `uid`, creating it on a
    /// genuine miss. Idempotent: a peer's outbound dial and inbound greeting
    /// both call this for the same uid, and must land on the same
    /// `Connection` so one call's writer and the other's reader end up on
    /// the same object instead of each clobbering the other's half.
    pub async fn add(self: &Arc<Self>, uid: u128) -> Arc<Connection> {
        let mut connections = self.connections.lock().await;
        if let Some(existing) = connections.get(&uid) {
            return existing.clone();
        }

        let map = self.clone();
        let on_receive: OnReceive = crate::connection::on_receive(move |message| {
            let map = map.clone();
            async move {
                (map.on_receive.clone())(map.clone(), uid, message);
            }
        });

        let map = self.clone();
        let on_fail: OnFail = crate::connection::on_fail(move || {
            let map = map.clone();
            async move {
                map.connections.lock().await.remove(&uid);
                (map.on_fail.clone())(map.clone(), uid);
            }
        });

        let connection = Connection::new(on_receive, on_fail);
        connections.insert(uid, connection.clone());
        connection
    }

    pub async fn get(&self, uid: u128) -> Option<Arc<Connection>> {
        self.connections.lock().await.get(&uid).cloned()
    }

    pub async fn contains(&self, uid: u128) -> bool {
        self.connections.lock().await.contains_key(&uid)
    }

    /// Enqueues `message` on `uid`'s connection.
    pub async fn send(&self, uid: u128, message: Message) -> Result<()> {
        self.get(uid)
            .await
            .ok_or_else(|| anyhow!("no connection for uid {:032x}", uid))?
            .send(message);
        Ok(())
    }

    /// Enqueues `message` on every connection currently in the map.
    pub async fn broadcast(&self, message: Message) {
        let connections: Vec<_> = self.connections.lock().await.values().cloned().collect();
        for connection in connections {
            connection.send(message.clone());
        }
    }

    pub async fn uids(&self) -> Vec<u128> {
        self.connections.lock().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn close(&self, uid: u128) {
        let connection = self.connections.lock().await.remove(&uid);
        if let Some(connection) = connection {
            connection.close().await;
        }
    }

    pub async fn clear(&self) {
        let connections: Vec<_> = self.connections.lock().await.drain().map(|(_, c)| c).collect();
        for connection in connections {
            connection.close().await;
        }
    }
}
