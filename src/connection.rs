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

//! One bidirectional link: a settable reader slot and a settable writer
//! slot, independent of each other because the peer handshake hands them
//! separate sockets. `set_reader`/`set_writer` swap the background
//! task that owns the corresponding half; `close()` tears both down.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;
use log::warn;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::MessageCodec;
use crate::messages::Message;

pub type OnReceive = Arc<dyn Fn(Message) -> BoxFuture<'static, ()> + Send + Sync>;
pub type OnFail = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Boxes a synchronous or async-returning closure into an [`OnReceive`].
pub fn on_receive<F, Fut>(f: F) -> OnReceive
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |message| Box::pin(f(message)) as Pin<Box<dyn Future<Output = ()> + Send>>)
}

/// Boxes a synchronous or async-returning closure into an [`OnFail`].
pub fn on_fail<F, Fut>(f: F) -> OnFail
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as Pin<Box<dyn Future<Output = ()> + Send>>)
}

static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

/// A settable, shareable handle to the write half of a socket. Cloning
/// preserves `id`, which is how the reader's "associated writer" is
/// compared for identity against the connection's current writer.
#[derive(Clone)]
pub struct WriterHandle {
    id: u64,
    sink: Arc<Mutex<Option<FramedWrite<OwnedWriteHalf, MessageCodec>>>>,
}

impl WriterHandle {
    pub fn new(write_half: OwnedWriteHalf) -> Self {
        Self {
            id: NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed),
            sink: Arc::new(Mutex::new(Some(FramedWrite::new(write_half, MessageCodec)))),
        }
    }

    async fn close(&self) {
        use futures::SinkExt;

        let mut guard = self.sink.lock().await;
        if let Some(mut framed) = guard.take() {
            let _ = SinkExt::<Message>::close(&mut framed).await;
            let _ = framed.into_inner().shutdown().await;
        }
    }

    /// Sends one message immediately, outside of any `Connection`'s sender
    /// task — used for the handshake/greeting replies the mediator issues
    /// before a uid has an installed `Connection`.
    pub async fn send_now(&self, message: Message) -> anyhow::Result<()> {
        use futures::SinkExt;

        let mut guard = self.sink.lock().await;
        match guard.as_mut() {
            Some(framed) => framed
                .send(message)
                .await
                .map_err(|err| anyhow::anyhow!(err.to_string())),
            None => Err(anyhow::anyhow!("writer already closed")),
        }
    }
}

struct ConnectionState {
    writer_task: Option<JoinHandle<()>>,
    current_writer: Option<WriterHandle>,
    reader_task: Option<JoinHandle<()>>,
    associated_writer: Option<WriterHandle>,
}

/// A connection's sender/receiver lifecycle.
pub struct Connection {
    state: Mutex<ConnectionState>,
    send_tx: mpsc::UnboundedSender<Message>,
    send_rx: Arc<Mutex<mpsc::UnboundedReceiver<Message>>>,
    failed: Arc<Notify>,
    on_receive: OnReceive,
    on_fail: OnFail,
    aborter: Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    pub fn new(on_receive: OnReceive, on_fail: OnFail) -> Arc<Self> {
        let (send_tx, send_rx) = mpsc::unbounded_channel();

        let connection = Arc::new_cyclic(|weak: &Weak<Connection>| {
            let failed = Arc::new(Notify::new());
            let aborter = spawn_aborter(weak.clone(), failed.clone());

            Connection {
                state: Mutex::new(ConnectionState {
                    writer_task: None,
                    current_writer: None,
                    reader_task: None,
                    associated_writer: None,
                }),
                send_tx,
                send_rx: Arc::new(Mutex::new(send_rx)),
                failed,
                on_receive,
                on_fail,
                aborter: Mutex::new(Some(aborter)),
            }
        });

        connection
    }

    /// Installs (or clears) the writer stream, closing the previous one
    /// unless it is also the reader's associated writer.
    pub async fn set_writer(&self, writer: Option<WriterHandle>) {
        let mut state = self.state.lock().await;

        let same = match (&state.current_writer, &writer) {
            (Some(old), Some(new)) => old.id == new.id,
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }

        if let Some(task) = state.writer_task.take() {
            task.abort();
        }

        if let Some(old) = state.current_writer.take() {
            let is_associated = state
                .associated_writer
                .as_ref()
                .map_or(false, |assoc| assoc.id == old.id);
            if !is_associated {
                old.close().await;
            }
        }

        state.current_writer = writer.clone();

        if let Some(handle) = writer {
            let rx = self.send_rx.clone();
            let failed = self.failed.clone();
            state.writer_task = Some(tokio::spawn(sender_loop(handle, rx, failed)));
        }
    }

    /// Installs (or clears) the reader stream and its associated writer,
    /// closing the previous associated writer unless it equals the current
    /// writer.
    pub async fn set_reader(
        &self,
        reader: Option<FramedRead<OwnedReadHalf, MessageCodec>>,
        associated: Option<WriterHandle>,
    ) {
        let mut state = self.state.lock().await;

        if let Some(task) = state.reader_task.take() {
            task.abort();
        }

        if let Some(old_assoc) = state.associated_writer.take() {
            let is_current_writer = state
                .current_writer
                .as_ref()
                .map_or(false, |current| current.id == old_assoc.id);
            if !is_current_writer {
                old_assoc.close().await;
            }
        }

        state.associated_writer = associated;

        if let Some(source) = reader {
            let on_receive = self.on_receive.clone();
            let failed = self.failed.clone();
            state.reader_task = Some(tokio::spawn(receiver_loop(source, on_receive, failed)));
        }
    }

    /// Enqueues `message` for the sender task.
    pub fn send(&self, message: Message) {
        let _ = self.send_tx.send(message);
    }

    /// Clears reader, writer, and cancels the aborter — the connection is
    /// unusable afterward.
    pub async fn close(&self) {
        self.set_reader(None, None).await;
        self.set_writer(None).await;

        if let Some(task) = self.aborter.lock().await.take() {
            task.abort();
        }
    }
}

fn spawn_aborter(connection: Weak<Connection>, failed: Arc<Notify>) -> JoinHandle<()> {
    tokio::spawn(async move {
        failed.notified().await;

        if let Some(connection) = connection.upgrade() {
            (connection.on_fail)().await;
            connection.close().await;
        }
    })
}

async fn sender_loop(
    writer: WriterHandle,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Message>>>,
    failed: Arc<Notify>,
) {
    use futures::SinkExt;

    let mut rx = rx.lock().await;

    loop {
        let message = match rx.recv().await {
            Some(message) => message,
            None => return,
        };

        let mut guard = writer.sink.lock().await;
        let result = match guard.as_mut() {
            Some(framed) => framed.send(message).await,
            None => {
                failed.notify_one();
                continue;
            }
        };
        drop(guard);

        if result.is_err() {
            failed.notify_one();
        }
    }
}

async fn receiver_loop(
    mut source: FramedRead<OwnedReadHalf, MessageCodec>,
    on_receive: OnReceive,
    failed: Arc<Notify>,
) {
    use futures::StreamExt;

    loop {
        match source.next().await {
            Some(Ok(message)) => on_receive(message).await,
            Some(Err(err)) => {
                warn!("decode error on connection: {}", err);
                failed.notify_one();
                return;
            }
            None => {
                failed.notify_one();
                return;
            }
        }
    }
}
