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

//! The Paxos handler: round state machine, proposer retry loop, accept and
//! search tallying, and the pending-write queue.
//!
//! Runs as the single consensus task: it owns every table in
//! [`crate::state`] by value and is the sole consumer of the inbound
//! `(uid, Message)` channel, so none of its state needs locking.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::ProtocolError;
use crate::messages::{
    Accept, Accepted, Acknowledge, Denied, Found, Learn, Message, Prepare, Promise, Search, Wrote,
};
use crate::network::Mediator;
use crate::proposer;
use crate::state::{AcceptingEntry, AcceptingTable, Proposing, RoundState, SearchEntry, SearchingTable, WriteEntry, WritingQueue};
use crate::storage::ValueSet;

/// Proposer retry delay range in seconds, `(low, high)` for a uniform
/// random sleep between Prepare retries.
const DEFAULT_DELAY_RANGE: (f64, f64) = (2.0, 5.0);

pub struct Handler {
    mediator: Arc<Mediator>,
    storage: ValueSet,
    uid: u128,
    majority: usize,
    delay_range: (f64, f64),
    round: RoundState,
    proposing: Option<Proposing>,
    accepting: AcceptingTable,
    searching: SearchingTable,
    writing: WritingQueue,
    proposal_deadline: Option<Instant>,
}

impl Handler {
    pub fn new(mediator: Arc<Mediator>, storage: ValueSet, uid: u128, majority: usize) -> Self {
        Self {
            mediator,
            storage,
            uid,
            majority,
            delay_range: DEFAULT_DELAY_RANGE,
            round: RoundState::default(),
            proposing: None,
            accepting: AcceptingTable::new(),
            searching: SearchingTable::new(),
            writing: WritingQueue::new(),
            proposal_deadline: None,
        }
    }

    /// Consumes the handler, processing `rx` until the channel closes.
    /// Interleaves message handling with the proposer's retry timer via a
    /// single `select!`, so the two never run concurrently.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<(u128, Message)>) {
        loop {
            let sleep_target = self
                .proposal_deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(365 * 24 * 3600));

            tokio::select! {
                received = rx.recv() => {
                    match received {
                        Some((uid, message)) => self.handle(uid, message).await,
                        None => return,
                    }
                }
                _ = tokio::time::sleep_until(sleep_target) => {
                    if self.proposal_deadline.is_some() {
                        self.start_proposer().await;
                    }
                }
            }
        }
    }

    async fn handle(&mut self, uid: u128, message: Message) {
        match message {
            Message::Write(write) => self.on_write(uid, write.value).await,
            Message::Prepare(prepare) => self.on_prepare(uid, prepare).await,
            Message::Promise(promise) => self.on_promise(promise).await,
            Message::Accept(accept) => self.on_accept(uid, accept).await,
            Message::Accepted(accepted) => self.on_accepted(accepted).await,
            Message::Learn(learn) => self.emit_learned(learn.value).await,
            Message::Search(search) => self.on_search(uid, search).await,
            Message::Found(found) => self.on_found(found).await,
            Message::Acknowledge(_) | Message::Denied(_) => {}
            other => warn!("message kind should never reach the handler: {}", other),
        }
    }

    async fn on_write(&mut self, uid: u128, value: String) {
        let _ = self.mediator.send(uid, Message::Acknowledge(Acknowledge {})).await;
        self.writing.push_back(WriteEntry { value, writer: uid });

        if self.proposing.is_none() {
            self.start_proposer().await;
        }
    }

    /// Starts (or restarts, on retry) a proposer round for the head of the
    /// write queue.
    async fn start_proposer(&mut self) {
        let value = match self.writing.front() {
            Some(entry) => entry.value.clone(),
            None => {
                self.proposal_deadline = None;
                return;
            }
        };

        let proposal = proposer::new_proposal(self.uid);
        self.proposing = Some(Proposing {
            value,
            proposal,
            promises: 0,
            maximum: None,
        });

        self.mediator
            .broadcast(Message::Prepare(Prepare {
                proposal,
                hash: String::new(),
            }))
            .await;

        let delay = proposer::next_delay(self.delay_range.0, self.delay_range.1);
        self.proposal_deadline = Some(Instant::now() + delay);
    }

    async fn on_prepare(&mut self, uid: u128, prepare: Prepare) {
        let should_promise = match self.round.promised {
            Some(promised) => prepare.proposal > promised,
            None => true,
        };

        if should_promise {
            self.round.promised = Some(prepare.proposal);
            let (accepted_value, previous) = match &self.round.accepted {
                Some((value, proposal)) => (value.clone(), Some(*proposal)),
                None => (String::new(), None),
            };

            let _ = self
                .mediator
                .send(
                    uid,
                    Message::Promise(Promise {
                        proposal: prepare.proposal,
                        accepted: accepted_value,
                        previous,
                        hash: String::new(),
                    }),
                )
                .await;
        } else {
            let _ = self
                .mediator
                .send(
                    uid,
                    Message::Denied(Denied {
                        reason: "Already promised to a higher proposal".to_owned(),
                    }),
                )
                .await;
        }
    }

    async fn on_promise(&mut self, promise: Promise) {
        let proposing = match &mut self.proposing {
            Some(proposing) if proposing.proposal == promise.proposal => proposing,
            _ => return,
        };

        if let Some(previous) = promise.previous {
            let supersedes = proposing.maximum.map_or(true, |maximum| previous > maximum);
            if supersedes {
                proposing.value = promise.accepted.clone();
                proposing.maximum = Some(previous);
            }
        }

        proposing.promises += 1;

        if proposing.promises >= self.majority {
            let proposal = proposing.proposal;
            let value = proposing.value.clone();
            self.proposing = None;
            self.proposal_deadline = None;

            self.mediator
                .broadcast(Message::Accept(Accept {
                    value,
                    proposal,
                    hash: String::new(),
                }))
                .await;
        }
    }

    async fn on_accept(&mut self, uid: u128, accept: Accept) {
        // Note the `>=`, not `>`: asymmetric with `on_prepare` by design.
        let should_accept = match self.round.promised {
            Some(promised) => accept.proposal >= promised,
            None => true,
        };

        if should_accept {
            self.round.promised = Some(accept.proposal);
            self.round.accepted = Some((accept.value.clone(), accept.proposal));

            self.mediator
                .broadcast(Message::Accepted(Accepted {
                    value: accept.value,
                    proposal: accept.proposal,
                    hash: String::new(),
                }))
                .await;
        } else {
            let _ = self
                .mediator
                .send(
                    uid,
                    Message::Denied(Denied {
                        reason: "Already promised to a higher proposal".to_owned(),
                    }),
                )
                .await;
        }
    }

    async fn on_accepted(&mut self, accepted: Accepted) {
        let proposal = accepted.proposal;

        if !self.accepting.contains_key(&proposal) {
            self.accepting.insert(
                proposal,
                AcceptingEntry {
                    value: accepted.value.clone(),
                    count: 0,
                },
            );
        }

        let matches = self
            .accepting
            .get(&proposal)
            .map_or(false, |entry| entry.value == accepted.value);

        if !matches {
            let err = ProtocolError::ProposalValueMismatch(proposal);
            warn!(
                "{}: expected {:?}, got {:?}",
                err,
                self.accepting.get(&proposal).map(|e| &e.value),
                accepted.value
            );
            self.accepting.remove(&proposal);
            return;
        }

        let count = {
            let entry = self.accepting.get_mut(&proposal).expect("checked above");
            entry.count += 1;
            entry.count
        };

        if count >= self.majority {
            self.accepting.remove(&proposal);
            self.mediator
                .broadcast(Message::Learn(Learn {
                    value: accepted.value.clone(),
                }))
                .await;
            self.emit_learned(accepted.value).await;
        }
    }

    /// Applies a learned value locally: persists it, satisfies any queued
    /// writes it resolves, and resets the round.
    async fn emit_learned(&mut self, value: String) {
        if let Err(err) = self.storage.add(&value) {
            warn!("failed to persist learned value {:?}: {}", value, err);
        }

        while let Some(front) = self.writing.front() {
            if !self.storage.contains(&front.value) {
                break;
            }
            let entry = self.writing.pop_front().expect("front just checked");
            let _ = self
                .mediator
                .send(entry.writer, Message::Wrote(Wrote { value: entry.value }))
                .await;
        }

        self.round = RoundState::default();
        self.proposing = None;
        self.proposal_deadline = None;
        self.accepting.clear();

        info!("learned {:?}", value);

        if !self.writing.is_empty() {
            self.start_proposer().await;
        }
    }

    async fn on_search(&mut self, uid: u128, search: Search) {
        if search.recurse {
            let first_waiter = !self.searching.contains_key(&search.value);
            self.searching
                .entry(search.value.clone())
                .or_insert_with(SearchEntry::default)
                .waiters
                .push(uid);

            let _ = self.mediator.send(uid, Message::Acknowledge(Acknowledge {})).await;

            if first_waiter {
                self.mediator
                    .broadcast(Message::Search(Search {
                        value: search.value,
                        recurse: false,
                    }))
                    .await;
            }
        } else {
            let found = self.storage.contains(&search.value);
            let _ = self
                .mediator
                .send(
                    uid,
                    Message::Found(Found {
                        value: search.value,
                        found,
                        hash: String::new(),
                    }),
                )
                .await;
        }
    }

    async fn on_found(&mut self, found: Found) {
        let resolved = if found.found {
            self.searching.remove(&found.value)
        } else {
            let exceeded = match self.searching.get_mut(&found.value) {
                Some(entry) => {
                    entry.fails += 1;
                    entry.fails >= self.majority
                }
                None => return,
            };

            if exceeded {
                self.searching.remove(&found.value)
            } else {
                None
            }
        };

        if let Some(entry) = resolved {
            for waiter in entry.waiters {
                let _ = self
                    .mediator
                    .send(
                        waiter,
                        Message::Found(Found {
                            value: found.value.clone(),
                            found: found.found,
                            hash: String::new(),
                        }),
                    )
                    .await;
            }
        }
    }
}
