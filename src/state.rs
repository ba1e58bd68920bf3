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

//! The per-replica consensus state tables, owned exclusively by the
//! single consensus task — no locking, since there is only ever one
//! consumer.

use std::collections::{HashMap, VecDeque};

/// `promised`/`accepted` for the acceptor role, reset on every `Learn`.
#[derive(Debug, Default, Clone)]
pub struct RoundState {
    pub promised: Option<u128>,
    pub accepted: Option<(String, u128)>,
}

/// The proposer's current round, present only while a proposal is in
/// flight.
#[derive(Debug, Clone)]
pub struct Proposing {
    pub value: String,
    pub proposal: u128,
    pub promises: usize,
    pub maximum: Option<u128>,
}

/// One proposal number's accept tally.
#[derive(Debug, Clone)]
pub struct AcceptingEntry {
    pub value: String,
    pub count: usize,
}

/// One value's outstanding recursive search.
#[derive(Debug, Default, Clone)]
pub struct SearchEntry {
    pub fails: usize,
    pub waiters: Vec<u128>,
}

/// One queued client write: the value and who submitted it.
#[derive(Debug, Clone)]
pub struct WriteEntry {
    pub value: String,
    pub writer: u128,
}

pub type AcceptingTable = HashMap<u128, AcceptingEntry>;
pub type SearchingTable = HashMap<String, SearchEntry>;
pub type WritingQueue = VecDeque<WriteEntry>;
