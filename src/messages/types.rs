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

//! Wire message kinds.
//!
//! One struct per kind, field order matching the declared order used both
//! for the wire payload and, for authenticated kinds, for the hash described
//! in [`crate::security`]. `hash` is always the last field of an
//! authenticated kind and is never itself hashed.

use serde::{Deserialize, Serialize};

/// A single field value as consumed by the authentication hash.
#[derive(Debug, Clone, Copy)]
pub enum AuthValue<'a> {
    Int(u128),
    OptInt(Option<u128>),
    Str(&'a str),
}

impl<'a> From<&'a String> for AuthValue<'a> {
    fn from(value: &'a String) -> Self {
        AuthValue::Str(value.as_str())
    }
}

impl<'a> From<&'a u128> for AuthValue<'a> {
    fn from(value: &'a u128) -> Self {
        AuthValue::Int(*value)
    }
}

impl<'a> From<&'a Option<u128>> for AuthValue<'a> {
    fn from(value: &'a Option<u128>) -> Self {
        AuthValue::OptInt(*value)
    }
}

impl<'a> From<&'a bool> for AuthValue<'a> {
    fn from(value: &'a bool) -> Self {
        AuthValue::Int(*value as u128)
    }
}

/// Implemented by every authenticated message kind (the ones marked ✱ in the
/// framing table). Returns the fields in declared order, excluding `hash`.
pub trait Authenticated {
    fn auth_fields(&self) -> Vec<AuthValue<'_>>;
    fn hash(&self) -> &str;
    fn set_hash(&mut self, hash: String);
}

macro_rules! authenticated_impl {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl Authenticated for $ty {
            fn auth_fields(&self) -> Vec<AuthValue<'_>> {
                vec![ $( AuthValue::from(&self.$field) ),* ]
            }

            fn hash(&self) -> &str {
                &self.hash
            }

            fn set_hash(&mut self, hash: String) {
                self.hash = hash;
            }
        }
    };
}

/// `Accept{value, proposal}` — a proposer asking acceptors to accept a value
/// for a given proposal number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accept {
    pub value: String,
    pub proposal: u128,
    #[serde(default)]
    pub hash: String,
}
authenticated_impl!(Accept { value, proposal });

/// `Accepted{value, proposal}` — an acceptor announcing it accepted a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {
    pub value: String,
    pub proposal: u128,
    #[serde(default)]
    pub hash: String,
}
authenticated_impl!(Accepted { value, proposal });

/// `Acknowledge{}` — unauthenticated ack of a client request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Acknowledge {}

/// `Client{}` — the client side of the greeting handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Client {}

/// `Denied{reason}` — a protocol-level refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denied {
    pub reason: String,
}

/// `Found{value, found}` — the answer to a non-recursive `Search` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Found {
    pub value: String,
    pub found: bool,
    #[serde(default)]
    pub hash: String,
}
authenticated_impl!(Found { value, found });

/// `Learn{value}` — broadcast once a value reaches acceptance majority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learn {
    pub value: String,
}

/// `Prepare{proposal}` — phase-1a of Paxos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepare {
    pub proposal: u128,
    #[serde(default)]
    pub hash: String,
}
authenticated_impl!(Prepare { proposal });

/// `Promise{proposal, accepted, previous}` — phase-1b response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    pub proposal: u128,
    pub accepted: String,
    pub previous: Option<u128>,
    #[serde(default)]
    pub hash: String,
}
authenticated_impl!(Promise {
    proposal,
    accepted,
    previous
});

/// `Search{value, recurse}` — a client (recursive) or peer (non-recursive)
/// search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    pub value: String,
    pub recurse: bool,
}

/// `Server{uid}` — the peer side of the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub uid: u128,
    #[serde(default)]
    pub hash: String,
}
authenticated_impl!(Server { uid });

/// `Write{value}` — a client's write request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Write {
    pub value: String,
}

/// `Wrote{value}` — the success response to a `Write` once learned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrote {
    pub value: String,
}
