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

//! The tagged `Message` variant and its wire `Kind` numbering.
//!
//! The header carries a `Kind` byte rather than relying on the JSON payload
//! itself to disambiguate, so decoding can allocate the right struct before
//! touching `serde_json`.

mod types;

pub use types::*;

use std::fmt;

/// Fixed, 1-based wire numbering of the thirteen message kinds. Never
/// renumber these without bumping a wire-protocol version: the header byte
/// is this value verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    Accept = 1,
    Accepted = 2,
    Acknowledge = 3,
    Client = 4,
    Denied = 5,
    Found = 6,
    Learn = 7,
    Prepare = 8,
    Promise = 9,
    Search = 10,
    Server = 11,
    Write = 12,
    Wrote = 13,
}

impl Kind {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::Accept,
            2 => Self::Accepted,
            3 => Self::Acknowledge,
            4 => Self::Client,
            5 => Self::Denied,
            6 => Self::Found,
            7 => Self::Learn,
            8 => Self::Prepare,
            9 => Self::Promise,
            10 => Self::Search,
            11 => Self::Server,
            12 => Self::Write,
            13 => Self::Wrote,
            _ => return None,
        })
    }

    /// Whether this kind carries a `hash` field that must be verified before
    /// the message reaches the consensus handler.
    pub fn is_authenticated(self) -> bool {
        matches!(
            self,
            Self::Accept
                | Self::Accepted
                | Self::Found
                | Self::Prepare
                | Self::Promise
                | Self::Server
        )
    }
}

/// The full set of messages exchanged over the wire, tagged by [`Kind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Accept(Accept),
    Accepted(Accepted),
    Acknowledge(Acknowledge),
    Client(Client),
    Denied(Denied),
    Found(Found),
    Learn(Learn),
    Prepare(Prepare),
    Promise(Promise),
    Search(Search),
    Server(Server),
    Write(Write),
    Wrote(Wrote),
}

impl Message {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Accept(_) => Kind::Accept,
            Self::Accepted(_) => Kind::Accepted,
            Self::Acknowledge(_) => Kind::Acknowledge,
            Self::Client(_) => Kind::Client,
            Self::Denied(_) => Kind::Denied,
            Self::Found(_) => Kind::Found,
            Self::Learn(_) => Kind::Learn,
            Self::Prepare(_) => Kind::Prepare,
            Self::Promise(_) => Kind::Promise,
            Self::Search(_) => Kind::Search,
            Self::Server(_) => Kind::Server,
            Self::Write(_) => Kind::Write,
            Self::Wrote(_) => Kind::Wrote,
        }
    }

    /// Fields to authenticate, if this message's kind is authenticated.
    pub fn auth_fields(&self) -> Option<Vec<AuthValue<'_>>> {
        match self {
            Self::Accept(m) => Some(m.auth_fields()),
            Self::Accepted(m) => Some(m.auth_fields()),
            Self::Found(m) => Some(m.auth_fields()),
            Self::Prepare(m) => Some(m.auth_fields()),
            Self::Promise(m) => Some(m.auth_fields()),
            Self::Server(m) => Some(m.auth_fields()),
            _ => None,
        }
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Accept(m) => Some(m.hash()),
            Self::Accepted(m) => Some(m.hash()),
            Self::Found(m) => Some(m.hash()),
            Self::Prepare(m) => Some(m.hash()),
            Self::Promise(m) => Some(m.hash()),
            Self::Server(m) => Some(m.hash()),
            _ => None,
        }
    }

    pub fn set_hash(&mut self, hash: String) {
        match self {
            Self::Accept(m) => m.set_hash(hash),
            Self::Accepted(m) => m.set_hash(hash),
            Self::Found(m) => m.set_hash(hash),
            Self::Prepare(m) => m.set_hash(hash),
            Self::Promise(m) => m.set_hash(hash),
            Self::Server(m) => m.set_hash(hash),
            _ => {}
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept(m) => write!(f, "Accept({}, {})", m.value, m.proposal),
            Self::Accepted(m) => write!(f, "Accepted({}, {})", m.value, m.proposal),
            Self::Acknowledge(_) => write!(f, "Acknowledge()"),
            Self::Client(_) => write!(f, "Client()"),
            Self::Denied(m) => write!(f, "Denied({})", m.reason),
            Self::Found(m) => write!(f, "Found({}, {})", m.value, m.found),
            Self::Learn(m) => write!(f, "Learn({})", m.value),
            Self::Prepare(m) => write!(f, "Prepare({})", m.proposal),
            Self::Promise(m) => write!(
                f,
                "Promise({}, {:?}, {:?})",
                m.proposal, m.accepted, m.previous
            ),
            Self::Search(m) => write!(f, "Search({}, {})", m.value, m.recurse),
            Self::Server(m) => write!(f, "Server({})", m.uid),
            Self::Write(m) => write!(f, "Write({})", m.value),
            Self::Wrote(m) => write!(f, "Wrote({})", m.value),
        }
    }
}

macro_rules! from_variant {
    ($ty:ident) => {
        impl From<$ty> for Message {
            fn from(value: $ty) -> Self {
                Message::$ty(value)
            }
        }
    };
}

from_variant!(Accept);
from_variant!(Accepted);
from_variant!(Acknowledge);
from_variant!(Client);
from_variant!(Denied);
from_variant!(Found);
from_variant!(Learn);
from_variant!(Prepare);
from_variant!(Promise);
from_variant!(Search);
from_variant!(Server);
from_variant!(Write);
from_variant!(Wrote);

/// The fixed 5-byte header: big-endian `u32` length, then `u8` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: Kind,
    pub length: u32,
}

impl Header {
    pub const SIZE: usize = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_u8() {
        for raw in 1..=13u8 {
            let kind = Kind::from_u8(raw).expect("valid kind");
            assert_eq!(kind as u8, raw);
        }
        assert!(Kind::from_u8(0).is_none());
        assert!(Kind::from_u8(14).is_none());
    }

    #[test]
    fn authenticated_kinds_match_spec_table() {
        assert!(Kind::Accept.is_authenticated());
        assert!(Kind::Accepted.is_authenticated());
        assert!(Kind::Found.is_authenticated());
        assert!(Kind::Prepare.is_authenticated());
        assert!(Kind::Promise.is_authenticated());
        assert!(Kind::Server.is_authenticated());

        assert!(!Kind::Acknowledge.is_authenticated());
        assert!(!Kind::Client.is_authenticated());
        assert!(!Kind::Denied.is_authenticated());
        assert!(!Kind::Learn.is_authenticated());
        assert!(!Kind::Search.is_authenticated());
        assert!(!Kind::Write.is_authenticated());
        assert!(!Kind::Wrote.is_authenticated());
    }
}
