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

//! Keyed-hash authentication for the subset of message kinds marked ✱.
//!
//! A plain, construct-once value owned by the driver and shared by
//! reference with the mediator and the consensus handler.

use sha2::{Digest, Sha256};

use crate::messages::{AuthValue, Message};

/// This node's shared secret and identity, constructed once at startup.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    secret: String,
    uid: u128,
}

impl SecurityContext {
    pub fn new(secret: String, uid: u128) -> Self {
        Self { secret, uid }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn uid(&self) -> u128 {
        self.uid
    }

    /// Computes the authentication hash for `fields`, the declared-order
    /// fields of an authenticated message excluding `hash` itself.
    pub fn hash(&self, fields: &[AuthValue<'_>]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(encode_str(&self.secret));

        for field in fields {
            hasher.update(encode(*field));
        }

        hex::encode(hasher.finalize())
    }

    /// Fills in `message`'s `hash` field if it is authenticated and the
    /// field is currently empty.
    pub fn sign(&self, message: &mut Message) {
        if let Some(fields) = message.auth_fields() {
            if message.hash().map_or(true, str::is_empty) {
                let hash = self.hash(&fields);
                message.set_hash(hash);
            }
        }
    }

    /// Verifies an authenticated message's `hash` field. Unauthenticated
    /// kinds always verify: there is nothing to check.
    pub fn authenticate(&self, message: &Message) -> bool {
        let fields = match message.auth_fields() {
            Some(fields) => fields,
            None => return true,
        };

        let expected = self.hash(&fields);
        message.hash() == Some(expected.as_str())
    }
}

fn encode_str(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// `encode(x)` from the design: ints as 16-byte big-endian, strings as UTF-8
/// bytes, absent values as empty.
fn encode(value: AuthValue<'_>) -> Vec<u8> {
    match value {
        AuthValue::Int(n) => n.to_be_bytes().to_vec(),
        AuthValue::OptInt(Some(n)) => n.to_be_bytes().to_vec(),
        AuthValue::OptInt(None) => Vec::new(),
        AuthValue::Str(s) => s.as_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Prepare;

    fn context() -> SecurityContext {
        SecurityContext::new("topsecret".to_owned(), 42)
    }

    #[test]
    fn sign_then_authenticate_round_trips() {
        let ctx = context();
        let mut msg = Message::Prepare(Prepare {
            proposal: 7,
            hash: String::new(),
        });

        ctx.sign(&mut msg);
        assert!(!msg.hash().unwrap().is_empty());
        assert!(ctx.authenticate(&msg));
    }

    #[test]
    fn tampering_a_field_breaks_authentication() {
        let ctx = context();
        let mut msg = Message::Prepare(Prepare {
            proposal: 7,
            hash: String::new(),
        });
        ctx.sign(&mut msg);

        if let Message::Prepare(ref mut prepare) = msg {
            prepare.proposal = 8;
        }

        assert!(!ctx.authenticate(&msg));
    }

    #[test]
    fn wrong_secret_fails_authentication() {
        let signer = context();
        let verifier = SecurityContext::new("different".to_owned(), 42);

        let mut msg = Message::Prepare(Prepare {
            proposal: 7,
            hash: String::new(),
        });
        signer.sign(&mut msg);

        assert!(!verifier.authenticate(&msg));
    }

    #[test]
    fn unauthenticated_kinds_always_authenticate() {
        let ctx = context();
        let msg = Message::Learn(crate::messages::Learn {
            value: "x".to_owned(),
        });
        assert!(ctx.authenticate(&msg));
    }
}
