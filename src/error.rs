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

//! Typed protocol errors plus the "log and exit" helper used for fatal
//! startup/runtime conditions.

use std::process;

use log::error;

/// Errors a caller needs to branch on by kind, as opposed to the opaque
/// `anyhow::Error` used for I/O and config failures at the edges.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Decode(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("unexpected greeting message: {0}")]
    UnexpectedGreeting(String),

    #[error("accepted value mismatch for proposal {0}")]
    ProposalValueMismatch(u128),
}

/// Logs `message` at error level and exits the process with a non-zero
/// status.
pub fn fatal(message: impl AsRef<str>) -> ! {
    error!("{}", message.as_ref());
    process::exit(1)
}

/// Extension trait for "log a failure and move on" call sites.
pub trait LogError {
    fn log_error(self);
}

impl<T, E: std::fmt::Display> LogError for Result<T, E> {
    fn log_error(self) {
        if let Err(err) = self {
            log::warn!("{}", err);
        }
    }
}
