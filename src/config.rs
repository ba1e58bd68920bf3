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

//! CLI surfaces for the two binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::hostfile::Endpoint;

/// A replica server participating in the Paxos cluster.
#[derive(Debug, Parser)]
#[clap(about = "Single-decree Paxos replicated value-set server")]
pub struct ServerArgs {
    /// Port where this server listens for TCP connections.
    #[clap(short, long)]
    pub port: u16,

    /// Path to a whitespace-separated HOST:PORT hostfile listing peers.
    #[clap(short = 'f', long)]
    pub hostfile: PathBuf,

    /// Increase log verbosity (repeatable).
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Path to the durable value file (defaults next to the hostfile).
    #[clap(long)]
    pub datafile: Option<PathBuf>,
}

/// An interactive client connecting to one replica.
#[derive(Debug, Parser)]
#[clap(about = "Interactive client for the Paxos replicated value-set store")]
pub struct ClientArgs {
    /// Replica to connect to, as HOST:PORT.
    #[clap(short = 'H', long)]
    pub host: Endpoint,
}
