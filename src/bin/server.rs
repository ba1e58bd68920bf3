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

//! The replica server binary.

use clap::Parser;
use log::info;

use paxos_store::config::ServerArgs;
use paxos_store::error::fatal;
use paxos_store::hostfile;
use paxos_store::security::SecurityContext;
use paxos_store::storage::ValueSet;
use paxos_store::Replica;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new().filter_level(level).init();
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("installing SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();
    init_logging(args.verbose);

    let secret = std::env::var("SECRET").unwrap_or_else(|_| fatal("SECRET environment variable is not set"));

    let peers = match hostfile::load(&args.hostfile) {
        Ok(peers) => peers,
        Err(err) => fatal(format!("failed to load hostfile: {}", err)),
    };

    let datafile = args
        .datafile
        .unwrap_or_else(|| args.hostfile.with_extension("values"));

    let storage = match ValueSet::open(&datafile) {
        Ok(storage) => storage,
        Err(err) => fatal(format!("failed to open value file: {}", err)),
    };

    let uid: u128 = rand::random();
    let security = SecurityContext::new(secret, uid);

    info!("starting replica {:032x} on port {}", uid, args.port);

    let replica = match Replica::start(args.port, peers, security, storage).await {
        Ok(replica) => replica,
        Err(err) => fatal(format!("failed to start replica: {}", err)),
    };

    wait_for_shutdown_signal().await;
    info!("shutting down");
    replica.close().await;
}
