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

//! The interactive client binary: a `write`/`search`/`quit` REPL over
//! stdin.

use clap::Parser;
use futures::{SinkExt, StreamExt};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use paxos_store::codec::MessageCodec;
use paxos_store::config::ClientArgs;
use paxos_store::error::fatal;
use paxos_store::messages::{Client, Message, Search, Write};

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = ClientArgs::parse();

    let stream = match TcpStream::connect(args.host.authority()).await {
        Ok(stream) => stream,
        Err(err) => fatal(format!("failed to connect to {}: {}", args.host, err)),
    };

    let mut framed = Framed::new(stream, MessageCodec);

    if let Err(err) = framed.send(Message::Client(Client {})).await {
        fatal(format!("failed to send greeting: {}", err));
    }

    match framed.next().await {
        Some(Ok(Message::Acknowledge(_))) => {}
        Some(Ok(other)) => fatal(format!("unexpected greeting reply: {}", other)),
        Some(Err(err)) => fatal(format!("failed to decode greeting reply: {}", err)),
        None => fatal("connection closed before greeting reply"),
    }

    let (mut sink, mut stream) = framed.split();

    tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(message) => println!("{}", message),
                Err(err) => {
                    warn!("connection error: {}", err);
                    break;
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let mut words = line.trim().splitn(2, char::is_whitespace);
        let command = words.next().unwrap_or("");
        let argument = words.next().unwrap_or("").trim();

        let message = match command {
            "write" if !argument.is_empty() => Message::Write(Write {
                value: argument.to_owned(),
            }),
            "search" if !argument.is_empty() => Message::Search(Search {
                value: argument.to_owned(),
                recurse: true,
            }),
            "quit" => break,
            "" => continue,
            _ => {
                warn!("unrecognized command: {:?}", line);
                continue;
            }
        };

        if let Err(err) = sink.send(message).await {
            warn!("failed to send: {}", err);
            break;
        }
    }
}
