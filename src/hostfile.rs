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

//! Peer endpoint parsing: `HOST:PORT` strings and whitespace-separated
//! hostfiles, producing only the `Vec<Endpoint>` + port the core consumes.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// One configured peer: an unresolved host string plus a port. Resolution to
/// `SocketAddr`s happens lazily when dialing, via `tokio::net::lookup_host`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The `HOST:PORT` string suitable for `tokio::net::lookup_host` /
    /// `TcpStream::connect`.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = anyhow::Error;

    /// Parses `IPv4:PORT`, `[IPv6]:PORT`, or `HOSTNAME:PORT`.
    fn from_str(hostport: &str) -> Result<Self> {
        let hostport = hostport.trim();

        if let Some(rest) = hostport.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .with_context(|| format!("unterminated '[' in {:?}", hostport))?;
            let port = after
                .strip_prefix(':')
                .with_context(|| format!("missing port number in {:?}", hostport))?;
            return Ok(Self::new(host, parse_port(port)?));
        }

        let (host, port) = hostport
            .rsplit_once(':')
            .with_context(|| format!("missing port number in {:?}", hostport))?;

        if host.is_empty() {
            bail!("missing host in {:?}", hostport);
        }

        Ok(Self::new(host, parse_port(port)?))
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.parse::<u16>()
        .with_context(|| format!("invalid port number {:?}", raw))
}

/// Loads a whitespace-separated list of `HOST:PORT` endpoints from a
/// hostfile.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Endpoint>> {
    let path = path.as_ref();
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading hostfile {:?}", path))?;

    contents
        .split_whitespace()
        .map(|hostport| hostport.parse())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_hostport() {
        let endpoint: Endpoint = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(endpoint.host(), "127.0.0.1");
        assert_eq!(endpoint.port(), 9000);
    }

    #[test]
    fn parses_bracketed_ipv6_hostport() {
        let endpoint: Endpoint = "[::1]:9000".parse().unwrap();
        assert_eq!(endpoint.host(), "::1");
        assert_eq!(endpoint.port(), 9000);
    }

    #[test]
    fn parses_hostname_hostport() {
        let endpoint: Endpoint = "replica-a.internal:9000".parse().unwrap();
        assert_eq!(endpoint.host(), "replica-a.internal");
        assert_eq!(endpoint.port(), 9000);
    }

    #[test]
    fn rejects_missing_port() {
        assert!("127.0.0.1".parse::<Endpoint>().is_err());
    }

    #[test]
    fn loads_whitespace_separated_hostfile() {
        let dir = std::env::temp_dir().join(format!("paxos-hostfile-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hosts.txt");
        std::fs::write(&path, "127.0.0.1:9001\n[::1]:9002  host.example:9003\n").unwrap();

        let hosts = load(&path).unwrap();
        assert_eq!(
            hosts,
            vec![
                Endpoint::new("127.0.0.1", 9001),
                Endpoint::new("::1", 9002),
                Endpoint::new("host.example", 9003),
            ]
        );

        std::fs::remove_file(&path).unwrap();
    }
}
