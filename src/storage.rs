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

//! The line-oriented, durable value set the consensus handler learns values
//! into. Specified here only by the interface the core consumes:
//! `contains`/`add`, with `add` idempotent and durable before it returns.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A durable set of learned values, seeded from and appended to a flat file.
#[derive(Debug)]
pub struct ValueSet {
    path: PathBuf,
    values: HashSet<String>,
}

impl ValueSet {
    /// Opens (creating if absent) the file at `path` and seeds the
    /// in-memory set from its lines.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err).context(format!("reading value file {:?}", path)),
        };

        let values = contents.lines().map(str::to_owned).collect();
        Ok(Self { path, values })
    }

    /// Adds `value` to the set if absent, appending it to the file before
    /// returning. A no-op (and still durable, trivially) if already present.
    pub fn add(&mut self, value: &str) -> Result<()> {
        if self.values.contains(value) {
            return Ok(());
        }

        self.append_line(value)?;
        self.values.insert(value.to_owned());
        Ok(())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    fn append_line(&self, value: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening value file {:?}", self.path))?;

        writeln!(file, "{}", value).context("appending learned value")?;
        file.flush().context("flushing value file")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_and_durable() {
        let dir = std::env::temp_dir().join(format!("paxos-store-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("values.txt");
        let _ = std::fs::remove_file(&path);

        let mut set = ValueSet::open(&path).unwrap();
        assert!(!set.contains("x"));

        set.add("x").unwrap();
        set.add("x").unwrap();
        assert!(set.contains("x"));

        let reopened = ValueSet::open(&path).unwrap();
        assert!(reopened.contains("x"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "x\n");

        std::fs::remove_file(&path).unwrap();
    }
}
